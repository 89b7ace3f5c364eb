use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Split amounts are currency, rounded to cents.
pub const CENT_PLACES: u32 = 2;
/// Half-to-even, so repeated splits don't drift upwards on exact midpoints.
pub const SPLIT_ROUNDING: RoundingStrategy = RoundingStrategy::MidpointNearestEven;

/// Dates are always written in this format.
pub const DATE_FORMAT: &str = "%m/%d/%Y";
/// Dates are read with the first of these that matches. Two-digit years must
/// come first as `%Y` happily takes "21" as the year 21.
pub const DATE_FALLBACK_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

pub const TRANSACTION_HEADER: [&str; 5] = ["DATE", "AMOUNT", "FUND", "UNITS", "TYPE"];
pub const SALE_HEADER: [&str; 6] = [
    "DESCRIPTION",
    "DATE ACQUIRED",
    "DATE SOLD",
    "PROCEEDS",
    "COST",
    "GAIN/LOSS",
];

/// One ledger entry. `amount` and `units` are never negative; their ratio is
/// the per-unit price, which is only ever used when splitting.
///
/// `kind` is kept as the free-text label from the statement so it can be
/// written back out unchanged; it is resolved against `Verbs` when needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord", into = "TransactionRecord")]
pub(crate) struct Transaction {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub fund: String,
    pub units: Decimal,
    pub kind: String,
}

impl Transaction {
    pub fn class(&self, verbs: &Verbs) -> Result<TxClass, Error> {
        verbs.classify(&self.kind)
    }

    pub fn is_dividend(&self, verbs: &Verbs) -> bool {
        verbs.is_dividend(&self.kind)
    }

    /// Splits `units` off this transaction. `self` keeps the remainder and the
    /// returned transaction holds the fragment; amount and units are conserved
    /// exactly. Asking for every remaining unit moves the whole amount over
    /// without rounding, leaving `self` at zero.
    pub fn split_off(&mut self, units: Decimal) -> Result<Transaction, Error> {
        if units <= Decimal::ZERO {
            return Err(Error::InvalidSplit(units));
        }
        if units > self.units {
            return Err(Error::InsufficientUnits {
                fund: self.fund.clone(),
                requested: units,
                available: self.units,
            });
        }
        let amount = if units == self.units {
            self.amount
        } else {
            (self.amount * units / self.units).round_dp_with_strategy(CENT_PLACES, SPLIT_ROUNDING)
        };
        self.amount -= amount;
        self.units -= units;
        Ok(Transaction {
            date: self.date,
            amount,
            fund: self.fund.clone(),
            units,
            kind: self.kind.clone(),
        })
    }
}

/// Raw shape of a transaction row. All fields stay textual here so that
/// parsing errors can say exactly what was wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TransactionRecord {
    #[serde(rename = "DATE")]
    pub date: String,
    #[serde(rename = "AMOUNT")]
    pub amount: String,
    #[serde(rename = "FUND")]
    pub fund: String,
    #[serde(rename = "UNITS")]
    pub units: String,
    #[serde(rename = "TYPE")]
    pub kind: String,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = Error;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let amount = parse_amount(&record.amount)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(Error::NegativeAmount(record.fund));
        }
        let units = parse_decimal(&record.units)?;
        if units.is_sign_negative() && !units.is_zero() {
            return Err(Error::NegativeUnits(record.fund));
        }
        if units.is_zero() && !amount.is_zero() {
            return Err(Error::UnitlessAmount {
                fund: record.fund,
                amount,
            });
        }
        Ok(Transaction {
            date: parse_date(&record.date)?,
            amount,
            fund: record.fund,
            units,
            kind: record.kind,
        })
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(tx: Transaction) -> Self {
        Self {
            date: tx.date.format(DATE_FORMAT).to_string(),
            amount: tx.amount.to_string(),
            fund: tx.fund,
            units: tx.units.to_string(),
            kind: tx.kind,
        }
    }
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    DATE_FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
        .ok_or_else(|| Error::InvalidDate(s.to_string()))
}

/// Statements print amounts like "$1,234.56".
pub(crate) fn parse_amount(s: &str) -> Result<Decimal, Error> {
    let trimmed = s.trim();
    let stripped = trimmed.strip_prefix('$').unwrap_or(trimmed);
    parse_decimal(&stripped.replace(',', ""))
        .map_err(|_| Error::InvalidNumber(s.to_string()))
}

pub(crate) fn parse_decimal(s: &str) -> Result<Decimal, Error> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| Error::InvalidNumber(s.to_string()))
}

/// A realized disposal: one sale fragment matched against one lot fragment of
/// the same number of units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "SaleSerializer")]
pub(crate) struct Sale {
    pub fund: String,
    pub date_acquired: NaiveDate,
    pub date_sold: NaiveDate,
    pub proceeds: Decimal,
    pub cost: Decimal,
    pub units: Decimal,
}

impl Sale {
    pub fn gain_loss(&self) -> Decimal {
        self.proceeds - self.cost
    }

    pub fn description(&self) -> String {
        format!("{} {}", self.units, self.fund)
    }
}

/// `Sale` as it appears in the sales report, with the derived columns filled in.
#[derive(Serialize)]
pub(crate) struct SaleSerializer {
    #[serde(rename = "DESCRIPTION")]
    pub description: String,
    #[serde(rename = "DATE ACQUIRED")]
    pub date_acquired: String,
    #[serde(rename = "DATE SOLD")]
    pub date_sold: String,
    #[serde(rename = "PROCEEDS")]
    pub proceeds: Decimal,
    #[serde(rename = "COST")]
    pub cost: Decimal,
    #[serde(rename = "GAIN/LOSS")]
    pub gain_loss: Decimal,
}

impl From<Sale> for SaleSerializer {
    fn from(sale: Sale) -> Self {
        Self {
            description: sale.description(),
            date_acquired: sale.date_acquired.format(DATE_FORMAT).to_string(),
            date_sold: sale.date_sold.format(DATE_FORMAT).to_string(),
            gain_loss: sale.gain_loss(),
            proceeds: sale.proceeds,
            cost: sale.cost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxClass {
    Buy,
    Dividend,
    Sale,
}

/// The labels each class of transaction goes by on a statement. Matching
/// ignores case and surrounding whitespace, and the three sets never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Verbs {
    buy: HashSet<String>,
    dividend: HashSet<String>,
    sale: HashSet<String>,
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

impl Default for Verbs {
    fn default() -> Self {
        Self {
            buy: ["Buy Investments", "Auto-Rebalance Purchase"]
                .iter()
                .map(|v| normalize(v))
                .collect(),
            dividend: ["Reinvested Dividend"].iter().map(|v| normalize(v)).collect(),
            sale: [
                "Sell Investments",
                "Auto-Rebalance Sale",
                "Sale Of Recordkeeping Fee",
            ]
            .iter()
            .map(|v| normalize(v))
            .collect(),
        }
    }
}

impl Verbs {
    /// Adds labels on top of the existing ones.
    pub fn extend<S: AsRef<str>>(
        mut self,
        buy: &[S],
        dividend: &[S],
        sale: &[S],
    ) -> Result<Self, Error> {
        self.buy.extend(buy.iter().map(|v| normalize(v.as_ref())));
        self.dividend
            .extend(dividend.iter().map(|v| normalize(v.as_ref())));
        self.sale.extend(sale.iter().map(|v| normalize(v.as_ref())));
        self.check_disjoint()?;
        Ok(self)
    }

    fn check_disjoint(&self) -> Result<(), Error> {
        let overlap = self
            .buy
            .intersection(&self.dividend)
            .chain(self.buy.intersection(&self.sale))
            .chain(self.dividend.intersection(&self.sale))
            .next();
        match overlap {
            Some(label) => Err(Error::OverlappingVerb(label.clone())),
            None => Ok(()),
        }
    }

    pub fn is_buy(&self, kind: &str) -> bool {
        self.buy.contains(&normalize(kind))
    }

    pub fn is_dividend(&self, kind: &str) -> bool {
        self.dividend.contains(&normalize(kind))
    }

    pub fn is_sale(&self, kind: &str) -> bool {
        self.sale.contains(&normalize(kind))
    }

    pub fn classify(&self, kind: &str) -> Result<TxClass, Error> {
        if self.is_buy(kind) {
            Ok(TxClass::Buy)
        } else if self.is_dividend(kind) {
            Ok(TxClass::Dividend)
        } else if self.is_sale(kind) {
            Ok(TxClass::Sale)
        } else {
            Err(Error::UnknownTransactionType(kind.to_string()))
        }
    }
}

/// Everything that can go wrong with the ledger itself. None of these are
/// recoverable: the run stops at the first one.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown transaction type '{0}'")]
    UnknownTransactionType(String),
    #[error("Cannot split off {requested} units of {fund}, only {available} available")]
    InsufficientUnits {
        fund: String,
        requested: Decimal,
        available: Decimal,
    },
    #[error("Not enough lots of {fund} to sell {requested} units, only {available} held")]
    InsufficientLots {
        fund: String,
        requested: Decimal,
        available: Decimal,
    },
    #[error("Sale of {0} with no lots recorded for it")]
    UnknownFund(String),
    #[error("Sale of {fund} for {amount} has no units")]
    NoUnitsSold { fund: String, amount: Decimal },
    #[error("Split size must be positive, got {0}")]
    InvalidSplit(Decimal),
    #[error("Transaction amount for {0} must not be negative")]
    NegativeAmount(String),
    #[error("Transaction units for {0} must not be negative")]
    NegativeUnits(String),
    #[error("Transaction of {fund} for {amount} has no units")]
    UnitlessAmount { fund: String, amount: Decimal },
    #[error("Unrecognized date '{0}'")]
    InvalidDate(String),
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("Transaction type '{0}' is configured for more than one class")]
    OverlappingVerb(String),
}
