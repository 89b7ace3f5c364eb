use crate::data::{Error, Sale, Transaction, TxClass, Verbs};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// Unsold acquisitions of a single fund, oldest first. Lots only ever enter at
/// the back and leave (or shrink) at the front.
#[derive(Debug)]
pub(crate) struct LotQueue {
    fund: String,
    lots: VecDeque<Transaction>,
}

impl LotQueue {
    pub fn new(fund: &str) -> Self {
        Self {
            fund: fund.to_string(),
            lots: VecDeque::new(),
        }
    }

    pub fn push(&mut self, lot: Transaction) {
        self.lots.push_back(lot);
    }

    pub fn units(&self) -> Decimal {
        self.iter().map(|lot| lot.units).sum()
    }

    pub fn fund(&self) -> &str {
        &self.fund
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.lots.iter()
    }
}

/// The lot queues of every fund seen so far. Queues are kept in the order
/// their fund first appeared so that the final holdings are deterministic.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    index: HashMap<String, usize>,
    queues: Vec<LotQueue>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lot(&mut self, lot: Transaction) {
        let i = match self.index.get(&lot.fund) {
            Some(i) => *i,
            None => {
                self.queues.push(LotQueue::new(&lot.fund));
                self.index.insert(lot.fund.clone(), self.queues.len() - 1);
                self.queues.len() - 1
            }
        };
        self.queues[i].push(lot);
    }

    pub fn queue_mut(&mut self, fund: &str) -> Option<&mut LotQueue> {
        let i = *self.index.get(fund)?;
        self.queues.get_mut(i)
    }

    /// Whatever is left across all funds, oldest acquisition first.
    pub fn into_remaining(self) -> Vec<Transaction> {
        let mut lots: Vec<Transaction> = self
            .queues
            .into_iter()
            .flat_map(|queue| queue.lots)
            .collect();
        sort_by_date(&mut lots);
        lots
    }
}

/// Stable, so transactions on the same day keep their statement order.
pub(crate) fn sort_by_date(txs: &mut [Transaction]) {
    txs.sort_by_key(|tx| tx.date);
}

/// Matches one sale against the fund's lots, oldest first, consuming whole
/// lots while the sale is larger and splitting the last one it touches.
///
/// The sale must be for some units, and the queue must hold at least as many
/// as the sale; if not, nothing is touched and an error is returned.
pub(crate) fn calculate_sales(mut tx: Transaction, lots: &mut LotQueue) -> Result<Vec<Sale>, Error> {
    if tx.units <= Decimal::ZERO {
        return Err(Error::NoUnitsSold {
            fund: tx.fund,
            amount: tx.amount,
        });
    }
    let available = lots.units();
    if tx.units > available {
        return Err(Error::InsufficientLots {
            fund: tx.fund,
            requested: tx.units,
            available,
        });
    }

    let mut sales = Vec::new();
    while tx.units > Decimal::ZERO {
        let Some(front) = lots.lots.front_mut() else {
            return Err(Error::InsufficientLots {
                fund: tx.fund,
                requested: tx.units,
                available: Decimal::ZERO,
            });
        };
        if front.units.is_zero() {
            warn!(fund = %front.fund, date = %front.date, amount = %front.amount, "discarding lot with no units");
            lots.lots.pop_front();
            continue;
        }

        // Either the sale swallows the whole lot, or the sale runs out and
        // the lot stays at the front with whatever is left of it.
        let units = tx.units.min(front.units);
        let chunk = tx.split_off(units)?;
        let lot = front.split_off(units)?;
        if front.units.is_zero() {
            lots.lots.pop_front();
        }

        let sale = Sale {
            fund: chunk.fund,
            date_acquired: lot.date,
            date_sold: chunk.date,
            proceeds: chunk.amount,
            cost: lot.amount,
            units,
        };
        debug!(
            fund = %sale.fund,
            units = %sale.units,
            acquired = %sale.date_acquired,
            sold = %sale.date_sold,
            proceeds = %sale.proceeds,
            cost = %sale.cost,
            "matched sale"
        );
        sales.push(sale);
    }
    Ok(sales)
}

/// Runs the whole ledger, which must already be sorted by date. Buys and
/// reinvested dividends become lots, sales are matched against them.
/// Returns every realized sale in order, and the lots still held.
pub(crate) fn calculate_gains(
    txs: Vec<Transaction>,
    verbs: &Verbs,
) -> Result<(Vec<Sale>, Vec<Transaction>), Error> {
    let mut ledger = Ledger::new();
    let mut sales = Vec::new();
    for tx in txs {
        match tx.class(verbs)? {
            TxClass::Buy | TxClass::Dividend => ledger.add_lot(tx),
            TxClass::Sale => {
                let lots = ledger
                    .queue_mut(&tx.fund)
                    .ok_or_else(|| Error::UnknownFund(tx.fund.clone()))?;
                debug!(fund = lots.fund(), units = %tx.units, lots = lots.len(), "selling");
                sales.extend(calculate_sales(tx, lots)?);
            }
        }
    }
    Ok((sales, ledger.into_remaining()))
}

pub(crate) fn filter_dividends(txs: &[Transaction], verbs: &Verbs) -> Vec<Transaction> {
    txs.iter()
        .filter(|tx| tx.is_dividend(verbs))
        .cloned()
        .collect()
}

pub(crate) fn calculate_dividends<'a, I>(txs: I) -> Decimal
where
    I: IntoIterator<Item = &'a Transaction>,
{
    txs.into_iter().map(|tx| tx.amount).sum()
}
