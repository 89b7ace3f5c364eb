use crate::data::{Error, Transaction};
use anyhow::Context;

/// Trait for doing something with a `Transaction` read from a statement.
/// Collecting into a `Vec` is all the gains calculation needs, since it has to
/// sort everything first, but tests use it to watch records as they arrive.
pub(crate) trait TransactionUser {
    fn use_tx(&mut self, tx: Transaction) -> Result<(), Error>;
}

impl TransactionUser for Vec<Transaction> {
    fn use_tx(&mut self, tx: Transaction) -> Result<(), Error> {
        self.push(tx);
        Ok(())
    }
}

/// Tab-separated importer for `Transaction`s. Stops at the first bad record.
pub(crate) fn read_transactions<R: std::io::Read, U: TransactionUser>(
    reader: R,
    user: &mut U,
) -> Result<(), anyhow::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(reader);
    for (row, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let line = row + 2;
        let tx: Transaction = result.with_context(|| format!("bad record on line {line}"))?;
        user.use_tx(tx)
            .with_context(|| format!("cannot use record on line {line}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        data::{Error, Transaction},
        read::{read_transactions, TransactionUser},
        write::write_transactions,
    };
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn read_tx() {
        let statement = b"\
DATE\tAMOUNT\tFUND\tUNITS\tTYPE
01/04/2021\t$100.00\tTotal Market\t10\tBuy Investments
01/15/2021\t$1.11\tTotal Market\t0.1101\tReinvested Dividend
2021-02-01\t $1,500.25 \tBond Index\t150.5\tAuto-Rebalance Purchase
03/01/21\t12.00\tTotal Market\t1\tSell Investments
";
        let mut txs: Vec<Transaction> = Vec::new();
        read_transactions(&statement[..], &mut txs).unwrap();
        assert_eq!(
            txs,
            [
                Transaction {
                    date: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
                    amount: dec!(100.00),
                    fund: "Total Market".to_string(),
                    units: dec!(10),
                    kind: "Buy Investments".to_string(),
                },
                Transaction {
                    date: NaiveDate::from_ymd_opt(2021, 1, 15).unwrap(),
                    amount: dec!(1.11),
                    fund: "Total Market".to_string(),
                    units: dec!(0.1101),
                    kind: "Reinvested Dividend".to_string(),
                },
                Transaction {
                    date: NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
                    amount: dec!(1500.25),
                    fund: "Bond Index".to_string(),
                    units: dec!(150.5),
                    kind: "Auto-Rebalance Purchase".to_string(),
                },
                Transaction {
                    date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
                    amount: dec!(12.00),
                    fund: "Total Market".to_string(),
                    units: dec!(1),
                    kind: "Sell Investments".to_string(),
                },
            ]
        )
    }

    #[test]
    fn read_bad_date() {
        let statement = b"\
DATE\tAMOUNT\tFUND\tUNITS\tTYPE
01/04/2021\t$100.00\tX\t10\tBuy Investments
Jan 5 2021\t$100.00\tX\t10\tBuy Investments
";
        let mut txs: Vec<Transaction> = Vec::new();
        let err = read_transactions(&statement[..], &mut txs).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"), "{err:#}");
        assert_eq!(txs.len(), 1);
    }

    #[test]
    fn read_stops_when_user_fails() {
        struct Refuse(usize);
        impl TransactionUser for Refuse {
            fn use_tx(&mut self, tx: Transaction) -> Result<(), Error> {
                self.0 += 1;
                Err(Error::UnknownTransactionType(tx.kind))
            }
        }
        let statement = b"\
DATE\tAMOUNT\tFUND\tUNITS\tTYPE
01/04/2021\t100\tX\t10\tGift
01/05/2021\t100\tX\t10\tGift
";
        let mut refuse = Refuse(0);
        assert!(read_transactions(&statement[..], &mut refuse).is_err());
        assert_eq!(refuse.0, 1);
    }

    #[test]
    fn export_then_import() {
        let txs = vec![
            Transaction {
                date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
                amount: dec!(36),
                fund: "X".to_string(),
                units: dec!(3),
                kind: "Buy Investments".to_string(),
            },
            Transaction {
                date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
                amount: dec!(0.07),
                fund: "Y Fund".to_string(),
                units: dec!(0.000123),
                kind: "Reinvested Dividend".to_string(),
            },
        ];
        let mut out = Vec::new();
        write_transactions(&mut out, &txs).unwrap();
        let mut back: Vec<Transaction> = Vec::new();
        read_transactions(&out[..], &mut back).unwrap();
        assert_eq!(back, txs);
    }
}
