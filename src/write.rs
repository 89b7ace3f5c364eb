use crate::data::{Sale, Transaction, SALE_HEADER, TRANSACTION_HEADER};

/// The header is written by hand so that an empty report still has one.
fn tsv_writer<W: std::io::Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

/// Basic TSV exporter for `Transaction`s, readable again by `read_transactions`.
pub(crate) fn write_transactions<'a, W, I>(writer: W, txs: I) -> Result<(), anyhow::Error>
where
    W: std::io::Write,
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut wtr = tsv_writer(writer);
    wtr.write_record(TRANSACTION_HEADER)?;
    for tx in txs {
        wtr.serialize(tx)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Basic TSV exporter for `Sale`s
pub(crate) fn write_sales<'a, W, I>(writer: W, sales: I) -> Result<(), anyhow::Error>
where
    W: std::io::Write,
    I: IntoIterator<Item = &'a Sale>,
{
    let mut wtr = tsv_writer(writer);
    wtr.write_record(SALE_HEADER)?;
    for sale in sales {
        wtr.serialize(sale)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_sales, write_transactions};
    use crate::data::{Sale, Transaction};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn write_sales_report() {
        let sales = [
            Sale {
                fund: "X".to_string(),
                date_acquired: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                date_sold: NaiveDate::from_ymd_opt(2021, 1, 3).unwrap(),
                proceeds: dec!(125.00),
                cost: dec!(100),
                units: dec!(10),
            },
            Sale {
                fund: "X".to_string(),
                date_acquired: NaiveDate::from_ymd_opt(2021, 1, 2).unwrap(),
                date_sold: NaiveDate::from_ymd_opt(2021, 1, 3).unwrap(),
                proceeds: dec!(25.00),
                cost: dec!(30.50),
                units: dec!(2),
            },
        ];
        let mut out = Vec::new();
        write_sales(&mut out, &sales).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\
DESCRIPTION\tDATE ACQUIRED\tDATE SOLD\tPROCEEDS\tCOST\tGAIN/LOSS
10 X\t01/01/2021\t01/03/2021\t125.00\t100\t25.00
2 X\t01/02/2021\t01/03/2021\t25.00\t30.50\t-5.50
"
        );
    }

    #[test]
    fn write_empty_reports() {
        let mut out = Vec::new();
        write_transactions(&mut out, &Vec::<Transaction>::new()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "DATE\tAMOUNT\tFUND\tUNITS\tTYPE\n"
        );
    }

    #[test]
    fn write_transaction_report() {
        let txs = [Transaction {
            date: NaiveDate::from_ymd_opt(2021, 1, 2).unwrap(),
            amount: dec!(36),
            fund: "Total Market".to_string(),
            units: dec!(3.000),
            kind: "Buy Investments".to_string(),
        }];
        let mut out = Vec::new();
        write_transactions(&mut out, &txs).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\
DATE\tAMOUNT\tFUND\tUNITS\tTYPE
01/02/2021\t36\tTotal Market\t3.000\tBuy Investments
"
        );
    }
}
