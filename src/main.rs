use anyhow::Context;
use clap::Parser;
use compute::{calculate_dividends, calculate_gains, filter_dividends, sort_by_date};
use data::{Transaction, Verbs};
use read::read_transactions;
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::info;
use write::{write_sales, write_transactions};

mod compute;
mod data;
mod logging;
mod read;
mod write;

const ABOUT: &str = "Realized capital gains from an investment account statement, matched FIFO";

#[derive(Parser, Debug)]
#[command(version, about = ABOUT)]
struct Args {
    /// Tab-separated statement with DATE, AMOUNT, FUND, UNITS and TYPE columns
    transactions_file: PathBuf,

    /// Where to write the reinvested dividends
    dividends_file: PathBuf,

    /// Where to write the realized sales
    sales_file: PathBuf,

    /// Where to write the lots still held
    lots_file: PathBuf,

    /// Lots carried forward from a previous period, as written to lots_file.
    /// May be given multiple times.
    #[arg(short = 'l', long = "lots")]
    prior_lots: Vec<PathBuf>,

    /// Extra TYPE label to treat as a purchase. May be given multiple times.
    #[arg(long)]
    buy_verb: Vec<String>,

    /// Extra TYPE label to treat as a reinvested dividend.
    #[arg(long)]
    dividend_verb: Vec<String>,

    /// Extra TYPE label to treat as a sale.
    #[arg(long)]
    sale_verb: Vec<String>,

    /// Log each matched sale to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn load(path: &Path) -> Result<Vec<Transaction>, anyhow::Error> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut txs = Vec::new();
    read_transactions(file, &mut txs).with_context(|| format!("cannot read {}", path.display()))?;
    info!(file = %path.display(), records = txs.len(), "loaded");
    Ok(txs)
}

fn create(path: &Path) -> Result<BufWriter<File>, anyhow::Error> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    logging::setup_tracing(args.verbose);

    let verbs = Verbs::default().extend(
        args.buy_verb.as_slice(),
        args.dividend_verb.as_slice(),
        args.sale_verb.as_slice(),
    )?;

    // Carried-forward lots go first so they stay ahead of same-day purchases.
    let mut transactions = Vec::new();
    for path in &args.prior_lots {
        transactions.extend(load(path)?);
    }
    transactions.extend(load(&args.transactions_file)?);
    sort_by_date(&mut transactions);

    let dividends = filter_dividends(&transactions, &verbs);
    let dividends_total = calculate_dividends(&dividends);
    let (sales, lots) = calculate_gains(transactions, &verbs)?;
    info!(
        dividends = dividends.len(),
        sales = sales.len(),
        lots = lots.len(),
        "gains calculated"
    );

    println!("Dividends: ${dividends_total}");
    write_transactions(create(&args.dividends_file)?, &dividends)
        .with_context(|| format!("cannot write {}", args.dividends_file.display()))?;
    write_sales(create(&args.sales_file)?, &sales)
        .with_context(|| format!("cannot write {}", args.sales_file.display()))?;
    write_transactions(create(&args.lots_file)?, &lots)
        .with_context(|| format!("cannot write {}", args.lots_file.display()))?;
    Ok(())
}
