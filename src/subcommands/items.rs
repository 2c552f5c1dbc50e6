use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use tokio::sync::watch;

use gridmate::config::{Overrides, Settings};
use gridmate::dynamodb::{ScanSource, TableKeys, describe_table};
use gridmate::grid::{
    AggregationResult, Aggregator, TimeoutSource, json::to_json_string, text,
};

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Table to list
    #[arg(long, value_name = "TABLE")]
    pub table: String,

    /// Output in JSON format
    #[arg(short, long)]
    pub json: bool,

    /// Stop after this many pages [env: GRIDMATE_MAX_PAGES, default: 11]
    #[arg(long, value_name = "N")]
    pub max_pages: Option<usize>,

    /// Items requested per page [env: GRIDMATE_PAGE_SIZE, default: 2500]
    #[arg(long, value_name = "N")]
    pub page_size: Option<i32>,

    /// Use eventually consistent reads
    #[arg(long)]
    pub eventual: bool,

    /// Give up on a page after this many milliseconds (0 disables)
    /// [env: GRIDMATE_FETCH_TIMEOUT_MS]
    #[arg(long, value_name = "MS")]
    pub fetch_timeout_ms: Option<u64>,

    /// Widest a column may render in the text table
    #[arg(long, value_name = "CELLS", default_value_t = text::DEFAULT_COLUMN_CAP)]
    pub column_width: usize,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            max_pages: self.max_pages,
            page_size: self.page_size,
            eventual_read: self.eventual,
            fetch_timeout_ms: self.fetch_timeout_ms,
        }
    }
}

pub async fn command(client: &aws_sdk_dynamodb::Client, args: Args) -> Result<()> {
    let settings = Settings::from_env()?.apply(&args.overrides())?;
    tracing::debug!(?settings, table = %args.table, "Listing items");

    let table_desc = describe_table(client, &args.table)
        .await
        .wrap_err_with(|| format!("Failed to describe table {}", args.table))?;
    let keys = TableKeys::from_table_description(&table_desc).map_err(|err| eyre!(err))?;
    let source = ScanSource::new(client.clone(), args.table.clone(), keys)
        .page_size(settings.page_size)
        .consistent_read(settings.consistent_read);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping at the next page boundary");
            let _ = cancel_tx.send(true);
        }
    });

    let aggregator = Aggregator::new(settings.max_pages).with_cancellation(cancel_rx);
    let result = match settings.fetch_timeout {
        Some(timeout) => {
            aggregator
                .run(&mut TimeoutSource::new(source, timeout))
                .await
        }
        None => {
            let mut source = source;
            aggregator.run(&mut source).await
        }
    }
    .wrap_err_with(|| format!("Failed to list items of {}", args.table))?;

    if args.json {
        println!("{}", to_json_string(&result)?);
    } else {
        print!("{}", text::render_table(&result, args.column_width));
        eprintln!("{}", summary(&result));
    }
    Ok(())
}

fn summary(result: &AggregationResult) -> String {
    let mut line = format!(
        "{} item(s), {} column(s), {} page(s)",
        result.rows.len(),
        result.registry.len(),
        result.pages_fetched
    );
    if result.truncated {
        line.push_str("; more items exist, raise --max-pages to see them");
    }
    line
}
