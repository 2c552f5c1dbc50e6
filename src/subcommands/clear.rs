use color_eyre::{
    Result,
    eyre::{WrapErr, bail},
};

use gridmate::dynamodb::clear_table;

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Table to empty
    #[arg(long, value_name = "TABLE")]
    pub table: String,

    /// Confirm that every item of the table should be removed
    #[arg(long)]
    pub yes: bool,
}

pub async fn command(client: &aws_sdk_dynamodb::Client, args: Args) -> Result<()> {
    if !args.yes {
        bail!(
            "Refusing to remove ALL the data from {} without --yes",
            args.table
        );
    }

    clear_table(client, &args.table)
        .await
        .wrap_err_with(|| format!("Failed to clear {}", args.table))?;

    println!("Removed all data from {}", args.table);
    Ok(())
}
