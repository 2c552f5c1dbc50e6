use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};

use gridmate::dynamodb::{TableKeys, describe_table, remove_item};

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Table holding the item
    #[arg(long, value_name = "TABLE")]
    pub table: String,

    /// Partition key value of the item
    #[arg(long, value_name = "VALUE")]
    pub pk: String,

    /// Sort key value, for tables with a composite key
    #[arg(long, value_name = "VALUE")]
    pub sk: Option<String>,
}

pub async fn command(client: &aws_sdk_dynamodb::Client, args: Args) -> Result<()> {
    let table_desc = describe_table(client, &args.table)
        .await
        .wrap_err_with(|| format!("Failed to describe table {}", args.table))?;
    let keys = TableKeys::from_table_description(&table_desc).map_err(|err| eyre!(err))?;
    let key = keys
        .key_for(&args.pk, args.sk.as_deref())
        .map_err(|err| eyre!("Invalid item key: {err}"))?;

    remove_item(client, &args.table, key)
        .await
        .wrap_err_with(|| format!("Failed to remove item from {}", args.table))?;

    println!("Removed item {} from {}", args.pk, args.table);
    Ok(())
}
