use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};

use gridmate::dynamodb::{
    TableKeys, UpdateExpression, describe_table, parse_assignment, update_item,
};

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

    /// Attribute to replace. Values are always written as strings, so a
    /// numeric attribute becomes a string. Repeat a name to store a string set.
    #[arg(
        long = "set",
        value_name = "NAME=VALUE",
        required = true,
        action = clap::ArgAction::Append,
        value_parser = parse_assignment
    )]
    pub assignments: Vec<(String, String)>,
}

pub async fn command(client: &aws_sdk_dynamodb::Client, args: Args) -> Result<()> {
    let table_desc = describe_table(client, &args.table)
        .await
        .wrap_err_with(|| format!("Failed to describe table {}", args.table))?;
    let keys = TableKeys::from_table_description(&table_desc).map_err(|err| eyre!(err))?;
    let key = keys
        .key_for(&args.pk, args.sk.as_deref())
        .map_err(|err| eyre!("Invalid item key: {err}"))?;
    let update = UpdateExpression::set_attributes(&args.assignments, &keys)?;

    update_item(client, &args.table, key, update)
        .await
        .wrap_err_with(|| format!("Failed to update item in {}", args.table))?;

    println!(
        "Updated {} attribute(s) of item {} in {}",
        args.assignments.len(),
        args.pk,
        args.table
    );
    Ok(())
}
