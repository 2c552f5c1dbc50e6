use color_eyre::Result;

mod logging;
mod subcommands;

#[derive(clap::Parser)]
#[command(
    name = "gridmate",
    version,
    about = "Browse and edit schema-less DynamoDB items as a table",
    long_about = None
)]
struct Cli {
    /// Increase output verbosity (-v, -vv, etc.)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Endpoint URL for the DynamoDB service
    #[arg(long, global = true)]
    endpoint_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List the tables of the account
    ListTables {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },
    /// Flatten the items of a table into columns and rows
    Items(subcommands::items::Args),
    /// Set attributes on one item
    Update(subcommands::update::Args),
    /// Delete one item
    Remove(subcommands::remove::Args),
    /// Remove all data from a table by recreating it empty
    Clear(subcommands::clear::Args),
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("install aws-lc-rs provider");

    color_eyre::install()?;
    let cli = <Cli as clap::Parser>::parse();
    logging::init(cli.verbose);

    let client = gridmate::aws::new_client(cli.endpoint_url.as_deref()).await?;
    match cli.command {
        Commands::ListTables { json } => {
            let options = subcommands::list_tables::Options { json };
            subcommands::list_tables::command(&client, options).await
        }
        Commands::Items(args) => subcommands::items::command(&client, args).await,
        Commands::Update(args) => subcommands::update::command(&client, args).await,
        Commands::Remove(args) => subcommands::remove::command(&client, args).await,
        Commands::Clear(args) => subcommands::clear::command(&client, args).await,
    }
}
