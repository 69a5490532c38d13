use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use concert_tickets::address::Address;
use concert_tickets::config::AppConfig;
use concert_tickets::contract::ContractAddress;
use concert_tickets::rpc::NodeClient;
use concert_tickets::services::TicketServices;
use concert_tickets::view::format_li;

const DEFAULT_CONFIG_PATH: &str = "config/tickets.toml";

#[derive(Parser)]
#[command(author, version, about = "Mint and redeem Zilliqa concert tickets")]
struct Cli {
    /// Configuration file used by `gui` and `inspect`
    #[arg(
        short,
        long,
        global = true,
        env = "CONCERT_TICKETS_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the ticket window (default)
    Gui,
    /// Read a ticket contract and print its state
    Inspect {
        #[arg(long)]
        contract: String,
        /// Account whose tickets are listed
        #[arg(long)]
        account: Option<String>,
    },
    /// Print an address in base16, checksummed and bech32 form
    Address { address: String },
    /// Write the default configuration file
    GenerateConfig {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = cli.config;
    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => run_gui(config)?,
        Commands::Inspect { contract, account } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(inspect(contract, account, config))?
        }
        Commands::Address { address } => print_address(&address)?,
        Commands::GenerateConfig { path } => generate_config(path)?,
    }

    Ok(())
}

#[cfg(feature = "gui")]
fn run_gui(config_path: PathBuf) -> Result<()> {
    use concert_tickets::ui::{self, GuiFlags};

    let config = AppConfig::load_or_default(&config_path)?;
    let services = TicketServices::from_config(&config)?;
    if !services.has_provider() {
        info!("no signer endpoint configured; wallet connect will fail");
    }
    ui::launch(GuiFlags {
        services,
        config_path: Some(config_path),
    })
    .map_err(|err| anyhow!("gui terminated: {err}"))
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config_path: PathBuf) -> Result<()> {
    Err(anyhow!(
        "the ticket window is disabled. Rebuild with --features gui to enable it."
    ))
}

async fn inspect(contract: String, account: Option<String>, config_path: PathBuf) -> Result<()> {
    let config = AppConfig::load_or_default(&config_path)?;
    let node = NodeClient::from_endpoint(&config.network.rpc_endpoint, config.request_timeout())?;
    let network = node
        .get_network_id()
        .await
        .context("failed to query the network id")?;
    info!(%network, endpoint = %node.endpoint(), "connected to node");

    let account = match account {
        Some(raw) => raw.parse::<Address>()?,
        None => Address::from_bytes([0u8; 20]),
    };
    let services = TicketServices::from_config(&config)?;
    let snapshot = services
        .read_contract(&ContractAddress::new(contract), &account)
        .await?;
    let state = &snapshot.state;

    println!("Contract:      {}", snapshot.contract.to_checksum());
    println!("Bech32:        {}", snapshot.contract.to_bech32());
    println!("Network:       {network}");
    println!("Name:          {}", state.token_name.as_deref().unwrap_or("-"));
    println!("Owner:         {}", state.contract_owner.as_deref().unwrap_or("-"));
    println!("Price:         {} LI", format_li(state.token_price));
    println!("Total tickets: {}", state.max_token_supply);
    println!("Sold:          {}", state.token_id_count);
    println!("Left:          {}", state.tickets_left());
    if snapshot.owned.is_empty() {
        println!("Owned:         none");
    } else {
        let owned: Vec<_> = snapshot.owned.iter().map(|id| id.as_str()).collect();
        println!("Owned:         {}", owned.join(", "));
    }
    Ok(())
}

fn print_address(raw: &str) -> Result<()> {
    let address: Address = raw.parse()?;
    println!("base16:   {}", address.to_base16());
    println!("checksum: {}", address.to_checksum());
    println!("bech32:   {}", address.to_bech32());
    Ok(())
}

fn generate_config(path: PathBuf) -> Result<()> {
    let config = AppConfig::default();
    config.save(&path)?;
    info!(?path, "wrote default configuration");
    Ok(())
}
