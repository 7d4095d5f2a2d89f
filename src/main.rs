use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use supastake::config::plans::all_plans;
use supastake::config::ReadStrategy;
use supastake::dashboard::{claim_label, position_views, DashboardSummary, StakeSummary};
use supastake::provider::HttpProvider;
use supastake::units::format_fixed;
use supastake::{AppConfig, CommandOutcome, Web3Connection};

#[derive(Parser, Debug)]
#[command(name = "supastake")]
#[command(about = "Stake SPC, track positions and claim rewards")]
struct Args {
    /// JSON-RPC endpoint (overrides SUPASTAKE_RPC_URL)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Account to act as; otherwise the node's first account is used
    #[arg(short, long)]
    account: Option<String>,

    /// Position read strategy: per-id or batched
    #[arg(long)]
    read_strategy: Option<ReadStrategy>,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the staking plans
    Plans,
    /// Connect the wallet and report account and network
    Connect,
    /// Connect and print the account overview
    Dashboard,
    /// Approve and stake tokens under a plan
    Stake {
        amount: String,
        #[arg(short, long, default_value = "0")]
        plan: String,
    },
    /// Unstake a position by id
    Unstake { position_id: String },
    /// Claim all pending rewards
    Claim,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if let Command::Plans = args.command {
        return print_plans(args.json);
    }

    let mut config = AppConfig::from_env();
    if let Some(url) = &args.rpc_url {
        config.network.rpc_url = url.clone();
    }
    if let Some(strategy) = args.read_strategy {
        config.read_strategy = strategy;
    }
    config.validate()?;

    let mut provider = HttpProvider::new(&config.network.rpc_url);
    if let Some(account) = &args.account {
        provider = provider.with_account(account);
    }

    let symbol = config.token_symbol.clone();
    let connection = Web3Connection::new(config, Arc::new(provider))?;
    let account = connection.connect().await?;
    if !connection.is_on_expected_network() {
        log::warn!(
            "Connected to chain {:?}, expected {}",
            connection.chain_id(),
            connection.config().network.chain_id
        );
    }

    match args.command {
        Command::Plans => Ok(()),
        Command::Connect => print_connection(&connection, &account, args.json),
        Command::Dashboard => print_dashboard(&connection, &account, &symbol, args.json),
        Command::Stake { amount, plan } => {
            if let Some(summary) = StakeSummary::new(&amount, &plan, &connection.snapshot().balance) {
                log::info!(
                    "Staking {} {} in {} ({}% APY, {}), est. {} {}/year",
                    format_fixed(summary.amount, 2),
                    symbol,
                    summary.plan_name,
                    summary.apy,
                    summary.duration,
                    format_fixed(summary.estimated_yearly_reward, 2),
                    symbol
                );
            }
            report(connection.stake(&amount, &plan).await, args.json)
        }
        Command::Unstake { position_id } => report(connection.unstake(&position_id).await, args.json),
        Command::Claim => report(connection.claim().await, args.json),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_connection(connection: &Web3Connection, account: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let network = &connection.config().network;
    if json {
        return print_json(&serde_json::json!({
            "account": account,
            "chainId": connection.chain_id(),
            "expectedChainId": network.chain_id,
            "onExpectedNetwork": connection.is_on_expected_network(),
        }));
    }

    println!("Connected as {}", account);
    match connection.chain_id() {
        Some(id) if connection.is_on_expected_network() => println!("Network: {} ({})", network.chain_name, id),
        Some(id) => println!("Wrong network: chain {} (expected {})", id, network.chain_id),
        None => println!("Network: unknown"),
    }
    Ok(())
}

fn print_plans(json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        return print_json(&all_plans());
    }
    for plan in all_plans() {
        println!(
            "[{}] {:<10} {:>5}% APY  {:<10} {}% fee",
            plan.id, plan.name, plan.apy, plan.duration, plan.fee
        );
        for feature in &plan.features {
            println!("      - {}", feature);
        }
    }
    Ok(())
}

fn print_dashboard(
    connection: &Web3Connection,
    account: &str,
    symbol: &str,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let snapshot = connection.snapshot();
    let summary = DashboardSummary::from_snapshot(&snapshot);
    let views = position_views(&snapshot, symbol, chrono::Utc::now());

    if json {
        #[derive(Serialize)]
        struct Dashboard<'a> {
            account: &'a str,
            summary: &'a DashboardSummary,
            positions: &'a [supastake::dashboard::PositionView],
        }
        return print_json(&Dashboard {
            account,
            summary: &summary,
            positions: &views,
        });
    }

    println!("Account:          {}", account);
    println!("Total staked:     {} {}", format_fixed(summary.total_staked, 2), symbol);
    println!("Pending rewards:  {} {}", summary.pending_rewards, symbol);
    println!("Wallet balance:   {} {}", summary.balance, symbol);
    println!("Active positions: {} of {}", summary.active_positions, summary.total_positions);
    println!("Average APY:      {}%", format_fixed(summary.average_apy, 1));
    println!("                  [{}]", claim_label(&summary.pending_rewards, symbol));

    if views.is_empty() {
        println!("\nNo staking positions");
    }
    for view in views {
        println!(
            "\n#{} {}{}\n  {}  {}: {}  multiplier {}  rewards {}",
            view.id,
            view.plan_name,
            if view.unlocked { " (Unlocked)" } else { "" },
            view.amount,
            view.date_label,
            view.date,
            view.multiplier,
            view.rewards
        );
    }
    Ok(())
}

fn report(outcome: CommandOutcome, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        print_json(&outcome)?;
    } else if outcome.success {
        println!("{}", outcome.message);
        if let Some(tx) = &outcome.tx_hash {
            println!("tx: {}", tx);
        }
    } else {
        eprintln!("Failed: {}", outcome.message);
    }

    if outcome.success {
        Ok(())
    } else {
        Err(outcome.message.into())
    }
}
