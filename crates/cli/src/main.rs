//! Command line interface for the LP receipt ledger.
mod config;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::DeploymentConfig;
use dotenv::dotenv;
use lp_receipts_execution::prelude::*;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEPOSITOR: Address = Address::from_low_u64(0xD3);
const TREASURY: Address = Address::from_low_u64(0x7E5);

#[derive(Parser)]
#[command(name = "lp-receipts")]
#[command(about = "Splittable deposit receipts for staked AMM liquidity", long_about = None)]
struct Cli {
    /// JSON deployment config; defaults to the Optimism sUSD/USDC pool
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deposit, split, value, claim and withdraw against an in-memory chain
    Demo {
        /// Pooled tokens to deposit, whole units
        #[arg(short, long, default_value = "0.01")]
        amount: Decimal,

        /// Share of the receipt to split off, in percent
        #[arg(short, long, default_value = "53")]
        split_pct: Decimal,

        /// Reward tokens credited to the vault before claiming, whole units
        #[arg(short, long, default_value = "25")]
        reward: Decimal,
    },
    /// Price a quantity of pooled tokens in USD
    Value {
        /// Pooled tokens, whole units
        #[arg(short, long)]
        liquidity: Decimal,
    },
    /// Print the effective deployment config as JSON
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = DeploymentConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Demo {
            amount,
            split_pct,
            reward,
        } => run_demo(&config, amount, split_pct, reward).await,
        Commands::Value { liquidity } => {
            let chain = deploy(&config)?;
            let liquidity = to_wad(liquidity)?;
            let quote = chain.view_quote_remove_liquidity(liquidity).await?;
            let value = chain.price_liquidity(liquidity).await?;

            println!("📊 Redemption quote");
            println!(
                "  {:<6} {}",
                config.token_a.symbol,
                display(quote.amount_a, config.token_a.decimals)
            );
            println!(
                "  {:<6} {}",
                config.token_b.symbol,
                display(quote.amount_b, config.token_b.decimals)
            );
            println!("  Value  ${}", usd(value));
            Ok(())
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Builds a chain with a fresh oracle round and the configured reserves.
fn deploy(config: &DeploymentConfig) -> Result<Chain> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let oracle = ManualOracle::new(config.oracle_price, clock.unix());
    let quoter = ReserveQuoter::new(config.reserves()?);
    Ok(Chain::new(
        config.genesis()?,
        Arc::new(quoter),
        Arc::new(oracle),
        clock,
    ))
}

async fn run_demo(
    config: &DeploymentConfig,
    amount: Decimal,
    split_pct: Decimal,
    reward: Decimal,
) -> Result<()> {
    if split_pct < Decimal::ZERO || split_pct >= Decimal::ONE_HUNDRED {
        bail!("split percentage must be in [0, 100), got {split_pct}");
    }
    let chain = deploy(config)?;
    let lp = config.staking_token;
    let deposit = to_wad(amount)?;
    let fraction = to_wad(split_pct / Decimal::ONE_HUNDRED)?.0;

    println!("🚀 Deploying vault for {DEPOSITOR}...");
    chain.mint_tokens(lp, DEPOSITOR, deposit).await?;
    let vault = chain.make_new_depositor(DEPOSITOR).await?.value;
    println!("  Vault {vault}");

    chain.approve_tokens(DEPOSITOR, lp, vault, deposit).await?;
    let parent = chain.deposit_to_gauge(DEPOSITOR, vault, deposit).await?.value;
    println!("✅ Deposited {amount} LP, receipt #{parent}");

    let child = chain.split(DEPOSITOR, parent, fraction).await?.value;
    println!("✂️  Split {split_pct}% off #{parent} into #{child}");
    for id in [parent, child] {
        print_record(&chain, id).await?;
    }

    if let Some(&reward_token) = config.reward_tokens.first() {
        let reward = to_wad(reward)?;
        chain.mint_tokens(reward_token, TREASURY, reward).await?;
        chain
            .notify_reward(TREASURY, reward_token, vault, reward)
            .await?;
        let pending = chain.view_pending_rewards(vault, reward_token).await?;
        println!("🎁 Pending rewards: {}", display(pending, 18));

        let claimed = chain
            .claim_rewards(DEPOSITOR, vault, &[reward_token])
            .await?
            .value;
        for (token, amount) in claimed {
            println!("  Claimed {} of {token}", display(amount, 18));
        }
    }

    let withdrawal = chain
        .withdraw_from_gauge(DEPOSITOR, vault, child, &config.reward_tokens)
        .await?
        .value;
    println!(
        "🏦 Withdrew #{child}: {} LP returned, {} LP still staked",
        display(withdrawal.principal, 18),
        display(chain.staked(vault).await?, 18)
    );

    let events = chain.events().await;
    info!(events = events.len(), "Demo finished");
    println!("\n📜 Event log");
    println!("════════════════════════════════════");
    for logged in events {
        println!("{:?}", logged.event);
    }
    println!("════════════════════════════════════");
    Ok(())
}

async fn print_record(chain: &Chain, id: PositionId) -> Result<()> {
    let pooled = chain.pooled_tokens(id).await?;
    let value = chain
        .price_record(id)
        .await
        .with_context(|| format!("pricing receipt #{id}"))?;
    println!("  #{id:<4} {:>24} LP  ${}", display(pooled, 18), usd(value));
    Ok(())
}

fn to_wad(value: Decimal) -> Result<TokenAmount> {
    TokenAmount::from_decimal(value, 18)
        .with_context(|| format!("{value} is not a valid 18-decimal amount"))
}

fn display(amount: TokenAmount, decimals: u8) -> String {
    amount
        .to_decimal(decimals)
        .map_or_else(|| amount.to_string(), |d| d.to_string())
}

fn usd(value: TokenAmount) -> String {
    value
        .to_decimal(18)
        .map_or_else(|| value.to_string(), |d| d.round_dp(2).to_string())
}
