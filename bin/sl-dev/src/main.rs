//! SubLedger Development Runner
//!
//! Loads configuration, opens the registry (restoring its snapshot when
//! persistence is on) and walks one subscription through
//! offer -> sign -> pause -> resume, printing the status after each step.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use sl_common::{init_logging_with, LogFormat, LogOptions};
use sl_config::{AppConfig, ConfigLoader};
use sl_registry::{
    ContractLimits, CreateSubscriptionContractCommand, ExecutionContext, RegistryError,
    RegistrySettings, SubscriptionRegistry, SubscriptionStatus,
};

#[derive(Parser, Debug)]
#[command(name = "sl-dev")]
#[command(about = "SubLedger development runner - offer, sign, pause and resume one subscription")]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, env = "SUBLEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Subscription id to use for the scenario
    #[arg(long, default_value = "1")]
    subscription_id: u64,

    /// Principal offering the subscription
    #[arg(long, default_value = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")]
    producer: String,

    /// Principal signing and controlling the subscription
    #[arg(long, default_value = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8")]
    consumer: String,

    /// Dump the event log as JSON when done
    #[arg(long)]
    dump_events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", AppConfig::example_toml());
        return Ok(());
    }

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("Failed to load configuration")?;

    init_logging_with(
        "sl-dev",
        &LogOptions {
            default_level: config.logging.level.clone(),
            format: LogFormat::parse(&config.logging.format),
        },
    );

    info!(dev_mode = config.dev_mode, "Starting SubLedger dev runner");

    let registry = SubscriptionRegistry::open(settings_from(&config))
        .await
        .context("Failed to open subscription registry")?;

    run_scenario(&registry, &args).await?;

    if args.dump_events {
        println!("{}", serde_json::to_string_pretty(&registry.events())?);
    }

    info!(events = registry.events().len(), "Dev runner finished");
    Ok(())
}

fn settings_from(config: &AppConfig) -> RegistrySettings {
    RegistrySettings {
        snapshot_path: config.registry.snapshot_path(),
        limits: ContractLimits {
            max_endpoint_uri_length: config.registry.max_endpoint_uri_length,
            max_payload_bytes: config.registry.max_payload_bytes,
        },
    }
}

async fn run_scenario(registry: &SubscriptionRegistry, args: &Args) -> Result<()> {
    let id = args.subscription_id;
    let producer = ExecutionContext::create(args.producer.as_str());

    let created = match registry
        .create_subscription_contract(
            producer,
            CreateSubscriptionContractCommand {
                consumer: args.consumer.clone(),
                subscription_id: id,
                endpoint_uri: "https://hello.world".to_string(),
                term1: 1,
                term2: 1,
                term3: 1,
                payload: vec![1, 2, 3, 4],
            },
        )
        .await
    {
        Ok(event) => event,
        Err(RegistryError::DuplicateId { .. }) => {
            // Restored from a snapshot on an earlier run
            let status = registry.get_subscription(id).await?.status;
            warn!(subscription_id = id, %status, "Subscription already exists, skipping scenario");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    report(registry, id, "offered").await?;

    let consumer = ExecutionContext::from_parent_event(&created, args.consumer.as_str());
    registry.sign_subscription_contract(consumer.clone(), id).await?;
    report(registry, id, "signed").await?;

    let paused = registry.pause_subscription(consumer.clone(), id).await?;
    info!(
        subscription_id = paused.subscription_id,
        from = %paused.previous_status,
        to = %paused.new_status,
        "Observed status change"
    );
    report(registry, id, "paused").await?;

    registry.resume_subscription(consumer, id).await?;
    report(registry, id, "resumed").await?;

    Ok(())
}

async fn report(registry: &SubscriptionRegistry, id: u64, step: &str) -> Result<()> {
    let code = registry.get_subscription_status(id).await?;
    let status = SubscriptionStatus::from_ordinal(code)
        .map(|s| s.as_str())
        .unwrap_or("UNKNOWN");
    println!("{:<8} subscription {} -> {} ({})", step, id, code, status);
    Ok(())
}
