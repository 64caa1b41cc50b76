use std::{path::PathBuf, time::Duration};

use alloy::{
    network::EthereumWallet, providers::ProviderBuilder, signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use clap::{Parser, Subcommand};
use eyre::WrapErr;
use orbit_setup::{
    deposit::deposit, preflight, strictly_above, wait_until, Amount, ChainClients, ChildChain,
    CheckpointStore, ParentChain, PollSettings, RpcChain, Settings, SetupConfig, SetupError,
    Step, StepStatus, Workflow,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbit-setup", version)]
#[command(about = "Fund, seed and configure a freshly deployed Orbit chain, resuming where the last run stopped")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Chain description written by the deployment tooling
    #[arg(long, global = true, default_value = "./config/orbitSetupScriptConfig.json")]
    config: PathBuf,

    /// Where progress is recorded between runs
    #[arg(long, global = true, default_value = "./config/resumeState.json")]
    checkpoint: PathBuf,

    #[arg(long, global = true, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    #[arg(long, global = true, env = "PARENT_CHAIN_RPC_URL")]
    parent_rpc: Option<Url>,

    #[arg(long, global = true, env = "ORBIT_RPC_URL")]
    child_rpc: Option<Url>,

    /// Amount sent to the batch poster and to the staker
    #[arg(long, global = true, default_value = "0.3")]
    funding_amount: String,

    /// Amount deposited to the chain owner on the child chain
    #[arg(long, global = true, env = "AMOUNT", default_value = "0.4")]
    deposit_amount: String,

    /// Seconds between balance checks while waiting for a deposit
    #[arg(long, global = true, default_value_t = 30)]
    poll_interval: u64,

    /// Checks after which the waiting message hints at stale chain data
    #[arg(long, global = true, default_value_t = 6)]
    slow_hint_after: u32,

    /// Give up waiting for a deposit after this many checks
    #[arg(long, global = true)]
    max_polls: Option<u32>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run every step that has not completed yet (default)
    Run,
    /// Deposit to the chain owner on the child chain and wait for it to arrive
    Deposit,
    /// Show the recorded progress for the configured chain
    Status,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,orbit_setup={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let setup = SetupConfig::from_file(&cli.config)
        .wrap_err_with(|| format!("loading {}", cli.config.display()))?;
    let settings = Settings {
        setup,
        checkpoint_path: cli.checkpoint.clone(),
        funding_amount: Amount::parse(&cli.funding_amount)?,
        deposit_amount: Amount::parse(&cli.deposit_amount)?,
        poll: PollSettings {
            interval: Duration::from_secs(cli.poll_interval),
            slow_hint_after: cli.slow_hint_after,
            max_misses: cli.max_polls,
        },
    };

    if let Some(Command::Status) = cli.command {
        return status(&settings);
    }

    let (private_key, parent_rpc, child_rpc) =
        match (cli.private_key, cli.parent_rpc, cli.child_rpc) {
            (Some(key), Some(parent), Some(child)) => (key, parent, child),
            _ => {
                return Err(SetupError::config(
                    "PRIVATE_KEY, PARENT_CHAIN_RPC_URL and ORBIT_RPC_URL are required",
                )
                .into())
            }
        };
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .map_err(|err| SetupError::config(format!("invalid private key: {err}")))?;
    let address = signer.address();
    let wallet = EthereumWallet::from(signer);

    let parent = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet.clone())
        .on_http(parent_rpc);
    let child = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_http(child_rpc);
    let clients = ChainClients {
        parent: RpcChain::new("parent", parent, address),
        child: RpcChain::new("child", child, address),
    };
    info!(signer = %address, "connected to parent and child chain");

    preflight(&clients, &settings).await?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Deposit => top_up(&clients, &settings).await,
        _ => run(&clients, &settings).await,
    }
}

async fn run<P: ParentChain, C: ChildChain>(
    clients: &ChainClients<P, C>,
    settings: &Settings,
) -> eyre::Result<()> {
    let workflow = Workflow::new(clients, settings);
    let state = workflow.load_state()?;

    match workflow.run(state).await {
        Ok(report) => {
            let resumed = report.steps.iter().filter(|s| s.resumed).count();
            info!(
                steps = report.steps.len(),
                resumed,
                "all steps done, the chain is funded and configured"
            );
            Ok(())
        }
        Err(abort) => {
            error!(
                step = %abort.step,
                checkpoint = %workflow.store().path().display(),
                "setup stopped, rerun the same command to continue from this step"
            );
            Err(abort.into())
        }
    }
}

/// Stand-alone deposit: does not read or write the checkpoint.
async fn top_up<P: ParentChain, C: ChildChain>(
    clients: &ChainClients<P, C>,
    settings: &Settings,
) -> eyre::Result<()> {
    let owner = settings.setup.chain_owner;
    let baseline = clients.child.balance(owner).await?;
    deposit(&clients.parent, &settings.setup, &settings.deposit_amount).await?;

    let balance = wait_until(
        || clients.child.balance(owner),
        strictly_above(baseline),
        settings.poll.interval,
        settings.poll.reporter("deposit on the child chain"),
    )
    .await?;
    info!(
        %owner,
        %balance,
        amount = %settings.deposit_amount.display,
        "deposit arrived on the child chain"
    );
    Ok(())
}

fn status(settings: &Settings) -> eyre::Result<()> {
    let store = CheckpointStore::new(&settings.checkpoint_path);
    let state = store.load(settings.setup.chain_id)?;

    println!("{}", serde_json::to_string_pretty(&state)?);
    for step in Step::all() {
        let status = if step.is_done(&state) {
            StepStatus::Done
        } else {
            StepStatus::Pending
        };
        println!("{:<40} {status:?}", step.to_string());
    }
    Ok(())
}
