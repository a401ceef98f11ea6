use clap::Parser;
use hashledger_node::{
    constants::{DEFAULT_LISTEN, DEFAULT_MAX_DIFFICULTY},
    router, settings, AppState,
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// TOML file with defaults for new chains
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default difficulty (leading zero hex characters)
    #[arg(long)]
    difficulty: Option<u32>,

    /// Give up on a block after this many nonces
    #[arg(long)]
    max_mining_attempts: Option<u64>,

    /// Highest difficulty a client may request for a new chain
    #[arg(long, default_value_t = DEFAULT_MAX_DIFFICULTY)]
    max_difficulty: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = settings::ledger_config(
        args.config.as_deref(),
        args.difficulty,
        args.max_mining_attempts,
    )?;
    info!(
        "Chain defaults: difficulty {}, reward {} {}",
        config.difficulty, config.mining_reward, config.currency_symbol
    );

    let state = AppState::with_max_difficulty(config, args.max_difficulty);
    let registry = Arc::clone(&state.registry);
    let app = router(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!("hashledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down, cancelling in-flight mining");
            }
            registry.cancel_mining();
        })
        .await?;
    Ok(())
}
