use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Method, Url};
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "hashledger-cli")]
#[command(about = "CLI client for the hashledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new chain and print its id
    Create {
        /// Difficulty for this chain; the node default otherwise
        #[arg(long)]
        difficulty: Option<u32>,
    },
    /// Print every block of a chain
    Show { id: String },
    /// Check a chain's integrity
    Valid { id: String },
    /// Mine a block holding the given transactions directly
    Append {
        id: String,
        /// JSON array, e.g. '[{"from":"bank","to":"alice","amount":5}]'
        #[arg(long)]
        transactions: String,
        /// Block timestamp in milliseconds
        #[arg(long)]
        timestamp: Option<u64>,
    },
    /// Submit a transaction to the pending pool
    Submit {
        id: String,
        /// Sender
        #[arg(long)]
        from: String,
        /// Recipient
        #[arg(long)]
        to: String,
        /// Amount
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
    },
    /// Mine the pending pool
    Mine {
        id: String,
        /// Account credited with the (deferred) reward
        #[arg(long)]
        reward_address: String,
    },
    /// Replay the chain for an account's balance
    Balance { id: String, address: String },
}

/// Method, path segments and JSON body for a command. Segments are raw; `endpoint` encodes them.
fn request_for(cmd: &Command) -> Result<(Method, Vec<&str>, Option<Value>)> {
    Ok(match cmd {
        Command::Create { difficulty } => (
            Method::POST,
            vec!["chain"],
            difficulty.map(|d| json!({ "difficulty": d })),
        ),
        Command::Show { id } => (Method::GET, vec!["chain", id.as_str()], None),
        Command::Valid { id } => (Method::GET, vec!["chain", id.as_str(), "isvalid"], None),
        Command::Append {
            id,
            transactions,
            timestamp,
        } => {
            let transactions: Value =
                serde_json::from_str(transactions).context("--transactions is not valid JSON")?;
            (
                Method::POST,
                vec!["chain", id.as_str(), "block"],
                Some(json!({ "transactions": transactions, "timestamp": timestamp })),
            )
        }
        Command::Submit {
            id,
            from,
            to,
            amount,
        } => (
            Method::POST,
            vec!["chain", id.as_str(), "transactions"],
            Some(json!({ "from": from, "to": to, "amount": amount })),
        ),
        Command::Mine { id, reward_address } => (
            Method::POST,
            vec!["chain", id.as_str(), "mine"],
            Some(json!({ "rewardAddress": reward_address })),
        ),
        Command::Balance { id, address } => (
            Method::GET,
            vec!["chain", id.as_str(), "balance", address.as_str()],
            None,
        ),
    })
}

fn endpoint(node: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(node).with_context(|| format!("invalid node URL {node}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("node URL {node} cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let (method, segments, body) = request_for(&cli.cmd)?;
    let url = endpoint(&cli.node, &segments)?;
    debug!("{method} {url}");

    let client = reqwest::Client::new();
    let mut req = client.request(method, url);
    if let Some(body) = body {
        req = req.json(&body);
    }
    let res = req.send().await?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
