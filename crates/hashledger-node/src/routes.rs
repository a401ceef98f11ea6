use crate::error::ApiError;
use crate::state::{lock, AppState};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use hashledger_core::{parse_transactions, Balance, Block, Ledger, Transaction};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Default, Deserialize)]
struct CreateChain {
    difficulty: Option<u32>,
}

#[derive(Serialize)]
struct Created {
    id: String,
}

#[derive(Serialize)]
struct Validity {
    valid: bool,
}

#[derive(Deserialize)]
struct AppendBlock {
    // Kept untyped so a non-array payload surfaces as MalformedInput.
    #[serde(default)]
    transactions: Value,
    timestamp: Option<u64>,
}

#[derive(Deserialize)]
struct TxIn {
    from: String,
    to: String,
    amount: i64,
}

#[derive(Serialize)]
struct Pending {
    pending: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MineRequest {
    reward_address: String,
}

#[derive(Serialize)]
struct AccountBalance {
    address: String,
    balance: Balance,
    display: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chain", post(create_chain))
        .route("/chain/{id}", get(get_chain))
        .route("/chain/{id}/isvalid", get(is_valid))
        .route("/chain/{id}/block", post(append_block))
        .route("/chain/{id}/transactions", post(submit_transaction))
        .route("/chain/{id}/mine", post(mine))
        .route("/chain/{id}/balance/{address}", get(balance))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Ledger work hashes (and may mine), so it runs off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

async fn with_ledger<T, F>(state: &AppState, id: &str, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Ledger) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let ledger = state.registry.get(id)?;
    blocking(move || {
        let mut guard = lock(&ledger)?;
        f(&mut guard)
    })
    .await
}

/// JSON bodies are parsed by hand so malformed ones get the same `{"error"}` shape as every
/// other failure.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn create_chain(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let req: CreateChain = if body.is_empty() {
        CreateChain::default()
    } else {
        parse_body(&body)?
    };
    let registry = state.registry.clone();
    let id = blocking(move || registry.create(req.difficulty)).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn get_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Block>>, ApiError> {
    let chain = with_ledger(&state, &id, |ledger| Ok(ledger.chain().to_vec())).await?;
    Ok(Json(chain))
}

async fn is_valid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Validity>, ApiError> {
    let valid = with_ledger(&state, &id, |ledger| Ok(ledger.is_valid())).await?;
    Ok(Json(Validity { valid }))
}

async fn append_block(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Vec<Block>>, ApiError> {
    let req: AppendBlock = parse_body(&body)?;
    let transactions = parse_transactions(&req.transactions)?;
    let chain = with_ledger(&state, &id, move |ledger| {
        ledger.add(transactions, req.timestamp)?;
        Ok(ledger.chain().to_vec())
    })
    .await?;
    Ok(Json(chain))
}

async fn submit_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Pending>), ApiError> {
    let tx: TxIn = parse_body(&body)?;
    let pending = with_ledger(&state, &id, move |ledger| {
        ledger.add_transaction(Transaction::new(tx.from, tx.to, tx.amount))?;
        Ok(ledger.pending_transactions().len())
    })
    .await?;
    Ok((StatusCode::ACCEPTED, Json(Pending { pending })))
}

async fn mine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Block>, ApiError> {
    let req: MineRequest = parse_body(&body)?;
    let block = with_ledger(&state, &id, move |ledger| {
        Ok(ledger.mine_pending_transactions(&req.reward_address)?.clone())
    })
    .await?;
    Ok(Json(block))
}

async fn balance(
    State(state): State<AppState>,
    Path((id, address)): Path<(String, String)>,
) -> Result<Json<AccountBalance>, ApiError> {
    let balance = with_ledger(&state, &id, move |ledger| {
        let balance = ledger.get_balance_of_address(&address);
        Ok(AccountBalance {
            display: ledger.format_amount(balance),
            address,
            balance,
        })
    })
    .await?;
    Ok(Json(balance))
}
