use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A transfer of `amount` from one named account to another.
///
/// Field order matters: block hashes are computed over the JSON form of the
/// batch, so `from`, `to`, `amount` must serialize in exactly this order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    from: String,
    to: String,
    amount: i64,
}

impl Transaction {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: i64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }
}

/// Decode an untyped payload into a transaction batch. Only a JSON array is accepted.
pub fn parse_transactions(value: &Value) -> Result<Vec<Transaction>> {
    let items = value.as_array().ok_or_else(|| {
        LedgerError::MalformedInput(format!(
            "transactions must be an array, got {}",
            json_kind(value)
        ))
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Transaction::deserialize(item)
                .map_err(|e| LedgerError::MalformedInput(format!("transaction {i}: {e}")))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
