//! Wire types exchanged with the compute service.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Response of the start call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub correlation_id: String,
}

/// Job state as reported by the compute service.
///
/// Anything that is neither `finished` nor `failed` means the job is still
/// going (`queued`, `pending`, or a status this client does not know yet).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RemoteStatus {
    Running,
    Finished,
    Failed,
}

impl From<String> for RemoteStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "finished" | "completed" | "done" => Self::Finished,
            "failed" | "error" => Self::Failed,
            _ => Self::Running,
        }
    }
}

/// Response of the progress call.
///
/// `results` holds only the records completed since the previous poll.
#[derive(Debug, Clone, Deserialize)]
pub struct JobProgress {
    pub status: RemoteStatus,
    #[serde(default, deserialize_with = "lenient_count")]
    pub progress: i64,
    #[serde(default, deserialize_with = "lenient_optional_count")]
    pub total: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<Value>,
    /// Failure description, when the job failed.
    #[serde(default)]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Lenient counters
// ---------------------------------------------------------------------------

/// Counters arrive as integers, floats, numeric strings or `null`.
/// Fractions are floored; anything unreadable counts as absent.
fn count_from(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => return Some(i),
            None => n.as_f64(),
        },
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    float.filter(|f| f.is_finite()).map(|f| f.floor() as i64)
}

fn lenient_optional_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(lenient_optional_count(deserializer)?.unwrap_or(0))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}
