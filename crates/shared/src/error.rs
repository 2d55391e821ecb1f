use serde::{Deserialize, Serialize};

/// Body the API returns alongside a non-success status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }

    /// Human-readable message for a failed request, falling back to the bare status.
    pub fn message_for_status(detail: Option<&str>, status: u16) -> String {
        match detail.map(str::trim) {
            Some(detail) if !detail.is_empty() => detail.to_string(),
            _ => format!("API Error: {status}"),
        }
    }
}
