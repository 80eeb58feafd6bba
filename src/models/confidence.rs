use serde::{Deserialize, Serialize};

/// Outcome of the active-context tier. `strong` means no visual or expensive
/// evidence is needed for this request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResult {
    pub text: String,
    pub strong: bool,
}

impl ConfidenceResult {
    pub fn strong(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            strong: true,
        }
    }

    pub fn weak(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            strong: false,
        }
    }
}
