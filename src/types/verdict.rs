//! Structured decision verdicts.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ParleyError, Result};

/// Structured verdict returned by a decision function.
///
/// For selection, `value` is the name of the participant who should speak
/// next; for termination it is `"yes"` or `"no"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    #[serde(rename = "verdict")]
    pub value: String,
    pub reasoning: String,
}

impl Verdict {
    /// Parse a model completion expected to carry the verdict shape.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ParleyError::Decision(format!("unparseable verdict: {e}")))
    }

    /// JSON schema handed to the model service to constrain its output.
    pub fn response_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "verdict": { "type": "string" },
                "reasoning": { "type": "string" }
            },
            "required": ["verdict", "reasoning"],
            "additionalProperties": false
        })
    }

    /// Whether this is an affirmative termination verdict.
    pub fn is_yes(&self) -> bool {
        self.value.trim().eq_ignore_ascii_case("yes")
    }
}
