//! Generation client: prompt in, validated test-case records out

use std::sync::Arc;

use oracle_gateway::{Generator, OracleError};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::record::{TestCaseRecord, COLUMN_ORDER};

/// Failures of one generation attempt
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The oracle could not be reached or returned an unusable envelope
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Response text is not a JSON array
    #[error("Response is not a JSON array of test cases: {reason}")]
    Parse { reason: String, raw: String },

    /// An array element lacks one of the record fields or holds a non-string
    #[error("Test case {index} has no string field \"{field}\"")]
    MissingField {
        index: usize,
        field: String,
        raw: String,
    },
}

impl GenerationError {
    /// Raw oracle text, when the failure happened after a response arrived.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            GenerationError::Oracle(_) => None,
            GenerationError::Parse { raw, .. } | GenerationError::MissingField { raw, .. } => {
                Some(raw)
            }
        }
    }
}

/// Sends prompts to a [`Generator`] and parses its reply.
#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn Generator>,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        GenerationClient { generator }
    }

    /// One round-trip. Parse failures log the raw response at `error`.
    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<Vec<TestCaseRecord>, GenerationError> {
        let raw = self.generator.generate(prompt).await?;

        match parse_response(&raw) {
            Ok(records) => {
                info!(records = records.len(), "Parsed generated test cases");
                Ok(records)
            }
            Err(e) => {
                error!(error = %e, raw = %raw, "Could not parse generation response");
                Err(e)
            }
        }
    }
}

/// Remove a surrounding Markdown code fence (with optional `json` tag).
///
/// Text without a fence is returned trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let after_open = &trimmed[open + 3..];
    let body = after_open.strip_prefix("json").unwrap_or(after_open);
    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

/// Parse model output into records, requiring every field on every element.
pub fn parse_response(raw: &str) -> Result<Vec<TestCaseRecord>, GenerationError> {
    let stripped = strip_code_fences(raw);
    let parse_error = |reason: String| GenerationError::Parse {
        reason,
        raw: raw.to_string(),
    };

    let value: Value = serde_json::from_str(stripped).map_err(|e| parse_error(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(parse_error(format!("expected an array, found {}", kind_of(&value))));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Some(object) = item.as_object() else {
            return Err(parse_error(format!(
                "element {} is {}, not an object",
                index,
                kind_of(&item)
            )));
        };
        if let Some(field) = COLUMN_ORDER
            .iter()
            .find(|field| !matches!(object.get(**field), Some(Value::String(_))))
        {
            return Err(GenerationError::MissingField {
                index,
                field: field.to_string(),
                raw: raw.to_string(),
            });
        }
        let record: TestCaseRecord =
            serde_json::from_value(item).map_err(|e| parse_error(e.to_string()))?;
        records.push(record);
    }
    Ok(records)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
