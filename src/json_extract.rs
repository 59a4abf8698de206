//! Layered JSON recovery for generative-model responses.
//!
//! Model output is only loosely guaranteed to be well-formed JSON: it may be
//! wrapped in prose, fenced in a markdown code block, or both. Instead of
//! scattering ad-hoc recovery logic across callers, extraction is an ordered
//! list of strategies tried in sequence; the first one that yields valid JSON
//! wins. New recovery strategies (e.g. trailing-comma repair) slot in without
//! touching caller code.

use crate::error::{CharlaError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A single JSON recovery strategy.
///
/// Returns the candidate substring to parse, or `None` if the strategy does
/// not apply to this response. The extractor handles the actual parse.
trait ParseStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn candidate<'a>(&self, response: &'a str) -> Option<&'a str>;
}

/// Parse the whole response as-is.
struct DirectParse;

impl ParseStrategy for DirectParse {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn candidate<'a>(&self, response: &'a str) -> Option<&'a str> {
        Some(response.trim())
    }
}

/// Extract the contents of the first fenced code block (```json ... ``` or
/// plain ``` ... ```).
struct FencedBlock;

impl ParseStrategy for FencedBlock {
    fn name(&self) -> &'static str {
        "fenced-block"
    }

    fn candidate<'a>(&self, response: &'a str) -> Option<&'a str> {
        let start = response.find("```")?;
        let after_fence = &response[start + 3..];
        // Skip an optional language tag on the fence line.
        let body_start = after_fence.find('\n')?;
        let body = &after_fence[body_start + 1..];
        let end = body.find("```")?;
        Some(body[..end].trim())
    }
}

/// Take the substring between the first `{` and the last `}`.
struct BraceSlice;

impl ParseStrategy for BraceSlice {
    fn name(&self) -> &'static str {
        "brace-slice"
    }

    fn candidate<'a>(&self, response: &'a str) -> Option<&'a str> {
        let start = response.find('{')?;
        let end = response.rfind('}')?;
        if end > start {
            Some(&response[start..=end])
        } else {
            None
        }
    }
}

/// Layered JSON extractor over an ordered set of recovery strategies.
pub struct JsonExtractor {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl JsonExtractor {
    /// Create an extractor with the default strategy order:
    /// direct parse, fenced code block, brace-delimited slice.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(DirectParse),
                Box::new(FencedBlock),
                Box::new(BraceSlice),
            ],
        }
    }

    /// Extract a JSON object from a model response.
    ///
    /// Tries each strategy in order and returns the first successful parse.
    /// Fails with `MalformedResponse` if no strategy recovers valid JSON.
    pub fn extract(&self, response: &str) -> Result<Value> {
        for strategy in &self.strategies {
            if let Some(candidate) = strategy.candidate(response) {
                if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                    tracing::debug!(strategy = strategy.name(), "Recovered JSON from response");
                    return Ok(value);
                }
            }
        }

        Err(CharlaError::MalformedResponse(format!(
            "no strategy recovered JSON from: {}",
            truncate(response, 200)
        )))
    }

    /// Extract and deserialize into a typed value.
    ///
    /// A response that parses as JSON but does not match the expected shape
    /// fails with `Validation` rather than `MalformedResponse`.
    pub fn extract_as<T: DeserializeOwned>(&self, response: &str) -> Result<T> {
        let value = self.extract(response)?;
        serde_json::from_value(value).map_err(|e| CharlaError::Validation(e.to_string()))
    }
}

impl Default for JsonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(s: &str, max_len: usize) -> &str {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
