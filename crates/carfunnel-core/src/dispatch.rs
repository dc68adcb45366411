//! # Dispatch Bookkeeping
//!
//! The synchronous half of the Query Dispatcher: per-stage sequence numbers
//! and decoding of lookup bodies. Issuing the network request and awaiting
//! it is the app layer's job; it brings the completion back here to be judged.
//!
//! ## Staleness
//!
//! Every stage has a monotonic counter. Issuing a request bumps it, and so
//! does invalidating the stage when an upstream selection resets it. A
//! completion is applied only if its sequence equals the counter's current
//! value, which stands in for cancelling superseded requests.

use crate::types::STAGE_COUNT;
use crate::{FilterOption, LookupError, Request, Sequence, StageId};
use serde::Deserialize;

// =============================================================================
// SEQUENCE LEDGER
// =============================================================================

/// Latest generation issued per stage.
#[derive(Debug, Clone, Default)]
pub struct SequenceLedger {
    latest: [Sequence; STAGE_COUNT],
}

impl SequenceLedger {
    /// Create a ledger with every stage at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sequence for `stage` and describe the request.
    pub fn issue(&mut self, stage: StageId, param: Option<String>) -> Request {
        let sequence = self.bump(stage);
        Request {
            stage,
            sequence,
            param,
        }
    }

    /// Supersede any in-flight request for `stage` without issuing a new one.
    pub fn invalidate(&mut self, stage: StageId) -> Sequence {
        self.bump(stage)
    }

    /// Whether `request` is the latest generation for its stage.
    #[must_use]
    pub fn is_current(&self, request: &Request) -> bool {
        self.latest(request.stage) == request.sequence
    }

    /// Latest generation issued (or invalidated) for `stage`.
    #[must_use]
    pub fn latest(&self, stage: StageId) -> Sequence {
        self.latest[stage.index()]
    }

    fn bump(&mut self, stage: StageId) -> Sequence {
        let slot = &mut self.latest[stage.index()];
        *slot = slot.next();
        *slot
    }
}

// =============================================================================
// RESPONSE DECODING
// =============================================================================

/// A `value`/`text` field as the backend may send it.
///
/// Years come back as JSON numbers from some backends.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireScalar {
    Text(String),
    Number(serde_json::Number),
}

impl WireScalar {
    fn into_string(self) -> String {
        match self {
            WireScalar::Text(s) => s,
            WireScalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct WireOption {
    value: WireScalar,
    #[serde(alias = "label")]
    text: WireScalar,
}

/// Decode a lookup body into options, preserving order.
///
/// Anything other than a flat JSON array of `{value, text}` records is
/// [`LookupError::Malformed`]. An empty array is a legitimate "no matches".
pub fn decode_options(body: &[u8]) -> Result<Vec<FilterOption>, LookupError> {
    let records: Vec<WireOption> =
        serde_json::from_slice(body).map_err(|e| LookupError::Malformed(e.to_string()))?;

    Ok(records
        .into_iter()
        .map(|r| FilterOption::new(r.value.into_string(), r.text.into_string()))
        .collect())
}

// =============================================================================
// TESTS
// =============================================================================
