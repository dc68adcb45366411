//! # Core Type Definitions
//!
//! This module contains the data model shared by every part of the funnel:
//! - Stage identity (`StageId`) and lifecycle (`StageState`)
//! - Option records (`FilterOption`)
//! - Lookup bookkeeping (`Sequence`, `Request`)
//! - Error types (`LookupError`, `FunnelError`)
//!
//! ## Ordering Guarantees
//!
//! - `StageId` implements `Ord` in funnel order (make first, location last)
//! - Option lists are `Vec`s; the backend's order is kept as received
//! - Sequence numbers use saturating arithmetic and never decrease

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// STAGE IDENTIFIERS
// =============================================================================

/// Number of stages in the funnel.
pub const STAGE_COUNT: usize = 6;

/// One selector in the six-level dependency chain.
///
/// Variants are declared in funnel order, so `Ord` follows the cascade:
/// every stage compares greater than the stages it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Manufacturer.
    Make,
    /// Model of the chosen manufacturer.
    Model,
    /// Model year.
    Year,
    /// Body type.
    CarType,
    /// Fuel type.
    FuelType,
    /// Pick-up location.
    Location,
}

impl StageId {
    /// All stages in funnel order.
    pub const ALL: [StageId; STAGE_COUNT] = [
        StageId::Make,
        StageId::Model,
        StageId::Year,
        StageId::CarType,
        StageId::FuelType,
        StageId::Location,
    ];

    /// Zero-based position in the funnel.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name, also used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StageId::Make => "make",
            StageId::Model => "model",
            StageId::Year => "year",
            StageId::CarType => "car_type",
            StageId::FuelType => "fuel_type",
            StageId::Location => "location",
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(self) -> Option<StageId> {
        Self::ALL.get(self.index().saturating_add(1)).copied()
    }

    /// Get the previous stage, if any.
    #[must_use]
    pub fn previous(self) -> Option<StageId> {
        self.index()
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Every stage after this one, nearest first.
    pub fn downstream(self) -> impl Iterator<Item = StageId> {
        Self::ALL.into_iter().skip(self.index().saturating_add(1))
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// OPTION RECORD
// =============================================================================

/// A single selectable entry in a stage's option list.
///
/// The placeholder entry is also a `FilterOption`, with an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterOption {
    /// Value submitted when this option is chosen.
    pub value: String,
    /// Human-readable label.
    pub label: String,
}

impl FilterOption {
    /// Create a new option.
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Create the "nothing chosen yet" entry for a stage.
    #[must_use]
    pub fn placeholder(label: &str) -> Self {
        Self::new(String::new(), label)
    }

    /// Check if this is a placeholder entry (empty value).
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }
}

// =============================================================================
// STAGE LIFECYCLE
// =============================================================================

/// Lifecycle of a single stage.
///
/// ```text
/// Empty ──dispatch──▶ Loading ──options──▶ Populated ──choose──▶ Selected
///   ▲                    │ no options / failure                     │
///   └────────────────────┴──────────── upstream change ─────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Placeholder only, disabled.
    #[default]
    Empty,
    /// A lookup is outstanding; placeholder only, disabled.
    Loading,
    /// Options rendered and enabled, nothing chosen.
    Populated,
    /// A non-placeholder value is chosen.
    Selected,
}

impl StageState {
    /// Whether the stage accepts user input in this state.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, StageState::Populated | StageState::Selected)
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StageState::Empty => "empty",
            StageState::Loading => "loading",
            StageState::Populated => "populated",
            StageState::Selected => "selected",
        };
        f.write_str(s)
    }
}

// =============================================================================
// LOOKUP BOOKKEEPING
// =============================================================================

/// Per-stage generation number of a lookup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Sequence(pub u64);

impl Sequence {
    /// The next generation, saturating at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Get the raw sequence value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One issued lookup. Ephemeral: lives only until its completion is judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Stage whose options are being fetched.
    pub stage: StageId,
    /// Generation assigned when the request was issued.
    pub sequence: Sequence,
    /// Parent stage's selected value; `None` for the first stage.
    pub param: Option<String>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Why a lookup produced no usable options.
///
/// None of these escape the dispatcher: every variant is folded into an
/// empty option list after being logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The request could not be delivered or the connection broke.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request exceeded the transport timeout.
    #[error("lookup timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("backend returned status {0}")]
    Status(u16),

    /// The body was not a flat list of `{value, text}` records.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl LookupError {
    /// Network-side failures, as opposed to a bad body.
    #[must_use]
    pub fn is_network(&self) -> bool {
        !matches!(self, LookupError::Malformed(_))
    }
}

/// Errors surfaced to drivers of the funnel (CLI, configuration).
///
/// - The cascade itself never fails on a lookup; see [`LookupError`]
/// - Input validation errors leave stage state untouched
#[derive(Debug, Error)]
pub enum FunnelError {
    /// A stage reference did not match any stage.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// The stage is not accepting input (empty or loading).
    #[error("Stage {0} is disabled")]
    StageDisabled(StageId),

    /// The value is not among the stage's rendered options.
    #[error("Stage {stage} has no option {value:?}")]
    UnknownOption {
        /// Stage the selection was made on.
        stage: StageId,
        /// The rejected value.
        value: String,
    },

    /// A command or argument could not be understood.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration file or variable could not be used.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A direct (diagnostic) lookup failed.
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

// =============================================================================
// TESTS
// =============================================================================
