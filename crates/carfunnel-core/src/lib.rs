//! # carfunnel-core
//!
//! The cascading filter engine for the vehicle search funnel - THE LOGIC.
//!
//! Six dependent stages (manufacturer → model → year → body type →
//! fuel type → location). Each stage's options are looked up using the
//! value chosen one stage upstream; changing a stage invalidates everything
//! after it.
//!
//! ## Components
//!
//! - `registry` - static stage table (endpoints, parameters, placeholders)
//! - `dispatch` - per-stage sequence ledger and lookup body decoding
//! - `render` - option renderer and the `StageView` output port
//! - `controller` - the cascade state machine, sole owner of `store`
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Never initiates a lookup; it reports which one is needed and
//!   judges the completion the driver brings back
//! - A lookup failure is never an error at this layer; it degrades the
//!   affected stage to a disabled placeholder

// =============================================================================
// MODULES
// =============================================================================

pub mod controller;
pub mod dispatch;
pub mod registry;
pub mod render;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    FilterOption, FunnelError, LookupError, Request, STAGE_COUNT, Sequence, StageId, StageState,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use controller::{Cascade, CascadeController};
pub use dispatch::{SequenceLedger, decode_options};
pub use registry::{STAGES, StageDescriptor};
pub use render::{RenderEvent, StageView};
pub use store::{StageSlot, StageSnapshot, StageStore};
