//! # Carfunnel - THE BINARY (library half)
//!
//! Async driver around `carfunnel-core`: the Query Dispatcher, the HTTP
//! lookup client, the single-owner funnel session and the CLI. Exposed as
//! a library so integration tests can drive a session directly.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   apps/carfunnel (THE BINARY)                │
//! │                                                              │
//! │   CLI (clap) ──▶ FunnelSession ──▶ Dispatcher ──▶ Lookup     │
//! │                       │     ▲          │  spawn     (reqwest) │
//! │                       │     └─ mpsc ───┘                     │
//! │                       ▼                                      │
//! │               ┌────────────────┐                             │
//! │               │ carfunnel-core │                             │
//! │               │  (THE LOGIC)   │                             │
//! │               └────────────────┘                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod logging;
pub mod lookup;
pub mod search;
pub mod session;
pub mod view;

pub use config::Config;
pub use dispatcher::{Completion, Dispatcher, Verdict};
pub use lookup::{HttpLookup, Lookup};
pub use session::{Applied, FunnelSession};
