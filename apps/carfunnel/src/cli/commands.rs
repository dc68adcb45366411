//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::browse::{BROWSE_HELP, BrowseCommand};
use crate::config::Config;
use crate::lookup::{HttpLookup, Lookup};
use crate::session::{Applied, FunnelSession};
use crate::view::{TerminalView, format_funnel};
use carfunnel_core::{FunnelError, StageId, StageView, registry};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Build the HTTP lookup client from configuration.
fn http_lookup(config: &Config) -> Result<HttpLookup, FunnelError> {
    Ok(HttpLookup::new(&config.backend.base_url, config.timeout())?)
}

// =============================================================================
// STAGES COMMAND
// =============================================================================

/// Print the stage registry.
pub fn cmd_stages(json_mode: bool) -> Result<(), FunnelError> {
    if json_mode {
        let stages: Vec<_> = registry::iter()
            .map(|d| {
                serde_json::json!({
                    "stage": d.id,
                    "depends_on": d.depends_on,
                    "endpoint": d.endpoint,
                    "request_param": d.request_param,
                    "placeholder": d.placeholder,
                    "control_id": d.control_id,
                    "search_param": d.search_param,
                })
            })
            .collect();
        println!("{}", to_json(&stages)?);
    } else {
        println!("Stages:");
        for d in registry::iter() {
            let query = d
                .request_param
                .map(|p| format!("?{}=<{}>", p, d.depends_on.map_or("", |s| s.name())))
                .unwrap_or_default();
            println!(
                "  {}. {:<10} {}{:<24} \"{}\"",
                d.id.index().saturating_add(1),
                d.id.name(),
                d.endpoint,
                query,
                d.placeholder
            );
        }
    }
    Ok(())
}

// =============================================================================
// FETCH COMMAND
// =============================================================================

/// Run one lookup and print what came back.
///
/// Unlike the funnel, failures are reported, not absorbed.
pub async fn cmd_fetch(
    config: &Config,
    stage: &str,
    param: Option<String>,
    json_mode: bool,
) -> Result<(), FunnelError> {
    let stage = registry::resolve(stage)?;
    let descriptor = registry::descriptor(stage);
    if descriptor.request_param.is_some() && param.is_none() {
        tracing::warn!(
            "Stage {} is normally queried with --param ({})",
            stage,
            descriptor.request_param.unwrap_or_default()
        );
    }

    let options = http_lookup(config)?.fetch(descriptor, param).await?;

    if json_mode {
        println!("{}", to_json(&options)?);
    } else {
        println!("{} ({} options):", stage, options.len());
        for option in &options {
            println!("  {:<20} {}", option.value, option.label);
        }
    }
    Ok(())
}

// =============================================================================
// WALK COMMAND
// =============================================================================

/// Select each value in funnel order, waiting for every lookup, then print.
pub async fn cmd_walk(
    config: &Config,
    values: &[String],
    json_mode: bool,
) -> Result<(), FunnelError> {
    let mut session = FunnelSession::open(http_lookup(config)?, ());
    report_failures(&session.settle().await);

    for (stage, value) in StageId::ALL.into_iter().zip(values) {
        tracing::info!("Selecting {} = {}", stage, value);
        let value = session.controller().slot(stage).resolve(value).to_string();
        session.select(stage, &value)?;
        report_failures(&session.settle().await);
    }

    let url = session.search_url(&config.backend.base_url)?;
    if json_mode {
        let output = serde_json::json!({
            "stages": session.snapshot(),
            "search_url": url.as_str(),
        });
        println!("{}", to_json(&output)?);
    } else {
        println!("{}", format_funnel(&session.snapshot()));
        println!();
        println!("Search: {}", url);
    }
    Ok(())
}

fn report_failures(applied: &[Applied]) {
    for a in applied {
        if let Applied::Failed { stage } = a {
            tracing::warn!("Stage {} could not be loaded; it stays empty", stage);
        }
    }
}

// =============================================================================
// BROWSE COMMAND
// =============================================================================

/// Interactive funnel over stdin.
///
/// Lookup completions are applied as they arrive, concurrently with input.
pub async fn cmd_browse(config: &Config) -> Result<(), FunnelError> {
    println!("Carfunnel {} - backend {}", env!("CARGO_PKG_VERSION"), config.backend.base_url);
    println!("{}", BROWSE_HELP);
    println!();

    let mut session = FunnelSession::open(http_lookup(config)?, TerminalView::new());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.map_err(|e| FunnelError::Io(e.to_string()))? else {
                    break;
                };
                match BrowseCommand::parse(&line) {
                    Ok(BrowseCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = run_browse_command(&mut session, command, config) {
                            println!("! {}", e);
                        }
                    }
                    Err(e) => println!("! {}", e),
                }
            }
            Some(completion) = session.next_completion() => {
                if let Applied::Failed { stage } = session.apply(completion) {
                    println!("! {} could not be loaded (try 'reload {}')", stage, stage);
                }
            }
        }
    }

    tracing::debug!(
        renders = session.controller().view().renders(),
        in_flight = session.in_flight(),
        "browse finished"
    );
    Ok(())
}

/// Execute one browse command against the session.
pub fn run_browse_command<L: Lookup, V: StageView>(
    session: &mut FunnelSession<L, V>,
    command: BrowseCommand,
    config: &Config,
) -> Result<(), FunnelError> {
    match command {
        BrowseCommand::Select { stage, value } => {
            let value = session.controller().slot(stage).resolve(&value).to_string();
            session.select(stage, &value)?;
        }
        BrowseCommand::Clear(stage) => {
            session.select(stage, "")?;
        }
        BrowseCommand::Reload(stage) => {
            session.reload(stage)?;
        }
        BrowseCommand::Show => println!("{}", format_funnel(&session.snapshot())),
        BrowseCommand::Search => {
            println!("{}", session.search_url(&config.backend.base_url)?);
        }
        BrowseCommand::Help => println!("{}", BROWSE_HELP),
        BrowseCommand::Quit | BrowseCommand::Nothing => {}
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, FunnelError> {
    serde_json::to_string_pretty(value).map_err(|e| FunnelError::Io(e.to_string()))
}
