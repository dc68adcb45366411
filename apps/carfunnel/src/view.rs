//! # Terminal View
//!
//! `StageView` implementation for the interactive `browse` loop: every
//! render is printed as one dropdown line.

use carfunnel_core::{FilterOption, StageId, StageSnapshot, StageView, registry};

/// Prints each render to stdout.
#[derive(Debug, Default)]
pub struct TerminalView {
    renders: usize,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of renders printed so far.
    pub fn renders(&self) -> usize {
        self.renders
    }
}

impl StageView for TerminalView {
    fn render(&mut self, stage: StageId, options: &[FilterOption], enabled: bool) {
        self.renders = self.renders.saturating_add(1);
        println!("{}", format_dropdown(stage, options, enabled, None));
    }
}

/// One dropdown as a single line: `#2 model      [on ] Select Model | Civic [civic]`.
///
/// The chosen option, if any, is wrapped in `*`. An option whose value
/// differs from its label shows the value in brackets: `Honda [honda]`.
pub fn format_dropdown(
    stage: StageId,
    options: &[FilterOption],
    enabled: bool,
    selected: Option<&str>,
) -> String {
    let flag = if enabled { "on " } else { "off" };
    let entries: Vec<String> = options
        .iter()
        .map(|o| {
            let shown = if o.is_placeholder() || o.value == o.label {
                o.label.clone()
            } else {
                format!("{} [{}]", o.label, o.value)
            };
            if !o.is_placeholder() && selected == Some(o.value.as_str()) {
                format!("*{}*", shown)
            } else {
                shown
            }
        })
        .collect();
    format!(
        "#{} {:<10} [{}] {}",
        stage.index().saturating_add(1),
        stage.name(),
        flag,
        entries.join(" | ")
    )
}

/// Multi-line funnel listing for `show` and `walk`.
pub fn format_funnel(snapshot: &[StageSnapshot]) -> String {
    snapshot
        .iter()
        .map(|s| {
            let line = format_dropdown(s.stage, &s.options, s.enabled, s.selected.as_deref());
            format!("{}  ({}, {})", line, s.state, registry::descriptor(s.stage).control_id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
