//! # Browse Commands
//!
//! Line grammar of the interactive funnel.

use carfunnel_core::{FunnelError, StageId, registry};

/// One line of input in `browse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    /// `select <stage> <value>`; the value may contain spaces.
    Select { stage: StageId, value: String },
    /// `clear <stage>`
    Clear(StageId),
    /// `reload <stage>`
    Reload(StageId),
    /// `show`
    Show,
    /// `search`
    Search,
    /// `help`
    Help,
    /// `quit` / `exit`
    Quit,
    /// Blank line.
    Nothing,
}

pub const BROWSE_HELP: &str = "\
Commands:
  select <stage> <value>   choose a value (stage: name, 1-6 or control id)
  clear <stage>            clear a stage and everything after it
  reload <stage>           re-run a stage's lookup
  show                     print all six stages
  search                   print the listing URL for the current selection
  help                     this text
  quit                     leave";

impl BrowseCommand {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, FunnelError> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match verb.to_ascii_lowercase().as_str() {
            "" => Ok(BrowseCommand::Nothing),
            "select" | "set" => {
                let (stage, value) = rest.split_once(char::is_whitespace).ok_or_else(|| {
                    FunnelError::InvalidInput("usage: select <stage> <value>".to_string())
                })?;
                Ok(BrowseCommand::Select {
                    stage: registry::resolve(stage)?,
                    value: value.trim().to_string(),
                })
            }
            "clear" => Ok(BrowseCommand::Clear(registry::resolve(rest)?)),
            "reload" => Ok(BrowseCommand::Reload(registry::resolve(rest)?)),
            "show" | "ls" => Ok(BrowseCommand::Show),
            "search" => Ok(BrowseCommand::Search),
            "help" | "?" => Ok(BrowseCommand::Help),
            "quit" | "exit" | "q" => Ok(BrowseCommand::Quit),
            other => Err(FunnelError::InvalidInput(format!(
                "unknown command '{}' (try 'help')",
                other
            ))),
        }
    }
}
