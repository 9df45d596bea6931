use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tasklist_core::{Status, TaskFilter};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tasklist",
    version,
    about = "Keep a list of tasks with a status and a deadline",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show tasks, newest first.
    List {
        #[arg(
            long,
            default_value = "all",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<TaskFilter>())
        )]
        filter: TaskFilter,
    },
    /// Add a task from the form fields.
    Add {
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        status: Option<String>,
        /// Deadline as DD.MM.YYYY.
        #[arg(long, default_value = "")]
        deadline: String,
    },
    /// Replace a task's description.
    Edit { id: String, text: String },
    /// Change a task's status.
    Status {
        id: String,
        #[arg(value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Status>()))]
        status: Status,
    },
    Remove { id: String },
    Show { id: String },
}

impl Default for Command {
    fn default() -> Self {
        Command::List {
            filter: TaskFilter::All,
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tasklist_core::{Status, TaskFilter};

    use super::{Command, GlobalCli, KeyVal};

    #[test]
    fn parses_key_value_overrides() {
        let kv: KeyVal = " locale = en ".parse().expect("parse");
        assert_eq!(kv.key, "locale");
        assert_eq!(kv.value, "en");
        assert!("locale".parse::<KeyVal>().is_err());
    }

    #[test]
    fn no_subcommand_means_list_all() {
        let cli = GlobalCli::parse_from(["tasklist", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.unwrap_or_default(), Command::default());
    }

    #[test]
    fn parses_list_filter_and_status() {
        let cli = GlobalCli::parse_from(["tasklist", "list", "--filter", "done"]);
        assert_eq!(
            cli.command,
            Some(Command::List {
                filter: TaskFilter::Done
            })
        );

        let cli = GlobalCli::parse_from(["tasklist", "--rc", "seed=off", "status", "7", "Canceled"]);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(
            cli.command,
            Some(Command::Status {
                id: "7".into(),
                status: Status::Canceled
            })
        );
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(GlobalCli::try_parse_from(["tasklist", "status", "1", "someday"]).is_err());
    }
}
