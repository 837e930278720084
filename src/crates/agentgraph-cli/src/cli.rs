//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "agentgraph")]
#[command(about = "Walk through agentgraph: from a single chatbot node to handing off between agents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn", env = "AGENTGRAPH_LOG")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// One chatbot node between start and end
    Chat {
        /// User message
        #[arg(default_value = "Hello, how are you?")]
        input: String,
    },

    /// Chatbot with calculator tools (add, multiply, square)
    Tools {
        #[arg(default_value = "What is 2 + 2?")]
        input: String,
    },

    /// Prebuilt ReAct travel advisor hosted as a subgraph
    React {
        #[arg(default_value = "What hotel do you recommend in Aruba?")]
        input: String,
    },

    /// Two turns of one session; the second turn remembers the first
    Memory {
        /// Session id (a random one when omitted)
        #[arg(long)]
        session_id: Option<String>,

        /// Keep checkpoints in this directory instead of in memory
        #[arg(long, env = "AGENTGRAPH_STORE_DIR")]
        store_dir: Option<PathBuf>,

        #[arg(long, default_value = "My name is Bob")]
        first: String,

        #[arg(long, default_value = "What is my name?")]
        second: String,
    },

    /// Travel and hotel advisors handing the conversation to each other
    Handoff {
        #[arg(
            default_value = "i wanna go somewhere warm in the caribbean. pick one destination and give me hotel recommendations"
        )]
        input: String,
    },
}

impl Cli {
    /// Filter directive for the log subscriber
    pub fn log_filter(&self) -> String {
        if self.verbose {
            "debug".to_string()
        } else {
            self.log_level.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["agentgraph", "tools"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Tools {
                input: "What is 2 + 2?".to_string()
            }
        );
        assert!(!cli.verbose);
    }

    #[test]
    fn test_memory_flags() {
        let cli = Cli::try_parse_from([
            "agentgraph",
            "memory",
            "--session-id",
            "abc",
            "--store-dir",
            "/tmp/sessions",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.log_filter(), "debug");
        match cli.command {
            Commands::Memory {
                session_id,
                store_dir,
                first,
                ..
            } => {
                assert_eq!(session_id.as_deref(), Some("abc"));
                assert_eq!(store_dir, Some(PathBuf::from("/tmp/sessions")));
                assert_eq!(first, "My name is Bob");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["agentgraph"]).is_err());
    }
}
