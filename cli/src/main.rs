mod client;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::DaemonClient;
use shared::ipc::{Command, Response};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vocmd")]
#[command(about = "CLI tool for the vocmd voice command daemon")]
struct Cli {
    /// Socket of a running vocmdd, if not the default one
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Start,
    Stop,
    Pause,
    Resume,
    Toggle,
    Status,
    /// Set the hotword(s); no words switches it off
    Hotword { words: Vec<String> },
    /// Pretend the engine heard these hypotheses, best first
    Say {
        #[arg(required = true)]
        hypotheses: Vec<String>,
        /// Deliver as an interim result
        #[arg(long)]
        interim: bool,
    },
    /// Register a command template
    Add {
        template: String,
        /// Treat the template as a regular expression
        #[arg(long)]
        pattern: bool,
    },
    /// Remove the named templates, or everything with --all
    Remove {
        templates: Vec<String>,
        #[arg(long, conflicts_with = "templates")]
        all: bool,
    },
    List,
}

impl Commands {
    fn into_command(self) -> Command {
        match self {
            Commands::Start => Command::Start,
            Commands::Stop => Command::Stop,
            Commands::Pause => Command::Pause,
            Commands::Resume => Command::Resume,
            Commands::Toggle => Command::Toggle,
            Commands::Status => Command::Status,
            Commands::Hotword { words } => Command::SetHotword(words),
            Commands::Say {
                hypotheses,
                interim,
            } => Command::Say {
                hypotheses,
                is_final: !interim,
            },
            Commands::Add { template, pattern } => Command::AddCommand { template, pattern },
            Commands::Remove { all: true, .. } => Command::RemoveCommands(None),
            Commands::Remove { templates, .. } => Command::RemoveCommands(Some(templates)),
            Commands::List => Command::ListCommands,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = match cli.socket {
        Some(path) => DaemonClient::with_socket_path(path),
        None => DaemonClient::new(),
    };

    match client.send_command(cli.command.into_command()).await {
        Ok(Response::Ok) => {
            println!("Success");
        }
        Ok(Response::Status(info)) => {
            println!("Status:");
            println!("  Running: {}", info.is_running);
            println!("  Listening: {}", info.is_listening);
            println!("  Paused: {}", info.is_paused);
            if info.hotword.is_empty() {
                println!("  Hotword: off");
            } else {
                println!("  Hotword: {}", info.hotword.join(", "));
            }
            println!("  Commands: {}", info.commands);
        }
        Ok(Response::Matched(info)) => {
            println!("Matched '{}' -> {}", info.hypothesis, info.template);
            for (i, arg) in info.args.iter().enumerate() {
                println!("  ${}: {}", i + 1, arg);
            }
        }
        Ok(Response::NoMatch(hypotheses)) => {
            println!("No command matched {:?}", hypotheses);
        }
        Ok(Response::Discarded) => {
            println!("Not listening, nothing was processed");
        }
        Ok(Response::Commands(templates)) => {
            if templates.is_empty() {
                println!("No commands registered");
            }
            for template in templates {
                println!("{}", template);
            }
        }
        Ok(Response::Error(msg)) => {
            eprintln!("Error: {}", msg);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to connect to vocmdd: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).unwrap().command.into_command()
    }

    #[test]
    fn test_say_defaults_to_final() {
        assert_eq!(
            parse(&["vocmd", "say", "hello there", "yellow there"]),
            Command::Say {
                hypotheses: vec!["hello there".to_string(), "yellow there".to_string()],
                is_final: true,
            }
        );
        assert!(matches!(
            parse(&["vocmd", "say", "--interim", "hel"]),
            Command::Say { is_final: false, .. }
        ));
    }

    #[test]
    fn test_hotword_without_words_disables() {
        assert_eq!(parse(&["vocmd", "hotword"]), Command::SetHotword(vec![]));
        assert_eq!(
            parse(&["vocmd", "hotword", "Jimmy", "peter"]),
            Command::SetHotword(vec!["Jimmy".to_string(), "peter".to_string()])
        );
    }

    #[test]
    fn test_remove_variants() {
        assert_eq!(
            parse(&["vocmd", "remove", "--all"]),
            Command::RemoveCommands(None)
        );
        assert_eq!(
            parse(&["vocmd", "remove", "hello"]),
            Command::RemoveCommands(Some(vec!["hello".to_string()]))
        );
    }

    #[test]
    fn test_add_pattern_and_socket() {
        let cli = Cli::try_parse_from(["vocmd", "--socket", "/tmp/x.sock", "add", "--pattern", "^go$"])
            .unwrap();
        assert_eq!(cli.socket, Some(PathBuf::from("/tmp/x.sock")));
        assert_eq!(
            cli.command.into_command(),
            Command::AddCommand {
                template: "^go$".to_string(),
                pattern: true,
            }
        );
    }

    #[test]
    fn test_say_requires_a_hypothesis() {
        assert!(Cli::try_parse_from(["vocmd", "say"]).is_err());
    }
}
