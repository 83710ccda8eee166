use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::cli::output::{to_json, OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::config::AppConfig;
use crate::core::notify::{SystemSettingsLink, TerminalNotifier};
use crate::core::poller::{PermissionedPoller, PollerState};
use crate::core::providers;

const HELP: &str = "Commands: r (refresh), retry, open (settings), q (quit)";

#[derive(Debug, PartialEq)]
enum Command {
    Refresh,
    Retry,
    OpenSettings,
    Quit,
    Help,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "r" | "refresh" => Some(Self::Refresh),
            "retry" => Some(Self::Retry),
            "o" | "open" => Some(Self::OpenSettings),
            "q" | "quit" | "exit" => Some(Self::Quit),
            "?" | "h" | "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Mount the poller and print every published state until quit or Ctrl-C.
pub async fn run(config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let provider = providers::from_settings(&config.provider)?;
    info!(provider = provider.kind().id(), "watching today's nutrition");
    let poller = Arc::new(PermissionedPoller::new(
        provider,
        config.requirement(),
        Arc::new(TerminalNotifier::new(opts.use_color)),
        Arc::new(SystemSettingsLink),
        config.poller_options(),
    ));

    let mut updates = poller.subscribe();
    {
        let poller = poller.clone();
        tokio::spawn(async move { poller.start().await });
    }

    if matches!(opts.format, OutputFormat::Text) {
        eprintln!("{}", HELP);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                print_state(&state, opts)?;
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(_) => {
                        debug!("stdin closed; Ctrl-C to stop");
                        stdin_open = false;
                        continue;
                    }
                };
                match Command::parse(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => dispatch(&poller, command),
                    None if line.trim().is_empty() => {}
                    None => eprintln!("Unknown command: '{}'. {}", line.trim(), HELP),
                }
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    poller.stop();
    Ok(())
}

/// Commands run on their own task so the display loop keeps draining updates.
fn dispatch(poller: &Arc<PermissionedPoller>, command: Command) {
    let poller = poller.clone();
    match command {
        Command::Refresh => {
            tokio::spawn(async move {
                if !poller.refresh_now().await {
                    debug!("refresh skipped");
                }
            });
        }
        Command::Retry => {
            tokio::spawn(async move { poller.retry_authorization().await });
        }
        Command::OpenSettings => poller.open_settings(),
        Command::Help => eprintln!("{}", HELP),
        Command::Quit => {}
    }
}

fn print_state(state: &PollerState, opts: &OutputOptions) -> Result<()> {
    match opts.format {
        OutputFormat::Json => println!("{}", to_json(state, opts.pretty)?),
        OutputFormat::Text => {
            println!("{}", renderer::render_state(state, opts.use_color));
            println!();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("r"), Some(Command::Refresh));
        assert_eq!(Command::parse(" RETRY \n"), Some(Command::Retry));
        assert_eq!(Command::parse("open"), Some(Command::OpenSettings));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("dance"), None);
    }
}
