use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::cli::output::{print_json, OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::aggregate::run_cycle;
use crate::core::config::AppConfig;
use crate::core::models::permission::AuthorizationState;
use crate::core::models::snapshot::NutritionSnapshot;
use crate::core::permission::{check_authorization, denial_notice};
use crate::core::providers;

#[derive(Serialize)]
struct TodayPayload {
    authorization: AuthorizationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<NutritionSnapshot>,
}

/// One authorization check and one cycle, then exit.
pub async fn run(config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let provider = providers::from_settings(&config.provider)?;
    debug!(provider = provider.kind().id(), "one-shot fetch");

    let show_spinner = matches!(opts.format, OutputFormat::Text);
    let spinner = show_spinner.then(|| {
        tokio::spawn(async move {
            let frames = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
            let mut i = 0usize;
            loop {
                eprint!("\r {} Fetching nutrition data...", frames[i % frames.len()]);
                i = i.wrapping_add(1);
                tokio::time::sleep(std::time::Duration::from_millis(80)).await;
            }
        })
    });

    let authorization = check_authorization(provider.as_ref(), &config.requirement()).await;
    let snapshot = if authorization.is_granted() {
        Some(run_cycle(provider.as_ref(), Local::now()).await)
    } else {
        None
    };

    if let Some(s) = spinner {
        s.abort();
        eprint!("\r\x1b[2K");
    }

    let snapshot = snapshot
        .transpose()
        .context("Failed to fetch nutrition data")?;

    match opts.format {
        OutputFormat::Json => print_json(
            &TodayPayload {
                authorization: authorization.clone(),
                snapshot: snapshot.clone(),
            },
            opts,
        )?,
        OutputFormat::Text => match (&authorization, &snapshot) {
            (AuthorizationState::Denied(reason), _) => {
                let (title, message) = denial_notice(reason);
                if opts.use_color {
                    eprintln!("{}", title.bold().red());
                } else {
                    eprintln!("{}", title);
                }
                eprintln!("{}", message);
            }
            (_, Some(snapshot)) => println!("{}", renderer::render_snapshot(snapshot, opts.use_color)),
            _ => {}
        },
    }

    if authorization.is_denied() {
        std::process::exit(1);
    }
    Ok(())
}
