use std::time::Duration;

use colored::{control, Colorize};
use tracing::{debug, warn};

use crate::core::process::{launcher_for, run_command};

const OPEN_TIMEOUT_SECS: u64 = 10;

/// User-visible notices. Must not block the caller.
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// Opens the provider's settings surface. Fire-and-forget: there is no
/// callback when the user comes back.
pub trait SettingsLink: Send + Sync {
    fn open(&self, target: &str, fallback: Option<&str>);
}

/// Prints notices to stderr.
pub struct TerminalNotifier {
    use_color: bool,
}

impl TerminalNotifier {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }
}

impl Notifier for TerminalNotifier {
    fn alert(&self, title: &str, message: &str) {
        control::set_override(self.use_color);
        eprintln!("{}\n{}", title.bold().yellow(), message);
    }
}

/// Launches deep links through `adb` or the desktop opener on a background task.
pub struct SystemSettingsLink;

impl SettingsLink for SystemSettingsLink {
    fn open(&self, target: &str, fallback: Option<&str>) {
        let targets: Vec<String> = std::iter::once(target)
            .chain(fallback)
            .map(str::to_string)
            .collect();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; cannot open {}", target);
            return;
        };
        handle.spawn(async move {
            for target in &targets {
                match open_target(target).await {
                    Ok(()) => {
                        debug!(%target, "opened settings link");
                        return;
                    }
                    Err(e) => debug!(%target, error = %e, "failed to open settings link"),
                }
            }
        });
    }
}

async fn open_target(target: &str) -> anyhow::Result<()> {
    let (cmd, args) =
        launcher_for(target).ok_or_else(|| anyhow::anyhow!("no launcher for {}", target))?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run_command(&cmd, &args, Duration::from_secs(OPEN_TIMEOUT_SECS)).await?;
    Ok(())
}

#[cfg(test)]
pub mod recording {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub alerts: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        pub fn titles(&self) -> Vec<String> {
            self.alerts
                .lock()
                .unwrap()
                .iter()
                .map(|(t, _)| t.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn alert(&self, title: &str, message: &str) {
            self.alerts
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    #[derive(Default)]
    pub struct RecordingLink {
        pub opened: Mutex<Vec<(String, Option<String>)>>,
    }

    impl SettingsLink for RecordingLink {
        fn open(&self, target: &str, fallback: Option<&str>) {
            self.opened
                .lock()
                .unwrap()
                .push((target.to_string(), fallback.map(str::to_string)));
        }
    }
}
