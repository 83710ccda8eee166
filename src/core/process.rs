use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Run a command with arguments and a timeout, returning stdout as a String.
pub async fn run_command(cmd: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let output = tokio::time::timeout(
        timeout,
        tokio::process::Command::new(cmd)
            .args(args)
            .kill_on_drop(true)
            .output(),
    )
    .await
    .context(format!("Command `{}` timed out", cmd))?
    .context(format!("Failed to execute `{}`", cmd))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "`{}` exited with {}: {}",
            cmd,
            output.status,
            stderr.trim()
        );
    }

    let stdout = String::from_utf8(output.stdout)
        .context(format!("Non-UTF8 output from `{}`", cmd))?;
    Ok(stdout.trim().to_string())
}

/// Check if a binary exists in PATH. Returns the full path if found.
pub fn which(binary: &str) -> Option<PathBuf> {
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(binary))
            .find(|p| p.is_file())
    })
}

/// Android deep links (`package:`, `market:`, `intent:`) are only meaningful on a device.
pub fn is_device_link(target: &str) -> bool {
    ["package:", "market:", "intent:", "healthconnect:"]
        .iter()
        .any(|scheme| target.starts_with(scheme))
}

/// Command line that opens `target`: through `adb` on a connected device for
/// Android deep links, otherwise with the desktop opener.
pub fn launcher_for(target: &str) -> Option<(String, Vec<String>)> {
    if is_device_link(target) {
        return which("adb").map(|_| {
            (
                "adb".to_string(),
                vec![
                    "shell".to_string(),
                    "am".to_string(),
                    "start".to_string(),
                    "-a".to_string(),
                    "android.intent.action.VIEW".to_string(),
                    "-d".to_string(),
                    target.to_string(),
                ],
            )
        });
    }
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    which(opener).map(|_| (opener.to_string(), vec![target.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn which_finds_existing_binary() {
        assert!(which("ls").is_some());
    }

    #[test]
    fn which_returns_none_for_nonexistent() {
        assert!(which("totally_nonexistent_binary_xyz").is_none());
    }

    #[test]
    fn device_link_schemes() {
        assert!(is_device_link("package:com.google.android.apps.healthdata"));
        assert!(is_device_link("market://details?id=com.google.android.apps.healthdata"));
        assert!(!is_device_link("https://example.com"));
    }

    #[test]
    fn launcher_for_device_link_uses_adb_when_present() {
        match launcher_for("package:com.example") {
            Some((cmd, args)) => {
                assert_eq!(cmd, "adb");
                assert_eq!(args.last().map(String::as_str), Some("package:com.example"));
            }
            None => assert!(which("adb").is_none()),
        }
    }

    #[tokio::test]
    async fn run_command_echo() {
        let result = run_command("echo", &["hello"], Duration::from_secs(5)).await;
        assert_eq!(result.unwrap(), "hello");
    }

    #[tokio::test]
    async fn run_command_failure() {
        let result = run_command("false", &[], Duration::from_secs(5)).await;
        assert!(result.is_err());
    }
}
