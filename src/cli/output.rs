use std::io::IsTerminal;

use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub use_color: bool,
}

/// `color_flag` is false when `--no-color` was passed; `mode` comes from config.
pub fn detect_color(color_flag: bool, mode: &str) -> bool {
    if !color_flag {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    match mode {
        "always" => true,
        "never" => false,
        _ => std::io::stdout().is_terminal(),
    }
}

pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

pub fn print_json<T: Serialize>(value: &T, opts: &OutputOptions) -> Result<()> {
    println!("{}", to_json(value, opts.pretty)?);
    Ok(())
}
