use anyhow::Result;

use crate::cli::output::{print_json, OutputFormat, OutputOptions};
use crate::core::config::AppConfig;
use crate::core::providers::ProviderKind;

pub fn init(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    match AppConfig::default().save() {
        Ok(path) => {
            println!("Generated config at {}", path.display());
            println!(
                "  Provider: file ({})",
                AppConfig::default().provider.export_path().display()
            );
        }
        Err(e) => {
            eprintln!("Failed to generate config: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

pub fn check(opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Run `nsync config init` to create one.");
        return Ok(());
    }

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let issues = config.validate();
    if opts.format == OutputFormat::Json {
        print_json(
            &serde_json::json!({
                "path": path.display().to_string(),
                "valid": issues.is_empty(),
                "issues": issues,
            }),
            opts,
        )?;
    } else if issues.is_empty() {
        println!("Config is valid: {}", path.display());
        let provider = ProviderKind::from_id(&config.provider.kind)
            .map(|k| k.display_name())
            .unwrap_or("unknown");
        println!("  Provider: {}", provider);
        let required: Vec<String> = config
            .requirement()
            .permissions()
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!("  Required permissions: {}", required.join(", "));
        println!("  Poll interval: {}s", config.settings.poll_interval_secs);
    } else {
        eprintln!("Config issues found in {}:", path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
    }

    if !issues.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
