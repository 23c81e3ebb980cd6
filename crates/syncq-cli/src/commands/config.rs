//! Config command - View and check syncq configuration
//!
//! Provides the `syncq config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors
//! 3. Prints where the configuration file is looked up

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use syncq_core::config::Config;
use tracing::info;

use super::CommandContext;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

/// Result of checking a configuration file
#[derive(Debug, PartialEq)]
enum Validation {
    /// No file; defaults apply
    Missing,
    /// The file exists but is not valid YAML for [`Config`]
    Unreadable(String),
    /// Parsed; holds the semantic errors (empty when valid)
    Checked(Vec<String>),
}

fn validate_file(path: &Path) -> Validation {
    if !path.exists() {
        return Validation::Missing;
    }
    match Config::load(path) {
        Ok(config) => Validation::Checked(config.validate().iter().map(|e| e.to_string()).collect()),
        Err(e) => Validation::Unreadable(format!("{e:#}")),
    }
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Validate => execute_validate(ctx),
            ConfigCommand::Path => execute_path(ctx),
        }
    }
}

fn execute_show(ctx: &CommandContext) -> Result<()> {
    let formatter = ctx.formatter();
    let config_path = ctx.config_path.as_path();
    let config = &ctx.config;

    info!(config_path = %config_path.display(), "Showing configuration");

    if ctx.format.is_json() {
        let json = serde_json::to_value(config)
            .context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        let source = if config_path.exists() {
            config_path.display().to_string()
        } else {
            "defaults".to_string()
        };
        formatter.success(&format!("Configuration ({source})"));
        formatter.info("");
        for line in config.to_yaml()?.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_validate(ctx: &CommandContext) -> Result<()> {
    let formatter = ctx.formatter();
    let config_path = ctx.config_path.as_path();
    let path_str = config_path.display().to_string();

    info!(config_path = %path_str, "Validating configuration");

    match validate_file(config_path) {
        Validation::Missing => {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": true,
                    "config_path": path_str,
                    "errors": [],
                    "note": "configuration file not found, using defaults",
                }));
            } else {
                formatter.info(&format!("Configuration file not found at {path_str}"));
                formatter.info("Using default configuration.");
            }
        }
        Validation::Unreadable(error) => {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": path_str,
                    "errors": [format!("Failed to parse configuration: {error}")],
                }));
            } else {
                formatter.error(&format!("Failed to parse configuration: {error}"));
                formatter.info(&format!("File: {path_str}"));
            }
        }
        Validation::Checked(errors) => {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": errors.is_empty(),
                    "config_path": path_str,
                    "errors": errors,
                }));
            } else if errors.is_empty() {
                formatter.success("Configuration is valid");
                formatter.info(&format!("File: {path_str}"));
            } else {
                formatter.error(&format!(
                    "Configuration has {} error{}:",
                    errors.len(),
                    if errors.len() == 1 { "" } else { "s" }
                ));
                formatter.info(&format!("File: {path_str}"));
                for error in &errors {
                    formatter.info(&format!("  {error}"));
                }
            }
        }
    }

    Ok(())
}

fn execute_path(ctx: &CommandContext) -> Result<()> {
    let config_path = ctx.config_path.as_path();
    if ctx.format.is_json() {
        ctx.formatter().print_json(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "exists": config_path.exists(),
        }));
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}
