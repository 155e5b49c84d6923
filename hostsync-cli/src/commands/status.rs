//! `hostsync status` — daemon visibility.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Args;
use colored::Colorize;
use serde_json::{json, Value};
use tabled::{settings::Style, Table, Tabled};

use hostsync_core::config::DEFAULT_SOCKET_PATH;
use hostsync_daemon::{request_status, DaemonError};

/// Arguments for `hostsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Control socket path.
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "field")]
    field: String,
    #[tabled(rename = "value")]
    value: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        match request_status(&self.socket) {
            Ok(payload) => {
                if self.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&payload)
                            .context("failed to render status JSON")?
                    );
                } else {
                    print_table(&payload);
                }
            }
            Err(DaemonError::DaemonNotRunning { .. }) => {
                if self.json {
                    let payload = json!({
                        "running": false,
                        "socket": self.socket.display().to_string(),
                    });
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&payload)
                            .context("failed to render status JSON")?
                    );
                } else {
                    println!(
                        "{} daemon is not running (socket: {})",
                        "✗".red(),
                        self.socket.display()
                    );
                }
            }
            Err(err) => return Err(err).context("failed to query daemon status"),
        }
        Ok(())
    }
}

fn print_table(payload: &Value) {
    let failures = payload["consecutive_failures"].as_u64().unwrap_or(0);
    let state = if failures == 0 {
        "running".green().to_string()
    } else {
        format!("{} ({failures} consecutive failures)", "degraded".yellow())
    };

    let mut rows = vec![
        row("state", state),
        row(
            "managed hosts",
            payload["managed_hosts"].as_u64().unwrap_or(0).to_string(),
        ),
        row(
            "last check",
            format_unix(payload["last_checked_unix"].as_u64().unwrap_or(0)),
        ),
        row(
            "last rewrite",
            format_unix(payload["last_applied_unix"].as_u64().unwrap_or(0)),
        ),
        row(
            "started",
            format_unix(payload["started_at_unix"].as_u64().unwrap_or(0)),
        ),
        row(
            "hosts file",
            payload["hosts_file"].as_str().unwrap_or("?").to_string(),
        ),
        row(
            "metadata url",
            payload["metadata_url"].as_str().unwrap_or("?").to_string(),
        ),
    ];
    if let Some(error) = payload["last_error"].as_str() {
        rows.push(row("last error", error.red().to_string()));
    }

    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn row(field: &str, value: String) -> StatusRow {
    StatusRow {
        field: field.to_string(),
        value,
    }
}

fn format_unix(ts: u64) -> String {
    if ts == 0 {
        return "never".to_string();
    }
    DateTime::from_timestamp(ts as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "invalid timestamp".to_string())
}
