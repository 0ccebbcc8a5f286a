use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "heartbeat",
    version,
    about = "Terminal dashboard for container service health across account aliases."
)]
pub struct CliArgs {
    /// Base URL of the dashboard backend
    #[arg(long, env = "HEARTBEAT_API_URL")]
    pub api_url: Option<String>,

    /// Alias to show first, if the backend knows it
    #[arg(short, long)]
    pub alias: Option<String>,

    /// Alias auto-rotation interval in milliseconds
    #[arg(long)]
    pub rotation_ms: Option<u64>,

    /// Start with alias auto-rotation switched off
    #[arg(long)]
    pub no_rotate: bool,

    /// Path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
