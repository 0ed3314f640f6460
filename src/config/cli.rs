use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Text,
    Csv,
    /// Serialized view surface
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "proxy-viewer")]
#[command(about = "Fetch tabular JSON from a REST proxy and render one page of it")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "viewer-config.toml")]
    pub config: String,

    /// Endpoint name to run, or "health"
    #[arg(short, long, default_value = "health")]
    pub action: String,

    /// Parameter for the action (text or selected option)
    #[arg(short, long)]
    pub input: Option<String>,

    /// 1-indexed page to render
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    #[arg(short, long, value_enum, default_value = "html")]
    pub format: OutputFormat,

    /// List configured actions and exit
    #[arg(long)]
    pub list: bool,

    /// Override the proxy base URL from the config
    #[arg(long)]
    pub proxy_base: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}
