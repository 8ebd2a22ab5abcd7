use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reviewsense-server")]
#[command(about = "ReviewSense sentiment inference server", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "server.yaml")]
    pub config: PathBuf,

    /// Directory holding the trained artifact set
    #[arg(short, long)]
    pub artifacts: Option<PathBuf>,

    /// Review corpus for bulk loading
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Allowed CORS origin (repeatable)
    #[arg(long)]
    pub allow_origin: Vec<String>,

    /// Load the review corpus before serving
    #[arg(long)]
    pub load_on_startup: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
