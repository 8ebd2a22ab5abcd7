use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reviewsense-trainer")]
#[command(
    author,
    version,
    about = "Train and probe the ReviewSense sentiment model"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train on a review corpus and write the artifact set
    Train {
        /// Review corpus (CSV with content and score columns)
        #[arg(short, long, default_value = "data/reviews.csv")]
        data: PathBuf,

        /// Directory the artifact set is written to
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Training config file (YAML); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also write the evaluation summary as JSON
        #[arg(long)]
        report_json: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Predict sentiment with a saved artifact set
    Predict {
        /// Directory holding the artifact set
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Texts to classify; the probe sentences are used when empty
        text: Vec<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}
