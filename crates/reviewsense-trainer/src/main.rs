use clap::Parser;
use reviewsense_trainer::cli::{Cli, Commands};
use reviewsense_trainer::commands::{predict, train};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            artifacts,
            config,
            report_json,
            verbose,
        } => {
            init_logging(verbose);

            let summary = train(&data, &artifacts, config.as_deref())?;
            println!("{}", summary);

            if let Some(path) = report_json {
                std::fs::write(&path, serde_json::to_vec_pretty(&summary)?)?;
                println!("Evaluation summary written to {}", path.display());
            }
            println!("Training completed and model saved to {}", artifacts.display());
        }

        Commands::Predict {
            artifacts,
            text,
            verbose,
        } => {
            init_logging(verbose);

            for prediction in predict(&artifacts, text)? {
                println!("Sentence: '{}'", prediction.text);
                println!("Predicted sentiment: {}", prediction.sentiment);
                println!();
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "reviewsense_trainer=debug,reviewsense_classifiers=debug"
    } else {
        "reviewsense_trainer=info,reviewsense_classifiers=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
