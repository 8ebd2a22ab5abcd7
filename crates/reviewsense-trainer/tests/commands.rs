use clap::Parser;
use reviewsense_core::Sentiment;
use reviewsense_trainer::{predict, train, Cli, Commands, PROBE_SENTENCES};
use std::fmt::Write as _;
use std::path::Path;

fn write_corpus(path: &Path) {
    let mut csv = String::from("reviewId,content,score\n");
    for i in 0..40 {
        writeln!(csv, "p{},Amazing app love it,5", i).unwrap();
        writeln!(csv, "n{},Crashed again very disappointed,1", i).unwrap();
    }
    writeln!(csv, "x1,,5").unwrap();
    std::fs::write(path, csv).unwrap();
}

#[test]
fn test_parse_train_defaults() {
    let cli = Cli::try_parse_from(["reviewsense-trainer", "train"]).unwrap();
    match cli.command {
        Commands::Train {
            data,
            artifacts,
            config,
            verbose,
            ..
        } => {
            assert_eq!(data, Path::new("data/reviews.csv"));
            assert_eq!(artifacts, Path::new("artifacts"));
            assert!(config.is_none());
            assert!(!verbose);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_parse_predict_texts() {
    let cli = Cli::try_parse_from(["reviewsense-trainer", "predict", "-a", "out", "good", "bad"])
        .unwrap();
    match cli.command {
        Commands::Predict {
            artifacts, text, ..
        } => {
            assert_eq!(artifacts, Path::new("out"));
            assert_eq!(text, vec!["good".to_string(), "bad".to_string()]);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_train_then_predict() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("reviews.csv");
    let artifacts = dir.path().join("artifacts");
    write_corpus(&data);

    let summary = train(&data, &artifacts, None).unwrap();
    assert_eq!(summary.rows_read, 81);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(summary.corpus_size, 90);
    assert_eq!(summary.probes.len(), PROBE_SENTENCES.len());
    assert!(summary.to_string().contains("Classification Report"));

    let predictions = predict(
        &artifacts,
        vec!["love it".to_string(), "very disappointed".to_string()],
    )
    .unwrap();
    assert_eq!(predictions[0].sentiment, Sentiment::Positive);
    assert_eq!(predictions[1].sentiment, Sentiment::Negative);

    let probes = predict(&artifacts, Vec::new()).unwrap();
    assert_eq!(probes.len(), PROBE_SENTENCES.len());
}

#[test]
fn test_train_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("reviews.csv");
    let config = dir.path().join("training.yaml");
    write_corpus(&data);
    std::fs::write(&config, "include_neutral_examples: false\nevaluation:\n  folds: 3\n").unwrap();

    let summary = train(&data, &dir.path().join("artifacts"), Some(&config)).unwrap();
    assert_eq!(summary.corpus_size, 80);
    assert_eq!(summary.cross_validation.scores.len(), 3);
}

#[test]
fn test_predict_without_artifacts_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(predict(dir.path(), vec!["hello".to_string()]).is_err());
}
