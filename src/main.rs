use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use veritas_io::{
    ClassMetricsEntry, DEFAULT_LABEL_COLUMN, EvaluationRecord, FeatureImportanceEntry,
    FeatureReader, ReportWriter, RunName, read_inference_document,
};
use veritas_rf::{
    CrossValidation, EnsembleClassifier, LabelVocabulary, MaxFeatures, ModelStore,
    PredictionOutput, RandomForestConfig, SplitCriterion,
};

#[derive(Parser)]
#[command(name = "veritas")]
#[command(about = "Classify forensic image features as original, tampered, or AI-generated")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 1234, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Random Forest hyperparameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the Random Forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value_t = 15)]
    max_depth: usize,

    /// Minimum rows a node needs before it may split
    #[arg(long, default_value_t = 2)]
    min_samples_split: usize,

    /// Minimum rows each side of a split must keep
    #[arg(long, default_value_t = 1)]
    min_samples_leaf: usize,

    /// Features examined per split: "all", "sqrt", or a count
    #[arg(long, default_value = "all")]
    max_features: MaxFeatures,

    /// Split criterion: "gini" or "entropy"
    #[arg(long, default_value = "gini")]
    criterion: SplitCriterion,
}

impl ForestArgs {
    fn config(&self, seed: u64) -> Result<RandomForestConfig> {
        Ok(RandomForestConfig::new(self.n_trees)?
            .with_max_depth(Some(self.max_depth))
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(self.max_features)
            .with_criterion(self.criterion)
            .with_seed(seed))
    }
}

/// Inputs of the `train` command.
#[derive(Args, Debug, Clone)]
struct TrainArgs {
    /// Path to the feature CSV file
    #[arg(long)]
    data: PathBuf,

    /// Header of the label column (column 0 is used if absent)
    #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
    label_column: String,

    /// Run name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    run: String,

    /// Output directory for the model and report
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Number of cross-validation folds
    #[arg(long, default_value_t = 5)]
    cv_folds: usize,

    /// Fraction of rows held out for the confusion matrix
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    /// Save a forest retrained on every row instead of the hold-out forest
    #[arg(long)]
    fit_all: bool,

    /// Label names, in label order
    #[arg(long, value_delimiter = ',')]
    labels: Option<Vec<String>>,

    #[command(flatten)]
    forest: ForestArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Cross-validate, evaluate on a hold-out split, and save the model
    Train(TrainArgs),

    /// Classify one feature vector with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// JSON file holding an object (or a list whose first item is an
        /// object) of named feature values
        #[arg(long, conflicts_with = "values", required_unless_present = "values")]
        input: Option<PathBuf>,

        /// Feature values given directly, comma-separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        values: Option<Vec<f64>>,

        /// Label names, in label order
        #[arg(long, value_delimiter = ',')]
        labels: Option<Vec<String>>,
    },

    /// Print the shape of a saved model
    Inspect {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Debug, Serialize)]
struct TrainOutput {
    run: String,
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    class_counts: BTreeMap<usize, usize>,
    n_trees: usize,
    fold_accuracies: Vec<f64>,
    cv_mean_accuracy: f64,
    cv_std_accuracy: f64,
    holdout_accuracy: f64,
    confusion_matrix: Vec<Vec<usize>>,
    model_train_rows: usize,
    model_path: PathBuf,
    report_path: PathBuf,
}

#[derive(Serialize)]
struct InspectOutput {
    n_trees: usize,
    n_features: usize,
    n_classes: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    seed: u64,
    total_nodes: usize,
    total_leaves: usize,
    deepest_tree: usize,
    mean_depth: f64,
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

fn vocabulary(labels: Option<Vec<String>>) -> LabelVocabulary {
    labels.map_or_else(LabelVocabulary::forensic, LabelVocabulary::new)
}

fn train(args: TrainArgs, seed: u64) -> Result<TrainOutput> {
    let run_name = RunName::new(args.run.clone())?;
    let label_names = vocabulary(args.labels);

    // 1. Read dataset
    let dataset = FeatureReader::new(&args.data)
        .with_label_column(args.label_column)
        .read()
        .context("failed to read feature CSV")?;
    info!(
        n_samples = dataset.n_samples(),
        n_features = dataset.n_features(),
        "dataset loaded"
    );

    // 2. Cross-validate and evaluate on a held-out split
    let rf_config = args
        .forest
        .config(seed)?
        .with_max_classes(label_names.len());
    let cv = CrossValidation::new(args.cv_folds)?
        .with_seed(seed)
        .with_test_fraction(args.test_fraction);
    let report = cv
        .evaluate(&rf_config, dataset.features(), dataset.labels())
        .context("cross-validation failed")?;

    // 3. Pick the forest to keep
    let (forest, model_train_rows) = if args.fit_all {
        let forest = rf_config
            .fit(dataset.features(), dataset.labels())
            .context("final model training failed")?;
        (forest, dataset.n_samples())
    } else {
        (report.holdout.forest.clone(), report.holdout.n_train)
    };
    info!(n_trees = forest.n_trees(), model_train_rows, "model selected");

    // 4. Replace any previous model, only if the vocabulary can serve it
    let classifier = EnsembleClassifier::new(forest, label_names)?;
    let forest = classifier.forest();
    let writer = ReportWriter::new(&args.output_dir, run_name)?;
    let model_path = writer.model_path();
    ModelStore::new(&model_path)
        .save(forest)
        .context("failed to save model")?;

    // 5. Write evaluation JSON
    let label_names = classifier.vocabulary();
    let confusion = &report.holdout.confusion_matrix;
    let record = EvaluationRecord {
        n_samples: report.n_samples,
        n_features: report.n_features,
        n_classes: report.n_classes,
        n_trees: forest.n_trees(),
        fold_accuracies: report.fold_accuracies(),
        cv_accuracy_mean: report.mean_accuracy,
        cv_accuracy_std: report.std_accuracy,
        holdout_n_train: report.holdout.n_train,
        holdout_n_test: report.holdout.n_test,
        holdout_accuracy: report.holdout.accuracy,
        confusion_matrix: confusion.as_rows().to_vec(),
        class_metrics: confusion
            .class_metrics()
            .into_iter()
            .map(|m| ClassMetricsEntry {
                class: m.class,
                name: label_names
                    .name(m.class)
                    .map_or_else(|| format!("class {}", m.class), str::to_string),
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect(),
        feature_importances: forest
            .ranked_importances(dataset.feature_names())
            .into_iter()
            .map(|f| FeatureImportanceEntry {
                name: f.name,
                importance: f.importance,
                rank: f.rank,
            })
            .collect(),
    };
    let report_path = writer.write_evaluation(&record)?;

    Ok(TrainOutput {
        run: args.run,
        n_samples: report.n_samples,
        n_features: report.n_features,
        n_classes: report.n_classes,
        class_counts: dataset.class_counts(),
        n_trees: forest.n_trees(),
        fold_accuracies: record.fold_accuracies,
        cv_mean_accuracy: report.mean_accuracy,
        cv_std_accuracy: report.std_accuracy,
        holdout_accuracy: report.holdout.accuracy,
        confusion_matrix: record.confusion_matrix,
        model_train_rows,
        model_path,
        report_path,
    })
}

fn predict(
    model: &Path,
    input: Option<PathBuf>,
    values: Option<Vec<f64>>,
    labels: Option<Vec<String>>,
) -> Result<PredictionOutput> {
    let forest = ModelStore::new(model)
        .load()
        .context("failed to load model")?;
    info!(
        n_trees = forest.n_trees(),
        n_features = forest.n_features(),
        n_classes = forest.n_classes(),
        "model loaded"
    );
    let classifier = EnsembleClassifier::new(forest, vocabulary(labels))?;

    let result = match (input, values) {
        (_, Some(values)) => classifier.predict(&values)?,
        (Some(path), None) => {
            let document = read_inference_document(&path)?;
            classifier.predict_json(&document)?
        }
        (None, None) => anyhow::bail!("either --input or --values is required"),
    };
    Ok(result.to_output())
}

/// Render a prediction outcome as stdout JSON plus the process exit code.
///
/// Failures become `{"error": "..."}` with exit code 1.
fn render_prediction(outcome: Result<PredictionOutput>) -> Result<(String, i32)> {
    match outcome {
        Ok(output) => Ok((serde_json::to_string_pretty(&output)?, 0)),
        Err(e) => {
            let output = ErrorOutput {
                error: format!("{e:#}"),
            };
            Ok((serde_json::to_string_pretty(&output)?, 1))
        }
    }
}

fn inspect(model: &Path) -> Result<InspectOutput> {
    let forest = ModelStore::new(model)
        .load()
        .context("failed to load model")?;
    let depths: Vec<usize> = forest.trees().iter().map(|t| t.depth()).collect();
    let params = forest.params();

    Ok(InspectOutput {
        n_trees: forest.n_trees(),
        n_features: forest.n_features(),
        n_classes: forest.n_classes(),
        max_depth: params.max_depth,
        min_samples_split: params.min_samples_split,
        min_samples_leaf: params.min_samples_leaf,
        seed: params.seed,
        total_nodes: forest.trees().iter().map(|t| t.n_nodes()).sum(),
        total_leaves: forest.trees().iter().map(|t| t.n_leaves()).sum(),
        deepest_tree: depths.iter().copied().max().unwrap_or(0),
        mean_depth: depths.iter().sum::<usize>() as f64 / depths.len().max(1) as f64,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train(args) => {
            let output = train(args, cli.seed)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            input,
            values,
            labels,
        } => {
            let (json, code) = render_prediction(predict(&model, input, values, labels))?;
            println!("{json}");
            if code != 0 {
                std::process::exit(code);
            }
        }

        Command::Inspect { model } => {
            let output = inspect(&model)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
