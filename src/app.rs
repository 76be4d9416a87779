//! Entry point behind `src/main.rs`.
//!
//! Loads `.env`, sets up `pretty_env_logger`, parses the command line and hands
//! the resolved config to `app::pipeline`. Everything printed to stdout is
//! formatted here from the plain data the pipeline returns.

use clap::Parser;

use crate::cli::{AnalyzeArgs, CheckArgs, Cli, Command, GenerateArgs, PredictArgs, TrainArgs};
use crate::domain::{GenerateConfig, ModelConfig, PredictConfig, TrainConfig, TrainingOptions};
use crate::error::AppError;

pub mod pipeline;

/// Terminal plot geometry.
const PLOT_WIDTH: usize = 72;
const PLOT_HEIGHT: usize = 14;
const BAR_WIDTH: usize = 40;

/// Entry point for the `incidence` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal; a malformed one is worth a warning.
    let dotenv = dotenvy::dotenv();
    init_logging();
    if let Err(e) = dotenv {
        if !e.not_found() {
            log::warn!("Ignoring unreadable .env file: {e}");
        }
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => handle_generate(&args),
        Command::Check(args) => handle_check(&args),
        Command::Analyze(args) => handle_analyze(&args),
        Command::Train(args) => handle_train(&args),
        Command::Predict(args) => handle_predict(&args),
    }
}

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.filter_level(log::LevelFilter::Info),
    };
    // A second init (e.g. from tests) is harmless.
    let _ = builder.try_init();
}

fn handle_generate(args: &GenerateArgs) -> Result<(), AppError> {
    let config = generate_config_from_args(args);
    let rows = pipeline::run_generate(&config)?;
    println!("Wrote {rows} rows to {}", config.output_path.display());
    Ok(())
}

fn handle_check(args: &CheckArgs) -> Result<(), AppError> {
    let report = pipeline::run_check(&args.data.dataset, &args.out_dir, !args.no_charts)?;
    println!("{}", crate::report::format_check_report(&report));
    Ok(())
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<(), AppError> {
    let report = pipeline::run_analyze(&args.data.dataset, &args.out_dir, !args.no_charts)?;
    println!("{}", crate::report::format_analysis_report(&report, args.top));
    Ok(())
}

fn handle_train(args: &TrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(args)?;
    let mut print_epoch = |log: &crate::domain::EpochLog| println!("{}", crate::report::format_epoch_line(log));
    let run = pipeline::run_train(&config, &mut print_epoch)?;

    println!();
    println!("{}", crate::report::format_run_summary(&run.summary));
    print!("{}", crate::report::format_training_outcome(&run.report));
    println!("{}", crate::plot::render_loss_plot(&run.report.history, PLOT_WIDTH, PLOT_HEIGHT));
    println!("{}", crate::report::format_evaluation(&run.evaluation.metrics));
    print_forecasts(&run.next_season, config.top_n);
    println!("Artifacts written under {}", config.out_dir.display());
    Ok(())
}

fn handle_predict(args: &PredictArgs) -> Result<(), AppError> {
    let config = PredictConfig {
        dataset_path: args.data.dataset.clone(),
        out_dir: args.out_dir.clone(),
        top_n: args.top,
    };
    let next = pipeline::run_predict(&config)?;
    print_forecasts(&next, config.top_n);
    Ok(())
}

fn print_forecasts(next: &crate::report::NextSeason, top_n: usize) {
    println!(
        "{}",
        crate::report::format_forecasts(&next.forecasts, &next.skipped, top_n)
    );
    print!("{}", crate::plot::render_forecast_bars(&next.forecasts, top_n, BAR_WIDTH));
}

pub fn generate_config_from_args(args: &GenerateArgs) -> GenerateConfig {
    GenerateConfig {
        output_path: args.output.clone(),
        seed: args.seed,
        entries_per_combo: args.entries_per_combo,
        ..GenerateConfig::default()
    }
}

/// Resolve and validate `train` flags.
pub fn train_config_from_args(args: &TrainArgs) -> Result<TrainConfig, AppError> {
    if args.seq_len == 0 {
        return Err(AppError::model("--seq-len must be at least 1."));
    }
    if !(args.train_fraction > 0.0 && args.train_fraction < 1.0) {
        return Err(AppError::model("--train-fraction must be strictly between 0 and 1."));
    }
    if args.hidden.is_empty() || args.hidden.contains(&0) {
        return Err(AppError::model("--hidden needs one or more positive layer sizes."));
    }

    Ok(TrainConfig {
        dataset_path: args.data.dataset.clone(),
        out_dir: args.out_dir.clone(),
        train_fraction: args.train_fraction,
        model: ModelConfig {
            seq_len: args.seq_len,
            hidden_sizes: args.hidden.clone(),
        },
        training: TrainingOptions {
            epochs: args.epochs,
            batch_size: args.batch_size,
            learning_rate: args.learning_rate,
            patience: args.patience,
            clip_norm: (args.clip_norm > 0.0).then_some(args.clip_norm),
            shuffle: true,
            seed: args.seed,
        },
        top_n: args.top,
        charts: !args.no_charts,
    })
}
