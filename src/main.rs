use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use catbreed_mlp::{Dataset, Error, Mlp, RunConfig, load_config};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Train (or reload) the breed classifier on a synthetic survey-shaped dataset.
#[derive(Parser, Debug)]
#[command(name = "catbreed-mlp", version, about)]
struct Args {
    /// JSON run configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model file to load before training and to write the best checkpoint to
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Seed for data generation, split, initialization and shuffling
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of classes in the generated dataset
    #[arg(long, default_value_t = 5)]
    classes: usize,

    /// Rows per class in the generated dataset
    #[arg(long, default_value_t = 100)]
    per_class: usize,

    /// Feature columns in the generated dataset
    #[arg(long, default_value_t = 12)]
    features: usize,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
    .write_style(env_logger::WriteStyle::Never)
    .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> catbreed_mlp::Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RunConfig::default(),
    };
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let data = Dataset::gaussian_blobs(
        args.classes,
        args.per_class,
        args.features,
        3.0,
        1.0,
        &mut rng,
    )?;
    log::info!(
        "dataset: {} rows, {} features, {} classes (majority baseline {:.2}%)",
        data.len(),
        data.n_features(),
        data.n_classes(),
        data.majority_fraction() * 100.0
    );

    let mut mlp = Mlp::new(&data, &config.model, rng)?;

    match mlp.load(&config.model_path) {
        Ok(()) => {
            log::info!(
                "loaded {} (best accuracy {:.2}%)",
                config.model_path.display(),
                mlp.best_accuracy() * 100.0
            );
        }
        Err(Error::ModelLoad(reason)) => {
            log::warn!("{reason}; training a fresh model");
            let report = mlp.train(config.batch_size)?;
            log::info!(
                "stopped ({:?}) after {} of {} epochs: final {:.2}%, best {:.2}%",
                report.stop,
                report.epochs.len(),
                mlp.epochs(),
                report.final_accuracy * 100.0,
                report.best_accuracy * 100.0
            );
            mlp.restore_best();
            mlp.save_best(&config.model_path)?;
            log::info!("best model written to {}", config.model_path.display());
        }
        Err(e) => return Err(e),
    }

    log::info!("test accuracy: {:.2}%", mlp.evaluate() * 100.0);
    Ok(())
}
