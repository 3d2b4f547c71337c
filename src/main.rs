use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ingredient_estimate::{models::YOLOv5Model, Config};

/// Estimate the ingredients in an image and print them one per line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image file to analyse
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Detection confidence threshold (0.0 - 1.0)
    #[arg(long, default_value_t = Config::DEFAULT_CONFIDENCE_THRESHOLD, value_name = "THRESHOLD")]
    conf: f32,

    /// Training run whose best checkpoint is loaded
    #[arg(long, env = "ESTIMATE_RUN", default_value = Config::DEFAULT_RUN_NAME, value_name = "NAME")]
    run: String,

    /// Training output root containing runs/train/<run>
    #[arg(long, env = "ESTIMATE_ROOT", default_value = Config::DEFAULT_ROOT, value_name = "DIR")]
    root: PathBuf,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            root: self.root.clone(),
            run_name: self.run.clone(),
            confidence_threshold: self.conf,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "warn,ort=error,ingredient_estimate=debug"
    } else {
        "warn,ort=error"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.config();
    tracing::debug!(?config, image = %args.image_path.display(), "starting");

    match ingredient_estimate::run::<YOLOv5Model>(&config, &args.image_path, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
