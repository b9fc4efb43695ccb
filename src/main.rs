use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use exhibit_fuzzy::{
    cli::Cli,
    config::PipelineConfig,
    io::{load_records, write_memberships, write_report},
    observability,
    pipeline::{Pipeline, RunOutcome},
};

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                message,
                "panic occurred"
            );
        } else {
            error!(message, "panic occurred without location information");
        }
    }));

    let args = Cli::parse();

    observability::init(args.log_format).context("failed to initialize tracing")?;
    run(&args)
}

fn run(args: &Cli) -> Result<()> {
    let config = load_config(args).context("failed to load configuration")?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        clusters = config.n_clusters,
        mode = %config.partition_mode,
        variant = %config.variant,
        seed = config.seed,
        "configuration loaded"
    );

    let loaded = load_records(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    if loaded.malformed_rows > 0 {
        warn!(
            malformed_rows = loaded.malformed_rows,
            "some input rows could not be parsed"
        );
    }

    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let outcome = pipeline.run(loaded.records);

    match &outcome {
        RunOutcome::Completed { records, .. } => {
            write_memberships(&args.output, records, pipeline.config())
                .with_context(|| format!("failed to write {}", args.output.display()))?;
        }
        RunOutcome::NoDataProcessed { .. } => {
            warn!(output = %args.output.display(), "no data processed; output not written");
            println!("no data processed");
        }
    }

    if let Some(path) = &args.report {
        write_report(path, outcome.report())
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!(path = %path.display(), "wrote run report");
    }

    Ok(())
}

/// 既定値 → YAML → 環境変数 → CLI の順に重ねる。
fn load_config(args: &Cli) -> Result<PipelineConfig> {
    let base = match &args.config {
        Some(path) => PipelineConfig::load_from_path(path)?.with_env_overrides()?,
        None => PipelineConfig::from_env()?,
    };
    Ok(args.apply(base))
}
