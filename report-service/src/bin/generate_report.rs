use anyhow::{bail, Result};
use report_service::{
    config::AppConfig,
    observability,
    pipeline::{FacilityScope, ReportPipeline},
    report::{Category, Taxonomy},
    sinks::{FileSink, ReportSink},
    sources::ConfiguredSource,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: generate_report <electricity|ac|water|heat> [facility name]");
    }
    let category: Category = args[1].parse()?;
    let scope = FacilityScope::from(args.get(2).cloned());

    // REPORT_CONFIG can point at a config without an [http] section.
    let cfg = AppConfig::load()?;
    let output_dir = cfg.output_dir()?.to_path_buf();

    let source = ConfiguredSource::from_config(&cfg).await?;
    let pipeline = ReportPipeline::new(source, Taxonomy::with_overrides(&cfg.units))
        .with_fetch_concurrency(cfg.fetch.concurrency);

    let outcome = pipeline.run(category, &scope).await?;
    for failure in &outcome.failures {
        tracing::warn!(facility = %failure.facility, error = %failure.error, "facility incomplete in report");
    }

    let sink = FileSink::new(output_dir);
    sink.deliver(&outcome.artifact).await?;

    println!("{}", serde_json::to_string_pretty(&outcome.summary())?);

    Ok(())
}
