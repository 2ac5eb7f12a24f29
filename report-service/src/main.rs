use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use report_service::{
    config::AppConfig,
    metrics_server, observability,
    pipeline::ReportPipeline,
    report::Taxonomy,
    sinks::http,
    sources::ConfiguredSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let Some(http_cfg) = &cfg.http else {
        anyhow::bail!("report service requires an [http] section; use generate_report for one-off reports");
    };
    let addr: SocketAddr = http_cfg
        .bind_addr
        .parse()
        .with_context(|| format!("invalid http.bind_addr '{}'", http_cfg.bind_addr))?;

    let source = ConfiguredSource::from_config(&cfg).await?;
    let pipeline = ReportPipeline::new(source, Taxonomy::with_overrides(&cfg.units))
        .with_fetch_concurrency(cfg.fetch.concurrency);

    let app = http::router(Arc::new(pipeline));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "report service listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
