use common::settings::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worker::bootstrap::{
    build_temporal_worker, build_worker_context, build_worker_services, register_activities,
    register_workflows,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "worker=info,common=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new()?.into_worker_settings()?;

    let ctx = build_worker_context(settings)?;
    let services = build_worker_services(&ctx)?;

    let task_queue = ctx.settings.task_queue.clone();
    let mut runtime = build_temporal_worker(&ctx.settings.temporal, &task_queue).await?;

    register_activities(&mut runtime.worker, services.kuflow, services.currency);
    register_workflows(&mut runtime.worker, &ctx.settings);

    tracing::info!(
        temporal_target = %ctx.settings.temporal.target,
        namespace = %ctx.settings.temporal.namespace,
        "Starting Temporal Worker on queue '{}'...",
        task_queue
    );
    runtime.worker.run().await?;

    Ok(())
}
