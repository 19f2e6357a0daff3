use anyhow::{Context, Result};
use common::settings::{MutualTlsSettings, TemporalSettings};
use std::str::FromStr;
use temporalio_client::{ClientOptions, ClientTlsOptions, TlsOptions};
use temporalio_common::worker::{WorkerConfig, WorkerTaskTypes, WorkerVersioningStrategy};
use temporalio_sdk::Worker;
use temporalio_sdk_core::{init_worker, CoreRuntime, RuntimeOptions, Url};

pub const CLIENT_NAME: &str = "kuflow-samples-worker";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct TemporalWorkerRuntime {
    pub worker: Worker,
    // Keep runtime alive for the lifetime of the worker.
    _runtime: CoreRuntime,
}

fn get_host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "Unknown".to_string())
}

fn get_worker_identity(task_queue: &str) -> String {
    format!("{}@{}@{}", std::process::id(), get_host_name(), task_queue)
}

/// Client certificate, key and optional CA read from the configured files.
pub fn load_tls_options(mutual_tls: &MutualTlsSettings) -> Result<TlsOptions> {
    let client_cert = std::fs::read(&mutual_tls.cert_file).with_context(|| {
        format!(
            "Unable to read client certificate {}",
            mutual_tls.cert_file.display()
        )
    })?;
    let client_private_key = std::fs::read(&mutual_tls.key_file).with_context(|| {
        format!(
            "Unable to read client private key {}",
            mutual_tls.key_file.display()
        )
    })?;
    let server_root_ca_cert = mutual_tls
        .ca_file
        .as_ref()
        .map(|ca_file| {
            std::fs::read(ca_file)
                .with_context(|| format!("Unable to read CA certificate {}", ca_file.display()))
        })
        .transpose()?;

    Ok(TlsOptions {
        server_root_ca_cert,
        domain: mutual_tls.domain.clone(),
        client_tls_options: Some(ClientTlsOptions {
            client_cert,
            client_private_key,
        }),
    })
}

pub fn client_options(
    temporal: &TemporalSettings,
    client_name: &str,
    identity: String,
) -> Result<ClientOptions> {
    let tls_options = temporal
        .mutual_tls
        .as_ref()
        .map(load_tls_options)
        .transpose()?;

    Ok(ClientOptions::builder()
        .target_url(Url::from_str(&temporal.target_url())?)
        .client_name(client_name)
        .client_version(CLIENT_VERSION)
        .identity(identity)
        .maybe_tls_options(tls_options)
        .build())
}

pub async fn build_temporal_worker(
    temporal: &TemporalSettings,
    task_queue: &str,
) -> Result<TemporalWorkerRuntime> {
    let worker_identity = get_worker_identity(task_queue);

    let server_options = client_options(temporal, CLIENT_NAME, worker_identity)?;
    let client = server_options
        .connect(temporal.namespace.clone(), None)
        .await?;

    let runtime_options = RuntimeOptions::builder()
        .build()
        .map_err(|e| anyhow::anyhow!(e))?;
    let runtime = CoreRuntime::new_assume_tokio(runtime_options).map_err(|e| anyhow::anyhow!(e))?;

    let worker_config = WorkerConfig::builder()
        .namespace(temporal.namespace.clone())
        .task_queue(task_queue)
        .task_types(WorkerTaskTypes::all())
        .versioning_strategy(WorkerVersioningStrategy::None {
            build_id: format!("{}-{}", CLIENT_NAME, CLIENT_VERSION),
        })
        .build()
        .map_err(|e| anyhow::anyhow!(e))?;

    let core_worker = init_worker(&runtime, worker_config, client)?;
    let worker = Worker::new_from_core(std::sync::Arc::new(core_worker), task_queue);

    Ok(TemporalWorkerRuntime {
        worker,
        _runtime: runtime,
    })
}
