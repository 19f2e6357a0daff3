use crate::activities::{currency::CurrencyConversionActivities, kuflow::KuFlowActivities};
use anyhow::Result;
use common::settings::WorkerSettings;
use common::{Credential, KuFlowApi, KuFlowRestClient};
use std::sync::Arc;

pub struct WorkerContext {
    pub kuflow: Arc<dyn KuFlowApi>,
    pub settings: Arc<WorkerSettings>,
}

impl std::fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContext")
            .field("kuflow", &"KuFlowApi")
            .field("task_queue", &self.settings.task_queue)
            .field("namespace", &self.settings.temporal.namespace)
            .finish()
    }
}

pub struct WorkerServices {
    pub kuflow: Arc<KuFlowActivities>,
    pub currency: Arc<CurrencyConversionActivities>,
}

pub fn build_worker_context(settings: WorkerSettings) -> Result<Arc<WorkerContext>> {
    let credential = Credential::ClientSecret {
        client_id: settings.client_id.clone(),
        client_secret: settings.client_secret.clone(),
    };
    let client = KuFlowRestClient::new(settings.api_endpoint.as_deref(), credential, false)?;
    tracing::info!(endpoint = %client.endpoint(), "KuFlow API client ready");

    Ok(Arc::new(WorkerContext {
        kuflow: Arc::new(client),
        settings: Arc::new(settings),
    }))
}

pub fn build_worker_services(ctx: &Arc<WorkerContext>) -> Result<WorkerServices> {
    let kuflow = Arc::new(KuFlowActivities::new(Arc::clone(&ctx.kuflow)));
    let currency = Arc::new(CurrencyConversionActivities::new(
        ctx.settings.currency.endpoint.clone(),
    )?);

    Ok(WorkerServices { kuflow, currency })
}
