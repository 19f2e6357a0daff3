use crate::activities::{currency::CurrencyConversionActivities, kuflow::KuFlowActivities};
use crate::contracts;
use crate::workflows;
use common::settings::WorkerSettings;
use std::sync::Arc;
use temporalio_sdk::{WfContext, Worker};

pub fn register_activities(
    worker: &mut Worker,
    kuflow: Arc<KuFlowActivities>,
    currency: Arc<CurrencyConversionActivities>,
) {
    let kuflow_clone = Arc::clone(&kuflow);
    worker.register_activity(
        contracts::activities::CREATE_PROCESS_ITEM,
        move |_ctx, request| {
            let kuflow = Arc::clone(&kuflow_clone);
            async move { kuflow.create_process_item(request).await }
        },
    );

    let kuflow_clone = Arc::clone(&kuflow);
    worker.register_activity(
        contracts::activities::RETRIEVE_PROCESS_ITEM,
        move |_ctx, request| {
            let kuflow = Arc::clone(&kuflow_clone);
            async move { kuflow.retrieve_process_item(request).await }
        },
    );

    let kuflow_clone = Arc::clone(&kuflow);
    worker.register_activity(
        contracts::activities::RETRIEVE_PROCESS,
        move |_ctx, request| {
            let kuflow = Arc::clone(&kuflow_clone);
            async move { kuflow.retrieve_process(request).await }
        },
    );

    let kuflow_clone = Arc::clone(&kuflow);
    worker.register_activity(
        contracts::activities::UPDATE_PROCESS_ITEM_TASK_DATA,
        move |_ctx, request| {
            let kuflow = Arc::clone(&kuflow_clone);
            async move { kuflow.update_process_item_task_data(request).await }
        },
    );

    let kuflow_clone = Arc::clone(&kuflow);
    worker.register_activity(
        contracts::activities::COMPLETE_PROCESS_ITEM_TASK,
        move |_ctx, request| {
            let kuflow = Arc::clone(&kuflow_clone);
            async move { kuflow.complete_process_item_task(request).await }
        },
    );

    let kuflow_clone = Arc::clone(&kuflow);
    worker.register_activity(
        contracts::activities::APPEND_PROCESS_ITEM_TASK_LOG,
        move |_ctx, request| {
            let kuflow = Arc::clone(&kuflow_clone);
            async move { kuflow.append_process_item_task_log(request).await }
        },
    );

    let kuflow_clone = Arc::clone(&kuflow);
    worker.register_activity(
        contracts::activities::PATCH_PROCESS_METADATA,
        move |_ctx, request| {
            let kuflow = Arc::clone(&kuflow_clone);
            async move { kuflow.patch_process_metadata(request).await }
        },
    );

    let currency_clone = Arc::clone(&currency);
    worker.register_activity(
        contracts::activities::CURRENCY_CONVERT,
        move |_ctx, request| {
            let currency = Arc::clone(&currency_clone);
            async move { currency.convert(request).await }
        },
    );
}

pub fn register_workflows(worker: &mut Worker, settings: &WorkerSettings) {
    worker.register_wf(
        contracts::workflows::LOAN_APPLICATION,
        workflows::loan_application_workflow::loan_application_workflow,
    );

    let reimbursement_owner_id = settings.samples.expense.reimbursement_owner_id.clone();
    if reimbursement_owner_id.is_none() {
        tracing::warn!(
            "samples.expense.reimbursement-owner-id is not set; reimbursement tasks will be created without owner"
        );
    }
    worker.register_wf(
        contracts::workflows::EXPENSE_REIMBURSEMENT,
        move |ctx: WfContext| {
            workflows::expense_reimbursement_workflow::expense_reimbursement_workflow(
                ctx,
                reimbursement_owner_id.clone(),
            )
        },
    );
}
