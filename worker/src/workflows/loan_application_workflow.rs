use crate::activities::currency::ConvertRequest;
use crate::activities::kuflow::ProcessMetadataPatchRequest;
use crate::workflows::domain::{WorkflowRequest, WorkflowResponse};
use crate::workflows::engine::{ProcessEngine, ProcessItemTracker, TemporalEngine};
use crate::workflows::parse_workflow_request;
use anyhow::Result;
use common::models::{JsonPatchOperation, JsonValue, ProcessItem};
use common::task_data::{require_f64, require_string, task_data, value_as_string};
use serde_json::Value;
use temporalio_sdk::{WfContext, WfExitValue};

pub const TASK_CODE_LOAN_APPLICATION_FORM: &str = "LOAN_APPLICATION";
pub const TASK_CODE_APPROVE_LOAN: &str = "APPROVE_LOAN";
pub const TASK_CODE_NOTIFICATION_OF_LOAN_GRANTED: &str = "NOTIFICATION_GRANTED";
pub const TASK_CODE_NOTIFICATION_OF_LOAN_REJECTION: &str = "NOTIFICATION_REJECTION";

/// Loans above this amount in euros need explicit approval.
pub const APPROVAL_THRESHOLD_EUR: f64 = 5000.0;

pub struct LoanApplicationWorkflow<E> {
    items: ProcessItemTracker<E>,
}

impl<E: ProcessEngine> LoanApplicationWorkflow<E> {
    pub fn new(engine: E) -> Self {
        Self {
            items: ProcessItemTracker::new(engine),
        }
    }

    pub async fn run(&mut self, request: &WorkflowRequest) -> Result<WorkflowResponse> {
        let process_id = request.process_id.as_str();
        tracing::info!(%process_id, "Process started");

        let application = self
            .items
            .create_task_wait_and_retrieve(process_id, TASK_CODE_LOAN_APPLICATION_FORM, None, None)
            .await?;
        let application_data = task_data(&application)?.clone();

        self.update_process_metadata(process_id, &application_data)
            .await?;

        let currency = require_string(&application_data, "CURRENCY")?;
        let amount = require_f64(&application_data, "AMOUNT")?;
        let amount_eur = self.convert_to_euros(&currency, amount).await?;

        let authorized = if amount_eur > APPROVAL_THRESHOLD_EUR {
            let approval = self
                .approve_loan(process_id, &application_data, amount_eur)
                .await?;
            require_string(task_data(&approval)?, "APPROVAL")? == "YES"
        } else {
            true
        };
        tracing::info!(%process_id, amount_eur, authorized, "Loan decided");

        let notification = if authorized {
            TASK_CODE_NOTIFICATION_OF_LOAN_GRANTED
        } else {
            TASK_CODE_NOTIFICATION_OF_LOAN_REJECTION
        };
        self.items
            .create_task_and_wait(process_id, notification, None, None)
            .await?;

        Ok(WorkflowResponse::completed(process_id))
    }

    pub fn into_engine(self) -> E {
        self.items.into_engine()
    }

    async fn update_process_metadata(
        &mut self,
        process_id: &str,
        application_data: &JsonValue,
    ) -> Result<()> {
        let json_patch = ["FIRST_NAME", "LAST_NAME"]
            .into_iter()
            .map(|key| {
                let value = value_as_string(application_data.get(key))
                    .map(Value::String)
                    .unwrap_or(Value::Null);
                JsonPatchOperation::add(format!("/{}", key), value)
            })
            .collect();

        self.items
            .engine()
            .patch_process_metadata(ProcessMetadataPatchRequest {
                process_id: process_id.to_string(),
                json_patch,
            })
            .await?;
        Ok(())
    }

    async fn convert_to_euros(&mut self, currency: &str, amount: f64) -> Result<f64> {
        if currency == "EUR" {
            return Ok(amount);
        }

        let response = self
            .items
            .engine()
            .convert_currency(ConvertRequest {
                amount,
                base_currency: currency.to_lowercase(),
                target_currency: "eur".to_string(),
            })
            .await?;
        Ok(response.amount)
    }

    async fn approve_loan(
        &mut self,
        process_id: &str,
        application_data: &JsonValue,
        amount_eur: f64,
    ) -> Result<ProcessItem> {
        let mut data = JsonValue::default();
        data.insert("FIRST_NAME", require_string(application_data, "FIRST_NAME")?);
        data.insert("LAST_NAME", require_string(application_data, "LAST_NAME")?);
        data.insert("AMOUNT", amount_eur);

        self.items
            .create_task_wait_and_retrieve(process_id, TASK_CODE_APPROVE_LOAN, None, Some(data))
            .await
    }
}

pub async fn loan_application_workflow(
    ctx: WfContext,
) -> Result<WfExitValue<WorkflowResponse>, anyhow::Error> {
    let engine = TemporalEngine::new(ctx);
    let request = parse_workflow_request(engine.args())?;

    let mut workflow = LoanApplicationWorkflow::new(engine);
    let response = workflow.run(&request).await?;

    Ok(WfExitValue::Normal(response))
}
