use crate::activities::kuflow::ProcessItemTaskDataUpdateRequest;
use crate::workflows::domain::{WorkflowRequest, WorkflowResponse};
use crate::workflows::engine::{ProcessEngine, ProcessItemTracker, TemporalEngine};
use crate::workflows::parse_workflow_request;
use anyhow::Result;
use common::models::{JsonValue, ProcessItem};
use common::task_data::{require_f64, require_string, task_data};
use temporalio_sdk::{WfContext, WfExitValue};

pub const TASK_CODE_SUBMIT_EXPENSE_CLAIM: &str = "FILL_INFO";
pub const TASK_CODE_APPROVE_CLAIM: &str = "APPROVAL";
pub const TASK_CODE_PROCESS_REIMBURSEMENT: &str = "PROCESS";

/// Claims up to this amount are registered without approval.
pub const AUTO_APPROVAL_LIMIT: f64 = 1000.0;

const REGISTRATION_COMMENTS: &str = "Registered automatically. Transaction ID 1338";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimDecision {
    Accepted,
    Rejected,
    Review,
}

impl ClaimDecision {
    fn from_task(item: &ProcessItem) -> Result<Self> {
        let decision = require_string(task_data(item)?, "DECISION")?;
        Ok(match decision.as_str() {
            "ACCEPTED" => Self::Accepted,
            "REJECTED" => Self::Rejected,
            _ => Self::Review,
        })
    }
}

pub struct ExpenseReimbursementWorkflow<E> {
    items: ProcessItemTracker<E>,
    reimbursement_owner_id: Option<String>,
}

impl<E: ProcessEngine> ExpenseReimbursementWorkflow<E> {
    pub fn new(engine: E, reimbursement_owner_id: Option<String>) -> Self {
        Self {
            items: ProcessItemTracker::new(engine),
            reimbursement_owner_id,
        }
    }

    pub async fn run(&mut self, request: &WorkflowRequest) -> Result<WorkflowResponse> {
        let process_id = request.process_id.as_str();
        tracing::info!(%process_id, "Process started");

        let mut previous_claim: Option<ProcessItem> = None;
        let register = loop {
            let claim = self
                .submit_expense_claim(process_id, previous_claim.as_ref())
                .await?;

            let amount = require_f64(task_data(&claim)?, "AMOUNT")?;
            if amount <= AUTO_APPROVAL_LIMIT {
                tracing::info!(%process_id, amount, "Claim below approval limit");
                break true;
            }

            let approval = self
                .items
                .create_task_wait_and_retrieve(process_id, TASK_CODE_APPROVE_CLAIM, None, None)
                .await?;

            match ClaimDecision::from_task(&approval)? {
                ClaimDecision::Accepted => break true,
                ClaimDecision::Rejected => break false,
                ClaimDecision::Review => {
                    tracing::info!(%process_id, "Claim sent back for review");
                    previous_claim = Some(claim);
                }
            }
        };

        if register {
            self.process_reimbursement(process_id).await?;
        }

        Ok(WorkflowResponse::completed(process_id))
    }

    pub fn into_engine(self) -> E {
        self.items.into_engine()
    }

    /// The initiator owns the claim; a resubmission starts from the previous claim's data.
    async fn submit_expense_claim(
        &mut self,
        process_id: &str,
        previous_claim: Option<&ProcessItem>,
    ) -> Result<ProcessItem> {
        let process = self.items.engine().retrieve_process(process_id).await?;
        let seed: Option<JsonValue> = previous_claim.and_then(|item| item.task_data().cloned());

        self.items
            .create_task_wait_and_retrieve(
                process_id,
                TASK_CODE_SUBMIT_EXPENSE_CLAIM,
                process.initiator_id,
                seed,
            )
            .await
    }

    /// Completed by the workflow itself, so there is nothing to wait for.
    async fn process_reimbursement(&mut self, process_id: &str) -> Result<()> {
        let process_item_id = self
            .items
            .create_task(
                process_id,
                TASK_CODE_PROCESS_REIMBURSEMENT,
                self.reimbursement_owner_id.clone(),
                None,
            )
            .await?;

        let data: JsonValue = [("COMMENTS", REGISTRATION_COMMENTS)].into_iter().collect();
        self.items
            .engine()
            .update_process_item_task_data(ProcessItemTaskDataUpdateRequest {
                process_item_id: process_item_id.clone(),
                data,
            })
            .await?;

        self.items
            .engine()
            .complete_process_item_task(&process_item_id)
            .await?;

        tracing::info!(%process_id, %process_item_id, "Reimbursement registered");
        Ok(())
    }
}

pub async fn expense_reimbursement_workflow(
    ctx: WfContext,
    reimbursement_owner_id: Option<String>,
) -> Result<WfExitValue<WorkflowResponse>, anyhow::Error> {
    let engine = TemporalEngine::new(ctx);
    let request = parse_workflow_request(engine.args())?;

    let mut workflow = ExpenseReimbursementWorkflow::new(engine, reimbursement_owner_id);
    let response = workflow.run(&request).await?;

    Ok(WfExitValue::Normal(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::testing::{data, ScriptedEngine};
    use serde_json::json;

    fn workflow(engine: ScriptedEngine) -> ExpenseReimbursementWorkflow<ScriptedEngine> {
        ExpenseReimbursementWorkflow::new(engine, Some("app-1".to_string()))
    }

    fn request() -> WorkflowRequest {
        WorkflowRequest {
            process_id: "p-1".to_string(),
        }
    }

    #[tokio::test]
    async fn small_claim_skips_approval_and_registers() {
        let mut engine = ScriptedEngine::new("p-1");
        engine.submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, data(&[("AMOUNT", json!(1000))]));

        let mut wf = workflow(engine);
        let response = wf.run(&request()).await.unwrap();
        let engine = wf.into_engine();

        assert_eq!(response.message, "Completed process p-1");
        assert_eq!(
            engine.created_codes(),
            vec![TASK_CODE_SUBMIT_EXPENSE_CLAIM, TASK_CODE_PROCESS_REIMBURSEMENT]
        );
        assert_eq!(
            engine.created[0].owner_id.as_deref(),
            Some("initiator-1")
        );
        assert!(engine.created[0].task.is_none());
    }

    #[tokio::test]
    async fn numeric_string_amount_is_accepted() {
        let mut engine = ScriptedEngine::new("p-1");
        engine.submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, data(&[("AMOUNT", json!("250.50"))]));

        let mut wf = workflow(engine);
        wf.run(&request()).await.unwrap();

        assert!(!wf
            .into_engine()
            .created_codes()
            .contains(&TASK_CODE_APPROVE_CLAIM));
    }

    #[tokio::test]
    async fn accepted_claim_is_registered_by_the_workflow() {
        let mut engine = ScriptedEngine::new("p-1");
        engine
            .submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, data(&[("AMOUNT", json!(1500))]))
            .submit(TASK_CODE_APPROVE_CLAIM, data(&[("DECISION", json!("ACCEPTED"))]));

        let mut wf = workflow(engine);
        wf.run(&request()).await.unwrap();
        let engine = wf.into_engine();

        assert_eq!(
            engine.created_codes(),
            vec![
                TASK_CODE_SUBMIT_EXPENSE_CLAIM,
                TASK_CODE_APPROVE_CLAIM,
                TASK_CODE_PROCESS_REIMBURSEMENT
            ]
        );

        let process = engine.created_with_code(TASK_CODE_PROCESS_REIMBURSEMENT)[0];
        assert_eq!(process.owner_id.as_deref(), Some("app-1"));
        assert_eq!(engine.task_data_updates.len(), 1);
        assert_eq!(engine.task_data_updates[0].process_item_id, process.id);
        assert_eq!(
            engine.task_data_updates[0].data.get("COMMENTS"),
            Some(&json!("Registered automatically. Transaction ID 1338"))
        );
        assert_eq!(engine.completed_tasks, vec![process.id.clone()]);

        let tail: Vec<&str> = engine.calls.iter().rev().take(3).map(String::as_str).collect();
        assert_eq!(
            tail,
            vec!["complete_task", "update_task_data", "create:PROCESS"]
        );
    }

    #[tokio::test]
    async fn rejected_claim_is_not_registered() {
        let mut engine = ScriptedEngine::new("p-1");
        engine
            .submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, data(&[("AMOUNT", json!(2000))]))
            .submit(TASK_CODE_APPROVE_CLAIM, data(&[("DECISION", json!("REJECTED"))]));

        let mut wf = workflow(engine);
        let response = wf.run(&request()).await.unwrap();
        let engine = wf.into_engine();

        assert_eq!(response.message, "Completed process p-1");
        assert!(engine.created_with_code(TASK_CODE_PROCESS_REIMBURSEMENT).is_empty());
        assert!(engine.task_data_updates.is_empty());
        assert!(engine.completed_tasks.is_empty());
    }

    #[tokio::test]
    async fn review_resubmits_with_previous_claim_data() {
        let first_claim = data(&[("AMOUNT", json!(5000)), ("CONCEPT", json!("Hotel"))]);
        let mut engine = ScriptedEngine::new("p-1");
        engine
            .submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, first_claim.clone())
            .submit(TASK_CODE_APPROVE_CLAIM, data(&[("DECISION", json!("REVIEW"))]))
            .submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, data(&[("AMOUNT", json!(900))]));

        let mut wf = workflow(engine);
        wf.run(&request()).await.unwrap();
        let engine = wf.into_engine();

        let claims = engine.created_with_code(TASK_CODE_SUBMIT_EXPENSE_CLAIM);
        assert_eq!(claims.len(), 2);
        assert!(claims[0].task.is_none());
        assert_eq!(
            claims[1].task.as_ref().and_then(|t| t.data.as_ref()),
            Some(&first_claim)
        );
        assert_eq!(claims[1].owner_id.as_deref(), Some("initiator-1"));
        assert_eq!(
            engine.created_with_code(TASK_CODE_PROCESS_REIMBURSEMENT).len(),
            1
        );
        assert_eq!(
            engine
                .calls
                .iter()
                .filter(|c| c.as_str() == "retrieve_process")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn unknown_decision_is_treated_as_review() {
        let mut engine = ScriptedEngine::new("p-1");
        engine
            .submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, data(&[("AMOUNT", json!(3000))]))
            .submit(TASK_CODE_APPROVE_CLAIM, data(&[("DECISION", json!("MAYBE"))]))
            .submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, data(&[("AMOUNT", json!(3000))]))
            .submit(TASK_CODE_APPROVE_CLAIM, data(&[("DECISION", json!("REJECTED"))]));

        let mut wf = workflow(engine);
        wf.run(&request()).await.unwrap();
        let engine = wf.into_engine();

        assert_eq!(engine.created_with_code(TASK_CODE_APPROVE_CLAIM).len(), 2);
        assert!(engine.created_with_code(TASK_CODE_PROCESS_REIMBURSEMENT).is_empty());
    }

    #[tokio::test]
    async fn missing_amount_fails_the_workflow() {
        let mut engine = ScriptedEngine::new("p-1");
        engine.submit(TASK_CODE_SUBMIT_EXPENSE_CLAIM, data(&[("CONCEPT", json!("Taxi"))]));

        let err = workflow(engine).run(&request()).await.unwrap_err();
        assert!(err.to_string().contains("AMOUNT"));
    }

    #[tokio::test]
    async fn does_not_advance_without_completion_signal() {
        let engine = ScriptedEngine::new("p-1").without_completions();
        let mut wf = workflow(engine);

        assert!(wf.run(&request()).await.is_err());
        let engine = wf.into_engine();
        assert_eq!(engine.created_codes(), vec![TASK_CODE_SUBMIT_EXPENSE_CLAIM]);
        assert!(!engine.calls.iter().any(|c| c.starts_with("retrieve_item")));
    }

    #[tokio::test]
    async fn unrelated_signals_do_not_unblock_the_wait() {
        let mut engine = ScriptedEngine::new("p-1").without_completions();
        engine.push_signal(crate::workflows::testing::signal(
            "someone-else",
            common::models::ProcessItemType::Task,
        ));

        let mut wf = workflow(engine);
        assert!(wf.run(&request()).await.is_err());
        assert!(!wf
            .into_engine()
            .calls
            .iter()
            .any(|c| c.starts_with("retrieve_item")));
    }
}
