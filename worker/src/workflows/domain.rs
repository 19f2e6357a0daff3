use common::models::ProcessItemType;
use serde::{Deserialize, Serialize};

/// Input of every process workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    pub process_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowResponse {
    pub message: String,
}

impl WorkflowResponse {
    pub fn completed(process_id: &str) -> Self {
        Self {
            message: format!("Completed process {}", process_id),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignalProcessItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ProcessItemType,
}
