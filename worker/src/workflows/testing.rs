//! In-memory engine for exercising workflow branches without a Temporal server.

use crate::activities::currency::{ConvertRequest, ConvertResponse};
use crate::activities::kuflow::{
    ProcessItemCreateRequest, ProcessItemTaskDataUpdateRequest, ProcessMetadataPatchRequest,
};
use crate::workflows::domain::SignalProcessItem;
use crate::workflows::engine::ProcessEngine;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::models::{
    JsonPatchOperationType, JsonValue, Process, ProcessItem, ProcessItemCreateParams,
    ProcessItemTask, ProcessItemType,
};
use std::collections::{HashMap, VecDeque};

pub fn signal(id: &str, item_type: ProcessItemType) -> SignalProcessItem {
    SignalProcessItem {
        id: id.to_string(),
        item_type,
    }
}

pub fn data(pairs: &[(&str, serde_json::Value)]) -> JsonValue {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Plays the platform side: every created task is "filled in" with the next
/// scripted submission for its code and reported completed through a signal,
/// preceded by an unrelated message signal.
pub struct ScriptedEngine {
    pub process: Process,
    pub eur_rate: f64,
    submissions: HashMap<String, VecDeque<JsonValue>>,
    items: HashMap<String, ProcessItem>,
    signals: VecDeque<SignalProcessItem>,
    auto_complete: bool,
    next_id: u32,
    pub created: Vec<ProcessItemCreateParams>,
    pub task_data_updates: Vec<ProcessItemTaskDataUpdateRequest>,
    pub completed_tasks: Vec<String>,
    pub patches: Vec<ProcessMetadataPatchRequest>,
    pub conversions: Vec<ConvertRequest>,
    pub calls: Vec<String>,
}

impl ScriptedEngine {
    pub fn new(process_id: &str) -> Self {
        Self {
            process: Process {
                id: process_id.to_string(),
                initiator_id: Some("initiator-1".to_string()),
                ..Default::default()
            },
            eur_rate: 1.0,
            submissions: HashMap::new(),
            items: HashMap::new(),
            signals: VecDeque::new(),
            auto_complete: true,
            next_id: 0,
            created: Vec::new(),
            task_data_updates: Vec::new(),
            completed_tasks: Vec::new(),
            patches: Vec::new(),
            conversions: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Tasks are created but never reported completed.
    pub fn without_completions(mut self) -> Self {
        self.auto_complete = false;
        self
    }

    pub fn submit(&mut self, code: &str, submission: JsonValue) -> &mut Self {
        self.submissions
            .entry(code.to_string())
            .or_default()
            .push_back(submission);
        self
    }

    pub fn push_signal(&mut self, signal: SignalProcessItem) {
        self.signals.push_back(signal);
    }

    pub fn pending_signals(&self) -> usize {
        self.signals.len()
    }

    pub fn created_codes(&self) -> Vec<&str> {
        self.created
            .iter()
            .map(|p| p.process_item_definition_code.as_str())
            .collect()
    }

    pub fn created_with_code(&self, code: &str) -> Vec<&ProcessItemCreateParams> {
        self.created
            .iter()
            .filter(|p| p.process_item_definition_code == code)
            .collect()
    }
}

#[async_trait]
impl ProcessEngine for ScriptedEngine {
    fn new_process_item_id(&mut self) -> String {
        self.next_id += 1;
        format!("item-{}", self.next_id)
    }

    async fn create_process_item(
        &mut self,
        request: ProcessItemCreateRequest,
    ) -> Result<ProcessItem> {
        let params = request.params;
        self.calls.push(format!("create:{}", params.process_item_definition_code));

        let seeded = params.task.as_ref().and_then(|t| t.data.clone());
        let submitted = self
            .submissions
            .get_mut(&params.process_item_definition_code)
            .and_then(VecDeque::pop_front);

        let item = ProcessItem {
            id: params.id.clone(),
            item_type: params.item_type,
            process_id: params.process_id.clone(),
            owner_id: params.owner_id.clone(),
            process_item_definition_code: Some(params.process_item_definition_code.clone()),
            task: Some(ProcessItemTask {
                status: None,
                data: submitted.or(seeded),
            }),
        };

        if self.auto_complete {
            self.signals
                .push_back(signal(&format!("msg-{}", params.id), ProcessItemType::Message));
            self.signals
                .push_back(signal(&params.id, ProcessItemType::Task));
        }

        self.items.insert(item.id.clone(), item.clone());
        self.created.push(params);
        Ok(item)
    }

    async fn retrieve_process_item(&mut self, process_item_id: &str) -> Result<ProcessItem> {
        self.calls.push(format!("retrieve_item:{}", process_item_id));
        self.items
            .get(process_item_id)
            .cloned()
            .ok_or_else(|| anyhow!("Process item {} not found", process_item_id))
    }

    async fn retrieve_process(&mut self, process_id: &str) -> Result<Process> {
        self.calls.push("retrieve_process".to_string());
        if process_id != self.process.id {
            return Err(anyhow!("Process {} not found", process_id));
        }
        Ok(self.process.clone())
    }

    async fn update_process_item_task_data(
        &mut self,
        request: ProcessItemTaskDataUpdateRequest,
    ) -> Result<ProcessItem> {
        self.calls.push("update_task_data".to_string());
        let item = self
            .items
            .get_mut(&request.process_item_id)
            .ok_or_else(|| anyhow!("Process item {} not found", request.process_item_id))?;
        item.task = Some(ProcessItemTask {
            status: None,
            data: Some(request.data.clone()),
        });
        let item = item.clone();
        self.task_data_updates.push(request);
        Ok(item)
    }

    async fn complete_process_item_task(&mut self, process_item_id: &str) -> Result<ProcessItem> {
        self.calls.push("complete_task".to_string());
        self.completed_tasks.push(process_item_id.to_string());
        self.items
            .get(process_item_id)
            .cloned()
            .ok_or_else(|| anyhow!("Process item {} not found", process_item_id))
    }

    async fn patch_process_metadata(
        &mut self,
        request: ProcessMetadataPatchRequest,
    ) -> Result<Process> {
        self.calls.push("patch_metadata".to_string());
        let metadata = self.process.metadata.get_or_insert_with(JsonValue::default);
        for op in &request.json_patch {
            if op.op == JsonPatchOperationType::Add {
                if let Some(value) = &op.value {
                    metadata.insert(op.path.trim_start_matches('/'), value.clone());
                }
            }
        }
        self.patches.push(request);
        Ok(self.process.clone())
    }

    async fn convert_currency(&mut self, request: ConvertRequest) -> Result<ConvertResponse> {
        self.calls.push("convert_currency".to_string());
        let amount = request.amount * self.eur_rate;
        self.conversions.push(request);
        Ok(ConvertResponse { amount })
    }

    async fn next_signal(&mut self) -> Option<SignalProcessItem> {
        self.signals.pop_front()
    }
}
