use crate::activities::currency::{ConvertRequest, ConvertResponse};
use crate::activities::kuflow::{
    ProcessItemCreateRequest, ProcessItemCreateResponse, ProcessItemRetrieveRequest,
    ProcessItemRetrieveResponse, ProcessItemTaskCompleteRequest, ProcessItemTaskCompleteResponse,
    ProcessItemTaskDataUpdateRequest, ProcessItemTaskDataUpdateResponse,
    ProcessMetadataPatchRequest, ProcessMetadataPatchResponse, ProcessRetrieveRequest,
    ProcessRetrieveResponse,
};
use crate::contracts;
use crate::workflows::domain::SignalProcessItem;
use crate::workflows::{
    decode_json_payload, default_activity_options, execute_activity,
    task_data_update_activity_options,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::models::{
    JsonValue, Process, ProcessItem, ProcessItemCreateParams, ProcessItemTaskCreateParams,
    ProcessItemType,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use temporalio_common::protos::temporal::api::common::v1::Payload;
use temporalio_sdk::WfContext;
use uuid::Uuid;

/// Side effects available to a process workflow.
#[async_trait]
pub trait ProcessEngine: Send {
    fn new_process_item_id(&mut self) -> String;

    async fn create_process_item(
        &mut self,
        request: ProcessItemCreateRequest,
    ) -> Result<ProcessItem>;

    async fn retrieve_process_item(&mut self, process_item_id: &str) -> Result<ProcessItem>;

    async fn retrieve_process(&mut self, process_id: &str) -> Result<Process>;

    async fn update_process_item_task_data(
        &mut self,
        request: ProcessItemTaskDataUpdateRequest,
    ) -> Result<ProcessItem>;

    async fn complete_process_item_task(&mut self, process_item_id: &str) -> Result<ProcessItem>;

    async fn patch_process_metadata(
        &mut self,
        request: ProcessMetadataPatchRequest,
    ) -> Result<Process>;

    async fn convert_currency(&mut self, request: ConvertRequest) -> Result<ConvertResponse>;

    /// Next process item signal; `None` once no further signal can arrive.
    async fn next_signal(&mut self) -> Option<SignalProcessItem>;
}

/// Largest timestamp a UUIDv7 can hold (48 bits).
const MAX_UUID_V7_MILLIS: u64 = (1 << 48) - 1;

/// UUIDv7 ids driven by workflow time and the workflow random seed, so replays
/// regenerate the same ids.
pub struct ProcessItemIdGenerator {
    rng: StdRng,
}

impl ProcessItemIdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_id(&mut self, now: SystemTime) -> Uuid {
        let millis = now
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default()
            .min(MAX_UUID_V7_MILLIS);
        let mut random = [0u8; 10];
        self.rng.fill_bytes(&mut random);
        uuid::Builder::from_unix_timestamp_millis(millis, &random).into_uuid()
    }
}

pub struct TemporalEngine {
    ctx: WfContext,
    signals: BoxStream<'static, Option<SignalProcessItem>>,
    ids: ProcessItemIdGenerator,
}

impl TemporalEngine {
    /// Must be built before the first await so no early signal is missed.
    pub fn new(ctx: WfContext) -> Self {
        let signals = ctx
            .make_signal_channel(contracts::signals::PROCESS_ITEM)
            .map(|signal| {
                match signal
                    .input
                    .first()
                    .map(decode_json_payload::<SignalProcessItem>)
                {
                    Some(Ok(item)) => Some(item),
                    Some(Err(e)) => {
                        tracing::warn!("Ignoring malformed process item signal: {}", e);
                        None
                    }
                    None => {
                        tracing::warn!("Ignoring process item signal without payload");
                        None
                    }
                }
            })
            .boxed();
        let ids = ProcessItemIdGenerator::new(ctx.random_seed());

        Self { ctx, signals, ids }
    }

    pub fn args(&self) -> &[Payload] {
        self.ctx.get_args()
    }
}

#[async_trait]
impl ProcessEngine for TemporalEngine {
    fn new_process_item_id(&mut self) -> String {
        let now = self.ctx.workflow_time().unwrap_or(UNIX_EPOCH);
        self.ids.next_id(now).to_string()
    }

    async fn create_process_item(
        &mut self,
        request: ProcessItemCreateRequest,
    ) -> Result<ProcessItem> {
        let options =
            default_activity_options(contracts::activities::CREATE_PROCESS_ITEM, &request)?;
        let response: ProcessItemCreateResponse = execute_activity(&self.ctx, options).await?;
        Ok(response.process_item)
    }

    async fn retrieve_process_item(&mut self, process_item_id: &str) -> Result<ProcessItem> {
        let request = ProcessItemRetrieveRequest {
            process_item_id: process_item_id.to_string(),
        };
        let options =
            default_activity_options(contracts::activities::RETRIEVE_PROCESS_ITEM, &request)?;
        let response: ProcessItemRetrieveResponse = execute_activity(&self.ctx, options).await?;
        Ok(response.process_item)
    }

    async fn retrieve_process(&mut self, process_id: &str) -> Result<Process> {
        let request = ProcessRetrieveRequest {
            process_id: process_id.to_string(),
        };
        let options = default_activity_options(contracts::activities::RETRIEVE_PROCESS, &request)?;
        let response: ProcessRetrieveResponse = execute_activity(&self.ctx, options).await?;
        Ok(response.process)
    }

    async fn update_process_item_task_data(
        &mut self,
        request: ProcessItemTaskDataUpdateRequest,
    ) -> Result<ProcessItem> {
        let options = task_data_update_activity_options(
            contracts::activities::UPDATE_PROCESS_ITEM_TASK_DATA,
            &request,
        )?;
        let response: ProcessItemTaskDataUpdateResponse =
            execute_activity(&self.ctx, options).await?;
        Ok(response.process_item)
    }

    async fn complete_process_item_task(&mut self, process_item_id: &str) -> Result<ProcessItem> {
        let request = ProcessItemTaskCompleteRequest {
            process_item_id: process_item_id.to_string(),
        };
        let options =
            default_activity_options(contracts::activities::COMPLETE_PROCESS_ITEM_TASK, &request)?;
        let response: ProcessItemTaskCompleteResponse =
            execute_activity(&self.ctx, options).await?;
        Ok(response.process_item)
    }

    async fn patch_process_metadata(
        &mut self,
        request: ProcessMetadataPatchRequest,
    ) -> Result<Process> {
        let options =
            default_activity_options(contracts::activities::PATCH_PROCESS_METADATA, &request)?;
        let response: ProcessMetadataPatchResponse = execute_activity(&self.ctx, options).await?;
        Ok(response.process)
    }

    async fn convert_currency(&mut self, request: ConvertRequest) -> Result<ConvertResponse> {
        let options = default_activity_options(contracts::activities::CURRENCY_CONVERT, &request)?;
        execute_activity(&self.ctx, options).await
    }

    async fn next_signal(&mut self) -> Option<SignalProcessItem> {
        loop {
            match self.signals.next().await {
                Some(Some(signal)) => return Some(signal),
                Some(None) => continue,
                None => return None,
            }
        }
    }
}

/// Ids of task items the platform has reported as completed.
#[derive(Debug, Default, Clone)]
pub struct CompletedProcessItems {
    ids: HashSet<String>,
}

impl CompletedProcessItems {
    /// Records task signals; message signals are ignored. Returns whether the set changed.
    pub fn record(&mut self, signal: &SignalProcessItem) -> bool {
        match signal.item_type {
            ProcessItemType::Task => self.ids.insert(signal.id.clone()),
            ProcessItemType::Message => false,
        }
    }

    pub fn contains(&self, process_item_id: &str) -> bool {
        self.ids.contains(process_item_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Drives task items on top of an engine: creates them and blocks until the
/// platform signals their completion.
pub struct ProcessItemTracker<E> {
    engine: E,
    completed: CompletedProcessItems,
}

impl<E: ProcessEngine> ProcessItemTracker<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            completed: CompletedProcessItems::default(),
        }
    }

    pub fn engine(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn completed(&self) -> &CompletedProcessItems {
        &self.completed
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Creates a task item with a fresh id and returns that id without waiting.
    pub async fn create_task(
        &mut self,
        process_id: &str,
        code: &str,
        owner_id: Option<String>,
        data: Option<JsonValue>,
    ) -> Result<String> {
        let id = self.engine.new_process_item_id();
        let request = ProcessItemCreateRequest {
            params: ProcessItemCreateParams {
                id: id.clone(),
                item_type: ProcessItemType::Task,
                process_id: process_id.to_string(),
                owner_id,
                process_item_definition_code: code.to_string(),
                task: data.map(|data| ProcessItemTaskCreateParams { data: Some(data) }),
            },
        };

        self.engine.create_process_item(request).await?;
        tracing::debug!(process_item_id = %id, %code, "Task created");

        Ok(id)
    }

    /// Consumes signals until `process_item_id` has been reported completed.
    pub async fn wait_for_completion(&mut self, process_item_id: &str) -> Result<()> {
        while !self.completed.contains(process_item_id) {
            let signal = self.engine.next_signal().await.ok_or_else(|| {
                anyhow!(
                    "Signal channel closed before process item {} completed",
                    process_item_id
                )
            })?;

            if self.completed.record(&signal) {
                tracing::debug!(process_item_id = %signal.id, "Task completion received");
            }
        }

        Ok(())
    }

    pub async fn create_task_and_wait(
        &mut self,
        process_id: &str,
        code: &str,
        owner_id: Option<String>,
        data: Option<JsonValue>,
    ) -> Result<String> {
        let id = self.create_task(process_id, code, owner_id, data).await?;
        self.wait_for_completion(&id).await?;
        Ok(id)
    }

    /// Waits for the task and then fetches it, so the caller sees the submitted data.
    pub async fn create_task_wait_and_retrieve(
        &mut self,
        process_id: &str,
        code: &str,
        owner_id: Option<String>,
        data: Option<JsonValue>,
    ) -> Result<ProcessItem> {
        let id = self
            .create_task_and_wait(process_id, code, owner_id, data)
            .await?;
        self.engine.retrieve_process_item(&id).await
    }
}
