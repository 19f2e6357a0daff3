pub mod domain;

use common::models::{ProcessItemTaskAppendLogParams, ProcessItemTaskDataUpdateParams};
use common::KuFlowApi;
use std::sync::Arc;
use temporalio_sdk::ActivityError;

pub use domain::*;

/// Platform operations exposed to workflows as activities.
pub struct KuFlowActivities {
    api: Arc<dyn KuFlowApi>,
}

impl KuFlowActivities {
    pub fn new(api: Arc<dyn KuFlowApi>) -> Self {
        Self { api }
    }

    pub async fn create_process_item(
        &self,
        request: ProcessItemCreateRequest,
    ) -> Result<ProcessItemCreateResponse, ActivityError> {
        tracing::debug!(
            process_item_id = %request.params.id,
            code = %request.params.process_item_definition_code,
            "Creating process item"
        );
        self.api
            .create_process_item(request.params)
            .await
            .map(|process_item| ProcessItemCreateResponse { process_item })
            .map_err(ActivityError::from)
    }

    pub async fn retrieve_process_item(
        &self,
        request: ProcessItemRetrieveRequest,
    ) -> Result<ProcessItemRetrieveResponse, ActivityError> {
        self.api
            .retrieve_process_item(&request.process_item_id)
            .await
            .map(|process_item| ProcessItemRetrieveResponse { process_item })
            .map_err(ActivityError::from)
    }

    pub async fn retrieve_process(
        &self,
        request: ProcessRetrieveRequest,
    ) -> Result<ProcessRetrieveResponse, ActivityError> {
        self.api
            .retrieve_process(&request.process_id)
            .await
            .map(|process| ProcessRetrieveResponse { process })
            .map_err(ActivityError::from)
    }

    pub async fn update_process_item_task_data(
        &self,
        request: ProcessItemTaskDataUpdateRequest,
    ) -> Result<ProcessItemTaskDataUpdateResponse, ActivityError> {
        let params = ProcessItemTaskDataUpdateParams { data: request.data };
        self.api
            .update_process_item_task_data(&request.process_item_id, params)
            .await
            .map(|process_item| ProcessItemTaskDataUpdateResponse { process_item })
            .map_err(ActivityError::from)
    }

    pub async fn complete_process_item_task(
        &self,
        request: ProcessItemTaskCompleteRequest,
    ) -> Result<ProcessItemTaskCompleteResponse, ActivityError> {
        self.api
            .complete_process_item_task(&request.process_item_id)
            .await
            .map(|process_item| ProcessItemTaskCompleteResponse { process_item })
            .map_err(ActivityError::from)
    }

    pub async fn append_process_item_task_log(
        &self,
        request: ProcessItemTaskAppendLogRequest,
    ) -> Result<ProcessItemTaskAppendLogResponse, ActivityError> {
        let params = ProcessItemTaskAppendLogParams {
            message: request.message,
            level: request.level,
        };
        self.api
            .append_process_item_task_log(&request.process_item_id, params)
            .await
            .map(|process_item| ProcessItemTaskAppendLogResponse { process_item })
            .map_err(ActivityError::from)
    }

    pub async fn patch_process_metadata(
        &self,
        request: ProcessMetadataPatchRequest,
    ) -> Result<ProcessMetadataPatchResponse, ActivityError> {
        self.api
            .patch_process_metadata(&request.process_id, request.json_patch)
            .await
            .map(|process| ProcessMetadataPatchResponse { process })
            .map_err(ActivityError::from)
    }
}
