use anyhow::Result;
use async_trait::async_trait;
#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

use crate::kuflow::KuFlowRestClient;
use crate::models::{
    Document, DocumentReference, JsonPatchOperation, Process, ProcessItem,
    ProcessItemCreateParams, ProcessItemTaskAppendLogParams, ProcessItemTaskDataUpdateParams,
};

/// Operations of the orchestration platform used by activities and robots.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait KuFlowApi: Send + Sync {
    async fn create_process_item(&self, params: ProcessItemCreateParams) -> Result<ProcessItem>;
    async fn retrieve_process_item(&self, id: &str) -> Result<ProcessItem>;
    async fn update_process_item_task_data(
        &self,
        id: &str,
        params: ProcessItemTaskDataUpdateParams,
    ) -> Result<ProcessItem>;
    async fn complete_process_item_task(&self, id: &str) -> Result<ProcessItem>;
    async fn append_process_item_task_log(
        &self,
        id: &str,
        params: ProcessItemTaskAppendLogParams,
    ) -> Result<ProcessItem>;
    async fn retrieve_process(&self, id: &str) -> Result<Process>;
    async fn patch_process_metadata(
        &self,
        id: &str,
        json_patch: Vec<JsonPatchOperation>,
    ) -> Result<Process>;
    async fn upload_process_document(
        &self,
        id: &str,
        document: Document,
    ) -> Result<DocumentReference>;
}

#[async_trait]
impl KuFlowApi for KuFlowRestClient {
    async fn create_process_item(&self, params: ProcessItemCreateParams) -> Result<ProcessItem> {
        Ok(KuFlowRestClient::create_process_item(self, &params).await?)
    }

    async fn retrieve_process_item(&self, id: &str) -> Result<ProcessItem> {
        Ok(KuFlowRestClient::retrieve_process_item(self, id).await?)
    }

    async fn update_process_item_task_data(
        &self,
        id: &str,
        params: ProcessItemTaskDataUpdateParams,
    ) -> Result<ProcessItem> {
        Ok(KuFlowRestClient::update_process_item_task_data(self, id, &params).await?)
    }

    async fn complete_process_item_task(&self, id: &str) -> Result<ProcessItem> {
        Ok(KuFlowRestClient::complete_process_item_task(self, id).await?)
    }

    async fn append_process_item_task_log(
        &self,
        id: &str,
        params: ProcessItemTaskAppendLogParams,
    ) -> Result<ProcessItem> {
        Ok(KuFlowRestClient::append_process_item_task_log(self, id, &params).await?)
    }

    async fn retrieve_process(&self, id: &str) -> Result<Process> {
        Ok(KuFlowRestClient::retrieve_process(self, id).await?)
    }

    async fn patch_process_metadata(
        &self,
        id: &str,
        json_patch: Vec<JsonPatchOperation>,
    ) -> Result<Process> {
        Ok(KuFlowRestClient::patch_process_metadata(self, id, &json_patch).await?)
    }

    async fn upload_process_document(
        &self,
        id: &str,
        document: Document,
    ) -> Result<DocumentReference> {
        Ok(KuFlowRestClient::upload_process_document(self, id, document).await?)
    }
}
