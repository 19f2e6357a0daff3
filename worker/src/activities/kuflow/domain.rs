use common::models::{
    JsonPatchOperation, JsonValue, Process, ProcessItem, ProcessItemCreateParams,
    ProcessItemTaskLogLevel,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProcessItemCreateRequest {
    #[serde(flatten)]
    pub params: ProcessItemCreateParams,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemCreateResponse {
    pub process_item: ProcessItem,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemRetrieveRequest {
    pub process_item_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemRetrieveResponse {
    pub process_item: ProcessItem,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRetrieveRequest {
    pub process_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRetrieveResponse {
    pub process: Process,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemTaskDataUpdateRequest {
    pub process_item_id: String,
    pub data: JsonValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemTaskDataUpdateResponse {
    pub process_item: ProcessItem,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemTaskCompleteRequest {
    pub process_item_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemTaskCompleteResponse {
    pub process_item: ProcessItem,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemTaskAppendLogRequest {
    pub process_item_id: String,
    pub message: String,
    pub level: ProcessItemTaskLogLevel,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemTaskAppendLogResponse {
    pub process_item: ProcessItem,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetadataPatchRequest {
    pub process_id: String,
    pub json_patch: Vec<JsonPatchOperation>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetadataPatchResponse {
    pub process: Process,
}
