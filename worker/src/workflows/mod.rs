pub mod domain;
pub mod engine;
pub mod expense_reimbursement_workflow;
pub mod loan_application_workflow;

#[cfg(test)]
pub(crate) mod testing;

use crate::contracts;
use anyhow::{anyhow, Result};
use std::time::Duration;
use temporalio_common::protos::coresdk::activity_result::activity_resolution::Status;
use temporalio_common::protos::temporal::api::common::v1::{Payload, RetryPolicy};
use temporalio_sdk::{ActivityOptions, WfContext};

use domain::WorkflowRequest;

pub fn create_json_payload(data: &impl serde::Serialize) -> Result<Payload> {
    Ok(Payload {
        metadata: std::collections::HashMap::from([(
            "encoding".to_string(),
            "json/plain".as_bytes().to_vec(),
        )]),
        data: serde_json::to_vec(data)?,
        ..Default::default()
    })
}

pub fn decode_json_payload<T: serde::de::DeserializeOwned>(payload: &Payload) -> Result<T> {
    serde_json::from_slice(&payload.data).map_err(|e| anyhow!("Failed to deserialize payload: {}", e))
}

/// First workflow argument, decoded as the process request.
pub fn parse_workflow_request(args: &[Payload]) -> Result<WorkflowRequest> {
    let payload = args
        .first()
        .ok_or_else(|| anyhow!("Missing workflow request input"))?;
    decode_json_payload(payload)
}

fn decode_activity_result<T: serde::de::DeserializeOwned>(
    status: Option<Status>,
    backoff_message: &str,
) -> Result<T> {
    match status {
        Some(Status::Completed(success)) => {
            let payload = success
                .result
                .ok_or_else(|| anyhow!("Activity completed but returned no result"))?;
            serde_json::from_slice(&payload.data)
                .map_err(|e| anyhow!("Failed to deserialize result: {}", e))
        }
        Some(Status::Failed(f)) => Err(anyhow!("Activity failed: {:?}", f)),
        Some(Status::Cancelled(_)) => Err(anyhow!("Activity cancelled")),
        Some(Status::Backoff(_)) => Err(anyhow!(backoff_message.to_string())),
        None => Err(anyhow!("Activity returned no status")),
    }
}

pub async fn execute_activity<T: serde::de::DeserializeOwned>(
    ctx: &WfContext,
    opts: ActivityOptions,
) -> Result<T> {
    let res = ctx.activity(opts).await;
    decode_activity_result(
        res.status,
        "Activity returned Backoff status; this helper expects Completed/Failed/Cancelled",
    )
}

/// Options shared by every platform activity: server-default retries,
/// ten minutes per attempt and a year overall.
pub fn default_activity_options(
    activity_type: &str,
    input: &impl serde::Serialize,
) -> Result<ActivityOptions> {
    Ok(ActivityOptions {
        activity_type: activity_type.to_string(),
        input: create_json_payload(input)?,
        start_to_close_timeout: Some(contracts::ACTIVITY_START_TO_CLOSE_TIMEOUT),
        schedule_to_close_timeout: Some(contracts::ACTIVITY_SCHEDULE_TO_CLOSE_TIMEOUT),
        retry_policy: None,
        ..Default::default()
    })
}

/// Task data updates get a full day per attempt and back off to at most 30s between attempts.
pub fn task_data_update_activity_options(
    activity_type: &str,
    input: &impl serde::Serialize,
) -> Result<ActivityOptions> {
    let mut options = default_activity_options(activity_type, input)?;
    options.start_to_close_timeout = Some(contracts::TASK_DATA_UPDATE_START_TO_CLOSE_TIMEOUT);
    options.retry_policy = Some(retry_policy_with_maximum_interval(
        contracts::TASK_DATA_UPDATE_MAXIMUM_RETRY_INTERVAL,
    ));
    Ok(options)
}

fn retry_policy_with_maximum_interval(maximum_interval: Duration) -> RetryPolicy {
    RetryPolicy {
        maximum_interval: maximum_interval.try_into().ok(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temporalio_common::protos::coresdk::activity_result::{
        activity_resolution::Status, Cancellation, DoBackoff, Failure, Success,
    };

    fn completed_status(payload: Option<Vec<u8>>) -> Status {
        Status::Completed(Success {
            result: payload.map(|data| Payload {
                metadata: std::collections::HashMap::new(),
                data,
                ..Default::default()
            }),
        })
    }

    #[test]
    fn create_json_payload_sets_encoding_and_body() {
        let payload = create_json_payload(&serde_json::json!({"processId": "p-1"})).unwrap();
        assert_eq!(
            payload.metadata.get("encoding"),
            Some(&b"json/plain".to_vec())
        );
        let request = parse_workflow_request(&[payload]).unwrap();
        assert_eq!(request.process_id, "p-1");
    }

    #[test]
    fn parse_workflow_request_requires_an_argument() {
        let err = parse_workflow_request(&[]).unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn decode_activity_result_covers_all_status_variants() {
        let ok: i32 = decode_activity_result(
            Some(completed_status(Some(serde_json::to_vec(&7).unwrap()))),
            "backoff",
        )
        .unwrap();
        assert_eq!(ok, 7);

        let no_payload = decode_activity_result::<i32>(Some(completed_status(None)), "backoff");
        assert!(no_payload.unwrap_err().to_string().contains("no result"));

        let bad_json = decode_activity_result::<i32>(
            Some(completed_status(Some(b"not-json".to_vec()))),
            "backoff",
        );
        assert!(bad_json.unwrap_err().to_string().contains("deserialize"));

        let failed =
            decode_activity_result::<i32>(Some(Status::Failed(Failure::default())), "backoff");
        assert!(failed.unwrap_err().to_string().contains("Activity failed"));

        let cancelled = decode_activity_result::<i32>(
            Some(Status::Cancelled(Cancellation::default())),
            "backoff",
        );
        assert!(cancelled.unwrap_err().to_string().contains("cancelled"));

        let backoff = decode_activity_result::<i32>(
            Some(Status::Backoff(DoBackoff::default())),
            "custom backoff",
        );
        assert!(backoff.unwrap_err().to_string().contains("custom backoff"));

        let missing = decode_activity_result::<i32>(None, "backoff");
        assert!(missing.unwrap_err().to_string().contains("no status"));
    }

    #[test]
    fn activity_option_presets() {
        let options = default_activity_options("A", &1).unwrap();
        assert_eq!(options.activity_type, "A");
        assert_eq!(
            options.start_to_close_timeout,
            Some(Duration::from_secs(600))
        );
        assert_eq!(
            options.schedule_to_close_timeout,
            Some(Duration::from_secs(365 * 24 * 3600))
        );
        assert!(options.retry_policy.is_none());

        let options = task_data_update_activity_options("B", &1).unwrap();
        assert_eq!(
            options.start_to_close_timeout,
            Some(Duration::from_secs(24 * 3600))
        );
        let retry = options.retry_policy.unwrap();
        assert_eq!(retry.maximum_interval.map(|d| d.seconds), Some(30));
        assert_eq!(retry.maximum_attempts, 0);
    }
}
