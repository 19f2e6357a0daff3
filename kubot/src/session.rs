use anyhow::{Context, Result};
use common::models::{
    Document, JsonValue, Process, ProcessItem, ProcessItemTaskAppendLogParams,
    ProcessItemTaskDataUpdateParams, ProcessItemTaskLogLevel,
};
use common::KuFlowApi;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::context::RobotContext;

pub const EXECUTION_BEGINS: &str = "<<<<< Robot execution begins >>>>>";
pub const EXECUTION_ENDS: &str = "<<<<< Robot execution ends >>>>>";
pub const FINISHED_SUCCESSFULLY: &str = "<<<<< The robot has finished successfully >>>>>";

/// Task data key holding the uploaded document uri.
pub const FILE_DATA_KEY: &str = "file";

pub fn ended_unexpectedly(error: &anyhow::Error) -> String {
    format!("<<<<< Robot has ended unexpectedly. Details:: {:#} >>>>>", error)
}

pub fn terminated_with_error(error: &anyhow::Error) -> String {
    format!(
        "<<<<< The robot has terminated with an error. Details: {:#} >>>>>",
        error
    )
}

/// The process and task a robot run is bound to.
#[derive(Clone)]
pub struct RobotSession {
    api: Arc<dyn KuFlowApi>,
    process_id: String,
    task_id: String,
}

impl RobotSession {
    pub fn new(
        api: Arc<dyn KuFlowApi>,
        process_id: impl Into<String>,
        task_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            process_id: process_id.into(),
            task_id: task_id.into(),
        }
    }

    pub fn from_context(ctx: &RobotContext) -> Result<Self> {
        let client = ctx.build_client()?;
        Ok(Self::new(
            Arc::new(client),
            ctx.process_id.clone(),
            ctx.task_id.clone(),
        ))
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub async fn append_log(
        &self,
        message: impl Into<String>,
        level: ProcessItemTaskLogLevel,
    ) -> Result<ProcessItem> {
        let params = ProcessItemTaskAppendLogParams {
            message: message.into(),
            level,
        };
        self.api
            .append_process_item_task_log(&self.task_id, params)
            .await
    }

    pub async fn retrieve_process(&self) -> Result<Process> {
        self.api.retrieve_process(&self.process_id).await
    }

    /// Uploads the file as a process document and references it from the task data.
    pub async fn upload_file(&self, path: &Path) -> Result<ProcessItem> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid file name: {}", path.display()))?
            .to_string();
        let file_content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let document = Document {
            content_type: guess_content_type(path).to_string(),
            file_name,
            file_content,
        };

        let reference = self
            .api
            .upload_process_document(&self.process_id, document)
            .await?;
        tracing::info!(document_uri = %reference.document_uri, "Document uploaded");

        let data: JsonValue = [(FILE_DATA_KEY, reference.document_uri)].into_iter().collect();
        self.api
            .update_process_item_task_data(&self.task_id, ProcessItemTaskDataUpdateParams { data })
            .await
    }

    /// Runs the job between begin/end task logs. On failure an error line is
    /// appended on a best-effort basis and the job's error is returned.
    pub async fn execute<F, Fut>(&self, job: F) -> Result<()>
    where
        F: FnOnce(RobotSession) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let result = async {
            self.append_log(EXECUTION_BEGINS, ProcessItemTaskLogLevel::Info)
                .await?;
            job(self.clone()).await?;
            self.append_log(EXECUTION_ENDS, ProcessItemTaskLogLevel::Info)
                .await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        if let Err(e) = &result {
            tracing::error!("Robot failed: {:#}", e);
            if let Err(log_error) = self
                .append_log(ended_unexpectedly(e), ProcessItemTaskLogLevel::Error)
                .await
            {
                tracing::error!("Failed to report robot failure: {:#}", log_error);
            }
        }

        result
    }

    /// Runs the job and reports its outcome to the task log afterwards.
    /// Failures of that final log are only logged locally.
    pub async fn execute_with_teardown<F, Fut>(&self, job: F) -> Result<()>
    where
        F: FnOnce(RobotSession) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let result = job(self.clone()).await;

        let (message, level) = match &result {
            Ok(()) => (
                FINISHED_SUCCESSFULLY.to_string(),
                ProcessItemTaskLogLevel::Info,
            ),
            Err(e) => {
                tracing::error!("Error executing robot: {:#}", e);
                (terminated_with_error(e), ProcessItemTaskLogLevel::Error)
            }
        };

        if let Err(e) = self.append_log(message, level).await {
            tracing::error!(task_id = %self.task_id, "Teardown failed: {:#}", e);
        }

        result
    }
}

/// Content type from the file extension, `application/octet-stream` when unknown.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("txt") | Some("log") => "text/plain",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;
    use common::models::DocumentReference;
    use common::ports::MockKuFlowApi;
    use std::sync::Mutex;

    pub(crate) type LogBook = Arc<Mutex<Vec<(String, ProcessItemTaskLogLevel)>>>;

    /// Mock that accepts task logs and records them.
    pub(crate) fn logging_mock() -> (MockKuFlowApi, LogBook) {
        let logs: LogBook = Arc::new(Mutex::new(Vec::new()));
        let mut mock = MockKuFlowApi::new();
        let sink = logs.clone();
        mock.expect_append_process_item_task_log()
            .returning(move |id, params| {
                sink.lock()
                    .unwrap()
                    .push((params.message.clone(), params.level));
                Ok(ProcessItem {
                    id: id.to_string(),
                    ..Default::default()
                })
            });
        (mock, logs)
    }

    pub(crate) fn messages(logs: &LogBook) -> Vec<String> {
        logs.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(guess_content_type(Path::new("out/capture.png")), "image/png");
        assert_eq!(guess_content_type(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("report.pdf")), "application/pdf");
        assert_eq!(
            guess_content_type(Path::new("noext")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn upload_file_references_document_from_task_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screenshot.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let mut mock = MockKuFlowApi::new();
        mock.expect_upload_process_document()
            .withf(|id, doc| {
                id == "p-1"
                    && doc.file_name == "screenshot.png"
                    && doc.content_type == "image/png"
                    && doc.file_content == b"png-bytes"
            })
            .times(1)
            .returning(|_, _| {
                Ok(DocumentReference {
                    document_uri: "kuflow-file:p-1/doc-1".to_string(),
                })
            });
        mock.expect_update_process_item_task_data()
            .withf(|id, params| {
                id == "t-1"
                    && params.data.get(FILE_DATA_KEY)
                        == Some(&serde_json::json!("kuflow-file:p-1/doc-1"))
            })
            .times(1)
            .returning(|id, _| {
                Ok(ProcessItem {
                    id: id.to_string(),
                    ..Default::default()
                })
            });

        let session = RobotSession::new(Arc::new(mock), "p-1", "t-1");
        let item = session.upload_file(&path).await.unwrap();
        assert_eq!(item.id, "t-1");
    }

    #[tokio::test]
    async fn upload_of_missing_file_fails_before_calling_api() {
        let dir = tempfile::tempdir().unwrap();
        let session = RobotSession::new(Arc::new(MockKuFlowApi::new()), "p-1", "t-1");

        let err = session
            .upload_file(&dir.path().join("absent.png"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn execute_logs_begin_and_end() {
        let (mock, logs) = logging_mock();
        let session = RobotSession::new(Arc::new(mock), "p-1", "t-1");

        session.execute(|_| async { Ok(()) }).await.unwrap();

        assert_eq!(messages(&logs), vec![EXECUTION_BEGINS, EXECUTION_ENDS]);
    }

    #[tokio::test]
    async fn execute_reports_failure_and_returns_original_error() {
        let (mock, logs) = logging_mock();
        let session = RobotSession::new(Arc::new(mock), "p-1", "t-1");

        let err = session
            .execute(|_| async { Err(anyhow!("screen locked")) })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "screen locked");
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(
            logs[1],
            (
                "<<<<< Robot has ended unexpectedly. Details:: screen locked >>>>>".to_string(),
                ProcessItemTaskLogLevel::Error
            )
        );
    }

    #[tokio::test]
    async fn execute_keeps_job_error_when_failure_log_fails() {
        let mut mock = MockKuFlowApi::new();
        let mut calls = 0;
        mock.expect_append_process_item_task_log()
            .returning(move |id, _| {
                calls += 1;
                if calls == 1 {
                    Ok(ProcessItem {
                        id: id.to_string(),
                        ..Default::default()
                    })
                } else {
                    Err(anyhow!("api down"))
                }
            });
        let session = RobotSession::new(Arc::new(mock), "p-1", "t-1");

        let err = session
            .execute(|_| async { Err(anyhow!("capture failed")) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "capture failed");
    }

    #[tokio::test]
    async fn teardown_reports_success() {
        let (mock, logs) = logging_mock();
        let session = RobotSession::new(Arc::new(mock), "p-1", "t-1");

        session
            .execute_with_teardown(|_| async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(
            logs.lock().unwrap().as_slice(),
            &[(
                FINISHED_SUCCESSFULLY.to_string(),
                ProcessItemTaskLogLevel::Info
            )]
        );
    }

    #[tokio::test]
    async fn teardown_reports_error() {
        let (mock, logs) = logging_mock();
        let session = RobotSession::new(Arc::new(mock), "p-1", "t-1");

        let result = session
            .execute_with_teardown(|_| async { Err(anyhow!("no browser")) })
            .await;

        assert!(result.is_err());
        assert_eq!(
            messages(&logs),
            vec!["<<<<< The robot has terminated with an error. Details: no browser >>>>>"]
        );
    }

    #[tokio::test]
    async fn teardown_log_failure_does_not_mask_success() {
        let mut mock = MockKuFlowApi::new();
        mock.expect_append_process_item_task_log()
            .returning(|_, _| Err(anyhow!("api down")));
        let session = RobotSession::new(Arc::new(mock), "p-1", "t-1");

        session
            .execute_with_teardown(|_| async { Ok(()) })
            .await
            .unwrap();
    }
}
