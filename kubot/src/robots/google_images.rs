use anyhow::{anyhow, Result};
use common::models::{Process, ProcessItemTaskLogLevel};
use serde_json::Value;
use std::path::Path;

use crate::capture::{image_search_url, PageCapture};
use crate::session::{RobotSession, EXECUTION_BEGINS};

/// Process metadata key holding the text to search for.
pub const SEARCH_TEXT: &str = "SEARCH_TEXT";
pub const CAPTURE_FILE: &str = "capture.png";

pub fn search_text(process: &Process) -> Result<String> {
    let value = process
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.get(SEARCH_TEXT))
        .ok_or_else(|| anyhow!("Process {} has no {} metadata", process.id, SEARCH_TEXT))?;

    Ok(match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

/// Captures the image search results for the process' search text and attaches them to the task.
pub async fn google_images(
    session: &RobotSession,
    capture: &dyn PageCapture,
    outdir: &Path,
) -> Result<()> {
    session
        .execute_with_teardown(|session| async move {
            tracing::info!("Robot starts running");
            session
                .append_log(EXECUTION_BEGINS, ProcessItemTaskLogLevel::Info)
                .await?;

            let process = session.retrieve_process().await?;
            let text = search_text(&process)?;
            let url = image_search_url(&text)?;

            session
                .append_log("Awaiting user selection.", ProcessItemTaskLogLevel::Info)
                .await?;

            let path = outdir.join(CAPTURE_FILE);
            capture.capture_page(url.as_str(), &path).await?;

            session
                .append_log("Capture done.", ProcessItemTaskLogLevel::Info)
                .await?;

            session.upload_file(&path).await?;
            tracing::info!("Robot job is done");
            Ok(())
        })
        .await
}
