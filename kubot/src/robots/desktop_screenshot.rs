use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::capture::ScreenCapture;
use crate::session::RobotSession;

pub const SCREENSHOT_FILE: &str = "screenshot.png";
pub const DESKTOP_SCREENSHOT_FILE: &str = "desktop-screenshot.png";

/// Captures the screen into the execution output directory and attaches it to the task.
pub async fn desktop_screenshot_to_kuflow(
    session: &RobotSession,
    capture: &dyn ScreenCapture,
    outdir: &Path,
) -> Result<()> {
    session
        .execute(|session| async move {
            let path = outdir.join(SCREENSHOT_FILE);
            capture.capture_screen(&path).await?;
            session.upload_file(&path).await?;
            Ok(())
        })
        .await
}

/// Captures the screen into `home` without talking to the platform.
pub async fn desktop_screenshot(capture: &dyn ScreenCapture, home: &Path) -> Result<PathBuf> {
    let path = home.join(DESKTOP_SCREENSHOT_FILE);
    capture.capture_screen(&path).await?;
    tracing::info!(path = %path.display(), "Screenshot saved");
    Ok(path)
}
