use kubot::capture::SystemScreenCapture;
use kubot::robots::desktop_screenshot_to_kuflow;
use kubot::{RobotContext, RobotSession};
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kubot::init_tracing();

    let ctx = RobotContext::from_env()?;
    let session = RobotSession::from_context(&ctx)?;
    let capture = SystemScreenCapture::default();

    async {
        tracing::info!("Robot starts running");
        desktop_screenshot_to_kuflow(&session, &capture, &ctx.execution_outdir).await
    }
    .instrument(ctx.span())
    .await
}
