use kubot::capture::HeadlessChromeCapture;
use kubot::robots::google_images;
use kubot::{RobotContext, RobotSession};
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kubot::init_tracing();

    let ctx = RobotContext::from_env()?;
    let session = RobotSession::from_context(&ctx)?;

    google_images(&session, &HeadlessChromeCapture::default(), &ctx.execution_outdir)
        .instrument(ctx.span())
        .await
}
