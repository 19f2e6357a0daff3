use anyhow::Context;
use kubot::capture::SystemScreenCapture;
use kubot::context::local_output_dir;
use kubot::robots::desktop_screenshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kubot::init_tracing();

    let home = local_output_dir(|name| std::env::var(name).ok())
        .context("Unable to resolve the robot or user home directory")?;
    let path = desktop_screenshot(&SystemScreenCapture::default(), &home).await?;

    println!("{}", path.display());
    Ok(())
}
