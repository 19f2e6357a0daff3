pub mod capture;
pub mod context;
pub mod error;
pub mod robots;
pub mod session;

pub use context::RobotContext;
pub use session::RobotSession;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Loads `.env` and installs the fmt subscriber shared by the robot binaries.
pub fn init_tracing() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "kubot=info,common=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
