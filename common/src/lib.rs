pub mod error;
pub mod kuflow;
pub mod models;
pub mod ports;
pub mod settings;
pub mod task_data;

pub use kuflow::{Credential, KuFlowRestClient};
pub use ports::KuFlowApi;
