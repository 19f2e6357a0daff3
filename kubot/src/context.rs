//! Execution context handed to a robot by the KuBot manager through environment variables.

use crate::error::ContextError;
use chrono::{DateTime, Utc};
use common::{Credential, KuFlowRestClient};
use std::fmt;
use std::path::PathBuf;

pub mod vars {
    pub const KUFLOW_API_ENDPOINT: &str = "KUFLOW_API_ENDPOINT";
    pub const KUFLOW_API_TOKEN: &str = "KUFLOW_API_TOKEN";
    /// Token expiration as epoch milliseconds.
    pub const KUFLOW_API_TOKEN_EXPIRE_ON: &str = "KUFLOW_API_TOKEN_EXPIRE_ON";
    pub const KUFLOW_TENANT_ID: &str = "KUFLOW_TENANT_ID";
    pub const KUFLOW_PROCESS_ID: &str = "KUFLOW_PROCESS_ID";
    pub const KUFLOW_TASK_ID: &str = "KUFLOW_TASK_ID";
    pub const KUFLOW_ROBOT_ID: &str = "KUFLOW_ROBOT_ID";
    pub const KUFLOW_ROBOT_OPERATION: &str = "KUFLOW_ROBOT_OPERATION";
    pub const KUFLOW_ROBOT_HOME_PATH: &str = "KUFLOW_ROBOT_HOME_PATH";
    /// Per-run output directory, cleaned up regularly by the manager.
    pub const KUFLOW_EXECUTION_OUTDIR: &str = "KUFLOW_EXECUTION_OUTDIR";
    /// Accept invalid TLS certificates; only meant for on-premise development setups.
    pub const ALLOW_INSECURE_CONNECTION: &str = "ALLOW_INSECURE_CONNECTION";
}

pub const DEFAULT_EXECUTION_OUTDIR: &str = "output";

#[derive(Clone)]
pub struct RobotContext {
    pub api_endpoint: Option<String>,
    pub api_token: String,
    pub api_token_expires_on: Option<DateTime<Utc>>,
    pub tenant_id: Option<String>,
    pub process_id: String,
    pub task_id: String,
    pub robot_id: Option<String>,
    pub robot_operation: Option<String>,
    pub robot_home_path: Option<PathBuf>,
    pub execution_outdir: PathBuf,
    pub allow_insecure_connection: bool,
}

impl fmt::Debug for RobotContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RobotContext")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_token", &"<redacted>")
            .field("api_token_expires_on", &self.api_token_expires_on)
            .field("tenant_id", &self.tenant_id)
            .field("process_id", &self.process_id)
            .field("task_id", &self.task_id)
            .field("robot_id", &self.robot_id)
            .field("execution_outdir", &self.execution_outdir)
            .finish()
    }
}

impl RobotContext {
    pub fn from_env() -> Result<Self, ContextError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContextError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| {
            optional(name).ok_or(ContextError::MissingVariable(name))
        };

        let api_endpoint = optional(vars::KUFLOW_API_ENDPOINT)
            .filter(|endpoint| !endpoint.eq_ignore_ascii_case("none"));

        let api_token_expires_on = optional(vars::KUFLOW_API_TOKEN_EXPIRE_ON)
            .map(|raw| parse_expire_on(&raw))
            .transpose()?;

        Ok(Self {
            api_endpoint,
            api_token: required(vars::KUFLOW_API_TOKEN)?,
            api_token_expires_on,
            tenant_id: optional(vars::KUFLOW_TENANT_ID),
            process_id: required(vars::KUFLOW_PROCESS_ID)?,
            task_id: required(vars::KUFLOW_TASK_ID)?,
            robot_id: optional(vars::KUFLOW_ROBOT_ID),
            robot_operation: optional(vars::KUFLOW_ROBOT_OPERATION),
            robot_home_path: optional(vars::KUFLOW_ROBOT_HOME_PATH).map(PathBuf::from),
            execution_outdir: optional(vars::KUFLOW_EXECUTION_OUTDIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTION_OUTDIR)),
            allow_insecure_connection: optional(vars::ALLOW_INSECURE_CONNECTION)
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
        })
    }

    /// Span carrying the robot identity for every log line of a run.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "robot",
            robot_id = self.robot_id.as_deref().unwrap_or("-"),
            operation = self.robot_operation.as_deref().unwrap_or("-"),
            tenant_id = self.tenant_id.as_deref().unwrap_or("-"),
            process_id = %self.process_id,
            task_id = %self.task_id,
        )
    }

    pub fn credential(&self) -> Credential {
        Credential::Token {
            token: self.api_token.clone(),
            expires_on: self.api_token_expires_on,
        }
    }

    pub fn build_client(&self) -> anyhow::Result<KuFlowRestClient> {
        Ok(KuFlowRestClient::new(
            self.api_endpoint.as_deref(),
            self.credential(),
            self.allow_insecure_connection,
        )?)
    }
}

/// Output directory for robots that run without the platform: the robot home
/// when the manager provides one, else the user's home.
pub fn local_output_dir<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(vars::KUFLOW_ROBOT_HOME_PATH)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

fn parse_expire_on(raw: &str) -> Result<DateTime<Utc>, ContextError> {
    let invalid = |reason: &str| ContextError::InvalidVariable {
        name: vars::KUFLOW_API_TOKEN_EXPIRE_ON,
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let millis: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected epoch milliseconds"))?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| invalid("timestamp out of range"))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}
