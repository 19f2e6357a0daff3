use dotenvy::dotenv;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const BASE_CONFIG_FILE: &str = "application.yaml";
pub const LOCAL_CONFIG_FILE: &str = "application-local.yaml";
pub const CONFIG_PATH_ENV: &str = "KUFLOW_SAMPLES_CONFIG_PATH";
pub const DEFAULT_TEMPORAL_NAMESPACE: &str = "default";

pub const DEFAULT_CURRENCY_ENDPOINT: &str =
    "https://cdn.jsdelivr.net/gh/fawazahmed0/currency-api@1/latest/currencies";

/// Plain environment variables that override single configuration properties.
const ENV_OVERRIDES: [(&str, &str); 6] = [
    ("KUFLOW_API_ENDPOINT", "kuflow.api.endpoint"),
    ("KUFLOW_API_CLIENTID", "kuflow.api.client-id"),
    ("KUFLOW_API_CLIENTSECRET", "kuflow.api.client-secret"),
    ("TEMPORAL_TARGET", "temporal.target"),
    ("TEMPORAL_NAMESPACE", "temporal.namespace"),
    ("TEMPORAL_KUFLOWQUEUE", "temporal.kuflow-queue"),
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Property {0} not found")]
    MissingProperty(&'static str),
}

fn parse_config_arg<I, S>(args: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut iter = args.into_iter().map(Into::into);

    // Skip binary name
    let _ = iter.next();

    while let Some(arg) = iter.next() {
        if let Some(raw_config) = arg.strip_prefix("--config=") {
            if !raw_config.is_empty() {
                return Some(raw_config.to_string());
            }
            continue;
        }

        if arg == "--config" {
            if let Some(config) = iter.next() {
                if !config.is_empty() {
                    return Some(config);
                }
            }
        }
    }

    None
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    pub kuflow: KuFlowSettings,
    pub temporal: TemporalSettings,
    #[serde(default)]
    pub currency: CurrencySettings,
    #[serde(default)]
    pub samples: SamplesSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct KuFlowSettings {
    pub api: KuFlowApiSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct KuFlowApiSettings {
    pub endpoint: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TemporalSettings {
    pub target: String,
    pub namespace: String,
    pub kuflow_queue: Option<String>,
    #[serde(default)]
    pub mutual_tls: Option<MutualTlsSettings>,
}

impl Default for TemporalSettings {
    fn default() -> Self {
        Self {
            target: "localhost:7233".to_string(),
            namespace: DEFAULT_TEMPORAL_NAMESPACE.to_string(),
            kuflow_queue: None,
            mutual_tls: None,
        }
    }
}

impl TemporalSettings {
    /// Target as a URL; bare `host:port` targets get a scheme matching the TLS mode.
    pub fn target_url(&self) -> String {
        if self.target.contains("://") {
            return self.target.clone();
        }
        let scheme = if self.mutual_tls.is_some() {
            "https"
        } else {
            "http"
        };
        format!("{}://{}", scheme, self.target)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct MutualTlsSettings {
    pub ca_file: Option<PathBuf>,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CurrencySettings {
    pub endpoint: String,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CURRENCY_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SamplesSettings {
    #[serde(default)]
    pub expense: ExpenseSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ExpenseSettings {
    /// Owner of the automatically processed reimbursement task.
    pub reimbursement_owner_id: Option<String>,
}

/// Settings after the required properties have been checked.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub api_endpoint: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub temporal: TemporalSettings,
    pub task_queue: String,
    pub currency: CurrencySettings,
    pub samples: SamplesSettings,
}

impl Settings {
    pub fn new() -> Result<Self, SettingsError> {
        dotenv().ok();

        let config_path =
            parse_config_arg(std::env::args()).or_else(|| std::env::var(CONFIG_PATH_ENV).ok());

        Self::figment(config_path.as_deref())
            .extract::<Settings>()
            .map(Settings::normalized)
            .map_err(|e| SettingsError::Figment(Box::new(e)))
    }

    /// Blank optional values count as unset; a blank namespace falls back to the default one.
    pub fn normalized(mut self) -> Self {
        self.kuflow.api.endpoint = non_blank(self.kuflow.api.endpoint);
        self.samples.expense.reimbursement_owner_id =
            non_blank(self.samples.expense.reimbursement_owner_id);
        if self.temporal.namespace.trim().is_empty() {
            self.temporal.namespace = DEFAULT_TEMPORAL_NAMESPACE.to_string();
        }
        self
    }

    /// Layered sources: defaults, base file, local override, explicit file, environment.
    pub fn figment(config_path: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(BASE_CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE));

        if let Some(config_path) = config_path {
            figment = figment.merge(Yaml::file(config_path));
        }

        figment = figment.merge(Env::prefixed("KUFLOW_SAMPLES_").split("__"));

        for (variable, property) in ENV_OVERRIDES {
            figment = figment.merge(Env::raw().only(&[variable]).map(move |_| property.into()));
        }

        figment
    }

    pub fn into_worker_settings(self) -> Result<WorkerSettings, SettingsError> {
        let settings = self.normalized();
        let client_id = required(settings.kuflow.api.client_id, "kuflow.api.client-id")?;
        let client_secret = required(settings.kuflow.api.client_secret, "kuflow.api.client-secret")?;
        let task_queue = required(settings.temporal.kuflow_queue.clone(), "temporal.kuflow-queue")?;

        Ok(WorkerSettings {
            api_endpoint: settings.kuflow.api.endpoint,
            client_id,
            client_secret,
            temporal: settings.temporal,
            task_queue,
            currency: settings.currency,
            samples: settings.samples,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, property: &'static str) -> Result<String, SettingsError> {
    non_blank(value).ok_or(SettingsError::MissingProperty(property))
}
