use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use common::models::ProcessItemType;
use common::settings::Settings;
use temporalio_client::{WorkflowClientTrait, WorkflowOptions};
use temporalio_common::protos::temporal::api::common::v1::Payloads;
use worker::bootstrap::temporal::client_options;
use worker::contracts;
use worker::workflows::create_json_payload;
use worker::workflows::domain::{SignalProcessItem, WorkflowRequest};

/// Starts sample workflows and simulates platform signals against a Temporal server.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra configuration file, merged over application.yaml.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a process workflow.
    Start {
        #[arg(long, value_enum)]
        workflow: SampleWorkflow,
        #[arg(long)]
        process_id: String,
        /// Defaults to the process id.
        #[arg(long)]
        workflow_id: Option<String>,
    },
    /// Report a process item as completed to a running workflow.
    Signal {
        #[arg(long)]
        workflow_id: String,
        #[arg(long)]
        process_item_id: String,
        #[arg(long, value_enum, default_value_t = SignalType::Task)]
        item_type: SignalType,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleWorkflow {
    Loan,
    Expense,
}

impl SampleWorkflow {
    fn workflow_type(self) -> &'static str {
        match self {
            Self::Loan => contracts::workflows::LOAN_APPLICATION,
            Self::Expense => contracts::workflows::EXPENSE_REIMBURSEMENT,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SignalType {
    Task,
    Message,
}

impl From<SignalType> for ProcessItemType {
    fn from(value: SignalType) -> Self {
        match value {
            SignalType::Task => ProcessItemType::Task,
            SignalType::Message => ProcessItemType::Message,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Some(config) = &cli.config {
        tracing::debug!(%config, "Using extra configuration file");
    }

    let settings = Settings::new()?;
    let task_queue = settings
        .temporal
        .kuflow_queue
        .clone()
        .ok_or_else(|| anyhow!("Property temporal.kuflow-queue not found"))?;

    let client = client_options(
        &settings.temporal,
        "kuflow-samples-starter",
        "kuflow-samples-starter".to_string(),
    )?
    .connect(settings.temporal.namespace.clone(), None)
    .await?;

    match cli.command {
        Commands::Start {
            workflow,
            process_id,
            workflow_id,
        } => {
            let workflow_id = workflow_id.unwrap_or_else(|| process_id.clone());
            let input = create_json_payload(&WorkflowRequest { process_id })?;
            let opts = WorkflowOptions {
                id_reuse_policy: temporalio_common::protos::temporal::api::enums::v1::WorkflowIdReusePolicy::AllowDuplicate,
                ..Default::default()
            };

            tracing::info!("Starting {} workflow: {}", workflow.workflow_type(), workflow_id);
            let started = client
                .start_workflow(
                    vec![input],
                    task_queue,
                    workflow_id.clone(),
                    workflow.workflow_type().to_string(),
                    None,
                    opts,
                )
                .await?;
            tracing::info!(run_id = %started.run_id, "Workflow started successfully.");
        }
        Commands::Signal {
            workflow_id,
            process_item_id,
            item_type,
        } => {
            let signal = SignalProcessItem {
                id: process_item_id,
                item_type: item_type.into(),
            };
            let payload = create_json_payload(&signal)?;

            client
                .signal_workflow_execution(
                    workflow_id.clone(),
                    "".to_string(),
                    contracts::signals::PROCESS_ITEM.to_string(),
                    Some(Payloads {
                        payloads: vec![payload],
                    }),
                    None,
                )
                .await?;
            tracing::info!("Signal for process item {} sent to {}", signal.id, workflow_id);
        }
    }

    Ok(())
}
