use std::time::Duration;

pub mod activities {
    pub const CREATE_PROCESS_ITEM: &str = "KuFlow_Engine_createProcessItem";
    pub const RETRIEVE_PROCESS_ITEM: &str = "KuFlow_Engine_retrieveProcessItem";
    pub const RETRIEVE_PROCESS: &str = "KuFlow_Engine_retrieveProcess";
    pub const UPDATE_PROCESS_ITEM_TASK_DATA: &str = "KuFlow_Engine_updateProcessItemTaskData";
    pub const COMPLETE_PROCESS_ITEM_TASK: &str = "KuFlow_Engine_completeProcessItemTask";
    pub const APPEND_PROCESS_ITEM_TASK_LOG: &str = "KuFlow_Engine_appendProcessItemTaskLog";
    pub const PATCH_PROCESS_METADATA: &str = "KuFlow_Engine_patchProcessMetadata";
    pub const CURRENCY_CONVERT: &str = "Currency_convert";
}

pub mod workflows {
    pub const LOAN_APPLICATION: &str = "SampleEngineWorkerLoanWorkflow";
    pub const EXPENSE_REIMBURSEMENT: &str = "SampleEngineWorkerExpenseReimbursementWorkflow";
}

pub mod signals {
    /// Sent by the platform when a process item reaches a terminal state.
    pub const PROCESS_ITEM: &str = "KuFlow_Engine_SignalProcessItem";
}

pub const ACTIVITY_START_TO_CLOSE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const ACTIVITY_SCHEDULE_TO_CLOSE_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub const TASK_DATA_UPDATE_START_TO_CLOSE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
pub const TASK_DATA_UPDATE_MAXIMUM_RETRY_INTERVAL: Duration = Duration::from_secs(30);
