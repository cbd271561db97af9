use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidCronExpression { expression: String, message: String },

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

pub type JobResult<T> = Result<T, JobError>;

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidCronExpression { .. } => AppError::Validation {
                field: "schedule.cron".to_string(),
                reason: err.to_string(),
            },
            JobError::Scheduler(_) => AppError::Internal {
                source: anyhow::Error::new(err),
            },
        }
    }
}
