use serde::{Deserialize, Serialize};

use super::domain::{
    Category, CategoryId, Job, JobId, JobRecord, NewCategory, NewJob, NewUser, User, UserId,
};

/// Storage abstraction so the service can run against memory or SQLite alike.
///
/// Stores enforce the relational invariants themselves: category names are unique, jobs must
/// reference an existing recruiter and category, and deleting either one removes the jobs that
/// point at it.
pub trait JobRepository: Send + Sync {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    /// Oldest account registered under `email`.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn delete_user(&self, id: UserId) -> Result<(), RepositoryError>;

    fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError>;
    fn update_category(&self, category: Category) -> Result<(), RepositoryError>;
    fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError>;
    fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;
    /// All categories in creation order.
    fn categories(&self) -> Result<Vec<Category>, RepositoryError>;

    fn insert_job(&self, job: NewJob) -> Result<Job, RepositoryError>;
    fn update_job(&self, job: Job) -> Result<(), RepositoryError>;
    fn delete_job(&self, id: JobId) -> Result<(), RepositoryError>;
    fn fetch_job(&self, id: JobId) -> Result<Option<JobRecord>, RepositoryError>;
    /// Every posting, newest first.
    fn jobs(&self) -> Result<Vec<JobRecord>, RepositoryError>;
    /// Postings owned by `recruiter`, newest first.
    fn jobs_by_recruiter(&self, recruiter: UserId) -> Result<Vec<JobRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("integrity error: {0}")]
    Integrity(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for the one-shot success messages shown after a write.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub recipient: UserId,
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(recipient: UserId, text: impl Into<String>) -> Self {
        Self {
            recipient,
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}
