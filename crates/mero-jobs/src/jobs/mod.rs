//! Job postings: the record model, the public listing with search and category filtering, and
//! the ownership-gated create/update/delete workflow for agency recruiters.

pub mod access;
pub mod domain;
pub mod form;
pub mod identity;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use access::{AccessDenied, Principal};
pub use domain::{
    Category, CategoryId, GenderChoice, Job, JobFields, JobId, JobRecord, JobView, NewCategory,
    NewJob, NewUser, Recruiter, User, UserId,
};
pub use form::{validate_job_form, FieldErrors, JobForm, JobFormContext};
pub use identity::{current_principal, principal_from_headers, IdentityProvider, TokenRegistry};
pub use query::{paginate, JobFilter, JobListing, JobQuery, Page, PageError, PAGE_SIZE};
pub use repository::{JobRepository, Notice, NoticeLevel, Notifier, NotifyError, RepositoryError};
pub use router::{job_router, JobBoardState};
pub use service::{JobBoardError, JobBoardService, WorkflowOutcome};
pub use store::{InMemoryJobStore, InMemoryNotifier, SqliteJobStore};
