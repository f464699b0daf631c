use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::access::{require_agency, require_manager, AccessDenied, Principal};
use super::domain::{JobId, JobRecord, JobView, NewJob};
use super::form::{validate_job_form, JobForm, JobFormContext};
use super::query::{paginate, JobFilter, JobListing, JobQuery, Page, PageError, PAGE_SIZE};
use super::repository::{JobRepository, Notice, Notifier, RepositoryError};

pub const JOB_LIST_PATH: &str = "/jobs/";
pub const MY_JOBS_PATH: &str = "/jobs/my-jobs/";
pub const CREATE_JOB_PATH: &str = "/jobs/create/";

pub fn job_detail_path(id: JobId) -> String {
    format!("/jobs/{id}/")
}

pub const CREATED_NOTICE: &str = "Job created successfully!";
pub const UPDATED_NOTICE: &str = "Job updated successfully!";
pub const DELETED_NOTICE: &str = "Job deleted successfully!";

/// Result of a successful write: where to send the caller next and what to tell them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowOutcome {
    pub redirect_to: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobView>,
}

/// Service composing the access gate, query engine, form validation and repository.
pub struct JobBoardService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<R, N> JobBoardService<R, N>
where
    R: JobRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Public listing with search, category filter and pagination.
    pub fn list(&self, query: &JobQuery) -> Result<JobListing, JobBoardError> {
        let filter = JobFilter::from_query(query);
        let matched = filter.apply(self.repository.jobs()?);
        let page = paginate(matched, query.page.as_deref(), PAGE_SIZE)?;

        Ok(JobListing {
            page: page.map(|record| record.view()),
            categories: self.repository.categories()?,
            selected_category: query.category.clone().unwrap_or_default(),
            search: query.search.clone().unwrap_or_default(),
        })
    }

    /// Postings owned by the calling agency.
    pub fn my_jobs(
        &self,
        principal: Option<&Principal>,
        page: Option<&str>,
    ) -> Result<Page<JobView>, JobBoardError> {
        let principal = self.gate(require_agency(principal), "my_jobs")?;
        let owned = self.repository.jobs_by_recruiter(principal.id)?;
        let page = paginate(owned, page, PAGE_SIZE)?;
        Ok(page.map(|record| record.view()))
    }

    pub fn detail(&self, id: JobId) -> Result<JobView, JobBoardError> {
        Ok(self.fetch(id)?.view())
    }

    /// Blank form for a new posting.
    pub fn create_form(
        &self,
        principal: Option<&Principal>,
    ) -> Result<JobFormContext, JobBoardError> {
        self.gate(require_agency(principal), "create")?;
        Ok(JobFormContext::new(
            JobForm::initial(),
            self.repository.categories()?,
        ))
    }

    pub fn create(
        &self,
        principal: Option<&Principal>,
        form: JobForm,
    ) -> Result<WorkflowOutcome, JobBoardError> {
        let principal = self.gate(require_agency(principal), "create")?;
        let categories = self.repository.categories()?;

        let fields = match validate_job_form(&form, &categories) {
            Ok(fields) => fields,
            Err(errors) => {
                let context = JobFormContext::new(form, categories).with_errors(errors);
                return Err(JobBoardError::Invalid(Box::new(context)));
            }
        };

        let job = self.repository.insert_job(NewJob {
            recruiter: principal.id,
            fields,
        })?;
        info!(job_id = %job.id, recruiter = %principal.id, "job created");

        self.notify(Notice::success(principal.id, CREATED_NOTICE));

        let view = self.repository.fetch_job(job.id)?.map(|record| record.view());
        Ok(WorkflowOutcome {
            redirect_to: MY_JOBS_PATH.to_string(),
            message: CREATED_NOTICE.to_string(),
            job: view,
        })
    }

    /// Prefilled form for an owned posting.
    pub fn edit_form(
        &self,
        principal: Option<&Principal>,
        id: JobId,
    ) -> Result<JobFormContext, JobBoardError> {
        let record = self.fetch_managed(principal, id, "update")?;
        Ok(JobFormContext::new(
            JobForm::from_job(&record.job),
            self.repository.categories()?,
        ))
    }

    pub fn update(
        &self,
        principal: Option<&Principal>,
        id: JobId,
        form: JobForm,
    ) -> Result<WorkflowOutcome, JobBoardError> {
        let record = self.fetch_managed(principal, id, "update")?;
        let categories = self.repository.categories()?;

        let fields = match validate_job_form(&form, &categories) {
            Ok(fields) => fields,
            Err(errors) => {
                let context = JobFormContext::new(form, categories).with_errors(errors);
                return Err(JobBoardError::Invalid(Box::new(context)));
            }
        };

        let mut job = record.job;
        job.apply(fields);
        self.repository.update_job(job)?;
        info!(job_id = %id, recruiter = %record.recruiter.id, "job updated");

        self.notify(Notice::success(record.recruiter.id, UPDATED_NOTICE));

        let view = self.repository.fetch_job(id)?.map(|record| record.view());
        Ok(WorkflowOutcome {
            redirect_to: job_detail_path(id),
            message: UPDATED_NOTICE.to_string(),
            job: view,
        })
    }

    /// Confirmation view shown before a delete is submitted.
    pub fn delete_confirmation(
        &self,
        principal: Option<&Principal>,
        id: JobId,
    ) -> Result<JobView, JobBoardError> {
        Ok(self.fetch_managed(principal, id, "delete")?.view())
    }

    pub fn delete(
        &self,
        principal: Option<&Principal>,
        id: JobId,
    ) -> Result<WorkflowOutcome, JobBoardError> {
        let record = self.fetch_managed(principal, id, "delete")?;
        self.repository.delete_job(id)?;
        info!(job_id = %id, recruiter = %record.recruiter.id, "job deleted");

        self.notify(Notice::success(record.recruiter.id, DELETED_NOTICE));

        Ok(WorkflowOutcome {
            redirect_to: MY_JOBS_PATH.to_string(),
            message: DELETED_NOTICE.to_string(),
            job: None,
        })
    }

    fn fetch(&self, id: JobId) -> Result<JobRecord, JobBoardError> {
        self.repository
            .fetch_job(id)?
            .ok_or(JobBoardError::NotFound("job"))
    }

    /// Login check, then lookup, then the ownership gate.
    fn fetch_managed(
        &self,
        principal: Option<&Principal>,
        id: JobId,
        operation: &'static str,
    ) -> Result<JobRecord, JobBoardError> {
        if principal.is_none() {
            return Err(self.denied(AccessDenied::Unauthenticated, operation));
        }
        let record = self.fetch(id)?;
        self.gate(require_manager(principal, &record.job), operation)?;
        Ok(record)
    }

    fn gate<'p>(
        &self,
        decision: Result<&'p Principal, AccessDenied>,
        operation: &'static str,
    ) -> Result<&'p Principal, JobBoardError> {
        decision.map_err(|denied| self.denied(denied, operation))
    }

    /// The write is already committed, so a lost notice must not fail the request.
    fn notify(&self, notice: Notice) {
        let recipient = notice.recipient;
        if let Err(err) = self.notifier.notify(notice) {
            warn!(%recipient, error = %err, "success notice dropped");
        }
    }

    fn denied(&self, denied: AccessDenied, operation: &'static str) -> JobBoardError {
        warn!(operation, reason = %denied, "job access denied");
        JobBoardError::Access(denied)
    }
}

/// Error raised by the job workflow.
#[derive(Debug, thiserror::Error)]
pub enum JobBoardError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid page: {0}")]
    Page(#[from] PageError),
    #[error("submitted job form is invalid")]
    Invalid(Box<JobFormContext>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
