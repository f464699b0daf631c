use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::jobs::access::{
    admin_scoped, admin_visible, require_staff, require_superuser, AccessDenied, Principal,
};
use crate::jobs::domain::{
    Category, CategoryId, GenderChoice, JobId, JobRecord, NewCategory, UserId,
};
use crate::jobs::form::FieldErrors;
use crate::jobs::query::{contains_case_insensitive, paginate, Page, PageError, PAGE_SIZE};
use crate::jobs::repository::{JobRepository, RepositoryError};

pub const ADMIN_JOBS_PATH: &str = "/admin/jobs/";
pub const ADMIN_CATEGORIES_PATH: &str = "/admin/categories/";
pub const ADMIN_USERS_PATH: &str = "/admin/users/";

pub const CATEGORY_NAME_MAX_CHARS: usize = 100;
pub const DUPLICATE_CATEGORY_NAME: &str = "Category with this Category Name already exists.";

/// Filters accepted by the admin posting list. `category`, `gender` and `location` are exact
/// matches; `search` is split on whitespace and every term must hit one of the searched fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminJobQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl AdminJobQuery {
    fn matches(&self, record: &JobRecord) -> bool {
        if let Some(category) = non_empty(self.category.as_deref()) {
            if category.parse::<i64>().ok() != Some(record.category.id.0) {
                return false;
            }
        }
        if let Some(gender) = non_empty(self.gender.as_deref()) {
            if GenderChoice::from_code(gender) != Some(record.job.gender) {
                return false;
            }
        }
        if let Some(location) = non_empty(self.location.as_deref()) {
            if record.job.location != location {
                return false;
            }
        }

        let Some(search) = non_empty(self.search.as_deref()) else {
            return true;
        };
        let fields = [
            record.job.title.as_str(),
            record.job.description.as_str(),
            record.job.location.as_str(),
            record.recruiter.email.as_str(),
        ];
        search.split_whitespace().all(|term| {
            let term = term.to_lowercase();
            fields
                .iter()
                .any(|field| contains_case_insensitive(field, &term))
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// One row of the admin posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminJobRow {
    pub id: JobId,
    pub display: String,
    pub title: String,
    pub category: String,
    pub location: String,
    pub salary: Decimal,
    pub gender_display: &'static str,
    pub recruiter_email: String,
}

impl From<&JobRecord> for AdminJobRow {
    fn from(record: &JobRecord) -> Self {
        Self {
            id: record.job.id,
            display: record.to_string(),
            title: record.job.title.clone(),
            category: record.category.name.clone(),
            location: record.job.location.clone(),
            salary: record.job.salary,
            gender_display: record.job.gender.label(),
            recruiter_email: record.recruiter.email.clone(),
        }
    }
}

/// Read-only posting summary shown under a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineJob {
    pub id: JobId,
    pub title: String,
    pub location: String,
    pub salary: Decimal,
    pub gender: GenderChoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDetail {
    pub category: Category,
    pub jobs: Vec<InlineJob>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryForm {
    fn clean(&self) -> Result<NewCategory, FieldErrors> {
        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(FieldErrors::single("name", "This field is required."));
        }
        let count = name.chars().count();
        if count > CATEGORY_NAME_MAX_CHARS {
            return Err(FieldErrors::single(
                "name",
                format!(
                    "Ensure this value has at most {CATEGORY_NAME_MAX_CHARS} characters \
                     (it has {count})."
                ),
            ));
        }

        Ok(NewCategory {
            name: name.to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOutcome {
    pub redirect_to: String,
    pub message: String,
}

impl AdminOutcome {
    fn new(redirect_to: &str, message: String) -> Self {
        Self {
            redirect_to: redirect_to.to_string(),
            message,
        }
    }
}

/// Staff-facing management of postings, categories and users.
pub struct AdminService<R> {
    repository: Arc<R>,
}

impl<R> AdminService<R>
where
    R: JobRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn job_list(
        &self,
        principal: Option<&Principal>,
        query: &AdminJobQuery,
    ) -> Result<Page<AdminJobRow>, AdminError> {
        let principal = gate(require_staff(principal), "job_list")?;
        let rows: Vec<AdminJobRow> = self
            .repository
            .jobs()?
            .iter()
            .filter(|record| admin_visible(principal, &record.job))
            .filter(|record| query.matches(record))
            .map(AdminJobRow::from)
            .collect();
        Ok(paginate(rows, query.page.as_deref(), PAGE_SIZE)?)
    }

    /// Out-of-scope postings are reported as missing.
    pub fn delete_job(
        &self,
        principal: Option<&Principal>,
        id: JobId,
    ) -> Result<AdminOutcome, AdminError> {
        let principal = gate(require_staff(principal), "delete_job")?;
        let record = self
            .repository
            .fetch_job(id)?
            .filter(|record| admin_visible(principal, &record.job))
            .ok_or(AdminError::NotFound("job"))?;

        self.repository.delete_job(id)?;
        info!(job_id = %id, admin = %principal.id, "job deleted from admin");
        Ok(AdminOutcome::new(
            ADMIN_JOBS_PATH,
            format!("The job \u{201c}{record}\u{201d} was deleted successfully."),
        ))
    }

    /// Categories ordered by name, optionally narrowed by a name search.
    pub fn category_list(
        &self,
        principal: Option<&Principal>,
        search: Option<&str>,
    ) -> Result<Vec<Category>, AdminError> {
        gate(require_staff(principal), "category_list")?;
        let terms: Vec<String> = non_empty(search)
            .map(|search| search.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();

        let mut categories: Vec<Category> = self
            .repository
            .categories()?
            .into_iter()
            .filter(|category| {
                terms
                    .iter()
                    .all(|term| contains_case_insensitive(&category.name, term))
            })
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    pub fn category_detail(
        &self,
        principal: Option<&Principal>,
        id: CategoryId,
    ) -> Result<CategoryDetail, AdminError> {
        let principal = gate(require_staff(principal), "category_detail")?;
        let category = self.category(id)?;
        let jobs = self
            .repository
            .jobs()?
            .into_iter()
            .filter(|record| record.category.id == id)
            .filter(|record| admin_visible(principal, &record.job))
            .map(|record| InlineJob {
                id: record.job.id,
                title: record.job.title,
                location: record.job.location,
                salary: record.job.salary,
                gender: record.job.gender,
            })
            .collect();

        Ok(CategoryDetail { category, jobs })
    }

    pub fn create_category(
        &self,
        principal: Option<&Principal>,
        form: &CategoryForm,
    ) -> Result<Category, AdminError> {
        let principal = gate(require_superuser(principal), "create_category")?;
        let new = form.clean().map_err(AdminError::Invalid)?;
        self.ensure_unique(&new.name, None)?;

        let category = self
            .repository
            .insert_category(new)
            .map_err(name_clash)?;
        info!(category_id = %category.id, admin = %principal.id, "category created");
        Ok(category)
    }

    pub fn update_category(
        &self,
        principal: Option<&Principal>,
        id: CategoryId,
        form: &CategoryForm,
    ) -> Result<Category, AdminError> {
        let principal = gate(require_superuser(principal), "update_category")?;
        self.category(id)?;
        let new = form.clean().map_err(AdminError::Invalid)?;
        self.ensure_unique(&new.name, Some(id))?;

        let category = Category {
            id,
            name: new.name,
            description: new.description,
        };
        self.repository
            .update_category(category.clone())
            .map_err(name_clash)?;
        info!(category_id = %id, admin = %principal.id, "category updated");
        Ok(category)
    }

    /// Removes the category together with every posting filed under it.
    pub fn delete_category(
        &self,
        principal: Option<&Principal>,
        id: CategoryId,
    ) -> Result<AdminOutcome, AdminError> {
        let principal = gate(require_superuser(principal), "delete_category")?;
        let category = self.category(id)?;
        self.repository.delete_category(id)?;
        info!(category_id = %id, admin = %principal.id, "category deleted");
        Ok(AdminOutcome::new(
            ADMIN_CATEGORIES_PATH,
            format!("The category \u{201c}{category}\u{201d} was deleted successfully."),
        ))
    }

    /// Removes the user together with every posting they recruit for.
    pub fn delete_user(
        &self,
        principal: Option<&Principal>,
        id: UserId,
    ) -> Result<AdminOutcome, AdminError> {
        let principal = gate(require_superuser(principal), "delete_user")?;
        let user = self
            .repository
            .fetch_user(id)?
            .ok_or(AdminError::NotFound("user"))?;
        self.repository.delete_user(id)?;
        info!(user_id = %id, admin = %principal.id, "user deleted");
        Ok(AdminOutcome::new(
            ADMIN_USERS_PATH,
            format!("The user \u{201c}{}\u{201d} was deleted successfully.", user.email),
        ))
    }

    /// Whether listings for `principal` are narrowed to their own postings.
    pub fn is_scoped(&self, principal: &Principal) -> bool {
        admin_scoped(principal)
    }

    fn category(&self, id: CategoryId) -> Result<Category, AdminError> {
        self.repository
            .fetch_category(id)?
            .ok_or(AdminError::NotFound("category"))
    }

    fn ensure_unique(&self, name: &str, except: Option<CategoryId>) -> Result<(), AdminError> {
        let taken = self
            .repository
            .categories()?
            .iter()
            .any(|category| category.name == name && Some(category.id) != except);
        if taken {
            return Err(AdminError::Invalid(FieldErrors::single(
                "name",
                DUPLICATE_CATEGORY_NAME,
            )));
        }
        Ok(())
    }
}

fn gate<'p>(
    decision: Result<&'p Principal, AccessDenied>,
    operation: &'static str,
) -> Result<&'p Principal, AdminError> {
    decision.map_err(|denied| {
        warn!(operation, reason = %denied, "admin access denied");
        AdminError::Access(denied)
    })
}

/// A uniqueness violation reported by the store surfaces on the `name` field.
fn name_clash(err: RepositoryError) -> AdminError {
    match err {
        RepositoryError::Integrity(_) => {
            AdminError::Invalid(FieldErrors::single("name", DUPLICATE_CATEGORY_NAME))
        }
        other => AdminError::Repository(other),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid page: {0}")]
    Page(#[from] PageError),
    #[error("submitted form is invalid")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
