use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::jobs::domain::{
    Category, CategoryId, Job, JobId, JobRecord, NewCategory, NewJob, NewUser, Recruiter, User,
    UserId,
};
use crate::jobs::query::newest_first;
use crate::jobs::repository::{JobRepository, Notice, Notifier, NotifyError, RepositoryError};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    jobs: BTreeMap<JobId, Job>,
    next_user: i64,
    next_category: i64,
    next_job: i64,
}

impl Tables {
    fn allocate(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn record(&self, job: &Job) -> Result<JobRecord, RepositoryError> {
        let category = self
            .categories
            .get(&job.category)
            .cloned()
            .ok_or_else(|| dangling("category", job.id))?;
        let recruiter = self
            .users
            .get(&job.recruiter)
            .map(|user| Recruiter {
                id: user.id,
                email: user.email.clone(),
            })
            .ok_or_else(|| dangling("recruiter", job.id))?;

        Ok(JobRecord {
            job: job.clone(),
            category,
            recruiter,
        })
    }

    fn records<'a>(
        &self,
        jobs: impl Iterator<Item = &'a Job>,
    ) -> Result<Vec<JobRecord>, RepositoryError> {
        let mut records = jobs
            .map(|job| self.record(job))
            .collect::<Result<Vec<_>, _>>()?;
        newest_first(&mut records);
        Ok(records)
    }

    fn check_references(
        &self,
        recruiter: UserId,
        category: CategoryId,
    ) -> Result<(), RepositoryError> {
        if !self.users.contains_key(&recruiter) {
            return Err(RepositoryError::Integrity(format!(
                "recruiter {recruiter} does not exist"
            )));
        }
        if !self.categories.contains_key(&category) {
            return Err(RepositoryError::Integrity(format!(
                "category {category} does not exist"
            )));
        }
        Ok(())
    }

    fn name_taken(&self, name: &str, except: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|category| category.name == name && Some(category.id) != except)
    }
}

fn dangling(reference: &str, job: JobId) -> RepositoryError {
    RepositoryError::Unavailable(format!("job {job} references a missing {reference}"))
}

fn duplicate_name(name: &str) -> RepositoryError {
    RepositoryError::Integrity(format!("category name '{name}' already exists"))
}

/// Process-local store with the same cascade and uniqueness rules as the SQLite schema.
#[derive(Debug, Default, Clone)]
pub struct InMemoryJobStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryJobStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl JobRepository for InMemoryJobStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.lock()?;
        let id = UserId(Tables::allocate(&mut tables.next_user));
        let user = User {
            id,
            email: user.email,
            is_agency: user.is_agency,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables.users.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables.jobs.retain(|_, job| job.recruiter != id);
        Ok(())
    }

    fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.name_taken(&category.name, None) {
            return Err(duplicate_name(&category.name));
        }
        let id = CategoryId(Tables::allocate(&mut tables.next_category));
        let category = Category {
            id,
            name: category.name,
            description: category.description,
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    fn update_category(&self, category: Category) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.categories.contains_key(&category.id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.name_taken(&category.name, Some(category.id)) {
            return Err(duplicate_name(&category.name));
        }
        tables.categories.insert(category.id, category);
        Ok(())
    }

    fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables.categories.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables.jobs.retain(|_, job| job.category != id);
        Ok(())
    }

    fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.lock()?.categories.get(&id).cloned())
    }

    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.lock()?.categories.values().cloned().collect())
    }

    fn insert_job(&self, job: NewJob) -> Result<Job, RepositoryError> {
        let mut tables = self.lock()?;
        tables.check_references(job.recruiter, job.fields.category)?;
        let id = JobId(Tables::allocate(&mut tables.next_job));
        let job = Job::from_fields(id, job.recruiter, job.fields);
        tables.jobs.insert(id, job.clone());
        Ok(job)
    }

    fn update_job(&self, job: Job) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.jobs.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.check_references(job.recruiter, job.category)?;
        tables.jobs.insert(job.id, job);
        Ok(())
    }

    fn delete_job(&self, id: JobId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        tables
            .jobs
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn fetch_job(&self, id: JobId) -> Result<Option<JobRecord>, RepositoryError> {
        let tables = self.lock()?;
        tables.jobs.get(&id).map(|job| tables.record(job)).transpose()
    }

    fn jobs(&self) -> Result<Vec<JobRecord>, RepositoryError> {
        let tables = self.lock()?;
        tables.records(tables.jobs.values())
    }

    fn jobs_by_recruiter(&self, recruiter: UserId) -> Result<Vec<JobRecord>, RepositoryError> {
        let tables = self.lock()?;
        tables.records(tables.jobs.values().filter(|job| job.recruiter == recruiter))
    }
}

/// Notifier that keeps every notice in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl InMemoryNotifier {
    /// Remove and return the notices queued for `recipient`.
    pub fn take_for(&self, recipient: UserId) -> Vec<Notice> {
        let Ok(mut guard) = self.notices.lock() else {
            return Vec::new();
        };
        let (taken, kept): (Vec<Notice>, Vec<Notice>) = guard
            .drain(..)
            .partition(|notice| notice.recipient == recipient);
        *guard = kept;
        taken
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(&self, notice: Notice) -> Result<(), NotifyError> {
        let mut guard = self
            .notices
            .lock()
            .map_err(|_| NotifyError::Transport("notice mutex poisoned".to_string()))?;
        guard.push(notice);
        Ok(())
    }
}
