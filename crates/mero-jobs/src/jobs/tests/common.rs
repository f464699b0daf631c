use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::jobs::access::Principal;
use crate::jobs::domain::{
    Category, CategoryId, GenderChoice, Job, JobFields, JobId, JobRecord, NewCategory, NewJob,
    NewUser, Recruiter, User, UserId,
};
use crate::jobs::form::JobForm;
use crate::jobs::identity::TokenRegistry;
use crate::jobs::repository::{
    JobRepository, Notice, Notifier, NotifyError, RepositoryError,
};
use crate::jobs::router::job_router;
use crate::jobs::service::JobBoardService;
use crate::jobs::store::{InMemoryJobStore, InMemoryNotifier};

pub(super) const ALPHA_TOKEN: &str = "alpha-token";
pub(super) const BETA_TOKEN: &str = "beta-token";
pub(super) const VISITOR_TOKEN: &str = "visitor-token";

/// Two agencies, one plain visitor and two categories over an in-memory store.
pub(super) struct Board {
    pub(super) service: JobBoardService<InMemoryJobStore, InMemoryNotifier>,
    pub(super) store: Arc<InMemoryJobStore>,
    pub(super) notifier: Arc<InMemoryNotifier>,
    pub(super) alpha: Principal,
    pub(super) beta: Principal,
    pub(super) visitor: Principal,
    pub(super) engineering: Category,
    pub(super) sales: Category,
}

pub(super) fn board() -> Board {
    let store = Arc::new(InMemoryJobStore::default());
    let notifier = Arc::new(InMemoryNotifier::default());

    let alpha = principal(&*store, NewUser::agency("alpha@agency.test"));
    let beta = principal(&*store, NewUser::agency("beta@agency.test"));
    let visitor = principal(&*store, NewUser::visitor("visitor@example.test"));
    let engineering = category(&*store, "Engineering");
    let sales = category(&*store, "Sales");

    Board {
        service: JobBoardService::new(store.clone(), notifier.clone()),
        store,
        notifier,
        alpha,
        beta,
        visitor,
        engineering,
        sales,
    }
}

impl Board {
    pub(super) fn post(&self, owner: &Principal, category: &Category, title: &str) -> Job {
        post_job(&*self.store, owner.id, category.id, title)
    }

    pub(super) fn tokens(&self) -> TokenRegistry {
        let registry = TokenRegistry::default();
        registry.register(ALPHA_TOKEN, self.alpha.clone());
        registry.register(BETA_TOKEN, self.beta.clone());
        registry.register(VISITOR_TOKEN, self.visitor.clone());
        registry
    }

    pub(super) fn router(self) -> (Router, Arc<InMemoryJobStore>, Arc<InMemoryNotifier>) {
        let tokens = Arc::new(self.tokens());
        let store = self.store.clone();
        let notifier = self.notifier.clone();
        (job_router(Arc::new(self.service), tokens), store, notifier)
    }
}

pub(super) fn principal<R: JobRepository>(store: &R, user: NewUser) -> Principal {
    let user: User = store.insert_user(user).expect("user inserted");
    Principal::from(&user)
}

pub(super) fn category<R: JobRepository>(store: &R, name: &str) -> Category {
    store
        .insert_category(NewCategory::named(name))
        .expect("category inserted")
}

pub(super) fn fields(category: CategoryId, title: &str) -> JobFields {
    JobFields {
        title: title.to_string(),
        description: format!("{title} role description"),
        category,
        location: "Kathmandu".to_string(),
        salary: Decimal::new(5_000_000, 2),
        gender: GenderChoice::Both,
        responsibilities: String::new(),
    }
}

pub(super) fn post_job<R: JobRepository>(
    store: &R,
    recruiter: UserId,
    category: CategoryId,
    title: &str,
) -> Job {
    store
        .insert_job(NewJob {
            recruiter,
            fields: fields(category, title),
        })
        .expect("job inserted")
}

/// Detached record for exercising the filter without a store.
pub(super) fn record(id: i64, title: &str, category_name: &str) -> JobRecord {
    let category = Category {
        id: CategoryId(id * 10),
        name: category_name.to_string(),
        description: String::new(),
    };
    JobRecord {
        job: Job::from_fields(JobId(id), UserId(1), fields(category.id, title)),
        category,
        recruiter: Recruiter {
            id: UserId(1),
            email: "alpha@agency.test".to_string(),
        },
    }
}

pub(super) fn form(category: CategoryId, title: &str) -> JobForm {
    JobForm {
        title: Some(title.to_string()),
        description: Some("Build and run the platform".to_string()),
        category: Some(category.to_string()),
        location: Some("Pokhara".to_string()),
        salary: Some("85000".to_string()),
        gender: Some("F".to_string()),
        responsibilities: Some("On-call rotation".to_string()),
    }
}

pub(super) fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, token, None)
}

pub(super) fn post_form(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    request(Method::POST, uri, token, Some(body.to_string()))
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            Body::from(body)
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub(super) async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
}

/// Store whose every call fails, for error-path coverage.
#[derive(Default)]
pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl JobRepository for UnavailableRepository {
    fn insert_user(&self, _user: NewUser) -> Result<User, RepositoryError> {
        offline()
    }

    fn fetch_user(&self, _id: UserId) -> Result<Option<User>, RepositoryError> {
        offline()
    }

    fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, RepositoryError> {
        offline()
    }

    fn delete_user(&self, _id: UserId) -> Result<(), RepositoryError> {
        offline()
    }

    fn insert_category(&self, _category: NewCategory) -> Result<Category, RepositoryError> {
        offline()
    }

    fn update_category(&self, _category: Category) -> Result<(), RepositoryError> {
        offline()
    }

    fn delete_category(&self, _id: CategoryId) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_category(&self, _id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        offline()
    }

    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        offline()
    }

    fn insert_job(&self, _job: NewJob) -> Result<Job, RepositoryError> {
        offline()
    }

    fn update_job(&self, _job: Job) -> Result<(), RepositoryError> {
        offline()
    }

    fn delete_job(&self, _id: JobId) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_job(&self, _id: JobId) -> Result<Option<JobRecord>, RepositoryError> {
        offline()
    }

    fn jobs(&self) -> Result<Vec<JobRecord>, RepositoryError> {
        offline()
    }

    fn jobs_by_recruiter(&self, _recruiter: UserId) -> Result<Vec<JobRecord>, RepositoryError> {
        offline()
    }
}

#[derive(Default)]
pub(super) struct DroppingNotifier;

impl Notifier for DroppingNotifier {
    fn notify(&self, _notice: Notice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("message queue closed".to_string()))
    }
}
