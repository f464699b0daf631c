use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::admin::{admin_router, AdminService};
use crate::jobs::{
    Category, GenderChoice, InMemoryJobStore, Job, JobFields, JobRepository, NewCategory, NewJob,
    NewUser, Principal, TokenRegistry,
};

pub(super) const ROOT_TOKEN: &str = "root-token";
pub(super) const STAFF_AGENCY_TOKEN: &str = "staff-agency-token";
pub(super) const AGENCY_TOKEN: &str = "agency-token";

/// Admin fixture: a superuser, a staff agency, a plain agency and a few postings.
pub(super) struct Backoffice {
    pub(super) service: AdminService<InMemoryJobStore>,
    pub(super) store: Arc<InMemoryJobStore>,
    pub(super) root: Principal,
    pub(super) staff_agency: Principal,
    pub(super) agency: Principal,
    pub(super) engineering: Category,
    pub(super) sales: Category,
}

pub(super) fn backoffice() -> Backoffice {
    let store = Arc::new(InMemoryJobStore::default());

    let root = insert(&store, NewUser::superuser("root@example.test"));
    let staff_agency = insert(
        &store,
        NewUser {
            is_staff: true,
            ..NewUser::agency("staff@agency.test")
        },
    );
    let agency = insert(&store, NewUser::agency("other@agency.test"));
    let engineering = store
        .insert_category(NewCategory::named("Engineering"))
        .expect("category");
    let sales = store
        .insert_category(NewCategory::named("Sales"))
        .expect("category");

    Backoffice {
        service: AdminService::new(store.clone()),
        store,
        root,
        staff_agency,
        agency,
        engineering,
        sales,
    }
}

fn insert(store: &InMemoryJobStore, user: NewUser) -> Principal {
    Principal::from(&store.insert_user(user).expect("user"))
}

impl Backoffice {
    pub(super) fn post(
        &self,
        owner: &Principal,
        category: &Category,
        title: &str,
        location: &str,
        gender: GenderChoice,
    ) -> Job {
        self.store
            .insert_job(NewJob {
                recruiter: owner.id,
                fields: JobFields {
                    title: title.to_string(),
                    description: format!("{title} duties"),
                    category: category.id,
                    location: location.to_string(),
                    salary: Decimal::new(4_200_000, 2),
                    gender,
                    responsibilities: String::new(),
                },
            })
            .expect("job")
    }

    pub(super) fn router(self) -> (Router, Arc<InMemoryJobStore>) {
        let tokens = TokenRegistry::default();
        tokens.register(ROOT_TOKEN, self.root.clone());
        tokens.register(STAFF_AGENCY_TOKEN, self.staff_agency.clone());
        tokens.register(AGENCY_TOKEN, self.agency.clone());
        let store = self.store.clone();
        (
            admin_router(Arc::new(self.service), Arc::new(tokens)),
            store,
        )
    }
}

pub(super) fn request(method: Method, uri: &str, token: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(form.to_string()))
        .expect("request builds")
}

pub(super) async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
