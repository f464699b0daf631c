//! End-to-end scenarios for the job board, driven through the public service facade and the HTTP
//! routers against both store implementations.

mod common {
    use std::sync::Arc;

    use mero_jobs::admin::AdminService;
    use mero_jobs::jobs::{
        Category, InMemoryNotifier, JobBoardService, JobRepository, NewCategory, NewUser,
        Principal, TokenRegistry,
    };

    pub(super) struct World<R> {
        pub(super) store: Arc<R>,
        pub(super) notifier: Arc<InMemoryNotifier>,
        pub(super) service: Arc<JobBoardService<R, InMemoryNotifier>>,
        pub(super) admin: Arc<AdminService<R>>,
        pub(super) tokens: Arc<TokenRegistry>,
        pub(super) alpha: Principal,
        pub(super) beta: Principal,
        pub(super) seeker: Principal,
        pub(super) root: Principal,
        pub(super) engineering: Category,
        pub(super) hospitality: Category,
    }

    pub(super) fn world<R: JobRepository + 'static>(store: R) -> World<R> {
        let store = Arc::new(store);
        let notifier = Arc::new(InMemoryNotifier::default());

        let user = |new: NewUser| Principal::from(&store.insert_user(new).expect("user"));
        let alpha = user(NewUser::agency("alpha@agency.test"));
        let beta = user(NewUser::agency("beta@agency.test"));
        let seeker = user(NewUser::visitor("seeker@example.test"));
        let root = user(NewUser::superuser("root@example.test"));
        let engineering = store
            .insert_category(NewCategory::named("Engineering"))
            .expect("category");
        let hospitality = store
            .insert_category(NewCategory::named("Hospitality"))
            .expect("category");

        let tokens = Arc::new(TokenRegistry::default());
        tokens.register("alpha", alpha.clone());
        tokens.register("beta", beta.clone());
        tokens.register("seeker", seeker.clone());
        tokens.register("root", root.clone());

        World {
            service: Arc::new(JobBoardService::new(store.clone(), notifier.clone())),
            admin: Arc::new(AdminService::new(store.clone())),
            store,
            notifier,
            tokens,
            alpha,
            beta,
            seeker,
            root,
            engineering,
            hospitality,
        }
    }
}

mod service {
    use super::common::*;

    use mero_jobs::admin::AdminJobQuery;
    use mero_jobs::jobs::{
        AccessDenied, GenderChoice, InMemoryJobStore, JobBoardError, JobForm, JobQuery,
        JobRepository, SqliteJobStore,
    };

    fn posting(category: &str, title: &str) -> JobForm {
        JobForm {
            title: Some(title.to_string()),
            description: Some(format!("{title} wanted")),
            category: Some(category.to_string()),
            location: Some("Kathmandu".to_string()),
            salary: Some("75000.5".to_string()),
            gender: None,
            responsibilities: None,
        }
    }

    fn lifecycle<R: JobRepository + 'static>(world: World<R>) {
        let engineering = world.engineering.id.to_string();
        let hospitality = world.hospitality.id.to_string();

        for n in 1..=12 {
            world
                .service
                .create(Some(&world.alpha), posting(&engineering, &format!("Engineer {n}")))
                .expect("alpha posts");
        }
        for n in 1..=3 {
            world
                .service
                .create(Some(&world.beta), posting(&hospitality, &format!("Chef {n}")))
                .expect("beta posts");
        }

        let first = world.service.list(&JobQuery::default()).expect("listing");
        assert_eq!(first.page.total_items, 15);
        assert_eq!(first.page.items.len(), 10);
        assert_eq!(first.page.items[0].title, "Chef 3");
        assert_eq!(first.page.items[0].gender, GenderChoice::Both);
        assert_eq!(first.page.items[0].salary.to_string(), "75000.50");

        let last = world
            .service
            .list(&JobQuery::default().with_page("last"))
            .expect("last page");
        assert_eq!(last.page.number, 2);
        assert_eq!(last.page.items.len(), 5);

        let engineers = world
            .service
            .list(&JobQuery::search("ENGINEER"))
            .expect("search");
        assert_eq!(engineers.page.total_items, 12);

        let chefs = world
            .service
            .list(&JobQuery::default().with_category(hospitality.clone()))
            .expect("filter");
        assert_eq!(chefs.page.total_items, 3);

        let mine = world
            .service
            .my_jobs(Some(&world.beta), None)
            .expect("beta jobs");
        assert_eq!(mine.total_items, 3);

        let target = chefs.page.items[0].id;
        let err = world
            .service
            .delete(Some(&world.alpha), target)
            .expect_err("alpha does not own chef postings");
        assert!(matches!(err, JobBoardError::Access(AccessDenied::Forbidden)));

        let err = world
            .service
            .my_jobs(Some(&world.seeker), None)
            .expect_err("seeker is not an agency");
        assert!(matches!(err, JobBoardError::Access(AccessDenied::Forbidden)));

        world
            .service
            .delete(Some(&world.beta), target)
            .expect("owner deletes");
        assert_eq!(world.notifier.take_for(world.beta.id).len(), 4);

        let scoped = world
            .admin
            .job_list(Some(&world.root), &AdminJobQuery::default())
            .expect("admin list");
        assert_eq!(scoped.total_items, 14);

        world
            .admin
            .delete_user(Some(&world.root), world.alpha.id)
            .expect("cascade through user");
        assert_eq!(world.store.jobs().expect("jobs").len(), 2);

        world
            .admin
            .delete_category(Some(&world.root), world.hospitality.id)
            .expect("cascade through category");
        assert!(world.store.jobs().expect("jobs").is_empty());
    }

    #[test]
    fn lifecycle_in_memory() {
        lifecycle(world(InMemoryJobStore::default()));
    }

    #[test]
    fn lifecycle_on_sqlite() {
        lifecycle(world(SqliteJobStore::open_in_memory().expect("sqlite opens")));
    }
}

mod routing {
    use super::common::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use mero_jobs::admin::admin_router;
    use mero_jobs::jobs::{job_router, InMemoryJobStore, JobRepository};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(world: &World<InMemoryJobStore>) -> Router {
        job_router(world.service.clone(), world.tokens.clone())
            .merge(admin_router(world.admin.clone(), world.tokens.clone()))
    }

    fn form_post(uri: &str, token: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request")
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn recruiter_posts_edits_and_removes_over_http() {
        let world = world(InMemoryJobStore::default());
        let router = app(&world);
        let category = world.engineering.id;

        let created = router
            .clone()
            .oneshot(form_post(
                "/jobs/create/",
                "alpha",
                format!("title=Rustacean&description=Ship+it&category={category}&salary=5000"),
            ))
            .await
            .expect("response");
        assert_eq!(created.status(), StatusCode::SEE_OTHER);
        let id = json(created).await["job"]["id"].as_i64().expect("id");

        let hijack = router
            .clone()
            .oneshot(form_post(
                &format!("/jobs/{id}/update/"),
                "beta",
                format!("title=Mine&description=x&category={category}&salary=1"),
            ))
            .await
            .expect("response");
        assert_eq!(hijack.status(), StatusCode::FORBIDDEN);

        let edited = router
            .clone()
            .oneshot(form_post(
                &format!("/jobs/{id}/update/"),
                "alpha",
                format!("title=Senior+Rustacean&description=Ship+it&category={category}&salary=6000"),
            ))
            .await
            .expect("response");
        assert_eq!(edited.status(), StatusCode::SEE_OTHER);

        let detail = router
            .clone()
            .oneshot(
                Request::get(format!("/jobs/{id}/"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = json(detail).await;
        assert_eq!(body["job"]["title"], "Senior Rustacean");
        assert_eq!(body["job"]["recruiter_email"], "alpha@agency.test");

        let removed = router
            .clone()
            .oneshot(form_post(&format!("/jobs/{id}/delete/"), "alpha", String::new()))
            .await
            .expect("response");
        assert_eq!(removed.status(), StatusCode::SEE_OTHER);
        assert!(world.store.jobs().expect("jobs").is_empty());

        let admin = router
            .oneshot(
                Request::get("/admin/jobs/")
                    .header(header::AUTHORIZATION, "Bearer seeker")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(admin.status(), StatusCode::FORBIDDEN);
    }
}
