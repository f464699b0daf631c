use metrics_exporter_prometheus::PrometheusHandle;
use mero_jobs::jobs::{
    GenderChoice, JobFields, JobRepository, NewCategory, NewJob, NewUser, Principal,
    RepositoryError, TokenRegistry,
};
use rust_decimal::Decimal;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Sample principal together with the bearer token that resolves to it.
#[derive(Debug, Clone)]
pub(crate) struct DemoAccount {
    pub(crate) token: &'static str,
    pub(crate) principal: Principal,
}

const DEMO_USERS: [(&str, &str, bool, bool, bool); 4] = [
    ("agency-alpha", "hiring@alpha-agency.test", true, false, false),
    ("agency-beta", "talent@beta-agency.test", true, true, false),
    ("visitor", "seeker@example.test", false, false, false),
    ("admin", "admin@mero-jobs.test", false, true, true),
];

const DEMO_CATEGORIES: [(&str, &str); 4] = [
    ("Engineering", "Software, infrastructure and data roles"),
    ("Sales", "Account management and business development"),
    ("Hospitality", "Hotels, restaurants and travel"),
    ("Healthcare", "Clinical and care positions"),
];

/// (owner index, category index, title, location, monthly salary, gender)
const DEMO_JOBS: [(usize, usize, &str, &str, i64, GenderChoice); 12] = [
    (0, 0, "Senior Engineer", "Kathmandu", 180_000, GenderChoice::Both),
    (0, 0, "Data Analyst", "Lalitpur", 95_000, GenderChoice::Both),
    (1, 0, "DevOps Engineer", "Remote", 150_000, GenderChoice::Both),
    (1, 1, "Account Executive", "Pokhara", 70_000, GenderChoice::Female),
    (0, 1, "Sales Lead", "Kathmandu", 110_000, GenderChoice::Both),
    (1, 2, "Front Desk Officer", "Pokhara", 40_000, GenderChoice::Female),
    (0, 2, "Chef de Partie", "Bhaktapur", 60_000, GenderChoice::Male),
    (1, 3, "Staff Nurse", "Biratnagar", 65_000, GenderChoice::Female),
    (0, 3, "Lab Technician", "Kathmandu", 55_000, GenderChoice::Both),
    (1, 0, "QA Engineer", "Lalitpur", 90_000, GenderChoice::Both),
    (0, 1, "Field Sales Officer", "Butwal", 45_000, GenderChoice::Male),
    (1, 2, "Tour Coordinator", "Pokhara", 50_000, GenderChoice::Both),
];

/// Populate `store` with a small, realistic board. Returns the accounts in seeding order.
/// Accounts, categories and postings that already exist are reused, so restarting against a
/// persisted database seeds nothing twice.
pub(crate) fn seed_demo<R: JobRepository>(store: &R) -> Result<Vec<DemoAccount>, RepositoryError> {
    let mut accounts = Vec::with_capacity(DEMO_USERS.len());
    for (token, email, is_agency, is_staff, is_superuser) in DEMO_USERS {
        let user = match store.find_user_by_email(email)? {
            Some(user) => user,
            None => store.insert_user(NewUser {
                email: email.to_string(),
                is_agency,
                is_staff,
                is_superuser,
            })?,
        };
        accounts.push(DemoAccount {
            token,
            principal: Principal::from(&user),
        });
    }

    let existing = store.categories()?;
    let mut categories = Vec::with_capacity(DEMO_CATEGORIES.len());
    for (name, description) in DEMO_CATEGORIES {
        let category = match existing.iter().find(|category| category.name == name) {
            Some(category) => category.clone(),
            None => store.insert_category(NewCategory {
                name: name.to_string(),
                description: description.to_string(),
            })?,
        };
        categories.push(category);
    }

    let posted = store.jobs()?;
    for (owner, category, title, location, salary, gender) in DEMO_JOBS {
        let recruiter = accounts[owner].principal.id;
        let category = categories[category].id;
        let already_posted = posted.iter().any(|record| {
            record.recruiter.id == recruiter
                && record.category.id == category
                && record.job.title == title
        });
        if already_posted {
            continue;
        }
        store.insert_job(NewJob {
            recruiter,
            fields: JobFields {
                title: title.to_string(),
                description: format!("{title} position based in {location}."),
                category,
                location: location.to_string(),
                salary: Decimal::new(salary * 100, 2),
                gender,
                responsibilities: String::new(),
            },
        })?;
    }

    Ok(accounts)
}

/// Demo accounts already present in `store`, for restarts that do not seed.
pub(crate) fn existing_demo_accounts<R: JobRepository>(
    store: &R,
) -> Result<Vec<DemoAccount>, RepositoryError> {
    let mut accounts = Vec::new();
    for (token, email, ..) in DEMO_USERS {
        if let Some(user) = store.find_user_by_email(email)? {
            accounts.push(DemoAccount {
                token,
                principal: Principal::from(&user),
            });
        }
    }
    Ok(accounts)
}

pub(crate) fn register_accounts(registry: &TokenRegistry, accounts: &[DemoAccount]) {
    for account in accounts {
        registry.register(account.token, account.principal.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mero_jobs::jobs::{IdentityProvider, InMemoryJobStore, SqliteJobStore};

    #[test]
    fn seeds_both_store_kinds_identically() {
        let memory = InMemoryJobStore::default();
        let sqlite = SqliteJobStore::open_in_memory().expect("sqlite opens");

        let from_memory = seed_demo(&memory).expect("memory seeded");
        let from_sqlite = seed_demo(&sqlite).expect("sqlite seeded");

        assert_eq!(from_memory.len(), 4);
        assert_eq!(from_sqlite.len(), 4);
        assert_eq!(memory.jobs().expect("jobs").len(), DEMO_JOBS.len());
        assert_eq!(
            memory.jobs().expect("jobs"),
            sqlite.jobs().expect("jobs")
        );
    }

    #[test]
    fn reseeding_a_persisted_board_reuses_existing_rows() {
        let path = std::env::temp_dir().join(format!(
            "mero-jobs-api-reseed-{}.sqlite3",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let first = {
            let store = SqliteJobStore::open(&path).expect("sqlite opens");
            seed_demo(&store).expect("first seeding")
        };

        let store = SqliteJobStore::open(&path).expect("sqlite reopens");
        let second = seed_demo(&store).expect("restart seeding");
        assert_eq!(
            first.iter().map(|account| account.principal.id).collect::<Vec<_>>(),
            second.iter().map(|account| account.principal.id).collect::<Vec<_>>()
        );
        assert_eq!(store.categories().expect("categories").len(), DEMO_CATEGORIES.len());
        assert_eq!(store.jobs().expect("jobs").len(), DEMO_JOBS.len());

        let registry = TokenRegistry::default();
        register_accounts(&registry, &second);
        assert!(registry.resolve("agency-alpha").is_some_and(|alpha| alpha.is_agency));

        drop(store);
        let store = SqliteJobStore::open(&path).expect("sqlite reopens");
        let known = existing_demo_accounts(&store).expect("lookup");
        assert_eq!(known.len(), DEMO_USERS.len());
        assert_eq!(known[3].token, "admin");
        assert!(known[3].principal.is_superuser);

        drop(store);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unseeded_store_has_no_demo_accounts() {
        let store = InMemoryJobStore::default();
        assert!(existing_demo_accounts(&store).expect("lookup").is_empty());
    }

    #[test]
    fn registered_tokens_resolve() {
        let store = InMemoryJobStore::default();
        let accounts = seed_demo(&store).expect("seeded");
        let registry = TokenRegistry::default();
        register_accounts(&registry, &accounts);

        let admin = registry.resolve("admin").expect("admin token");
        assert!(admin.is_superuser);
        let alpha = registry.resolve("agency-alpha").expect("agency token");
        assert!(alpha.is_agency);
        assert!(registry.resolve("nobody").is_none());
    }
}
