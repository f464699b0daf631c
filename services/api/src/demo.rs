use crate::infra::seed_demo;
use clap::Args;
use mero_jobs::error::AppError;
use mero_jobs::jobs::{
    InMemoryJobStore, InMemoryNotifier, JobBoardService, JobListing, JobQuery, JobRepository,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Search term for the search portion of the demo.
    #[arg(long, default_value = "engineer")]
    pub(crate) search: String,
    /// Category name to filter by (defaults to the first seeded category).
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Page of the unfiltered listing to print.
    #[arg(long)]
    pub(crate) page: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        search,
        category,
        page,
    } = args;

    let store = Arc::new(InMemoryJobStore::default());
    let accounts = seed_demo(store.as_ref())?;
    let service = JobBoardService::new(store.clone(), Arc::new(InMemoryNotifier::default()));

    println!("Mero Jobs demo");
    println!(
        "- Seeded {} accounts, {} categories, {} postings",
        accounts.len(),
        store.categories()?.len(),
        store.jobs()?.len()
    );

    let mut listing_query = JobQuery::default();
    listing_query.page = page;
    let listing = service.list(&listing_query)?;
    render_listing("Latest postings", &listing);

    let listing = service.list(&JobQuery::search(search.clone()))?;
    render_listing(&format!("Search \"{search}\""), &listing);

    let categories = store.categories()?;
    let selected = match category {
        Some(name) => categories
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(&name)),
        None => categories.first(),
    };
    match selected {
        Some(category) => {
            let query = JobQuery::default().with_category(category.id.to_string());
            let listing = service.list(&query)?;
            render_listing(&format!("Category {}", category.name), &listing);
        }
        None => println!("\nNo matching category to filter by"),
    }

    Ok(())
}

fn render_listing(heading: &str, listing: &JobListing) {
    let page = &listing.page;
    println!(
        "\n{heading} (page {} of {}, {} matching)",
        page.number, page.num_pages, page.total_items
    );
    if page.items.is_empty() {
        println!("  No jobs found.");
        return;
    }
    for job in &page.items {
        println!(
            "  - #{} {} | {} | {} | {} | {} | {}",
            job.id,
            job.title,
            job.category_name,
            if job.location.is_empty() {
                "Location not specified"
            } else {
                job.location.as_str()
            },
            job.salary,
            job.gender_display,
            job.recruiter_email
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_with_defaults_and_unknown_category() {
        run_demo(DemoArgs {
            search: "engineer".to_string(),
            category: None,
            page: None,
        })
        .expect("demo runs");

        run_demo(DemoArgs {
            search: "nurse".to_string(),
            category: Some("Astronomy".to_string()),
            page: Some("2".to_string()),
        })
        .expect("demo tolerates an unknown category");
    }

    #[test]
    fn demo_reports_an_out_of_range_page() {
        let err = run_demo(DemoArgs {
            search: "engineer".to_string(),
            category: None,
            page: Some("9".to_string()),
        })
        .expect_err("page nine does not exist");
        assert!(matches!(err, AppError::Workflow(_)));
    }
}
