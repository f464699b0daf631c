//! Search, category filtering and pagination over posting collections.

use serde::{Deserialize, Serialize};

use super::domain::{Category, CategoryId, JobRecord, JobView};

pub const PAGE_SIZE: usize = 10;

/// Query-string parameters accepted by the public listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl JobQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoryFilter {
    Any,
    Only(CategoryId),
    /// The supplied value can never equal a category id.
    Unmatchable,
}

/// Compiled form of the search and category parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    needle: Option<String>,
    category: CategoryFilter,
}

impl JobFilter {
    pub fn from_query(query: &JobQuery) -> Self {
        Self::new(query.search.as_deref(), query.category.as_deref())
    }

    pub fn new(search: Option<&str>, category: Option<&str>) -> Self {
        let needle = search
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let category = match category {
            None | Some("") => CategoryFilter::Any,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(id) => CategoryFilter::Only(CategoryId(id)),
                Err(_) => CategoryFilter::Unmatchable,
            },
        };

        Self { needle, category }
    }

    pub fn matches(&self, record: &JobRecord) -> bool {
        self.matches_search(record) && self.matches_category(record)
    }

    fn matches_search(&self, record: &JobRecord) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };

        [
            record.job.title.as_str(),
            record.job.description.as_str(),
            record.job.location.as_str(),
            record.category.name.as_str(),
        ]
        .iter()
        .any(|field| contains_case_insensitive(field, needle))
    }

    fn matches_category(&self, record: &JobRecord) -> bool {
        match self.category {
            CategoryFilter::Any => true,
            CategoryFilter::Only(id) => record.job.category == id,
            CategoryFilter::Unmatchable => false,
        }
    }

    /// Keep matching records, newest first.
    pub fn apply(&self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        let mut matched: Vec<JobRecord> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();
        newest_first(&mut matched);
        matched
    }
}

/// `needle` must already be lowercased.
pub fn contains_case_insensitive(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Default posting order: highest identifier first.
pub fn newest_first(records: &mut [JobRecord]) {
    records.sort_by(|a, b| b.job.id.cmp(&a.job.id));
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("page number '{0}' is not an integer")]
    NotAnInteger(String),
    #[error("page number {0} is less than 1")]
    BelowOne(i64),
    #[error("page {0} contains no results")]
    Empty(usize),
}

/// One slice of a paginated collection plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub num_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            number: self.number,
            page_size: self.page_size,
            total_items: self.total_items,
            num_pages: self.num_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Slice `items` into the requested page. A missing page means the first one, `last` the final
/// one. The first page of an empty collection is valid; any other page past the end is not.
pub fn paginate<T>(
    items: Vec<T>,
    page: Option<&str>,
    page_size: usize,
) -> Result<Page<T>, PageError> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let num_pages = total_items.div_ceil(page_size).max(1);

    let number = match page.map(str::trim) {
        None | Some("") => 1,
        Some("last") => num_pages,
        Some(raw) => {
            let parsed = raw
                .parse::<i64>()
                .map_err(|_| PageError::NotAnInteger(raw.to_string()))?;
            if parsed < 1 {
                return Err(PageError::BelowOne(parsed));
            }
            parsed as usize
        }
    };

    if number > num_pages {
        return Err(PageError::Empty(number));
    }

    let offset = (number - 1) * page_size;
    let items = items.into_iter().skip(offset).take(page_size).collect();

    Ok(Page {
        number,
        page_size,
        total_items,
        num_pages,
        has_previous: number > 1,
        has_next: number < num_pages,
        items,
    })
}

/// Public listing payload: the requested page plus what the filter controls need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobListing {
    pub page: Page<JobView>,
    pub categories: Vec<Category>,
    pub selected_category: String,
    pub search: String,
}
