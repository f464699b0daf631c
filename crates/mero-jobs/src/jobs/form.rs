use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{Category, CategoryId, GenderChoice, Job, JobFields};

pub const TITLE_MAX_CHARS: usize = 255;
pub const LOCATION_MAX_CHARS: usize = 255;
pub const SALARY_MAX_DIGITS: u32 = 10;
pub const SALARY_DECIMAL_PLACES: u32 = 2;

const REQUIRED: &str = "This field is required.";
const INVALID_CATEGORY: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Raw values submitted for a posting. Every field is optional here; missing input becomes a
/// field error during validation. `recruiter` and `id` are not form fields, so values sent
/// under those names are dropped on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<String>,
}

impl JobForm {
    /// Prefill the form from a stored posting.
    pub fn from_job(job: &Job) -> Self {
        let fields = job.fields();
        Self {
            title: Some(fields.title),
            description: Some(fields.description),
            category: Some(fields.category.to_string()),
            location: Some(fields.location),
            salary: Some(fields.salary.to_string()),
            gender: Some(fields.gender.code().to_string()),
            responsibilities: Some(fields.responsibilities),
        }
    }

    /// Blank form with the model defaults filled in.
    pub fn initial() -> Self {
        Self {
            gender: Some(GenderChoice::default().code().to_string()),
            ..Self::default()
        }
    }
}

/// Field-level validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Selectable gender option rendered alongside the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub value: &'static str,
    pub label: &'static str,
}

pub fn gender_choices() -> Vec<ChoiceView> {
    GenderChoice::ALL
        .into_iter()
        .map(|choice| ChoiceView {
            value: choice.code(),
            label: choice.label(),
        })
        .collect()
}

/// Everything needed to (re)present the create/update form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFormContext {
    pub values: JobForm,
    pub errors: FieldErrors,
    pub categories: Vec<Category>,
    pub gender_choices: Vec<ChoiceView>,
}

impl JobFormContext {
    pub fn new(values: JobForm, categories: Vec<Category>) -> Self {
        Self {
            values,
            errors: FieldErrors::default(),
            categories,
            gender_choices: gender_choices(),
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }
}

/// Clean a submitted form against the current category set.
pub fn validate_job_form(
    form: &JobForm,
    categories: &[Category],
) -> Result<JobFields, FieldErrors> {
    let mut errors = FieldErrors::default();

    let title = required_text(
        &mut errors,
        "title",
        form.title.as_deref(),
        Some(TITLE_MAX_CHARS),
    );
    let description =
        required_text(&mut errors, "description", form.description.as_deref(), None);
    let category = clean_category(&mut errors, form.category.as_deref(), categories);
    let location = optional_text(
        &mut errors,
        "location",
        form.location.as_deref(),
        Some(LOCATION_MAX_CHARS),
    );
    let salary = clean_salary(&mut errors, form.salary.as_deref());
    let gender = clean_gender(&mut errors, form.gender.as_deref());
    let responsibilities = optional_text(
        &mut errors,
        "responsibilities",
        form.responsibilities.as_deref(),
        None,
    );

    match (title, description, category, location, salary, gender, responsibilities) {
        (
            Some(title),
            Some(description),
            Some(category),
            Some(location),
            Some(salary),
            Some(gender),
            Some(responsibilities),
        ) if errors.is_empty() => Ok(JobFields {
            title,
            description,
            category,
            location,
            salary,
            gender,
            responsibilities,
        }),
        _ => Err(errors),
    }
}

fn trimmed(raw: Option<&str>) -> &str {
    raw.map(str::trim).unwrap_or_default()
}

fn within_length(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    max_chars: Option<usize>,
) -> bool {
    let Some(max) = max_chars else {
        return true;
    };

    let count = value.chars().count();
    if count > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {count})."),
        );
        return false;
    }
    true
}

fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&str>,
    max_chars: Option<usize>,
) -> Option<String> {
    let value = trimmed(raw);
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    within_length(errors, field, value, max_chars).then(|| value.to_string())
}

fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&str>,
    max_chars: Option<usize>,
) -> Option<String> {
    let value = trimmed(raw);
    within_length(errors, field, value, max_chars).then(|| value.to_string())
}

fn clean_category(
    errors: &mut FieldErrors,
    raw: Option<&str>,
    categories: &[Category],
) -> Option<CategoryId> {
    let value = trimmed(raw);
    if value.is_empty() {
        errors.add("category", REQUIRED);
        return None;
    }

    let found = value
        .parse::<i64>()
        .ok()
        .and_then(|id| categories.iter().find(|category| category.id.0 == id));

    match found {
        Some(category) => Some(category.id),
        None => {
            errors.add("category", INVALID_CATEGORY);
            None
        }
    }
}

fn clean_salary(errors: &mut FieldErrors, raw: Option<&str>) -> Option<Decimal> {
    let value = trimmed(raw);
    if value.is_empty() {
        errors.add("salary", REQUIRED);
        return None;
    }

    let Ok(parsed) = Decimal::from_str(value) else {
        errors.add("salary", "Enter a number.");
        return None;
    };

    let decimals = parsed.scale();
    let significant = parsed.mantissa().unsigned_abs().to_string().len() as u32;
    let digits = significant.max(decimals);
    let whole = digits - decimals;

    if digits > SALARY_MAX_DIGITS {
        errors.add(
            "salary",
            format!("Ensure that there are no more than {SALARY_MAX_DIGITS} digits in total."),
        );
        return None;
    }
    if decimals > SALARY_DECIMAL_PLACES {
        errors.add(
            "salary",
            format!("Ensure that there are no more than {SALARY_DECIMAL_PLACES} decimal places."),
        );
        return None;
    }
    let max_whole = SALARY_MAX_DIGITS - SALARY_DECIMAL_PLACES;
    if whole > max_whole {
        errors.add(
            "salary",
            format!("Ensure that there are no more than {max_whole} digits before the decimal point."),
        );
        return None;
    }

    let mut salary = parsed;
    salary.rescale(SALARY_DECIMAL_PLACES);
    Some(salary)
}

fn clean_gender(errors: &mut FieldErrors, raw: Option<&str>) -> Option<GenderChoice> {
    let value = trimmed(raw);
    if value.is_empty() {
        return Some(GenderChoice::default());
    }

    match GenderChoice::from_code(value) {
        Some(choice) => Some(choice),
        None => {
            errors.add(
                "gender",
                format!("Select a valid choice. {value} is not one of the available choices."),
            );
            None
        }
    }
}
