use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings. Allocated in increasing order by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

/// Identifier wrapper for job categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

/// Identity key of a user as known to the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored mirror of an identity so postings can reference their recruiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub is_agency: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub is_agency: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn agency(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            is_agency: true,
            is_staff: false,
            is_superuser: false,
        }
    }

    pub fn visitor(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            is_agency: false,
            is_staff: false,
            is_superuser: false,
        }
    }

    pub fn superuser(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            is_agency: false,
            is_staff: true,
            is_superuser: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

impl NewCategory {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

/// Gender eligibility of a posting, persisted as a single-character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GenderChoice {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    #[serde(rename = "B")]
    Both,
}

impl GenderChoice {
    pub const ALL: [GenderChoice; 3] = [
        GenderChoice::Male,
        GenderChoice::Female,
        GenderChoice::Both,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            GenderChoice::Male => "M",
            GenderChoice::Female => "F",
            GenderChoice::Both => "B",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            GenderChoice::Male => "Male",
            GenderChoice::Female => "Female",
            GenderChoice::Both => "Both",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|choice| choice.code() == code)
    }
}

/// The client-editable portion of a posting, already validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFields {
    pub title: String,
    pub description: String,
    pub category: CategoryId,
    pub location: String,
    pub salary: Decimal,
    pub gender: GenderChoice,
    pub responsibilities: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub recruiter: UserId,
    pub fields: JobFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub recruiter: UserId,
    pub title: String,
    pub description: String,
    pub category: CategoryId,
    pub location: String,
    pub salary: Decimal,
    pub gender: GenderChoice,
    pub responsibilities: String,
}

impl Job {
    pub fn from_fields(id: JobId, recruiter: UserId, fields: JobFields) -> Self {
        let JobFields {
            title,
            description,
            category,
            location,
            salary,
            gender,
            responsibilities,
        } = fields;

        Self {
            id,
            recruiter,
            title,
            description,
            category,
            location,
            salary,
            gender,
            responsibilities,
        }
    }

    /// Overwrite the editable fields; identifier and recruiter stay untouched.
    pub fn apply(&mut self, fields: JobFields) {
        let id = self.id;
        let recruiter = self.recruiter;
        *self = Self::from_fields(id, recruiter, fields);
    }

    pub fn fields(&self) -> JobFields {
        JobFields {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            location: self.location.clone(),
            salary: self.salary,
            gender: self.gender,
            responsibilities: self.responsibilities.clone(),
        }
    }
}

/// Minimal recruiter projection joined onto postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recruiter {
    pub id: UserId,
    pub email: String,
}

/// A posting joined with its category and recruiter, as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job: Job,
    pub category: Category,
    pub recruiter: Recruiter,
}

impl JobRecord {
    pub fn view(&self) -> JobView {
        JobView::from(self)
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({})",
            self.job.title, self.category.name, self.recruiter.email
        )
    }
}

/// Flattened, serializable representation returned by list and detail responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobView {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub location: String,
    pub salary: Decimal,
    pub gender: GenderChoice,
    pub gender_display: String,
    pub responsibilities: String,
    pub recruiter_id: UserId,
    pub recruiter_email: String,
}

impl From<&JobRecord> for JobView {
    fn from(record: &JobRecord) -> Self {
        let job = &record.job;
        Self {
            id: job.id,
            title: job.title.clone(),
            description: job.description.clone(),
            category_id: record.category.id,
            category_name: record.category.name.clone(),
            location: job.location.clone(),
            salary: job.salary,
            gender: job.gender,
            gender_display: job.gender.label().to_string(),
            responsibilities: job.responsibilities.clone(),
            recruiter_id: record.recruiter.id,
            recruiter_email: record.recruiter.email.clone(),
        }
    }
}
