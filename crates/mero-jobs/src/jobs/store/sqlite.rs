use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::info;

use crate::jobs::domain::{
    Category, CategoryId, GenderChoice, Job, JobId, JobRecord, NewCategory, NewJob, NewUser,
    Recruiter, User, UserId,
};
use crate::jobs::repository::{JobRepository, RepositoryError};

struct Table {
    name: &'static str,
    schema: &'static str,
    indices: &'static [&'static str],
}

const USERS_TABLE_V_0: Table = Table {
    name: "users",
    schema: "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, email TEXT NOT NULL, is_agency INTEGER NOT NULL DEFAULT 0, is_staff INTEGER NOT NULL DEFAULT 0, is_superuser INTEGER NOT NULL DEFAULT 0);",
    indices: &["CREATE INDEX users_email_index ON users (email);"],
};
const CATEGORIES_TABLE_V_0: Table = Table {
    name: "categories",
    schema: "CREATE TABLE categories (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE CHECK (length(name) <= 100), description TEXT NOT NULL DEFAULT '');",
    indices: &[],
};
const JOBS_TABLE_V_0: Table = Table {
    name: "jobs",
    schema: "CREATE TABLE jobs (id INTEGER PRIMARY KEY AUTOINCREMENT, recruiter_id INTEGER NOT NULL, title TEXT NOT NULL CHECK (length(title) <= 255), description TEXT NOT NULL, category_id INTEGER NOT NULL, location TEXT NOT NULL DEFAULT '' CHECK (length(location) <= 255), salary TEXT NOT NULL, gender TEXT NOT NULL DEFAULT 'B' CHECK (gender IN ('M', 'F', 'B')), responsibilities TEXT NOT NULL DEFAULT '', CONSTRAINT recruiter_id FOREIGN KEY (recruiter_id) REFERENCES users (id) ON DELETE CASCADE, CONSTRAINT category_id FOREIGN KEY (category_id) REFERENCES categories (id) ON DELETE CASCADE);",
    indices: &[
        "CREATE INDEX jobs_recruiter_index ON jobs (recruiter_id);",
        "CREATE INDEX jobs_category_index ON jobs (category_id);",
    ],
};

struct VersionedSchema {
    version: u32,
    tables: &'static [Table],
}

const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USERS_TABLE_V_0, CATEGORIES_TABLE_V_0, JOBS_TABLE_V_0],
}];

/// Added to the schema version before it is stored in `PRAGMA user_version`.
const BASE_DB_VERSION: u32 = 300;

const JOB_SELECT: &str = "SELECT j.id, j.recruiter_id, j.title, j.description, j.category_id, \
     j.location, j.salary, j.gender, j.responsibilities, c.name, c.description, u.email \
     FROM jobs j JOIN categories c ON c.id = j.category_id JOIN users u ON u.id = j.recruiter_id";

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepositoryError::Integrity(err.to_string())
            }
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }
}

/// SQLite-backed store. Foreign keys carry `ON DELETE CASCADE`, so removing a user or category
/// removes its postings inside the same statement.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    pub fn open<T: AsRef<Path>>(db_path: T) -> Result<Self, RepositoryError> {
        let fresh = !db_path.as_ref().exists();
        let conn = Connection::open(db_path.as_ref())?;
        let store = Self::initialize(conn, fresh)?;
        info!(path = %db_path.as_ref().display(), fresh, "opened sqlite job store");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::initialize(Connection::open_in_memory()?, true)
    }

    fn initialize(conn: Connection, fresh: bool) -> Result<Self, RepositoryError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if fresh {
            Self::create_schema(&conn)?;
        }
        Self::validate_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn current_schema() -> &'static VersionedSchema {
        &VERSIONED_SCHEMAS[VERSIONED_SCHEMAS.len() - 1]
    }

    fn create_schema(conn: &Connection) -> Result<(), RepositoryError> {
        let schema = Self::current_schema();
        for table in schema.tables {
            conn.execute(table.schema, [])?;
            for index in table.indices {
                conn.execute(index, [])?;
            }
        }
        conn.execute_batch(&format!(
            "PRAGMA user_version = {};",
            BASE_DB_VERSION + schema.version
        ))?;
        Ok(())
    }

    fn validate_schema(conn: &Connection) -> Result<(), RepositoryError> {
        let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected = BASE_DB_VERSION + Self::current_schema().version;
        if version != expected {
            return Err(RepositoryError::Unavailable(format!(
                "unknown database version {version}, expected {expected}"
            )));
        }

        for table in Self::current_schema().tables {
            let present: Option<String> = conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table.name],
                    |row| row.get(0),
                )
                .optional()?;
            if present.is_none() {
                return Err(RepositoryError::Unavailable(format!(
                    "schema validation failed: table {} is missing",
                    table.name
                )));
            }
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))
    }

    fn query_jobs(
        conn: &Connection,
        clause: &str,
        param: Option<i64>,
    ) -> Result<Vec<JobRecord>, RepositoryError> {
        let sql = format!("{JOB_SELECT} {clause} ORDER BY j.id DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
            Some(value) => stmt
                .query_map(params![value], JobRow::read)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], JobRow::read)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        rows.into_iter().map(JobRow::into_record).collect()
    }
}

/// Column values of a joined job row before salary and gender are decoded.
struct JobRow {
    id: i64,
    recruiter_id: i64,
    title: String,
    description: String,
    category_id: i64,
    location: String,
    salary: String,
    gender: String,
    responsibilities: String,
    category_name: String,
    category_description: String,
    recruiter_email: String,
}

impl JobRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            recruiter_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            category_id: row.get(4)?,
            location: row.get(5)?,
            salary: row.get(6)?,
            gender: row.get(7)?,
            responsibilities: row.get(8)?,
            category_name: row.get(9)?,
            category_description: row.get(10)?,
            recruiter_email: row.get(11)?,
        })
    }

    fn into_record(self) -> Result<JobRecord, RepositoryError> {
        let salary = Decimal::from_str(&self.salary).map_err(|err| {
            RepositoryError::Unavailable(format!("job {} has unreadable salary: {err}", self.id))
        })?;
        let gender = GenderChoice::from_code(&self.gender).ok_or_else(|| {
            RepositoryError::Unavailable(format!(
                "job {} has unknown gender code '{}'",
                self.id, self.gender
            ))
        })?;

        Ok(JobRecord {
            job: Job {
                id: JobId(self.id),
                recruiter: UserId(self.recruiter_id),
                title: self.title,
                description: self.description,
                category: CategoryId(self.category_id),
                location: self.location,
                salary,
                gender,
                responsibilities: self.responsibilities,
            },
            category: Category {
                id: CategoryId(self.category_id),
                name: self.category_name,
                description: self.category_description,
            },
            recruiter: Recruiter {
                id: UserId(self.recruiter_id),
                email: self.recruiter_email,
            },
        })
    }
}

fn affected(changed: usize) -> Result<(), RepositoryError> {
    if changed == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

impl JobRepository for SqliteJobStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (email, is_agency, is_staff, is_superuser) VALUES (?1, ?2, ?3, ?4)",
            params![user.email, user.is_agency, user.is_staff, user.is_superuser],
        )?;
        Ok(User {
            id: UserId(conn.last_insert_rowid()),
            email: user.email,
            is_agency: user.is_agency,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        })
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, email, is_agency, is_staff, is_superuser FROM users WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(User {
                        id: UserId(row.get(0)?),
                        email: row.get(1)?,
                        is_agency: row.get(2)?,
                        is_staff: row.get(3)?,
                        is_superuser: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, email, is_agency, is_staff, is_superuser FROM users WHERE email = ?1 ORDER BY id LIMIT 1",
                params![email],
                |row| {
                    Ok(User {
                        id: UserId(row.get(0)?),
                        email: row.get(1)?,
                        is_agency: row.get(2)?,
                        is_staff: row.get(3)?,
                        is_superuser: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        affected(conn.execute("DELETE FROM users WHERE id = ?1", params![id.0])?)
    }

    fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO categories (name, description) VALUES (?1, ?2)",
            params![category.name, category.description],
        )?;
        Ok(Category {
            id: CategoryId(conn.last_insert_rowid()),
            name: category.name,
            description: category.description,
        })
    }

    fn update_category(&self, category: Category) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        affected(conn.execute(
            "UPDATE categories SET name = ?1, description = ?2 WHERE id = ?3",
            params![category.name, category.description, category.id.0],
        )?)
    }

    fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        affected(conn.execute("DELETE FROM categories WHERE id = ?1", params![id.0])?)
    }

    fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let conn = self.lock()?;
        let category = conn
            .query_row(
                "SELECT id, name, description FROM categories WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(Category {
                        id: CategoryId(row.get(0)?),
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name, description FROM categories ORDER BY id")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: CategoryId(row.get(0)?),
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn insert_job(&self, job: NewJob) -> Result<Job, RepositoryError> {
        let conn = self.lock()?;
        let fields = &job.fields;
        conn.execute(
            "INSERT INTO jobs (recruiter_id, title, description, category_id, location, salary, gender, responsibilities) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                job.recruiter.0,
                fields.title,
                fields.description,
                fields.category.0,
                fields.location,
                fields.salary.to_string(),
                fields.gender.code(),
                fields.responsibilities,
            ],
        )?;
        let id = JobId(conn.last_insert_rowid());
        Ok(Job::from_fields(id, job.recruiter, job.fields))
    }

    fn update_job(&self, job: Job) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        affected(conn.execute(
            "UPDATE jobs SET recruiter_id = ?1, title = ?2, description = ?3, category_id = ?4, location = ?5, salary = ?6, gender = ?7, responsibilities = ?8 WHERE id = ?9",
            params![
                job.recruiter.0,
                job.title,
                job.description,
                job.category.0,
                job.location,
                job.salary.to_string(),
                job.gender.code(),
                job.responsibilities,
                job.id.0,
            ],
        )?)
    }

    fn delete_job(&self, id: JobId) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        affected(conn.execute("DELETE FROM jobs WHERE id = ?1", params![id.0])?)
    }

    fn fetch_job(&self, id: JobId) -> Result<Option<JobRecord>, RepositoryError> {
        let conn = self.lock()?;
        let mut records = Self::query_jobs(&conn, "WHERE j.id = ?1", Some(id.0))?;
        Ok(records.pop())
    }

    fn jobs(&self) -> Result<Vec<JobRecord>, RepositoryError> {
        let conn = self.lock()?;
        Self::query_jobs(&conn, "", None)
    }

    fn jobs_by_recruiter(&self, recruiter: UserId) -> Result<Vec<JobRecord>, RepositoryError> {
        let conn = self.lock()?;
        Self::query_jobs(&conn, "WHERE j.recruiter_id = ?1", Some(recruiter.0))
    }
}
