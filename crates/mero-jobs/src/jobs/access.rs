//! Authorization predicates shared by the public workflow and the admin surface.

use serde::{Deserialize, Serialize};

use super::domain::{Job, User, UserId};

/// Authenticated caller as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub is_agency: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_agency: user.is_agency,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

/// Reason a gate refused the caller. Neither variant leaves side effects behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("authentication required")]
    Unauthenticated,
    #[error("you do not have permission to perform this action")]
    Forbidden,
}

fn authenticated(principal: Option<&Principal>) -> Result<&Principal, AccessDenied> {
    principal.ok_or(AccessDenied::Unauthenticated)
}

/// Gate for "my postings" and create: the caller must be a signed-in agency.
pub fn require_agency(principal: Option<&Principal>) -> Result<&Principal, AccessDenied> {
    let principal = authenticated(principal)?;
    if principal.is_agency {
        Ok(principal)
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Ownership predicate used for update and delete. Administrator flags grant nothing here.
pub fn can_manage(principal: &Principal, job: &Job) -> bool {
    principal.is_agency && job.recruiter == principal.id
}

pub fn require_manager<'p>(
    principal: Option<&'p Principal>,
    job: &Job,
) -> Result<&'p Principal, AccessDenied> {
    let principal = authenticated(principal)?;
    if can_manage(principal, job) {
        Ok(principal)
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Gate for the admin surface.
pub fn require_staff(principal: Option<&Principal>) -> Result<&Principal, AccessDenied> {
    let principal = authenticated(principal)?;
    if principal.is_staff || principal.is_superuser {
        Ok(principal)
    } else {
        Err(AccessDenied::Forbidden)
    }
}

pub fn require_superuser(principal: Option<&Principal>) -> Result<&Principal, AccessDenied> {
    let principal = authenticated(principal)?;
    if principal.is_superuser {
        Ok(principal)
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Admin collections are narrowed to the caller's own postings for agency staff that are not
/// superusers.
pub fn admin_scoped(principal: &Principal) -> bool {
    !principal.is_superuser && principal.is_agency
}

pub fn admin_visible(principal: &Principal, job: &Job) -> bool {
    !admin_scoped(principal) || job.recruiter == principal.id
}
