use std::collections::HashMap;
use std::sync::RwLock;

use axum::http::{header, HeaderMap};

use super::access::Principal;
use super::repository::{JobRepository, RepositoryError};

/// External collaborator resolving a bearer credential to a principal.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Principal>;
}

/// Extract the caller from an `Authorization: Bearer` header. Missing, malformed or unknown
/// credentials all yield an anonymous caller.
pub fn principal_from_headers(
    identity: &dyn IdentityProvider,
    headers: &HeaderMap,
) -> Option<Principal> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    identity.resolve(token)
}

/// Resolve the caller, then re-read their account from the store. Tokens whose account no longer
/// exists yield an anonymous caller; role flags always come from the stored account.
pub fn current_principal<R>(
    identity: &dyn IdentityProvider,
    repository: &R,
    headers: &HeaderMap,
) -> Result<Option<Principal>, RepositoryError>
where
    R: JobRepository + ?Sized,
{
    let Some(claimed) = principal_from_headers(identity, headers) else {
        return Ok(None);
    };
    Ok(repository
        .fetch_user(claimed.id)?
        .map(|user| Principal::from(&user)))
}

/// Token table kept in process memory.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: RwLock<HashMap<String, Principal>>,
}

impl TokenRegistry {
    pub fn register(&self, token: impl Into<String>, principal: Principal) {
        if let Ok(mut guard) = self.tokens.write() {
            guard.insert(token.into(), principal);
        }
    }
}

impl IdentityProvider for TokenRegistry {
    fn resolve(&self, token: &str) -> Option<Principal> {
        self.tokens.read().ok()?.get(token).cloned()
    }
}
