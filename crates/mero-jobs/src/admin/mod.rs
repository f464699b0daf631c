//! Staff back office: scoped posting list, category management and user removal.

pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use router::admin_router;
pub use service::{
    AdminError, AdminJobQuery, AdminJobRow, AdminOutcome, AdminService, CategoryDetail,
    CategoryForm, InlineJob,
};
