//! Session-to-tenant identity resolution

mod resolver;
mod types;

pub use resolver::{IdentityResolver, ELIGIBLE_SESSION_STATES};
pub use types::*;
