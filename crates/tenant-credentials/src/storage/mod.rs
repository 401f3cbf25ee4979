//! Storage collaborators for session and credential lookups
//!
//! The pipeline only reads. Two capability traits describe the queries it
//! issues; `InMemoryStore` implements both.

mod memory;
mod traits;

pub use memory::InMemoryStore;
pub use traits::{CredentialRecordLookup, SessionLookup};
