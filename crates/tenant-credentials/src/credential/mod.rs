//! Tenant credential records: fetching, completeness checks, and decryption

mod reader;
mod types;

pub use reader::{decrypt_record, ensure_usable, CredentialStoreReader};
pub use types::*;
