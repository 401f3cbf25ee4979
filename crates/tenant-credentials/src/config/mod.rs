//! Service configuration assembly and environment policy

mod assembler;
mod types;

pub use assembler::{AssemblerPolicy, ConfigurationAssembler};
pub use types::*;
