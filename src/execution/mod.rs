//! Move execution: pre-flight checks, atomic relocation, rollback.

mod executor;

pub use executor::MoveExecutor;
pub(crate) use executor::relocate_file;
