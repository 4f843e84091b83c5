//! Operation Ledger: durable audit trail and undo.

pub mod checksum;
pub mod entry;
pub mod store;
pub mod undo;

pub use checksum::{compute_file_checksum, FileChecksum};
pub use entry::{LedgerEntry, Outcome};
pub use store::LedgerStore;
pub use undo::{undo_all, undo_last, UndoReport};
