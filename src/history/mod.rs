// Transactional undo/redo for observable state
//
// Every write to an ObservableRef records (execute, undo) pairs into the group
// currently being built. Groups are committed to a per-document History when
// the outermost write or batch finishes.
//
// Architecture:
// - History: past/future stacks, depth counter, replay suppression
// - TransactionGroup: ordered ActionPairs plus label and timestamp
// - BatchGuard / transact: explicit grouping of several writes
// - HistoryConfig: history length and reentrancy ceiling
//
// Failure policy:
// - A write whose subscriber or side effect fails reverts what it recorded
//   before the error reaches the caller
// - transact() reverts the whole batch when its closure fails
// - Undo/redo on an empty stack is a silent no-op

pub mod batch;
pub mod config;
pub mod error;
pub mod group;
pub mod stack;

pub use batch::BatchGuard;
pub use config::{ConfigError, HistoryConfig};
pub use error::{HistoryError, HistoryResult};
pub use group::{GroupId, Inverse, TransactionGroup};
pub use stack::{History, HistoryStatus};
