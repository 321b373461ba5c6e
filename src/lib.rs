// DAWG history - reactive state and transactional undo/redo for the editor

pub mod binding;
pub mod history;
pub mod messaging;
pub mod naming;
pub mod observable;

// Re-export commonly used types for convenience
pub use binding::{AtomicF32, Bindable, ParameterSender, bind, bind_map};
pub use history::{
    BatchGuard, History, HistoryConfig, HistoryError, HistoryResult, HistoryStatus,
    TransactionGroup,
};
pub use messaging::channels::{create_command_channel, create_notification_channel};
pub use observable::{ChangeEvent, ObservableRef, Subscription};
