// Messaging - UI -> audio commands and user-facing notifications

pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{create_command_channel, create_notification_channel};
pub use command::{Command, ParameterId};
pub use notification::{Notification, NotificationCategory, NotificationLevel};
