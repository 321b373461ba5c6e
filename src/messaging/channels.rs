// Lock-free channels between the editing thread and the audio/UI consumers

use crate::messaging::command::Command;
use crate::messaging::notification::Notification;
use ringbuf::{HeapCons, HeapProd, HeapRb, traits::Split};

pub type CommandProducer = HeapProd<Command>;
pub type CommandConsumer = HeapCons<Command>;

pub type NotificationProducer = HeapProd<Notification>;
pub type NotificationConsumer = HeapCons<Notification>;

fn create_channel<T>(capacity: usize) -> (HeapProd<T>, HeapCons<T>) {
    HeapRb::<T>::new(capacity).split()
}

/// Parameter changes flowing to the audio thread
pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    create_channel(capacity)
}

/// Failures the calling layer wants to show to the user
pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    create_channel(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::notification::NotificationCategory;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn test_command_channel_is_bounded() {
        let (mut tx, mut rx) = create_command_channel(2);
        assert!(tx.try_push(Command::Quit).is_ok());
        assert!(tx.try_push(Command::Quit).is_ok());
        assert!(tx.try_push(Command::Quit).is_err());

        assert_eq!(rx.try_pop(), Some(Command::Quit));
    }

    #[test]
    fn test_notification_channel() {
        let (mut tx, mut rx) = create_notification_channel(4);
        let notification = Notification::info(NotificationCategory::History, "Undo".to_string());
        assert!(tx.try_push(notification).is_ok());

        let received = rx.try_pop().unwrap();
        assert_eq!(received.message, "Undo");
    }
}
