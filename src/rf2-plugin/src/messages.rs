//! Outbound chat-style messages, delivered one per host poll.

use crate::abi::{copy_to_c_buffer, MessageInfoV01, MESSAGE_CAPACITY};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Host routing code for messages shown only on the local screen.
pub const DESTINATION_LOCAL: u8 = 0;
/// Host routing code for messages broadcast to every connected player.
pub const DESTINATION_BROADCAST: u8 = 1;

/// FIFO of messages waiting for the host to ask for them.
#[derive(Debug, Default)]
pub struct MessageQueue {
    pending: Mutex<VecDeque<String>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, text: String) {
        self.lock().push_back(text);
    }

    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Only whole strings are ever stored, so a poisoned queue is still valid.
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle for enqueueing messages from any thread.
#[derive(Debug, Clone, Default)]
pub struct MessageSender {
    queue: Arc<MessageQueue>,
}

impl MessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&self, text: impl Into<String>) {
        let text = text.into();
        if text.len() >= MESSAGE_CAPACITY {
            tracing::debug!(
                len = text.len(),
                "message longer than the host buffer will be truncated"
            );
        }
        self.queue.push(text);
    }

    pub(crate) fn take_next(&self) -> Option<String> {
        self.queue.pop()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Fills the host buffer with `text`, routed for a server or a client.
pub fn deliver(info: &mut MessageInfoV01, text: &str, is_server: bool) {
    let mut buf = [0u8; MESSAGE_CAPACITY];
    copy_to_c_buffer(&mut buf, text);
    info.text = buf;
    info.destination = if is_server {
        DESTINATION_BROADCAST
    } else {
        DESTINATION_LOCAL
    };
    info.translate = 0;
}

/// Formats a message and queues it for display.
///
/// ```rust,ignore
/// display_message!(ctx, "Best lap {:.3}s by {}", lap_time, driver);
/// ```
#[macro_export]
macro_rules! display_message {
    ($target:expr, $($arg:tt)*) => {
        $target.display_message(::std::format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let sender = MessageSender::new();
        for idx in 0..5 {
            sender.send(format!("message {idx}"));
        }
        assert_eq!(sender.pending(), 5);

        let drained: Vec<_> = std::iter::from_fn(|| sender.take_next()).collect();
        assert_eq!(
            drained,
            (0..5).map(|idx| format!("message {idx}")).collect::<Vec<_>>()
        );
        assert_eq!(sender.take_next(), None);
    }

    #[test]
    fn clones_share_one_queue() {
        let sender = MessageSender::new();
        let other = sender.clone();
        std::thread::spawn(move || other.send("from hardware thread"))
            .join()
            .unwrap();
        assert_eq!(sender.take_next().as_deref(), Some("from hardware thread"));
    }

    #[test]
    fn deliver_routes_by_server_mode() {
        let mut info = MessageInfoV01::default();
        info.translate = 1;

        deliver(&mut info, "hello", true);
        assert_eq!(info.text(), "hello");
        assert_eq!(info.destination, DESTINATION_BROADCAST);
        assert_eq!(info.translate, 0);

        deliver(&mut info, "hi", false);
        assert_eq!(info.text(), "hi");
        assert_eq!(info.destination, DESTINATION_LOCAL);
    }

    #[test]
    fn deliver_truncates_long_messages() {
        let mut info = MessageInfoV01::default();
        let long = "x".repeat(MESSAGE_CAPACITY * 2);

        deliver(&mut info, &long, false);

        let text = info.text;
        assert_eq!(info.text().len(), MESSAGE_CAPACITY - 1);
        assert_eq!(text[MESSAGE_CAPACITY - 1], 0);
    }

    #[test]
    fn deliver_clears_previous_text() {
        let mut info = MessageInfoV01::default();
        deliver(&mut info, "a much longer first message", false);
        deliver(&mut info, "short", false);
        let text = info.text;
        assert!(text[5..].iter().all(|&b| b == 0));
    }
}
