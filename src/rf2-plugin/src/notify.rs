/// One-shot notification driven by host events.
///
/// An event arms the notification from any state; the next scoring update
/// consumes it, so each arm produces exactly one hook call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notification {
    #[default]
    Idle,
    Pending,
    Notified,
}

impl Notification {
    pub fn arm(&mut self) {
        *self = Notification::Pending;
    }

    /// Returns `true` once per arm and moves to `Notified`.
    pub fn take(&mut self) -> bool {
        match self {
            Notification::Pending => {
                *self = Notification::Notified;
                true
            }
            Notification::Idle | Notification::Notified => false,
        }
    }
}
