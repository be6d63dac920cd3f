/// Transient popups with a single hide deadline
///
/// Showing a popup while one is visible replaces the message and pushes the
/// deadline out; there is never more than one pending hide.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct PopupMessage {
    pub title: String,
    pub body: Option<String>,
}

impl PopupMessage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
        }
    }

    pub fn with_body(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransientPopup {
    message: Option<PopupMessage>,
    hide_at: Option<Instant>,
    duration: Duration,
}

impl TransientPopup {
    pub fn new(duration: Duration) -> Self {
        Self {
            message: None,
            hide_at: None,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Show `message` until `now + duration`, cancelling any earlier deadline
    pub fn show(&mut self, message: PopupMessage, now: Instant) {
        self.message = Some(message);
        self.hide_at = Some(now + self.duration);
    }

    /// Hide the popup once its deadline has passed. Returns true if it was
    /// hidden on this call.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.message = None;
                self.hide_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn dismiss(&mut self) {
        self.message = None;
        self.hide_at = None;
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        matches!(self.hide_at, Some(deadline) if now < deadline) && self.message.is_some()
    }

    pub fn message(&self) -> Option<&PopupMessage> {
        self.message.as_ref()
    }

    /// Time left before the pending hide, for repaint scheduling
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.hide_at.map(|deadline| deadline.saturating_duration_since(now))
    }
}
