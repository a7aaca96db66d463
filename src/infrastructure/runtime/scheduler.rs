//! Debounced refresh scheduling
//!
//! Every trigger asks for a conversation refresh after its own delay. The
//! scheduler folds them into one pending deadline that only ever moves
//! later, so a burst of triggers costs a single fetch.

use std::time::Duration;

use tokio::time::Instant;

use crate::core::Signal;

/// Reasons to refresh the conversation list outside the regular interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    MessageReceived,
    MessageSent,
    ConversationRead,
    ForceRefresh,
    WindowFocused,
}

impl Trigger {
    /// Delay between the trigger and the refresh it asks for
    pub fn delay(self) -> Duration {
        match self {
            Trigger::MessageReceived => Duration::from_millis(1000),
            Trigger::MessageSent => Duration::from_millis(500),
            Trigger::ConversationRead => Duration::from_millis(200),
            Trigger::ForceRefresh | Trigger::WindowFocused => Duration::ZERO,
        }
    }

    pub fn from_signal(signal: &Signal) -> Option<Self> {
        match signal {
            Signal::MessageReceived { .. } => Some(Trigger::MessageReceived),
            Signal::MessageSent { .. } => Some(Trigger::MessageSent),
            Signal::ConversationRead { .. } => Some(Trigger::ConversationRead),
            Signal::ForceRefresh => Some(Trigger::ForceRefresh),
            Signal::WindowFocused => Some(Trigger::WindowFocused),
            _ => None,
        }
    }
}

/// Trailing-edge debounce over all triggers
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    window: Duration,
    deadline: Option<Instant>,
}

impl RefreshScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Register a trigger seen at `now`; returns the pending deadline
    pub fn schedule(&mut self, trigger: Trigger, now: Instant) -> Instant {
        let candidate = now + trigger.delay().max(self.window);
        let deadline = match self.deadline {
            Some(existing) if existing > candidate => existing,
            _ => candidate,
        };
        self.deadline = Some(deadline);
        deadline
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the deadline if it has passed
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(200);

    #[test]
    fn test_trigger_delays() {
        assert_eq!(Trigger::MessageReceived.delay(), Duration::from_millis(1000));
        assert_eq!(Trigger::MessageSent.delay(), Duration::from_millis(500));
        assert_eq!(Trigger::ConversationRead.delay(), Duration::from_millis(200));
        assert_eq!(Trigger::ForceRefresh.delay(), Duration::ZERO);
        assert_eq!(Trigger::WindowFocused.delay(), Duration::ZERO);
    }

    #[test]
    fn test_zero_delay_triggers_wait_for_window() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(WINDOW);
        assert_eq!(scheduler.schedule(Trigger::ForceRefresh, start), start + WINDOW);
    }

    #[test]
    fn test_burst_extends_deadline() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(WINDOW);

        scheduler.schedule(Trigger::ForceRefresh, start);
        let later = start + Duration::from_millis(150);
        let deadline = scheduler.schedule(Trigger::WindowFocused, later);
        assert_eq!(deadline, later + WINDOW);
    }

    #[test]
    fn test_deadline_never_moves_earlier() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(WINDOW);

        let received = scheduler.schedule(Trigger::MessageReceived, start);
        let after_focus = scheduler.schedule(Trigger::WindowFocused, start);
        assert_eq!(received, after_focus);
        assert_eq!(received, start + Duration::from_millis(1000));
    }

    #[test]
    fn test_take_due_consumes_once() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(WINDOW);
        scheduler.schedule(Trigger::MessageSent, start);

        assert!(!scheduler.take_due(start + Duration::from_millis(499)));
        assert!(scheduler.take_due(start + Duration::from_millis(500)));
        assert!(!scheduler.take_due(start + Duration::from_millis(501)));
        assert!(scheduler.deadline().is_none());
    }

    #[test]
    fn test_from_signal_ignores_navigation() {
        assert_eq!(Trigger::from_signal(&Signal::OpenMessages), None);
        assert_eq!(
            Trigger::from_signal(&Signal::MessageSent {
                conversation_id: "c1".to_string()
            }),
            Some(Trigger::MessageSent)
        );
    }
}
