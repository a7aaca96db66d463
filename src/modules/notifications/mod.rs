//! Unread notifications: permission handling and the banner
//!
//! An unread increase raises a banner and rings the terminal bell, provided
//! the user agreed. While undecided, the first increase asks for consent;
//! a refusal silently disables notifications for the session.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::NotificationPermission;
use crate::core::Signal;

const BANNER_TTL: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Raised,
    PermissionRequested,
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub count: u32,
    since: Instant,
}

impl Banner {
    pub fn text(&self) -> String {
        match self.count {
            1 => "1 unread message · m to open".to_string(),
            n => format!("{n} unread messages · m to open"),
        }
    }
}

#[derive(Debug)]
pub struct Notifier {
    permission: NotificationPermission,
    awaiting: Option<u32>,
    banner: Option<Banner>,
    bell: bool,
}

impl Notifier {
    pub fn new(permission: NotificationPermission) -> Self {
        Self {
            permission,
            awaiting: None,
            banner: None,
            bell: false,
        }
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
    }

    pub fn on_unread_increase(&mut self, count: u32) -> NotifyOutcome {
        match self.permission {
            NotificationPermission::Granted => {
                self.raise(count);
                NotifyOutcome::Raised
            }
            NotificationPermission::Ask => {
                self.awaiting = Some(count);
                NotifyOutcome::PermissionRequested
            }
            NotificationPermission::Denied => NotifyOutcome::Suppressed,
        }
    }

    pub fn awaiting_permission(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Record the user's answer to the consent prompt
    pub fn answer_permission(&mut self, granted: bool) {
        let pending = self.awaiting.take();
        if granted {
            info!("notifications enabled");
            self.permission = NotificationPermission::Granted;
            if let Some(count) = pending {
                self.raise(count);
            }
        } else {
            debug!("notifications declined");
            self.permission = NotificationPermission::Denied;
        }
    }

    fn raise(&mut self, count: u32) {
        self.banner = Some(Banner {
            count,
            since: Instant::now(),
        });
        self.bell = true;
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Act on the banner; yields the signal to publish
    pub fn activate(&mut self) -> Option<Signal> {
        self.banner.take().map(|_| Signal::OpenMessages)
    }

    pub fn expire(&mut self) {
        if self
            .banner
            .as_ref()
            .is_some_and(|banner| banner.since.elapsed() > BANNER_TTL)
        {
            self.banner = None;
        }
    }

    /// Whether the bell should ring this frame
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granted_raises_banner_and_bell() {
        let mut notifier = Notifier::new(NotificationPermission::Granted);
        assert_eq!(notifier.on_unread_increase(3), NotifyOutcome::Raised);
        assert_eq!(notifier.banner().map(|b| b.count), Some(3));
        assert!(notifier.take_bell());
        assert!(!notifier.take_bell());
    }

    #[test]
    fn test_ask_then_grant() {
        let mut notifier = Notifier::new(NotificationPermission::Ask);
        assert_eq!(
            notifier.on_unread_increase(2),
            NotifyOutcome::PermissionRequested
        );
        assert!(notifier.awaiting_permission());
        assert!(notifier.banner().is_none());

        notifier.answer_permission(true);
        assert_eq!(notifier.permission(), NotificationPermission::Granted);
        assert_eq!(notifier.banner().map(|b| b.text()), Some("2 unread messages · m to open".to_string()));
    }

    #[test]
    fn test_denial_is_silent() {
        let mut notifier = Notifier::new(NotificationPermission::Ask);
        notifier.on_unread_increase(1);
        notifier.answer_permission(false);

        assert!(!notifier.awaiting_permission());
        assert_eq!(notifier.on_unread_increase(4), NotifyOutcome::Suppressed);
        assert!(notifier.banner().is_none());
        assert!(!notifier.take_bell());
    }

    #[test]
    fn test_activate_opens_messages_once() {
        let mut notifier = Notifier::new(NotificationPermission::Granted);
        assert_eq!(notifier.activate(), None);

        notifier.on_unread_increase(1);
        assert_eq!(notifier.activate(), Some(Signal::OpenMessages));
        assert_eq!(notifier.activate(), None);
    }
}
