use std::time::Duration;

pub const SUCCESS_TTL: Duration = Duration::from_secs(10);
pub const ERROR_TTL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    UpstakeHash,
    FundHash,
    TxError,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 3] = [Self::UpstakeHash, Self::FundHash, Self::TxError];

    pub fn ttl(self) -> Duration {
        match self {
            Self::UpstakeHash | Self::FundHash => SUCCESS_TTL,
            Self::TxError => ERROR_TTL,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::UpstakeHash => "upstake-hash",
            Self::FundHash => "fund-hash",
            Self::TxError => "tx-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub hash: String,
    /// Failure log for `TxError`, empty otherwise.
    pub detail: String,
    token: u64,
}

/// Timer the caller must schedule; it fires back into [`NotificationTracker::expire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub kind: NotificationKind,
    pub token: u64,
    pub after: Duration,
}

/// At most one banner per kind. Each banner owns its own expiry timer.
#[derive(Debug, Default)]
pub struct NotificationTracker {
    slots: Vec<Notification>,
    next_token: u64,
}

impl NotificationTracker {
    /// Show a banner, replacing any older banner of the same kind.
    pub fn push(&mut self, kind: NotificationKind, hash: String, detail: String) -> Expiry {
        self.next_token += 1;
        let token = self.next_token;
        self.slots.retain(|n| n.kind != kind);
        self.slots.push(Notification {
            kind,
            hash,
            detail,
            token,
        });
        Expiry {
            kind,
            token,
            after: kind.ttl(),
        }
    }

    /// Clear the banner the timer was armed for. Returns false when it was
    /// already replaced, which makes stale timers harmless.
    pub fn expire(&mut self, kind: NotificationKind, token: u64) -> bool {
        let before = self.slots.len();
        self.slots.retain(|n| !(n.kind == kind && n.token == token));
        before != self.slots.len()
    }

    pub fn get(&self, kind: NotificationKind) -> Option<&Notification> {
        self.slots.iter().find(|n| n.kind == kind)
    }

    /// Active banners in a fixed kind order.
    pub fn active(&self) -> Vec<&Notification> {
        NotificationKind::ALL
            .iter()
            .filter_map(|kind| self.get(*kind))
            .collect()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_expire_independently() {
        let mut tracker = NotificationTracker::default();
        let upstake = tracker.push(NotificationKind::UpstakeHash, "AAA".into(), String::new());
        let error = tracker.push(NotificationKind::TxError, "BBB".into(), "out of gas".into());
        assert_eq!(upstake.after, Duration::from_secs(10));
        assert_eq!(error.after, Duration::from_secs(15));
        assert_eq!(tracker.active().len(), 2);

        assert!(tracker.expire(upstake.kind, upstake.token));
        assert!(tracker.get(NotificationKind::UpstakeHash).is_none());
        assert_eq!(tracker.get(NotificationKind::TxError).unwrap().detail, "out of gas");

        assert!(tracker.expire(error.kind, error.token));
        assert!(tracker.is_empty());
    }

    #[test]
    fn replacement_makes_old_timer_a_noop() {
        let mut tracker = NotificationTracker::default();
        let first = tracker.push(NotificationKind::FundHash, "OLD".into(), String::new());
        let second = tracker.push(NotificationKind::FundHash, "NEW".into(), String::new());

        assert!(!tracker.expire(first.kind, first.token));
        assert_eq!(tracker.get(NotificationKind::FundHash).unwrap().hash, "NEW");
        assert!(tracker.expire(second.kind, second.token));
        assert!(tracker.is_empty());
    }

    #[test]
    fn active_order_is_stable() {
        let mut tracker = NotificationTracker::default();
        tracker.push(NotificationKind::TxError, "E".into(), "failed".into());
        tracker.push(NotificationKind::UpstakeHash, "U".into(), String::new());
        let tags: Vec<&str> = tracker.active().iter().map(|n| n.kind.tag()).collect();
        assert_eq!(tags, vec!["upstake-hash", "tx-error"]);
    }
}
