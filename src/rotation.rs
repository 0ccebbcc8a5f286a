use tokio::time::{Duration, Instant};

pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(10);

/// Alias after `current`, wrapping at the end. An unknown `current` rotates
/// to the first alias; fewer than two aliases never rotate.
pub fn next_alias<'a>(aliases: &'a [String], current: Option<&str>) -> Option<&'a str> {
    if aliases.len() <= 1 {
        return None;
    }
    let next_index = current
        .and_then(|current| aliases.iter().position(|alias| alias == current))
        .map(|index| (index + 1) % aliases.len())
        .unwrap_or(0);
    aliases.get(next_index).map(String::as_str)
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RotationGate {
    pub alias_count: usize,
    pub detail_open: bool,
    pub refreshing: bool,
    pub enabled: bool,
}

impl RotationGate {
    pub fn open(self) -> bool {
        self.alias_count > 1 && !self.detail_open && !self.refreshing && self.enabled
    }
}

/// Countdown for automatic alias rotation.
///
/// The deadline only exists while the gate is open. Every time the gate
/// opens again the countdown restarts from a full interval.
#[derive(Debug, Clone)]
pub struct RotationScheduler {
    interval: Duration,
    enabled: bool,
    deadline: Option<Instant>,
}

impl RotationScheduler {
    pub fn new(interval: Duration, enabled: bool) -> Self {
        Self {
            interval,
            enabled,
            deadline: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Bring the deadline in line with the gate. Called after every state
    /// change that can affect rotation.
    pub fn sync(&mut self, gate: RotationGate, now: Instant) {
        let gate = RotationGate {
            enabled: self.enabled,
            ..gate
        };
        match (gate.open(), self.deadline) {
            (true, None) => self.deadline = Some(now + self.interval),
            (false, Some(_)) => self.deadline = None,
            _ => {}
        }
    }

    /// True when the countdown has elapsed; re-arms for the next round.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RotationGate, RotationScheduler, next_alias};
    use tokio::time::{Duration, Instant};

    fn aliases(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn open_gate() -> RotationGate {
        RotationGate {
            alias_count: 3,
            detail_open: false,
            refreshing: false,
            enabled: true,
        }
    }

    #[test]
    fn rotation_advances_and_wraps() {
        let list = aliases(&["a", "b", "c"]);
        assert_eq!(next_alias(&list, Some("b")), Some("c"));
        assert_eq!(next_alias(&list, Some("c")), Some("a"));
        assert_eq!(next_alias(&list, Some("missing")), Some("a"));
        assert_eq!(next_alias(&list, None), Some("a"));
    }

    #[test]
    fn single_alias_never_rotates() {
        assert_eq!(next_alias(&aliases(&["only"]), Some("only")), None);
        assert_eq!(next_alias(&[], None), None);
    }

    #[test]
    fn gate_requires_every_condition() {
        assert!(open_gate().open());
        assert!(
            !RotationGate {
                alias_count: 1,
                ..open_gate()
            }
            .open()
        );
        assert!(
            !RotationGate {
                detail_open: true,
                ..open_gate()
            }
            .open()
        );
        assert!(
            !RotationGate {
                refreshing: true,
                ..open_gate()
            }
            .open()
        );
        assert!(
            !RotationGate {
                enabled: false,
                ..open_gate()
            }
            .open()
        );
    }

    #[test]
    fn countdown_arms_fires_and_rearms() {
        let start = Instant::now();
        let mut scheduler = RotationScheduler::new(Duration::from_secs(10), true);
        scheduler.sync(open_gate(), start);
        assert_eq!(scheduler.deadline(), Some(start + Duration::from_secs(10)));

        assert!(!scheduler.due(start + Duration::from_secs(9)));
        assert!(scheduler.due(start + Duration::from_secs(10)));
        assert_eq!(
            scheduler.remaining(start + Duration::from_secs(12)),
            Some(Duration::from_secs(8))
        );
    }

    #[test]
    fn closing_the_gate_drops_the_deadline_and_reopening_restarts() {
        let start = Instant::now();
        let mut scheduler = RotationScheduler::new(Duration::from_secs(10), true);
        scheduler.sync(open_gate(), start);

        let detail_open = RotationGate {
            detail_open: true,
            ..open_gate()
        };
        scheduler.sync(detail_open, start + Duration::from_secs(8));
        assert_eq!(scheduler.deadline(), None);
        assert!(!scheduler.due(start + Duration::from_secs(30)));

        let reopened = start + Duration::from_secs(40);
        scheduler.sync(open_gate(), reopened);
        assert_eq!(scheduler.deadline(), Some(reopened + Duration::from_secs(10)));
    }

    #[test]
    fn disabled_scheduler_ignores_open_gate() {
        let start = Instant::now();
        let mut scheduler = RotationScheduler::new(Duration::from_secs(10), false);
        scheduler.sync(open_gate(), start);
        assert_eq!(scheduler.deadline(), None);

        scheduler.set_enabled(true);
        scheduler.sync(open_gate(), start);
        assert!(scheduler.deadline().is_some());
    }
}
