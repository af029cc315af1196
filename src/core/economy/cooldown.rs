// Cooldown gate for rate-limited commands.
//
// Each gated command stores only its last-invocation timestamp on the
// account row; the gate is a pure comparison against the configured window.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Commands that are gated by a per-user cooldown window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownKind {
    Work,
    Daily,
    Crime,
}

impl CooldownKind {
    /// Storage key for the last-invocation timestamp.
    pub fn as_str(&self) -> &'static str {
        match self {
            CooldownKind::Work => "work",
            CooldownKind::Daily => "daily",
            CooldownKind::Crime => "crime",
        }
    }

}

impl fmt::Display for CooldownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time left before the gate opens again, or `None` if the command is
/// available right now.
pub fn remaining(
    last: Option<DateTime<Utc>>,
    window: Duration,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let ready_at = last? + window;
    if now < ready_at {
        Some(ready_at - now)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_invoked_is_available() {
        assert_eq!(remaining(None, Duration::hours(24), Utc::now()), None);
    }

    #[test]
    fn inside_window_reports_time_left() {
        let now = Utc::now();
        let last = now - Duration::hours(1);

        let left = remaining(Some(last), Duration::hours(24), now).expect("should be gated");
        assert_eq!(left, Duration::hours(23));
    }

    #[test]
    fn after_window_is_available() {
        let now = Utc::now();
        let last = now - Duration::hours(25);

        assert_eq!(remaining(Some(last), Duration::hours(24), now), None);
    }

    #[test]
    fn boundary_is_available() {
        let now = Utc::now();
        let last = now - Duration::minutes(5);

        assert_eq!(remaining(Some(last), Duration::minutes(5), now), None);
    }
}
