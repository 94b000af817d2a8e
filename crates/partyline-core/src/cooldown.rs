//! Per-command, per-user cooldown bucket used by command dispatch.
//!
//! A plain timestamp map: the gate records the last allowed invocation of
//! each `(command, user)` pair and refuses repeats until the configured
//! cooldown has elapsed.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::UserId;

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    /// The command may run; the gate has recorded the invocation.
    Ready,
    /// The command is on cooldown for this user for the given remaining time.
    Wait(Duration),
}

/// Mutex-guarded timestamp map keyed by `(command, user)`.
///
/// Entries are refreshed on every allowed invocation; denied invocations do
/// not extend the cooldown.
pub struct CooldownGate {
    cooldown: Duration,
    last_used: Mutex<HashMap<(String, UserId), Instant>>,
}

impl CooldownGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_used: Mutex::new(HashMap::new()),
        }
    }

    /// Check (and on success, record) an invocation of `command` by `user`.
    pub fn check(&self, command: &str, user: &UserId) -> CooldownStatus {
        self.check_at(command, user, Instant::now())
    }

    fn check_at(&self, command: &str, user: &UserId, now: Instant) -> CooldownStatus {
        let key = (command.to_string(), user.clone());
        let mut map = self.last_used.lock().unwrap();
        if let Some(last) = map.get(&key) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.cooldown {
                return CooldownStatus::Wait(self.cooldown - elapsed);
            }
        }
        map.insert(key, now);
        CooldownStatus::Ready
    }

    /// Drop all recorded invocations (used when cooldown policy changes).
    pub fn reset(&self) {
        self.last_used.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_invocation_is_ready() {
        let gate = CooldownGate::new(Duration::from_secs(3));
        assert_eq!(gate.check("connect", &UserId::from("u1")), CooldownStatus::Ready);
    }

    #[test]
    fn repeat_within_cooldown_waits() {
        let gate = CooldownGate::new(Duration::from_secs(3));
        let user = UserId::from("u1");
        let t0 = Instant::now();
        assert_eq!(gate.check_at("connect", &user, t0), CooldownStatus::Ready);
        match gate.check_at("connect", &user, t0 + Duration::from_secs(1)) {
            CooldownStatus::Wait(remaining) => assert_eq!(remaining, Duration::from_secs(2)),
            CooldownStatus::Ready => panic!("expected cooldown"),
        }
    }

    #[test]
    fn repeat_after_cooldown_is_ready() {
        let gate = CooldownGate::new(Duration::from_secs(3));
        let user = UserId::from("u1");
        let t0 = Instant::now();
        assert_eq!(gate.check_at("connect", &user, t0), CooldownStatus::Ready);
        assert_eq!(
            gate.check_at("connect", &user, t0 + Duration::from_secs(4)),
            CooldownStatus::Ready
        );
    }

    #[test]
    fn commands_and_users_are_independent() {
        let gate = CooldownGate::new(Duration::from_secs(3));
        let t0 = Instant::now();
        assert_eq!(gate.check_at("connect", &UserId::from("u1"), t0), CooldownStatus::Ready);
        assert_eq!(gate.check_at("hangup", &UserId::from("u1"), t0), CooldownStatus::Ready);
        assert_eq!(gate.check_at("connect", &UserId::from("u2"), t0), CooldownStatus::Ready);
    }
}
