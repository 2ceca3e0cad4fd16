use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::GuestLimitsConfig;

#[derive(Debug)]
struct GuestUsage {
    ai_count: u32,
    upload_count: u32,
    reset_at: DateTime<Utc>,
}

/// Per-guest daily AI quotas. Keys are guest ids from the JWT, falling back
/// to the client IP. Counters reset 24h after first use; expired entries are
/// swept by a background task.
#[derive(Debug)]
pub struct RateLimiter {
    ai_limit: u32,
    upload_limit: u32,
    usage: Mutex<HashMap<String, GuestUsage>>,
}

impl RateLimiter {
    pub fn new(limits: &GuestLimitsConfig) -> Self {
        Self {
            ai_limit: limits.ai_per_day,
            upload_limit: limits.uploads_per_day,
            usage: Mutex::new(HashMap::new()),
        }
    }

    pub fn ai_limit(&self) -> u32 {
        self.ai_limit
    }

    pub fn upload_limit(&self) -> u32 {
        self.upload_limit
    }

    /// Consume one AI text request. Returns false once the daily budget is gone.
    pub fn allow_ai(&self, key: &str) -> bool {
        self.allow_ai_at(key, Utc::now())
    }

    /// Consume one image upload. Returns false once the daily budget is gone.
    pub fn allow_upload(&self, key: &str) -> bool {
        self.allow_upload_at(key, Utc::now())
    }

    /// Remaining (ai, upload) budget without consuming anything.
    pub fn remaining(&self, key: &str) -> (u32, u32) {
        self.remaining_at(key, Utc::now())
    }

    fn allow_ai_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut usage = self.usage.lock().unwrap();
        let entry = Self::entry(&mut usage, key, now);
        if entry.ai_count >= self.ai_limit {
            return false;
        }
        entry.ai_count += 1;
        true
    }

    fn allow_upload_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut usage = self.usage.lock().unwrap();
        let entry = Self::entry(&mut usage, key, now);
        if entry.upload_count >= self.upload_limit {
            return false;
        }
        entry.upload_count += 1;
        true
    }

    fn remaining_at(&self, key: &str, now: DateTime<Utc>) -> (u32, u32) {
        let usage = self.usage.lock().unwrap();
        match usage.get(key) {
            Some(u) if now <= u.reset_at => (
                self.ai_limit.saturating_sub(u.ai_count),
                self.upload_limit.saturating_sub(u.upload_count),
            ),
            _ => (self.ai_limit, self.upload_limit),
        }
    }

    fn entry<'a>(
        usage: &'a mut HashMap<String, GuestUsage>,
        key: &str,
        now: DateTime<Utc>,
    ) -> &'a mut GuestUsage {
        let stale = usage.get(key).map_or(true, |u| now > u.reset_at);
        if stale {
            usage.insert(
                key.to_string(),
                GuestUsage {
                    ai_count: 0,
                    upload_count: 0,
                    reset_at: now + chrono::Duration::hours(24),
                },
            );
        }
        usage.get_mut(key).unwrap()
    }

    /// Drop entries whose reset deadline has passed.
    pub fn cleanup(&self) {
        self.cleanup_at(Utc::now())
    }

    fn cleanup_at(&self, now: DateTime<Utc>) {
        let mut usage = self.usage.lock().unwrap();
        usage.retain(|_, u| now <= u.reset_at);
    }

    pub fn tracked_keys(&self) -> usize {
        self.usage.lock().unwrap().len()
    }
}

/// Periodic sweep of expired guest usage entries.
pub fn spawn_cleanup_task(limiter: std::sync::Arc<RateLimiter>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // First tick fires immediately; skip it
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.cleanup();
            tracing::debug!(
                tracked = limiter.tracked_keys(),
                "guest rate limiter cleanup complete"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(&GuestLimitsConfig {
            ai_per_day: 2,
            uploads_per_day: 1,
            cleanup_interval_secs: 3600,
        })
    }

    #[test]
    fn ai_budget_is_consumed_then_blocked() {
        let rl = limiter();
        assert!(rl.allow_ai("g1"));
        assert!(rl.allow_ai("g1"));
        assert!(!rl.allow_ai("g1"));
        // A different guest has its own budget
        assert!(rl.allow_ai("g2"));
    }

    #[test]
    fn upload_budget_is_separate_from_ai() {
        let rl = limiter();
        assert!(rl.allow_upload("g1"));
        assert!(!rl.allow_upload("g1"));
        // AI budget untouched
        assert_eq!(rl.remaining("g1"), (2, 0));
    }

    #[test]
    fn remaining_does_not_consume() {
        let rl = limiter();
        assert_eq!(rl.remaining("fresh"), (2, 1));
        assert_eq!(rl.remaining("fresh"), (2, 1));
        rl.allow_ai("fresh");
        assert_eq!(rl.remaining("fresh"), (1, 1));
    }

    #[test]
    fn budget_resets_after_window() {
        let rl = limiter();
        let start = Utc::now();
        assert!(rl.allow_ai_at("g1", start));
        assert!(rl.allow_ai_at("g1", start));
        assert!(!rl.allow_ai_at("g1", start));

        let next_day = start + chrono::Duration::hours(25);
        assert!(rl.allow_ai_at("g1", next_day));
        assert_eq!(rl.remaining_at("g1", next_day), (1, 1));
    }

    #[test]
    fn cleanup_drops_expired_entries_only() {
        let rl = limiter();
        let start = Utc::now();
        rl.allow_ai_at("old", start - chrono::Duration::hours(30));
        rl.allow_ai_at("fresh", start);
        assert_eq!(rl.tracked_keys(), 2);

        rl.cleanup_at(start);
        assert_eq!(rl.tracked_keys(), 1);
        assert_eq!(rl.remaining_at("fresh", start), (1, 1));
    }
}
