//! Per-user tutoring state.
//!
//! The store maps a user id to a [`SharedContext`]. The `DashMap` shards
//! lookups so distinct users never contend; each entry carries its own
//! `std::sync::Mutex` which serializes mutation for one user. Guards are never
//! held across an `.await`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use learncoach_config::ContextConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Stored agent content is cut to this many characters.
pub const AGENT_CONTENT_LIMIT: usize = 200;

/// Role recorded for the student's side of a turn.
pub const USER_ROLE: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Unknown,
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Unknown => "unknown",
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }

    /// Parse a level reported by a tool or the model. Case-insensitive;
    /// anything that is not a concrete level yields `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "beginner" => Some(SkillLevel::Beginner),
            "intermediate" => Some(SkillLevel::Intermediate),
            "advanced" => Some(SkillLevel::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// `"user"` or the agent name.
    pub role: String,
    pub content: String,
}

impl TurnRecord {
    /// Build a record, truncating anything not authored by the user.
    pub fn new(role: impl Into<String>, content: &str) -> Self {
        let role = role.into();
        let content = if role == USER_ROLE {
            content.to_string()
        } else {
            truncate_chars(content, AGENT_CONTENT_LIMIT)
        };
        Self { role, content }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub skill_level: SkillLevel,
    pub history: Vec<TurnRecord>,
    pub topics_learned: Vec<String>,
    pub last_interaction: DateTime<Utc>,
    /// Completed turns recorded for this user.
    pub turns: u64,
}

impl UserContext {
    pub fn new() -> Self {
        Self {
            skill_level: SkillLevel::Unknown,
            history: Vec::new(),
            topics_learned: Vec::new(),
            last_interaction: Utc::now(),
            turns: 0,
        }
    }

    fn push_record(&mut self, record: TurnRecord, max_history: usize) {
        self.history.push(record);
        let excess = self.history.len().saturating_sub(max_history);
        if excess > 0 {
            // Drop whole pairs so history never starts with an agent reply.
            let drop = (excess + excess % 2).min(self.history.len());
            self.history.drain(..drop);
        }
    }

    fn learn_topic(&mut self, topic: &str, max_topics: usize) -> bool {
        let topic = topic.trim().to_lowercase();
        if topic.is_empty() || self.topics_learned.contains(&topic) {
            return false;
        }
        self.topics_learned.push(topic);
        let excess = self.topics_learned.len().saturating_sub(max_topics);
        self.topics_learned.drain(..excess);
        true
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to one user's context.
pub type SharedContext = Arc<Mutex<UserContext>>;

/// Lock a context. A poisoned mutex still holds consistent data since every
/// mutation here completes before releasing the guard.
pub fn lock(ctx: &SharedContext) -> MutexGuard<'_, UserContext> {
    ctx.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resource caps for the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    pub max_history: usize,
    pub max_users: usize,
    pub max_topics: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self::from(&ContextConfig::default())
    }
}

impl From<&ContextConfig> for ContextLimits {
    fn from(config: &ContextConfig) -> Self {
        Self {
            max_history: config.max_history,
            max_users: config.max_users,
            max_topics: config.max_topics,
        }
    }
}

pub struct ContextStore {
    entries: DashMap<String, SharedContext>,
    limits: ContextLimits,
    /// Serializes creation so the user cap holds under concurrent inserts.
    creating: Mutex<()>,
}

impl ContextStore {
    pub fn new(limits: ContextLimits) -> Self {
        Self {
            entries: DashMap::new(),
            limits,
            creating: Mutex::new(()),
        }
    }

    /// Fetch the context for `user_id`, creating it on first reference.
    ///
    /// When the store is full the least recently active other user is evicted
    /// first. Lookups of resident users never take the creation lock.
    pub fn get_or_create(&self, user_id: &str) -> SharedContext {
        if let Some(existing) = self.entries.get(user_id) {
            return Arc::clone(existing.value());
        }

        let _creating = self.creating.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = self.entries.get(user_id) {
            return Arc::clone(existing.value());
        }

        // No shard guard may be held while scanning for a victim.
        while self.entries.len() >= self.limits.max_users.max(1) {
            if !self.evict_least_recent(user_id) {
                break;
            }
        }

        let entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id, "Created user context");
                Arc::new(Mutex::new(UserContext::new()))
            });
        Arc::clone(entry.value())
    }

    fn evict_least_recent(&self, except: &str) -> bool {
        let victim = self
            .entries
            .iter()
            .filter(|e| e.key() != except)
            .map(|e| (e.key().clone(), lock(e.value()).last_interaction))
            .min_by_key(|(_, at)| *at)
            .map(|(id, _)| id);

        match victim {
            Some(id) => {
                self.entries.remove(&id);
                debug!(user_id = %id, "Evicted least recently active user");
                true
            }
            None => false,
        }
    }

    /// Append one record for `user_id`.
    pub fn append_turn(&self, user_id: &str, role: &str, content: &str) {
        let ctx = self.get_or_create(user_id);
        let mut guard = lock(&ctx);
        guard.push_record(TurnRecord::new(role, content), self.limits.max_history);
        guard.last_interaction = Utc::now();
    }

    /// Append the user message and the agent reply as one adjacent pair.
    pub fn record_turn(&self, user_id: &str, message: &str, agent_name: &str, reply: &str) {
        let ctx = self.get_or_create(user_id);
        let mut guard = lock(&ctx);
        guard.push_record(TurnRecord::new(USER_ROLE, message), self.limits.max_history);
        guard.push_record(TurnRecord::new(agent_name, reply), self.limits.max_history);
        guard.last_interaction = Utc::now();
        guard.turns += 1;
    }

    pub fn set_skill_level(&self, user_id: &str, level: SkillLevel) {
        let ctx = self.get_or_create(user_id);
        lock(&ctx).skill_level = level;
    }

    /// Record a topic as learned. Returns `false` if it was already known.
    pub fn record_topic(&self, user_id: &str, topic: &str) -> bool {
        let ctx = self.get_or_create(user_id);
        lock(&ctx).learn_topic(topic, self.limits.max_topics)
    }

    /// A copy of the user's context, if resident. Never creates an entry.
    pub fn snapshot(&self, user_id: &str) -> Option<UserContext> {
        let ctx = self.entries.get(user_id).map(|e| Arc::clone(e.value()))?;
        Some(lock(&ctx).clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(ContextLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    fn limits(max_history: usize, max_users: usize) -> ContextLimits {
        ContextLimits {
            max_history,
            max_users,
            max_topics: 3,
        }
    }

    #[test]
    fn new_context_is_unknown_and_empty() {
        let store = ContextStore::default();
        let ctx = store.get_or_create("u1");
        let guard = lock(&ctx);
        assert_eq!(guard.skill_level, SkillLevel::Unknown);
        assert!(guard.history.is_empty());
        assert!(guard.topics_learned.is_empty());
        assert_eq!(guard.turns, 0);
    }

    #[test]
    fn same_id_returns_same_instance() {
        let store = ContextStore::default();
        let a = store.get_or_create("u1");
        let b = store.get_or_create("u1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn record_turn_appends_adjacent_pair() {
        let store = ContextStore::default();
        store.record_turn("u1", "hello", "teaching", "hi there");

        let ctx = store.snapshot("u1").unwrap();
        assert_eq!(ctx.history.len(), 2);
        assert_eq!(ctx.history[0].role, "user");
        assert_eq!(ctx.history[0].content, "hello");
        assert_eq!(ctx.history[1].role, "teaching");
        assert_eq!(ctx.turns, 1);
    }

    #[test]
    fn agent_content_truncated_user_content_verbatim() {
        let store = ContextStore::default();
        let long_user = "q".repeat(500);
        let long_reply = "é".repeat(450);
        store.record_turn("u1", &long_user, "practice", &long_reply);

        let ctx = store.snapshot("u1").unwrap();
        assert_eq!(ctx.history[0].content.len(), 500);
        assert_eq!(ctx.history[1].content.chars().count(), AGENT_CONTENT_LIMIT);
        assert!(ctx.history[1].content.chars().all(|c| c == 'é'));
    }

    #[test]
    fn short_reply_kept_whole() {
        assert_eq!(TurnRecord::new("progress", "done").content, "done");
    }

    #[test]
    fn history_cap_drops_oldest_pairs() {
        let store = ContextStore::new(limits(4, 10));
        for i in 0..3 {
            store.record_turn("u1", &format!("m{i}"), "teaching", &format!("r{i}"));
        }
        let ctx = store.snapshot("u1").unwrap();
        assert_eq!(ctx.history.len(), 4);
        assert_eq!(ctx.history[0].content, "m1");
        assert_eq!(ctx.history[0].role, "user");
        assert_eq!(ctx.history[3].content, "r2");
        assert_eq!(ctx.turns, 3);
    }

    #[test]
    fn single_appends_respect_pair_boundaries() {
        let store = ContextStore::new(limits(2, 10));
        store.append_turn("u1", "user", "a");
        store.append_turn("u1", "teaching", "b");
        store.append_turn("u1", "user", "c");
        let ctx = store.snapshot("u1").unwrap();
        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.history[0].content, "c");
    }

    #[test]
    fn user_cap_evicts_least_recent() {
        let store = ContextStore::new(limits(20, 2));
        store.record_turn("old", "m", "teaching", "r");
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.record_turn("recent", "m", "teaching", "r");

        store.get_or_create("new");
        assert_eq!(store.len(), 2);
        assert!(store.snapshot("old").is_none());
        assert!(store.snapshot("recent").is_some());
        assert!(store.snapshot("new").is_some());
    }

    #[test]
    fn user_cap_holds_under_concurrent_creation() {
        let store = Arc::new(ContextStore::new(limits(20, 4)));
        for i in 0..4 {
            store.get_or_create(&format!("resident-{i}"));
        }

        for round in 0..50 {
            let barrier = Arc::new(Barrier::new(16));
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        store.get_or_create(&format!("new-{round}-{i}"));
                        store.len()
                    })
                })
                .collect();
            for h in handles {
                assert!(h.join().unwrap() <= 4);
            }
            assert_eq!(store.len(), 4);
        }
    }

    #[test]
    fn topics_are_distinct_lowercase_and_capped() {
        let store = ContextStore::new(limits(20, 10));
        assert!(store.record_topic("u1", "Loops"));
        assert!(!store.record_topic("u1", "loops "));
        assert!(!store.record_topic("u1", "  "));
        store.record_topic("u1", "lists");
        store.record_topic("u1", "classes");
        store.record_topic("u1", "functions");

        let ctx = store.snapshot("u1").unwrap();
        assert_eq!(ctx.topics_learned, vec!["lists", "classes", "functions"]);
    }

    #[test]
    fn skill_level_labels() {
        assert_eq!(SkillLevel::from_label(" Advanced"), Some(SkillLevel::Advanced));
        assert_eq!(SkillLevel::from_label("unknown"), None);
        assert_eq!(SkillLevel::from_label("guru"), None);

        let store = ContextStore::default();
        store.set_skill_level("u1", SkillLevel::Beginner);
        assert_eq!(store.snapshot("u1").unwrap().skill_level, SkillLevel::Beginner);
    }

    #[test]
    fn snapshot_does_not_create() {
        let store = ContextStore::default();
        assert!(store.snapshot("ghost").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn limits_from_config() {
        let limits = ContextLimits::from(&ContextConfig::default());
        assert_eq!(limits.max_history, 20);
        assert_eq!(limits.max_users, 1000);
        assert_eq!(limits.max_topics, 50);
    }

    #[test]
    fn concurrent_users_stay_isolated() {
        let store = Arc::new(ContextStore::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let user = format!("user-{i}");
                    for n in 0..5 {
                        store.record_turn(&user, &format!("{user}:{n}"), "teaching", "ok");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 8);
        for i in 0..8 {
            let user = format!("user-{i}");
            let ctx = store.snapshot(&user).unwrap();
            assert_eq!(ctx.history.len(), 10);
            assert!(ctx
                .history
                .iter()
                .filter(|r| r.role == "user")
                .all(|r| r.content.starts_with(&format!("{user}:"))));
        }
    }
}
