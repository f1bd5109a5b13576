use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Answer cache keyed by a hash of the full prompt.
///
/// Bounded by bulk eviction: when full, a quarter of the entries is dropped
/// before the next insert.
pub struct ResponseCache {
    entries: DashMap<String, String>,
    max_entries: usize,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(enabled: bool, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            enabled,
        }
    }

    pub fn get(&self, prompt: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        self.entries
            .get(&Self::key(prompt))
            .map(|entry| entry.value().clone())
    }

    pub fn set(&self, prompt: &str, answer: String) {
        if !self.enabled {
            return;
        }
        if self.entries.len() >= self.max_entries {
            let to_remove: Vec<String> = self
                .entries
                .iter()
                .take(self.max_entries / 4)
                .map(|entry| entry.key().clone())
                .collect();
            for key in to_remove {
                self.entries.remove(&key);
            }
        }
        self.entries.insert(Self::key(prompt), answer);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            entries: self.entries.len(),
        }
    }

    fn key(prompt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let cache = ResponseCache::new(true, 10);
        cache.set("prompt", "answer".into());
        assert_eq!(cache.get("prompt").as_deref(), Some("answer"));
        assert_eq!(cache.get("other prompt"), None);
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = ResponseCache::new(false, 10);
        cache.set("prompt", "answer".into());
        assert_eq!(cache.get("prompt"), None);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn eviction_keeps_the_cache_bounded() {
        let cache = ResponseCache::new(true, 8);
        for i in 0..32 {
            cache.set(&format!("prompt {i}"), format!("answer {i}"));
        }
        assert!(cache.stats().entries <= 8);
    }
}
