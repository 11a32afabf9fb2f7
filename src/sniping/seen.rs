// DANS : src/sniping/seen.rs

use crate::monitoring::metrics;
use std::{
    collections::{HashSet, VecDeque},
    sync::Mutex,
    time::Duration,
};
use tokio::time::Instant;

#[derive(Default)]
struct SeenInner {
    set: HashSet<String>,
    /// Ordre d'arrivée, le plus ancien en tête.
    order: VecDeque<(String, Instant)>,
}

impl SeenInner {
    fn pop_oldest(&mut self) {
        if let Some((signature, _)) = self.order.pop_front() {
            self.set.remove(&signature);
        }
    }

    fn evict_expired(&mut self, now: Instant, ttl: Duration) {
        while let Some((_, inserted_at)) = self.order.front() {
            if now.duration_since(*inserted_at) < ttl {
                break;
            }
            self.pop_oldest();
        }
    }
}

/// Ensemble borné des signatures déjà traitées.
/// Une signature est oubliée quand elle dépasse la fenêtre `ttl`
/// ou quand la capacité est atteinte (la plus ancienne part en premier).
pub struct SeenSignatures {
    inner: Mutex<SeenInner>,
    capacity: usize,
    ttl: Duration,
}

impl SeenSignatures {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(SeenInner::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Vérifie et insère en une seule opération atomique.
    /// Retourne `true` si la signature n'avait pas encore été vue.
    pub fn check_and_insert(&self, signature: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        inner.evict_expired(now, self.ttl);

        if inner.set.contains(signature) {
            return false;
        }
        while inner.order.len() >= self.capacity {
            inner.pop_oldest();
        }
        inner.set.insert(signature.to_string());
        inner.order.push_back((signature.to_string(), now));
        metrics::SEEN_SIGNATURES.set(inner.set.len() as i64);
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_insert_is_rejected() {
        let seen = SeenSignatures::new(10, Duration::from_secs(60));
        assert!(seen.check_and_insert("sig-1"));
        assert!(!seen.check_and_insert("sig-1"));
        assert!(seen.check_and_insert("sig-2"));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn oldest_signature_is_evicted_at_capacity() {
        let seen = SeenSignatures::new(2, Duration::from_secs(60));
        assert!(seen.check_and_insert("a"));
        assert!(seen.check_and_insert("b"));
        assert!(seen.check_and_insert("c"));
        assert_eq!(seen.len(), 2);
        // "a" a été oubliée, "b" et "c" sont toujours là.
        assert!(!seen.check_and_insert("c"));
        assert!(!seen.check_and_insert("b"));
        assert!(seen.check_and_insert("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_signature_is_forgotten() {
        let seen = SeenSignatures::new(100, Duration::from_secs(30));
        assert!(seen.check_and_insert("old"));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!seen.check_and_insert("old"));
        assert!(seen.check_and_insert("young"));

        tokio::time::advance(Duration::from_secs(25)).await;
        assert!(seen.check_and_insert("old"));
        assert!(!seen.check_and_insert("young"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_admit_exactly_one() {
        let seen = Arc::new(SeenSignatures::new(1_000, Duration::from_secs(60)));
        let handles: Vec<_> = (0..64)
            .map(|_| {
                let seen = seen.clone();
                tokio::spawn(async move { seen.check_and_insert("same-signature") })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }
}
