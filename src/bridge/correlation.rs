//! Correlation identifiers pairing a published request with its reply.

use uuid::Uuid;

/// Random 128-bit (UUID v4) token, unique per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Whether `candidate` (as carried on a delivery) is this ID.
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        candidate
            .and_then(|c| Uuid::parse_str(c).ok())
            .is_some_and(|uuid| uuid == self.0)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn matches_own_string_form() {
        let id = CorrelationId::new();
        let wire = id.to_string();
        assert!(id.matches(Some(&wire)));
        assert!(id.matches(Some(&wire.to_uppercase())));
        assert!(!id.matches(Some(&CorrelationId::new().to_string())));
        assert!(!id.matches(Some("20240101120000.000001")));
        assert!(!id.matches(None));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ids_are_distinct() {
        let tasks: Vec<_> = (0..2000)
            .map(|_| tokio::spawn(async { CorrelationId::new() }))
            .collect();

        let mut seen = HashSet::new();
        for task in tasks {
            assert!(seen.insert(task.await.unwrap()), "duplicate correlation id");
        }
        assert_eq!(seen.len(), 2000);
    }
}
