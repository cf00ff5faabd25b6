use std::sync::{Mutex, PoisonError};

/// Labels offered when a session starts with no configured catalog.
pub const DEFAULT_TAGS: &[&str] = &[
    "Strong Candidate",
    "Needs Review",
    "Follow Up",
    "Interview Scheduled",
    "Culture Fit",
];

/// Session-local catalog of known labels. Grows as labels are typed or found on
/// records; never shrinks. Shared between boards through an `Arc`.
#[derive(Debug)]
pub struct TagRegistry {
    tags: Mutex<Vec<String>>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_TAGS.iter().copied())
    }
}

impl TagRegistry {
    pub fn with_defaults<I, T>(defaults: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let registry = Self {
            tags: Mutex::new(Vec::new()),
        };
        for tag in defaults {
            registry.ensure(tag);
        }
        registry
    }

    pub fn known(&self) -> Vec<String> {
        self.tags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Add `tag` if absent. Returns `true` when the catalog grew.
    pub fn ensure(&self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return false;
        }
        let mut tags = self.tags.lock().unwrap_or_else(PoisonError::into_inner);
        if tags.iter().any(|known| *known == tag) {
            return false;
        }
        tags.push(tag);
        true
    }

    /// Fold a record's labels into the catalog. Returns how many were new.
    pub fn merge(&self, record_tags: &[String]) -> usize {
        record_tags
            .iter()
            .filter(|tag| self.ensure(tag.as_str()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.tags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
