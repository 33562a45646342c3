use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Produces identifiers for newly created records.
///
/// Injected into services alongside the `Clock` so no module-level counter
/// exists. Clones of a `Sequential` generator share one counter.
#[derive(Debug, Clone, Default)]
pub enum IdGenerator {
    #[default]
    Uuid,
    Sequential(Arc<AtomicU64>),
}

impl IdGenerator {
    #[must_use]
    pub fn uuid() -> Self {
        Self::Uuid
    }

    /// Counter starting at 1; intended for tests and seeds.
    #[must_use]
    pub fn sequential() -> Self {
        Self::Sequential(Arc::new(AtomicU64::new(1)))
    }

    /// Returns the next raw identifier, prefixed for sequential ids
    /// (`enrollment-1`, `lesson-2`, ...).
    #[must_use]
    pub fn next(&self, prefix: &str) -> String {
        match self {
            IdGenerator::Uuid => Uuid::new_v4().to_string(),
            IdGenerator::Sequential(counter) => {
                let n = counter.fetch_add(1, Ordering::Relaxed);
                format!("{prefix}-{n}")
            }
        }
    }
}
