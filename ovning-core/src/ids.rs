//! ## ovning-core::ids
//! **Prefixed sequential id generation**
//!
//! A shared atomic counter behind a cloneable handle. Ids are deterministic
//! per engine instance, which keeps snapshot sort ties and tests stable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic id generator shared by all stores of one engine instance.
#[derive(Clone, Default)]
pub struct IdGen {
    counter: Arc<AtomicU64>,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id with the given prefix, e.g. `ses_4`.
    pub fn next(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_per_instance() {
        let ids = IdGen::new();
        assert_eq!(ids.next("scn"), "scn_1");
        assert_eq!(ids.next("ses"), "ses_2");
        assert_eq!(ids.next("scn"), "scn_3");
    }

    #[test]
    fn clones_share_the_counter() {
        let ids = IdGen::new();
        let other = ids.clone();
        assert_eq!(ids.next("evt"), "evt_1");
        assert_eq!(other.next("evt"), "evt_2");
    }
}
