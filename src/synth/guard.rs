//! Cycle breaker for self-referential and mutually-referential models.
use std::collections::HashMap;

use crate::config::GuardPolicy;

/// Visit counts per type name for one synthesis call. Created fresh for
/// every top-level call and dropped with it.
#[derive(Debug)]
pub struct NavigationGuard {
    visits: HashMap<String, u32>,
    bound: u32,
    policy: GuardPolicy,
}

impl NavigationGuard {
    pub fn new(bound: u32, policy: GuardPolicy) -> Self {
        Self { visits: HashMap::new(), bound, policy }
    }

    /// Record a visit to `type_name`. Returns `false` once the count exceeds
    /// the bound; the caller must not expand the type then. Every `enter`
    /// is paired with a `leave`, allowed or not.
    pub fn enter(&mut self, type_name: &str) -> bool {
        let count = self.visits.entry(type_name.to_string()).or_insert(0);
        *count += 1;
        *count <= self.bound
    }

    pub fn leave(&mut self, type_name: &str) {
        if self.policy == GuardPolicy::Cumulative {
            return;
        }
        if let Some(count) = self.visits.get_mut(type_name) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn visits(&self, type_name: &str) -> u32 {
        self.visits.get(type_name).copied().unwrap_or(0)
    }
}
