//! Uniqueness pools for generated identifiers
//!
//! A `NameRegistry` is shared by every generator taking part in one run so
//! that, for example, an OCP-on-AWS and an OCP-on-Azure fixture built in the
//! same invocation never reuse a namespace or resource name. Tests create a
//! fresh registry each.

use std::collections::HashSet;

/// The independent uniqueness pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamePool {
    Namespaces,
    Resources,
    Accounts,
}

/// Previously emitted names, one set per pool
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    namespaces: HashSet<String>,
    resources: HashSet<String>,
    accounts: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&self, pool: NamePool) -> &HashSet<String> {
        match pool {
            NamePool::Namespaces => &self.namespaces,
            NamePool::Resources => &self.resources,
            NamePool::Accounts => &self.accounts,
        }
    }

    fn pool_mut(&mut self, pool: NamePool) -> &mut HashSet<String> {
        match pool {
            NamePool::Namespaces => &mut self.namespaces,
            NamePool::Resources => &mut self.resources,
            NamePool::Accounts => &mut self.accounts,
        }
    }

    pub fn contains(&self, pool: NamePool, name: &str) -> bool {
        self.pool(pool).contains(name)
    }

    /// Record `name` in `pool`. Returns false if it was already taken.
    pub fn claim(&mut self, pool: NamePool, name: impl Into<String>) -> bool {
        self.pool_mut(pool).insert(name.into())
    }

    /// Number of names recorded in `pool`
    pub fn len(&self, pool: NamePool) -> usize {
        self.pool(pool).len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.resources.is_empty() && self.accounts.is_empty()
    }

    /// Call `candidate` with an increasing attempt number until it yields a
    /// name not yet in `pool`, then claim and return it.
    pub fn claim_unique<F>(&mut self, pool: NamePool, mut candidate: F) -> String
    where
        F: FnMut(u32) -> String,
    {
        let mut attempt = 0;
        loop {
            let name = candidate(attempt);
            if self.claim(pool, name.clone()) {
                return name;
            }
            attempt = attempt.saturating_add(1);
        }
    }
}
