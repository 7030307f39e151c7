//! Per-run dependency bookkeeping shared by [`Effect`](super::Effect) and
//! [`Computed`](super::Computed).
//!
//! Each run collects the deps it reads into a fresh set. A dep is subscribed
//! to only the first time it is seen in a run, and only if the previous run
//! had not already subscribed to it. When the run finishes, deps that were
//! read last time but not this time are handed back so the owner can
//! unsubscribe from them.

use std::collections::HashSet;

use super::dep::{Dep, DepId};

#[derive(Default)]
pub(crate) struct DepTracker {
    deps: Vec<Dep>,
    dep_ids: HashSet<DepId>,
    new_deps: Vec<Dep>,
    new_dep_ids: HashSet<DepId>,
}

impl DepTracker {
    /// Record a read. Returns true when the owner should subscribe.
    pub(crate) fn record(&mut self, dep: &Dep) -> bool {
        let id = dep.id();
        if !self.new_dep_ids.insert(id) {
            return false;
        }
        self.new_deps.push(dep.clone());
        !self.dep_ids.contains(&id)
    }

    /// Close the current run. Returns the deps that are no longer read.
    pub(crate) fn finish(&mut self) -> Vec<Dep> {
        let stale = self
            .deps
            .drain(..)
            .filter(|dep| !self.new_dep_ids.contains(&dep.id()))
            .collect();

        self.deps = std::mem::take(&mut self.new_deps);
        self.dep_ids = std::mem::take(&mut self.new_dep_ids);
        stale
    }

    /// Forget everything. Returns every dep that was subscribed.
    pub(crate) fn clear(&mut self) -> Vec<Dep> {
        self.dep_ids.clear();
        self.new_deps.clear();
        self.new_dep_ids.clear();
        std::mem::take(&mut self.deps)
    }

    /// Deps collected by the last completed run.
    pub(crate) fn deps(&self) -> &[Dep] {
        &self.deps
    }
}
