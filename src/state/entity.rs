//! Entity freshness records and the declarative dependency table.
//!
//! Every fetched or derived entity owns one freshness record. An entity may
//! only be `up_to_date` when everything it causally depends on is; the sync
//! orchestrator enforces this by walking the dependency table in order and
//! cascading invalidation on external events.

use serde::{Deserialize, Serialize};

/// Lifecycle of a data entity: `obsolete -> loading -> {up_to_date, failed}`,
/// back to `obsolete` on invalidating events or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessStatus {
    Obsolete,
    Loading,
    UpToDate,
    Failed,
}

/// Freshness record for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freshness {
    pub status: FreshnessStatus,
    pub error: Option<String>,
}

impl Default for Freshness {
    fn default() -> Self {
        Self::obsolete()
    }
}

impl Freshness {
    pub fn obsolete() -> Self {
        Self {
            status: FreshnessStatus::Obsolete,
            error: None,
        }
    }

    pub fn up_to_date() -> Self {
        Self {
            status: FreshnessStatus::UpToDate,
            error: None,
        }
    }

    /// Invalidate; clears any stored error.
    pub fn mark_obsolete(&mut self) {
        self.status = FreshnessStatus::Obsolete;
        self.error = None;
    }

    pub fn begin_loading(&mut self) {
        self.status = FreshnessStatus::Loading;
        self.error = None;
    }

    pub fn complete(&mut self) {
        self.status = FreshnessStatus::UpToDate;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = FreshnessStatus::Failed;
        self.error = Some(message.into());
    }

    pub fn is_up_to_date(&self) -> bool {
        self.status == FreshnessStatus::UpToDate
    }

    /// Stale entities need a fetch: anything not currently `up_to_date`.
    pub fn is_stale(&self) -> bool {
        !self.is_up_to_date()
    }
}

/// The data entities tracked by the staleness state machine. Per-user
/// entities (`UserSessions`, `UserDerived`) have one record per tracked user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    KnownUsers,
    Buildings,
    PopulationSessions,
    UserSessions,
    UserDerived,
    Overlap,
    Simulation,
}

impl Entity {
    /// Entities this entity causally depends on. The sync orchestrator
    /// consults this table instead of burying the ordering in conditionals.
    pub fn dependencies(self) -> &'static [Entity] {
        match self {
            Entity::KnownUsers => &[],
            Entity::Buildings => &[],
            Entity::PopulationSessions => &[],
            Entity::UserSessions => &[Entity::KnownUsers],
            Entity::UserDerived => {
                &[Entity::PopulationSessions, Entity::UserSessions, Entity::Buildings]
            }
            Entity::Overlap => &[Entity::PopulationSessions, Entity::UserDerived],
            Entity::Simulation => &[],
        }
    }

    /// Canonical synchronization order; overlap settles last.
    pub const SYNC_ORDER: [Entity; 6] = [
        Entity::KnownUsers,
        Entity::Buildings,
        Entity::PopulationSessions,
        Entity::UserSessions,
        Entity::UserDerived,
        Entity::Overlap,
    ];
}

#[cfg(test)]
mod tests {
    use super::{Entity, Freshness, FreshnessStatus};

    #[test]
    fn test_freshness_lifecycle() {
        let mut freshness = Freshness::obsolete();
        assert!(freshness.is_stale());
        freshness.begin_loading();
        assert_eq!(freshness.status, FreshnessStatus::Loading);
        freshness.complete();
        assert!(freshness.is_up_to_date());
        freshness.fail("connection refused");
        assert_eq!(freshness.status, FreshnessStatus::Failed);
        assert_eq!(freshness.error.as_deref(), Some("connection refused"));
        freshness.mark_obsolete();
        assert_eq!(freshness.error, None);
    }

    #[test]
    fn test_sync_order_respects_dependency_table() {
        let order = Entity::SYNC_ORDER;
        for (i, entity) in order.iter().enumerate() {
            for dep in entity.dependencies() {
                let dep_pos = order
                    .iter()
                    .position(|e| e == dep)
                    .expect("dependency listed in sync order");
                assert!(
                    dep_pos < i,
                    "{:?} scheduled before its dependency {:?}",
                    entity,
                    dep
                );
            }
        }
    }
}
