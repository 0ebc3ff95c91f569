//! Lease validator - the arbiter for competing ownership claims.
//!
//! A mutex-protected map of "most recent accepted lease per resource" plus a
//! pure acceptance function. Every incoming claim is evaluated against the
//! hierarchy-aware aggregate of currently known claims; accepted claims are
//! committed and propagated to every leaf beneath the claimed resource.
//!
//! Outcomes are always status codes, never errors: an RPC servicer calling
//! this module must be able to produce a well-formed response for any input,
//! malformed input included.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hierarchy::ResourceHierarchy;
use crate::lease::{CompareResult, Lease};
use crate::types::{HierarchyConfig, Result};
use crate::wire::ResourceTreeRecord;

#[cfg(test)]
use mockall::automock;

/// Acceptance outcome for one lease claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseUseStatus {
    #[default]
    Unknown,
    Ok,
    /// Valid but superseded: legitimate contention, refresh and retry.
    Older,
    /// The claim belongs to a stale ownership generation.
    WrongEpoch,
    /// Structurally malformed; rejected before any comparison.
    InvalidLease,
    /// Resource unrecognized by the configured hierarchy.
    Unmanaged,
}

/// Full account of one acceptance decision, suitable for embedding in a
/// protocol response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseUseResult {
    pub status: LeaseUseStatus,

    /// The claim that was evaluated, echoed back.
    pub attempted_lease: Lease,

    /// The derived current lease the claim was compared against, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_lease: Option<Lease>,

    /// The lease now on record for the attempted resource, reflecting any
    /// commit this evaluation performed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_known_lease: Option<Lease>,

    /// Current leaf-lease list under the attempted resource (hierarchy mode
    /// only): the finer-grained claims blocking or permitting this request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latest_resources: Vec<Lease>,
}

impl LeaseUseResult {
    fn rejected(status: LeaseUseStatus, attempted_lease: Lease) -> Self {
        Self {
            status,
            attempted_lease,
            previous_lease: None,
            latest_known_lease: None,
            latest_resources: Vec::new(),
        }
    }
}

/// Boundary for the one blocking call this crate consumes: fetching the
/// resource nesting tree from the authoritative lease service at validator
/// construction time.
#[cfg_attr(test, automock)]
pub trait ResourceTreeSource {
    fn fetch_resource_tree(&self, timeout: Duration) -> Result<ResourceTreeRecord>;
}

/// Map state guarded by the validator mutex.
///
/// All helpers that read or write the map are methods on this struct, so they
/// are only reachable through a held [`MutexGuard`] - the locking discipline
/// is enforced by the type system rather than a runtime assertion.
#[derive(Debug, Default)]
struct ValidatorState {
    active_lease_map: HashMap<String, Lease>,
}

impl ValidatorState {
    /// Derive the current lease to compare an incoming claim against.
    ///
    /// With a hierarchy: fold every claimed leaf beneath `resource` into one
    /// aggregate, adopting any candidate that compares senior (OLDER or
    /// SUPER_LEASE) to the running aggregate. The aggregate's epoch comes
    /// from the first claimed leaf in the fold's lexicographic visit order
    /// and is only displaced by a same-epoch senior candidate. Without a
    /// hierarchy: the flat map entry, verbatim.
    fn derive_active_lease(
        &self,
        hierarchy: Option<&ResourceHierarchy>,
        resource: &str,
    ) -> Option<Lease> {
        let Some(tree) = hierarchy else {
            return self.active_lease_map.get(resource).cloned();
        };

        let node = tree.get_hierarchy(resource)?;
        let mut aggregate: Option<Lease> = None;
        for leaf in node.leaf_resources() {
            let Some(candidate) = self.active_lease_map.get(&leaf) else {
                continue;
            };
            match &aggregate {
                None => aggregate = Some(candidate.with_resource(resource)),
                Some(current) => {
                    if matches!(
                        candidate.compare(current, true),
                        CompareResult::Older | CompareResult::SuperLease
                    ) {
                        aggregate = Some(candidate.with_resource(resource));
                    }
                }
            }
        }
        aggregate
    }

    /// Commit an accepted claim: write it for its own resource and, in
    /// hierarchy mode, a resource-renamed copy into every covered leaf.
    fn set_active_lease(&mut self, hierarchy: Option<&ResourceHierarchy>, accepted: &Lease) {
        self.active_lease_map
            .insert(accepted.resource().to_string(), accepted.clone());

        let Some(node) = hierarchy.and_then(|tree| tree.get_hierarchy(accepted.resource()))
        else {
            return;
        };
        for leaf in node.leaf_resources() {
            let renamed = accepted.with_resource(&leaf);
            self.active_lease_map.insert(leaf, renamed);
        }
    }

    /// Snapshot the stored leaf leases under `resource` (hierarchy mode).
    fn leaf_leases(&self, hierarchy: Option<&ResourceHierarchy>, resource: &str) -> Vec<Lease> {
        hierarchy
            .and_then(|tree| tree.get_hierarchy(resource))
            .map(|node| {
                node.leaf_resources()
                    .iter()
                    .filter_map(|leaf| self.active_lease_map.get(leaf).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The arbiter: one validator per RPC-handling context.
///
/// All three entry points serialize on a single process-wide mutex; the
/// whole evaluate-then-commit sequence is one critical section, so
/// concurrent accept attempts on overlapping resources observe exactly one
/// total order. No I/O happens under the lock.
#[derive(Debug)]
pub struct LeaseValidator {
    /// Read-only after construction; authoritative over which resource
    /// names exist when present.
    hierarchy: Option<ResourceHierarchy>,
    state: Mutex<ValidatorState>,
}

impl LeaseValidator {
    /// Create a validator. Without a hierarchy the validator degrades to
    /// flat, non-propagating behavior.
    pub fn new(hierarchy: Option<ResourceHierarchy>) -> Self {
        Self {
            hierarchy,
            state: Mutex::new(ValidatorState::default()),
        }
    }

    /// Create a validator by fetching the resource tree from the
    /// authoritative service.
    ///
    /// A fetch failure is an error only when the configuration requires a
    /// hierarchy; otherwise the validator degrades to flat behavior.
    pub fn fetch(source: &dyn ResourceTreeSource, config: &HierarchyConfig) -> Result<Self> {
        match source.fetch_resource_tree(config.fetch_timeout) {
            Ok(record) => {
                let hierarchy = ResourceHierarchy::from(record);
                tracing::debug!(
                    "resource hierarchy fetched: root={}, leaves={}",
                    hierarchy.resource(),
                    hierarchy.leaf_resources().len()
                );
                Ok(Self::new(Some(hierarchy)))
            }
            Err(err) if config.require_hierarchy => Err(err),
            Err(err) => {
                tracing::warn!(
                    "resource hierarchy unavailable, degrading to flat validation: {}",
                    err
                );
                Ok(Self::new(None))
            }
        }
    }

    pub fn has_hierarchy(&self) -> bool {
        self.hierarchy.is_some()
    }

    /// The most recent claim this process has observed or accepted for
    /// `resource` or an ancestor covering it. `None` means never observed,
    /// or the resource is unrecognized by the configured hierarchy.
    pub fn get_active_lease(&self, resource: &str) -> Option<Lease> {
        self.locked().derive_active_lease(self.hierarchy.as_ref(), resource)
    }

    /// Read-only evaluation of a claim.
    pub fn test_active_lease(
        &self,
        incoming: impl Into<Lease>,
        allow_super_leases: bool,
        allow_different_epoch: bool,
    ) -> LeaseUseResult {
        self.evaluate(incoming.into(), allow_super_leases, allow_different_epoch, false)
    }

    /// Identical evaluation, plus commit when the result is OK.
    pub fn test_and_set_active_lease(
        &self,
        incoming: impl Into<Lease>,
        allow_super_leases: bool,
        allow_different_epoch: bool,
    ) -> LeaseUseResult {
        self.evaluate(incoming.into(), allow_super_leases, allow_different_epoch, true)
    }

    fn evaluate(
        &self,
        incoming: Lease,
        allow_super_leases: bool,
        allow_different_epoch: bool,
        commit: bool,
    ) -> LeaseUseResult {
        let hierarchy = self.hierarchy.as_ref();
        let mut state = self.locked();

        if !incoming.is_valid() {
            return LeaseUseResult::rejected(LeaseUseStatus::InvalidLease, incoming);
        }
        if let Some(tree) = hierarchy {
            if !tree.has_resource(incoming.resource()) {
                tracing::debug!(
                    "lease rejected: resource={} not in hierarchy",
                    incoming.resource()
                );
                return LeaseUseResult::rejected(LeaseUseStatus::Unmanaged, incoming);
            }
        }

        let previous = state.derive_active_lease(hierarchy, incoming.resource());
        let status = match &previous {
            // Unclaimed resource (or subtree): accept unconditionally.
            None => LeaseUseStatus::Ok,
            Some(current) => match incoming.compare(current, false) {
                CompareResult::DifferentEpochs => {
                    if allow_different_epoch {
                        LeaseUseStatus::Ok
                    } else {
                        LeaseUseStatus::WrongEpoch
                    }
                }
                // A coarser ancestor claim must never silently override an
                // already-delegated, more specific descendant claim.
                CompareResult::SuperLease => {
                    if allow_super_leases {
                        LeaseUseStatus::Ok
                    } else {
                        LeaseUseStatus::Older
                    }
                }
                CompareResult::Older => LeaseUseStatus::Older,
                CompareResult::SubLease | CompareResult::Same | CompareResult::Newer => {
                    LeaseUseStatus::Ok
                }
                CompareResult::DifferentResources => {
                    // The derived current lease shares the incoming resource
                    // by construction.
                    debug_assert!(false, "derived lease resource mismatch");
                    LeaseUseStatus::Unknown
                }
            },
        };

        if commit && status == LeaseUseStatus::Ok {
            state.set_active_lease(hierarchy, &incoming);
            tracing::debug!(
                "lease accepted: resource={}, epoch={}, sequence={:?}",
                incoming.resource(),
                incoming.epoch(),
                incoming.sequence()
            );
        } else if status != LeaseUseStatus::Ok {
            tracing::debug!(
                "lease rejected: resource={}, status={:?}",
                incoming.resource(),
                status
            );
        }

        let latest_known_lease = state.derive_active_lease(hierarchy, incoming.resource());
        let latest_resources = state.leaf_leases(hierarchy, incoming.resource());

        LeaseUseResult {
            status,
            attempted_lease: incoming,
            previous_lease: previous,
            latest_known_lease,
            latest_resources,
        }
    }

    /// A poisoned mutex means a thread panicked inside this module; that is
    /// an internal bug, and propagating the panic is intentional.
    #[allow(clippy::expect_used)]
    fn locked(&self) -> MutexGuard<'_, ValidatorState> {
        self.state.lock().expect("lease validator state mutex poisoned")
    }
}
