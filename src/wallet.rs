//! Lease wallet - the client-side half of the protocol.
//!
//! Holds the leases this process owns, hands out newer claims for each
//! command it issues, and retires claims the authoritative service reports
//! as stale. One wallet per robot connection; same locking discipline as the
//! validator.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::lease::Lease;
use crate::types::{Error, Result};
use crate::validator::{LeaseUseResult, LeaseUseStatus};

#[derive(Debug, Clone)]
struct WalletEntry {
    lease: Lease,
    acquired_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct WalletState {
    entries: HashMap<String, WalletEntry>,
}

/// Per-process store of owned leases.
#[derive(Debug)]
pub struct LeaseWallet {
    client_name: String,
    state: Mutex<WalletState>,
}

impl LeaseWallet {
    /// Create an empty wallet with a generated client name.
    pub fn new() -> Self {
        let client_name = format!(
            "wallet-{}",
            &uuid::Uuid::new_v4().simple().to_string()[..16]
        );
        Self::with_client_name(client_name)
    }

    pub fn with_client_name(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            state: Mutex::new(WalletState::default()),
        }
    }

    /// The name this wallet appends to client chains it takes ownership of.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Store a lease for its resource, stamping the acquisition time.
    ///
    /// If the lease does not already carry this wallet's client name, the
    /// wallet takes ownership by delegating it to itself: the stored lease
    /// is a sublease carrying this wallet's name.
    pub fn add(&self, lease: impl Into<Lease>) {
        let lease = lease.into();
        let owned = if lease.client_names().iter().any(|n| n == &self.client_name) {
            lease
        } else {
            lease.create_sublease(self.client_name.as_str())
        };
        tracing::debug!(
            "wallet stored lease: resource={}, sequence={:?}",
            owned.resource(),
            owned.sequence()
        );
        self.locked().entries.insert(
            owned.resource().to_string(),
            WalletEntry {
                lease: owned,
                acquired_at: Utc::now(),
            },
        );
    }

    /// The lease currently held for `resource`, if any.
    pub fn get_lease(&self, resource: &str) -> Option<Lease> {
        self.locked().entries.get(resource).map(|e| e.lease.clone())
    }

    /// When the lease held for `resource` was acquired.
    pub fn acquired_at(&self, resource: &str) -> Option<DateTime<Utc>> {
        self.locked().entries.get(resource).map(|e| e.acquired_at)
    }

    /// Issue the next claim for `resource`: the stored lease's
    /// [`Lease::create_newer`], which also becomes the stored lease.
    ///
    /// Asking to advance a resource this wallet does not hold is a caller
    /// bug at the API boundary, reported as [`Error::NotFound`].
    pub fn advance(&self, resource: &str) -> Result<Lease> {
        let mut state = self.locked();
        let entry = state
            .entries
            .get_mut(resource)
            .ok_or_else(|| Error::not_found(format!("no lease held for resource {resource}")))?;
        let newer = entry.lease.create_newer();
        entry.lease = newer.clone();
        Ok(newer)
    }

    /// Drop and return the lease held for `resource`.
    pub fn remove(&self, resource: &str) -> Option<Lease> {
        self.locked().entries.remove(resource).map(|e| e.lease)
    }

    /// Resources this wallet currently holds leases for, sorted.
    pub fn resources(&self) -> Vec<String> {
        let mut resources: Vec<String> = self.locked().entries.keys().cloned().collect();
        resources.sort();
        resources
    }

    /// Apply an observed lease-use result: retire the stored lease when the
    /// service reports this wallet's claim as stale. OK and Unknown results,
    /// and resources the wallet does not hold, are no-ops.
    pub fn on_lease_use_result(&self, result: &LeaseUseResult) {
        match result.status {
            LeaseUseStatus::Older | LeaseUseStatus::WrongEpoch => {}
            _ => return,
        }
        let resource = result.attempted_lease.resource();
        if self.locked().entries.remove(resource).is_some() {
            tracing::debug!(
                "wallet retired stale lease: resource={}, status={:?}",
                resource,
                result.status
            );
        }
    }

    /// A poisoned mutex means a thread panicked inside this module; that is
    /// an internal bug, and propagating the panic is intentional.
    #[allow(clippy::expect_used)]
    fn locked(&self) -> MutexGuard<'_, WalletState> {
        self.state.lock().expect("lease wallet state mutex poisoned")
    }
}

impl Default for LeaseWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::LeaseRecord;

    fn lease(sequence: Vec<u32>) -> Lease {
        Lease::new("body", "e1", sequence)
    }

    #[test]
    fn add_takes_ownership_via_sublease() {
        let wallet = LeaseWallet::with_client_name("wallet-test");
        wallet.add(lease(vec![3]).with_client_name("upstream"));

        let held = wallet.get_lease("body").expect("held");
        assert_eq!(held.sequence(), &[3, 0]);
        assert_eq!(held.client_names(), &["upstream", "wallet-test"]);
        assert!(wallet.acquired_at("body").is_some());
    }

    #[test]
    fn add_keeps_leases_already_owned() {
        let wallet = LeaseWallet::with_client_name("wallet-test");
        let owned = lease(vec![3, 0]).with_client_name("wallet-test");
        wallet.add(owned.clone());
        assert_eq!(wallet.get_lease("body"), Some(owned));
    }

    #[test]
    fn advance_issues_and_stores_newer_claims() {
        let wallet = LeaseWallet::with_client_name("wallet-test");
        wallet.add(lease(vec![3]).with_client_name("wallet-test"));

        let first = wallet.advance("body").expect("held");
        assert_eq!(first.sequence(), &[4]);
        let second = wallet.advance("body").expect("held");
        assert_eq!(second.sequence(), &[5]);
        assert_eq!(wallet.get_lease("body"), Some(second));
    }

    #[test]
    fn advance_of_unheld_resource_is_an_error() {
        let wallet = LeaseWallet::with_client_name("wallet-test");
        let err = wallet.advance("body").expect_err("nothing held");
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn stale_result_retires_the_stored_lease() {
        let wallet = LeaseWallet::with_client_name("wallet-test");
        wallet.add(lease(vec![3]).with_client_name("wallet-test"));

        let result = LeaseUseResult {
            status: LeaseUseStatus::Older,
            attempted_lease: lease(vec![3]),
            previous_lease: None,
            latest_known_lease: Some(lease(vec![9])),
            latest_resources: vec![],
        };
        wallet.on_lease_use_result(&result);
        assert!(wallet.get_lease("body").is_none());
    }

    #[test]
    fn ok_and_unknown_results_are_no_ops() {
        let wallet = LeaseWallet::with_client_name("wallet-test");
        wallet.add(lease(vec![3]).with_client_name("wallet-test"));

        for status in [LeaseUseStatus::Ok, LeaseUseStatus::Unknown] {
            let result = LeaseUseResult {
                status,
                attempted_lease: lease(vec![3]),
                previous_lease: None,
                latest_known_lease: None,
                latest_resources: vec![],
            };
            wallet.on_lease_use_result(&result);
            assert!(wallet.get_lease("body").is_some());
        }
    }

    #[test]
    fn wire_records_are_accepted_transparently() {
        let wallet = LeaseWallet::with_client_name("wallet-test");
        wallet.add(LeaseRecord {
            resource: "arm".to_string(),
            epoch: "e1".to_string(),
            sequence: vec![1],
            client_names: vec!["wallet-test".to_string()],
        });
        assert_eq!(wallet.resources(), ["arm"]);
    }

    #[test]
    fn generated_client_names_are_distinct() {
        let a = LeaseWallet::new();
        let b = LeaseWallet::new();
        assert!(a.client_name().starts_with("wallet-"));
        assert_ne!(a.client_name(), b.client_name());
    }
}
