//! Lease - one ownership claim and the algebra that orders competing claims.
//!
//! A lease claims control of a named resource within an ownership epoch. The
//! sequence encodes both recency (lexicographic value) and delegation depth
//! (length): sub-leasing appends exactly one counter to an inherited prefix,
//! so a strict-prefix relationship between two same-resource, same-epoch
//! sequences can only arise from an ancestor/descendant delegation chain.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Outcome of ordering two lease claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompareResult {
    /// The claims name unrelated resources and cannot be ordered.
    DifferentResources,
    /// The claims belong to unrelated ownership generations.
    DifferentEpochs,
    Same,
    Older,
    Newer,
    /// `self` is a coarser ancestor claim relative to the other.
    SuperLease,
    /// `self` is a more finely delegated descendant claim of the other.
    SubLease,
}

/// An immutable ownership claim over a named resource.
///
/// Construction never fails: malformed claims must remain inspectable so the
/// validator can reject them with a specific status. Use [`Lease::is_valid`]
/// to classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    resource: String,
    epoch: String,
    sequence: Vec<u32>,
    client_names: Vec<String>,
}

impl Lease {
    /// Create a lease with an empty client chain.
    pub fn new(
        resource: impl Into<String>,
        epoch: impl Into<String>,
        sequence: Vec<u32>,
    ) -> Self {
        Self {
            resource: resource.into(),
            epoch: epoch.into(),
            sequence,
            client_names: Vec::new(),
        }
    }

    /// Create a lease from all four wire fields.
    pub fn from_parts(
        resource: String,
        epoch: String,
        sequence: Vec<u32>,
        client_names: Vec<String>,
    ) -> Self {
        Self {
            resource,
            epoch,
            sequence,
            client_names,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_names.push(name.into());
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    pub fn sequence(&self) -> &[u32] {
        &self.sequence
    }

    pub fn client_names(&self) -> &[String] {
        &self.client_names
    }

    /// A lease is valid iff it names a resource and carries a sequence.
    pub fn is_valid(&self) -> bool {
        !self.sequence.is_empty() && !self.resource.is_empty()
    }

    /// The same claim re-scoped to a different resource name.
    ///
    /// Epoch, sequence, and client chain are unchanged. Used when a claim on
    /// a non-leaf resource implies claims on every leaf beneath it.
    pub fn with_resource(&self, resource: &str) -> Lease {
        Lease {
            resource: resource.to_string(),
            epoch: self.epoch.clone(),
            sequence: self.sequence.clone(),
            client_names: self.client_names.clone(),
        }
    }

    /// The claim a holder issues to supersede its own previous claim:
    /// same resource, epoch, and client chain, last sequence counter
    /// incremented.
    pub fn create_newer(&self) -> Lease {
        let mut sequence = self.sequence.clone();
        if let Some(last) = sequence.last_mut() {
            *last += 1;
        }
        Lease {
            resource: self.resource.clone(),
            epoch: self.epoch.clone(),
            sequence,
            client_names: self.client_names.clone(),
        }
    }

    /// The finer-delegated claim handed to a downstream client: appends one
    /// zero counter to the sequence and the client's name to the chain.
    pub fn create_sublease(&self, client_name: impl Into<String>) -> Lease {
        let mut sequence = self.sequence.clone();
        sequence.push(0);
        let mut client_names = self.client_names.clone();
        client_names.push(client_name.into());
        Lease {
            resource: self.resource.clone(),
            epoch: self.epoch.clone(),
            sequence,
            client_names,
        }
    }

    /// Order this claim against another.
    ///
    /// Pure and total: never panics, for valid or malformed input. Callers
    /// must check [`Lease::is_valid`] first and treat invalid leases as
    /// immediate rejection; comparing across unrelated resources without
    /// `ignore_resources` is reported, not resolved.
    ///
    /// Sequences compare lexicographically, most-significant index first,
    /// over the common prefix. An undisputed common prefix with unequal
    /// lengths is a delegation relationship: the shorter claim is the
    /// super-lease, the longer the sub-lease.
    pub fn compare(&self, other: &Lease, ignore_resources: bool) -> CompareResult {
        if !ignore_resources && self.resource != other.resource {
            return CompareResult::DifferentResources;
        }
        if self.epoch != other.epoch {
            return CompareResult::DifferentEpochs;
        }

        let common = self.sequence.len().min(other.sequence.len());
        for i in 0..common {
            match self.sequence[i].cmp(&other.sequence[i]) {
                Ordering::Less => return CompareResult::Older,
                Ordering::Greater => return CompareResult::Newer,
                Ordering::Equal => {}
            }
        }

        match self.sequence.len().cmp(&other.sequence.len()) {
            Ordering::Equal => CompareResult::Same,
            Ordering::Less => CompareResult::SuperLease,
            Ordering::Greater => CompareResult::SubLease,
        }
    }
}
