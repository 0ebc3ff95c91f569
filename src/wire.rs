//! Wire records ↔ domain conversions.
//!
//! Serde-serializable records mirroring the upstream lease protocol messages,
//! plus conversions between them and the domain types. Lease conversions are
//! `From` in both directions: a malformed record must still become a `Lease`
//! so the validator can inspect it and reject it with a specific status.

use serde::{Deserialize, Serialize};

use crate::hierarchy::ResourceHierarchy;
use crate::lease::Lease;
use crate::validator::{LeaseUseResult, LeaseUseStatus};

/// Raw lease claim as it arrives off the wire.
///
/// All fields default so partially-populated records deserialize cleanly;
/// structural validity is classified later by [`Lease::is_valid`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    #[serde(default)]
    pub resource: String,

    #[serde(default)]
    pub epoch: String,

    #[serde(default)]
    pub sequence: Vec<u32>,

    #[serde(default)]
    pub client_names: Vec<String>,
}

/// Resource nesting tree as published by the authoritative lease service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTreeRecord {
    #[serde(default)]
    pub resource: String,

    #[serde(default)]
    pub children: Vec<ResourceTreeRecord>,
}

/// Lease-use outcome as carried on upstream RPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaseUseRecord {
    #[serde(default)]
    pub status: LeaseUseStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_lease: Option<LeaseRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_lease: Option<LeaseRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_known_lease: Option<LeaseRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latest_resources: Vec<LeaseRecord>,
}

// =============================================================================
// Lease conversions (infallible both ways)
// =============================================================================

impl From<LeaseRecord> for Lease {
    fn from(record: LeaseRecord) -> Lease {
        Lease::from_parts(
            record.resource,
            record.epoch,
            record.sequence,
            record.client_names,
        )
    }
}

impl From<Lease> for LeaseRecord {
    fn from(lease: Lease) -> LeaseRecord {
        LeaseRecord {
            resource: lease.resource().to_string(),
            epoch: lease.epoch().to_string(),
            sequence: lease.sequence().to_vec(),
            client_names: lease.client_names().to_vec(),
        }
    }
}

impl From<&Lease> for LeaseRecord {
    fn from(lease: &Lease) -> LeaseRecord {
        LeaseRecord::from(lease.clone())
    }
}

// =============================================================================
// ResourceHierarchy conversions
// =============================================================================

impl From<ResourceTreeRecord> for ResourceHierarchy {
    fn from(record: ResourceTreeRecord) -> ResourceHierarchy {
        ResourceHierarchy::new(
            record.resource,
            record.children.into_iter().map(ResourceHierarchy::from).collect(),
        )
    }
}

impl From<&ResourceHierarchy> for ResourceTreeRecord {
    fn from(node: &ResourceHierarchy) -> ResourceTreeRecord {
        ResourceTreeRecord {
            resource: node.resource().to_string(),
            children: node.children().iter().map(ResourceTreeRecord::from).collect(),
        }
    }
}

// =============================================================================
// LeaseUseResult conversions (domain -> wire, for embedding in responses)
// =============================================================================

impl From<LeaseUseResult> for LeaseUseRecord {
    fn from(result: LeaseUseResult) -> LeaseUseRecord {
        LeaseUseRecord {
            status: result.status,
            attempted_lease: Some(LeaseRecord::from(result.attempted_lease)),
            previous_lease: result.previous_lease.map(LeaseRecord::from),
            latest_known_lease: result.latest_known_lease.map(LeaseRecord::from),
            latest_resources: result
                .latest_resources
                .into_iter()
                .map(LeaseRecord::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_record_still_converts() {
        // Empty record is constructible as a Lease; validity is a later check.
        let lease = Lease::from(LeaseRecord::default());
        assert!(!lease.is_valid());
    }

    #[test]
    fn lease_record_round_trip() {
        let record = LeaseRecord {
            resource: "body".to_string(),
            epoch: "epoch-1".to_string(),
            sequence: vec![3, 1],
            client_names: vec!["root-client".to_string(), "arm-client".to_string()],
        };
        let lease = Lease::from(record.clone());
        assert_eq!(LeaseRecord::from(lease), record);
    }

    #[test]
    fn tree_record_builds_hierarchy() {
        let record = ResourceTreeRecord {
            resource: "body".to_string(),
            children: vec![
                ResourceTreeRecord {
                    resource: "arm".to_string(),
                    children: vec![],
                },
                ResourceTreeRecord {
                    resource: "mobility".to_string(),
                    children: vec![],
                },
            ],
        };
        let tree = ResourceHierarchy::from(record.clone());
        assert!(tree.has_resource("arm"));
        assert_eq!(ResourceTreeRecord::from(&tree), record);
    }

    #[test]
    fn partial_record_deserializes_with_defaults() {
        let record: LeaseUseRecord = serde_json::from_str(r#"{"status": "OK"}"#)
            .expect("partial record should deserialize");
        assert_eq!(record.status, LeaseUseStatus::Ok);
        assert!(record.latest_known_lease.is_none());
        assert!(record.latest_resources.is_empty());
    }
}
