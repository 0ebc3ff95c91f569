//! Response processor - opportunistic convergence between validators.
//!
//! Independent services each run their own validator; there is no shared
//! store. The processor inspects the lease-use results an authoritative
//! upstream attaches to its own RPC responses as they pass back through this
//! process, and advances the local validator toward every
//! `latest_known_lease` it sees. Advancing is unconditional on the original
//! request's own outcome: the latest known lease is, by construction, the
//! newest information the authoritative source has.

use std::sync::Arc;

use crate::validator::{LeaseUseStatus, LeaseValidator};
use crate::wire::LeaseUseRecord;

/// Introspection surface for outgoing RPC responses.
///
/// Most responses carry no lease information at all; both accessors default
/// to "nothing", and a response type opts in per field. The singular result
/// is preferred when both are present.
pub trait LeaseResponse {
    fn lease_use_result(&self) -> Option<&LeaseUseRecord> {
        None
    }

    fn lease_use_results(&self) -> &[LeaseUseRecord] {
        &[]
    }
}

/// Feeds lease information observed in RPC responses back into a validator.
#[derive(Debug)]
pub struct LeaseValidatorResponseProcessor {
    validator: Arc<LeaseValidator>,
}

impl LeaseValidatorResponseProcessor {
    pub fn new(validator: Arc<LeaseValidator>) -> Self {
        Self { validator }
    }

    /// Absorb any lease-use results the response carries. A response with no
    /// lease fields is not an error; nothing happens.
    pub fn mutate(&self, response: &dyn LeaseResponse) {
        if let Some(record) = response.lease_use_result() {
            self.absorb(record);
            return;
        }
        for record in response.lease_use_results() {
            self.absorb(record);
        }
    }

    fn absorb(&self, record: &LeaseUseRecord) {
        if record.status == LeaseUseStatus::Unknown {
            return;
        }
        // A result without a latest-known lease carries no information to
        // advance toward.
        let Some(latest) = record.latest_known_lease.clone() else {
            return;
        };
        let outcome = self.validator.test_and_set_active_lease(latest, false, false);
        tracing::debug!(
            "observed lease absorbed: resource={}, status={:?}",
            outcome.attempted_lease.resource(),
            outcome.status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::Lease;
    use crate::wire::LeaseRecord;

    #[derive(Debug, Default)]
    struct BareResponse;

    impl LeaseResponse for BareResponse {}

    #[derive(Debug)]
    struct CommandResponse {
        lease_use_result: LeaseUseRecord,
    }

    impl LeaseResponse for CommandResponse {
        fn lease_use_result(&self) -> Option<&LeaseUseRecord> {
            Some(&self.lease_use_result)
        }
    }

    #[derive(Debug)]
    struct BatchResponse {
        lease_use_results: Vec<LeaseUseRecord>,
    }

    impl LeaseResponse for BatchResponse {
        fn lease_use_results(&self) -> &[LeaseUseRecord] {
            &self.lease_use_results
        }
    }

    fn record(status: LeaseUseStatus, latest: Option<LeaseRecord>) -> LeaseUseRecord {
        LeaseUseRecord {
            status,
            latest_known_lease: latest,
            ..LeaseUseRecord::default()
        }
    }

    fn latest(resource: &str, sequence: Vec<u32>) -> LeaseRecord {
        LeaseRecord {
            resource: resource.to_string(),
            epoch: "e1".to_string(),
            sequence,
            client_names: vec![],
        }
    }

    #[test]
    fn response_without_lease_fields_is_a_no_op() {
        let validator = Arc::new(LeaseValidator::new(None));
        let processor = LeaseValidatorResponseProcessor::new(Arc::clone(&validator));

        processor.mutate(&BareResponse);
        assert!(validator.get_active_lease("body").is_none());
    }

    #[test]
    fn singular_result_advances_the_validator() {
        let validator = Arc::new(LeaseValidator::new(None));
        let processor = LeaseValidatorResponseProcessor::new(Arc::clone(&validator));

        let response = CommandResponse {
            lease_use_result: record(LeaseUseStatus::Ok, Some(latest("body", vec![7]))),
        };
        processor.mutate(&response);
        assert_eq!(
            validator.get_active_lease("body"),
            Some(Lease::new("body", "e1", vec![7]))
        );
    }

    #[test]
    fn advance_is_unconditional_on_the_attempted_outcome() {
        let validator = Arc::new(LeaseValidator::new(None));
        let processor = LeaseValidatorResponseProcessor::new(Arc::clone(&validator));

        // The upstream rejected the original request as stale, but its
        // latest-known lease is still the newest information available.
        let response = CommandResponse {
            lease_use_result: record(LeaseUseStatus::Older, Some(latest("body", vec![4]))),
        };
        processor.mutate(&response);
        assert_eq!(
            validator.get_active_lease("body"),
            Some(Lease::new("body", "e1", vec![4]))
        );
    }

    #[test]
    fn unknown_status_and_missing_lease_are_skipped() {
        let validator = Arc::new(LeaseValidator::new(None));
        let processor = LeaseValidatorResponseProcessor::new(Arc::clone(&validator));

        let response = BatchResponse {
            lease_use_results: vec![
                record(LeaseUseStatus::Unknown, Some(latest("body", vec![9]))),
                record(LeaseUseStatus::Ok, None),
            ],
        };
        processor.mutate(&response);
        assert!(validator.get_active_lease("body").is_none());
    }

    #[test]
    fn repeated_results_are_absorbed_in_order() {
        let validator = Arc::new(LeaseValidator::new(None));
        let processor = LeaseValidatorResponseProcessor::new(Arc::clone(&validator));

        let response = BatchResponse {
            lease_use_results: vec![
                record(LeaseUseStatus::Ok, Some(latest("body", vec![2]))),
                record(LeaseUseStatus::Ok, Some(latest("arm", vec![5]))),
                // Stale relative to what was just absorbed; rejected, kept.
                record(LeaseUseStatus::Ok, Some(latest("body", vec![1]))),
            ],
        };
        processor.mutate(&response);
        assert_eq!(
            validator.get_active_lease("body"),
            Some(Lease::new("body", "e1", vec![2]))
        );
        assert_eq!(
            validator.get_active_lease("arm"),
            Some(Lease::new("arm", "e1", vec![5]))
        );
    }

    #[test]
    fn stale_observation_cannot_regress_the_validator() {
        let validator = Arc::new(LeaseValidator::new(None));
        let processor = LeaseValidatorResponseProcessor::new(Arc::clone(&validator));
        validator.test_and_set_active_lease(Lease::new("body", "e1", vec![8]), false, false);

        let response = CommandResponse {
            lease_use_result: record(LeaseUseStatus::Ok, Some(latest("body", vec![3]))),
        };
        processor.mutate(&response);
        assert_eq!(
            validator.get_active_lease("body"),
            Some(Lease::new("body", "e1", vec![8]))
        );
    }
}
