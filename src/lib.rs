//! # Lease Core - Hierarchical Lease Arbitration
//!
//! Epoch-fenced mutual exclusion over shared, nested hardware resources
//! (a whole robot body vs. one limb), providing:
//! - Lease value type and the comparison algebra ordering competing claims
//! - Static resource hierarchy mapping a claim to the leaves it covers
//! - Mutex-protected validator arbitrating and committing claims
//! - Response processor converging independent validators from observed
//!   RPC traffic
//! - Client-side wallet holding and advancing owned leases
//!
//! ## Architecture
//!
//! There is no central sequencer: each process owns one validator, and
//! validators converge by watching each other's traffic:
//! ```text
//!   incoming claims ──→ ┌────────────────────────────────┐
//!                       │        LeaseValidator          │
//!                       │  ┌──────────┐ ┌─────────────┐  │
//!                       │  │ Resource │ │ active lease│  │
//!                       │  │ Hierarchy│ │ map (mutex) │  │
//!                       │  └──────────┘ └─────────────┘  │
//!                       └───────────────▲────────────────┘
//!                                       │
//!   observed responses ──→ LeaseValidatorResponseProcessor
//! ```
//!
//! Every acceptance decision is a status code, never an error: an RPC
//! servicer embedding this crate can always produce a well-formed response.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod hierarchy;
pub mod lease;
pub mod processor;
pub mod types;
pub mod validator;
pub mod wallet;
pub mod wire;

// Internal utilities
pub mod observability;

pub use hierarchy::ResourceHierarchy;
pub use lease::{CompareResult, Lease};
pub use processor::{LeaseResponse, LeaseValidatorResponseProcessor};
pub use types::{Config, Error, Result};
pub use validator::{LeaseUseResult, LeaseUseStatus, LeaseValidator, ResourceTreeSource};
pub use wallet::LeaseWallet;
