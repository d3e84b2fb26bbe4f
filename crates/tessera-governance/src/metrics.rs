//! Prometheus metrics for the governance crate
//!
//! Tracks the whitelist lifecycle and epoch allocation voting.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter, IntCounterVec,
    IntGauge,
};

// ========== Whitelist lifecycle ==========

/// Candidate markets submitted for whitelisting
pub static LENDINGS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tessera_governance_lendings_submitted_total",
        "Total lending markets submitted for whitelisting"
    )
    .unwrap()
});

/// Markets currently in the active voting window
pub static ACTIVE_LENDINGS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "tessera_governance_active_lendings",
        "Number of lending proposals currently active"
    )
    .unwrap()
});

/// Proposal status transitions
pub static STATUS_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tessera_governance_status_transitions_total",
        "Total lending proposal status transitions",
        &["from_status", "to_status"]
    )
    .unwrap()
});

/// Whitelist votes cast
pub static WHITELIST_VOTES_CAST: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tessera_governance_whitelist_votes_cast_total",
        "Total whitelist votes cast, one per lock and weight pair"
    )
    .unwrap()
});

/// Parameter changes rejected for lack of admin rights
pub static UNAUTHORIZED_REJECTIONS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tessera_governance_unauthorized_rejections_total",
        "Total operations rejected because the caller is not the admin"
    )
    .unwrap()
});

// ========== Epoch allocation ==========

/// Allocation votes cast
pub static ALLOCATION_VOTES_CAST: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tessera_governance_allocation_votes_cast_total",
        "Total allocation votes cast, one per market and weight pair"
    )
    .unwrap()
});
