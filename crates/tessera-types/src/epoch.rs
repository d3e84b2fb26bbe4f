//! Weekly epoch arithmetic.
//!
//! Epochs are fixed seven-day windows aligned to the Unix week, which
//! starts Thursday 00:00 UTC. Voting power consumption, market tallies,
//! and emission minting are all keyed by the epoch start timestamp, so
//! a new epoch begins from zero-valued records without any explicit
//! rollover step.

/// Seconds in one epoch (seven days).
pub const EPOCH_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Start of the epoch containing `ts` (unix seconds).
pub fn epoch_start(ts: i64) -> i64 {
    ts - ts.rem_euclid(EPOCH_SECONDS)
}

/// Start of the epoch after the one containing `ts`.
pub fn next_epoch_start(ts: i64) -> i64 {
    epoch_start(ts) + EPOCH_SECONDS
}
