/*!
 * Tunable Constants
 * Central knobs for the wait machinery
 */

/// Spin-loop hints issued between passes of the all-or-nothing lock sweep
/// when a composite wait claims its full event set. A pass that hits a held
/// lock releases everything and retries; the hints give the holder a chance
/// to drain before the next pass.
pub const CLAIM_BACKOFF_SPINS: u32 = 32;
