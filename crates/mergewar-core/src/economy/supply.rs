//! Timed supply drop.

/// Returns `true` once strictly more than `cooldown_ms` has passed since the
/// last claim.
#[must_use]
pub fn is_claimable(now_ms: f64, last_claim_ms: f64, cooldown_ms: f64) -> bool {
    now_ms - last_claim_ms > cooldown_ms
}

/// Coins paid by a supply drop at `level`.
#[must_use]
pub fn payout(base: u64, per_level: u64, level: u32, gold_multiplier: f64) -> u64 {
    let amount = base + per_level * u64::from(level);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let paid = (amount as f64 * gold_multiplier).floor() as u64;
    paid
}
