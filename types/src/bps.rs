//! Basis-point arithmetic.
//!
//! Amounts are raw integer base units (u128). Every division truncates: a
//! marginal majority is never rounded up, and a pro-rata share never pays out
//! more than the pool it is drawn from.

/// 10 000 basis points = 100%.
pub const BASIS_POINTS: u32 = 10_000;

/// `amount * bps / 10_000`, truncating. `bps` above 10 000 is capped.
pub fn apply_bps(amount: u128, bps: u32) -> u128 {
    let bps = bps.min(BASIS_POINTS) as u128;
    // Split to avoid overflow on very large amounts.
    let whole = amount / BASIS_POINTS as u128;
    let rest = amount % BASIS_POINTS as u128;
    whole * bps + rest * bps / BASIS_POINTS as u128
}

/// `part * 10_000 / total`, truncating. Zero when `total` is zero.
pub fn ratio_bps(part: u128, total: u128) -> u32 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total);
    match part.checked_mul(BASIS_POINTS as u128) {
        Some(scaled) => (scaled / total) as u32,
        // part and total are both huge; scale total down instead.
        None => (part / (total / BASIS_POINTS as u128).max(1)).min(BASIS_POINTS as u128) as u32,
    }
}

/// `pool * weight / total_weight`, truncating. Zero when `total_weight` is zero.
pub fn pro_rata(pool: u128, weight: u128, total_weight: u128) -> u128 {
    if total_weight == 0 {
        return 0;
    }
    match pool.checked_mul(weight) {
        Some(product) => product / total_weight,
        None => {
            // Fall back to a less precise but overflow-free form.
            let per_unit = pool / total_weight;
            let remainder = pool % total_weight;
            per_unit * weight + remainder.saturating_mul(weight) / total_weight
        }
    }
}
