//! Payout Estimator
//!
//! Rough seller payout range shown on the public submission form. Resale
//! value starts from a per-category base range, scales by condition, gets
//! an age bonus, and the seller share is 60% of that.

const PAYOUT_SHARE: f64 = 0.6;

fn base_range(item_type: &str) -> (f64, f64) {
    match item_type {
        "hoodie" => (25.0, 45.0),
        "jacket" => (40.0, 90.0),
        "tshirt" => (15.0, 35.0),
        "jersey" => (30.0, 70.0),
        "hat" => (10.0, 25.0),
        _ => (15.0, 40.0),
    }
}

fn condition_multiplier(condition: &str) -> f64 {
    match condition {
        "excellent" => 1.0,
        "good" => 0.8,
        "fair" => 0.6,
        "poor" => 0.4,
        _ => 0.8,
    }
}

fn era_bonus(era: &str) -> f64 {
    match era {
        "2020s" => 0.0,
        "2010s" => 5.0,
        "2000s" => 10.0,
        "1990s" => 15.0,
        "1980s" => 20.0,
        "older" => 25.0,
        _ => 0.0,
    }
}

/// Estimated payout bounds in whole dollars.
pub fn payout_range(item_type: &str, condition: &str, era: &str) -> (i64, i64) {
    let (low, high) = base_range(item_type);
    let multiplier = condition_multiplier(condition);
    let bonus = era_bonus(era);
    let payout = |base: f64| ((base * multiplier + bonus) * PAYOUT_SHARE).round() as i64;
    (payout(low), payout(high))
}

/// Display form used on the submission card, e.g. `$12 - $22`.
pub fn payout_display(item_type: &str, condition: &str, era: &str) -> String {
    let (low, high) = payout_range(item_type, condition, era);
    format!("${low} - ${high}")
}
