//! Snowfall threshold matching.

/// Whether a contract with `threshold_inches` is owed service for a reading
/// of `snowfall_inches`.
///
/// The comparison is inclusive. A reading of zero never matches, even a
/// contract whose threshold is also zero.
pub fn threshold_met(threshold_inches: f64, snowfall_inches: f64) -> bool {
    snowfall_inches > 0.0 && threshold_inches <= snowfall_inches
}
