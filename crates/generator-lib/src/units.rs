//! Unit conversion constants shared by every generator module
//!
//! All byte quantities use true binary gibibytes (2^30 bytes). Memory and
//! storage bounds are configured in GiB and converted exactly once, here.

/// Bytes in one GiB
pub const GIB_BYTES: u64 = 1 << 30;

/// Seconds in one hour, the OCP reporting interval
pub const HOUR_SECONDS: u32 = 60 * 60;

/// Decimal places kept for sampled CPU core values
pub const CPU_DECIMALS: i32 = 5;

/// Decimal places kept for sampled GiB values
pub const GIG_DECIMALS: i32 = 2;

/// Convert a GiB quantity to whole bytes, rounding down. Node capacity and
/// pod quantities both go through here so their ordering survives rounding.
pub fn gig_to_bytes(gig: f64) -> u64 {
    (gig * GIB_BYTES as f64) as u64
}

/// Round `value` down to `decimals` places
pub fn round_down(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).floor() / scale
}
