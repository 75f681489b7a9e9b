//! Swerling Case I detection statistics.
//!
//! For a slowly fluctuating (Rayleigh) target with square-law detection on a
//! single pulse, `Pd = Pfa^(1 / (1 + SNR))` with SNR as a linear power ratio.

/// Single-look Swerling-I probability of detection.
pub fn swerling1_pd(snr_linear: f64, pfa: f64) -> f64 {
    if !snr_linear.is_finite() {
        return 1.0;
    }
    let pfa = pfa.clamp(f64::MIN_POSITIVE, 1.0);
    pfa.powf(1.0 / (1.0 + snr_linear.max(0.0))).clamp(0.0, 1.0)
}

/// SNR (linear) at which a Swerling-I target reaches `pd` for a given `pfa`.
pub fn swerling1_required_snr(pd: f64, pfa: f64) -> f64 {
    let pd = pd.clamp(1e-12, 1.0 - 1e-12);
    let pfa = pfa.clamp(f64::MIN_POSITIVE, 1.0 - 1e-12);
    (pfa.ln() / pd.ln() - 1.0).max(0.0)
}

/// SNR at `range_m` when the reference signature reaches Pd = 0.5 at `nominal_range_m`.
///
/// `snr = snr0 · (signature / reference) · (nominal / range)^exponent`.
pub fn snr_at_range(
    range_m: f64,
    nominal_range_m: f64,
    signature: f64,
    reference_signature: f64,
    range_exponent: f64,
    pfa: f64,
) -> f64 {
    let snr0 = swerling1_required_snr(0.5, pfa);
    if range_m <= f64::EPSILON {
        return f64::INFINITY;
    }
    let signature_ratio = if reference_signature > 0.0 {
        signature.max(0.0) / reference_signature
    } else {
        1.0
    };
    snr0 * signature_ratio * (nominal_range_m / range_m).powf(range_exponent)
}
