//! Standard normal helpers for the analytic acquisition functions.

/// Standard normal probability density.
pub fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Standard normal cumulative distribution.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

// Abramowitz and Stegun 7.1.26, max error 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let inner = 1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429);
    let poly = t * (0.254_829_592 + t * (-0.284_496_736 + t * inner));
    sign * (1.0 - poly * (-x * x).exp())
}
