//! Floating point helpers shared by the aggregation code and the statistical tests.

use approx::AbsDiffEq;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Ratio of an accumulated total to the number of observations, `0.0` when nothing was observed.
#[must_use]
pub fn ratio(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Formats a float the way C's `printf("%g")` does: six significant digits, trailing zeros
/// removed, and scientific notation when the decimal exponent is below -4 or at least 6.
#[must_use]
pub fn format_general(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // Rounding to the significant digits first settles the exponent, e.g. 999999.5 -> 1e+06.
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .expect("scientific formatting always has an exponent");
    let exponent: i32 = exponent.parse().expect("exponent is an integer");

    if exponent < -4 || exponent >= PRECISION {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
