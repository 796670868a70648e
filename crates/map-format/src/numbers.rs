//! Number formatting used in map files.

/// Decimal places written for plane points and texture attributes.
pub const FLOAT_PRECISION: usize = 17;

/// Significant digits written for Valve texture axes.
pub const VALVE_PRECISION: usize = 6;

/// Fixed-point with `precision` decimals, trailing zeros and a dangling
/// decimal point removed: `64.0` becomes `64`, `0.25` stays `0.25`.
pub fn ftos(v: f64, precision: usize) -> String {
    let mut s = format!("{v:.precision$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    s
}

/// Shortest of fixed or scientific notation with `precision` significant
/// digits, like C's `%g`.
pub fn general(v: f64, precision: usize) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0".into() } else { "0".into() };
    }
    let precision = precision.max(1);

    // Rounding to the requested digits may carry into the exponent, so read
    // it back from the scientific form.
    let sci = format!("{v:.prec$e}", prec = precision - 1);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let mantissa = strip_fraction_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
