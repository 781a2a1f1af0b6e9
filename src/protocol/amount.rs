//! # Amount Formatting
//!
//! Prices, quantities and totals go to the device as fixed-point decimal
//! text. The device rounds half away from zero, so the driver must too:
//! `0.125` is sent as `0.13` and `0.0625` at three places as `0.063`.
//!
//! Rounding works on the shortest decimal representation of the `f64`
//! (the digits `Display` prints), not on its binary expansion. `1.005` is
//! stored as `1.00499999999999989...` but is written and rounded as
//! `1.005`, giving `1.01`.

/// Format `value` with exactly `places` decimals, rounding half away from zero.
///
/// ```
/// use fp705::protocol::amount::format_half_up;
///
/// assert_eq!(format_half_up(0.125, 2), "0.13");
/// assert_eq!(format_half_up(2.0, 3), "2.000");
/// ```
pub fn format_half_up(value: f64, places: usize) -> String {
    if !value.is_finite() {
        return format!("{:.*}", places, value);
    }

    // `Display` for f64 never uses exponent notation
    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let mut frac = frac_part.bytes().chain(std::iter::repeat(b'0'));
    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac.by_ref().take(places))
        .collect();
    if frac.next().is_some_and(|d| d >= b'5') {
        round_up(&mut digits);
    }

    let split = digits.len() - places;
    let mut out = String::with_capacity(digits.len() + 2);
    if value < 0.0 && digits.iter().any(|&d| d != b'0') {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|&d| char::from(d)));
    if places > 0 {
        out.push('.');
        out.extend(digits[split..].iter().map(|&d| char::from(d)));
    }
    out
}

/// Add one unit in the last place of a decimal digit string.
fn round_up(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}
