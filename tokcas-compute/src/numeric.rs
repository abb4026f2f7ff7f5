//! Floating-point number theory: GCDs, rounding, and conversion to exact fractions.

use crate::consts::{EPSILON, GCD_ITERATIONS, MAX_K_INTEGER, SMALL_EPSILON};

/// Floating-point Euclidean GCD.
///
/// Exact for integers up to [`MAX_K_INTEGER`]; usually works for non-integers, within round-off.
/// Returns 0 on failure, otherwise the positive GCD.
pub fn gcd(d1: f64, d2: f64) -> f64 {
    if !d1.is_finite() || !d2.is_finite() {
        return 0.0;
    }
    let (d1, d2) = (d1.abs(), d2.abs());
    if d1 == 0.0 {
        return d2;
    }
    if d2 == 0.0 {
        return d1;
    }

    let (mut larger, mut divisor) = if d1 > d2 { (d1, d2) } else { (d2, d1) };
    let lower_limit = larger * EPSILON;
    if divisor <= lower_limit || larger >= MAX_K_INTEGER {
        return 0.0;
    }

    for _ in 1..GCD_ITERATIONS {
        let remainder = (larger % divisor).abs();
        if remainder <= lower_limit || (divisor - remainder).abs() <= lower_limit {
            if remainder != 0.0 && divisor <= 100.0 * lower_limit {
                return 0.0;
            }
            return divisor;
        }
        larger = divisor;
        divisor = remainder;
    }
    0.0
}

/// Like [`gcd`], but only succeeds if the result divides both numbers exactly, leaving coprime
/// integer quotients.
pub fn gcd_verified(d1: f64, d2: f64) -> f64 {
    let divisor = gcd(d1, d2);
    if divisor != 0.0 {
        let d3 = d1 / divisor;
        let d4 = d2 / divisor;
        if d3 % 1.0 != 0.0 || d4 % 1.0 != 0.0 {
            return 0.0;
        }
        if gcd(d3, d4) != 1.0 {
            return 0.0;
        }
    }
    divisor
}

/// Rounds half away from zero.
pub fn my_round(d: f64) -> f64 {
    if d >= 0.0 {
        (d + 0.5).trunc()
    } else {
        (d - 0.5).trunc()
    }
}

/// Converts `d` to a fully reduced fraction `(numerator, denominator)` with integral parts of at
/// most 11 digits.
///
/// Returns `None` if `d` is not finite or is probably irrational. Integers, and values within
/// round-off of an integer, convert to `(n, 1)`.
pub fn f_to_fraction(d: f64) -> Option<(f64, f64)> {
    if !d.is_finite() {
        return None;
    }
    if d % 1.0 == 0.0 {
        return Some((d, 1.0));
    }
    if d.abs() >= MAX_K_INTEGER {
        return None;
    }
    let k3 = d.abs() * SMALL_EPSILON;
    if k3 >= 0.5 {
        return None;
    }
    let k4 = my_round(d);
    if k4 != 0.0 && (k4 - d).abs() <= k3 {
        return Some((k4, 1.0));
    }

    let divisor = gcd(1.0, d);
    if divisor <= EPSILON {
        return None;
    }
    let mut numerator = my_round(d / divisor);
    let mut denominator = my_round(1.0 / divisor);
    if numerator.abs() >= 1.0e12 || denominator >= 1.0e12 || denominator < 2.0 {
        return None;
    }

    let divisor = gcd(numerator, denominator);
    if divisor > 1.0 {
        numerator /= divisor;
        denominator /= divisor;
    }
    let k3 = numerator / denominator;
    if (k3 - d).abs() > SMALL_EPSILON * k3.abs() {
        return None;
    }
    if numerator % 1.0 != 0.0 || denominator % 1.0 != 0.0 {
        return None;
    }
    Some((numerator, denominator))
}

/// Like [`f_to_fraction`], but an irrational `d` comes back as `(d, 1)`.
pub fn fraction_parts(d: f64) -> (f64, f64) {
    f_to_fraction(d).unwrap_or((d, 1.0))
}

/// Returns true if `d` is an exact fraction (including integers).
pub fn is_rational(d: f64) -> bool {
    f_to_fraction(d).is_some()
}

/// Floating-point remainder that behaves with fractional operands.
pub fn fixed_fmod(k1: f64, k2: f64) -> f64 {
    if k2 == 0.0 || !k1.is_finite() || !k2.is_finite() || (k1 % 1.0 == 0.0 && k2 % 1.0 == 0.0) {
        k1 % k2
    } else {
        (k1 / k2).fract() * k2
    }
}

/// Lanczos approximation coefficients, `g = 7`.
const GAMMA_P: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// The gamma function of a real number. Returns `None` at the poles.
pub fn gamma(x: f64) -> Option<f64> {
    if x <= 0.0 && x % 1.0 == 0.0 {
        return None;
    }
    if x < 0.5 {
        // reflection formula
        let sin = (std::f64::consts::PI * x).sin();
        return Some(std::f64::consts::PI / (sin * gamma(1.0 - x)?));
    }

    let z = x - 1.0;
    let mut sum = GAMMA_P[0];
    for (i, p) in GAMMA_P.iter().enumerate().skip(1) {
        sum += p / (z + i as f64);
    }
    let t = z + 7.5;
    Some((2.0 * std::f64::consts::PI).sqrt() * t.powf(z + 0.5) * (-t).exp() * sum)
}

/// Computes `n!` through the gamma function, exactly for non-negative integers. Returns `None` if
/// the result overflows or `n` is a negative integer.
pub fn factorial(n: f64) -> Option<f64> {
    if !n.is_finite() {
        return None;
    }
    let result = if n >= 0.0 && n % 1.0 == 0.0 {
        let mut product = 1.0;
        let mut k = 2.0;
        while k <= n {
            product *= k;
            if !product.is_finite() {
                return None;
            }
            k += 1.0;
        }
        product
    } else {
        gamma(n + 1.0)?
    };
    result.is_finite().then_some(result)
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{
        afe_is_relative_eq,
        assert_float_relative_eq,
    };
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn integer_gcd() {
        assert_eq!(gcd(12.0, 18.0), 6.0);
        assert_eq!(gcd(-12.0, 18.0), 6.0);
        assert_eq!(gcd(0.0, 7.0), 7.0);
        assert_eq!(gcd(f64::INFINITY, 7.0), 0.0);
        assert_eq!(gcd_verified(12.0, 18.0), 6.0);
    }

    #[test]
    fn fractional_gcd() {
        assert_float_relative_eq!(gcd(0.5, 0.75), 0.25);
    }

    #[test]
    fn round_half_away() {
        assert_eq!(my_round(2.5), 3.0);
        assert_eq!(my_round(-2.5), -3.0);
        assert_eq!(my_round(2.4), 2.0);
    }

    #[test]
    fn fractions() {
        assert_eq!(f_to_fraction(0.5), Some((1.0, 2.0)));
        assert_eq!(f_to_fraction(5.0 / 6.0), Some((5.0, 6.0)));
        assert_eq!(f_to_fraction(-0.75), Some((-3.0, 4.0)));
        assert_eq!(f_to_fraction(4.0), Some((4.0, 1.0)));
        assert_eq!(f_to_fraction(2.0_f64.sqrt()), None);
        assert_eq!(f_to_fraction(f64::NAN), None);
    }

    #[test]
    fn fmod_with_fractions() {
        assert_float_relative_eq!(fixed_fmod(7.5, 2.0), 1.5);
        assert_eq!(fixed_fmod(-7.0, 3.0), -1.0);
    }

    #[test]
    fn factorials() {
        assert_eq!(factorial(5.0), Some(120.0));
        assert_eq!(factorial(0.0), Some(1.0));
        assert_float_relative_eq!(factorial(0.5).unwrap(), 0.886_226_925_452_758);
        assert_eq!(factorial(-1.0), None);
        assert_eq!(factorial(200.0), None);
    }
}
