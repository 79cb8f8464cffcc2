//! Bessel functions of the first kind for cylindrical cavity modes.
//!
//! Orders 0 and 1 come from the standard rational/asymptotic
//! approximations in [`libm`]. Higher orders use the upward recurrence
//!
//! $$J_n(x) = \frac{2(n-1)}{x} J_{n-1}(x) - J_{n-2}(x)$$
//!
//! which is stable for $|x| \ge n$. Below that the recurrence amplifies the
//! rounding error of $J_0$ and $J_1$ by roughly $(n/x)^n$, so small
//! arguments (including the near-axis substitution $r = 10^{-15}$) are
//! evaluated from the power series instead.
//!
//! Roots for the supported mode range (orders 0–9, first ten zeros) are
//! pretabulated in [`BESSEL_J_ZEROS`].

/// Zeros $j_{m,n}$ of $J_m$: row `m` (order 0–9), column `n - 1` (1st–10th zero).
pub const BESSEL_J_ZEROS: [[f64; 10]; 10] = [
    [2.40482556, 5.52007811, 8.65372791, 11.79153444, 14.93091771, 18.07106397, 21.21163663, 24.35247153, 27.49347913, 30.63460647],
    [3.83170597, 7.01558667, 10.17346814, 13.32369194, 16.47063005, 19.61585851, 22.76008438, 25.90367209, 29.04682853, 32.18967991],
    [5.1356223, 8.41724414, 11.61984117, 14.79595178, 17.95981949, 21.11699705, 24.27011231, 27.42057355, 30.5692045, 33.71651951],
    [6.3801619, 9.76102313, 13.01520072, 16.22346616, 19.40941523, 22.58272959, 25.7481667, 28.90835078, 32.06485241, 35.21867074],
    [7.58834243, 11.06470949, 14.37253667, 17.61596605, 20.82693296, 24.01901952, 27.19908777, 30.37100767, 33.53713771, 36.69900113],
    [8.77148382, 12.3386042, 15.70017408, 18.98013388, 22.2177999, 25.43034115, 28.62661831, 31.81171672, 34.98878129, 38.15986856],
    [9.93610952, 13.58929017, 17.00381967, 20.32078921, 23.58608444, 26.82015198, 30.03372239, 33.23304176, 36.42201967, 39.60323942],
    [11.08637002, 14.82126873, 18.28758283, 21.64154102, 24.93492789, 28.19118846, 31.42279419, 34.63708935, 37.83871738, 41.03077369],
    [12.22509226, 16.03777419, 19.55453643, 22.94517313, 26.26681464, 29.54565967, 32.79580004, 36.02561506, 39.240448, 42.44388774],
    [13.35430048, 17.24122038, 20.80704779, 24.23388526, 27.58374896, 30.88537897, 34.15437792, 37.40009998, 40.62855372, 43.84380142],
];

/// Highest tabulated order.
pub const MAX_ZERO_ORDER: usize = 9;

/// Number of tabulated zeros per order.
pub const MAX_ZERO_INDEX: usize = 10;

/// The `n`-th zero (1-based) of $J_m$, if tabulated.
pub fn bessel_j_zero(m: usize, n: usize) -> Option<f64> {
    if m > MAX_ZERO_ORDER || n == 0 || n > MAX_ZERO_INDEX {
        return None;
    }
    Some(BESSEL_J_ZEROS[m][n - 1])
}

/// Bessel function of the first kind $J_n(x)$ for integer order.
pub fn bessel_j(n: i32, x: f64) -> f64 {
    if n < 0 {
        // J_{-n} = (-1)^n J_n
        let value = bessel_j(-n, x);
        return if n % 2 == 0 { value } else { -value };
    }
    match n {
        0 => libm::j0(x),
        1 => libm::j1(x),
        _ if x.abs() < n as f64 => power_series(n as u32, x),
        _ => {
            let mut j_prev = libm::j0(x);
            let mut j_curr = libm::j1(x);
            for k in 2..=n {
                let j_next = 2.0 * (k - 1) as f64 / x * j_curr - j_prev;
                j_prev = j_curr;
                j_curr = j_next;
            }
            j_curr
        }
    }
}

/// Derivative $J_n'(x) = \tfrac{1}{2}\left(J_{n-1}(x) - J_{n+1}(x)\right)$.
pub fn bessel_j_derivative(n: i32, x: f64) -> f64 {
    0.5 * (bessel_j(n - 1, x) - bessel_j(n + 1, x))
}

/// $J_n(x) = \sum_k \frac{(-1)^k}{k!\,(k+n)!} (x/2)^{2k+n}$.
fn power_series(n: u32, x: f64) -> f64 {
    let half = 0.5 * x;
    let mut term = half.powi(n as i32) / (1..=n).map(f64::from).product::<f64>();
    let mut sum = term;
    for k in 1..64u32 {
        term *= -half * half / (f64::from(k) * f64::from(k + n));
        sum += term;
        if term.abs() <= f64::EPSILON * sum.abs() {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bisection for a sign change of `J_n` in `[lo, hi]`.
    fn find_zero(n: i32, mut lo: f64, mut hi: f64) -> f64 {
        let mut f_lo = bessel_j(n, lo);
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            let f_mid = bessel_j(n, mid);
            if f_mid.signum() == f_lo.signum() {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    #[test]
    fn test_first_zero_of_j1_matches_table() {
        let zero = find_zero(1, 3.0, 4.5);
        assert!((zero - BESSEL_J_ZEROS[1][0]).abs() < 1e-6, "zero = {zero}");
        assert!((zero - 3.8317).abs() < 1e-4);
    }

    #[test]
    fn test_tabulated_zeros_are_roots() {
        for m in 0..=MAX_ZERO_ORDER {
            for n in 1..=MAX_ZERO_INDEX {
                let x = bessel_j_zero(m, n).unwrap();
                let value = bessel_j(m as i32, x);
                assert!(value.abs() < 1e-7, "J_{m}({x}) = {value}");
            }
        }
    }

    #[test]
    fn test_values_at_origin() {
        assert_eq!(bessel_j(0, 0.0), 1.0);
        for n in 1..10 {
            assert_eq!(bessel_j(n, 0.0), 0.0);
        }
    }

    #[test]
    fn test_known_values() {
        // Abramowitz & Stegun, Table 9.1
        assert!((bessel_j(0, 1.0) - 0.765_197_686_557_966_6).abs() < 1e-12);
        assert!((bessel_j(1, 1.0) - 0.440_050_585_744_933_5).abs() < 1e-12);
        assert!((bessel_j(2, 1.0) - 0.114_903_484_931_900_5).abs() < 1e-12);
        assert!((bessel_j(2, 5.0) - 0.046_565_116_277_752_21).abs() < 1e-12);
    }

    #[test]
    fn test_series_and_recurrence_agree_at_crossover() {
        for n in 2..10u32 {
            let x = n as f64;
            let series = power_series(n, x);
            let recurrence = bessel_j(n as i32, x);
            assert!((series - recurrence).abs() < 1e-10, "n={n}: {series} vs {recurrence}");
        }
    }

    #[test]
    fn test_negative_order_and_derivative() {
        let x = 2.3;
        assert!((bessel_j(-1, x) + bessel_j(1, x)).abs() < 1e-15);
        assert!((bessel_j(-2, x) - bessel_j(2, x)).abs() < 1e-15);
        // J0' = -J1
        assert!((bessel_j_derivative(0, x) + bessel_j(1, x)).abs() < 1e-15);
        // Central difference check for order 3
        let h = 1e-5;
        let numeric = (bessel_j(3, x + h) - bessel_j(3, x - h)) / (2.0 * h);
        assert!((bessel_j_derivative(3, x) - numeric).abs() < 1e-8);
    }

    #[test]
    fn test_small_argument_is_accurate() {
        // Leading term (x/2)^n / n! dominates at tiny x.
        let x: f64 = 1e-12;
        let expected = (0.5 * x).powi(3) / 6.0;
        assert!((bessel_j(3, x) - expected).abs() <= 1e-12 * expected.abs());
    }
}
