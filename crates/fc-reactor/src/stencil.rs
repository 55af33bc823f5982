//! Explicit finite-difference kernels on a uniform 1-D grid.
//!
//! All kernels read a "previous" field and write only the interior nodes
//! `1..N-1` of the output; boundary nodes belong to [`apply_boundaries`].
//! Per-interior-node arrays (`rate`, `extent`) have length N−2 and are indexed
//! `i - 1` for grid node `i`.
//!
//! Convection uses a first-order upwind difference (flow runs from node 0 to
//! node N−1), dispersion a second-order central difference.

/// Coefficients of the species transport update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportCoefficients {
    /// u·dt/dx
    pub courant: f64,
    /// D_ax·dt/dx²
    pub dispersion: f64,
}

/// Coefficients of the temperature update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalCoefficients {
    /// u·dt/dx
    pub courant: f64,
    /// α·dt/dx²
    pub lambda: f64,
    /// Lumped wall exchange per micro-step.
    pub wall_exchange: f64,
    /// ΔH_r/(ρ·Cp)
    pub heat_release: f64,
}

/// Dirichlet inlet, zero-gradient outlet.
#[inline]
pub fn apply_boundaries(field: &mut [f64], inlet: f64) {
    let n = field.len();
    field[0] = inlet;
    field[n - 1] = field[n - 2];
}

/// Moles reacted per unit volume during one micro-step at each interior node:
/// `k·A·B·dt`.
pub fn reaction_extent(rate_constant: &[f64], a: &[f64], b: &[f64], dt: f64, out: &mut [f64]) {
    debug_assert_eq!(rate_constant.len(), out.len());
    for (j, extent) in out.iter_mut().enumerate() {
        *extent = rate_constant[j] * a[j + 1] * b[j + 1] * dt;
    }
}

/// Advection–dispersion plus a stoichiometric source.
///
/// `out[i] = prev[i] − C·(prev[i]−prev[i−1]) + d·(prev[i+1]−2prev[i]+prev[i−1]) + sign·extent[i−1]`
pub fn transport_interior(
    prev: &[f64],
    coeffs: TransportCoefficients,
    extent: &[f64],
    sign: f64,
    out: &mut [f64],
) {
    let n = prev.len();
    debug_assert_eq!(out.len(), n);
    debug_assert_eq!(extent.len() + 2, n);
    for i in 1..n - 1 {
        out[i] = prev[i] - coeffs.courant * (prev[i] - prev[i - 1])
            + coeffs.dispersion * (prev[i + 1] - 2.0 * prev[i] + prev[i - 1])
            + sign * extent[i - 1];
    }
}

/// Energy balance: convection, conduction, wall exchange with an external
/// temperature, and heat of reaction.
pub fn temperature_interior(
    prev: &[f64],
    coeffs: ThermalCoefficients,
    wall_temperature: f64,
    extent: &[f64],
    out: &mut [f64],
) {
    let n = prev.len();
    debug_assert_eq!(out.len(), n);
    debug_assert_eq!(extent.len() + 2, n);
    for i in 1..n - 1 {
        out[i] = prev[i] - coeffs.courant * (prev[i] - prev[i - 1])
            + coeffs.lambda * (prev[i + 1] - 2.0 * prev[i] + prev[i - 1])
            - coeffs.wall_exchange * (prev[i] - wall_temperature)
            - coeffs.heat_release * extent[i - 1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hump(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let x = i as f64 - n as f64 / 2.0;
                (-x * x / 8.0).exp() * if (5..n - 5).contains(&i) { 1.0 } else { 0.0 }
            })
            .collect()
    }

    #[test]
    fn boundaries_fix_inlet_and_copy_outlet() {
        let mut f = vec![5.0, 1.0, 2.0, 3.0, 9.0];
        apply_boundaries(&mut f, 0.5);
        assert_eq!(f, vec![0.5, 1.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn transport_without_reaction_conserves_interior_mass() {
        let n = 60;
        let prev = hump(n);
        let mut out = prev.clone();
        let extent = vec![0.0; n - 2];
        let coeffs = TransportCoefficients {
            courant: 0.3,
            dispersion: 0.2,
        };
        let mut field = prev.clone();
        for _ in 0..5 {
            transport_interior(&field, coeffs, &extent, -1.0, &mut out);
            field.copy_from_slice(&out);
        }
        let before: f64 = prev.iter().sum();
        let after: f64 = field.iter().sum();
        assert!((before - after).abs() < 1e-9 * before);
    }

    #[test]
    fn uniform_field_is_a_fixed_point() {
        let prev = vec![2.0; 10];
        let mut out = vec![0.0; 10];
        let coeffs = TransportCoefficients {
            courant: 0.4,
            dispersion: 0.1,
        };
        transport_interior(&prev, coeffs, &[0.0; 8], 1.0, &mut out);
        assert!(out[1..9].iter().all(|v| (*v - 2.0).abs() < 1e-15));
        // boundary nodes untouched
        assert_eq!(out[0], 0.0);
        assert_eq!(out[9], 0.0);
    }

    #[test]
    fn wall_exchange_pulls_toward_wall_temperature() {
        let prev = vec![300.0; 5];
        let mut out = prev.clone();
        let coeffs = ThermalCoefficients {
            courant: 0.0,
            lambda: 0.0,
            wall_exchange: 0.1,
            heat_release: 0.0,
        };
        temperature_interior(&prev, coeffs, 400.0, &[0.0; 3], &mut out);
        assert!(out[1..4].iter().all(|t| (*t - 310.0).abs() < 1e-12));
    }

    #[test]
    fn exothermic_extent_heats_the_stream() {
        let prev = vec![300.0; 5];
        let mut out = prev.clone();
        let coeffs = ThermalCoefficients {
            courant: 0.0,
            lambda: 0.0,
            wall_exchange: 0.0,
            heat_release: -2.0,
        };
        temperature_interior(&prev, coeffs, 300.0, &[1.0, 0.0, 0.5], &mut out);
        assert_eq!(&out[1..4], &[302.0, 300.0, 301.0]);
    }

    proptest! {
        #[test]
        fn reaction_conserves_a_plus_c_and_b_plus_c(
            a in proptest::collection::vec(0.0f64..2000.0, 12),
            b in proptest::collection::vec(0.0f64..2000.0, 12),
            c in proptest::collection::vec(0.0f64..2000.0, 12),
            k in proptest::collection::vec(0.0f64..1e-3, 10),
        ) {
            let dt = 0.005;
            let mut extent = vec![0.0; 10];
            reaction_extent(&k, &a, &b, dt, &mut extent);
            let still = TransportCoefficients { courant: 0.0, dispersion: 0.0 };
            let (mut a1, mut b1, mut c1) = (a.clone(), b.clone(), c.clone());
            transport_interior(&a, still, &extent, -1.0, &mut a1);
            transport_interior(&b, still, &extent, -1.0, &mut b1);
            transport_interior(&c, still, &extent, 1.0, &mut c1);
            for i in 1..11 {
                let tol = 1e-9 * (a[i] + b[i] + c[i] + 1.0);
                prop_assert!(((a1[i] + c1[i]) - (a[i] + c[i])).abs() < tol);
                prop_assert!(((b1[i] + c1[i]) - (b[i] + c[i])).abs() < tol);
            }
        }

        #[test]
        fn transport_is_linear_so_reaction_cancels_in_a_plus_c(
            a in proptest::collection::vec(0.0f64..10.0, 16),
            c in proptest::collection::vec(0.0f64..10.0, 16),
            extent in proptest::collection::vec(0.0f64..1.0, 14),
            courant in 0.0f64..0.5,
            dispersion in 0.0f64..0.25,
        ) {
            let coeffs = TransportCoefficients { courant, dispersion };
            let (mut a1, mut c1) = (a.clone(), c.clone());
            transport_interior(&a, coeffs, &extent, -1.0, &mut a1);
            transport_interior(&c, coeffs, &extent, 1.0, &mut c1);
            let sum: Vec<f64> = a.iter().zip(&c).map(|(x, y)| x + y).collect();
            let mut sum1 = sum.clone();
            transport_interior(&sum, coeffs, &vec![0.0; 14], 1.0, &mut sum1);
            for i in 1..15 {
                prop_assert!(((a1[i] + c1[i]) - sum1[i]).abs() < 1e-9);
            }
        }
    }
}
