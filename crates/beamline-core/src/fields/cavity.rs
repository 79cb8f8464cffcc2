//! Analytic TM-mode field of a pillbox (circular cylindrical) cavity.
//!
//! For a cavity of radius $a$ and length $L$ excited in the
//! $\text{TM}_{mnp}$ mode, with $j = j_{m,n}$ the $n$-th zero of $J_m$ and
//! $k = j/a$:
//!
//! $$E_z = E_0 J_m(kr) \cos(m\varphi) \cos(p\pi z/L + \varphi_z)$$
//! $$E_r = -\frac{p\pi}{L}\frac{a}{j} E_0 J_m'(kr) \cos(m\varphi) \sin(p\pi z/L + \varphi_z)$$
//! $$E_\varphi = -\frac{p\pi}{L}\frac{m}{r}\left(\frac{a}{j}\right)^2 E_0 J_m(kr) \sin(m\varphi) \sin(p\pi z/L + \varphi_z)$$
//! $$B_r = \frac{\omega m}{r c^2}\left(\frac{a}{j}\right)^2 E_0 J_m(kr) \sin(m\varphi) \cos(p\pi z/L + \varphi_z)$$
//! $$B_\varphi = \frac{\omega}{c^2}\frac{a}{j} E_0 J_m'(kr) \cos(m\varphi) \cos(p\pi z/L + \varphi_z)$$
//!
//! and $B_z = 0$. The electric field oscillates as
//! $\cos(\omega(t - t_s) + \varphi_t)$ and the magnetic field as the
//! matching sine. The local origin sits at the cavity centre, so the
//! cavity spans $z \in [-L/2, L/2]$.

use serde::{Deserialize, Serialize};

use crate::bessel::{bessel_j, bessel_j_derivative, bessel_j_zero, MAX_ZERO_INDEX, MAX_ZERO_ORDER};
use crate::constants::C_LIGHT;
use crate::error::ElementError;
use crate::strength::ElementStrength;
use crate::types::FieldValue;

use super::FieldSource;

/// Radius substituted on the axis, where the azimuthal terms divide by `r`.
pub const AXIS_RADIUS_EPSILON: f64 = 1e-15;

/// Default number of Simpson intervals for voltage and transit-time integrals.
pub const DEFAULT_INTEGRATION_STEPS: usize = 200;

/// Synchronous time and phase that fix the RF time origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeReference {
    /// Time at which the phase argument equals `phase` (s).
    pub synchronous_time: f64,
    /// Phase offset (rad).
    pub phase: f64,
}

impl TimeReference {
    pub fn new(synchronous_time: f64, phase: f64) -> Self {
        Self {
            synchronous_time,
            phase,
        }
    }

    /// Zero synchronous time and zero phase: the field peaks at `t = 0`.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Parameters of a resonant cavity mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CavityParameters {
    /// Peak on-axis electric field $E_0$ (V/m).
    pub peak_field: f64,
    /// Cavity radius $a$ (m).
    pub radius: f64,
    /// Cavity length $L$ (m).
    pub length: f64,
    /// Azimuthal mode number.
    pub m: usize,
    /// Radial mode number (1-based).
    pub n: usize,
    /// Longitudinal mode number.
    #[serde(default)]
    pub p: usize,
    /// RF phase offset (rad).
    #[serde(default)]
    pub phase: f64,
    /// Longitudinal phase offset (rad).
    #[serde(default)]
    pub z_phase: f64,
    /// Travelling-wave mode: frequency is taken as given rather than
    /// derived from the geometry.
    #[serde(default)]
    pub travelling: bool,
    /// RF frequency (Hz). Overwritten for standing-wave cavities.
    #[serde(default)]
    pub frequency: f64,
    /// Synchronous time (s).
    #[serde(default)]
    pub synchronous_time: f64,
}

impl CavityParameters {
    /// A standing-wave TM$_{mnp}$ cavity with zero phases.
    pub fn standing_wave(peak_field: f64, radius: f64, length: f64, m: usize, n: usize, p: usize) -> Self {
        Self {
            peak_field,
            radius,
            length,
            m,
            n,
            p,
            phase: 0.0,
            z_phase: 0.0,
            travelling: false,
            frequency: 0.0,
            synchronous_time: 0.0,
        }
    }

    /// Read cavity parameters from named strengths.
    ///
    /// Required: `efield`, `cavity_radius`, `cavity_length`, `cavity_m`,
    /// `cavity_n`, plus `frequency` when `cavity_travelling` is set.
    pub fn from_strength(strength: &ElementStrength) -> Result<Self, ElementError> {
        let travelling = strength.flag("cavity_travelling");
        let frequency = if travelling {
            strength.require("frequency")?
        } else {
            strength.get_or("frequency", 0.0)
        };
        Ok(Self {
            peak_field: strength.require("efield")?,
            radius: strength.require("cavity_radius")?,
            length: strength.require("cavity_length")?,
            m: strength.require_index("cavity_m")?,
            n: strength.require_index("cavity_n")?,
            p: strength.index_or("cavity_p", 0)?,
            phase: strength.get_or("phase", 0.0),
            z_phase: strength.get_or("cavity_zphase", 0.0),
            travelling,
            frequency,
            synchronous_time: strength.get_or("synchronousT0", 0.0),
        })
    }

    /// The time reference encoded in these parameters.
    pub fn time_reference(&self) -> TimeReference {
        TimeReference::new(self.synchronous_time, self.phase)
    }
}

/// Field components in cylindrical coordinates $(r, \varphi, z)$.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CylindricalField {
    pub e_r: f64,
    pub e_phi: f64,
    pub e_z: f64,
    pub b_r: f64,
    pub b_phi: f64,
    pub b_z: f64,
}

impl CylindricalField {
    /// Rotate into Cartesian components at azimuth `phi`.
    pub fn to_cartesian(&self, phi: f64) -> FieldValue {
        let (sin_phi, cos_phi) = phi.sin_cos();
        FieldValue {
            b: [
                self.b_r * cos_phi - self.b_phi * sin_phi,
                self.b_r * sin_phi + self.b_phi * cos_phi,
                self.b_z,
            ],
            e: [
                self.e_r * cos_phi - self.e_phi * sin_phi,
                self.e_r * sin_phi + self.e_phi * cos_phi,
                self.e_z,
            ],
        }
    }
}

/// Analytic circular TM-mode cavity field.
#[derive(Debug, Clone)]
pub struct CircularTmField {
    params: CavityParameters,
    /// $j_{m,n}$
    zero: f64,
    /// Transverse wavenumber $j_{m,n}/a$.
    k_mn: f64,
    /// Longitudinal wavenumber $p\pi/L$.
    k_z: f64,
    omega: f64,
    cached_voltage: f64,
    cached_transit_time_factor: f64,
}

impl CircularTmField {
    /// Validate the mode and derive the angular frequency.
    ///
    /// The voltage and the transit-time factor for $\beta = 1$ are
    /// computed once here and cached.
    pub fn new(mut params: CavityParameters) -> Result<Self, ElementError> {
        if params.m > MAX_ZERO_ORDER || params.n == 0 || params.n > MAX_ZERO_INDEX {
            return Err(ElementError::UnsupportedMode {
                m: params.m,
                n: params.n,
            });
        }
        positive("cavity_radius", params.radius)?;
        positive("cavity_length", params.length)?;
        if !params.peak_field.is_finite() {
            return Err(ElementError::InvalidParameter {
                name: "efield",
                value: params.peak_field,
                reason: "must be finite",
            });
        }

        let zero = bessel_j_zero(params.m, params.n).ok_or(ElementError::UnsupportedMode {
            m: params.m,
            n: params.n,
        })?;
        let k_mn = zero / params.radius;
        let k_z = params.p as f64 * std::f64::consts::PI / params.length;

        let omega = if params.travelling {
            positive("frequency", params.frequency)?;
            2.0 * std::f64::consts::PI * params.frequency
        } else {
            let omega = C_LIGHT * (k_mn * k_mn + k_z * k_z).sqrt();
            params.frequency = omega / (2.0 * std::f64::consts::PI);
            omega
        };

        let mut field = Self {
            params,
            zero,
            k_mn,
            k_z,
            omega,
            cached_voltage: 0.0,
            cached_transit_time_factor: 0.0,
        };
        field.cached_voltage = field.voltage();
        field.cached_transit_time_factor = field.transit_time_factor(1.0);

        log::debug!(
            "TM{}{}{} cavity: f = {:.6e} Hz, V = {:.6e} V, TTF(beta=1) = {:.6}",
            params.m,
            params.n,
            params.p,
            field.params.frequency,
            field.cached_voltage,
            field.cached_transit_time_factor
        );

        Ok(field)
    }

    /// Build from named strengths, see [`CavityParameters::from_strength`].
    pub fn from_strength(strength: &ElementStrength) -> Result<Self, ElementError> {
        Self::new(CavityParameters::from_strength(strength)?)
    }

    pub fn parameters(&self) -> &CavityParameters {
        &self.params
    }

    /// RF frequency (Hz).
    pub fn frequency(&self) -> f64 {
        self.params.frequency
    }

    /// Angular frequency (rad/s).
    pub fn angular_frequency(&self) -> f64 {
        self.omega
    }

    /// Voltage computed at construction.
    pub fn cached_voltage(&self) -> f64 {
        self.cached_voltage
    }

    /// Transit-time factor for $\beta = 1$ computed at construction.
    pub fn cached_transit_time_factor(&self) -> f64 {
        self.cached_transit_time_factor
    }

    /// Field components in cylindrical coordinates with the cavity's own
    /// time reference.
    pub fn cylindrical_field(&self, r: f64, phi: f64, z: f64, t: f64) -> CylindricalField {
        self.cylindrical_field_with(r, phi, z, t, self.params.time_reference())
    }

    /// Field components in cylindrical coordinates with an explicit time
    /// reference.
    pub fn cylindrical_field_with(
        &self,
        r: f64,
        phi: f64,
        z: f64,
        t: f64,
        reference: TimeReference,
    ) -> CylindricalField {
        let r = if r == 0.0 { AXIS_RADIUS_EPSILON } else { r };
        let p = &self.params;
        let m = p.m as f64;

        let rf_phase = self.omega * (t - reference.synchronous_time) + reference.phase;
        let (time_b, time_e) = rf_phase.sin_cos();

        let (sin_mphi, cos_mphi) = (m * phi).sin_cos();
        let (sin_z, cos_z) = (self.k_z * z + p.z_phase).sin_cos();

        let scale = p.radius / self.zero;
        let jm = bessel_j(p.m as i32, self.k_mn * r);
        let jm_prime = bessel_j_derivative(p.m as i32, self.k_mn * r);
        let c2 = C_LIGHT * C_LIGHT;

        CylindricalField {
            e_r: -time_e * self.k_z * scale * p.peak_field * jm_prime * cos_mphi * sin_z,
            e_phi: -time_e * self.k_z * m * scale * scale / r * p.peak_field * jm * sin_mphi * sin_z,
            e_z: time_e * p.peak_field * jm * cos_mphi * cos_z,
            b_r: time_b * self.omega * m * scale * scale / (r * c2) * p.peak_field * jm * sin_mphi * cos_z,
            b_phi: time_b * self.omega * scale / c2 * p.peak_field * jm_prime * cos_mphi * cos_z,
            b_z: 0.0,
        }
    }

    /// Cartesian field at a local position with an explicit time reference.
    pub fn field_with(&self, position: &[f64; 3], t: f64, reference: TimeReference) -> FieldValue {
        let [x, y, z] = *position;
        let phi = y.atan2(x);
        let r = x.hypot(y);
        self.cylindrical_field_with(r, phi, z, t, reference)
            .to_cartesian(phi)
    }

    /// On-axis integral of $E_z$ at the zero time reference, weighted by
    /// `weight(z)`, using composite Simpson's rule over $[-L/2, L/2]$.
    fn on_axis_integral(&self, n_steps: usize, weight: impl Fn(f64) -> f64) -> f64 {
        let n_steps = simpson_intervals(n_steps);
        let length = self.params.length;
        let h = length / n_steps as f64;
        let sample = |i: usize| {
            let z = i as f64 * length / n_steps as f64 - 0.5 * length;
            self.field_with(&[0.0, 0.0, z], 0.0, TimeReference::zero()).e[2] * weight(z)
        };

        let mut sum = sample(0) + sample(n_steps);
        for i in 1..n_steps {
            let coefficient = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += coefficient * sample(i);
        }
        sum * h / 3.0
    }

    /// On-axis voltage $\int E_z\,dz$ with `n_steps` Simpson intervals.
    pub fn voltage_with(&self, n_steps: usize) -> f64 {
        self.on_axis_integral(n_steps, |_| 1.0)
    }

    /// On-axis voltage with the default step count.
    pub fn voltage(&self) -> f64 {
        self.voltage_with(DEFAULT_INTEGRATION_STEPS)
    }

    /// Transit-time factor for a particle of velocity $\beta c$:
    /// $\int E_z \cos(\omega z/\beta c)\,dz \,/\, V$.
    ///
    /// Zero if the voltage vanishes or `beta` is not a finite positive number.
    pub fn transit_time_factor_with(&self, beta: f64, n_steps: usize) -> f64 {
        if !(beta.is_finite() && beta > 0.0) {
            log::warn!("Invalid beta {} for transit-time factor; set to 0", beta);
            return 0.0;
        }
        let voltage = self.voltage_with(n_steps);
        if voltage == 0.0 {
            log::warn!("Cavity voltage is zero; transit-time factor set to 0");
            return 0.0;
        }
        let k = self.omega / (beta * C_LIGHT);
        self.on_axis_integral(n_steps, |z| (k * z).cos()) / voltage
    }

    /// Transit-time factor with the default step count.
    pub fn transit_time_factor(&self, beta: f64) -> f64 {
        self.transit_time_factor_with(beta, DEFAULT_INTEGRATION_STEPS)
    }
}

impl FieldSource for CircularTmField {
    fn field(&self, position: &[f64; 3], t: f64) -> FieldValue {
        self.field_with(position, t, self.params.time_reference())
    }

    fn time_varying(&self) -> bool {
        true
    }
}

/// Even interval count, at least 2.
fn simpson_intervals(n_steps: usize) -> usize {
    let n = n_steps.max(2);
    n + n % 2
}

fn positive(name: &'static str, value: f64) -> Result<(), ElementError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ElementError::InvalidParameter {
            name,
            value,
            reason: "must be positive",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bessel::BESSEL_J_ZEROS;

    fn tm010() -> CircularTmField {
        CircularTmField::new(CavityParameters::standing_wave(1.0e6, 0.1, 0.2, 0, 1, 0)).unwrap()
    }

    #[test]
    fn test_standing_wave_frequency_from_geometry() {
        let cavity = tm010();
        let expected = C_LIGHT * BESSEL_J_ZEROS[0][0] / 0.1;
        assert!((cavity.angular_frequency() - expected).abs() < 1e-3);
        assert!((cavity.frequency() - expected / (2.0 * std::f64::consts::PI)).abs() < 1e-3);
    }

    #[test]
    fn test_travelling_wave_uses_given_frequency() {
        let mut params = CavityParameters::standing_wave(1.0e6, 0.1, 0.2, 0, 1, 0);
        params.travelling = true;
        params.frequency = 1.3e9;
        let cavity = CircularTmField::new(params).unwrap();
        assert_eq!(cavity.frequency(), 1.3e9);
        assert!((cavity.angular_frequency() - 2.0 * std::f64::consts::PI * 1.3e9).abs() < 1e-3);

        params.frequency = 0.0;
        assert!(CircularTmField::new(params).is_err());
    }

    #[test]
    fn test_transit_time_factor_rejects_bad_beta() {
        let cavity = tm010();
        for beta in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert_eq!(cavity.transit_time_factor(beta), 0.0);
        }
        let ttf = cavity.transit_time_factor(1.0);
        assert!(ttf.is_finite() && ttf > 0.0 && ttf < 1.0);
    }

    #[test]
    fn test_mode_validation() {
        let bad = |m, n| CircularTmField::new(CavityParameters::standing_wave(1.0, 0.1, 0.2, m, n, 0));
        assert!(matches!(bad(10, 1), Err(ElementError::UnsupportedMode { m: 10, n: 1 })));
        assert!(matches!(bad(0, 0), Err(ElementError::UnsupportedMode { .. })));
        assert!(matches!(bad(0, 11), Err(ElementError::UnsupportedMode { .. })));
        assert!(bad(9, 10).is_ok());

        let zero_radius = CircularTmField::new(CavityParameters::standing_wave(1.0, 0.0, 0.2, 0, 1, 0));
        assert!(matches!(
            zero_radius,
            Err(ElementError::InvalidParameter { name: "cavity_radius", .. })
        ));
    }

    #[test]
    fn test_on_axis_ez_at_synchronous_time() {
        let mut params = CavityParameters::standing_wave(2.0e6, 0.1, 0.3, 0, 1, 1);
        params.z_phase = 0.4;
        params.synchronous_time = 3.0e-9;
        let cavity = CircularTmField::new(params).unwrap();
        let f = cavity.field(&[0.0, 0.0, 0.0], 3.0e-9);
        assert!((f.e[2] - 2.0e6 * 0.4f64.cos()).abs() < 1e-6);
        for component in f.b {
            assert_eq!(component.abs(), 0.0);
        }
    }

    #[test]
    fn test_simpson_interval_rounding() {
        assert_eq!(simpson_intervals(0), 2);
        assert_eq!(simpson_intervals(1), 2);
        assert_eq!(simpson_intervals(7), 8);
        assert_eq!(simpson_intervals(200), 200);
    }

    #[test]
    fn test_voltage_is_pure() {
        let mut params = CavityParameters::standing_wave(1.0e6, 0.1, 0.2, 0, 1, 0);
        params.phase = 1.0;
        params.synchronous_time = 2.0e-9;
        let cavity = CircularTmField::new(params).unwrap();
        let before = cavity.field(&[0.01, 0.0, 0.05], 1.0e-9);
        let v = cavity.voltage_with(51);
        let after = cavity.field(&[0.01, 0.0, 0.05], 1.0e-9);
        assert_eq!(before, after);
        assert_eq!(cavity.parameters().phase, 1.0);
        assert!((v - 1.0e6 * 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_antisymmetric_modes_have_no_voltage() {
        // TM011 with a quarter-wave z phase is odd in z.
        let mut params = CavityParameters::standing_wave(1.0e6, 0.1, 0.2, 0, 1, 1);
        params.z_phase = std::f64::consts::FRAC_PI_2;
        let cavity = CircularTmField::new(params).unwrap();
        assert!(cavity.voltage().abs() < 1e-6);
        let full_wave = CircularTmField::new(CavityParameters::standing_wave(1.0e6, 0.1, 0.2, 0, 1, 2)).unwrap();
        assert!(full_wave.voltage_with(4).abs() < 1e-6);
    }

    #[test]
    fn test_zero_voltage_gives_zero_transit_time_factor() {
        let cavity = CircularTmField::new(CavityParameters::standing_wave(0.0, 0.1, 0.2, 0, 1, 0)).unwrap();
        assert_eq!(cavity.voltage(), 0.0);
        assert_eq!(cavity.transit_time_factor(0.5), 0.0);
        assert_eq!(cavity.cached_transit_time_factor(), 0.0);
    }

    #[test]
    fn test_from_strength_requires_keys() {
        let strength = ElementStrength::new()
            .with("efield", 1.0e6)
            .with("cavity_radius", 0.1)
            .with("cavity_length", 0.2)
            .with("cavity_m", 0.0);
        assert!(matches!(
            CircularTmField::from_strength(&strength),
            Err(ElementError::Strength(_))
        ));

        let strength = strength.with("cavity_n", 1.0).with("cavity_travelling", 1.0);
        assert!(CircularTmField::from_strength(&strength).is_err());

        let strength = strength.with("frequency", 1.0e9);
        let cavity = CircularTmField::from_strength(&strength).unwrap();
        assert!(cavity.parameters().travelling);
        assert_eq!(cavity.frequency(), 1.0e9);
    }
}
