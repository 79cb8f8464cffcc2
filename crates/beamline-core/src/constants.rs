//! Physical constants shared by the field models (SI units).

/// Speed of light in vacuum (m/s).
pub const C_LIGHT: f64 = 299_792_458.0;
