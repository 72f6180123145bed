//! Mathematical operations for color management
//!
//! This module provides foundational math operations used throughout colorist:
//! - 3x3 matrix operations for RGB↔XYZ transforms
//! - Gamma and transfer function evaluation
//! - Interpolation for LUT evaluation

pub mod gamma;
pub mod interpolation;
pub mod matrix;

pub use gamma::{
    ParametricCurve, ParametricCurveType, hlg_eotf, hlg_oetf, parametric_curve_eval, pq_eotf,
    pq_oetf, srgb_gamma_decode, srgb_gamma_encode,
};
pub use interpolation::{lerp, tetrahedral_interp, trilinear_interp};
pub use matrix::Matrix3x3;
