//! Field probing contract and info-vector accessors.
//!
//! The probe backend is an external collaborator: given a particle's
//! current position it fills the particle's info vector with every
//! enabled channel. The core never samples the field itself; it only
//! slices values, gradients, and Hessians back out of the info vector.

use nalgebra::{Matrix3, Vector3};

use crate::error::ProbeError;
use crate::info::{InfoKind, InfoLayout};
use crate::particle::Particle;

/// Probe backend supplying field values and derivatives.
///
/// Implementations must answer every channel enabled in `layout` at the
/// particle's current spatial position. The backend may allocate or
/// cache internally; the core treats it as opaque and stateless.
pub trait FieldProbe {
    /// Fill the particle's info vector at its current position.
    fn probe(&self, layout: &InfoLayout, point: &mut Particle) -> Result<(), ProbeError>;
}

/// Scalar value of an info channel, with optional spatial derivatives.
///
/// Reads the last probed answer from the particle's info vector. If the
/// channel (or a requested derivative companion) is not enabled, the
/// value is 0 and the derivative outputs are zeroed. The Hessian is
/// stored row-major.
pub fn point_scalar(
    layout: &InfoLayout,
    point: &Particle,
    kind: InfoKind,
    grad_out: Option<&mut Vector3<f64>>,
    hess_out: Option<&mut Matrix3<f64>>,
) -> f64 {
    let info = point.info();
    let val = layout.offset(kind).map_or(0.0, |off| info[off]);
    if let Some(grad) = grad_out {
        *grad = kind
            .gradient_kind()
            .and_then(|k| layout.offset(k))
            .map_or_else(Vector3::zeros, |off| {
                Vector3::new(info[off], info[off + 1], info[off + 2])
            });
    }
    if let Some(hess) = hess_out {
        *hess = kind
            .hessian_kind()
            .and_then(|k| layout.offset(k))
            .map_or_else(Matrix3::zeros, |off| {
                Matrix3::from_row_slice(&info[off..off + 9])
            });
    }
    val
}

/// Vector value of an info channel (tangents). Zero if not enabled.
pub fn point_vector(layout: &InfoLayout, point: &Particle, kind: InfoKind) -> Vector3<f64> {
    let info = point.info();
    layout.offset(kind).map_or_else(Vector3::zeros, |off| {
        Vector3::new(info[off], info[off + 1], info[off + 2])
    })
}
