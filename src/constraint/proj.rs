//! Tangent-subspace projectors gating motion for height constraints.

use nalgebra::Matrix3;

use crate::field::point_vector;
use crate::info::{InfoKind, InfoLayout};
use crate::particle::Particle;

/// Assemble the two motion-gating projectors from the particle's
/// current tangent vectors.
///
/// The column space of `posproj` spans the directions along which the
/// particle may move *downward* in height (tangent 1, or tangents 1
/// and 2), for seeking minima where the second derivative is positive.
/// `negproj` is the same for *upward* motion (negative tangents 1
/// and/or 2), for seeking maxima where the second derivative is
/// negative.
///
/// Each enabled tangent `t` contributes its outer product `t tT`. The
/// caller guarantees the tangents are unit length and mutually
/// orthogonal when more than one is used; no orthonormalization is
/// performed here. With no tangent enabled at all, the particle must be
/// chasing point features and needs freedom to go after them: `posproj`
/// becomes the identity and `negproj` stays zero.
pub fn crease_proj(
    layout: &InfoLayout,
    point: &Particle,
    tang1_use: bool,
    tang2_use: bool,
    negtang1_use: bool,
    negtang2_use: bool,
) -> (Matrix3<f64>, Matrix3<f64>) {
    let mut posproj = Matrix3::zeros();
    if tang1_use {
        let tng = point_vector(layout, point, InfoKind::Tangent1);
        posproj += tng * tng.transpose();
    }
    if tang2_use {
        let tng = point_vector(layout, point, InfoKind::Tangent2);
        posproj += tng * tng.transpose();
    }

    let mut negproj = Matrix3::zeros();
    if negtang1_use {
        let tng = point_vector(layout, point, InfoKind::NegativeTangent1);
        negproj += tng * tng.transpose();
    }
    if negtang2_use {
        let tng = point_vector(layout, point, InfoKind::NegativeTangent2);
        negproj += tng * tng.transpose();
    }

    if !tang1_use && !tang2_use && !negtang1_use && !negtang2_use {
        posproj = Matrix3::identity();
    }

    (posproj, negproj)
}
