//! Constraint satisfaction: projecting particles onto the nearest point
//! of an implicitly defined manifold.
//!
//! The driver [`satisfy`] dispatches on the constraint kind to one of
//! three solvers sharing a common scaffold (probe, project, step,
//! re-probe, accept or back off) but differing in their convergence
//! predicates and step formulas:
//!
//! * [`iso`] — 1-D Newton descent onto an isovalue zero,
//! * [`lapl`] — bracket a Laplacian sign change, then Illinois
//!   false-position,
//! * [`height`] — projected Newton descent/ascent onto extrema and
//!   creases of the height field.

use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};
use std::fmt;

use crate::context::{Context, CountKind};
use crate::error::Error;
use crate::field::{FieldProbe, point_scalar};
use crate::info::InfoKind;
use crate::particle::Particle;

mod height;
mod iso;
mod lapl;
mod proj;

pub use proj::crease_proj;

/// Classified outcome of a constraint-satisfaction call.
///
/// Everything except [`ConstraintFail::Ok`] signals the enclosing
/// engine that the particle should likely be retired or relocated; the
/// particle's position is still valid (the best-so-far snapshot or the
/// last pre-failure position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintFail {
    /// The particle is on the manifold to within tolerance.
    #[default]
    Ok,
    /// Iteration budget exhausted without convergence.
    IterMaxed,
    /// Zero Hessian in the downhill pass of the height solver.
    HessZeroA,
    /// Zero Hessian in the uphill pass of the height solver.
    HessZeroB,
    /// Zero projected gradient in the downhill pass.
    ProjGradZeroA,
    /// Zero projected gradient in the uphill pass.
    ProjGradZeroB,
    /// Total displacement exceeded the travel budget.
    Travel,
    /// All four tangent channels enabled at once.
    BadTangents,
}

impl ConstraintFail {
    /// Whether the solve succeeded.
    pub fn is_ok(self) -> bool {
        self == ConstraintFail::Ok
    }
}

impl fmt::Display for ConstraintFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintFail::Ok => "ok",
            ConstraintFail::IterMaxed => "iter maxed",
            ConstraintFail::HessZeroA => "hess zero A",
            ConstraintFail::HessZeroB => "hess zero B",
            ConstraintFail::ProjGradZeroA => "proj grad zero A",
            ConstraintFail::ProjGradZeroB => "proj grad zero B",
            ConstraintFail::Travel => "travel",
            ConstraintFail::BadTangents => "bad tangents",
        };
        f.write_str(name)
    }
}

/// Normalize `grad` into a unit direction, returning the direction and
/// the pre-normalization length. A zero gradient yields the zero vector
/// and length 0. With `zero_z` the z component is masked before the
/// length is computed.
pub(crate) fn normalize(mut grad: Vector3<f64>, zero_z: bool) -> (Vector3<f64>, f64) {
    if zero_z {
        grad.z = 0.0;
    }
    let len = grad.norm();
    if len == 0.0 {
        (Vector3::zeros(), 0.0)
    } else {
        (grad / len, len)
    }
}

/// Clamp a step length to the trust region, preserving sign.
pub(crate) fn clamp_step(step: f64, step_max: f64) -> f64 {
    if step > 0.0 {
        step.min(step_max)
    } else {
        step.max(-step_max)
    }
}

/// Sign of `x`: -1, 0, or +1.
pub(crate) fn sgn(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Project the particle onto the constraint manifold.
///
/// Snapshots the original position, dispatches to the solver for the
/// configured constraint kind, and stores the classified outcome in
/// `point.constr_fail`. If the total displacement exceeds `travel_max`
/// voxel widths, the outcome is overridden with
/// [`ConstraintFail::Travel`] regardless of what the solver reported.
///
/// The scale coordinate `point.pos()[3]` is never touched: constraints
/// are spatial only.
///
/// Errors are showstoppers only (probe failure, non-finite position);
/// classified failures are not errors.
pub fn satisfy(
    field: &dyn FieldProbe,
    ctx: &Context,
    point: &mut Particle,
    travel_max: f64,
) -> Result<(), Error> {
    let pos_orig = point.spatial();
    let step_max = ctx.voxel_size_space;
    let iter_max = ctx.iter_parm.constraint_max;
    let constr_eps = ctx.sys_parm.constraint_step_min;
    // TODO: grow constr_eps with the scale coordinate for scale-space
    // populations; needs the sigma-of-tau mapping wired into Flags first.

    ctx.count.add(CountKind::ConstraintSatisfy);
    let fail = match ctx.constraint {
        // Zero-crossing edges: finer steps, bigger budget.
        InfoKind::HeightLaplacian => {
            lapl::satisfy_lapl(field, ctx, point, step_max / 4.0, constr_eps, 4 * iter_max)?
        }
        InfoKind::Isovalue => iso::satisfy_iso(field, ctx, point, step_max, constr_eps, iter_max)?,
        InfoKind::Height => {
            let tang1 = ctx.layout.has(InfoKind::Tangent1);
            let tang2 = ctx.layout.has(InfoKind::Tangent2);
            let negtang1 = ctx.layout.has(InfoKind::NegativeTangent1);
            let negtang2 = ctx.layout.has(InfoKind::NegativeTangent2);
            if tang1 && tang2 && negtang1 && negtang2 {
                ConstraintFail::BadTangents
            } else {
                height::satisfy_height(
                    field, ctx, point, tang1, tang2, negtang1, negtang2, step_max, constr_eps,
                    iter_max,
                )?
            }
        }
        other => {
            warn!("constraint on {other} unimplemented");
            ConstraintFail::Ok
        }
    };
    point.constr_fail = fail;

    let travel = (point.spatial() - pos_orig).norm() / ctx.voxel_size_space;
    if travel > travel_max {
        debug!(
            "pnt {}: travel {travel} > travelMax {travel_max}",
            point.idtag
        );
        point.constr_fail = ConstraintFail::Travel;
    }
    Ok(())
}

/// Projection onto the (approximate) tangent space of the constraint
/// manifold at a converged particle.
///
/// The eigenvectors with non-zero eigenvalues of the returned matrix
/// approximate tangents to the manifold. This is *not* the space of
/// directions the particle may move along during satisfaction (that is
/// [`crease_proj`]'s job for creases).
///
/// Assumes the particle's info vector reflects a probe at its current
/// position.
pub fn constraint_tangent(ctx: &Context, point: &Particle) -> Matrix3<f64> {
    let mut proj = Matrix3::identity();
    match ctx.constraint {
        InfoKind::Height => {
            let (posproj, negproj) = crease_proj(
                &ctx.layout,
                point,
                ctx.layout.has(InfoKind::Tangent1),
                ctx.layout.has(InfoKind::Tangent2),
                ctx.layout.has(InfoKind::NegativeTangent1),
                ctx.layout.has(InfoKind::NegativeTangent2),
            );
            proj -= posproj;
            proj -= negproj;
        }
        InfoKind::HeightLaplacian | InfoKind::Isovalue => {
            // The height gradient approximates the normal of a Laplacian
            // zero-crossing; the isovalue gradient is the exact normal of
            // an isosurface.
            let kind = if ctx.constraint == InfoKind::HeightLaplacian {
                InfoKind::Height
            } else {
                InfoKind::Isovalue
            };
            let mut grad = Vector3::zeros();
            point_scalar(&ctx.layout, point, kind, Some(&mut grad), None);
            let (nvec, len) = normalize(grad, false);
            if len > 0.0 {
                proj -= nvec * nvec.transpose();
            }
        }
        _ => {}
    }
    proj
}

/// Dimension (not codimension) of the constraint manifold: 0 for
/// points, 1 for lines, 2 for surfaces.
///
/// For height constraints the dimension follows from how many tangent
/// channels are enabled; all four at once is an error, since the
/// implied codimension would be -1.
pub fn constraint_dim(ctx: &Context) -> Result<u32, Error> {
    match ctx.constraint {
        InfoKind::HeightLaplacian | InfoKind::Isovalue => Ok(2),
        InfoKind::Height => {
            let ntang = [
                InfoKind::Tangent1,
                InfoKind::Tangent2,
                InfoKind::NegativeTangent1,
                InfoKind::NegativeTangent2,
            ]
            .iter()
            .filter(|&&kind| ctx.layout.has(kind))
            .count();
            match ntang {
                0 | 3 => Ok(0),
                1 => Ok(2),
                2 => Ok(1),
                _ => Err(Error::BadTangents),
            }
        }
        other => Err(Error::UnsupportedConstraint(other)),
    }
}
