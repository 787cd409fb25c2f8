//! One-dimensional Newton descent onto an isovalue zero.

use log::trace;
use nalgebra::Vector3;

use super::{ConstraintFail, clamp_step, normalize};
use crate::context::Context;
use crate::error::Error;
use crate::field::{FieldProbe, point_scalar};
use crate::info::InfoKind;
use crate::particle::{Cond, Particle};

const ME: &str = "satisfy_iso";

/// Best-so-far snapshot of the isovalue descent.
#[derive(Clone, Copy)]
struct IsoState {
    val: f64,
    aval: f64,
    grad: Vector3<f64>,
    pos: Vector3<f64>,
}

fn probe(
    field: &dyn FieldProbe,
    ctx: &Context,
    point: &mut Particle,
    iter: u32,
) -> Result<(f64, f64, Vector3<f64>), Error> {
    field
        .probe(&ctx.layout, point)
        .map_err(|source| Error::Probe {
            site: ME,
            iter,
            source,
        })?;
    let mut grad = Vector3::zeros();
    let val = point_scalar(&ctx.layout, point, InfoKind::Isovalue, Some(&mut grad), None);
    Ok((val, val.abs(), grad))
}

/// Newton descent on the signed isovalue scalar toward its zero, with
/// back-tracking.
///
/// Per iteration: normalize the gradient into a direction, take the
/// Newton step `-val / |grad|` clamped to the trust region, re-probe,
/// and keep the move only if it got no further from the root. A
/// rejected move restores the best-so-far snapshot and shrinks the step
/// scalar; an accepted move that is already smaller than
/// `step_max * constr_eps` means convergence.
pub(crate) fn satisfy_iso(
    field: &dyn FieldProbe,
    ctx: &Context,
    point: &mut Particle,
    step_max: f64,
    constr_eps: f64,
    iter_max: u32,
) -> Result<ConstraintFail, Error> {
    let (mut val, mut aval, mut grad) = probe(field, ctx, point, 0)?;
    let mut state = IsoState {
        val,
        aval,
        grad,
        pos: point.spatial(),
    };
    let mut hack = 1.0;
    let mut converged = false;
    for iter in 1..=iter_max {
        // consider: Halley's method uses the Hessian for cubic convergence
        let (dir, len) = normalize(grad, ctx.flag.zero_z);
        if len == 0.0 {
            // no gradient; back off
            hack *= ctx.sys_parm.back_step_scale;
            (val, aval, grad) = (state.val, state.aval, state.grad);
            point.set_spatial(state.pos);
            continue;
        }
        let step = clamp_step(-val / len, step_max);
        point.set_spatial(point.spatial() + hack * step * dir);
        (val, aval, grad) = probe(field, ctx, point, iter)?;
        point.history_add(Cond::ConstraintSatA, val);
        if aval <= state.aval {
            // we're no further from the root
            if step.abs() < step_max * constr_eps {
                converged = true;
                break;
            }
            state = IsoState {
                val,
                aval,
                grad,
                pos: point.spatial(),
            };
            hack = 1.0;
        } else {
            trace!(
                "{ME}: pnt {} iter {iter}: |val| rose {} -> {aval}; backing off",
                point.idtag, state.aval
            );
            hack *= ctx.sys_parm.back_step_scale;
            (val, aval, grad) = (state.val, state.aval, state.grad);
            point.set_spatial(state.pos);
        }
    }
    Ok(if converged {
        ConstraintFail::Ok
    } else {
        ConstraintFail::IterMaxed
    })
}
