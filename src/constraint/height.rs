//! Projected Newton descent/ascent on the height channel, for extrema
//! and crease features.

use log::trace;
use nalgebra::{Matrix3, Vector3};

use super::{ConstraintFail, clamp_step, crease_proj, normalize};
use crate::context::Context;
use crate::error::Error;
use crate::field::{FieldProbe, point_scalar};
use crate::info::InfoKind;
use crate::particle::{Cond, Particle};

const ME: &str = "satisfy_height";

/// Which sub-pass is running: downhill toward minima/ridges through
/// `posproj`, or uphill toward maxima/valleys through `negproj`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Pass {
    Down,
    Up,
}

impl Pass {
    fn site(self) -> &'static str {
        match self {
            Pass::Down => "satisfy_height (+)",
            Pass::Up => "satisfy_height (-)",
        }
    }

    fn hess_zero_fail(self) -> ConstraintFail {
        match self {
            Pass::Down => ConstraintFail::HessZeroA,
            Pass::Up => ConstraintFail::HessZeroB,
        }
    }

    fn proj_grad_zero_fail(self) -> ConstraintFail {
        match self {
            Pass::Down => ConstraintFail::ProjGradZeroA,
            Pass::Up => ConstraintFail::ProjGradZeroB,
        }
    }

    fn hist_cond(self) -> Cond {
        match self {
            Pass::Down => Cond::ConstraintSatA,
            Pass::Up => Cond::ConstraintSatB,
        }
    }
}

/// Best-so-far snapshot shared by both sub-passes.
#[derive(Clone, Copy)]
struct HeightState {
    val: f64,
    grad: Vector3<f64>,
    hess: Matrix3<f64>,
    posproj: Matrix3<f64>,
    negproj: Matrix3<f64>,
    pos: Vector3<f64>,
}

/// Tangent-use flags for one solve.
#[derive(Clone, Copy)]
struct TangUse {
    tang1: bool,
    tang2: bool,
    negtang1: bool,
    negtang2: bool,
}

fn probe(
    field: &dyn FieldProbe,
    ctx: &Context,
    point: &mut Particle,
    tang: TangUse,
    site: &'static str,
    iter: u32,
) -> Result<HeightState, Error> {
    field
        .probe(&ctx.layout, point)
        .map_err(|source| Error::Probe { site, iter, source })?;
    let mut grad = Vector3::zeros();
    let mut hess = Matrix3::zeros();
    let val = point_scalar(
        &ctx.layout,
        point,
        InfoKind::Height,
        Some(&mut grad),
        Some(&mut hess),
    );
    let (posproj, negproj) = crease_proj(
        &ctx.layout,
        point,
        tang.tang1,
        tang.tang2,
        tang.negtang1,
        tang.negtang2,
    );
    Ok(HeightState {
        val,
        grad,
        hess,
        posproj,
        negproj,
        pos: point.spatial(),
    })
}

/// What one sub-pass did with its iteration.
enum PassOutcome {
    /// The pass's convergence criterion fired; no move was taken.
    Converged,
    /// A step was taken (and either accepted or rolled back).
    Moved,
    /// Degenerate geometry: abort the whole solve with this code.
    Fail(ConstraintFail),
}

/// One projected-Newton sub-pass. Reuses (and may update) the shared
/// snapshot and step scalar.
#[allow(clippy::too_many_arguments)]
fn sub_pass(
    pass: Pass,
    field: &dyn FieldProbe,
    ctx: &Context,
    point: &mut Particle,
    tang: TangUse,
    state: &mut HeightState,
    hack: &mut f64,
    zero_gmag_okay: bool,
    step_max: f64,
    constr_eps: f64,
    iter: u32,
) -> Result<PassOutcome, Error> {
    let proj = match pass {
        Pass::Down => state.posproj,
        Pass::Up => state.negproj,
    };
    let (pdir, plen) = normalize(proj * state.grad, ctx.flag.zero_z);
    let d1 = state.grad.dot(&pdir);
    let d2 = (state.hess * pdir).dot(&pdir);

    if state.hess.norm() == 0.0 {
        return Ok(PassOutcome::Fail(pass.hess_zero_fail()));
    }
    let step = if plen == 0.0 {
        if !zero_gmag_okay {
            return Ok(PassOutcome::Fail(pass.proj_grad_zero_fail()));
        }
        // Reaching an exactly-zero projected gradient happens when
        // chasing point extrema (or saddles) and is not a problem; take
        // a zero step and fall through to the convergence test.
        0.0
    } else {
        let raw = match pass {
            Pass::Down => {
                if d2 > 0.0 {
                    -d1 / d2
                } else {
                    -plen
                }
            }
            Pass::Up => {
                if d2 < 0.0 {
                    -d1 / d2
                } else {
                    plen
                }
            }
        };
        clamp_step(raw, step_max)
    };

    let curvature_ok = match pass {
        Pass::Down => d2 > 0.0,
        Pass::Up => d2 < 0.0,
    };
    if curvature_ok && step.abs() < step_max * constr_eps {
        // concave the right way and close enough to the extremum
        return Ok(PassOutcome::Converged);
    }

    // we have to take a significant step
    point.set_spatial(point.spatial() + *hack * step * pdir);
    let pos = point.pos();
    if !(pos[0].is_finite() && pos[1].is_finite() && pos[2].is_finite() && pos[3].is_finite()) {
        return Err(Error::NonFinitePos {
            site: pass.site(),
            iter,
            idtag: point.idtag,
            x: pos[0],
            y: pos[1],
            z: pos[2],
            s: pos[3],
            hack: *hack,
            step,
        });
    }
    let probed = probe(field, ctx, point, tang, pass.site(), iter)?;
    point.history_add(pass.hist_cond(), probed.val);

    let progressed = match pass {
        Pass::Down => probed.val <= state.val,
        Pass::Up => probed.val >= state.val,
    };
    if progressed {
        *state = probed;
        *hack = 1.0;
    } else {
        trace!(
            "{}: pnt {} iter {iter}: regressed from {}; backing off",
            pass.site(),
            point.idtag,
            state.val
        );
        *hack *= ctx.sys_parm.back_step_scale;
        point.set_spatial(state.pos);
    }
    Ok(PassOutcome::Moved)
}

/// Projected Newton optimization of the height field.
///
/// Runs up to two sub-passes per iteration against one shared
/// snapshot: a downhill pass through `posproj` when positive tangents
/// are enabled (or none at all, the point-chasing mode with an identity
/// projector), and an uphill pass through `negproj` when negative
/// tangents are enabled. The solver exits with success once a pass
/// converges and the other is absent or converges right after;
/// degenerate geometry (zero Hessian, zero projected gradient) aborts
/// with the pass-specific code.
#[allow(clippy::too_many_arguments)]
pub(crate) fn satisfy_height(
    field: &dyn FieldProbe,
    ctx: &Context,
    point: &mut Particle,
    tang1: bool,
    tang2: bool,
    negtang1: bool,
    negtang2: bool,
    step_max: f64,
    constr_eps: f64,
    iter_max: u32,
) -> Result<ConstraintFail, Error> {
    let tang = TangUse {
        tang1,
        tang2,
        negtang1,
        negtang2,
    };
    // Zero projected gradients are tolerable once the engine is past
    // its first iteration and the features sought are points.
    let zero_gmag_okay = ctx.iter > 1 && ctx.constraint_dim == 0;
    let have_pos = tang1 || tang2;
    let have_neg = negtang1 || negtang2;
    let have_nada = !have_pos && !have_neg;

    let mut state = probe(field, ctx, point, tang, ME, 0)?;
    point.history_add(Cond::Old, state.val);
    let mut hack = 1.0;
    let mut converged = false;
    'outer: for iter in 1..=iter_max {
        // HEY: no opportunistic increase of hack?
        if have_pos || have_nada {
            match sub_pass(
                Pass::Down,
                field,
                ctx,
                point,
                tang,
                &mut state,
                &mut hack,
                zero_gmag_okay,
                step_max,
                constr_eps,
                iter,
            )? {
                PassOutcome::Fail(fail) => return Ok(fail),
                PassOutcome::Converged => {
                    if !have_neg {
                        converged = true;
                        break 'outer;
                    }
                    // close enough on the downhill side; skip the move
                    // and let the uphill pass decide
                }
                PassOutcome::Moved => {}
            }
        }
        if have_neg {
            match sub_pass(
                Pass::Up,
                field,
                ctx,
                point,
                tang,
                &mut state,
                &mut hack,
                zero_gmag_okay,
                step_max,
                constr_eps,
                iter,
            )? {
                PassOutcome::Fail(fail) => return Ok(fail),
                PassOutcome::Converged => {
                    converged = true;
                    break 'outer;
                }
                PassOutcome::Moved => {}
            }
        }
    }
    let fail = if converged {
        ConstraintFail::Ok
    } else {
        ConstraintFail::IterMaxed
    };
    point.history_add(
        if fail.is_ok() {
            Cond::ConstraintSuccess
        } else {
            Cond::ConstraintFail
        },
        f64::NAN,
    );
    Ok(fail)
}
