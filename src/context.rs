//! Process-wide configuration read by every solve, plus the shared
//! counters the driver bumps.
//!
//! Everything here except [`Counts`] is read-only for the duration of a
//! solve, so the enclosing engine may run one solve per worker thread
//! without further synchronization.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::info::{InfoKind, InfoLayout};

/// Iteration budgets.
#[derive(Debug, Clone, Copy)]
pub struct IterParms {
    /// Iteration budget per constraint-satisfaction call.
    pub constraint_max: u32,
}

/// System-level numeric parameters.
#[derive(Debug, Clone, Copy)]
pub struct SysParms {
    /// Convergence tolerance as a fraction of the trust-region radius:
    /// a step is small enough when `|step| < step_max * constraint_step_min`.
    pub constraint_step_min: f64,
    /// Multiplicative back-off applied to the step scalar when the last
    /// probe regressed the objective. Must lie in (0, 1).
    pub back_step_scale: f64,
}

/// Behavior flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
    /// Force the z component of every direction-building gradient to
    /// zero: 2-D-in-3-D mode.
    pub zero_z: bool,
    /// The scale coordinate is a tau parameter rather than sigma.
    /// Carried for configuration parity; nothing in the core consumes
    /// it yet.
    pub scale_is_tau: bool,
}

/// Operations tallied in the shared context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKind {
    /// Calls to the constraint-satisfaction driver.
    ConstraintSatisfy,
}

impl CountKind {
    /// Every counter, in canonical order.
    pub const ALL: [CountKind; 1] = [CountKind::ConstraintSatisfy];
}

/// Shared operation counters, one tally per [`CountKind`]. Atomic so
/// parallel per-particle solves can bump them without locking.
#[derive(Debug, Default)]
pub struct Counts {
    tally: [AtomicU64; CountKind::ALL.len()],
}

impl Counts {
    /// Current tally for `kind`.
    pub fn get(&self, kind: CountKind) -> u64 {
        self.tally[kind as usize].load(Ordering::Relaxed)
    }

    pub(crate) fn add(&self, kind: CountKind) {
        self.tally[kind as usize].fetch_add(1, Ordering::Relaxed);
    }
}

/// Read-only context for constraint satisfaction.
#[derive(Debug)]
pub struct Context {
    /// Which scalar channel the constraint lives on.
    pub constraint: InfoKind,
    /// Index table for the particle info vector; its enabled tangent
    /// channels gate motion for height constraints.
    pub layout: InfoLayout,
    /// Edge length of one voxel in world units; the trust-region radius
    /// for a single step.
    pub voxel_size_space: f64,
    pub iter_parm: IterParms,
    pub sys_parm: SysParms,
    pub flag: Flags,
    /// Global engine iteration, 1-based. Iteration 0 means "before the
    /// first engine pass".
    pub iter: u32,
    /// Cached manifold dimension of the constraint, kept current by the
    /// engine via [`constraint_dim`].
    ///
    /// [`constraint_dim`]: crate::constraint::constraint_dim
    pub constraint_dim: u32,
    /// Shared operation counters.
    pub count: Counts,
}

impl Context {
    /// Context with engine defaults for the given constraint and layout.
    pub fn new(constraint: InfoKind, layout: InfoLayout) -> Self {
        Self {
            constraint,
            layout,
            voxel_size_space: 1.0,
            iter_parm: IterParms { constraint_max: 15 },
            sys_parm: SysParms {
                constraint_step_min: 1e-4,
                back_step_scale: 0.5,
            },
            flag: Flags::default(),
            iter: 0,
            constraint_dim: 0,
            count: Counts::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ctx = Context::new(InfoKind::Isovalue, InfoLayout::default());
        assert_eq!(ctx.constraint, InfoKind::Isovalue);
        assert!((ctx.voxel_size_space - 1.0).abs() < 1e-15);
        assert_eq!(ctx.iter_parm.constraint_max, 15);
        assert!((ctx.sys_parm.back_step_scale - 0.5).abs() < 1e-15);
        assert!(!ctx.flag.zero_z);
        assert_eq!(ctx.count.get(CountKind::ConstraintSatisfy), 0);
    }

    #[test]
    fn counts_accumulate() {
        let counts = Counts::default();
        counts.add(CountKind::ConstraintSatisfy);
        counts.add(CountKind::ConstraintSatisfy);
        assert_eq!(counts.get(CountKind::ConstraintSatisfy), 2);
    }
}
