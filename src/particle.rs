//! The particle record mutated by a solve, and its optional
//! position-history diagnostic ring.

use nalgebra::{Vector3, Vector4};

use crate::constraint::ConstraintFail;
use crate::info::{InfoKind, InfoLayout};

/// Tag naming the site that recorded a position-history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    /// Initial probe before any step was taken.
    Old,
    /// Post-move probe of a primary (downhill) pass or phase.
    ConstraintSatA,
    /// Post-move probe of a secondary (uphill or refinement) pass.
    ConstraintSatB,
    /// Terminal entry of a solve that ended in a classified failure.
    ConstraintFail,
    /// Terminal entry of a solve that converged.
    ConstraintSuccess,
}

/// One appended position-history record.
#[derive(Debug, Clone, Copy)]
pub struct HistoryEntry {
    pub pos: Vector4<f64>,
    pub cond: Cond,
    pub val: f64,
}

/// A point of the particle population.
///
/// Carries a 4-D position `(x, y, z, s)` whose scale coordinate `s` is
/// never mutated by the constraint core, an identity tag used only for
/// diagnostics, and the info vector the field probe fills at the
/// current position. Spatial access goes through [`spatial`] and
/// [`set_spatial`] so no solver can touch the scale coordinate.
///
/// [`spatial`]: Particle::spatial
/// [`set_spatial`]: Particle::set_spatial
#[derive(Debug, Clone)]
pub struct Particle {
    /// Identity tag, for diagnostics only.
    pub idtag: u32,
    /// Outcome of the most recent solve.
    pub constr_fail: ConstraintFail,
    pos: Vector4<f64>,
    info: Vec<f64>,
    history: Option<Vec<HistoryEntry>>,
}

impl Particle {
    /// Create a particle at `pos` with an info vector sized by `layout`.
    pub fn new(idtag: u32, pos: Vector4<f64>, layout: &InfoLayout) -> Self {
        Self {
            idtag,
            constr_fail: ConstraintFail::Ok,
            pos,
            info: vec![0.0; layout.total_len()],
            history: None,
        }
    }

    /// Full 4-D position.
    pub fn pos(&self) -> &Vector4<f64> {
        &self.pos
    }

    /// Spatial part of the position.
    pub fn spatial(&self) -> Vector3<f64> {
        self.pos.xyz()
    }

    /// Overwrite the spatial part of the position. The scale coordinate
    /// is untouched.
    pub fn set_spatial(&mut self, p: Vector3<f64>) {
        self.pos.fixed_rows_mut::<3>(0).copy_from(&p);
    }

    /// Scale coordinate `s`.
    pub fn scale(&self) -> f64 {
        self.pos[3]
    }

    /// Probed info vector at the current position.
    pub fn info(&self) -> &[f64] {
        &self.info
    }

    /// Mutable info vector, for probe backends that fill it wholesale.
    pub fn info_mut(&mut self) -> &mut [f64] {
        &mut self.info
    }

    /// Write one channel's answer into the info vector. A channel the
    /// layout does not enable is silently skipped.
    pub fn write_info(&mut self, layout: &InfoLayout, kind: InfoKind, values: &[f64]) {
        debug_assert_eq!(values.len(), kind.answer_len(), "bad answer length for {kind}");
        if let Some(off) = layout.offset(kind) {
            self.info[off..off + values.len()].copy_from_slice(values);
        }
    }

    /// Turn on position-history recording for this particle.
    pub fn enable_history(&mut self) {
        if self.history.is_none() {
            self.history = Some(Vec::new());
        }
    }

    /// Recorded history, if recording is enabled.
    pub fn history(&self) -> Option<&[HistoryEntry]> {
        self.history.as_deref()
    }

    /// Append a history record at the current position. No-op unless
    /// recording is enabled.
    pub fn history_add(&mut self, cond: Cond, val: f64) {
        if let Some(hist) = &mut self.history {
            hist.push(HistoryEntry {
                pos: self.pos,
                cond,
                val,
            });
        }
    }
}
