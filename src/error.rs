//! Fatal-error channel of the constraint core.
//!
//! Showstoppers only: a failed field probe or a proposed move that left
//! a coordinate non-finite. Classified solve failures (iteration budget,
//! degenerate Hessian, travel overflow, …) are not errors; they are
//! returned on the particle as a [`ConstraintFail`] code.
//!
//! [`ConstraintFail`]: crate::constraint::ConstraintFail

use thiserror::Error;

use crate::info::InfoKind;

/// Failure reported by a field-probe backend.
///
/// The core treats any probe failure as fatal and propagates it wrapped
/// in [`Error::Probe`] with the reporting site and iteration number.
#[derive(Debug, Error)]
#[error("field probe failed: {0}")]
pub struct ProbeError(pub String);

/// Errors that abort a solve outright.
#[derive(Debug, Error)]
pub enum Error {
    /// A field probe failed mid-solve.
    #[error("{site}: on iter {iter}")]
    Probe {
        site: &'static str,
        iter: u32,
        #[source]
        source: ProbeError,
    },

    /// A proposed move produced a non-finite coordinate.
    #[error(
        "{site}: iter {iter}: pnt {idtag} bad pos ({x},{y},{z},{s}); hack {hack}, step {step}"
    )]
    NonFinitePos {
        site: &'static str,
        iter: u32,
        idtag: u32,
        x: f64,
        y: f64,
        z: f64,
        s: f64,
        hack: f64,
        step: f64,
    },

    /// All four tangent channels enabled at once; the implied manifold
    /// codimension would be -1.
    #[error("can't simultaneously use all four tangents as this implies co-dimension of -1")]
    BadTangents,

    /// Constraint kind with no solver or manifold-dimension rule.
    #[error("constraint on {0} unimplemented")]
    UnsupportedConstraint(InfoKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_error_carries_site_and_iter() {
        let err = Error::Probe {
            site: "satisfy_iso",
            iter: 3,
            source: ProbeError("out of bounds".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("satisfy_iso"));
        assert!(msg.contains("iter 3"));
    }

    #[test]
    fn unsupported_constraint_names_kind() {
        let err = Error::UnsupportedConstraint(InfoKind::Tangent1);
        assert!(err.to_string().contains("tangent1"));
    }
}
