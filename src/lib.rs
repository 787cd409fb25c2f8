//! crease — constraint-satisfaction engine for particle systems that
//! sample implicit features of a scalar field: isosurfaces, ridge and
//! valley creases, and Laplacian zero-crossings.
//!
//! Given a particle's current position, [`satisfy`] projects it onto
//! the nearest point of the constraint manifold using iterative,
//! gradient-guided descent with back-tracking. The field itself is
//! supplied by the caller through the [`FieldProbe`] trait; the engine
//! only slices values, gradients, and Hessians out of the particle's
//! info vector.
//!
//! # Quick Start
//!
//! ```
//! use crease::{Context, FieldProbe, InfoKind, InfoLayout, Particle, ProbeError};
//! use nalgebra::Vector4;
//!
//! /// Unit sphere as the zero set of f = |p|^2 - 1.
//! struct Sphere;
//!
//! impl FieldProbe for Sphere {
//!     fn probe(&self, layout: &InfoLayout, point: &mut Particle) -> Result<(), ProbeError> {
//!         let p = point.spatial();
//!         point.write_info(layout, InfoKind::Isovalue, &[p.norm_squared() - 1.0]);
//!         point.write_info(
//!             layout,
//!             InfoKind::IsovalueGradient,
//!             &[2.0 * p.x, 2.0 * p.y, 2.0 * p.z],
//!         );
//!         Ok(())
//!     }
//! }
//!
//! let layout = InfoLayout::new(&[InfoKind::Isovalue, InfoKind::IsovalueGradient]);
//! let ctx = Context::new(InfoKind::Isovalue, layout);
//! let mut point = Particle::new(0, Vector4::new(2.0, 0.0, 0.0, 0.0), &ctx.layout);
//!
//! crease::satisfy(&Sphere, &ctx, &mut point, 10.0).unwrap();
//!
//! assert!(point.constr_fail.is_ok());
//! assert!((point.spatial().norm() - 1.0).abs() < 1e-3);
//! ```

pub mod constraint;
pub mod context;
pub mod error;
pub mod field;
pub mod info;
pub mod particle;

// Re-exports for convenience
pub use constraint::{ConstraintFail, constraint_dim, constraint_tangent, crease_proj, satisfy};
pub use context::{Context, CountKind, Counts, Flags, IterParms, SysParms};
pub use error::{Error, ProbeError};
pub use field::{FieldProbe, point_scalar, point_vector};
pub use info::{InfoKind, InfoLayout};
pub use particle::{Cond, HistoryEntry, Particle};
