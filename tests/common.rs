//! Analytic probe backends and context builders shared by the
//! integration suite.

use crease::{Context, FieldProbe, InfoKind, InfoLayout, Particle, ProbeError};

/// f = x^2 - 1: isosurface sheets at x = +/- 1.
pub struct IsoQuadratic;

impl FieldProbe for IsoQuadratic {
    fn probe(&self, layout: &InfoLayout, point: &mut Particle) -> Result<(), ProbeError> {
        let p = point.spatial();
        point.write_info(layout, InfoKind::Isovalue, &[p.x * p.x - 1.0]);
        point.write_info(layout, InfoKind::IsovalueGradient, &[2.0 * p.x, 0.0, 0.0]);
        Ok(())
    }
}

/// Constant isovalue with an identically zero gradient.
pub struct IsoConstant(pub f64);

impl FieldProbe for IsoConstant {
    fn probe(&self, layout: &InfoLayout, point: &mut Particle) -> Result<(), ProbeError> {
        point.write_info(layout, InfoKind::Isovalue, &[self.0]);
        point.write_info(layout, InfoKind::IsovalueGradient, &[0.0, 0.0, 0.0]);
        Ok(())
    }
}

/// f = |p|^2 - 1: the unit sphere.
pub struct IsoSphere;

impl FieldProbe for IsoSphere {
    fn probe(&self, layout: &InfoLayout, point: &mut Particle) -> Result<(), ProbeError> {
        let p = point.spatial();
        point.write_info(layout, InfoKind::Isovalue, &[p.norm_squared() - 1.0]);
        point.write_info(
            layout,
            InfoKind::IsovalueGradient,
            &[2.0 * p.x, 2.0 * p.y, 2.0 * p.z],
        );
        Ok(())
    }
}

/// Laplacian L = x with a constant height gradient toward -x, so the
/// phase-A march heads for the zero-crossing plane x = 0.
pub struct LaplRamp;

impl FieldProbe for LaplRamp {
    fn probe(&self, layout: &InfoLayout, point: &mut Particle) -> Result<(), ProbeError> {
        let p = point.spatial();
        point.write_info(layout, InfoKind::HeightLaplacian, &[p.x]);
        point.write_info(layout, InfoKind::Height, &[-p.x]);
        point.write_info(layout, InfoKind::HeightGradient, &[-1.0, 0.0, 0.0]);
        Ok(())
    }
}

/// h = x^2 + y^2 with tangent1 = z: the enabled tangent only permits
/// motion along z, where the height never changes.
pub struct HeightCylinder;

impl FieldProbe for HeightCylinder {
    fn probe(&self, layout: &InfoLayout, point: &mut Particle) -> Result<(), ProbeError> {
        let p = point.spatial();
        point.write_info(layout, InfoKind::Height, &[p.x * p.x + p.y * p.y]);
        point.write_info(
            layout,
            InfoKind::HeightGradient,
            &[2.0 * p.x, 2.0 * p.y, 0.0],
        );
        point.write_info(
            layout,
            InfoKind::HeightHessian,
            &[2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0],
        );
        point.write_info(layout, InfoKind::Tangent1, &[0.0, 0.0, 1.0]);
        Ok(())
    }
}

/// Isovalue context with the given trust region, budget, and tolerance.
pub fn iso_ctx(voxel: f64, iter_max: u32, eps: f64) -> Context {
    let layout = InfoLayout::new(&[InfoKind::Isovalue, InfoKind::IsovalueGradient]);
    let mut ctx = Context::new(InfoKind::Isovalue, layout);
    ctx.voxel_size_space = voxel;
    ctx.iter_parm.constraint_max = iter_max;
    ctx.sys_parm.constraint_step_min = eps;
    ctx
}

/// Laplacian zero-crossing context.
pub fn lapl_ctx(voxel: f64, iter_max: u32, eps: f64) -> Context {
    let layout = InfoLayout::new(&[
        InfoKind::HeightLaplacian,
        InfoKind::Height,
        InfoKind::HeightGradient,
    ]);
    let mut ctx = Context::new(InfoKind::HeightLaplacian, layout);
    ctx.voxel_size_space = voxel;
    ctx.iter_parm.constraint_max = iter_max;
    ctx.sys_parm.constraint_step_min = eps;
    ctx
}

/// Height context with the given tangent channels enabled.
pub fn height_ctx(voxel: f64, iter_max: u32, eps: f64, tangents: &[InfoKind]) -> Context {
    let mut kinds = vec![
        InfoKind::Height,
        InfoKind::HeightGradient,
        InfoKind::HeightHessian,
    ];
    kinds.extend_from_slice(tangents);
    let mut ctx = Context::new(InfoKind::Height, InfoLayout::new(&kinds));
    ctx.voxel_size_space = voxel;
    ctx.iter_parm.constraint_max = iter_max;
    ctx.sys_parm.constraint_step_min = eps;
    ctx
}
