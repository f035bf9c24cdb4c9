//! Surface extension.
//!
//! Passes are generated on a surface that is larger than the one being
//! sprayed, so that every pass can run past the real edge whatever the
//! spray angle. The extension is a patch fitted through dense samples of
//! the original surface and bounded by a box that is (nearly) invariant
//! under rotation about world Z.

use rayon::prelude::*;
use spraypath_kernel_geom::{Curve, FrameBox, GeometryKernel, PatchOptions, Plane, Surface};
use spraypath_kernel_math::{Dir3, Point3, Tolerance, Vec3};
use tracing::debug;

use crate::{primary, ExtensionSettings, Result};

/// A surface whose active region covers the original surface under any
/// rotation, plus any boundary offset used later.
///
/// Built by [`extend_surface`], or wrapped around a caller-supplied
/// untrimmed surface with [`ExtendedSurface::from_untrimmed`].
#[derive(Debug, Clone)]
pub struct ExtendedSurface<S> {
    surface: S,
}

impl<S: Surface> ExtendedSurface<S> {
    /// Use an untrimmed surface that already covers the working region.
    pub fn from_untrimmed(surface: S) -> Self {
        Self { surface }
    }

    /// The extended surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Unwrap the extended surface.
    pub fn into_inner(self) -> S {
        self.surface
    }
}

/// Box around `surface` re-fitted alternately in `frame` and in `frame`
/// turned 45° about world Z, `steps` boxes in all.
///
/// Each re-box grows the footprint until it bounds every rotation of the
/// surface. With an odd `steps` the result is aligned with `frame`.
pub fn rotation_invariant_box<S: Surface>(surface: &S, frame: &Plane, steps: usize) -> FrameBox {
    let rotated = frame.rotated(std::f64::consts::FRAC_PI_4, &Dir3::new_normalize(Vec3::z()));
    let mut bounds = FrameBox::new(frame.clone(), surface.bounding_box_in(frame));
    for step in 1..steps {
        let target = if step % 2 == 1 { &rotated } else { frame };
        bounds = bounds.rebox(target);
    }
    bounds
}

/// Closed outline on the bottom of `bounds`: corners 0, 4, 5 and 1.
pub(crate) fn box_outline<K: GeometryKernel>(kernel: &K, bounds: &FrameBox) -> Result<K::Curve> {
    let c = bounds.corners();
    Ok(kernel.polyline(&[c[0], c[4], c[5], c[1]], true)?)
}

/// Build the extended surface for `surface` oriented by `frame`.
pub fn extend_surface<K: GeometryKernel>(
    kernel: &K,
    surface: &K::Surface,
    frame: &Plane,
    settings: &ExtensionSettings,
    tol: &Tolerance,
) -> Result<ExtendedSurface<K::Surface>> {
    settings.validate()?;
    let bounds = rotation_invariant_box(surface, frame, settings.extend_iterations);
    let outline = box_outline(kernel, &bounds)?;

    let n = settings.sample_grid;
    let bbox = surface.bounding_box();
    let z = 0.5 * (bbox.min.z + bbox.max.z);
    let step_x = (bbox.max.x - bbox.min.x) / (n - 1) as f64;
    let step_y = (bbox.max.y - bbox.min.y) / (n - 1) as f64;
    let samples: Vec<Point3> = (0..n * n)
        .into_par_iter()
        .map(|k| {
            let (i, j) = (k / n, k % n);
            let p = Point3::new(bbox.min.x + step_x * i as f64, bbox.min.y + step_y * j as f64, z);
            surface.closest_point(&p).point
        })
        .collect();
    debug!(samples = samples.len(), outline_length = outline.length(), "fitting extension patch");

    let options = PatchOptions {
        u_spans: settings.u_spans,
        v_spans: settings.v_spans,
        trim: false,
        tangency: true,
        point_spacing: outline.length() / 100.0,
        flexibility: 50.0,
        surface_pull: 10.0,
        fixed_edges: settings.fixed_edges,
    };
    let patches = kernel.patch_fit(&samples, &outline, &options, tol)?;
    let surface = primary(patches, "patch fit")?;
    Ok(ExtendedSurface { surface })
}
