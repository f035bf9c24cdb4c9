#![warn(missing_docs)]

//! Coverage path planning for robotic spraying.
//!
//! This crate turns a trimmed free-form surface into one continuous
//! serpentine spray path. Passes are laid out on an enlarged copy of the
//! surface, kept where they come near the real surface, clipped to the
//! perimeter grown by an overspray margin and stitched together along
//! that margin. The finished path can then be split into on-surface and
//! off-surface runs for waste accounting.
//!
//! All heavy geometry goes through a [`GeometryKernel`].
//!
//! # Example
//!
//! ```ignore
//! use spraypath::{extend_surface, spray_path, SpraySettings};
//! use spraypath_kernel_discrete::DiscreteKernel;
//! use spraypath_kernel_geom::Plane;
//!
//! let kernel = DiscreteKernel::default();
//! let settings = SpraySettings::default();
//! let frame = Plane::spray_frame(settings.angle);
//! let extended = extend_surface(&kernel, &surface, &frame, &settings.extension, &settings.tolerance)?;
//! let path = spray_path(&kernel, &surface, &extended, &settings)?;
//! ```

pub mod classify;
pub mod connect;
pub mod error;
pub mod extend;
pub mod filter;
pub mod geodesic;
pub mod isoline;
pub mod offset;
pub mod trim;
pub mod waste;

pub use classify::{classify_path, interleave, PathSegment};
pub use connect::{connect_geometries, get_subcurve, shortest_subcurve, PathGeometry};
pub use error::{Result, SprayPathError};
pub use extend::{extend_surface, rotation_invariant_box, ExtendedSurface};
pub use filter::{conform_to_surface, filter_by_distance, min_distance};
pub use geodesic::geodesics;
pub use isoline::isolines;
pub use offset::{offset_bounds, perimeter, spray_edge_path};
pub use trim::{trim_curve_boundary, TrimResult};
pub use waste::{
    path_properties, spray_circles, waste_report, PathProperties, SpeedSettings, SprayCircle,
    WasteReport,
};

use serde::{Deserialize, Serialize};
use spraypath_kernel_geom::{Curve, GeometryKernel, Plane};
use spraypath_kernel_math::Tolerance;
use tracing::{debug, warn};

/// Surface extension parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionSettings {
    /// Boxes fitted while growing the extension outline (odd).
    pub extend_iterations: usize,
    /// Boxes fitted while growing the geodesic rail outline (odd).
    pub outline_iterations: usize,
    /// Samples per side of the closest-point grid fed to the patch fit.
    pub sample_grid: usize,
    /// Patch spans along u.
    pub u_spans: usize,
    /// Patch spans along v.
    pub v_spans: usize,
    /// Pin the patch to the outline on each of its four edges.
    pub fixed_edges: [bool; 4],
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            extend_iterations: 5,
            outline_iterations: 3,
            sample_grid: 100,
            u_spans: 20,
            v_spans: 20,
            fixed_edges: [true; 4],
        }
    }
}

impl ExtensionSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        for (name, steps) in [
            ("extend_iterations", self.extend_iterations),
            ("outline_iterations", self.outline_iterations),
        ] {
            if steps % 2 == 0 {
                return Err(SprayPathError::InvalidSettings(format!(
                    "{name} must be odd, got {steps}"
                )));
            }
        }
        if self.sample_grid < 2 {
            return Err(SprayPathError::InvalidSettings(
                "sample_grid must be at least 2".into(),
            ));
        }
        if self.u_spans == 0 || self.v_spans == 0 {
            return Err(SprayPathError::InvalidSettings(
                "patch spans must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Spray path parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpraySettings {
    /// Pass direction, radians about world Z. Zero runs passes along X.
    pub angle: f64,
    /// Distance between neighbouring passes, also the spray width.
    pub pass_spacing: f64,
    /// How far passes run past the surface edge.
    pub overspray_distance: f64,
    /// Number of geodesics in the field.
    pub geodesic_count: usize,
    /// Samples per pass for the distance filter.
    pub filter_samples: usize,
    /// Surface extension.
    pub extension: ExtensionSettings,
    /// Modelling tolerances.
    pub tolerance: Tolerance,
}

impl Default for SpraySettings {
    fn default() -> Self {
        Self {
            angle: 0.0,
            pass_spacing: 1.0,
            overspray_distance: 0.5,
            geodesic_count: 10,
            filter_samples: 100,
            extension: ExtensionSettings::default(),
            tolerance: Tolerance::default(),
        }
    }
}

impl SpraySettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.angle.is_finite() {
            return Err(SprayPathError::InvalidSettings(
                "angle must be finite".into(),
            ));
        }
        if self.pass_spacing <= 0.0 {
            return Err(SprayPathError::InvalidSettings(
                "pass_spacing must be positive".into(),
            ));
        }
        if self.overspray_distance < 0.0 {
            return Err(SprayPathError::InvalidSettings(
                "overspray_distance must not be negative".into(),
            ));
        }
        if self.geodesic_count < 2 {
            return Err(SprayPathError::InvalidSettings(
                "geodesic_count must be at least 2".into(),
            ));
        }
        if self.filter_samples == 0 {
            return Err(SprayPathError::InvalidSettings(
                "filter_samples must be positive".into(),
            ));
        }
        if self.tolerance.linear <= 0.0 {
            return Err(SprayPathError::InvalidSettings(
                "linear tolerance must be positive".into(),
            ));
        }
        self.extension.validate()
    }
}

/// First result of a multi-result kernel call.
///
/// Extra results are reported and dropped; no result at all is an error.
pub(crate) fn primary<T>(results: Vec<T>, what: &'static str) -> Result<T> {
    let count = results.len();
    let mut iter = results.into_iter();
    let first = iter
        .next()
        .ok_or(SprayPathError::Kernel(spraypath_kernel_geom::KernelError::NoResult(what)))?;
    if count > 1 {
        warn!(what, count, "kernel returned several results, keeping the first");
    }
    Ok(first)
}

/// Plan a serpentine spray path over `surface`.
///
/// `extended` must cover the surface and its overspray margin, normally
/// from [`extend_surface`] with the frame for `settings.angle`.
pub fn spray_path<K: GeometryKernel>(
    kernel: &K,
    surface: &K::Surface,
    extended: &ExtendedSurface<K::Surface>,
    settings: &SpraySettings,
) -> Result<K::Curve> {
    settings.validate()?;
    let tol = &settings.tolerance;
    let frame = Plane::spray_frame(settings.angle);

    let field = geodesics(
        kernel,
        surface,
        extended,
        &frame,
        settings.geodesic_count,
        &settings.extension,
        tol,
    )?;
    let passes = isolines(kernel, &field, settings.pass_spacing, tol)?;
    let total = passes.len();
    let passes = filter_by_distance(
        passes,
        surface,
        settings.pass_spacing / 2.0,
        settings.filter_samples,
    );
    if passes.is_empty() {
        warn!(total, "no pass comes near the surface");
        return Err(SprayPathError::Degenerate(
            "every pass was filtered out".into(),
        ));
    }
    let passes = conform_to_surface(kernel, &passes, extended, tol)?;

    let bounds = offset_bounds(kernel, surface, extended, settings.overspray_distance, tol)?;
    let mut clipped = Vec::new();
    for pass in &passes {
        clipped.extend(trim_curve_boundary(kernel, pass, &bounds, tol)?.inside);
    }
    debug!(passes = passes.len(), arcs = clipped.len(), "passes clipped to bounds");

    let geometries: Vec<PathGeometry<K::Curve>> = clipped
        .into_iter()
        .enumerate()
        .map(|(i, c)| PathGeometry::Curve(if i % 2 == 1 { c.reversed() } else { c }))
        .collect();
    connect_geometries(kernel, &geometries, &bounds, tol)
}

/// Connect `geometries` in order along the perimeter grown by `overspray`.
pub fn connect_paths_through_bounds<K: GeometryKernel>(
    kernel: &K,
    geometries: &[PathGeometry<K::Curve>],
    surface: &K::Surface,
    extended: &ExtendedSurface<K::Surface>,
    overspray: f64,
    tol: &Tolerance,
) -> Result<K::Curve> {
    let bounds = offset_bounds(kernel, surface, extended, overspray, tol)?;
    connect_geometries(kernel, geometries, &bounds, tol)
}
