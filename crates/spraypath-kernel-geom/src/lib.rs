#![warn(missing_docs)]

//! Curve, surface and kernel abstractions for spray path planning.
//!
//! The path planner never evaluates NURBS, intersects solids or offsets
//! curves itself. It talks to a [`GeometryKernel`], which owns those
//! numerical routines and supplies concrete [`Curve`], [`Surface`] and
//! solid types. This crate defines that seam plus the oriented [`Plane`]
//! and [`FrameBox`] helpers that every kernel shares.

mod frame;

pub use frame::{FrameBox, Plane};

use spraypath_kernel_math::{BoundingBox3, Dir3, Point2, Point3, Tolerance, Transform, Vec3};
use thiserror::Error;

/// Errors reported by a geometry kernel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// The input geometry is degenerate (zero length, zero area, collinear...).
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    /// The operation completed but produced nothing usable.
    #[error("{0} produced no result")]
    NoResult(&'static str),

    /// The operation received input it cannot handle.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A point on a surface together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    /// Location in 3D.
    pub point: Point3,
    /// Surface parameters `(u, v)`.
    pub uv: Point2,
}

// =============================================================================
// Curves
// =============================================================================

/// A parametric curve in 3D space.
pub trait Curve: Clone + Send + Sync + std::fmt::Debug {
    /// Parameter domain `(t_min, t_max)`.
    fn domain(&self) -> (f64, f64);

    /// True for periodic (closed) curves.
    fn is_closed(&self) -> bool;

    /// Arc length of the whole curve.
    fn length(&self) -> f64;

    /// Evaluate the curve at parameter `t`.
    fn point_at(&self, t: f64) -> Point3;

    /// Parameter reached after travelling `s` along the curve from its start.
    fn param_at_length(&self, s: f64) -> f64;

    /// Parameter of the curve point closest to `p`.
    fn closest_param(&self, p: &Point3) -> f64;

    /// A copy running the other way.
    fn reversed(&self) -> Self;

    /// Sub-curve over `[t0, t1]`; `None` unless `t0 < t1` inside the domain.
    fn trim(&self, t0: f64, t1: f64) -> Option<Self>;

    /// Axis-aligned bounding box.
    fn bounding_box(&self) -> BoundingBox3;

    /// A transformed copy.
    fn transformed(&self, t: &Transform) -> Self;

    /// Explode into the smooth pieces between kinks.
    fn segments(&self) -> Vec<Self>;

    /// Start point.
    fn point_at_start(&self) -> Point3 {
        self.point_at(self.domain().0)
    }

    /// End point (equal to the start for closed curves).
    fn point_at_end(&self) -> Point3 {
        self.point_at(self.domain().1)
    }

    /// Point at a fraction `f ∈ [0, 1]` of the arc length.
    fn point_at_normalized_length(&self, f: f64) -> Point3 {
        self.point_at(self.param_at_length(f.clamp(0.0, 1.0) * self.length()))
    }

    /// Parameters splitting the curve into `segments` pieces of equal length.
    ///
    /// With `include_ends` the start (and, for open curves, the end) are part
    /// of the result.
    fn divide_by_count(&self, segments: usize, include_ends: bool) -> Vec<f64> {
        if segments == 0 {
            return Vec::new();
        }
        let length = self.length();
        let last = if self.is_closed() { segments - 1 } else { segments };
        (0..=last)
            .filter(|&k| include_ends || (k != 0 && k != segments))
            .map(|k| self.param_at_length(length * k as f64 / segments as f64))
            .collect()
    }

    /// Parameters spaced `step` apart along the curve.
    ///
    /// No station is forced onto the curve end: a trailing remainder
    /// shorter than `step` is dropped.
    fn divide_by_length(&self, step: f64, include_start: bool) -> Vec<f64> {
        if step <= 0.0 {
            return Vec::new();
        }
        let length = self.length();
        let slack = length * 1e-9;
        let first = if include_start { 0 } else { 1 };
        (first..)
            .map(|k| k as f64 * step)
            .take_while(|&s| s <= length + slack)
            .map(|s| self.param_at_length(s.min(length)))
            .collect()
    }
}

// =============================================================================
// Surfaces
// =============================================================================

/// A bounded parametric surface, possibly trimmed.
pub trait Surface: Clone + Send + Sync + std::fmt::Debug {
    /// Parameter domain as `((u_min, u_max), (v_min, v_max))`.
    fn domain(&self) -> ((f64, f64), (f64, f64));

    /// Evaluate the underlying (untrimmed) surface at `(u, v)`.
    fn evaluate(&self, uv: Point2) -> Point3;

    /// Unit normal at `(u, v)`.
    fn normal(&self, uv: Point2) -> Dir3;

    /// Closest point on the active (trimmed) region.
    fn closest_point(&self, p: &Point3) -> SurfacePoint;

    /// Bounding box of the active region expressed in `plane` coordinates.
    fn bounding_box_in(&self, plane: &Plane) -> BoundingBox3;

    /// True if the active region is smaller than the parameter domain.
    fn is_trimmed(&self) -> bool;

    /// World-space bounding box of the active region.
    fn bounding_box(&self) -> BoundingBox3 {
        self.bounding_box_in(&Plane::xy())
    }
}

// =============================================================================
// Kernel
// =============================================================================

/// Options forwarded to [`GeometryKernel::patch_fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOptions {
    /// Number of spans in the u direction.
    pub u_spans: usize,
    /// Number of spans in the v direction.
    pub v_spans: usize,
    /// Trim the result to the outline.
    pub trim: bool,
    /// Keep tangency with the outline's neighbouring geometry.
    pub tangency: bool,
    /// Spacing used when sampling the outline.
    pub point_spacing: f64,
    /// Stiffness of the fit; larger values give a flatter patch.
    pub flexibility: f64,
    /// Weight pulling the patch towards the interior points.
    pub surface_pull: f64,
    /// Whether each of the four patch edges is pinned to the outline.
    pub fixed_edges: [bool; 4],
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            u_spans: 20,
            v_spans: 20,
            trim: false,
            tangency: true,
            point_spacing: 1.0,
            flexibility: 50.0,
            surface_pull: 10.0,
            fixed_edges: [true; 4],
        }
    }
}

/// The geometric collaborator the path planner orchestrates.
///
/// Every numeric tolerance is passed in explicitly. Operations that may
/// legitimately produce several results return them all; choosing among
/// them is the caller's policy.
pub trait GeometryKernel: Send + Sync {
    /// Curve type produced and consumed by this kernel.
    type Curve: Curve;
    /// Surface type produced and consumed by this kernel.
    type Surface: Surface;
    /// Closed solid type used for containment tests.
    type Solid: Send + Sync + std::fmt::Debug;

    /// Polyline through `points`, optionally closed.
    fn polyline(&self, points: &[Point3], closed: bool) -> Result<Self::Curve, KernelError>;

    /// Straight segment from `a` to `b`.
    fn line(&self, a: &Point3, b: &Point3) -> Result<Self::Curve, KernelError> {
        self.polyline(&[*a, *b], false)
    }

    /// Edge curves bounding the active region of `surface`.
    fn boundary_wireframe(&self, surface: &Self::Surface) -> Vec<Self::Curve>;

    /// Join curves whose ends meet within tolerance.
    fn join_curves(&self, curves: &[Self::Curve], tol: &Tolerance) -> Vec<Self::Curve>;

    /// Fit patch surfaces through `points`, bounded by `outline`.
    fn patch_fit(
        &self,
        points: &[Point3],
        outline: &Self::Curve,
        options: &PatchOptions,
        tol: &Tolerance,
    ) -> Result<Vec<Self::Surface>, KernelError>;

    /// Shortest path on `surface` between two parameter points.
    fn shortest_path(
        &self,
        surface: &Self::Surface,
        uv0: Point2,
        uv1: Point2,
        tol: &Tolerance,
    ) -> Result<Self::Curve, KernelError>;

    /// Offset a curve lying on `surface` by `distance` within the surface.
    fn offset_on_surface(
        &self,
        curve: &Self::Curve,
        surface: &Self::Surface,
        distance: f64,
        tol: &Tolerance,
    ) -> Result<Vec<Self::Curve>, KernelError>;

    /// Orthogonal projection of a curve onto a plane.
    fn project_to_plane(
        &self,
        curve: &Self::Curve,
        plane: &Plane,
    ) -> Result<Self::Curve, KernelError>;

    /// Project a curve onto a surface along `direction`.
    fn project_to_surface(
        &self,
        curve: &Self::Curve,
        surface: &Self::Surface,
        direction: &Vec3,
        tol: &Tolerance,
    ) -> Result<Vec<Self::Curve>, KernelError>;

    /// Map a curve into the parameter space of `surface`.
    fn pull_back(
        &self,
        curve: &Self::Curve,
        surface: &Self::Surface,
        tol: &Tolerance,
    ) -> Result<Vec<Point2>, KernelError>;

    /// Map a parameter-space polyline back onto `surface`.
    fn push_up(
        &self,
        uv: &[Point2],
        surface: &Self::Surface,
        tol: &Tolerance,
    ) -> Result<Self::Curve, KernelError>;

    /// Extrude a closed planar curve along `direction` and cap both ends.
    fn extrude_and_cap(
        &self,
        curve: &Self::Curve,
        direction: &Vec3,
        tol: &Tolerance,
    ) -> Result<Self::Solid, KernelError>;

    /// Sorted curve parameters where `curve` crosses the solid's boundary.
    fn curve_solid_intersections(
        &self,
        curve: &Self::Curve,
        solid: &Self::Solid,
        tol: &Tolerance,
    ) -> Vec<f64>;

    /// Containment test. With `strict`, points on the boundary are outside.
    fn point_in_solid(
        &self,
        solid: &Self::Solid,
        point: &Point3,
        tol: &Tolerance,
        strict: bool,
    ) -> bool;

    /// Area centroid of a closed planar curve.
    fn area_centroid(&self, curve: &Self::Curve) -> Option<Point3>;
}
