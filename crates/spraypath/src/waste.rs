//! Waste accounting, spray footprints and path timing.

use serde::{Deserialize, Serialize};
use spraypath_kernel_geom::{Curve, GeometryKernel, Surface};
use spraypath_kernel_math::{Dir3, Point3, Tolerance};
use tracing::debug;

use crate::classify::PathSegment;
use crate::offset::perimeter;
use crate::trim::trim_curve_boundary;
use crate::{Result, SprayPathError};

/// Material sprayed where it does no good.
#[derive(Debug, Clone)]
pub struct WasteReport<C> {
    /// Off-surface runs.
    pub off_surface_waste: Vec<C>,
    /// Parts of on-surface runs that still fall outside the real perimeter.
    pub on_surface_waste: Vec<C>,
    /// Total length of off-surface runs.
    pub off_surface_length: f64,
    /// Total length of `on_surface_waste`.
    pub on_surface_waste_length: f64,
    /// Length of every run.
    pub total_length: f64,
}

/// Collect the wasted parts of classified `segments`.
pub fn waste_report<K: GeometryKernel>(
    kernel: &K,
    segments: &[PathSegment<K::Curve>],
    surface: &K::Surface,
    tol: &Tolerance,
) -> Result<WasteReport<K::Curve>> {
    let perim = perimeter(kernel, surface, tol)?;
    let mut report = WasteReport {
        off_surface_waste: Vec::new(),
        on_surface_waste: Vec::new(),
        off_surface_length: 0.0,
        on_surface_waste_length: 0.0,
        total_length: 0.0,
    };
    for segment in segments {
        let length = segment.curve.length();
        report.total_length += length;
        if !segment.on_surface {
            report.off_surface_length += length;
            report.off_surface_waste.push(segment.curve.clone());
            continue;
        }
        for piece in trim_curve_boundary(kernel, &segment.curve, &perim, tol)?.outside {
            report.on_surface_waste_length += piece.length();
            report.on_surface_waste.push(piece);
        }
    }
    debug!(
        off = report.off_surface_length,
        on_waste = report.on_surface_waste_length,
        total = report.total_length,
        "waste report"
    );
    Ok(report)
}

/// The footprint of the spray cone on the surface at one path station.
#[derive(Debug, Clone, PartialEq)]
pub struct SprayCircle {
    /// Station on the path.
    pub center: Point3,
    /// Surface normal under the station.
    pub normal: Dir3,
    /// Footprint radius.
    pub radius: f64,
}

/// Spray footprints every tenth of `diameter` along each path.
pub fn spray_circles<C: Curve, S: Surface>(
    paths: &[C],
    surface: &S,
    diameter: f64,
) -> Result<Vec<Vec<SprayCircle>>> {
    if diameter <= 0.0 {
        return Err(SprayPathError::InvalidSettings(
            "spray diameter must be positive".into(),
        ));
    }
    let circles = paths
        .iter()
        .map(|path| {
            path.divide_by_length(0.1 * diameter, true)
                .into_iter()
                .map(|t| {
                    let center = path.point_at(t);
                    let foot = surface.closest_point(&center);
                    SprayCircle {
                        center,
                        normal: surface.normal(foot.uv),
                        radius: diameter / 2.0,
                    }
                })
                .collect()
        })
        .collect();
    Ok(circles)
}

/// Robot speeds along the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedSettings {
    /// Speed while spraying the surface.
    pub spray_speed: f64,
    /// Speed while travelling off the surface.
    pub travel_speed: f64,
}

impl Default for SpeedSettings {
    fn default() -> Self {
        Self {
            spray_speed: 350.0,
            travel_speed: 700.0,
        }
    }
}

impl SpeedSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.spray_speed <= 0.0 || self.travel_speed <= 0.0 {
            return Err(SprayPathError::InvalidSettings(
                "speeds must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Summary figures for a classified path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathProperties {
    /// Length of the whole path.
    pub total_length: f64,
    /// Length spent over the surface.
    pub on_surface_length: f64,
    /// Length spent off the surface.
    pub off_surface_length: f64,
    /// Time to run the path.
    pub duration: f64,
    /// Slowest speed used.
    pub min_speed: f64,
    /// Fastest speed used.
    pub max_speed: f64,
}

/// Lengths and run time of classified `segments`.
pub fn path_properties<C: Curve>(
    segments: &[PathSegment<C>],
    speeds: &SpeedSettings,
) -> Result<PathProperties> {
    speeds.validate()?;
    if segments.is_empty() {
        return Err(SprayPathError::EmptyInput("path segments"));
    }
    let (mut on, mut off) = (0.0, 0.0);
    let (mut min_speed, mut max_speed) = (f64::INFINITY, 0.0_f64);
    for segment in segments {
        let speed = if segment.on_surface {
            on += segment.curve.length();
            speeds.spray_speed
        } else {
            off += segment.curve.length();
            speeds.travel_speed
        };
        min_speed = min_speed.min(speed);
        max_speed = max_speed.max(speed);
    }
    Ok(PathProperties {
        total_length: on + off,
        on_surface_length: on,
        off_surface_length: off,
        duration: on / speeds.spray_speed + off / speeds.travel_speed,
        min_speed,
        max_speed,
    })
}
