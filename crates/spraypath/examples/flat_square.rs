//! Spray path over a flat 10 × 10 panel, with waste and timing figures.
//!
//! Run with: RUST_LOG=spraypath=debug cargo run -p spraypath --example flat_square

use spraypath::{
    classify_path, extend_surface, path_properties, spray_path, waste_report, SpeedSettings,
    SprayPathError, SpraySettings,
};
use spraypath_kernel_discrete::{DiscreteKernel, GridSurface};
use spraypath_kernel_geom::{Curve, Plane};
use spraypath_kernel_math::{Point3, Vec3};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SprayPathError> {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let kernel = DiscreteKernel::default();
    let panel = GridSurface::planar(
        Point3::origin(),
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::new(0.0, 10.0, 0.0),
    )?;

    let mut settings = SpraySettings::default();
    settings.extension.sample_grid = 40;
    let tol = settings.tolerance;

    let frame = Plane::spray_frame(settings.angle);
    let extended = extend_surface(&kernel, &panel, &frame, &settings.extension, &tol)?;
    let path = spray_path(&kernel, &panel, &extended, &settings)?;
    println!("path length: {:.3}", path.length());

    let segments = classify_path(&kernel, &path, &panel, &extended, settings.pass_spacing, &tol)?;
    let on = segments.iter().filter(|s| s.on_surface).count();
    println!("segments: {} ({} on surface)", segments.len(), on);

    let waste = waste_report(&kernel, &segments, &panel, &tol)?;
    println!(
        "off-surface: {:.3}, on-surface waste: {:.3}, total: {:.3}",
        waste.off_surface_length, waste.on_surface_waste_length, waste.total_length
    );

    let props = path_properties(&segments, &SpeedSettings::default())?;
    println!("duration: {:.2}s", props.duration);
    Ok(())
}
