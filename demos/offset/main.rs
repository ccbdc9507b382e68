//! Offsets and extrudes a rounded outline, logging what each step produced.
//!
//! Usage:
//! ```text
//! cargo run --example offset                  # default distance 1.5
//! cargo run --example offset -- -2.0          # outward offset
//! RUST_LOG=contour=trace cargo run --example offset
//! ```

use contour::geometry::{Path, PathElement};
use contour::math::Point2;
use contour::operations::{create_offset_path, Extrude, FitCurve};
use tracing::info;

fn rounded_outline() -> contour::Result<Path> {
    let mut path = Path::new();
    path.move_to(Point2::new(0.0, 0.0));
    path.line_to(Point2::new(20.0, 0.0))?;
    path.curve_to(
        Point2::new(26.0, 0.0),
        Point2::new(26.0, 12.0),
        Point2::new(20.0, 12.0),
    )?;
    path.quad_to(Point2::new(10.0, 18.0), Point2::new(0.0, 12.0))?;
    path.close_path();
    Ok(path)
}

fn describe(label: &str, path: &Path) {
    let curves = path
        .elements()
        .iter()
        .filter(|e| matches!(e, PathElement::QuadTo | PathElement::CurveTo))
        .count();
    info!(
        label,
        elements = path.element_count(),
        curves,
        area = path.signed_area(),
        closed = path.is_closed(),
        "path"
    );
}

fn main() -> contour::Result<()> {
    // Default: WARN for everything, INFO for the demo and the kernel.
    // Override with RUST_LOG (e.g. RUST_LOG=contour=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("offset=info".parse().unwrap_or_default())
        .add_directive("contour=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let distance = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<f64>().ok())
        .unwrap_or(1.5);

    let outline = rounded_outline()?;
    describe("outline", &outline);

    let offset = create_offset_path(&outline, distance)?;
    describe("offset", &offset);

    let samples: Vec<Point2> = offset
        .flattened(0.01)
        .into_iter()
        .flatten()
        .collect();
    let refit = FitCurve::new(&samples, 1e-2).execute()?;
    info!(samples = samples.len(), curves = refit.len(), "refit offset outline");

    let mut extrusion = Extrude::new(&outline, 0.0, 4.0, distance.abs()).execute()?;
    extrusion.sort_by_depth(&contour::math::Point3::new(10.0, 6.0, -30.0));
    for face in extrusion.faces() {
        info!(kind = ?face.kind, center = ?face.center, "face");
    }
    Ok(())
}
