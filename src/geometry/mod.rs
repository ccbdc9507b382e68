pub mod path;
pub mod segment;

pub use path::{Path, PathElement, PathIter, PathRecord, Subpath, WindingRule};
pub use segment::{Bezier, ClosestPointResult, ControlPolygon, HitInfo, Line, Quadratic, Segment};
