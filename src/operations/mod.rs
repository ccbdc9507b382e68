pub mod fit;
pub mod offset;
pub mod shaping;

pub use fit::{fit_cubic, fit_function, FitCurve, FunctionApproximation};
pub use offset::{create_offset_path, OffsetParams, PathOffset};
pub use shaping::{Extrude, Extrusion, Face3D, FaceKind};
