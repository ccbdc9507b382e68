mod extrude;

pub use extrude::{Extrude, Extrusion, Face3D, FaceKind, EXTRUDE_FLATTEN_TOLERANCE};
