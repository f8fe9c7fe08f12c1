mod decompose;
pub use decompose::*;
mod generate;
pub use generate::*;
mod graph;
pub use graph::*;
mod verify;
pub use verify::*;

/// A fractional selection value above this counts as selected.
pub const SELECTION_THRESHOLD: f64 = 0.5;
