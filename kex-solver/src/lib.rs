mod expr;
pub use expr::*;
mod microlp_model;
pub use microlp_model::MicrolpModel;
mod model;
pub use model::*;

use kex_structs::config::BackendKind;

/// Creates an empty maximisation model on the configured backend.
pub fn create_model(backend: BackendKind, name: &str) -> Box<dyn Model> {
    match backend {
        BackendKind::Microlp => Box::new(MicrolpModel::new(name)),
    }
}
