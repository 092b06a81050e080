//! # ovning-core
//!
//! Foundation layer for the övning training-scenario engine.
//! Holds the shared data model, id generation, input normalization,
//! and the error taxonomy used by every other crate.
//!
//! ### Key Submodules:
//! - `model`: scenario / session / timeline / result records
//! - `normalize`: pure canonicalization of authored objectives and triggers
//! - `ids`: monotonic, prefixed id generation

pub mod error;
pub mod ids;
pub mod model;
pub mod normalize;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::model::*;
    pub use crate::normalize::*;
}

pub use error::{EngineError, EngineResult};
