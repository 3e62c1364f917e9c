//! Top-level facade crate for metrion.
//!
//! Re-exports the core data model and the exporters so users can depend on a
//! single crate.

pub mod core {
    pub use metrion_core::*;
}

pub mod export {
    pub use metrion_export::*;
}
