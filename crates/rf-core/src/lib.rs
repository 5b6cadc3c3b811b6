//! rf-core: shared foundation for romflow.
//!
//! Contains:
//! - numeric (Real + finiteness checks + float helpers)
//! - vector (3-component helpers on top of nalgebra)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod vector;

// Re-exports: nice ergonomics for downstream crates
pub use error::{RfError, RfResult};
pub use numeric::*;
pub use vector::*;
