//! Immutable Morton/Z-order space-filling-curve index with bounded,
//! box-pruned k-nearest-neighbor search.
//!
//! Build once from a batch of points via [`PointData`], seal it, then query
//! it from as many threads as you like: a sealed index holds no locks and
//! mutates nothing.

mod error;
mod index;
mod morton;
mod point;
mod point_data;
mod registry;

pub use error::IndexStateError;
pub use index::SfcIndex;
pub use morton::{dist_sq_to_box, z_less};
pub use point::{Point, Point2, Point3};
pub use point_data::PointData;
pub use registry::{Registry, RegistryError};
