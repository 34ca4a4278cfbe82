//! quarry-dataset
//!
//! Dataset file conventions under a root home directory, the open-index
//! registry, and the search facade consumed by interactive front-ends.

pub mod dataset;
pub mod error;
pub mod registry;
pub mod store;
