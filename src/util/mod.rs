//! Small pure helpers shared by the feature services.

pub mod wkt;
