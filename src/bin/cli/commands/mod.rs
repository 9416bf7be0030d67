pub mod collections;
pub mod feedback;
pub mod select;
pub mod stats;
pub mod weights;
