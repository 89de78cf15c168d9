pub mod dancer;
pub mod dataset;
pub mod legacy;

pub use dancer::*;
pub use dataset::*;
pub use legacy::*;
