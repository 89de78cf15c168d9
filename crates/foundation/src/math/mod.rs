pub mod mercator;
pub mod projection;

pub use mercator::*;
pub use projection::*;
