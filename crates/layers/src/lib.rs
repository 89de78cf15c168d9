pub mod decluster;
pub mod layer;
pub mod markers;
pub mod popup;
pub mod session;
pub mod symbology;

pub use decluster::*;
pub use layer::*;
pub use markers::*;
pub use popup::*;
pub use session::*;
pub use symbology::*;
