pub mod camera;
pub mod view;

pub use camera::*;
pub use view::*;
