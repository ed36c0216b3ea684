pub mod constants;
pub mod image;
pub mod runtime;

pub use self::image::Image;
pub use self::runtime::{Computer, Config, Driver, Outcome};
