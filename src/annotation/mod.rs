pub mod classifier;
pub mod grouper;
pub mod image_region;
pub mod locator;
