pub mod bng;
pub mod error;
pub mod osgb;
