pub mod error;
pub mod gridded;
pub mod parcel;
