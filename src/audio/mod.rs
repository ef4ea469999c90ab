pub mod analysis;
pub mod features;
pub mod frame;
pub mod source;
