pub mod features;
pub mod windowed;
