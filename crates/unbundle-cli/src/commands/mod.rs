pub mod dev;
pub mod transform;
pub mod version;
