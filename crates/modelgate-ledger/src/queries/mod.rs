pub mod limits;
pub mod usage;
