pub mod init;
pub mod limits;
pub mod models;
pub mod serve;
pub mod usage;
