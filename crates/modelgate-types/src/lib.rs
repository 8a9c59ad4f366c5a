pub mod error;
pub mod operation;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use operation::Operation;
pub use request::*;
pub use response::*;
