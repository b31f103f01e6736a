pub mod error;

pub use error::TransgridError;
