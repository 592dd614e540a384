pub mod amount;
pub mod error;
pub mod summary;
pub mod transaction;
