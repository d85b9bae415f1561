pub mod errors;

pub use errors::{PactError, PactErrorCategory, PactResult};
