//! Input preparation for the FISPACT inventory engine: group-wise flux
//! spectra, group structures and the `files` manifest.

pub mod domain;
pub mod input;

pub use domain::{PactError, PactErrorCategory, PactResult};
