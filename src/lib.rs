pub mod cli;
pub mod domain;
pub mod error;
pub mod gate;
pub mod git;
pub mod manifest;
pub mod tools;
pub mod ui;

pub use error::{ReleaseError, Result, Step};
