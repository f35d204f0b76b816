pub mod archive;
pub mod config;
pub mod error;
pub mod feedback;
pub mod harvest;
pub mod inference;
pub mod io;
pub mod paths;
pub mod persona;
pub mod provision;
pub mod registry;
pub mod synthesis;
pub mod text;

pub use error::{AgencyError, Result};
