pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod prompts;
pub mod rag;
pub mod recorder;
pub mod review;
pub mod stage;
pub mod state;
pub mod syntax;
pub mod text;

pub use error::{Result, SpitError};
