pub mod constants;
pub mod loader;
pub mod runtime;

pub use self::loader::{load, LoadError};
pub use self::runtime::{Computer, Outcome, ProcessorError};
