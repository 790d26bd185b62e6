//! # kestrel-env
//!
//! Loads a named environment document and merges it with the process
//! environment. Declared values are defaults: a variable already set in the
//! process wins, and declared variables the process lacks are exported to it.
//!
//! An environment can be loaded once per [`EnvironmentLoader`]; every
//! accessor fails until then.

pub mod loader;
pub mod process;

pub use loader::{Environment, EnvironmentLoader};
pub use process::{MemoryEnv, ProcessEnv, SystemEnv};
