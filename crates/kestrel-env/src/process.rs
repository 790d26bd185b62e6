//! Process environment boundary.
//!
//! [`SystemEnv`] writes to the real process environment and can only be
//! created through an `unsafe` constructor. [`MemoryEnv`] keeps variables in
//! a map, optionally seeded from the process, so loaders run without
//! touching global state.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Read and write access to environment variables.
pub trait ProcessEnv: Send + Sync {
    /// Every variable with a UTF-8 name and value.
    fn vars(&self) -> BTreeMap<String, String>;

    /// Sets one variable.
    fn set_var(&self, key: &str, value: &str);
}

fn process_vars() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy)]
pub struct SystemEnv {
    _exclusive: (),
}

impl SystemEnv {
    /// Gives write access to the process environment.
    ///
    /// # Safety
    ///
    /// While the returned value, or any loader holding it, can export
    /// variables, no other thread may read or write the process
    /// environment. In practice: load the environment from a single thread
    /// before any other thread starts.
    #[allow(unsafe_code)]
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _exclusive: () }
    }
}

impl ProcessEnv for SystemEnv {
    fn vars(&self) -> BTreeMap<String, String> {
        process_vars()
    }

    #[allow(unsafe_code)]
    fn set_var(&self, key: &str, value: &str) {
        // SAFETY: a `SystemEnv` only exists through `SystemEnv::new`, whose
        // caller guarantees no other thread touches the environment.
        unsafe { std::env::set_var(key, value) };
    }
}

/// An isolated in-memory environment.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: RwLock<BTreeMap<String, String>>,
}

impl MemoryEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a snapshot of the process environment.
    ///
    /// Writes stay in the snapshot and never reach the process.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: RwLock::new(process_vars()),
        }
    }

    /// Creates an environment holding `vars`.
    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: RwLock::new(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl ProcessEnv for MemoryEnv {
    fn vars(&self) -> BTreeMap<String, String> {
        self.vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_var(&self, key: &str, value: &str) {
        let _ = self
            .vars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_env_reads_back_writes() {
        let env = MemoryEnv::with_vars([("A", "1")]);
        assert_eq!(env.vars().get("A").map(String::as_str), Some("1"));
        assert!(!env.vars().contains_key("B"));
        env.set_var("B", "2");
        assert_eq!(env.vars().len(), 2);
    }

    #[test]
    fn snapshot_writes_do_not_reach_the_process() {
        let key = "KESTREL_SNAPSHOT_ONLY";
        let env = MemoryEnv::from_process();
        env.set_var(key, "1");
        assert_eq!(env.vars().get(key).map(String::as_str), Some("1"));
        assert!(std::env::var_os(key).is_none());
    }

    #[test]
    #[allow(unsafe_code)]
    fn system_env_sees_inherited_variables() {
        // SAFETY: the test only reads the environment.
        let env = unsafe { SystemEnv::new() };
        assert_eq!(env.vars(), MemoryEnv::from_process().vars());
    }
}
