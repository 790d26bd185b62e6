//! Call guard for public entry points.
//!
//! Every guarded call runs its validator first. A validation failure is
//! tagged `(<Component>.validations.<operation>)`; a failure of the call
//! itself is tagged `(<Component>.<operation>)`. The original error stays
//! reachable through [`KestrelError::root_cause`].

use std::future::Future;

use kestrel_common::constants::PRIVATE_PREFIX;
use kestrel_common::error::{KestrelError, Result};

/// Wraps calls on one named component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guard {
    component: &'static str,
}

impl Guard {
    /// Creates a guard tagging errors with `component`.
    #[must_use]
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Name errors are tagged with.
    #[must_use]
    pub const fn component(&self) -> &'static str {
        self.component
    }

    /// Runs a synchronous call behind its validator.
    ///
    /// # Errors
    ///
    /// Returns the validator's or the call's error, tagged with context.
    pub fn check<T>(
        &self,
        operation: &str,
        validator: impl FnOnce() -> Result<()>,
        call: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        self.validate(operation, validator)?;
        call().map_err(|e| e.context(self.component, operation))
    }

    /// Runs an asynchronous call behind its validator.
    ///
    /// The future is not polled when validation fails.
    ///
    /// # Errors
    ///
    /// Returns the validator's or the call's error, tagged with context.
    pub async fn run<T, F>(
        &self,
        operation: &str,
        validator: impl FnOnce() -> Result<()>,
        call: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.validate(operation, validator)?;
        call.await.map_err(|e| e.context(self.component, operation))
    }

    fn validate(&self, operation: &str, validator: impl FnOnce() -> Result<()>) -> Result<()> {
        if operation.starts_with(PRIVATE_PREFIX) {
            return Err(KestrelError::validation(format!(
                "access violation, '{operation}' is private"
            ))
            .context(self.component, operation));
        }
        validator().map_err(|e| e.context(self.component, format!("validations.{operation}")))
    }
}

/// Validator that accepts everything.
///
/// # Errors
///
/// Never fails.
pub const fn always() -> Result<()> {
    Ok(())
}

/// Rejects empty names.
///
/// # Errors
///
/// Returns [`KestrelError::Validation`] naming the argument.
pub fn non_empty(argument: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KestrelError::validation(format!(
            "missing {argument} argument"
        )));
    }
    Ok(())
}
