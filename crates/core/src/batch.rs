//! Batch Outcomes
//!
//! Batch operations process every item independently. Successes and failures are
//! collected side by side; a failed item never rolls back or stops the others.

use std::error::Error;

use serde::Serialize;

use crate::error::ErrorKind;

/// A single failed item in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure<K> {
    /// Identifier of the item that failed.
    pub uuid: K,
    /// Stable machine-readable error kind.
    pub kind: &'static str,
    /// Human readable description of the failure.
    pub message: String,
}

/// Results of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome<K, T> {
    /// Successful items in processing order.
    pub results: Vec<T>,
    /// Failed items in processing order.
    pub errors: Vec<BatchFailure<K>>,
}

impl<K, T> Default for BatchOutcome<K, T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<K, T> BatchOutcome<K, T> {
    /// An outcome with nothing recorded yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of processing `uuid`.
    pub fn record<E>(&mut self, uuid: K, result: Result<T, E>)
    where
        E: Error + ErrorKind,
    {
        match result {
            Ok(value) => self.results.push(value),
            Err(error) => self.fail(uuid, &error),
        }
    }

    /// Record a failure for `uuid`.
    pub fn fail<E>(&mut self, uuid: K, error: &E)
    where
        E: Error + ErrorKind,
    {
        self.errors.push(BatchFailure {
            uuid,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    /// Whether any item failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Transform the successful results, keeping failures.
    pub fn map<U, F>(self, f: F) -> BatchOutcome<K, U>
    where
        F: FnMut(T) -> U,
    {
        BatchOutcome {
            results: self.results.into_iter().map(f).collect(),
            errors: self.errors,
        }
    }
}
