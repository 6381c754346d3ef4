// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by the engine.

/// Boxed error raised by author callbacks.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Failure of an engine operation or of a callback it ran.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A tree operation failed, including selector parsing.
    #[error(transparent)]
    Dom(#[from] wafer_dom::Error),
    /// An Object or Array property was fed an attribute that is not JSON.
    #[error("attribute `{name}` does not hold valid JSON")]
    Json {
        /// The attribute name.
        name: String,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// A property name that the component does not declare.
    #[error("`{0}` is not a declared property")]
    UnknownProperty(String),
    /// A component operation was applied to a plain node.
    #[error("{0} is not a component")]
    NotAComponent(String),
    /// An error raised by a `changed`, `updated`, `first_updated`, `dom`,
    /// `init` or event callback.
    #[error(transparent)]
    Callback(BoxError),
}

impl Error {
    /// Wraps an error or message raised by an author callback.
    ///
    /// ```rust
    /// let err = wafer_core::Error::callback("backend unavailable");
    /// assert_eq!(err.to_string(), "backend unavailable");
    /// ```
    pub fn callback(error: impl Into<BoxError>) -> Self {
        Self::Callback(error.into())
    }

    pub(crate) fn not_a_component(node: impl core::fmt::Debug) -> Self {
        Self::NotAComponent(format!("{node:?}"))
    }
}
