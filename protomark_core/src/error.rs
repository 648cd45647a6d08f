// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::boxed::Box;
use alloc::string::String;

use crate::mark::MarkId;

/// Errors surfaced by rendering, context resolution and dispatch.
///
/// Specification errors (a bad path, a missing anchor target) fail fast. Nothing is retried: the
/// previously rendered scene stays in place when a render fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The mark id does not belong to this visualization.
    #[error("mark {0:?} does not exist")]
    MissingMark(MarkId),
    /// Children may only be added to panels.
    #[error("mark {mark:?} is not a panel and cannot own children")]
    NotAPanel {
        /// The non-panel parent.
        mark: MarkId,
    },
    /// `extend` would make a mark its own prototype.
    #[error("extending {mark:?} with {proto:?} would create a prototype cycle")]
    ProtoCycle {
        /// The mark being extended.
        mark: MarkId,
        /// The requested prototype.
        proto: MarkId,
    },
    /// No scene exists (yet) for the mark at the requested position.
    #[error("no scene has been built for mark {mark:?}")]
    MissingScene {
        /// The mark whose scene was requested.
        mark: MarkId,
    },
    /// The scene exists but has no instance at `index`.
    #[error("mark {mark:?} has no instance at index {index}")]
    MissingInstance {
        /// The mark whose scene was indexed.
        mark: MarkId,
        /// The requested index.
        index: usize,
    },
    /// An instance path does not descend from the root through panel children.
    #[error("instance path is empty or does not follow the mark tree")]
    InvalidPath,
    /// A property function failed.
    #[error("property `{name}` of mark {mark:?} failed")]
    Property {
        /// The mark being built.
        mark: MarkId,
        /// The failing property.
        name: &'static str,
        /// What the property function reported.
        #[source]
        source: PropertyError,
    },
    /// Properties of a mark read each other in a cycle.
    #[error("dependency cycle through property `{name}` of mark {mark:?}")]
    DependencyCycle {
        /// The mark being built.
        mark: MarkId,
        /// A property on the cycle.
        name: &'static str,
    },
    /// An event handler failed.
    #[error("handler for `{event}` failed")]
    Handler {
        /// The dispatched event name.
        event: &'static str,
        /// What the handler reported.
        #[source]
        source: PropertyError,
    },
}

/// Failure reported from user code (property functions and event handlers).
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    /// A free-form failure.
    #[error("{0}")]
    Message(String),
    /// A scene lookup made from inside the function failed.
    #[error(transparent)]
    Scene(Box<Error>),
}

impl PropertyError {
    /// Creates a free-form failure.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<Error> for PropertyError {
    fn from(err: Error) -> Self {
        Self::Scene(Box::new(err))
    }
}
