//! Error taxonomy for the transfer core.
//!
//! Synchronous setup failures are returned directly from the manager's
//! public operations; asynchronous runtime failures never surface as
//! return values — they arrive as `Failed` notifications instead.

use thiserror::Error;

/// Errors returned from the public `TransferManager` operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The source file or locator supplied by the caller is unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The transport engine could not lay out or serialize a descriptor.
    #[error("failed to build transfer descriptor: {0}")]
    DescriptorBuildFailed(anyhow::Error),

    /// The engine returned an invalid handle, or registration raced with
    /// a duplicate request id / content hash.
    #[error("failed to initialize transfer session: {0}")]
    SessionInitFailed(String),
}

/// Registry contract violations.
///
/// These never cross the manager boundary: callers always see them as
/// [`TransferError::SessionInitFailed`], after the orphaned engine
/// session has been removed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The request id is already bound to a live session.
    #[error("request id {0:?} is already registered")]
    DuplicateRequest(String),

    /// The content hash is already bound to a live session.
    #[error("content hash {0} is already registered")]
    DuplicateHash(String),
}
