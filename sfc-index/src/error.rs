use thiserror::Error;

/// A `PointData` was asked to do something its current lifecycle state
/// forbids: `Add`/`Lock` after sealing, or `GetNN` before sealing.
///
/// Per the design, these indicate a caller bug rather than a request- or
/// data-driven failure, so they are not folded into `IngestError`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexStateError {
    #[error("cannot add points to a sealed index")]
    AlreadySealed,
    #[error("index is already sealed; Lock() is one-shot")]
    DoubleLock,
    #[error("cannot query an index that has not been sealed")]
    NotSealed,
}
