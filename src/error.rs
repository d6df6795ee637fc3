//! Error types for the tag mapping and localization core.
//!
//! Only conditions that callers must act on are errors. A World Model lookup
//! miss is an `Option`, and a missing camera estimate simply skips the
//! consistency check.

use std::collections::BTreeSet;

use crate::world::TagId;

/// Errors raised by rigid-transform construction and averaging.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("rotation is not unit-norm (|q| = {norm:.6})")]
    InvalidTransform { norm: f64 },
    #[error("non-finite transform component")]
    NonFinite,
    #[error("cannot average an empty or cancelling set of rotations")]
    DegenerateMean,
}

/// Errors raised by the World Model.
#[derive(thiserror::Error, Debug)]
pub enum WorldModelError {
    #[error("world model is read-only, refusing to write {0}")]
    ReadOnly(TagId),
    #[error("invalid pose stored for {tag}: {source}")]
    InvalidEntry {
        tag: TagId,
        #[source]
        source: GeometryError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// All accumulation slots are busy with other pending tags; the sample was dropped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no free accumulation slot for {tag} (pending: {pending:?})")]
pub struct SlotExhausted {
    pub tag: TagId,
    pub pending: BTreeSet<TagId>,
}
