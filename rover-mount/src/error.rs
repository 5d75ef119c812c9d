use crate::host::PresentationId;
use crate::tag::Tag;
use thiserror::Error;

/// Structural problems with a mutation. The coordinator logs these and
/// skips the offending mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MountError {
    #[error("{op} references unknown tag {tag}")]
    UnknownTag { tag: Tag, op: &'static str },

    #[error("tag {0} is already live")]
    AlreadyCreated(Tag),

    #[error("root tag {0} cannot be the target of {1}")]
    RootTag(Tag, &'static str),

    #[error("tag {child} is already mounted under {parent}")]
    AlreadyParented { child: Tag, parent: Tag },

    #[error("tag {child} is not a child of {parent}")]
    NotAChild { parent: Tag, child: Tag },

    #[error("inserting {child} under {parent} would create a cycle")]
    WouldCycle { parent: Tag, child: Tag },

    #[error("insert of {0} precedes its create")]
    InsertBeforeCreate(Tag),

    #[error("delete of {0} precedes its remove")]
    DeleteBeforeRemove(Tag),
}

/// Native resource failures reported by a host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("no hosting surface available for presentation")]
    NoHostingSurface,

    #[error("unknown presentation context {0:?}")]
    UnknownPresentation(PresentationId),

    #[error("presentation context {0:?} is already presented")]
    AlreadyPresented(PresentationId),

    #[error("presentation context {0:?} is not presented")]
    NotPresented(PresentationId),

    #[error("platform error: {0}")]
    Platform(String),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("props must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid props: {0}")]
    Invalid(#[from] serde_json::Error),
}
