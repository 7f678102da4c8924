use crate::binary::BlockId;
use crate::model::{EquipmentSlot, Placement, SackKind};

/// An error that can occur when decoding, encoding, or persisting a save file
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Consume the error and return the specific type of error
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the byte offset that the error occurs (if available)
    pub fn offset(&self) -> Option<usize> {
        self.0.offset()
    }

    /// Errors that only invalidate the enclosing block rather than the whole
    /// file. The framer captures such a block as opaque bytes.
    pub(crate) fn is_locally_recoverable(&self) -> bool {
        matches!(
            *self.0,
            ErrorKind::UnknownRecordType { .. } | ErrorKind::InvalidBoolean { .. }
        )
    }
}

/// Specific type of error
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The buffer is shorter than a field declares
    #[error("unexpected end of input: {needed} bytes required at offset {offset}")]
    TruncatedInput { offset: usize, needed: usize },

    /// A block marker is missing where the structure requires one
    #[error("malformed block at offset {offset}: {reason}")]
    MalformedBlock { offset: usize, reason: &'static str },

    /// A block's declared length disagrees with the bytes its contents occupy
    #[error(
        "block at offset {offset} declares {declared} payload bytes but its contents span {consumed}"
    )]
    BlockLengthMismatch {
        offset: usize,
        declared: usize,
        consumed: usize,
    },

    /// A record carries a type tag with no known width
    #[error("unknown record type 0x{tag:02x} at offset {offset}")]
    UnknownRecordType { offset: usize, tag: u8 },

    /// A boolean record holds a byte other than 0 or 1
    #[error("invalid boolean value 0x{value:02x} at offset {offset}")]
    InvalidBoolean { offset: usize, value: u8 },

    /// The very first header check failed
    #[error("not a valid save file: {reason}")]
    NotAValidSaveFile { reason: &'static str },

    /// Reading or writing the file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorKind {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            ErrorKind::TruncatedInput { offset, .. } => Some(offset),
            ErrorKind::MalformedBlock { offset, .. } => Some(offset),
            ErrorKind::BlockLengthMismatch { offset, .. } => Some(offset),
            ErrorKind::UnknownRecordType { offset, .. } => Some(offset),
            ErrorKind::InvalidBoolean { offset, .. } => Some(offset),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(error))
    }
}

/// Reasons a document edit was refused. A refused edit leaves the document
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no sack at index {0}")]
    NoSuchSack(usize),

    #[error("no item at index {index} of sack {sack}")]
    NoSuchItem { sack: usize, index: usize },

    #[error("{placement:?} falls outside the sack grid")]
    OutOfBounds { placement: Placement },

    #[error("{placement:?} overlaps item {index}")]
    Overlap { placement: Placement, index: usize },

    #[error("equipment slot {0:?} is already occupied")]
    SlotOccupied(EquipmentSlot),

    #[error("{placement:?} is not a valid placement in a {kind:?} sack")]
    WrongSackKind { kind: SackKind, placement: Placement },

    #[error("items cannot be stacked")]
    NotStackable,

    #[error("block {0:?} was kept as opaque bytes and cannot be edited")]
    OpaqueSection(BlockId),
}
