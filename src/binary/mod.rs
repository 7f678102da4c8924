//! Types for framing and encoding the binary save format
//!
//! A file is a sequence of blocks. Each block is a begin marker, a block id, a
//! payload length, the payload, and an end marker. A payload is a sequence of
//! typed records and nested blocks.

mod cursor;
mod decoder;
mod framer;
mod record;

pub use self::cursor::{ByteReader, ByteWriter};
pub use self::decoder::{Decoder, DecoderBuilder, UnknownTypeStrategy};
pub use self::framer::{
    encode_nodes, Block, BlockId, Node, OpaqueBlock, BEGIN_MARKER, END_MARKER, FRAME_LEN,
};
pub use self::record::{Key, Record, TypeTag, Value, WideString};

pub(crate) use self::framer::{write_block, write_node};
pub(crate) use self::record::{read_record, write_field, write_record};
