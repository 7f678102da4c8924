use super::record::{read_record, write_record, Record};
use super::{ByteReader, ByteWriter, Decoder, UnknownTypeStrategy};
use crate::{Error, ErrorKind};
use log::warn;

/// Four byte marker that opens every block
pub const BEGIN_MARKER: u32 = 0xB01D_FACE;

/// Four byte marker that closes every block
pub const END_MARKER: u32 = 0xDEAD_C0DE;

/// Bytes of framing around a payload: begin marker, id, length, end marker
pub const FRAME_LEN: usize = 16;

/// Numeric tag identifying what a block holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    pub const HEADER: BlockId = BlockId(0x0001);
    pub const ATTRIBUTES: BlockId = BlockId(0x0002);
    pub const SACK: BlockId = BlockId(0x0003);
    pub const ITEM: BlockId = BlockId(0x0004);
    pub const EXPANSION: BlockId = BlockId(0x0010);
}

/// An element of a block payload
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Node {
    Record(Record),
    Block(Block),

    /// A block whose contents could not be decoded. Its payload is kept
    /// byte for byte.
    Opaque(OpaqueBlock),
}

impl Node {
    pub fn block_id(&self) -> Option<BlockId> {
        match self {
            Node::Record(_) => None,
            Node::Block(x) => Some(x.id),
            Node::Opaque(x) => Some(x.id),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Node::Record(x) => Some(x),
            _ => None,
        }
    }

    /// Number of bytes the node occupies when encoded
    pub fn encoded_len(&self) -> usize {
        match self {
            Node::Record(x) => x.encoded_len(),
            Node::Block(x) => FRAME_LEN + x.payload_len(),
            Node::Opaque(x) => FRAME_LEN + x.payload.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Block {
    pub id: BlockId,
    pub children: Vec<Node>,
}

impl Block {
    pub fn new(id: BlockId) -> Self {
        Block {
            id,
            children: Vec::new(),
        }
    }

    /// Payload size computed from the children, never a stored value
    pub fn payload_len(&self) -> usize {
        self.children.iter().map(Node::encoded_len).sum()
    }

    /// Returns the first record with the given key
    pub fn record(&self, key: &str) -> Option<&Record> {
        self.children
            .iter()
            .filter_map(Node::as_record)
            .find(|x| x.key.is(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OpaqueBlock {
    pub id: BlockId,
    pub payload: Vec<u8>,
}

impl Decoder {
    /// Decode the sequence of top level blocks that make up a file
    pub fn decode_nodes(&self, data: &[u8]) -> Result<Vec<Node>, Error> {
        let mut reader = ByteReader::new(data);
        let mut nodes = Vec::new();
        while !reader.is_empty() {
            nodes.push(self.read_block(&mut reader)?);
        }
        Ok(nodes)
    }

    /// Decode one block at the reader's position
    pub(crate) fn read_block(&self, reader: &mut ByteReader) -> Result<Node, Error> {
        let start = reader.position();
        if reader.read_u32()? != BEGIN_MARKER {
            return Err(Error::new(ErrorKind::MalformedBlock {
                offset: start,
                reason: "missing begin marker",
            }));
        }

        let id = BlockId(reader.read_u32()?);
        let declared = reader.read_u32()? as usize;
        let mut payload = reader.split(declared)?;
        let payload_start = payload.position();
        let raw = payload.remainder();

        let node = match self.read_children(&mut payload) {
            Ok(children) => Node::Block(Block { id, children }),
            Err(e) if e.is_locally_recoverable()
                && self.unknown_type == UnknownTypeStrategy::Opaque =>
            {
                warn!(
                    "keeping block 0x{:04x} at offset {} as opaque bytes: {}",
                    id.0, start, e
                );
                Node::Opaque(OpaqueBlock {
                    id,
                    payload: raw.to_vec(),
                })
            }
            Err(e) => {
                // Any read past the payload is a child overrunning the
                // declared length, as the payload itself is known to fit
                return match e.into_kind() {
                    ErrorKind::TruncatedInput { offset, needed } => {
                        Err(Error::new(ErrorKind::BlockLengthMismatch {
                            offset: start,
                            declared,
                            consumed: offset.saturating_add(needed) - payload_start,
                        }))
                    }
                    kind => Err(Error::new(kind)),
                };
            }
        };

        let end = reader.position();
        if reader.read_u32()? != END_MARKER {
            return Err(Error::new(ErrorKind::MalformedBlock {
                offset: end,
                reason: "missing end marker",
            }));
        }

        Ok(node)
    }

    fn read_children(&self, payload: &mut ByteReader) -> Result<Vec<Node>, Error> {
        let mut children = Vec::new();
        while !payload.is_empty() {
            let child = if payload.peek_u32() == Some(BEGIN_MARKER) {
                self.read_block(payload)?
            } else {
                Node::Record(read_record(payload)?)
            };
            children.push(child);
        }
        Ok(children)
    }
}

/// Emit a block whose payload is produced by `payload`. The length field is
/// written as a placeholder and patched once the payload size is known.
pub(crate) fn write_block<F>(writer: &mut ByteWriter, id: BlockId, payload: F)
where
    F: FnOnce(&mut ByteWriter),
{
    writer.write_u32(BEGIN_MARKER);
    writer.write_u32(id.0);
    let length_at = writer.position();
    writer.write_u32(0);
    let start = writer.position();
    payload(writer);
    let end = writer.position();
    writer.seek(length_at);
    writer.write_u32((end - start) as u32);
    writer.seek(end);
    writer.write_u32(END_MARKER);
}

pub(crate) fn write_node(writer: &mut ByteWriter, node: &Node) {
    match node {
        Node::Record(x) => write_record(writer, x),
        Node::Block(x) => write_block(writer, x.id, |w| {
            for child in &x.children {
                write_node(w, child);
            }
        }),
        Node::Opaque(x) => write_block(writer, x.id, |w| w.write_bytes(&x.payload)),
    }
}

/// Encode nodes into a fresh buffer
pub fn encode_nodes(nodes: &[Node]) -> Vec<u8> {
    let capacity = nodes.iter().map(Node::encoded_len).sum();
    let mut writer = ByteWriter::with_capacity(capacity);
    for node in nodes {
        write_node(&mut writer, node);
    }
    writer.into_inner()
}
