use crate::binary::{write_block, write_node, Block, BlockId, ByteWriter, Node, Record, Value};

/// The flat attribute table of a save: character level, money, play time
/// and the like. Records keep their order and any nested blocks stay put.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attributes {
    nodes: Vec<Node>,
}

impl Attributes {
    pub(crate) fn from_block(block: Block) -> Self {
        Attributes {
            nodes: block.children,
        }
    }

    /// The first record stored under the name
    pub fn get(&self, name: &str) -> Option<&Record> {
        self.records().find(|r| r.key.is(name))
    }

    /// The value of the first record stored under the name
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|r| &r.value)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.nodes.iter().filter_map(Node::as_record)
    }

    /// Every record and block in file order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.records().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the value of an existing record in place, or append a new
    /// record. Returns the previous value.
    pub(crate) fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        let existing = self.nodes.iter_mut().find_map(|node| match node {
            Node::Record(r) if r.key.is(name) => Some(r),
            _ => None,
        });

        match existing {
            Some(record) => Some(std::mem::replace(&mut record.value, value)),
            None => {
                self.nodes.push(Node::Record(Record::new(name, value)));
                None
            }
        }
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter) {
        write_block(writer, BlockId::ATTRIBUTES, |w| {
            for node in &self.nodes {
                write_node(w, node);
            }
        });
    }
}
