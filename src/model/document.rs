use super::attributes::Attributes;
use super::item::{Item, ItemSchema};
use super::placement::{EquipmentSlot, GridSize, Placement};
use super::sack::{Sack, SackKind};
use crate::binary::{
    read_record, Block, BlockId, ByteReader, Decoder, Node, Record, Value, BEGIN_MARKER,
};
use crate::errors::{EditError, Error, ErrorKind};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Format version written into newly created files
pub const CURRENT_FORMAT_VERSION: i32 = 5;

/// Whether a file is a character save or a stash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DocumentKind {
    Player,
    Stash,
}

impl DocumentKind {
    fn from_code(code: i32) -> DocumentKind {
        match code {
            1 => DocumentKind::Stash,
            _ => DocumentKind::Player,
        }
    }

    fn code(&self) -> i32 {
        match self {
            DocumentKind::Player => 0,
            DocumentKind::Stash => 1,
        }
    }
}

/// Format details read from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Format {
    pub version: i32,

    /// Whether the file uses the Immortal Throne expansion format
    pub expansion: bool,
}

/// A top level block, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Header,
    Attributes,
    Sack(usize),
    Extra(usize),
}

/// Addresses an item by sack index and position within the sack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ItemRef {
    pub sack: usize,
    pub index: usize,
}

impl ItemRef {
    pub fn new(sack: usize, index: usize) -> Self {
        ItemRef { sack, index }
    }
}

/// In-memory reconstruction of a character save or stash file
///
/// Every edit that succeeds marks the document as modified, and only
/// modified documents are written back on save.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SaveDocument {
    source_path: PathBuf,
    display_name: String,
    kind: DocumentKind,
    format: Format,
    header: Node,
    attributes: Attributes,
    sacks: Vec<Sack>,

    /// Top level blocks kept verbatim: opaque blocks, expansion data, and
    /// blocks of unknown purpose
    extras: Vec<Node>,

    #[cfg_attr(feature = "serde", serde(skip))]
    sections: Vec<Section>,
    modified: bool,
}

impl SaveDocument {
    /// Creates an empty stash that does not yet exist on disk. The document
    /// starts out unmodified.
    ///
    /// ```
    /// use vaultsave::{SackKind, SaveDocument};
    ///
    /// let doc = SaveDocument::create_empty(SackKind::TransferStash, "Transfer", "winsys.dxb");
    /// assert!(doc.format().expansion);
    /// assert_eq!(doc.sacks().len(), 1);
    /// assert!(!doc.is_modified());
    /// ```
    pub fn create_empty(
        kind: SackKind,
        display_name: &str,
        path: impl Into<PathBuf>,
    ) -> SaveDocument {
        let expansion = matches!(kind, SackKind::TransferStash | SackKind::RelicVaultStash);
        let format = Format {
            version: CURRENT_FORMAT_VERSION,
            expansion,
        };

        let header = Node::Block(Block {
            id: BlockId::HEADER,
            children: vec![
                Node::Record(Record::new("formatVersion", Value::Int32(format.version))),
                Node::Record(Record::new("expansion", Value::Boolean(expansion))),
                Node::Record(Record::new(
                    "fileKind",
                    Value::Int32(DocumentKind::Stash.code()),
                )),
            ],
        });

        SaveDocument {
            source_path: path.into(),
            display_name: display_name.to_string(),
            kind: DocumentKind::Stash,
            format,
            header,
            attributes: Attributes::default(),
            sacks: vec![Sack::new(kind)],
            extras: Vec::new(),
            sections: vec![Section::Header, Section::Sack(0)],
            modified: false,
        }
    }

    /// Path the document was loaded from or will be saved to
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// The header block, carried through verbatim. A header holding a record
    /// that could not be decoded is kept opaque.
    pub fn header(&self) -> &Node {
        &self.header
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn sacks(&self) -> &[Sack] {
        &self.sacks
    }

    pub fn sack(&self, index: usize) -> Option<&Sack> {
        self.sacks.get(index)
    }

    pub fn item(&self, at: ItemRef) -> Option<&Item> {
        self.sacks.get(at.sack).and_then(|s| s.item(at.index))
    }

    /// Top level blocks that are not understood, in file order
    pub fn opaque_sections(&self) -> &[Node] {
        &self.extras
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Index of the grid item covering a cell of a sack
    pub fn item_at(&self, sack: usize, x: i32, y: i32) -> Option<usize> {
        self.sacks.get(sack).and_then(|s| s.item_at(x, y))
    }

    /// Move an item to a placement in the same or another sack. The item
    /// leaves its source sack before it enters the destination, and a
    /// refused move leaves both sacks untouched.
    ///
    /// Returns where the item ended up.
    pub fn move_item(
        &mut self,
        from: ItemRef,
        to_sack: usize,
        placement: Placement,
    ) -> Result<ItemRef, EditError> {
        let footprint = self.existing_item(from)?.footprint();
        let ignore = (from.sack == to_sack).then_some(from.index);
        self.existing_sack(to_sack)?
            .check_placement(footprint, placement, ignore)?;

        let to = if from.sack == to_sack {
            if let Some(item) = self.sacks[from.sack].item_mut(from.index) {
                item.set_placement(placement);
            }
            from
        } else {
            let mut item = self.sacks[from.sack].remove(from.index);
            item.set_placement(placement);
            let index = self.sacks[to_sack].push(item);
            ItemRef::new(to_sack, index)
        };

        debug!("moved item {:?} to {:?} at {:?}", from, to, placement);
        self.modified = true;
        Ok(to)
    }

    /// Merge the stack at `from` into the stack at `onto`. Both must be the
    /// same item with the same variant and without embedded items.
    ///
    /// Returns the new location of the merged stack.
    pub fn stack_item(&mut self, from: ItemRef, onto: ItemRef) -> Result<ItemRef, EditError> {
        let source = self.existing_item(from)?;
        let target = self.existing_item(onto)?;
        if from == onto || !source.can_stack_with(target) {
            return Err(EditError::NotStackable);
        }

        let total = target
            .stack_count()
            .checked_add(source.stack_count())
            .ok_or(EditError::NotStackable)?;

        if let Some(item) = self.sacks[onto.sack].item_mut(onto.index) {
            item.set_stack_count(total);
        }
        self.sacks[from.sack].remove(from.index);

        let mut merged = onto;
        if from.sack == onto.sack && from.index < onto.index {
            merged.index -= 1;
        }

        debug!("stacked item {:?} onto {:?}, count {}", from, merged, total);
        self.modified = true;
        Ok(merged)
    }

    /// Delete an item, handing it back to the caller
    pub fn remove_item(&mut self, at: ItemRef) -> Result<Item, EditError> {
        self.existing_item(at)?;
        let item = self.sacks[at.sack].remove(at.index);
        debug!("removed item {:?}", at);
        self.modified = true;
        Ok(item)
    }

    /// Move an equipped item to another equipment slot
    pub fn set_equipment_slot(&mut self, at: ItemRef, slot: EquipmentSlot) -> Result<(), EditError> {
        let footprint = self.existing_item(at)?.footprint();
        let placement = Placement::Equipped(slot);
        let sack = &self.sacks[at.sack];
        if sack.kind() != SackKind::Equipment {
            return Err(EditError::WrongSackKind {
                kind: sack.kind(),
                placement,
            });
        }

        sack.check_placement(footprint, placement, Some(at.index))?;
        if let Some(item) = self.sacks[at.sack].item_mut(at.index) {
            item.set_placement(placement);
        }

        debug!("equipped item {:?} in {:?}", at, slot);
        self.modified = true;
        Ok(())
    }

    /// Place an item that came from elsewhere, such as another document
    pub fn insert_item(
        &mut self,
        sack: usize,
        mut item: Item,
        placement: Placement,
    ) -> Result<ItemRef, EditError> {
        self.existing_sack(sack)?
            .check_placement(item.footprint(), placement, None)?;
        item.set_placement(placement);
        let index = self.sacks[sack].push(item);
        let at = ItemRef::new(sack, index);
        debug!("inserted item {:?} at {:?}", at, placement);
        self.modified = true;
        Ok(at)
    }

    /// Record the grid footprint of an item. Footprints are not stored in
    /// the file, so this does not mark the document as modified.
    ///
    /// A grid item may only grow into free cells inside the sack.
    pub fn set_item_footprint(&mut self, at: ItemRef, footprint: GridSize) -> Result<(), EditError> {
        let placement = self.existing_item(at)?.placement();
        if let Placement::Grid(_) = placement {
            self.sacks[at.sack].check_placement(footprint, placement, Some(at.index))?;
        }

        if let Some(item) = self.sacks[at.sack].item_mut(at.index) {
            item.set_footprint(footprint);
        }
        Ok(())
    }

    /// Update an attribute record in place, appending it when absent.
    /// Returns the previous value.
    ///
    /// An attribute table that was kept as opaque bytes cannot be edited.
    pub fn set_attribute(&mut self, name: &str, value: Value) -> Result<Option<Value>, EditError> {
        if !self.sections.contains(&Section::Attributes) {
            let opaque = self
                .extras
                .iter()
                .any(|x| matches!(x, Node::Opaque(b) if b.id == BlockId::ATTRIBUTES));
            if opaque {
                return Err(EditError::OpaqueSection(BlockId::ATTRIBUTES));
            }

            self.sections.insert(1.min(self.sections.len()), Section::Attributes);
        }

        debug!("set attribute {}", name);
        self.modified = true;
        Ok(self.attributes.set(name, value))
    }

    fn existing_sack(&self, sack: usize) -> Result<&Sack, EditError> {
        self.sacks.get(sack).ok_or(EditError::NoSuchSack(sack))
    }

    fn existing_item(&self, at: ItemRef) -> Result<&Item, EditError> {
        self.existing_sack(at.sack)?
            .item(at.index)
            .ok_or(EditError::NoSuchItem {
                sack: at.sack,
                index: at.index,
            })
    }

    pub(crate) fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub(crate) fn extra(&self, index: usize) -> &Node {
        &self.extras[index]
    }

    pub(crate) fn set_sack_kind(&mut self, sack: usize, kind: SackKind) {
        if let Some(sack) = self.sacks.get_mut(sack) {
            sack.set_kind(kind);
        }
    }

    pub(crate) fn set_display_name(&mut self, name: &str) {
        self.display_name = name.to_string();
    }

    /// Record a successful write to `path`
    pub(crate) fn mark_saved(&mut self, path: &Path) {
        self.source_path = path.to_path_buf();
        self.modified = false;
    }
}

/// Reject input that does not start with a header block before decoding
fn check_signature(data: &[u8]) -> Result<(), Error> {
    let not_valid = |reason| Err(Error::new(ErrorKind::NotAValidSaveFile { reason }));
    if data.is_empty() {
        return not_valid("empty file");
    }

    let mut reader = ByteReader::new(data);
    match reader.read_u32() {
        Ok(BEGIN_MARKER) => {}
        Ok(_) => return not_valid("missing begin marker"),
        Err(e) if BEGIN_MARKER.to_le_bytes().starts_with(data) => return Err(e),
        Err(_) => return not_valid("missing begin marker"),
    }

    if BlockId(reader.read_u32()?) != BlockId::HEADER {
        return not_valid("first block is not a header");
    }

    Ok(())
}

/// Top level records of the header. An opaque header is read up to the
/// first record that cannot be decoded.
fn header_records(header: &Node) -> Vec<Record> {
    match header {
        Node::Block(x) => x.children.iter().filter_map(Node::as_record).cloned().collect(),
        Node::Opaque(x) => {
            let mut reader = ByteReader::new(&x.payload);
            let mut records = Vec::new();
            while !reader.is_empty() && reader.peek_u32() != Some(BEGIN_MARKER) {
                match read_record(&mut reader) {
                    Ok(record) => records.push(record),
                    Err(_) => break,
                }
            }
            records
        }
        Node::Record(_) => Vec::new(),
    }
}

fn display_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Decoder {
    /// Decode the bytes of a save or stash file into a document
    ///
    /// ```
    /// use vaultsave::{Decoder, ErrorKind};
    ///
    /// let err = Decoder::new().decode_document(b"not a save", "x.chr").unwrap_err();
    /// assert!(matches!(err.kind(), ErrorKind::NotAValidSaveFile { .. }));
    /// ```
    pub fn decode_document(
        &self,
        data: &[u8],
        path: impl Into<PathBuf>,
    ) -> Result<SaveDocument, Error> {
        check_signature(data)?;
        let nodes = self.decode_nodes(data)?;
        let mut nodes = nodes.into_iter();

        let header = match nodes.next() {
            Some(x) if x.block_id() == Some(BlockId::HEADER) => x,
            _ => {
                return Err(Error::new(ErrorKind::NotAValidSaveFile {
                    reason: "first block is not a header",
                }))
            }
        };

        let records = header_records(&header);
        let field = |key: &str| records.iter().find(|r| r.key.is(key)).map(|r| &r.value);
        let version = field("formatVersion")
            .and_then(Value::as_i32)
            .ok_or(ErrorKind::NotAValidSaveFile {
                reason: "missing format version",
            })?;
        let expansion = field("expansion").and_then(Value::as_bool).unwrap_or(false);
        let kind = field("fileKind")
            .and_then(Value::as_i32)
            .map_or(DocumentKind::Player, DocumentKind::from_code);

        let format = Format { version, expansion };
        let schema = ItemSchema::new(expansion);
        let mut attributes = None;
        let mut sacks = Vec::new();
        let mut extras = Vec::new();
        let mut sections = vec![Section::Header];

        for node in nodes {
            match node {
                Node::Block(x) if x.id == BlockId::ATTRIBUTES && attributes.is_none() => {
                    attributes = Some(Attributes::from_block(x));
                    sections.push(Section::Attributes);
                }
                Node::Block(x) if x.id == BlockId::SACK => {
                    sections.push(Section::Sack(sacks.len()));
                    sacks.push(Sack::assemble(x, schema));
                }
                other => {
                    if other.block_id() == Some(BlockId::EXPANSION) && !expansion {
                        warn!("expansion block in a base format file kept verbatim");
                    }
                    sections.push(Section::Extra(extras.len()));
                    extras.push(other);
                }
            }
        }

        let source_path = path.into();
        debug!(
            "decoded {:?} save {} (version {}, expansion {}) with {} sacks",
            kind,
            source_path.display(),
            version,
            expansion,
            sacks.len()
        );

        Ok(SaveDocument {
            display_name: display_name_of(&source_path),
            source_path,
            kind,
            format,
            header,
            attributes: attributes.unwrap_or_default(),
            sacks,
            extras,
            sections,
            modified: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::encode_nodes;
    use rstest::*;

    fn record(key: &str, value: Value) -> Node {
        Node::Record(Record::new(key, value))
    }

    fn block(id: BlockId, children: Vec<Node>) -> Node {
        Node::Block(Block { id, children })
    }

    fn header(expansion: bool, kind: i32) -> Node {
        block(
            BlockId::HEADER,
            vec![
                record("formatVersion", Value::Int32(4)),
                record("expansion", Value::Boolean(expansion)),
                record("fileKind", Value::Int32(kind)),
                record("checksum", Value::Int32(0x1234_5678)),
            ],
        )
    }

    fn grid_item(name: &str, x: i32, y: i32) -> Node {
        block(
            BlockId::ITEM,
            vec![
                record("baseName", Value::String(name.into())),
                record("stackSize", Value::Int32(1)),
                record("posX", Value::Int32(x)),
                record("posY", Value::Int32(y)),
                record("embeddedCount", Value::Int32(0)),
            ],
        )
    }

    fn equipped_item(name: &str, slot: i32) -> Node {
        block(
            BlockId::ITEM,
            vec![
                record("baseName", Value::String(name.into())),
                record("equipSlot", Value::Int32(slot)),
            ],
        )
    }

    fn sack(kind: i32, items: Vec<Node>) -> Node {
        let mut children = vec![
            record("sackType", Value::Int32(kind)),
            record("itemCount", Value::Int32(items.len() as i32)),
        ];
        children.extend(items);
        block(BlockId::SACK, children)
    }

    fn player_file() -> Vec<u8> {
        encode_nodes(&[
            header(true, 0),
            block(
                BlockId::ATTRIBUTES,
                vec![
                    record("playerName", Value::String("Hero".into())),
                    record("level", Value::Int32(12)),
                ],
            ),
            sack(
                0,
                vec![grid_item("Potion", 0, 0), grid_item("Potion", 1, 0), grid_item("Ring", 4, 4)],
            ),
            sack(1, vec![equipped_item("Helm", 0), equipped_item("Sword", 7)]),
            sack(2, vec![]),
        ])
    }

    fn decode(data: &[u8]) -> SaveDocument {
        Decoder::new().decode_document(data, "saves/Hero.chr").unwrap()
    }

    #[test]
    fn test_decode_player() {
        let doc = decode(&player_file());
        assert_eq!(doc.kind(), DocumentKind::Player);
        assert_eq!(doc.format(), Format { version: 4, expansion: true });
        assert_eq!(doc.display_name(), "Hero");
        assert_eq!(doc.attributes().value("level"), Some(&Value::Int32(12)));
        assert_eq!(doc.sacks().len(), 3);
        assert_eq!(doc.sacks()[1].kind(), SackKind::Equipment);
        assert_eq!(doc.item_at(0, 4, 4), Some(2));
        assert!(!doc.is_modified());
        assert_eq!(crate::encode(&doc), player_file());
    }

    #[rstest]
    #[case(&[], "empty file")]
    #[case(b"PK\x03\x04 zip", "missing begin marker")]
    #[case(&[0x00], "missing begin marker")]
    fn not_valid_save_files(#[case] data: &[u8], #[case] reason: &str) {
        let err = Decoder::new().decode_document(data, "x").unwrap_err();
        match err.kind() {
            ErrorKind::NotAValidSaveFile { reason: x } => assert_eq!(*x, reason),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_first_block_must_be_header() {
        let data = encode_nodes(&[sack(0, vec![])]);
        let err = Decoder::new().decode_document(&data, "x").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NotAValidSaveFile { .. }));

        let data = encode_nodes(&[block(BlockId::HEADER, vec![])]);
        let err = Decoder::new().decode_document(&data, "x").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::NotAValidSaveFile {
                reason: "missing format version"
            }
        ));
    }

    #[test]
    fn test_partial_marker_is_truncated() {
        let marker = BEGIN_MARKER.to_le_bytes();
        let err = Decoder::new().decode_document(&marker[..3], "x").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TruncatedInput { .. }));
    }

    #[test]
    fn test_unexpected_expansion_block_is_kept() {
        let data = encode_nodes(&[
            header(false, 1),
            block(BlockId::EXPANSION, vec![record("x", Value::Int32(1))]),
            sack(2, vec![grid_item("Ring", 0, 0)]),
        ]);
        let doc = decode(&data);
        assert_eq!(doc.kind(), DocumentKind::Stash);
        assert_eq!(doc.opaque_sections().len(), 1);
        assert_eq!(doc.sacks().len(), 1);
        assert_eq!(crate::encode(&doc), data);
    }

    #[test]
    fn test_move_within_sack() {
        let mut doc = decode(&player_file());
        let at = doc
            .move_item(ItemRef::new(0, 2), 0, Placement::grid(11, 4))
            .unwrap();
        assert_eq!(at, ItemRef::new(0, 2));
        assert_eq!(doc.item(at).unwrap().placement(), Placement::grid(11, 4));
        assert!(doc.is_modified());
    }

    #[test]
    fn test_refused_move_leaves_document_untouched() {
        let mut doc = decode(&player_file());
        assert_eq!(
            doc.move_item(ItemRef::new(0, 2), 0, Placement::grid(0, 0)),
            Err(EditError::Overlap {
                placement: Placement::grid(0, 0),
                index: 0
            })
        );
        assert_eq!(
            doc.move_item(ItemRef::new(0, 9), 2, Placement::grid(0, 0)),
            Err(EditError::NoSuchItem { sack: 0, index: 9 })
        );
        assert_eq!(
            doc.move_item(ItemRef::new(0, 0), 7, Placement::grid(0, 0)),
            Err(EditError::NoSuchSack(7))
        );
        assert!(!doc.is_modified());
        assert_eq!(crate::encode(&doc), player_file());
    }

    #[test]
    fn test_move_across_sacks_transfers_ownership() {
        let mut doc = decode(&player_file());
        let at = doc
            .move_item(ItemRef::new(0, 2), 2, Placement::grid(9, 17))
            .unwrap();
        assert_eq!(at, ItemRef::new(2, 0));
        assert_eq!(doc.sacks()[0].len(), 2);
        assert_eq!(doc.sacks()[2].len(), 1);

        let reloaded = decode(&crate::encode(&doc));
        assert_eq!(reloaded.sacks()[0].len(), 2);
        assert_eq!(reloaded.sacks()[2].items()[0].placement(), Placement::grid(9, 17));
        assert!(reloaded.sacks()[2].items()[0].base_name().eq_str("Ring"));
    }

    #[test]
    fn test_stack_items() {
        let mut doc = decode(&player_file());
        let merged = doc
            .stack_item(ItemRef::new(0, 0), ItemRef::new(0, 1))
            .unwrap();
        assert_eq!(merged, ItemRef::new(0, 0));
        assert_eq!(doc.item(merged).unwrap().stack_count(), 2);
        assert_eq!(doc.item(merged).unwrap().placement(), Placement::grid(1, 0));
        assert_eq!(doc.sacks()[0].len(), 2);

        assert_eq!(
            doc.stack_item(ItemRef::new(0, 0), ItemRef::new(0, 1)),
            Err(EditError::NotStackable)
        );
        assert_eq!(
            doc.stack_item(ItemRef::new(0, 0), ItemRef::new(0, 0)),
            Err(EditError::NotStackable)
        );
    }

    #[test]
    fn test_remove_item() {
        let mut doc = decode(&player_file());
        let item = doc.remove_item(ItemRef::new(1, 0)).unwrap();
        assert!(item.base_name().eq_str("Helm"));
        assert_eq!(doc.sacks()[1].len(), 1);
        assert!(doc.is_modified());

        let reloaded = decode(&crate::encode(&doc));
        assert_eq!(reloaded.sacks()[1].len(), 1);
    }

    #[test]
    fn test_equipment_slots() {
        let mut doc = decode(&player_file());
        assert_eq!(
            doc.set_equipment_slot(ItemRef::new(1, 0), EquipmentSlot::Weapon1),
            Err(EditError::SlotOccupied(EquipmentSlot::Weapon1))
        );
        assert_eq!(
            doc.set_equipment_slot(ItemRef::new(0, 0), EquipmentSlot::Head),
            Err(EditError::WrongSackKind {
                kind: SackKind::Inventory,
                placement: Placement::Equipped(EquipmentSlot::Head)
            })
        );
        assert!(!doc.is_modified());

        doc.set_equipment_slot(ItemRef::new(1, 1), EquipmentSlot::Weapon2)
            .unwrap();
        let reloaded = decode(&crate::encode(&doc));
        assert_eq!(
            reloaded.sacks()[1].slot_occupant(EquipmentSlot::Weapon2),
            Some(1)
        );
    }

    #[test]
    fn test_insert_from_other_document() {
        let mut source = decode(&player_file());
        let mut stash = SaveDocument::create_empty(SackKind::TransferStash, "Transfer", "t.dxb");
        let item = source.remove_item(ItemRef::new(0, 2)).unwrap();
        let at = stash.insert_item(0, item, Placement::grid(17, 9)).unwrap();
        assert_eq!(at, ItemRef::new(0, 0));
        assert!(stash.is_modified());

        let reloaded = decode(&crate::encode(&stash));
        assert_eq!(reloaded.kind(), DocumentKind::Stash);
        assert_eq!(reloaded.sacks()[0].kind(), SackKind::TransferStash);
        assert_eq!(reloaded.sacks()[0].items()[0].placement(), Placement::grid(17, 9));
    }

    #[test]
    fn test_footprint_checks() {
        let mut doc = decode(&player_file());
        doc.move_item(ItemRef::new(0, 2), 0, Placement::grid(4, 2))
            .unwrap();
        doc.set_item_footprint(ItemRef::new(0, 2), GridSize::new(2, 3))
            .unwrap();
        assert_eq!(
            doc.move_item(ItemRef::new(0, 2), 0, Placement::grid(4, 3)),
            Err(EditError::OutOfBounds {
                placement: Placement::grid(4, 3)
            })
        );
        assert_eq!(
            doc.move_item(ItemRef::new(0, 0), 0, Placement::grid(5, 2)),
            Err(EditError::Overlap {
                placement: Placement::grid(5, 2),
                index: 2
            })
        );
        assert_eq!(
            doc.move_item(ItemRef::new(0, 0), 0, Placement::grid(6, 2)),
            Ok(ItemRef::new(0, 0))
        );
        assert_eq!(doc.item_at(0, 5, 4), Some(2));
        assert_eq!(doc.item_at(0, 6, 2), Some(0));
    }

    #[test]
    fn test_footprint_cannot_cover_neighbours() {
        let mut doc = decode(&player_file());
        assert_eq!(
            doc.set_item_footprint(ItemRef::new(0, 0), GridSize::new(2, 1)),
            Err(EditError::Overlap {
                placement: Placement::grid(0, 0),
                index: 1
            })
        );
        assert_eq!(doc.item_at(0, 1, 0), Some(1));
        assert_eq!(doc.item(ItemRef::new(0, 0)).unwrap().footprint(), GridSize::new(1, 1));

        assert_eq!(
            doc.set_item_footprint(ItemRef::new(0, 2), GridSize::new(1, 2)),
            Err(EditError::OutOfBounds {
                placement: Placement::grid(4, 4)
            })
        );
        doc.set_item_footprint(ItemRef::new(1, 0), GridSize::new(2, 2))
            .unwrap();
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_set_attribute() {
        let mut doc = decode(&player_file());
        assert_eq!(
            doc.set_attribute("level", Value::Int32(13)),
            Ok(Some(Value::Int32(12)))
        );
        let reloaded = decode(&crate::encode(&doc));
        assert_eq!(reloaded.attributes().value("level"), Some(&Value::Int32(13)));

        let mut stash = SaveDocument::create_empty(SackKind::Stash, "Vault", "v.dxb");
        stash
            .set_attribute("owner", Value::String("Hero".into()))
            .unwrap();
        let reloaded = decode(&crate::encode(&stash));
        assert_eq!(reloaded.attributes().len(), 1);
        assert_eq!(reloaded.sacks().len(), 1);
    }

    fn with_unknown_tag(block: Block) -> Node {
        let mut payload = encode_nodes(&block.children);
        payload.extend_from_slice(&7u32.to_le_bytes());
        payload.extend_from_slice(b"newMark");
        payload.push(0x20);
        payload.extend_from_slice(&[1, 2, 3, 4]);
        Node::Opaque(crate::binary::OpaqueBlock {
            id: block.id,
            payload,
        })
    }

    #[test]
    fn test_opaque_attributes_refuse_edits() {
        let attributes = Block {
            id: BlockId::ATTRIBUTES,
            children: vec![record("level", Value::Int32(3))],
        };
        let data = encode_nodes(&[
            header(true, 0),
            with_unknown_tag(attributes),
            sack(0, vec![grid_item("Ring", 0, 0)]),
        ]);

        let mut doc = decode(&data);
        assert!(doc.attributes().is_empty());
        assert_eq!(
            doc.set_attribute("level", Value::Int32(4)),
            Err(EditError::OpaqueSection(BlockId::ATTRIBUTES))
        );
        assert!(!doc.is_modified());
        assert_eq!(crate::encode(&doc), data);
    }

    #[test]
    fn test_header_with_unknown_tag_is_kept_opaque() {
        let header = match header(true, 1) {
            Node::Block(x) => x,
            _ => unreachable!(),
        };
        let data = encode_nodes(&[
            with_unknown_tag(header),
            sack(2, vec![grid_item("Ring", 3, 3)]),
        ]);

        let doc = decode(&data);
        assert_eq!(doc.format(), Format { version: 4, expansion: true });
        assert_eq!(doc.kind(), DocumentKind::Stash);
        assert!(matches!(doc.header(), Node::Opaque(_)));
        assert_eq!(doc.sacks()[0].len(), 1);
        assert_eq!(crate::encode(&doc), data);
    }
}
