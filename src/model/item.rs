use super::placement::{EquipmentSlot, GridSize, Placement, Rect};
use crate::binary::{
    write_block, write_node, write_record, Block, BlockId, ByteWriter, Node, Record, TypeTag,
    Value, WideString,
};

/// What a known key means to the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    BaseName,
    StackSize,
    PosX,
    PosY,
    EquipSlot,
    EmbeddedCount,
    Variant,
    Bonus,
}

type SchemaEntry = (&'static str, TypeTag, Role);

const BASE_SCHEMA: &[SchemaEntry] = &[
    ("baseName", TypeTag::UTF16_STRING, Role::BaseName),
    ("prefixName", TypeTag::UTF16_STRING, Role::Variant),
    ("suffixName", TypeTag::UTF16_STRING, Role::Variant),
    ("relicName", TypeTag::UTF16_STRING, Role::Variant),
    ("relicBonus", TypeTag::UTF16_STRING, Role::Bonus),
    ("seed", TypeTag::INT32, Role::Variant),
    ("var1", TypeTag::INT32, Role::Variant),
    ("stackSize", TypeTag::INT32, Role::StackSize),
    ("posX", TypeTag::INT32, Role::PosX),
    ("posY", TypeTag::INT32, Role::PosY),
    ("equipSlot", TypeTag::INT32, Role::EquipSlot),
    ("embeddedCount", TypeTag::INT32, Role::EmbeddedCount),
];

// The expansion added a second relic socket
const EXPANSION_SCHEMA: &[SchemaEntry] = &[
    ("relicName2", TypeTag::UTF16_STRING, Role::Variant),
    ("relicBonus2", TypeTag::UTF16_STRING, Role::Bonus),
    ("var2", TypeTag::INT32, Role::Variant),
];

/// The set of item keys understood for a format version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ItemSchema {
    expansion: bool,
}

impl ItemSchema {
    pub(crate) fn new(expansion: bool) -> Self {
        ItemSchema { expansion }
    }

    fn role(&self, record: &Record) -> Option<Role> {
        let extra: &[SchemaEntry] = if self.expansion {
            EXPANSION_SCHEMA
        } else {
            &[]
        };

        let (_, tag, role) = BASE_SCHEMA
            .iter()
            .chain(extra)
            .find(|(key, _, _)| record.key.is(key))?;

        // a known key stored with an unexpected type is not the field we know
        (*tag == record.value.tag()).then_some(*role)
    }
}

/// Why an item block could not be assembled. The block is then kept in its
/// sack as an unknown field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssembleError {
    MissingBaseName,
    EmbeddedCount,
    Placement,
}

/// Position of each field within the item's record run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    BaseName,
    StackCount,
    PosX,
    PosY,
    EquipSlot,
    EmbeddedCount,
    Variant(usize),
    Bonus(usize),
    Embedded(usize),
    Unknown(usize),
}

/// An item stack, possibly holding embedded relics, charms, or augments
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Item {
    base_name: WideString,
    stack_count: i32,
    placement: Placement,
    variant: Vec<Record>,
    bonuses: Vec<Record>,
    embedded: Vec<Item>,
    unknown_fields: Vec<Node>,
    footprint: GridSize,
    #[cfg_attr(feature = "serde", serde(skip))]
    layout: Vec<Field>,
}

impl Item {
    /// Creates a single, unplaced item
    ///
    /// ```
    /// use vaultsave::{Item, Placement};
    ///
    /// let item = Item::new("Sigil of the Hunter");
    /// assert_eq!(item.stack_count(), 1);
    /// assert_eq!(item.placement(), Placement::Unplaced);
    /// ```
    pub fn new(base_name: &str) -> Self {
        Item {
            base_name: WideString::new(base_name),
            stack_count: 1,
            placement: Placement::Unplaced,
            variant: Vec::new(),
            bonuses: Vec::new(),
            embedded: Vec::new(),
            unknown_fields: Vec::new(),
            footprint: GridSize::ONE,
            layout: vec![Field::BaseName, Field::EmbeddedCount],
        }
    }

    pub fn with_stack_count(mut self, count: i32) -> Self {
        self.set_stack_count(count);
        self
    }

    /// Add a variant record (seed, affixes, socketed relic name)
    pub fn with_variant(mut self, record: Record) -> Self {
        let at = self.variant_index();
        self.layout.insert(at, Field::Variant(self.variant.len()));
        self.variant.push(record);
        self
    }

    /// Add a completion bonus record
    pub fn with_bonus(mut self, record: Record) -> Self {
        let at = self.variant_index();
        self.layout.insert(at, Field::Bonus(self.bonuses.len()));
        self.bonuses.push(record);
        self
    }

    /// Embed another item (relic, charm, or augment) into this one
    pub fn with_embedded(mut self, mut item: Item) -> Self {
        item.placement = Placement::Unplaced;
        item.sync_layout();

        let at = match self
            .layout
            .iter()
            .rposition(|f| matches!(f, Field::EmbeddedCount | Field::Embedded(_)))
        {
            Some(i) => i + 1,
            None => {
                self.layout.push(Field::EmbeddedCount);
                self.layout.len()
            }
        };

        self.layout.insert(at, Field::Embedded(self.embedded.len()));
        self.embedded.push(item);
        self
    }

    pub fn with_footprint(mut self, footprint: GridSize) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn base_name(&self) -> &WideString {
        &self.base_name
    }

    pub fn stack_count(&self) -> i32 {
        self.stack_count
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Typed records that distinguish one roll of an item from another
    pub fn variant(&self) -> &[Record] {
        &self.variant
    }

    /// Completion bonus records, carried without interpretation
    pub fn bonuses(&self) -> &[Record] {
        &self.bonuses
    }

    pub fn embedded(&self) -> &[Item] {
        &self.embedded
    }

    /// Records and blocks outside the known schema, in file order
    pub fn unknown_fields(&self) -> &[Node] {
        &self.unknown_fields
    }

    /// Cells covered on a sack grid. Not stored in the file; defaults to 1x1.
    pub fn footprint(&self) -> GridSize {
        self.footprint
    }

    /// Set the cells covered on a sack grid, as looked up in the game
    /// database. Does not affect the encoded item.
    pub fn set_footprint(&mut self, footprint: GridSize) {
        self.footprint = footprint;
    }

    /// Whether two stacks can merge: same base item, same variant, and no
    /// embedded items on either
    pub fn can_stack_with(&self, other: &Item) -> bool {
        self.base_name == other.base_name
            && self.variant == other.variant
            && self.embedded.is_empty()
            && other.embedded.is_empty()
    }

    pub(crate) fn rect(&self) -> Option<Rect> {
        match self.placement {
            Placement::Grid(pos) => Some(Rect::new(pos, self.footprint)),
            _ => None,
        }
    }

    pub(crate) fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
        self.sync_layout();
    }

    pub(crate) fn set_stack_count(&mut self, count: i32) {
        self.stack_count = count;
        self.sync_layout();
    }

    /// Where new variant and bonus fields go: after the leading name and
    /// variant run
    fn variant_index(&self) -> usize {
        self.layout
            .iter()
            .position(|f| {
                !matches!(
                    f,
                    Field::BaseName | Field::Variant(_) | Field::Bonus(_)
                )
            })
            .unwrap_or(self.layout.len())
    }

    /// Where new scalar fields go: before the embedded item run
    fn tail_index(&self) -> usize {
        self.layout
            .iter()
            .position(|f| matches!(f, Field::EmbeddedCount | Field::Embedded(_)))
            .unwrap_or(self.layout.len())
    }

    /// Make the layout carry exactly the fields the typed values need.
    /// Fields already present keep their position.
    fn sync_layout(&mut self) {
        let (grid, slot) = match self.placement {
            Placement::Grid(_) => (true, false),
            Placement::Equipped(_) => (false, true),
            Placement::Unplaced => (false, false),
        };

        let has_grid = self.layout.contains(&Field::PosX);
        let has_slot = self.layout.contains(&Field::EquipSlot);
        if has_grid != grid || has_slot != slot {
            let anchor = self
                .layout
                .iter()
                .position(|f| matches!(f, Field::PosX | Field::PosY | Field::EquipSlot));
            self.layout
                .retain(|f| !matches!(f, Field::PosX | Field::PosY | Field::EquipSlot));
            let at = match anchor {
                Some(x) => x.min(self.layout.len()),
                None => self.tail_index(),
            };

            let fields: &[Field] = if grid {
                &[Field::PosX, Field::PosY]
            } else if slot {
                &[Field::EquipSlot]
            } else {
                &[]
            };
            self.layout.splice(at..at, fields.iter().copied());
        }

        if self.stack_count != 1 && !self.layout.contains(&Field::StackCount) {
            let at = self.tail_index();
            self.layout.insert(at, Field::StackCount);
        }
    }

    /// Reconstruct an item from the records and blocks of an item block
    pub(crate) fn assemble(block: &Block, schema: ItemSchema) -> Result<Item, AssembleError> {
        let mut base_name = None;
        let mut stack_count = None;
        let mut pos_x = None;
        let mut pos_y = None;
        let mut slot = None;
        let mut seen_embedded = false;
        let mut variant = Vec::new();
        let mut bonuses = Vec::new();
        let mut embedded = Vec::new();
        let mut unknown_fields = Vec::new();
        let mut layout = Vec::with_capacity(block.children.len());

        let mut children = block.children.iter();
        while let Some(node) = children.next() {
            let record = match node {
                Node::Record(x) => x,
                other => {
                    layout.push(Field::Unknown(unknown_fields.len()));
                    unknown_fields.push(other.clone());
                    continue;
                }
            };

            match (schema.role(record), &record.value) {
                (Some(Role::BaseName), Value::String(x)) if base_name.is_none() => {
                    base_name = Some(x.clone());
                    layout.push(Field::BaseName);
                }
                (Some(Role::StackSize), Value::Int32(x)) if stack_count.is_none() => {
                    stack_count = Some(*x);
                    layout.push(Field::StackCount);
                }
                (Some(Role::PosX), Value::Int32(x)) if pos_x.is_none() => {
                    pos_x = Some(*x);
                    layout.push(Field::PosX);
                }
                (Some(Role::PosY), Value::Int32(x)) if pos_y.is_none() => {
                    pos_y = Some(*x);
                    layout.push(Field::PosY);
                }
                (Some(Role::EquipSlot), Value::Int32(x)) if slot.is_none() => {
                    let equipped = EquipmentSlot::from_index(*x).ok_or(AssembleError::Placement)?;
                    slot = Some(equipped);
                    layout.push(Field::EquipSlot);
                }
                (Some(Role::EmbeddedCount), Value::Int32(count)) if !seen_embedded => {
                    seen_embedded = true;
                    layout.push(Field::EmbeddedCount);
                    let count = usize::try_from(*count).map_err(|_| AssembleError::EmbeddedCount)?;
                    for _ in 0..count {
                        match children.next() {
                            Some(Node::Block(x)) if x.id == BlockId::ITEM => {
                                layout.push(Field::Embedded(embedded.len()));
                                embedded.push(Item::assemble(x, schema)?);
                            }
                            _ => return Err(AssembleError::EmbeddedCount),
                        }
                    }
                }
                (Some(Role::Variant), _) => {
                    layout.push(Field::Variant(variant.len()));
                    variant.push(record.clone());
                }
                (Some(Role::Bonus), _) => {
                    layout.push(Field::Bonus(bonuses.len()));
                    bonuses.push(record.clone());
                }
                _ => {
                    layout.push(Field::Unknown(unknown_fields.len()));
                    unknown_fields.push(node.clone());
                }
            }
        }

        let base_name = base_name.ok_or(AssembleError::MissingBaseName)?;
        let placement = match (pos_x, pos_y, slot) {
            (Some(x), Some(y), None) => Placement::grid(x, y),
            (None, None, Some(slot)) => Placement::Equipped(slot),
            (None, None, None) => Placement::Unplaced,
            _ => return Err(AssembleError::Placement),
        };

        Ok(Item {
            base_name,
            stack_count: stack_count.unwrap_or(1),
            placement,
            variant,
            bonuses,
            embedded,
            unknown_fields,
            footprint: GridSize::ONE,
            layout,
        })
    }

    /// Flatten the item back into an item block
    pub(crate) fn write(&self, writer: &mut ByteWriter) {
        write_block(writer, BlockId::ITEM, |w| {
            for field in &self.layout {
                match *field {
                    Field::BaseName => put_wide(w, b"baseName", &self.base_name),
                    Field::StackCount => put_i32(w, b"stackSize", self.stack_count),
                    Field::PosX => {
                        if let Placement::Grid(pos) = self.placement {
                            put_i32(w, b"posX", pos.x);
                        }
                    }
                    Field::PosY => {
                        if let Placement::Grid(pos) = self.placement {
                            put_i32(w, b"posY", pos.y);
                        }
                    }
                    Field::EquipSlot => {
                        if let Placement::Equipped(slot) = self.placement {
                            put_i32(w, b"equipSlot", slot.index());
                        }
                    }
                    Field::EmbeddedCount => {
                        put_i32(w, b"embeddedCount", self.embedded.len() as i32)
                    }
                    Field::Variant(i) => write_record(w, &self.variant[i]),
                    Field::Bonus(i) => write_record(w, &self.bonuses[i]),
                    Field::Embedded(i) => self.embedded[i].write(w),
                    Field::Unknown(i) => write_node(w, &self.unknown_fields[i]),
                }
            }
        });
    }
}

pub(crate) fn put_i32(writer: &mut ByteWriter, key: &[u8], value: i32) {
    writer.write_prefixed_bytes(key);
    writer.write_u8(TypeTag::INT32.0);
    writer.write_i32(value);
}

fn put_wide(writer: &mut ByteWriter, key: &[u8], value: &WideString) {
    writer.write_prefixed_bytes(key);
    writer.write_u8(TypeTag::UTF16_STRING.0);
    writer.write_utf16(value.units());
}
