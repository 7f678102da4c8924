use super::item::{put_i32, Item, ItemSchema};
use super::placement::{EquipmentSlot, GridPos, GridSize, Placement, Rect};
use crate::binary::{write_block, write_node, Block, BlockId, ByteWriter, Node, Value};
use crate::errors::EditError;
use log::warn;

/// What a sack holds, as stored in its `sackType` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SackKind {
    Inventory,
    Equipment,
    Stash,
    RelicVaultStash,
    TransferStash,
    Other(i32),
}

impl SackKind {
    pub fn from_code(code: i32) -> SackKind {
        match code {
            0 => SackKind::Inventory,
            1 => SackKind::Equipment,
            2 => SackKind::Stash,
            3 => SackKind::RelicVaultStash,
            4 => SackKind::TransferStash,
            x => SackKind::Other(x),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            SackKind::Inventory => 0,
            SackKind::Equipment => 1,
            SackKind::Stash => 2,
            SackKind::RelicVaultStash => 3,
            SackKind::TransferStash => 4,
            SackKind::Other(x) => *x,
        }
    }

    /// Grid size in cells. Equipment and unrecognized kinds are unbounded.
    pub fn dimensions(&self) -> Option<GridSize> {
        match self {
            SackKind::Inventory => Some(GridSize::new(12, 5)),
            SackKind::Stash => Some(GridSize::new(10, 18)),
            SackKind::TransferStash => Some(GridSize::new(18, 10)),
            SackKind::RelicVaultStash => Some(GridSize::new(18, 20)),
            SackKind::Equipment | SackKind::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SackField {
    Kind,
    ItemCount,
    Item,
    Unknown(usize),
}

/// A container of items: a player bag, the equipment set, or a stash page
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Sack {
    kind: SackKind,
    items: Vec<Item>,
    unknown_fields: Vec<Node>,
    #[cfg_attr(feature = "serde", serde(skip))]
    layout: Vec<SackField>,

    /// Difference between the stored item count and the item blocks
    /// actually present, kept so an inconsistent file re-encodes as read
    #[cfg_attr(feature = "serde", serde(skip))]
    count_bias: i64,
}

impl Sack {
    pub fn new(kind: SackKind) -> Self {
        Sack {
            kind,
            items: Vec::new(),
            unknown_fields: Vec::new(),
            layout: vec![SackField::Kind, SackField::ItemCount],
            count_bias: 0,
        }
    }

    pub fn kind(&self) -> SackKind {
        self.kind
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records and blocks outside the known schema, including item blocks
    /// that could not be assembled
    pub fn unknown_fields(&self) -> &[Node] {
        &self.unknown_fields
    }

    pub fn dimensions(&self) -> Option<GridSize> {
        self.kind.dimensions()
    }

    /// Index of the grid item covering the given cell
    pub fn item_at(&self, x: i32, y: i32) -> Option<usize> {
        let cell = Rect::new(GridPos::new(x, y), GridSize::ONE);
        self.items
            .iter()
            .position(|item| item.rect().map_or(false, |r| r.intersects(&cell)))
    }

    /// Index of the item equipped in the given slot
    pub fn slot_occupant(&self, slot: EquipmentSlot) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.placement() == Placement::Equipped(slot))
    }

    /// Number of item blocks written for this sack, opaque ones included
    pub(crate) fn item_block_count(&self) -> usize {
        let opaque = self
            .unknown_fields
            .iter()
            .filter(|n| n.block_id() == Some(BlockId::ITEM))
            .count();
        self.items.len() + opaque
    }

    /// Verify that an item with the given footprint may take the placement.
    /// The item at `ignore`, if any, is the one being moved.
    pub(crate) fn check_placement(
        &self,
        footprint: GridSize,
        placement: Placement,
        ignore: Option<usize>,
    ) -> Result<(), EditError> {
        let mut others = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != ignore);

        match (self.kind, placement) {
            (SackKind::Equipment, Placement::Equipped(slot)) => {
                if others.any(|(_, item)| item.placement() == placement) {
                    return Err(EditError::SlotOccupied(slot));
                }
                Ok(())
            }
            (SackKind::Equipment, _) | (_, Placement::Equipped(_)) | (_, Placement::Unplaced) => {
                Err(EditError::WrongSackKind {
                    kind: self.kind,
                    placement,
                })
            }
            (kind, Placement::Grid(pos)) => {
                let rect = Rect::new(pos, footprint);
                if let Some(bounds) = kind.dimensions() {
                    if !rect.fits_within(bounds) {
                        return Err(EditError::OutOfBounds { placement });
                    }
                }

                for (index, item) in others {
                    if item.rect().map_or(false, |r| r.intersects(&rect)) {
                        return Err(EditError::Overlap { placement, index });
                    }
                }

                Ok(())
            }
        }
    }

    pub(crate) fn item_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.items.get_mut(index)
    }

    pub(crate) fn set_kind(&mut self, kind: SackKind) {
        self.kind = kind;
        if !self.layout.contains(&SackField::Kind) {
            self.layout.insert(0, SackField::Kind);
        }
    }

    /// Remove the item at index along with its position in the layout
    pub(crate) fn remove(&mut self, index: usize) -> Item {
        if let Some(at) = self
            .layout
            .iter()
            .enumerate()
            .filter(|(_, f)| **f == SackField::Item)
            .nth(index)
            .map(|(i, _)| i)
        {
            self.layout.remove(at);
        }

        self.items.remove(index)
    }

    /// Append an item after the existing item run, returning its index
    pub(crate) fn push(&mut self, item: Item) -> usize {
        let at = match self.layout.iter().rposition(|f| *f == SackField::Item) {
            Some(i) => i + 1,
            None => match self.layout.iter().position(|f| *f == SackField::ItemCount) {
                Some(i) => i + 1,
                None => self.layout.len(),
            },
        };

        self.layout.insert(at, SackField::Item);
        self.items.push(item);
        self.items.len() - 1
    }

    /// Build a sack from a sack block. Item blocks that do not assemble are
    /// kept in place as unknown fields.
    pub(crate) fn assemble(block: Block, schema: ItemSchema) -> Sack {
        let mut kind = None;
        let mut declared = None;
        let mut items = Vec::new();
        let mut unknown_fields = Vec::new();
        let mut layout = Vec::with_capacity(block.children.len());

        for node in block.children {
            match node {
                Node::Record(ref x) if kind.is_none() && x.key.is("sackType") => {
                    if let Value::Int32(code) = x.value {
                        kind = Some(SackKind::from_code(code));
                        layout.push(SackField::Kind);
                        continue;
                    }
                }
                Node::Record(ref x) if declared.is_none() && x.key.is("itemCount") => {
                    if let Value::Int32(count) = x.value {
                        declared = Some(count);
                        layout.push(SackField::ItemCount);
                        continue;
                    }
                }
                Node::Block(ref x) if x.id == BlockId::ITEM => match Item::assemble(x, schema) {
                    Ok(item) => {
                        items.push(item);
                        layout.push(SackField::Item);
                        continue;
                    }
                    Err(e) => warn!("keeping unreadable item block as opaque: {:?}", e),
                },
                _ => {}
            }

            layout.push(SackField::Unknown(unknown_fields.len()));
            unknown_fields.push(node);
        }

        let mut sack = Sack {
            kind: kind.unwrap_or(SackKind::Inventory),
            items,
            unknown_fields,
            layout,
            count_bias: 0,
        };

        if let Some(declared) = declared {
            let actual = sack.item_block_count() as i64;
            if i64::from(declared) != actual {
                warn!(
                    "sack declares {} items but holds {} item blocks",
                    declared, actual
                );
                sack.count_bias = i64::from(declared) - actual;
            }
        }

        sack
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter) {
        write_block(writer, BlockId::SACK, |w| {
            let mut items = self.items.iter();
            for field in &self.layout {
                match *field {
                    SackField::Kind => put_i32(w, b"sackType", self.kind.code()),
                    SackField::ItemCount => {
                        let count = self.item_block_count() as i64 + self.count_bias;
                        put_i32(w, b"itemCount", count as i32);
                    }
                    SackField::Item => {
                        if let Some(item) = items.next() {
                            item.write(w);
                        }
                    }
                    SackField::Unknown(i) => write_node(w, &self.unknown_fields[i]),
                }
            }

            for item in items {
                item.write(w);
            }
        });
    }
}
