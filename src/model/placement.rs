/// The twelve equipment slots, in the order their indices are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EquipmentSlot {
    Head,
    Neck,
    Chest,
    Legs,
    Arms,
    Ring1,
    Ring2,
    Weapon1,
    Shield1,
    Weapon2,
    Shield2,
    Artifact,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 12] = [
        EquipmentSlot::Head,
        EquipmentSlot::Neck,
        EquipmentSlot::Chest,
        EquipmentSlot::Legs,
        EquipmentSlot::Arms,
        EquipmentSlot::Ring1,
        EquipmentSlot::Ring2,
        EquipmentSlot::Weapon1,
        EquipmentSlot::Shield1,
        EquipmentSlot::Weapon2,
        EquipmentSlot::Shield2,
        EquipmentSlot::Artifact,
    ];

    /// Map a stored slot index to its slot
    pub fn from_index(index: i32) -> Option<EquipmentSlot> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(&self) -> i32 {
        *self as i32
    }

    pub fn name(&self) -> &'static str {
        match self {
            EquipmentSlot::Head => "head",
            EquipmentSlot::Neck => "neck",
            EquipmentSlot::Chest => "chest",
            EquipmentSlot::Legs => "legs",
            EquipmentSlot::Arms => "arms",
            EquipmentSlot::Ring1 => "ring1",
            EquipmentSlot::Ring2 => "ring2",
            EquipmentSlot::Weapon1 => "weapon1",
            EquipmentSlot::Shield1 => "shield1",
            EquipmentSlot::Weapon2 => "weapon2",
            EquipmentSlot::Shield2 => "shield2",
            EquipmentSlot::Artifact => "artifact",
        }
    }
}

/// Top left cell of an item on a sack grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        GridPos { x, y }
    }
}

/// Width and height in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

impl GridSize {
    pub const ONE: GridSize = GridSize::new(1, 1);

    pub const fn new(width: i32, height: i32) -> Self {
        GridSize { width, height }
    }
}

impl Default for GridSize {
    fn default() -> Self {
        GridSize::ONE
    }
}

/// Where an item sits inside its sack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Placement {
    Grid(GridPos),
    Equipped(EquipmentSlot),

    /// Items embedded in another item have no placement of their own
    Unplaced,
}

impl Placement {
    pub fn grid(x: i32, y: i32) -> Self {
        Placement::Grid(GridPos::new(x, y))
    }
}

/// Cell rectangle, used for overlap and bounds checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pos: GridPos,
    size: GridSize,
}

impl Rect {
    pub(crate) fn new(pos: GridPos, size: GridSize) -> Self {
        Rect { pos, size }
    }

    pub(crate) fn intersects(&self, other: &Rect) -> bool {
        let (ax, ay) = (i64::from(self.pos.x), i64::from(self.pos.y));
        let (bx, by) = (i64::from(other.pos.x), i64::from(other.pos.y));
        ax < bx + i64::from(other.size.width)
            && bx < ax + i64::from(self.size.width)
            && ay < by + i64::from(other.size.height)
            && by < ay + i64::from(self.size.height)
    }

    pub(crate) fn fits_within(&self, bounds: GridSize) -> bool {
        let (x, y) = (i64::from(self.pos.x), i64::from(self.pos.y));
        x >= 0
            && y >= 0
            && x + i64::from(self.size.width) <= i64::from(bounds.width)
            && y + i64::from(self.size.height) <= i64::from(bounds.height)
    }
}
