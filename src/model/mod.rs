//! The editable document model: save documents, their sacks, and the items
//! inside them

mod attributes;
mod document;
mod item;
mod placement;
mod sack;

pub use self::attributes::Attributes;
pub use self::document::{
    DocumentKind, Format, ItemRef, SaveDocument, CURRENT_FORMAT_VERSION,
};
pub use self::item::Item;
pub use self::placement::{EquipmentSlot, GridPos, GridSize, Placement};
pub use self::sack::{Sack, SackKind};

pub(crate) use self::document::Section;
