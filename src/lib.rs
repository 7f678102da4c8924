/*!

A lossless codec and document model for [Titan
Quest](https://en.wikipedia.org/wiki/Titan_Quest) character saves and stash
files.

Vaultsave reads a save into an editable document, lets callers move, stack, and
remove items, and writes the document back. Everything the editor does not
intentionally change is reproduced byte for byte, including records and blocks
this library does not understand.

## Features

- ✔ Lossless: An untouched document re-encodes to the exact input bytes
- ✔ Forward compatible: Unknown records, type tags, and blocks are kept in place
- ✔ Minimal edits: Moving an item only rewrites that item's position fields
- ✔ Safe: Backs up the previous file before every save
- ✔ Exportable: Dump documents as JSON with the `serde` feature

## Quick Start

```rust
use vaultsave::{encode, Decoder, Item, ItemRef, Placement, SackKind, SaveDocument};

// A stash that does not exist on disk yet
let mut stash = SaveDocument::create_empty(SackKind::Stash, "Vault", "vault.dxb");
stash.insert_item(0, Item::new("Sigil of the Hunter"), Placement::grid(2, 3))?;

let data = encode(&stash);
let mut doc = Decoder::new().decode_document(&data, "vault.dxb")?;
assert_eq!(doc.item_at(0, 2, 3), Some(0));

doc.move_item(ItemRef::new(0, 0), 0, Placement::grid(5, 1))?;
assert!(doc.is_modified());
assert_eq!(doc.item_at(0, 5, 1), Some(0));
assert_eq!(doc.item_at(0, 2, 3), None);
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Files and Sessions

[`load`] and [`save`] read and write files. A save only touches the disk when
the document has unsaved edits, and the file being replaced is first copied to
a `.bak` sibling (see [`SaveOptions`]).

A [`Session`] caches one document per path so that every caller works against
the same instance, and writes all modified documents in one call.

```rust
use vaultsave::{Item, Placement, SackKind, SaveOptions, Session};

let dir = tempfile::tempdir()?;
let path = dir.path().join("winsys.dxb");

let mut session = Session::new();
let (stash, found) = session.open_stash(&path, SackKind::TransferStash, "Transfer")?;
assert!(!found);
stash.insert_item(0, Item::new("Potion of Health"), Placement::grid(0, 0))?;
assert_eq!(session.save_all_modified(&SaveOptions::new())?, 1);
# Ok::<(), Box<dyn std::error::Error>>(())
```

## One Level Lower

The block and record layer is available on its own. [`Decoder::decode_nodes`]
yields the raw tree of blocks and records, and [`encode_nodes`] writes it back.

```rust
use vaultsave::{encode_nodes, Block, BlockId, Decoder, Node, Record, Value};

let nodes = vec![Node::Block(Block {
    id: BlockId::HEADER,
    children: vec![Node::Record(Record::new("formatVersion", Value::Int32(4)))],
})];

let data = encode_nodes(&nodes);
assert_eq!(Decoder::new().decode_nodes(&data)?, nodes);
# Ok::<(), vaultsave::Error>(())
```

*/

mod binary;
mod data;
mod encoding;
mod errors;
mod file;
mod model;
mod serializer;
mod session;
pub(crate) mod util;

pub use self::binary::*;
pub use self::encoding::Windows1252Encoding;
pub use self::errors::*;
pub use self::file::{backup_path, decode, load, load_with, save, SaveOptions, SaveOptionsBuilder};
pub use self::model::*;
pub use self::serializer::encode;
pub use self::session::{SaveAllError, Session};
