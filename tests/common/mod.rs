#![allow(dead_code)]

//! Builds save file bytes by hand, independent of the crate's encoder

pub const BEGIN: u32 = 0xB01D_FACE;
pub const END: u32 = 0xDEAD_C0DE;

pub const HEADER: u32 = 0x01;
pub const ATTRIBUTES: u32 = 0x02;
pub const SACK: u32 = 0x03;
pub const ITEM: u32 = 0x04;
pub const EXPANSION: u32 = 0x10;

pub fn block(id: u32, parts: &[Vec<u8>]) -> Vec<u8> {
    let payload = parts.concat();
    let mut out = Vec::with_capacity(payload.len() + 16);
    out.extend_from_slice(&BEGIN.to_le_bytes());
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&END.to_le_bytes());
    out
}

pub fn record(key: &str, tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(key.len() as u32).to_le_bytes());
    out.extend_from_slice(key.as_bytes());
    out.push(tag);
    out.extend_from_slice(value);
    out
}

pub fn int(key: &str, value: i32) -> Vec<u8> {
    record(key, 0x01, &value.to_le_bytes())
}

pub fn long(key: &str, value: i64) -> Vec<u8> {
    record(key, 0x02, &value.to_le_bytes())
}

pub fn float(key: &str, value: f32) -> Vec<u8> {
    record(key, 0x03, &value.to_le_bytes())
}

pub fn boolean(key: &str, value: bool) -> Vec<u8> {
    record(key, 0x05, &[u8::from(value)])
}

pub fn wide(key: &str, value: &str) -> Vec<u8> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let mut data = (units.len() as u32).to_le_bytes().to_vec();
    for unit in units {
        data.extend_from_slice(&unit.to_le_bytes());
    }
    record(key, 0x06, &data)
}

pub fn blob(key: &str, value: &[u8]) -> Vec<u8> {
    let mut data = (value.len() as u32).to_le_bytes().to_vec();
    data.extend_from_slice(value);
    record(key, 0x07, &data)
}

pub fn header(expansion: bool, file_kind: i32) -> Vec<u8> {
    block(
        HEADER,
        &[
            int("formatVersion", 4),
            boolean("expansion", expansion),
            int("fileKind", file_kind),
            long("checksum", 0x0BAD_F00D_1234),
        ],
    )
}

pub fn grid_item(name: &str, x: i32, y: i32) -> Vec<u8> {
    block(
        ITEM,
        &[
            wide("baseName", name),
            int("seed", 104_729),
            wide("prefixName", ""),
            int("stackSize", 1),
            int("posX", x),
            int("posY", y),
            int("embeddedCount", 0),
        ],
    )
}

pub fn sack(kind: i32, items: &[Vec<u8>]) -> Vec<u8> {
    let mut parts = vec![int("sackType", kind), int("itemCount", items.len() as i32)];
    parts.extend_from_slice(items);
    block(SACK, &parts)
}

/// A transfer stash holding the Sigil of the Hunter at (x, y) in its first
/// sack, next to data the library does not interpret
pub fn sigil_stash(x: i32, y: i32) -> Vec<u8> {
    let sigil = block(
        ITEM,
        &[
            wide("baseName", "Sigil of the Hunter"),
            int("seed", 1_337),
            wide("relicName", "Sliver of Heaven"),
            wide("relicBonus", "+5% Offensive Ability"),
            float("durability", 0.875),
            int("stackSize", 1),
            int("posX", x),
            int("posY", y),
            int("embeddedCount", 1),
            block(
                ITEM,
                &[wide("baseName", "Sliver of Heaven"), int("embeddedCount", 0)],
            ),
        ],
    );

    [
        header(true, 1),
        block(
            ATTRIBUTES,
            &[
                wide("stashName", "Hunter's Cache"),
                int("money", 250_000),
                blob("thumbnail", &[0xFF, 0xD8, 0x00, 0x10]),
            ],
        ),
        sack(4, &[grid_item("Potion of Health", 0, 0), sigil]),
        sack(4, &[grid_item("Ring of Ages", 10, 7)]),
        block(EXPANSION, &[int("vaultPages", 3)]),
    ]
    .concat()
}

/// A character save with inventory, equipment, and an unknown block
pub fn player_save() -> Vec<u8> {
    let helm = block(
        ITEM,
        &[wide("baseName", "Golden Helm"), int("equipSlot", 0), int("embeddedCount", 0)],
    );

    [
        header(false, 0),
        block(
            ATTRIBUTES,
            &[
                wide("playerName", "Kassandra"),
                int("level", 42),
                float("playTime", 1234.5),
                block(0x33, &[int("questFlags", 0x7F)]),
            ],
        ),
        sack(
            0,
            &[
                grid_item("Scroll of Fire", 0, 0),
                grid_item("Scroll of Fire", 1, 0),
                grid_item("Amulet", 3, 2),
            ],
        ),
        sack(1, &[helm]),
        block(0x99, &[long("futureData", -1)]),
    ]
    .concat()
}
