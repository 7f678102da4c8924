mod common;

use common::*;
use vaultsave::{load, ItemRef, Placement, SackKind, SaveOptions, Session};

#[test]
fn test_one_document_per_path() {
    let dir = tempfile::tempdir().unwrap();
    let player = dir.path().join("Player.chr");
    std::fs::write(&player, player_save()).unwrap();

    let mut session = Session::new();
    let doc = session.open_player(&player).unwrap();
    doc.remove_item(ItemRef::new(0, 2)).unwrap();

    // a second open sees the edit rather than the file
    let doc = session.open_player(&player).unwrap();
    assert_eq!(doc.sacks()[0].len(), 2);
    assert!(doc.is_modified());
    assert_eq!(session.len(), 1);
}

#[test]
fn test_cross_document_move() {
    let dir = tempfile::tempdir().unwrap();
    let player = dir.path().join("Player.chr");
    let transfer = dir.path().join("winsys.dxb");
    std::fs::write(&player, player_save()).unwrap();

    let mut session = Session::new();
    let amulet = session
        .open_player(&player)
        .unwrap()
        .remove_item(ItemRef::new(0, 2))
        .unwrap();

    let (stash, found) = session
        .open_stash(&transfer, SackKind::TransferStash, "Transfer")
        .unwrap();
    assert!(!found);
    stash
        .insert_item(0, amulet, Placement::grid(17, 9))
        .unwrap();

    assert_eq!(session.save_all_modified(&SaveOptions::new()).unwrap(), 2);

    let player_doc = load(&player).unwrap();
    assert_eq!(player_doc.sacks()[0].len(), 2);
    let stash_doc = load(&transfer).unwrap();
    assert!(stash_doc.sacks()[0].items()[0].base_name().eq_str("Amulet"));
    assert!(dir.path().join("Player.chr.bak").exists());
    assert!(!dir.path().join("winsys.dxb.bak").exists());
}

#[test]
fn test_relic_vault_kind_is_forced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relics.dxb");
    std::fs::write(&path, [header(true, 1), sack(2, &[])].concat()).unwrap();

    let mut session = Session::new();
    let (doc, found) = session
        .open_stash(&path, SackKind::RelicVaultStash, "Relics")
        .unwrap();
    assert!(found);
    assert_eq!(doc.display_name(), "Relics");
    assert_eq!(doc.sacks()[0].kind(), SackKind::RelicVaultStash);
    assert!(doc.sacks()[0].dimensions().is_some());
}
