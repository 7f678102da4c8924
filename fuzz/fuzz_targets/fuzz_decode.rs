#![no_main]
use libfuzzer_sys::fuzz_target;
use vaultsave::{encode, encode_nodes, Decoder, ItemRef, Placement};

fuzz_target!(|data: &[u8]| {
    let decoder = Decoder::new();

    // Whatever decodes must encode back to the same bytes
    if let Ok(nodes) = decoder.decode_nodes(data) {
        assert_eq!(encode_nodes(&nodes), data);
    }

    if let Ok(mut doc) = decoder.decode_document(data, "fuzz.dxb") {
        assert_eq!(encode(&doc), data);

        // Edited documents must still decode
        let _ = doc.move_item(ItemRef::new(0, 0), 0, Placement::grid(1, 1));
        let _ = doc.remove_item(ItemRef::new(0, 1));
        let out = encode(&doc);
        let reloaded = decoder.decode_document(&out, "fuzz.dxb").unwrap();
        assert_eq!(encode(&reloaded), out);
    }
});
