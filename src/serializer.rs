use crate::binary::{write_node, ByteWriter};
use crate::model::{SaveDocument, Section};

/// Encode a document back into file bytes
///
/// Sections, records, and unknown fields are emitted in the order they were
/// read, and every block length is recomputed from the bytes written. A
/// document that was decoded and not edited encodes to the original bytes.
///
/// ```
/// use vaultsave::{encode, Decoder, SackKind, SaveDocument};
///
/// let doc = SaveDocument::create_empty(SackKind::Stash, "Vault", "vault.dxb");
/// let data = encode(&doc);
/// let decoded = Decoder::new().decode_document(&data, "vault.dxb")?;
/// assert_eq!(decoded.sacks()[0].kind(), SackKind::Stash);
/// assert_eq!(encode(&decoded), data);
/// # Ok::<(), vaultsave::Error>(())
/// ```
pub fn encode(doc: &SaveDocument) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    for section in doc.sections() {
        match *section {
            Section::Header => write_node(&mut writer, doc.header()),
            Section::Attributes => doc.attributes().write(&mut writer),
            Section::Sack(i) => doc.sacks()[i].write(&mut writer),
            Section::Extra(i) => write_node(&mut writer, doc.extra(i)),
        }
    }

    writer.into_inner()
}
