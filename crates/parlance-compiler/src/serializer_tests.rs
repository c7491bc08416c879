//! Tests for the module stream.

use super::ir::{IrPhrase, IrValue};
use super::serializer::{BinarySerializer, SerializedItem, Serializer};

fn sample_items() -> Vec<SerializedItem> {
    vec![
        SerializedItem::HeaderSection {
            module: "Sample".to_string(),
        },
        SerializedItem::BodySection,
        SerializedItem::Statement {
            body: IrPhrase::Send {
                message: "print_".to_string(),
                arguments: vec![IrPhrase::Literal(IrValue::Integer(42))],
            },
        },
        SerializedItem::Initialization {
            name: "x".to_string(),
            value: IrPhrase::Literal(IrValue::Str("hello".to_string())),
        },
        SerializedItem::Publication {
            atoms: vec![("thing".to_string(), 7)],
        },
    ]
}

#[test]
fn stream_round_trips() {
    let serializer = BinarySerializer::new();
    let items = sample_items();
    for item in &items {
        serializer.serialize(item).expect("serializes");
    }
    let bytes = serializer.finish();
    let decoded = BinarySerializer::read_items(&bytes).expect("decodes");
    assert_eq!(decoded, items);
}

#[test]
fn corruption_is_detected() {
    let serializer = BinarySerializer::new();
    serializer
        .serialize(&SerializedItem::BodySection)
        .expect("serializes");
    let mut bytes = serializer.finish();
    bytes[2] ^= 0xFF;
    assert!(BinarySerializer::read_items(&bytes).is_err());
}

#[test]
fn truncation_is_detected() {
    let serializer = BinarySerializer::new();
    for item in sample_items() {
        serializer.serialize(&item).expect("serializes");
    }
    let bytes = serializer.finish();
    assert!(BinarySerializer::read_items(&bytes[..bytes.len() - 5]).is_err());
}

#[test]
fn empty_stream_is_valid() {
    let serializer = BinarySerializer::new();
    let bytes = serializer.finish();
    assert_eq!(
        BinarySerializer::read_items(&bytes).expect("decodes"),
        Vec::new()
    );
}
