//! IR as exchanged with text parsers and printers.

use anyhow::Result;
use serde_json::json;
use sjson_codec::{Codec, Error, Node, Options, ir};

#[test]
fn parser_output_decodes_to_a_tree() -> Result<()> {
    // what an SJSON parser hands over for {"ok": true, "n": 12.5, "xs": [null]}
    let src = r#"{
        "properties": {
            "ok": {"value": true},
            "n": {"bcd": [18, 165], "length": 4},
            "xs": {"items": [{}]}
        }
    }"#;
    let node = Node::from_ir(&ir::json::from_json_str(src)?)?;
    assert_eq!(node, Node::from_json(&json!({"ok": true, "n": 12.5, "xs": [null]})));
    Ok(())
}

#[test]
fn printer_input_reads_back() -> Result<()> {
    let node = Node::from_json(&json!({
        "name": "widget",
        "id": "0F1E2D3C4B5A69788796A5B4C3D2E1F0",
        "dims": [1.5, 2, -3e-5],
        "meta": {}
    }));
    let text = ir::json::to_json_string_pretty(&node.to_ir()?);
    let back = Node::from_ir(&ir::json::from_json_str(&text)?)?;
    assert_eq!(back, node);
    Ok(())
}

#[test]
fn slices_and_values_read_the_same() -> Result<()> {
    let value = json!({"items": [{"value": false}, {"length": 0, "bits": ""}]});
    let from_value = ir::json::from_json_value(value.clone())?;
    let from_slice = ir::json::from_json_slice(value.to_string().as_bytes())?;
    assert_eq!(from_value, from_slice);
    Ok(())
}

#[test]
fn malformed_json_reports_a_path() {
    let err = ir::json::from_json_str(r#"{"items": [{"bcd": "12"}]}"#).unwrap_err();
    match err {
        Error::Json { path, .. } => assert_eq!(path, "items[0].bcd"),
        other => panic!("expected a JSON error, got {other}"),
    }
}

#[test]
fn options_file_configures_a_codec() -> Result<()> {
    let options = Options::from_json_str(r#"{"max_depth": 2, "content_checksum": true}"#)?;
    let codec = Codec::new(options);
    assert_eq!(codec.options().max_depth, 2);

    let shallow = ir::json::from_json_str(r#"{"items": [{"items": []}]}"#)?;
    assert!(codec.decode_ir(&shallow).is_ok());
    let deep = ir::json::from_json_str(r#"{"items": [{"items": [{"items": []}]}]}"#)?;
    assert!(matches!(codec.decode_ir(&deep), Err(Error::NestingTooDeep { limit: 2 })));
    Ok(())
}
