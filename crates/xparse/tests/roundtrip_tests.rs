//! Serializer and codec round trips.

use std::fs;

use xparse::{binary, parse_file, parse_str, write_file, DocumentRead, WriteOptions};

fn nodes_equal(a: &xparse::Document, b: &xparse::Document) -> bool {
    a.nodes() == b.nodes()
}

#[test]
fn test_text_round_trip_preserves_tree() {
    let doc = parse_str(
        r#"<recipe yield="4">
             <name>Flatbread</name>
             <step n="1">mix &amp; rest</step>
             <step n="2">bake</step>
           </recipe>"#,
    )
    .expect("parse");

    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("recipe.xml");
    write_file(&doc, &path, &WriteOptions::default()).expect("write");
    let back = parse_file(&path).expect("reparse");
    assert!(nodes_equal(&doc, &back));
}

#[test]
fn test_pretty_output_reparses_to_same_tree() {
    let doc = parse_str("<a><b>x</b><c><d/></c></a>").expect("parse");
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("pretty.xml");
    let options = WriteOptions {
        indent: 4,
        vertical_spacing: 2,
    };
    write_file(&doc, &path, &options).expect("write");
    let back = parse_file(&path).expect("reparse");
    assert!(nodes_equal(&doc, &back));
}

#[test]
fn test_decoded_entities_survive_a_full_cycle() {
    // &lt; and &quot; decode at parse time and must re-escape on write
    let doc = parse_str(r#"<m q="&quot;a&quot;">1 &lt; 2 &amp; 3</m>"#).expect("parse");
    assert_eq!(doc.content(0, 0).unwrap(), "1 < 2 & 3");

    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("cycle.xml");
    write_file(&doc, &path, &WriteOptions::default()).expect("write");
    let back = parse_file(&path).expect("reparse");
    assert!(nodes_equal(&doc, &back));
}

#[test]
fn test_binary_round_trip() {
    let doc = parse_str(r#"<a k="v">one<b>x</b>two<c/></a>"#).expect("parse");
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = binary::encode_file(&doc, tmp.path().join("doc")).expect("encode");
    let back = binary::decode_file(&path).expect("decode");
    assert!(nodes_equal(&doc, &back));
}

#[test]
fn test_binary_then_text_serialization() {
    // a decoded document must serialize like the original
    let doc = parse_str("<a>alpha<b>beta</b></a>").expect("parse");
    let tmp = tempfile::tempdir().expect("tempdir");

    let bin = binary::encode_file(&doc, tmp.path().join("doc")).expect("encode");
    let decoded = binary::decode_file(&bin).expect("decode");

    let from_original = tmp.path().join("orig.xml");
    let from_decoded = tmp.path().join("dec.xml");
    write_file(&doc, &from_original, &WriteOptions::default()).expect("write");
    write_file(&decoded, &from_decoded, &WriteOptions::default()).expect("write");
    assert_eq!(
        fs::read_to_string(&from_original).unwrap(),
        fs::read_to_string(&from_decoded).unwrap()
    );
}

#[test]
fn test_binary_from_persisted_backend_matches_memory() {
    const INPUT: &str = r#"<cfg mode="fast"><opt name="a">on</opt><opt name="b"/></cfg>"#;
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("cfg.xml");
    fs::write(&input, INPUT).expect("write input");
    let store = tmp.path().join("store");
    fs::create_dir(&store).expect("mkdir");

    let mem = parse_str(INPUT).expect("memory parse");
    let file = xparse::parse_file_backed(&input, &store).expect("file parse");

    let from_mem = binary::encode_file(&mem, tmp.path().join("m")).expect("encode mem");
    let from_file = binary::encode_file(&file, tmp.path().join("f")).expect("encode file");
    assert_eq!(
        fs::read(&from_mem).unwrap(),
        fs::read(&from_file).unwrap()
    );
}
