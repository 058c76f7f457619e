//! Generated-tree properties: serializer and codec round trips, query
//! direction symmetry.

use std::collections::BTreeMap;

use proptest::prelude::*;
use xparse::{binary, find, parse_file, parse_str, write_file, Direction, Query, WriteOptions};

/// Generated element. Text only appears on leaves so that whitespace
/// collapsing cannot reshape the tree between passes.
#[derive(Clone, Debug)]
struct Elem {
    name: String,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    children: Vec<Elem>,
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-w][a-z0-9]{0,6}"
}

fn attrs_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(name_strategy(), "[a-zA-Z0-9 ]{0,8}", 0..3)
}

fn elem_strategy() -> impl Strategy<Value = Elem> {
    let leaf = (
        name_strategy(),
        attrs_strategy(),
        prop::option::of("[a-zA-Z0-9]{1,12}"),
    )
        .prop_map(|(name, attrs, text)| Elem {
            name,
            attrs,
            text,
            children: Vec::new(),
        });
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            name_strategy(),
            attrs_strategy(),
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(name, attrs, children)| Elem {
                name,
                attrs,
                text: None,
                children,
            })
    })
}

fn render(elem: &Elem, out: &mut String) {
    out.push('<');
    out.push_str(&elem.name);
    for (name, value) in &elem.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(value);
        out.push('"');
    }
    if elem.children.is_empty() && elem.text.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(text) = &elem.text {
        out.push_str(text);
    }
    for child in &elem.children {
        render(child, out);
    }
    out.push_str("</");
    out.push_str(&elem.name);
    out.push('>');
}

fn markup(elem: &Elem) -> String {
    let mut out = String::new();
    render(elem, &mut out);
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_text_serialization_round_trips(root in elem_strategy()) {
        let doc = parse_str(&markup(&root)).expect("generated markup parses");
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("doc.xml");
        write_file(&doc, &path, &WriteOptions::default()).expect("write");
        let back = parse_file(&path).expect("reparse");
        prop_assert_eq!(doc.nodes(), back.nodes());
    }

    #[test]
    fn prop_binary_round_trips(root in elem_strategy()) {
        let doc = parse_str(&markup(&root)).expect("generated markup parses");
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = binary::encode_file(&doc, tmp.path().join("doc")).expect("encode");
        let back = binary::decode_file(&path).expect("decode");
        prop_assert_eq!(doc.nodes(), back.nodes());
    }

    #[test]
    fn prop_backward_is_reversed_forward(root in elem_strategy(), needle in name_strategy()) {
        let doc = parse_str(&markup(&root)).expect("generated markup parses");
        for query in [
            Query::new().tag_name(&root.name),
            Query::new().tag_name(&needle),
        ] {
            let forward = find(&doc, &query, Direction::Forward).expect("forward");
            let backward = find(&doc, &query, Direction::Backward).expect("backward");
            let mut reversed = forward.clone();
            reversed.reverse();
            prop_assert_eq!(backward, reversed);
        }
    }

    #[test]
    fn prop_parse_never_panics_on_ascii_noise(input in "[ -~]{0,64}") {
        // errors are fine, panics are not
        let _ = parse_str(&input);
    }
}
