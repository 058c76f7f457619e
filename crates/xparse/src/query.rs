//! Criteria search over a parsed document.

use crate::error::Result;
use crate::tree::DocumentRead;

/// Scan order for [`find`]. Backward yields the same matches in reverse
/// document order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Search criteria. Absent criteria are wildcards; all supplied criteria
/// must hold on the same node.
///
/// When both an attribute name and an attribute value are supplied, one
/// attribute must carry both. Supplied separately, each may be satisfied
/// by any attribute of the node. Content matches by substring against any
/// one text fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    tag_name: Option<String>,
    attribute_name: Option<String>,
    attribute_value: Option<String>,
    content: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag_name(mut self, name: impl Into<String>) -> Self {
        self.tag_name = Some(name.into());
        self
    }

    pub fn attribute_name(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = Some(name.into());
        self
    }

    pub fn attribute_value(mut self, value: impl Into<String>) -> Self {
        self.attribute_value = Some(value.into());
        self
    }

    pub fn content(mut self, substring: impl Into<String>) -> Self {
        self.content = Some(substring.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.tag_name.is_none()
            && self.attribute_name.is_none()
            && self.attribute_value.is_none()
            && self.content.is_none()
    }

    fn matches<D: DocumentRead + ?Sized>(&self, doc: &D, node: usize) -> Result<bool> {
        if let Some(name) = &self.tag_name {
            if doc.name(node)? != *name {
                return Ok(false);
            }
        }
        match (&self.attribute_name, &self.attribute_value) {
            (Some(name), Some(value)) => {
                // both must hold on the same attribute
                if doc.attribute(node, name)?.as_deref() != Some(value.as_str()) {
                    return Ok(false);
                }
            }
            (Some(name), None) => {
                if doc.attribute(node, name)?.is_none() {
                    return Ok(false);
                }
            }
            (None, Some(value)) => {
                let count = doc.attribute_count(node)?;
                let mut found = false;
                for item in 0..count {
                    if doc.attribute_value(node, item)? == *value {
                        found = true;
                        break;
                    }
                }
                if !found {
                    return Ok(false);
                }
            }
            (None, None) => {}
        }
        if let Some(substring) = &self.content {
            let count = doc.content_count(node)?;
            let mut found = false;
            for item in 0..count {
                if doc.content(node, item)?.contains(substring.as_str()) {
                    found = true;
                    break;
                }
            }
            if !found {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Collect the indices of every node satisfying `query`, ordered by
/// `direction`. A query with no criteria matches nothing.
pub fn find<D: DocumentRead + ?Sized>(
    doc: &D,
    query: &Query,
    direction: Direction,
) -> Result<Vec<usize>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let mut hits = Vec::new();
    for node in 0..doc.node_count() {
        if query.matches(doc, node)? {
            hits.push(node);
        }
    }
    if direction == Direction::Backward {
        hits.reverse();
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Scanner;
    use crate::tree::Document;

    fn parse(input: &str) -> Document {
        Scanner::new(input.as_bytes(), Document::new())
            .run()
            .expect("parse")
    }

    fn doc() -> Document {
        parse(
            r#"<library>
                 <book id="1" lang="en">Rust in Action</book>
                 <book id="2">Das Kapital</book>
                 <film id="1">Metropolis</film>
               </library>"#,
        )
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let doc = doc();
        assert!(find(&doc, &Query::new(), Direction::Forward)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_tag_name() {
        let doc = doc();
        let hits = find(&doc, &Query::new().tag_name("book"), Direction::Forward).unwrap();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn test_backward_reverses() {
        let doc = doc();
        let hits = find(&doc, &Query::new().tag_name("book"), Direction::Backward).unwrap();
        assert_eq!(hits, vec![2, 1]);
    }

    #[test]
    fn test_attribute_name_alone() {
        let doc = doc();
        let hits = find(
            &doc,
            &Query::new().attribute_name("lang"),
            Direction::Forward,
        )
        .unwrap();
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn test_attribute_pair_must_share_index() {
        let doc = parse(r#"<r><n a="x" b="y"/></r>"#);
        // a=x exists, b=y exists, but a=y does not
        let joint = Query::new().attribute_name("a").attribute_value("y");
        assert!(find(&doc, &joint, Direction::Forward).unwrap().is_empty());
        let split = Query::new().attribute_value("y");
        assert_eq!(find(&doc, &split, Direction::Forward).unwrap(), vec![1]);
    }

    #[test]
    fn test_name_and_attribute_combined() {
        let doc = doc();
        let hits = find(
            &doc,
            &Query::new()
                .tag_name("book")
                .attribute_name("id")
                .attribute_value("1"),
            Direction::Forward,
        )
        .unwrap();
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn test_content_substring() {
        let doc = doc();
        let hits = find(&doc, &Query::new().content("Kapital"), Direction::Forward).unwrap();
        assert_eq!(hits, vec![2]);
        let hits = find(&doc, &Query::new().content("in"), Direction::Forward).unwrap();
        assert_eq!(hits, vec![1]);
    }
}
