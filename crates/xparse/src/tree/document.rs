//! In-memory document arena.

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::event::{Event, TreeSink};

use super::node::Node;
use super::read::{DocumentRead, Relation};

/// Document tree backed by a flat arena in document order.
///
/// Node 0 is always the root. Structural relations are wired while the
/// scanner streams events in, by tracking the last node opened at each
/// depth; no rescans of earlier nodes are ever needed.
#[derive(Clone, Debug, Default)]
pub struct Document {
    nodes: Vec<Node>,
    /// Last node opened at each depth; index `d` holds the node still
    /// open at depth `d`. Truncated whenever a shallower node opens.
    open: Vec<usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the root node, vacant only for an empty arena.
    pub fn root(&self) -> Option<usize> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    fn checked(&self, index: usize) -> Result<&Node> {
        self.nodes
            .get(index)
            .ok_or_else(|| Error::bare(ErrorKind::NodeOutOfRange { index }))
    }

    fn open_element(&mut self, name: String, depth: u32) -> Result<()> {
        if depth == 0 && !self.nodes.is_empty() {
            return Err(Error::bare(ErrorKind::SecondRootElement));
        }
        let index = self.nodes.len();
        let depth_ix = depth as usize;
        let mut node = Node::new(name, depth);

        node.parent = depth_ix
            .checked_sub(1)
            .and_then(|d| self.open.get(d).copied());
        if let Some(&candidate) = self.open.get(depth_ix) {
            // a sibling only when it hangs off the same parent
            if self.nodes[candidate].parent == node.parent {
                node.prev_sibling = Some(candidate);
                self.nodes[candidate].next_sibling = Some(index);
            }
        }
        if let Some(parent) = node.parent {
            let parent = &mut self.nodes[parent];
            if parent.first_child.is_none() {
                parent.first_child = Some(index);
            }
        }

        self.open.truncate(depth_ix);
        self.open.push(index);
        self.nodes.push(node);
        debug!(index, depth, "element opened");
        Ok(())
    }

    fn last_node(&mut self) -> Result<&mut Node> {
        self.nodes
            .last_mut()
            .ok_or_else(|| Error::bare(ErrorKind::OutOfOrderEvent))
    }
}

impl TreeSink for Document {
    fn event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Open { name, depth } => self.open_element(name, depth),
            Event::AttrName { name } => {
                let node = self.last_node()?;
                if node.attributes.contains_key(&name) {
                    return Err(Error::bare(ErrorKind::DuplicateAttribute { name }));
                }
                node.attributes.insert(name, String::new());
                Ok(())
            }
            Event::AttrValue { value } => {
                let node = self.last_node()?;
                let last = node.attributes.len().checked_sub(1);
                let slot = last
                    .and_then(|i| node.attributes.get_index_mut(i))
                    .ok_or_else(|| Error::bare(ErrorKind::OutOfOrderEvent))?;
                *slot.1 = value;
                Ok(())
            }
            Event::Text { text, depth } => {
                let owner = (depth as usize)
                    .checked_sub(1)
                    .and_then(|d| self.open.get(d).copied())
                    .ok_or_else(|| Error::bare(ErrorKind::OutOfOrderEvent))?;
                self.nodes[owner].contents.push(text);
                Ok(())
            }
        }
    }
}

impl DocumentRead for Document {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn name(&self, node: usize) -> Result<String> {
        Ok(self.checked(node)?.name.clone())
    }

    fn depth(&self, node: usize) -> Result<u32> {
        Ok(self.checked(node)?.depth)
    }

    fn content_count(&self, node: usize) -> Result<usize> {
        Ok(self.checked(node)?.contents.len())
    }

    fn content(&self, node: usize, item: usize) -> Result<String> {
        self.checked(node)?
            .contents
            .get(item)
            .cloned()
            .ok_or_else(|| Error::bare(ErrorKind::NodeOutOfRange { index: node }))
    }

    fn attribute_count(&self, node: usize) -> Result<usize> {
        Ok(self.checked(node)?.attributes.len())
    }

    fn attribute_name(&self, node: usize, item: usize) -> Result<String> {
        self.checked(node)?
            .attributes
            .get_index(item)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| Error::bare(ErrorKind::NodeOutOfRange { index: node }))
    }

    fn attribute_value(&self, node: usize, item: usize) -> Result<String> {
        self.checked(node)?
            .attributes
            .get_index(item)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::bare(ErrorKind::NodeOutOfRange { index: node }))
    }

    fn attribute(&self, node: usize, name: &str) -> Result<Option<String>> {
        Ok(self.checked(node)?.attributes.get(name).cloned())
    }

    fn relation(&self, node: usize, relation: Relation) -> Result<Option<usize>> {
        let node = self.checked(node)?;
        Ok(match relation {
            Relation::Parent => node.parent,
            Relation::FirstChild => node.first_child,
            Relation::PrevSibling => node.prev_sibling,
            Relation::NextSibling => node.next_sibling,
        })
    }
}
