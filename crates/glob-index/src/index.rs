use std::collections::HashSet;
use std::mem;

use slotmap::{new_key_type, SlotMap};
use tracing::{trace, warn};

use crate::error::GlobIndexError;
use crate::pattern::{parse_pattern, Token};

new_key_type! {
    struct NodeId;
}

#[derive(Debug, Clone)]
struct Node<V> {
    /// The key fragment this node adds to its parent's.
    label: String,
    /// Values whose key ends at this node.
    values: Vec<V>,
    /// Values added while `label` was all digits. Filled on insert only.
    numbered: Vec<V>,
    children: Vec<NodeId>,
}

impl<V> Node<V> {
    fn new(label: String) -> Self {
        Self {
            label,
            values: Vec::new(),
            numbered: Vec::new(),
            children: Vec::new(),
        }
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// A `%*` that ends the pattern right after a `*` must take at least one
/// digit, so `t*%*` matches `tab12` but not `test`.
fn requires_digit(tokens: &[Token], t: usize) -> bool {
    t > 0 && t + 1 == tokens.len() && tokens[t] == Token::DigitRun && tokens[t - 1] == Token::AnyRun
}

/// Byte length of the longest common prefix, on char boundaries.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or_else(|| a.len().min(b.len()), |((i, _), _)| i)
}

/// Multimap from string keys to values, queried with glob patterns.
///
/// The same key may hold the same value more than once; each insert adds
/// one copy and each remove takes one away.
#[derive(Debug, Clone)]
pub struct GlobIndex<V> {
    nodes: SlotMap<NodeId, Node<V>>,
    root: NodeId,
    len: usize,
}

impl<V> Default for GlobIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> GlobIndex<V> {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(String::new()));
        Self { nodes, root, len: 0 }
    }

    /// Number of stored values, counting repeats.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of trie nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    fn child_starting_with(&self, id: NodeId, c: char) -> Option<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].label.starts_with(c))
    }

    /// Cut `id`'s label at byte `at`. `id` keeps the prefix and a new
    /// child takes the suffix along with the values and children.
    fn split(&mut self, id: NodeId, at: usize) {
        let node = &mut self.nodes[id];
        let suffix = node.label.split_off(at);
        trace!(prefix = %node.label, %suffix, "splitting node");
        node.numbered.clear();
        let tail = Node {
            label: suffix,
            values: mem::take(&mut node.values),
            numbered: Vec::new(),
            children: mem::take(&mut node.children),
        };
        let tail = self.nodes.insert(tail);
        self.nodes[id].children.push(tail);
    }

    /// Fold the only child of a value-less node into it.
    fn merge_lone_child(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let &[child] = node.children.as_slice() else {
            return;
        };
        if !node.values.is_empty() || id == self.root {
            return;
        }
        let Some(child) = self.nodes.remove(child) else {
            return;
        };
        let node = &mut self.nodes[id];
        trace!(prefix = %node.label, suffix = %child.label, "merging node");
        node.label.push_str(&child.label);
        node.values = child.values;
        node.children = child.children;
        node.numbered = if is_number(&node.label) {
            child.numbered
        } else {
            Vec::new()
        };
    }

    /// Nodes from the root to the node whose accumulated key is `key`.
    fn find_path(&self, key: &str) -> Option<Vec<NodeId>> {
        let mut path = vec![self.root];
        let mut id = self.root;
        let mut rest = key;
        while let Some(first) = rest.chars().next() {
            let child = self.child_starting_with(id, first)?;
            rest = rest.strip_prefix(self.nodes[child].label.as_str())?;
            path.push(child);
            id = child;
        }
        Some(path)
    }

    /// Drop the last node of `path` if it became empty, then merge what is
    /// left with a lone child.
    fn compact(&mut self, path: &[NodeId]) {
        let &[.., parent, id] = path else {
            return;
        };
        let node = &self.nodes[id];
        if !node.values.is_empty() {
            return;
        }
        match node.children.len() {
            0 => {
                self.nodes.remove(id);
                self.nodes[parent].children.retain(|&c| c != id);
                self.merge_lone_child(parent);
            }
            1 => self.merge_lone_child(id),
            _ => {}
        }
    }
}

impl<V: Clone> GlobIndex<V> {
    pub fn insert(&mut self, key: &str, value: V) {
        let mut id = self.root;
        let mut rest = key;
        while let Some(first) = rest.chars().next() {
            let Some(child) = self.child_starting_with(id, first) else {
                let mut node = Node::new(rest.to_owned());
                if is_number(rest) {
                    node.numbered.push(value.clone());
                }
                node.values.push(value);
                let child = self.nodes.insert(node);
                self.nodes[id].children.push(child);
                self.len += 1;
                return;
            };
            let common = common_prefix_len(&self.nodes[child].label, rest);
            if common < self.nodes[child].label.len() {
                self.split(child, common);
            }
            id = child;
            rest = &rest[common..];
        }

        let node = &mut self.nodes[id];
        if is_number(&node.label) {
            node.numbered.push(value.clone());
        }
        node.values.push(value);
        self.len += 1;
    }

    /// Every value whose key matches `pattern`, each stored copy once.
    pub fn query(&self, pattern: &str) -> Vec<V> {
        let tokens = parse_pattern(pattern);
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        let mut stack = vec![(self.root, 0usize, 0usize)];

        while let Some(state) = stack.pop() {
            if !seen.insert(state) {
                continue;
            }
            let (id, pos, t) = state;
            let node = &self.nodes[id];
            let token = tokens.get(t).copied();
            let strict = requires_digit(&tokens, t);
            if token.is_some_and(Token::matches_empty) && !strict {
                stack.push((id, pos, t + 1));
            }

            match node.label[pos..].chars().next() {
                Some(c) => {
                    if let Some(token) = token.filter(|tok| tok.accepts(c)) {
                        let pos = pos + c.len_utf8();
                        if !token.matches_empty() {
                            stack.push((id, pos, t + 1));
                        } else {
                            stack.push((id, pos, t));
                            if strict {
                                stack.push((id, pos, t + 1));
                            }
                        }
                    }
                }
                None if t == tokens.len() => matched.push(id),
                None => stack.extend(node.children.iter().map(|&child| (child, 0, t))),
            }
        }

        matched
            .into_iter()
            .flat_map(|id| self.nodes[id].values.iter().cloned())
            .collect()
    }
}

impl<V: PartialEq> GlobIndex<V> {
    /// Remove one copy of `value` from `key`. Returns whether a copy was
    /// found.
    ///
    /// A value stored at a node with an all-digit label must also be in that
    /// node's numbered bucket. Nodes produced by a split start with an empty
    /// bucket, so removing their values fails with
    /// [`GlobIndexError::NumberedValueMissing`] and leaves the index as it
    /// was.
    pub fn remove(&mut self, key: &str, value: &V) -> Result<bool, GlobIndexError> {
        let Some(path) = self.find_path(key) else {
            return Ok(false);
        };
        let Some(&id) = path.last() else {
            return Ok(false);
        };
        let node = &self.nodes[id];
        let Some(at) = node.values.iter().position(|v| v == value) else {
            return Ok(false);
        };
        let numbered_at = if is_number(&node.label) {
            match node.numbered.iter().position(|v| v == value) {
                Some(i) => Some(i),
                None => {
                    warn!(key, label = %node.label, "value missing from numbered bucket");
                    return Err(GlobIndexError::NumberedValueMissing { key: key.to_owned() });
                }
            }
        } else {
            None
        };

        let node = &mut self.nodes[id];
        node.values.remove(at);
        if let Some(i) = numbered_at {
            node.numbered.remove(i);
        }
        self.len -= 1;
        self.compact(&path);
        Ok(true)
    }
}
