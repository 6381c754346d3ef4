// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached template stamping.

use hashbrown::HashMap;

use crate::{Error, NodeId, Tree};

/// Parses each distinct template once and stamps out copies.
///
/// Templates are keyed by their trimmed source. The cached parse lives in the
/// tree as a detached fragment that is never handed out; each stamp is a
/// fresh deep copy.
///
/// ```rust
/// use wafer_dom::{TemplateCache, Tree};
///
/// let mut tree = Tree::default();
/// let mut cache = TemplateCache::new();
/// let a = cache.stamp_element(&mut tree, "  <li>item</li> ").unwrap();
/// let b = cache.stamp_element(&mut tree, "<li>item</li>").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(cache.len(), 1);
/// assert_eq!(tree.outer_html(a), "<li>item</li>");
/// ```
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: HashMap<String, NodeId>,
}

impl TemplateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct templates parsed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been stamped yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stamps the whole template as a detached fragment.
    pub fn stamp(&mut self, tree: &mut Tree, html: &str) -> Result<NodeId, Error> {
        let key = html.trim();
        let cached = match self.entries.get(key) {
            Some(fragment) if tree.is_alive(*fragment) => *fragment,
            _ => {
                let fragment = tree.parse_template(key);
                self.entries.insert(key.to_owned(), fragment);
                fragment
            }
        };
        tree.deep_clone(cached)
    }

    /// Stamps the template and returns its first element, detached.
    pub fn stamp_element(&mut self, tree: &mut Tree, html: &str) -> Result<NodeId, Error> {
        let fragment = self.stamp(tree, html)?;
        let element = tree.first_element_child(fragment);
        let Some(element) = element else {
            tree.remove(fragment);
            return Err(Error::EmptyTemplate(html.trim().to_owned()));
        };
        tree.detach(element);
        tree.remove(fragment);
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_are_independent_copies() {
        let mut tree = Tree::default();
        let mut cache = TemplateCache::new();
        let first = cache.stamp(&mut tree, "<p>a</p><p>b</p>").unwrap();
        let second = cache.stamp(&mut tree, "<p>a</p><p>b</p>").unwrap();
        let p = tree.first_element_child(first).unwrap();
        tree.set_text_content(p, "changed").unwrap();
        assert_eq!(tree.inner_html(second), "<p>a</p><p>b</p>");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_template_has_no_element() {
        let mut tree = Tree::default();
        let mut cache = TemplateCache::new();
        assert!(matches!(
            cache.stamp_element(&mut tree, "just text"),
            Err(Error::EmptyTemplate(_))
        ));
    }

    #[test]
    fn table_parts_stamp_as_elements() {
        let mut tree = Tree::default();
        let mut cache = TemplateCache::new();
        let row = cache.stamp_element(&mut tree, "<tr><td></td></tr>").unwrap();
        assert_eq!(tree.outer_html(row), "<tr><td></td></tr>");
        let cell = cache.stamp_element(&mut tree, "<td>1</td>").unwrap();
        assert_eq!(tree.tag_name(cell), Some("td"));
    }
}
