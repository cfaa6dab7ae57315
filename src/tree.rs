use std::collections::BTreeSet;

use crate::collate::NameOrder;
use crate::formats::DirectoryNode;
use crate::paths::{segments, trim_slashes};

/// Every ancestor directory of the given scope-relative file paths.
///
/// Files directly at the scope root contribute nothing and the leaf file
/// name never becomes a directory.
pub fn extract_directories<'a, I>(paths: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut directories = BTreeSet::new();
    for path in paths {
        let parts = segments(path);
        if parts.len() < 2 {
            continue;
        }
        for end in 1..parts.len() {
            directories.insert(parts[..end].join("/"));
        }
    }
    directories
}

/// Assembles directory paths into a tree rooted at the empty path.
pub fn build_tree<'a, I>(directories: I) -> DirectoryNode
where
    I: IntoIterator<Item = &'a str>,
{
    let mut root = DirectoryNode::root();
    for directory in directories {
        let mut node = &mut root;
        let mut path = String::new();
        for part in segments(directory) {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(part);

            let index = match node.children.iter().position(|child| child.name == part) {
                Some(index) => index,
                None => {
                    node.children.push(DirectoryNode {
                        name: part.to_owned(),
                        path: path.clone(),
                        children: Vec::new(),
                    });
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }
    }

    root.sort_recursive(&NameOrder::zh());
    root
}

impl DirectoryNode {
    pub fn root() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            children: Vec::new(),
        }
    }

    /// Descends by segment names; `None` at the first missing segment.
    pub fn find(&self, path: &str) -> Option<&DirectoryNode> {
        segments(trim_slashes(path))
            .into_iter()
            .try_fold(self, |node, part| {
                node.children.iter().find(|child| child.name == part)
            })
    }

    /// Like [`find`](Self::find), but a stale selection falls back to `self`.
    pub fn resolve_or_root(&self, path: &str) -> &DirectoryNode {
        self.find(path).unwrap_or(self)
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    fn sort_recursive(&mut self, order: &NameOrder) {
        order.sort_by_key(&mut self.children, |child| child.name.as_str());
        for child in &mut self.children {
            child.sort_recursive(order);
        }
    }
}
