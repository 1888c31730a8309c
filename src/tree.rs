use std::cmp::Ordering;

use slotmap::{Key, SlotMap};

#[derive(Clone, Debug)]
struct Node<K, T> {
    item: T,
    parent: Option<K>,
    left: Option<K>,
    right: Option<K>,
    height: u32,
}

/// Result of [`Tree::search`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Search<K> {
    /// An item equivalent to the target is stored at this node.
    Found(K),
    /// No equivalent item; the target would sit between these two nodes.
    Vacant { pred: Option<K>, succ: Option<K> },
}

/// An AVL tree whose nodes live in a slot map.
///
/// The tree never compares items on its own. Ordering is only consulted by [`Tree::search`],
/// through a caller-supplied probe that may fail; every structural change is positional and
/// therefore infallible. Node keys stay valid until the node itself is removed, regardless
/// of rotations.
#[derive(Clone, Debug)]
pub(crate) struct Tree<K: Key, T> {
    nodes: SlotMap<K, Node<K, T>>,
    root: Option<K>,
}

impl<K: Key, T> Tree<K, T> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, id: K) -> &T {
        &self.nodes[id].item
    }

    #[cfg(any(test, feature = "audit"))]
    pub(crate) fn try_get(&self, id: K) -> Option<&T> {
        self.nodes.get(id).map(|node| &node.item)
    }

    pub(crate) fn get_mut(&mut self, id: K) -> &mut T {
        &mut self.nodes[id].item
    }

    pub(crate) fn first(&self) -> Option<K> {
        self.root.map(|root| self.leftmost(root))
    }

    pub(crate) fn last(&self) -> Option<K> {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order successor.
    pub(crate) fn next(&self, id: K) -> Option<K> {
        if let Some(right) = self.nodes[id].right {
            return Some(self.leftmost(right));
        }
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// In-order predecessor.
    pub(crate) fn prev(&self, id: K) -> Option<K> {
        if let Some(left) = self.nodes[id].left {
            return Some(self.rightmost(left));
        }
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].right == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Descend from the root, asking `probe` how the target orders against each visited item.
    ///
    /// The first error returned by `probe` aborts the search and is handed back untouched.
    pub(crate) fn search<E, F>(&self, mut probe: F) -> Result<Search<K>, E>
    where
        F: FnMut(&T) -> Result<Ordering, E>,
    {
        let mut pred = None;
        let mut succ = None;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            match probe(&node.item)? {
                Ordering::Less => {
                    succ = Some(id);
                    cursor = node.left;
                }
                Ordering::Greater => {
                    pred = Some(id);
                    cursor = node.right;
                }
                Ordering::Equal => return Ok(Search::Found(id)),
            }
        }
        Ok(Search::Vacant { pred, succ })
    }

    /// Insert `item` immediately after `anchor` in order, or at the very front for `None`.
    pub(crate) fn insert_after(&mut self, anchor: Option<K>, item: T) -> K {
        let id = self.nodes.insert(Node {
            item,
            parent: None,
            left: None,
            right: None,
            height: 1,
        });
        let attach = match anchor {
            Some(anchor) => match self.nodes[anchor].right {
                Some(right) => Some((self.leftmost(right), true)),
                None => Some((anchor, false)),
            },
            None => self.root.map(|root| (self.leftmost(root), true)),
        };
        match attach {
            Some((parent, as_left)) => {
                if as_left {
                    self.nodes[parent].left = Some(id);
                } else {
                    self.nodes[parent].right = Some(id);
                }
                self.nodes[id].parent = Some(parent);
                self.rebalance_from(Some(parent));
            }
            None => self.root = Some(id),
        }
        id
    }

    /// Unlink and return the item at `id`. Unknown keys yield `None`.
    pub(crate) fn remove(&mut self, id: K) -> Option<T> {
        let node = self.nodes.get(id)?;
        let (parent, left, right, height) = (node.parent, node.left, node.right, node.height);
        let fix_from = match (left, right) {
            (Some(left), Some(right)) => {
                // Splice the successor into the vacated position.
                let mut successor = right;
                let mut successor_parent = id;
                while let Some(next) = self.nodes[successor].left {
                    successor_parent = successor;
                    successor = next;
                }
                let fix_from = if successor_parent == id {
                    successor
                } else {
                    let orphan = self.nodes[successor].right;
                    self.nodes[successor_parent].left = orphan;
                    if let Some(orphan) = orphan {
                        self.nodes[orphan].parent = Some(successor_parent);
                    }
                    self.nodes[successor].right = Some(right);
                    self.nodes[right].parent = Some(successor);
                    successor_parent
                };
                self.nodes[successor].left = Some(left);
                self.nodes[left].parent = Some(successor);
                self.nodes[successor].height = height;
                self.nodes[successor].parent = parent;
                self.replace_child(parent, id, Some(successor));
                Some(fix_from)
            }
            (child, None) | (None, child) => {
                if let Some(child) = child {
                    self.nodes[child].parent = parent;
                }
                self.replace_child(parent, id, child);
                parent
            }
        };
        let node = self.nodes.remove(id)?;
        self.rebalance_from(fix_from);
        Some(node.item)
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, T> {
        Iter {
            tree: self,
            front: self.first(),
            back: self.last(),
            remaining: self.len(),
        }
    }

    fn leftmost(&self, mut id: K) -> K {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn rightmost(&self, mut id: K) -> K {
        while let Some(right) = self.nodes[id].right {
            id = right;
        }
        id
    }

    fn replace_child(&mut self, parent: Option<K>, old: K, new: Option<K>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let node = &mut self.nodes[parent];
                if node.left == Some(old) {
                    node.left = new;
                } else {
                    node.right = new;
                }
            }
        }
    }

    fn height(&self, id: Option<K>) -> u32 {
        id.map_or(0, |id| self.nodes[id].height)
    }

    fn update_height(&mut self, id: K) {
        let node = &self.nodes[id];
        let height = 1 + self.height(node.left).max(self.height(node.right));
        self.nodes[id].height = height;
    }

    fn balance_factor(&self, id: K) -> i64 {
        let node = &self.nodes[id];
        i64::from(self.height(node.left)) - i64::from(self.height(node.right))
    }

    fn rebalance_from(&mut self, mut cursor: Option<K>) {
        while let Some(id) = cursor {
            let top = self.balance(id);
            cursor = self.nodes[top].parent;
        }
    }

    /// Restore the AVL property at `id`, returning the root of the rebalanced subtree.
    fn balance(&mut self, id: K) -> K {
        self.update_height(id);
        let factor = self.balance_factor(id);
        if factor > 1 {
            if let Some(left) = self.nodes[id].left {
                if self.balance_factor(left) < 0 {
                    self.rotate_left(left);
                }
            }
            return self.rotate_right(id);
        }
        if factor < -1 {
            if let Some(right) = self.nodes[id].right {
                if self.balance_factor(right) > 0 {
                    self.rotate_right(right);
                }
            }
            return self.rotate_left(id);
        }
        id
    }

    fn rotate_left(&mut self, id: K) -> K {
        let Some(pivot) = self.nodes[id].right else {
            return id;
        };
        let parent = self.nodes[id].parent;
        let inner = self.nodes[pivot].left;
        self.nodes[id].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(id);
        }
        self.nodes[pivot].left = Some(id);
        self.nodes[id].parent = Some(pivot);
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, id, Some(pivot));
        self.update_height(id);
        self.update_height(pivot);
        pivot
    }

    fn rotate_right(&mut self, id: K) -> K {
        let Some(pivot) = self.nodes[id].left else {
            return id;
        };
        let parent = self.nodes[id].parent;
        let inner = self.nodes[pivot].right;
        self.nodes[id].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(id);
        }
        self.nodes[pivot].right = Some(id);
        self.nodes[id].parent = Some(pivot);
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, id, Some(pivot));
        self.update_height(id);
        self.update_height(pivot);
        pivot
    }

    /// Verify links, heights, balance and node count.
    #[cfg(any(test, feature = "audit"))]
    pub(crate) fn check(&self) -> Result<(), &'static str> {
        fn walk<K: Key, T>(
            tree: &Tree<K, T>,
            id: K,
            parent: Option<K>,
            seen: &mut usize,
        ) -> Result<u32, &'static str> {
            let node = tree.nodes.get(id).ok_or("dangling child link")?;
            if node.parent != parent {
                return Err("parent link does not match");
            }
            *seen += 1;
            let left = match node.left {
                Some(left) => walk(tree, left, Some(id), seen)?,
                None => 0,
            };
            let right = match node.right {
                Some(right) => walk(tree, right, Some(id), seen)?,
                None => 0,
            };
            if left.abs_diff(right) > 1 {
                return Err("subtree out of balance");
            }
            if node.height != 1 + left.max(right) {
                return Err("stale height");
            }
            Ok(node.height)
        }

        let mut seen = 0;
        if let Some(root) = self.root {
            walk(self, root, None, &mut seen)?;
        }
        if seen != self.nodes.len() {
            return Err("unreachable nodes");
        }
        Ok(())
    }
}

/// In-order iterator over a [`Tree`], yielding keys alongside items.
pub(crate) struct Iter<'a, K: Key, T> {
    tree: &'a Tree<K, T>,
    front: Option<K>,
    back: Option<K>,
    remaining: usize,
}

impl<'a, K: Key, T> Clone for Iter<'a, K, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K: Key, T> Iterator for Iter<'a, K, T> {
    type Item = (K, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.tree.next(id);
        Some((id, self.tree.get(id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: Key, T> DoubleEndedIterator for Iter<'a, K, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.tree.prev(id);
        Some((id, self.tree.get(id)))
    }
}

impl<'a, K: Key, T> ExactSizeIterator for Iter<'a, K, T> {}
