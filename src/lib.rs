//! # avl-set
//!
//! An ordered set backed by an AVL tree whose nodes live in a dense arena.
//!
//! Every node stores its balance factor (`height(left) - height(right)`).
//! Insertions and removals adjust those factors incrementally on the way back
//! up the tree and restore the `[-1, 1]` bound with at most one single or
//! double rotation per unbalanced ancestor.
//!
//! ## Example
//!
//! ```rust
//! use avl_set::AvlTree;
//!
//! let mut tree = AvlTree::new();
//! for v in [5, 3, 8, 1, 4, 7, 9] {
//!     tree.insert(v);
//! }
//!
//! assert!(tree.contains(&7));
//! assert!(!tree.contains(&6));
//! assert_eq!(tree.root().map(|n| *n.value()), Some(5));
//!
//! tree.remove(&5);
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 3, 4, 7, 8, 9]);
//! ```

#![forbid(unsafe_code)]

mod check;
mod display;

pub use check::InvariantError;
pub use display::{Dimensions, RenderConfig};

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::VecDeque;

use tracing::trace;

// =============================================================================
// Configuration
// =============================================================================

/// Largest balance factor magnitude a node may hold once an operation returns.
pub const MAX_BALANCE: i8 = 1;

// =============================================================================
// Node handles
// =============================================================================

/// Index of a node in the tree's arena.
///
/// Ids are only meaningful for the tree that produced them and only until the
/// next removal, which compacts the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    /// Marks an absent child or parent link.
    pub const NULL: NodeId = NodeId(u32::MAX);

    #[inline]
    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize);
        Self(index as u32)
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    fn index(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    data: T,
    left: NodeId,
    right: NodeId,
    /// Non-owning back link, used only to walk upward.
    parent: NodeId,
    balance: i8,
}

// =============================================================================
// AvlTree
// =============================================================================

/// An ordered set of distinct values kept height balanced.
///
/// The arena holds exactly `len()` nodes; links between them are [`NodeId`]s,
/// so the parent back link never participates in ownership.
#[derive(Clone)]
pub struct AvlTree<T> {
    nodes: Vec<Node<T>>,
    root: NodeId,
}

impl<T> AvlTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId::NULL,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NodeId::NULL;
    }

    /// Number of levels in the tree (0 when empty).
    ///
    /// Follows the taller child at every step, so this is O(log n).
    pub fn height(&self) -> usize {
        self.height_from(self.root)
    }

    /// Read-only handle on the root node.
    pub fn root(&self) -> Option<NodeRef<'_, T>> {
        self.node_ref(self.root)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Visits every value breadth first, passing its depth (root = 1).
    pub fn traverse_level_order<F>(&self, mut f: F)
    where
        F: FnMut(usize, &T),
    {
        let mut queue = VecDeque::new();
        if !self.root.is_null() {
            queue.push_back((1usize, self.root));
        }
        while let Some((depth, id)) = queue.pop_front() {
            let node = self.node(id);
            f(depth, &node.data);
            for child in [node.left, node.right] {
                if !child.is_null() {
                    queue.push_back((depth + 1, child));
                }
            }
        }
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.index()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.index()]
    }

    fn node_ref(&self, id: NodeId) -> Option<NodeRef<'_, T>> {
        (!id.is_null()).then_some(NodeRef { tree: self, id })
    }

    fn height_from(&self, mut id: NodeId) -> usize {
        let mut height = 0;
        while !id.is_null() {
            height += 1;
            let node = self.node(id);
            id = if node.balance < 0 { node.right } else { node.left };
        }
        height
    }

    fn alloc(&mut self, data: T, parent: NodeId) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            data,
            left: NodeId::NULL,
            right: NodeId::NULL,
            parent,
            balance: 0,
        });
        id
    }

    fn set_root(&mut self, id: NodeId) {
        self.root = id;
        if !id.is_null() {
            self.node_mut(id).parent = NodeId::NULL;
        }
    }

    /// Puts `new` where `old` hung under `parent` (or at the root).
    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if parent.is_null() {
            self.set_root(new);
            return;
        }
        let p = self.node_mut(parent);
        if p.left == old {
            p.left = new;
        } else {
            debug_assert_eq!(p.right, old);
            p.right = new;
        }
        if !new.is_null() {
            self.node_mut(new).parent = parent;
        }
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        loop {
            let left = self.node(id).left;
            if left.is_null() {
                return id;
            }
            id = left;
        }
    }
}

// =============================================================================
// Rotations and rebalancing
// =============================================================================

impl<T> AvlTree<T> {
    /// Promotes `node.right` into `node`'s position. Returns the new subtree root.
    fn rotate_left(&mut self, node: NodeId) -> NodeId {
        trace!(pivot = node.0, "rotating left");
        let new_root = self.node(node).right;
        debug_assert!(!new_root.is_null());

        let inner = self.node(new_root).left;
        self.node_mut(node).right = inner;
        if !inner.is_null() {
            self.node_mut(inner).parent = node;
        }

        let parent = self.node(node).parent;
        self.replace_child(parent, node, new_root);
        self.node_mut(new_root).left = node;
        self.node_mut(node).parent = new_root;

        let new_balance = self.node(new_root).balance;
        let balance = self.node(node).balance + 1 - new_balance.min(0);
        self.node_mut(node).balance = balance;
        self.node_mut(new_root).balance = new_balance + 1 + balance.max(0);
        new_root
    }

    /// Promotes `node.left` into `node`'s position. Returns the new subtree root.
    fn rotate_right(&mut self, node: NodeId) -> NodeId {
        trace!(pivot = node.0, "rotating right");
        let new_root = self.node(node).left;
        debug_assert!(!new_root.is_null());

        let inner = self.node(new_root).right;
        self.node_mut(node).left = inner;
        if !inner.is_null() {
            self.node_mut(inner).parent = node;
        }

        let parent = self.node(node).parent;
        self.replace_child(parent, node, new_root);
        self.node_mut(new_root).right = node;
        self.node_mut(node).parent = new_root;

        let new_balance = self.node(new_root).balance;
        let balance = self.node(node).balance - 1 - new_balance.max(0);
        self.node_mut(node).balance = balance;
        self.node_mut(new_root).balance = new_balance - 1 + balance.min(0);
        new_root
    }

    /// Restores the bound at a node whose balance reached +/-2.
    ///
    /// A heavy child leaning the other way needs a double rotation; otherwise
    /// a single rotation suffices. Returns the new subtree root.
    fn rebalance(&mut self, node: NodeId) -> NodeId {
        let balance = self.node(node).balance;
        debug_assert!(balance.abs() > MAX_BALANCE);

        let new_root = if balance < 0 {
            let right = self.node(node).right;
            if self.node(right).balance > 0 {
                self.rotate_right(right);
            }
            self.rotate_left(node)
        } else {
            let left = self.node(node).left;
            if self.node(left).balance < 0 {
                self.rotate_left(left);
            }
            self.rotate_right(node)
        };

        debug_assert!(self.node(new_root).balance.abs() <= MAX_BALANCE);
        debug_assert!(self.node(node).balance.abs() <= MAX_BALANCE);
        new_root
    }

    /// Walks up from a freshly attached leaf while the subtree height grows.
    fn update_balance(&mut self, mut node: NodeId) {
        loop {
            if self.node(node).balance.abs() > MAX_BALANCE {
                self.rebalance(node);
                return;
            }

            let parent = self.node(node).parent;
            if parent.is_null() {
                return;
            }

            let delta = if self.node(parent).left == node { 1 } else { -1 };
            let p = self.node_mut(parent);
            p.balance += delta;
            if p.balance == 0 {
                return;
            }
            node = parent;
        }
    }

    /// Walks up from the parent of a spliced-out node while the subtree height shrinks.
    fn retrace_removal(&mut self, mut parent: NodeId, mut from_left: bool) {
        loop {
            let p = self.node_mut(parent);
            p.balance += if from_left { -1 } else { 1 };
            let balance = p.balance;

            let subtree = match balance {
                -1 | 1 => return,
                0 => parent,
                _ => {
                    let heavy = if balance > 0 {
                        self.node(parent).left
                    } else {
                        self.node(parent).right
                    };
                    let heavy_balance = self.node(heavy).balance;
                    let subtree = self.rebalance(parent);
                    // A level heavy child leaves the rotated subtree as tall as before.
                    if heavy_balance == 0 {
                        return;
                    }
                    subtree
                }
            };

            let above = self.node(subtree).parent;
            if above.is_null() {
                return;
            }
            from_left = self.node(above).left == subtree;
            parent = above;
        }
    }

    /// Unlinks `target`, rebalances, and hands back its value.
    fn remove_node(&mut self, target: NodeId) -> T {
        let (left, right) = {
            let node = self.node(target);
            (node.left, node.right)
        };

        // Two children: trade values with the in-order successor and delete that node.
        let victim = if !left.is_null() && !right.is_null() {
            let successor = self.leftmost(right);
            self.swap_data(target, successor);
            successor
        } else {
            target
        };

        let (parent, child) = {
            let node = self.node(victim);
            let child = if node.left.is_null() {
                node.right
            } else {
                node.left
            };
            (node.parent, child)
        };
        let from_left = !parent.is_null() && self.node(parent).left == victim;

        self.replace_child(parent, victim, child);
        if !parent.is_null() {
            self.retrace_removal(parent, from_left);
        }

        self.release(victim)
    }

    fn swap_data(&mut self, a: NodeId, b: NodeId) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a.index() < b.index() { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(hi.index());
        std::mem::swap(&mut head[lo.index()].data, &mut tail[0].data);
    }

    /// Drops an unlinked node from the arena, moving the last node into its slot.
    fn release(&mut self, id: NodeId) -> T {
        let last = NodeId::new(self.nodes.len() - 1);
        let removed = self.nodes.swap_remove(id.index());

        if id != last {
            let (parent, left, right) = {
                let moved = self.node(id);
                (moved.parent, moved.left, moved.right)
            };
            if parent.is_null() {
                self.root = id;
            } else {
                let p = self.node_mut(parent);
                if p.left == last {
                    p.left = id;
                } else {
                    p.right = id;
                }
            }
            for child in [left, right] {
                if !child.is_null() {
                    self.node_mut(child).parent = id;
                }
            }
        }

        removed.data
    }
}

// =============================================================================
// Ordered operations
// =============================================================================

impl<T: Ord> AvlTree<T> {
    /// Adds `value` unless an equal value is present. Returns whether it was added.
    pub fn insert(&mut self, value: T) -> bool {
        if self.root.is_null() {
            let id = self.alloc(value, NodeId::NULL);
            self.root = id;
            return true;
        }

        let mut current = self.root;
        loop {
            let node = self.node(current);
            let (next, go_left) = match value.cmp(&node.data) {
                Ordering::Equal => return false,
                Ordering::Less => (node.left, true),
                Ordering::Greater => (node.right, false),
            };

            if next.is_null() {
                let id = self.alloc(value, current);
                let parent = self.node_mut(current);
                if go_left {
                    parent.left = id;
                } else {
                    parent.right = id;
                }
                self.update_balance(id);
                return true;
            }
            current = next;
        }
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(value).is_some()
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(value).map(|id| &self.node(id).data)
    }

    /// Removes `value` if present. Returns whether anything was removed.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the stored value equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let target = self.find(value)?;
        Some(self.remove_node(target))
    }

    fn find<Q>(&self, value: &Q) -> Option<NodeId>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while !current.is_null() {
            let node = self.node(current);
            current = match value.cmp(node.data.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(current),
            };
        }
        None
    }
}

impl<T> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AvlTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> Extend<T> for AvlTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord> FromIterator<T> for AvlTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, T> IntoIterator for &'a AvlTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Read-only traversal
// =============================================================================

/// Borrowed view of one node, for walking the tree shape.
pub struct NodeRef<'a, T> {
    tree: &'a AvlTree<T>,
    id: NodeId,
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<'a, T> NodeRef<'a, T> {
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn value(&self) -> &'a T {
        &self.tree.node(self.id).data
    }

    #[inline]
    pub fn balance(&self) -> i8 {
        self.tree.node(self.id).balance
    }

    pub fn left(&self) -> Option<NodeRef<'a, T>> {
        self.tree.node_ref(self.tree.node(self.id).left)
    }

    pub fn right(&self) -> Option<NodeRef<'a, T>> {
        self.tree.node_ref(self.tree.node(self.id).right)
    }

    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.tree.node_ref(self.tree.node(self.id).parent)
    }

    /// Levels in the subtree rooted here.
    pub fn height(&self) -> usize {
        self.tree.height_from(self.id)
    }
}

/// In-order (ascending) iterator.
pub struct Iter<'a, T> {
    tree: &'a AvlTree<T>,
    stack: Vec<NodeId>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    fn new(tree: &'a AvlTree<T>) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::with_capacity(tree.height()),
            remaining: tree.len(),
        };
        iter.push_left_spine(tree.root);
        iter
    }

    fn push_left_spine(&mut self, mut id: NodeId) {
        while !id.is_null() {
            self.stack.push(id);
            id = self.tree.node(id).left;
        }
    }

    fn next_id(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.push_left_spine(self.tree.node(id).right);
        self.remaining = self.remaining.saturating_sub(1);
        Some(id)
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        self.next_id().map(|id| &tree.node(id).data)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}


#[cfg(test)]
mod proptests;
