//! Full-tree audit of the AVL, ordering and parent-link invariants.

use thiserror::Error;

use crate::{AvlTree, Iter, NodeId, MAX_BALANCE};

/// A broken structural invariant. Any of these means the rebalancing code
/// has a bug; correct inputs can never produce one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("node {node:?} has balance factor {balance} outside [-{max}, {max}]", max = MAX_BALANCE)]
    Unbalanced { node: NodeId, balance: i8 },
    #[error("node {node:?} stores balance {stored} but its subtrees measure {measured}")]
    BalanceMismatch {
        node: NodeId,
        stored: i8,
        measured: i64,
    },
    #[error("node {node:?} is not strictly greater than its in-order predecessor")]
    OrderViolation { node: NodeId },
    #[error("node {node:?} records parent {parent:?}, which does not link to it")]
    ParentMismatch { node: NodeId, parent: NodeId },
    #[error("root {node:?} has a parent link")]
    RootHasParent { node: NodeId },
    #[error("link to {node:?} points outside the arena")]
    DanglingLink { node: NodeId },
    #[error("{reachable} nodes reachable from the root, arena holds {len}")]
    LenMismatch { reachable: usize, len: usize },
}

impl<T: Ord> AvlTree<T> {
    /// Walks the whole tree and verifies every invariant, measuring subtree
    /// heights independently of the stored balance factors. O(n).
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let len = self.nodes.len();
        if self.root.is_null() {
            return match len {
                0 => Ok(()),
                _ => Err(InvariantError::LenMismatch { reachable: 0, len }),
            };
        }
        if self.root.index() >= len {
            return Err(InvariantError::DanglingLink { node: self.root });
        }
        if !self.node(self.root).parent.is_null() {
            return Err(InvariantError::RootHasParent { node: self.root });
        }

        // Pre-order collection; reversed, every child precedes its parent.
        let mut order = Vec::with_capacity(len);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if order.len() > len {
                return Err(InvariantError::LenMismatch {
                    reachable: order.len(),
                    len,
                });
            }
            let node = self.node(id);
            for child in [node.left, node.right] {
                if child.is_null() {
                    continue;
                }
                if child.index() >= len {
                    return Err(InvariantError::DanglingLink { node: child });
                }
                let recorded = self.node(child).parent;
                if recorded != id {
                    return Err(InvariantError::ParentMismatch {
                        node: child,
                        parent: recorded,
                    });
                }
                stack.push(child);
            }
        }
        if order.len() != len {
            return Err(InvariantError::LenMismatch {
                reachable: order.len(),
                len,
            });
        }

        let mut heights = vec![0i64; len];
        for &id in order.iter().rev() {
            let node = self.node(id);
            let measure = |child: NodeId| {
                if child.is_null() {
                    0
                } else {
                    heights[child.index()]
                }
            };
            let (lh, rh) = (measure(node.left), measure(node.right));
            if i64::from(node.balance) != lh - rh {
                return Err(InvariantError::BalanceMismatch {
                    node: id,
                    stored: node.balance,
                    measured: lh - rh,
                });
            }
            if node.balance.abs() > MAX_BALANCE {
                return Err(InvariantError::Unbalanced {
                    node: id,
                    balance: node.balance,
                });
            }
            heights[id.index()] = 1 + lh.max(rh);
        }

        let mut iter = Iter::new(self);
        let mut prev: Option<NodeId> = None;
        while let Some(id) = iter.next_id() {
            if let Some(p) = prev {
                if self.node(p).data >= self.node(id).data {
                    return Err(InvariantError::OrderViolation { node: id });
                }
            }
            prev = Some(id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AvlTree<i32> {
        [5, 3, 8, 1, 4, 7, 9].into_iter().collect()
    }

    #[test]
    fn test_valid_tree_passes() {
        assert_eq!(sample().check_invariants(), Ok(()));
        assert_eq!(AvlTree::<i32>::new().check_invariants(), Ok(()));
    }

    #[test]
    fn test_detects_stale_balance() {
        let mut t = sample();
        let root = t.root;
        t.node_mut(root).balance = 1;
        assert_eq!(
            t.check_invariants(),
            Err(InvariantError::BalanceMismatch {
                node: root,
                stored: 1,
                measured: 0
            })
        );
    }

    #[test]
    fn test_detects_unbalanced_chain() {
        // Hand-built 1 -> 2 -> 3 right spine with truthful factors.
        let mut t: AvlTree<i32> = AvlTree::new();
        let a = t.alloc(1, NodeId::NULL);
        let b = t.alloc(2, a);
        let c = t.alloc(3, b);
        t.root = a;
        t.node_mut(a).right = b;
        t.node_mut(b).right = c;
        t.node_mut(a).balance = -2;
        t.node_mut(b).balance = -1;
        assert_eq!(
            t.check_invariants(),
            Err(InvariantError::Unbalanced {
                node: a,
                balance: -2
            })
        );
    }

    #[test]
    fn test_detects_order_violation() {
        let mut t = sample();
        let root = t.root;
        let left = t.node(root).left;
        t.node_mut(left).data = 6;
        assert!(matches!(
            t.check_invariants(),
            Err(InvariantError::OrderViolation { .. })
        ));
    }

    #[test]
    fn test_detects_parent_mismatch() {
        let mut t = sample();
        let root = t.root;
        let left = t.node(root).left;
        let right = t.node(root).right;
        t.node_mut(left).parent = right;
        assert_eq!(
            t.check_invariants(),
            Err(InvariantError::ParentMismatch {
                node: left,
                parent: right
            })
        );
    }

    #[test]
    fn test_detects_root_parent_and_orphans() {
        let mut t = sample();
        let root = t.root;
        let left = t.node(root).left;
        t.node_mut(root).parent = left;
        assert_eq!(
            t.check_invariants(),
            Err(InvariantError::RootHasParent { node: root })
        );

        let mut t = sample();
        t.alloc(100, NodeId::NULL);
        assert_eq!(
            t.check_invariants(),
            Err(InvariantError::LenMismatch {
                reachable: 7,
                len: 8
            })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = InvariantError::Unbalanced {
            node: NodeId(3),
            balance: 2,
        };
        assert_eq!(
            err.to_string(),
            "node NodeId(3) has balance factor 2 outside [-1, 1]"
        );
    }
}
