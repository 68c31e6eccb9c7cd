//! Level-order text rendering, for eyeballing tree shape while debugging.
//!
//! The layout is not a stable format. Each level is one line; every slot on a
//! level gets the same width, so a child sits roughly under its parent.

use std::collections::VecDeque;
use std::fmt;

use crate::{AvlTree, NodeId};

/// Size of the tree as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Number of levels (0 for an empty tree).
    pub depth: usize,
    /// Widest element's text, in chars. Never below 1.
    pub max_chars: usize,
}

/// Characters used to fill the rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Left padding for elements narrower than the widest one.
    pub pad: char,
    /// Indentation, gaps and missing children.
    pub blank: char,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pad: '|',
            blank: ' ',
        }
    }
}

fn push_n(out: &mut String, c: char, n: usize) {
    out.extend(std::iter::repeat(c).take(n));
}

impl<T: fmt::Display> AvlTree<T> {
    pub fn dimensions(&self) -> Dimensions {
        let mut dims = Dimensions {
            depth: 0,
            max_chars: 1,
        };
        self.traverse_level_order(|depth, value| {
            dims.depth = dims.depth.max(depth);
            dims.max_chars = dims.max_chars.max(value.to_string().chars().count());
        });
        dims
    }

    pub fn to_display_string(&self) -> String {
        self.render_with(&RenderConfig::default())
    }

    pub fn render_with(&self, config: &RenderConfig) -> String {
        let Dimensions { depth, max_chars } = self.dimensions();
        if depth == 0 {
            return String::new();
        }

        // Blank run spanning `levels_below` levels of slots.
        let span = |levels_below: usize| max_chars * ((1usize << levels_below) - 1);

        let mut out = String::new();
        let mut level = 0;
        let mut queue: VecDeque<(usize, NodeId)> = VecDeque::new();
        queue.push_back((1, self.root));

        while let Some((node_level, id)) = queue.pop_front() {
            if node_level > depth {
                continue;
            }
            if node_level != level {
                out.push('\n');
                push_n(&mut out, config.blank, span(depth - node_level));
                level = node_level;
            }

            if id.is_null() {
                push_n(&mut out, config.blank, span(depth - node_level + 1) + max_chars);
                queue.push_back((node_level + 1, NodeId::NULL));
                queue.push_back((node_level + 1, NodeId::NULL));
                continue;
            }

            let node = self.node(id);
            let text = node.data.to_string();
            push_n(&mut out, config.pad, max_chars - text.chars().count());
            out.push_str(&text);
            push_n(&mut out, config.blank, span(depth - node_level + 1));
            queue.push_back((node_level + 1, node.left));
            queue.push_back((node_level + 1, node.right));
        }

        out.push('\n');
        out
    }
}

impl<T: fmt::Display> fmt::Display for AvlTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}
