//! Register-file and data-width discovery.
//!
//! Both heuristics look for array-shaped signals:
//! 1. **Register file:** An array of 31 or 32 elements, each 32 or 64 bits wide. A 31-entry
//!    bank is assumed to omit the hardwired `x0`.
//! 2. **Data width:** The element width of the only array, or of the first array whose
//!    elements are 32 or 64 bits wide.
//!
//! The walk is depth-first in declaration order and the first candidate wins.

use tracing::debug;

use crate::common::Logic;
use crate::hierarchy::{DesignNode, NodeKind};
use crate::sim::CoreUnderTest;

/// Register banks without `x0` have one element fewer than the architectural file.
const BANK_WITHOUT_X0: usize = 31;

/// Architectural register count.
const BANK_FULL: usize = 32;

/// Resolved handle to a register bank inside the design.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFileHandle {
    /// Dotted hierarchical path, including the root instance.
    pub path: String,
    /// Number of elements.
    pub depth: usize,
    /// Width of one element in bits.
    pub width: u32,
}

impl RegisterFileHandle {
    /// Maps an architectural register index to an element index of the bank.
    ///
    /// Returns `None` for `x0` on banks without it and for indices past the end.
    pub fn element_index(&self, register: usize) -> Option<usize> {
        let index = if self.depth == BANK_WITHOUT_X0 {
            register.checked_sub(1)?
        } else {
            register
        };
        (index < self.depth).then_some(index)
    }

    /// Reads architectural register `register` through `core`.
    pub fn read(&self, core: &dyn CoreUnderTest, register: usize) -> Logic {
        self.element_index(register)
            .map_or(Logic::Unresolved, |index| core.read_element(&self.path, index))
    }
}

/// Returns every register-bank candidate in the hierarchy, in walk order.
pub fn find_register_files(root: &dyn DesignNode) -> Vec<RegisterFileHandle> {
    let mut candidates = Vec::new();
    walk(root, "", &mut |path, node| {
        if node.kind() != NodeKind::Array {
            return;
        }
        let Some(width) = node.signal_width() else {
            return;
        };
        let depth = node.depth();
        debug!(path, depth, width, "array signal");
        if (BANK_WITHOUT_X0..=BANK_FULL).contains(&depth) && matches!(width, 32 | 64) {
            candidates.push(RegisterFileHandle {
                path: path.to_owned(),
                depth,
                width,
            });
        }
    });
    candidates
}

/// Returns the first register-bank candidate, if any.
pub fn resolve_register_file(root: &dyn DesignNode) -> Option<RegisterFileHandle> {
    find_register_files(root).into_iter().next()
}

/// Detects the data width of the core from its array-shaped signals.
pub fn detect_data_width(root: &dyn DesignNode) -> Option<u32> {
    let mut widths = Vec::new();
    walk(root, "", &mut |_, node| {
        if let Some(width) = node.signal_width().filter(|_| node.kind() == NodeKind::Array) {
            widths.push(width);
        }
    });
    match widths.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => many.iter().copied().find(|w| matches!(w, 32 | 64)),
    }
}

fn walk(node: &dyn DesignNode, parent: &str, visit: &mut dyn FnMut(&str, &dyn DesignNode)) {
    let path = if parent.is_empty() {
        node.name().to_owned()
    } else {
        format!("{parent}.{}", node.name())
    };
    visit(&path, node);
    for child in node.children() {
        walk(child, &path, visit);
    }
}
