//! Design hierarchy abstraction.
//!
//! Simulation bindings expose the elaborated design as a tree of modules, signals and
//! arrays. Discovery walks that tree explicitly instead of reflecting over whatever
//! attributes a binding happens to expose.

/// Register-file and data-width discovery.
pub mod discovery;

pub use discovery::{RegisterFileHandle, detect_data_width, find_register_files, resolve_register_file};

/// Kind of a hierarchy node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Module instance; only children are meaningful.
    Module,
    /// Scalar or vector signal.
    Signal,
    /// Unpacked array of equally wide elements (memories, register banks).
    Array,
}

/// One node of a design hierarchy.
pub trait DesignNode {
    /// Instance or signal name, without the parent path.
    fn name(&self) -> &str;

    /// What kind of object the node is.
    fn kind(&self) -> NodeKind;

    /// Child nodes in declaration order. Leaves return an empty list.
    fn children(&self) -> Vec<&dyn DesignNode>;

    /// Bit width of a signal, or of one element of an array. `None` for modules.
    fn signal_width(&self) -> Option<u32>;

    /// Number of elements of an array; `1` for signals and `0` for modules.
    fn depth(&self) -> usize;
}

/// Owned hierarchy tree, the form the bundled models and tests build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyNode {
    name: String,
    kind: NodeKind,
    width: Option<u32>,
    depth: usize,
    children: Vec<Self>,
}

impl HierarchyNode {
    /// A module instance containing `children`.
    pub fn module(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Module,
            width: None,
            depth: 0,
            children,
        }
    }

    /// A `width`-bit signal.
    pub fn signal(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Signal,
            width: Some(width),
            depth: 1,
            children: Vec::new(),
        }
    }

    /// An array of `depth` elements, each `width` bits wide.
    pub fn array(name: impl Into<String>, depth: usize, width: u32) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Array,
            width: Some(width),
            depth,
            children: Vec::new(),
        }
    }
}

impl DesignNode for HierarchyNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn children(&self) -> Vec<&dyn DesignNode> {
        self.children.iter().map(|c| c as &dyn DesignNode).collect()
    }

    fn signal_width(&self) -> Option<u32> {
        self.width
    }

    fn depth(&self) -> usize {
        self.depth
    }
}
