//! Notifications sent by the library model after each change.

/// A node of the library tree, described by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryNode {
    Library { filename: String, name: String },
    Category { filename: String, name: String },
    Macro { key: String },
}

/// What changed in the library tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    /// The whole tree was rebuilt from disk
    Loaded,
    Added {
        parent: Option<LibraryNode>,
        node: LibraryNode,
    },
    Removed {
        parent: Option<LibraryNode>,
        node: LibraryNode,
    },
    Renamed {
        parent: Option<LibraryNode>,
        node: LibraryNode,
        old_name: String,
    },
    KeyChanged {
        parent: Option<LibraryNode>,
        node: LibraryNode,
        old_key: String,
    },
}

/// Observer of the library model. Every method does nothing by default, so
/// implementors only write the ones they care about.
pub trait LibraryListener: Send + Sync {
    fn library_loaded(&mut self) {}

    fn node_added(&mut self, _parent: Option<&LibraryNode>, _node: &LibraryNode) {}

    fn node_removed(&mut self, _parent: Option<&LibraryNode>, _node: &LibraryNode) {}

    fn node_renamed(&mut self, _parent: Option<&LibraryNode>, _node: &LibraryNode, _old_name: &str) {}

    fn key_changed(&mut self, _parent: Option<&LibraryNode>, _node: &LibraryNode, _old_key: &str) {}
}

/// Route an event to the matching listener method.
pub(crate) fn dispatch(listener: &mut dyn LibraryListener, event: &LibraryEvent) {
    match event {
        LibraryEvent::Loaded => listener.library_loaded(),
        LibraryEvent::Added { parent, node } => listener.node_added(parent.as_ref(), node),
        LibraryEvent::Removed { parent, node } => listener.node_removed(parent.as_ref(), node),
        LibraryEvent::Renamed {
            parent,
            node,
            old_name,
        } => listener.node_renamed(parent.as_ref(), node, old_name),
        LibraryEvent::KeyChanged {
            parent,
            node,
            old_key,
        } => listener.key_changed(parent.as_ref(), node, old_key),
    }
}
