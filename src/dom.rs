//! Minimal in-memory element tree standing in for the host's container.
//!
//! Elements live in an [`indextree::Arena`] owned by a [`Document`] and are
//! addressed by [`ElementId`]. Click handlers are plain data so the control's
//! interaction can be dispatched and inspected without a browser. Every walk
//! goes through the arena's iterators, so depth never grows the call stack.

use indextree::{Arena, NodeEdge, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(NodeId);

impl ElementId {
    /// Arena slot, stable for the lifetime of the document.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Action run when an element, or one of its descendants, is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Flip `class` on `target`.
    ToggleClass {
        target: ElementId,
        class: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub style: Vec<(String, String)>,
    pub text: Option<String>,
    pub on_click: Option<Handler>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            classes: Vec::new(),
            attributes: Vec::new(),
            style: Vec::new(),
            text: None,
            on_click: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Opening or closing of an element during a document-order walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Open(ElementId),
    Close(ElementId),
}

#[derive(Debug, Clone)]
pub struct Document {
    arena: Arena<Element>,
    root: NodeId,
}

impl Document {
    /// New document whose root element has the given tag.
    pub fn new(root_tag: &'static str) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(Element::new(root_tag));
        Self { arena, root }
    }

    pub fn root(&self) -> ElementId {
        ElementId(self.root)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.arena
            .get(id.0)
            .filter(|node| !node.is_removed())
            .map(|node| node.get())
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.arena
            .get_mut(id.0)
            .filter(|node| !node.is_removed())
            .map(|node| node.get_mut())
    }

    pub fn create_element(&mut self, tag: &'static str) -> ElementId {
        ElementId(self.arena.new_node(Element::new(tag)))
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    /// Appending an element under itself or its own descendant is ignored.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if self.get(parent).is_none() || self.get(child).is_none() {
            return;
        }
        if parent.0.ancestors(&self.arena).any(|id| id == child.0) {
            return;
        }
        child.0.detach(&mut self.arena);
        parent.0.append(child.0, &mut self.arena);
    }

    /// Drop everything under the root, keeping its own tag and attributes.
    ///
    /// The arena is replaced rather than pruned so repeated redraws do not
    /// accumulate removed slots. Ids from before the reset are stale.
    pub fn reset(&mut self) {
        let mut root = self.arena[self.root].get().clone();
        root.text = None;
        root.on_click = None;
        root.classes.retain(|c| c != "collapsed");

        let mut arena = Arena::new();
        self.root = arena.new_node(root);
        self.arena = arena;
    }

    /// Replace an element's content with plain text.
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        let Some(element) = self.get_mut(id) else {
            return;
        };
        element.text = Some(text.into());
        let removed: Vec<NodeId> = id.0.children(&self.arena).collect();
        for child in removed {
            child.remove_subtree(&mut self.arena);
        }
    }

    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.get(id).and_then(|e| e.text.as_deref())
    }

    /// Concatenated text of an element and its descendants, in order.
    pub fn text_content(&self, id: ElementId) -> String {
        if self.get(id).is_none() {
            return String::new();
        }
        id.0.descendants(&self.arena)
            .filter_map(|node| self.arena[node].get().text.as_deref())
            .collect()
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(element) = self.get_mut(id) {
            if !element.has_class(class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.get(id).is_some_and(|e| e.has_class(class))
    }

    /// Flip a class; returns whether it is present afterwards.
    pub fn toggle_class(&mut self, id: ElementId, class: &str) -> bool {
        let Some(element) = self.get_mut(id) else {
            return false;
        };
        if let Some(position) = element.classes.iter().position(|c| c == class) {
            element.classes.remove(position);
            false
        } else {
            element.classes.push(class.to_string());
            true
        }
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(element) = self.get_mut(id) {
            match element.attributes.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = value,
                None => element.attributes.push((name.to_string(), value)),
            }
        }
    }

    pub fn set_style(&mut self, id: ElementId, property: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(element) = self.get_mut(id) {
            match element.style.iter_mut().find(|(key, _)| key == property) {
                Some(slot) => slot.1 = value,
                None => element.style.push((property.to_string(), value)),
            }
        }
    }

    pub fn set_on_click(&mut self, id: ElementId, handler: Handler) {
        if let Some(element) = self.get_mut(id) {
            element.on_click = Some(handler);
        }
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        if self.get(id).is_none() {
            return Vec::new();
        }
        id.0.children(&self.arena).map(ElementId).collect()
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.arena
            .get(id.0)
            .filter(|node| !node.is_removed())
            .and_then(|node| node.parent())
            .map(ElementId)
    }

    /// Click `id`: run its handler and those of its ancestors, innermost
    /// first. Returns how many handlers ran.
    pub fn click(&mut self, id: ElementId) -> usize {
        if self.get(id).is_none() {
            return 0;
        }
        let handlers: Vec<Handler> = id
            .0
            .ancestors(&self.arena)
            .filter_map(|node| self.arena[node].get().on_click.clone())
            .collect();
        for handler in &handlers {
            match handler {
                Handler::ToggleClass { target, class } => {
                    self.toggle_class(*target, class);
                }
            }
        }
        handlers.len()
    }

    /// The root and everything attached under it, in document order.
    pub fn descendants(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.root.descendants(&self.arena).map(ElementId)
    }

    /// Elements attached under the root carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Vec<ElementId> {
        self.descendants()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// Open/close events for every attached element, in document order.
    pub fn traverse(&self) -> impl Iterator<Item = Visit> + '_ {
        self.root.traverse(&self.arena).map(|edge| match edge {
            NodeEdge::Start(id) => Visit::Open(ElementId(id)),
            NodeEdge::End(id) => Visit::Close(ElementId(id)),
        })
    }
}
