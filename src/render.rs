//! Maps a [`TreeView`] onto a [`Document`].

use crate::config::LocaleConfig;
use crate::dom::{Document, ElementId, Handler};
use crate::view::{TreeView, ViewNode};
use indextree::NodeId;

pub const NODE_CLASS: &str = "tree-node";
pub const LABEL_CLASS: &str = "tree-label";
pub const TITLE_CLASS: &str = "tree-title";
pub const STATUS_CLASS: &str = "tree-status";
pub const STATUS_OWN_CLASS: &str = "status-own";
pub const STATUS_SEPARATOR_CLASS: &str = "status-separator";
pub const STATUS_MANAGER_CLASS: &str = "status-manager";
pub const CHILDREN_CLASS: &str = "tree-children";
pub const COLLAPSED_CLASS: &str = "collapsed";

/// Append one container per root under `parent`; returns the containers.
///
/// Nodes are drawn from an explicit stack, so arbitrarily long reporting
/// chains render without recursion.
pub fn render_tree(
    doc: &mut Document,
    parent: ElementId,
    view: &TreeView,
    config: &LocaleConfig,
) -> Vec<ElementId> {
    let mut containers = Vec::with_capacity(view.roots().len());
    let mut stack: Vec<(NodeId, Option<ElementId>)> =
        view.roots().iter().rev().map(|&id| (id, None)).collect();

    while let Some((id, list)) = stack.pop() {
        let Some(node) = view.get(id) else {
            continue;
        };
        let container = render_node(doc, node, config);
        match list {
            Some(list) => doc.append_child(list, container),
            None => {
                doc.append_child(parent, container);
                containers.push(container);
            }
        }

        if view.has_children(id) {
            let children = doc.create_element("div");
            doc.add_class(children, CHILDREN_CLASS);
            doc.set_style(children, "padding-left", format!("{}px", config.indent_px));
            doc.append_child(container, children);
            let reports: Vec<NodeId> = view.children(id).collect();
            stack.extend(reports.into_iter().rev().map(|child| (child, Some(children))));
        }
    }
    containers
}

/// Container and label for one node; children are attached by the caller.
fn render_node(doc: &mut Document, node: &ViewNode, config: &LocaleConfig) -> ElementId {
    let container = doc.create_element("div");
    doc.add_class(container, NODE_CLASS);
    doc.set_attribute(container, "data-id", node.id.as_str());

    let label = doc.create_element("div");
    doc.add_class(label, LABEL_CLASS);
    if let Some(tooltip) = &node.tooltip {
        doc.set_attribute(label, "title", tooltip.as_str());
    }
    doc.set_on_click(
        label,
        Handler::ToggleClass {
            target: container,
            class: COLLAPSED_CLASS,
        },
    );

    let title = text_element(doc, "span", TITLE_CLASS, &node.title);
    doc.append_child(label, title);

    if let Some(status) = &node.status {
        let region = doc.create_element("span");
        doc.add_class(region, STATUS_CLASS);
        let parts = [
            (STATUS_OWN_CLASS, status.own.as_str()),
            (STATUS_SEPARATOR_CLASS, config.status_separator.as_str()),
            (STATUS_MANAGER_CLASS, status.manager.as_str()),
        ];
        for (class, text) in parts {
            let part = text_element(doc, "span", class, text);
            doc.append_child(region, part);
        }
        doc.append_child(label, region);
    }
    doc.append_child(container, label);

    container
}

fn text_element(doc: &mut Document, tag: &'static str, class: &str, text: &str) -> ElementId {
    let id = doc.create_element(tag);
    doc.add_class(id, class);
    doc.set_text(id, text);
    id
}

/// The label of a rendered node container.
pub fn label_of(doc: &Document, container: ElementId) -> Option<ElementId> {
    doc.children(container)
        .into_iter()
        .find(|id| doc.has_class(*id, LABEL_CLASS))
}

/// The children container of a rendered node, when it has reports.
pub fn children_of(doc: &Document, container: ElementId) -> Option<ElementId> {
    doc.children(container)
        .into_iter()
        .find(|id| doc.has_class(*id, CHILDREN_CLASS))
}

/// Child node containers of a rendered node, in order.
pub fn child_nodes(doc: &Document, container: ElementId) -> Vec<ElementId> {
    children_of(doc, container)
        .map(|list| doc.children(list))
        .unwrap_or_default()
}

pub fn is_collapsed(doc: &Document, container: ElementId) -> bool {
    doc.has_class(container, COLLAPSED_CLASS)
}

/// An element is hidden when it sits in the children list of a collapsed node.
pub fn is_hidden(doc: &Document, id: ElementId) -> bool {
    let mut current = doc.parent(id);
    let mut below = id;
    while let Some(at) = current {
        if doc.has_class(below, CHILDREN_CLASS) && is_collapsed(doc, at) {
            return true;
        }
        below = at;
        current = doc.parent(at);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::create_default_config;
    use crate::view::build_view;

    const ORG: &str = r#"[
        {"ID":1,"nom":"Root","emailcollaborateur":"r@x","StatutEntretien":{"Value":"Done"},"StatusEntretienManager":{"Value":"Pending"}},
        {"ID":2,"nom":"Left","emailcollaborateur":"l@x","emailresponsable":"r@x"},
        {"ID":3,"nom":"Right","emailcollaborateur":"g@x","emailresponsable":"R@X"},
        {"ID":4,"nom":"Leaf","emailcollaborateur":"f@x","emailresponsable":"l@x"}
    ]"#;

    fn rendered(raw: &str) -> (Document, Vec<ElementId>) {
        let mut doc = Document::new("div");
        let view = build_view(Some(raw)).unwrap();
        let root = doc.root();
        let roots = render_tree(&mut doc, root, &view, &create_default_config());
        (doc, roots)
    }

    /// `len` records, each reporting to the previous one.
    fn chain(len: usize) -> String {
        let rows: Vec<String> = (0..len)
            .map(|i| {
                let manager = match i {
                    0 => String::new(),
                    _ => format!("p{}@x", i - 1),
                };
                format!(
                    r#"{{"ID":{},"emailcollaborateur":"p{}@x","emailresponsable":"{}"}}"#,
                    i, i, manager
                )
            })
            .collect();
        format!("[{}]", rows.join(","))
    }

    #[test]
    fn test_structure_and_classes() {
        let (doc, roots) = rendered(ORG);
        assert_eq!(roots.len(), 1);
        assert_eq!(doc.find_by_class(NODE_CLASS).len(), 4);
        let kids = child_nodes(&doc, roots[0]);
        assert_eq!(kids.len(), 2);
        assert_eq!(
            doc.get(kids[1]).and_then(|e| e.attribute("data-id")),
            Some("3")
        );
        assert_eq!(child_nodes(&doc, kids[0]).len(), 1);
        assert!(children_of(&doc, kids[1]).is_none());
        let list = children_of(&doc, roots[0]).unwrap();
        assert_eq!(
            doc.get(list).unwrap().style,
            vec![("padding-left".to_string(), "50px".to_string())]
        );
    }

    #[test]
    fn test_label_precedes_children_list() {
        let (doc, roots) = rendered(ORG);
        let parts = doc.children(roots[0]);
        assert_eq!(parts.len(), 2);
        assert!(doc.has_class(parts[0], LABEL_CLASS));
        assert!(doc.has_class(parts[1], CHILDREN_CLASS));
    }

    #[test]
    fn test_label_text_and_status() {
        let (doc, roots) = rendered(ORG);
        let label = label_of(&doc, roots[0]).unwrap();
        assert_eq!(doc.text_content(label), "Root  ()Done|Pending");
        let leaf_label = label_of(&doc, child_nodes(&doc, roots[0])[1]).unwrap();
        assert_eq!(doc.text_content(leaf_label), "Right  ()|");
        assert!(!doc.text_content(doc.root()).contains("null"));
    }

    #[test]
    fn test_click_toggles_only_own_container() {
        let (mut doc, roots) = rendered(ORG);
        let kids = child_nodes(&doc, roots[0]);
        let left = kids[0];
        let leaf = child_nodes(&doc, left)[0];

        let label = label_of(&doc, left).unwrap();
        doc.click(label);
        assert!(is_collapsed(&doc, left));
        assert!(!is_collapsed(&doc, roots[0]));
        assert!(!is_collapsed(&doc, kids[1]));
        assert!(is_hidden(&doc, leaf));
        assert!(!is_hidden(&doc, kids[1]));
        assert!(!is_hidden(&doc, label));

        doc.click(label);
        assert!(!is_collapsed(&doc, left));
        assert!(!is_hidden(&doc, leaf));
    }

    #[test]
    fn test_click_on_title_span_bubbles() {
        let (mut doc, roots) = rendered(ORG);
        let label = label_of(&doc, roots[0]).unwrap();
        let title = doc.children(label)[0];
        assert_eq!(doc.click(title), 1);
        assert!(is_collapsed(&doc, roots[0]));
        for node in child_nodes(&doc, roots[0]) {
            assert!(is_hidden(&doc, node));
            assert!(!is_collapsed(&doc, node));
        }
    }

    #[test]
    fn test_prebuilt_label_has_no_status() {
        let (doc, roots) =
            rendered(r#"[{"id":"a","name":"Alpha","children":[{"id":"b","name":"Beta"}]}]"#);
        let label = label_of(&doc, roots[0]).unwrap();
        assert_eq!(doc.children(label).len(), 1);
        assert_eq!(doc.text_content(label), "Alpha");
        assert!(doc.find_by_class(STATUS_CLASS).is_empty());
    }

    #[test]
    fn test_long_chain_renders_on_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let (mut doc, roots) = rendered(&chain(20_000));
                let deepest = doc.find_by_class(NODE_CLASS)[19_999];
                let label = label_of(&doc, deepest).unwrap();
                doc.click(label);
                (roots.len(), is_collapsed(&doc, deepest), is_hidden(&doc, deepest))
            })
            .unwrap();
        assert_eq!(handle.join().unwrap(), (1, true, false));
    }
}
