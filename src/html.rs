//! Serialize a [`Document`] to an HTML fragment for browser hosts.
//!
//! Click handlers become `data-toggle`/`data-target` attributes and one
//! delegated listener script, scoped to the fragment's root `id`.

use crate::dom::{Document, ElementId, Handler, Visit};
use crate::render::{CHILDREN_CLASS, COLLAPSED_CLASS};
use std::collections::HashSet;
use std::fmt::Write as _;

pub fn to_html(doc: &Document) -> String {
    let root_id = doc
        .get(doc.root())
        .and_then(|e| e.attribute("id"))
        .unwrap_or("hierarchy-tree")
        .to_string();

    let targets: HashSet<ElementId> = handler_targets(doc);
    let mut out = String::new();
    for visit in doc.traverse() {
        match visit {
            Visit::Open(id) => open_element(doc, id, &root_id, &targets, &mut out),
            Visit::Close(id) => {
                if let Some(element) = doc.get(id) {
                    let _ = write!(out, "</{}>", element.tag);
                }
            }
        }
    }

    if !targets.is_empty() {
        let selector = css_id(&root_id);
        let _ = write!(
            out,
            "<style>{selector} .{COLLAPSED_CLASS} > .{CHILDREN_CLASS} {{ display: none; }}</style>"
        );
        let _ = write!(
            out,
            "<script>(function(){{var r=document.getElementById({id});if(!r)return;\
r.addEventListener('click',function(e){{var l=e.target.closest('[data-toggle]');\
if(!l||!r.contains(l))return;var t=document.getElementById(l.dataset.target);\
if(t)t.classList.toggle(l.dataset.toggle);}});}})();</script>",
            id = js_string(&root_id)
        );
    }
    out
}

fn handler_targets(doc: &Document) -> HashSet<ElementId> {
    doc.descendants()
        .filter_map(|id| match doc.get(id).and_then(|e| e.on_click.as_ref()) {
            Some(Handler::ToggleClass { target, .. }) => Some(*target),
            None => None,
        })
        .collect()
}

fn element_id(root_id: &str, id: ElementId) -> String {
    format!("{}-{}", root_id, id.index())
}

/// Start tag plus the element's own text; children follow from the walk.
fn open_element(
    doc: &Document,
    id: ElementId,
    root_id: &str,
    targets: &HashSet<ElementId>,
    out: &mut String,
) {
    let Some(element) = doc.get(id) else {
        return;
    };

    out.push('<');
    out.push_str(element.tag);
    if id != doc.root() && targets.contains(&id) {
        push_attr(out, "id", &element_id(root_id, id));
    }
    for (name, value) in &element.attributes {
        push_attr(out, name, value);
    }
    if !element.classes.is_empty() {
        push_attr(out, "class", &element.classes.join(" "));
    }
    if !element.style.is_empty() {
        let style: Vec<String> = element
            .style
            .iter()
            .map(|(property, value)| format!("{}: {}", property, value))
            .collect();
        push_attr(out, "style", &style.join("; "));
    }
    if let Some(Handler::ToggleClass { target, class }) = &element.on_click {
        let target_id = if *target == doc.root() {
            root_id.to_string()
        } else {
            element_id(root_id, *target)
        };
        push_attr(out, "data-toggle", class);
        push_attr(out, "data-target", &target_id);
    }
    out.push('>');

    if let Some(text) = &element.text {
        out.push_str(&escape(text));
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {}=\"{}\"", name, escape(value));
}

/// Escape text for element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON string literal, with `<` escaped so it cannot close the script tag.
fn js_string(text: &str) -> String {
    serde_json::to_string(text)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
}

fn css_id(id: &str) -> String {
    let escaped: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    format!("#{}", escaped)
}
