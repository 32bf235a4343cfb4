//! Host-facing control lifecycle.
//!
//! The embedding environment owns the lifecycle: it calls `init` once with
//! the container to draw into, `update_view` whenever inputs change, and
//! `destroy` when the control goes away. Each call redraws from scratch.

use crate::config::LocaleConfig;
use crate::dom::{Document, ElementId};
use crate::parser::ParseError;
use crate::render;
use crate::view;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the input parameter carrying the JSON payload.
pub const DATA_PARAMETER: &str = "data";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    pub raw: Option<String>,
}

/// Input values handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct Context {
    parameters: HashMap<String, Parameter>,
}

impl Context {
    pub fn with_data(raw: Option<String>) -> Self {
        let mut context = Self::default();
        context.set(DATA_PARAMETER, raw);
        context
    }

    pub fn set(&mut self, name: &str, raw: Option<String>) {
        self.parameters.insert(name.to_string(), Parameter { raw });
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn raw(&self, name: &str) -> Option<&str> {
        self.parameter(name).and_then(|p| p.raw.as_deref())
    }
}

/// Callback the control may use to tell the host its outputs changed.
pub type NotifyOutputChanged = Box<dyn Fn() + Send + Sync>;

/// Opaque per-session state the host persists for the control.
pub type Dictionary = HashMap<String, String>;

/// Values the control reports back. This control reports none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outputs {}

pub trait StandardControl {
    fn init(
        &mut self,
        context: &Context,
        notify_output_changed: NotifyOutputChanged,
        state: Dictionary,
        container: Document,
    );
    fn update_view(&mut self, context: &Context);
    fn get_outputs(&self) -> Outputs;
    fn destroy(&mut self);
}

/// What the last redraw put in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Tree { containers: Vec<ElementId> },
    Placeholder,
    Error(ParseError),
}

/// The collapsible manager/report tree control.
pub struct HierarchyTree {
    config: Arc<LocaleConfig>,
    container: Option<Document>,
    // Held for the host's sake; outputs never change.
    notify_output_changed: Option<NotifyOutputChanged>,
    last_outcome: Option<RenderOutcome>,
}

impl HierarchyTree {
    pub fn new(config: Arc<LocaleConfig>) -> Self {
        Self {
            config,
            container: None,
            notify_output_changed: None,
            last_outcome: None,
        }
    }

    pub fn container(&self) -> Option<&Document> {
        self.container.as_ref()
    }

    /// Mutable access for the host to dispatch clicks.
    pub fn container_mut(&mut self) -> Option<&mut Document> {
        self.container.as_mut()
    }

    pub fn last_outcome(&self) -> Option<&RenderOutcome> {
        self.last_outcome.as_ref()
    }

    fn render_tree(&mut self, context: &Context) {
        let Some(doc) = self.container.as_mut() else {
            debug!("update_view before init, nothing to draw into");
            return;
        };
        doc.reset();
        let root = doc.root();

        let outcome = match view::build_view(context.raw(DATA_PARAMETER)) {
            Ok(tree) => RenderOutcome::Tree {
                containers: render::render_tree(doc, root, &tree, &self.config),
            },
            Err(ParseError::NoData) => {
                doc.set_text(root, self.config.messages.no_data.as_str());
                RenderOutcome::Placeholder
            }
            Err(error) => {
                warn!("Rendering parse error in place: {}", error);
                doc.set_text(root, self.config.messages.describe(&error));
                RenderOutcome::Error(error)
            }
        };
        self.last_outcome = Some(outcome);
    }
}

impl StandardControl for HierarchyTree {
    fn init(
        &mut self,
        context: &Context,
        notify_output_changed: NotifyOutputChanged,
        _state: Dictionary,
        container: Document,
    ) {
        self.container = Some(container);
        self.notify_output_changed = Some(notify_output_changed);
        self.render_tree(context);
    }

    fn update_view(&mut self, context: &Context) {
        self.render_tree(context);
    }

    fn get_outputs(&self) -> Outputs {
        Outputs::default()
    }

    fn destroy(&mut self) {
        self.container = None;
        self.notify_output_changed = None;
        self.last_outcome = None;
    }
}
