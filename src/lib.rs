//! Hierarchy Tree - collapsible manager/report tree control.

pub mod config;
pub mod dom;
pub mod html;
pub mod linker;
pub mod parser;
pub mod render;
pub mod schema;
pub mod view;
pub mod widget;
