// src/config/mod.rs
pub mod widget;

pub use widget::WidgetConfig;
