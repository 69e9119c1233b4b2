//! Output styling for text results.

use std::fmt::Display;

use owo_colors::{OwoColorize, Style};

/// Styles for output text.
pub struct Styles;

impl Styles {
    pub fn label() -> Style {
        Style::new().cyan().bold()
    }

    pub fn value() -> Style {
        Style::new().green()
    }

    pub fn dim() -> Style {
        Style::new().dimmed()
    }
}

/// Format a value with label styling.
pub fn label<T: Display>(value: T) -> String {
    value.style(Styles::label()).to_string()
}

/// Format a value with value styling.
pub fn value<T: Display>(v: T) -> String {
    v.style(Styles::value()).to_string()
}

/// Format a value with dim styling.
pub fn dim<T: Display>(v: T) -> String {
    v.style(Styles::dim()).to_string()
}
