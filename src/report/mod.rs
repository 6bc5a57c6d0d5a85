//! Presentation of analysis and comparison results: text and JSON.

pub mod json;
pub mod text;
