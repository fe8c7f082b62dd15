//! Shared utility functions.
//!
//! - `html`: HTML escaping and allow-list sanitizing for email bodies

mod html;

pub use html::{html_escape, sanitize_html};
