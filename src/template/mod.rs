//! Notification template system.
//!
//! This module provides:
//! - Template definition with `{{path}}` placeholders in subject and body
//! - Placeholder rendering against a JSON context, with dotted-path lookup
//!
//! Templates are persisted by the storage layer; this module only defines
//! their shape and how they render.
//!
//! # Example
//!
//! ```ignore
//! let template = Template::new(
//!     "welcome",
//!     Channel::Email,
//!     "Welcome {{name}}!",
//!     "Hello {{user.name}}, your code is {{code}}.",
//! );
//!
//! let rendered = template.render(&json!({
//!     "name": "Alice",
//!     "user": { "name": "Alice" },
//!     "code": "XYZ"
//! }));
//! ```

mod substitution;
mod types;

pub use substitution::render;
pub use types::{RenderedTemplate, Template};
