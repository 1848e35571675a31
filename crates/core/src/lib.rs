pub mod content;
pub mod cursor;
pub mod error;

pub use content::{ContentNode, ContentSource, ContentType, FieldType, FieldValue};
pub use cursor::{NodeKind, TreeCursor, split_qualified};
pub use error::CursorError;
