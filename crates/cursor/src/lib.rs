//! Stateful navigation cursors presenting non-XML data sources as virtual,
//! read-only trees.
//!
//! Two cursor kinds satisfy the same [`TreeCursor`](contentnav_core::TreeCursor)
//! contract: [`ContentCursor`] walks a typed content tree (attributes,
//! property elements, embedded fragments, real children) under a depth
//! limit, and [`MacroCursor`] walks a flat bag of named macro parameters.
//! [`RenamedRootCursor`] re-views either one under a different synthetic
//! root label, and [`fragment`] provides the in-memory tree backing
//! embedded sub-tree values.

pub mod cache;
pub mod content;
pub mod fragment;
pub mod macros;
pub mod rename;
pub mod testing;

pub use cache::NodeCache;
pub use content::ContentCursor;
pub use fragment::{FragmentCursor, FragmentNode};
pub use macros::{MacroCursor, MacroParameter};
pub use rename::RenamedRootCursor;
