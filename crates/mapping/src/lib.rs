//! Controller mapping engine for deckbridge.
//!
//! Translates Mixxx-style controller mappings into device-independent
//! actions. A mapping consists of an XML document declaring byte-pattern
//! bindings, plus an optional legacy JavaScript file whose handlers
//! compute actions themselves.
//!
//! The pieces, in dependency order:
//!
//! - [`document`]: the immutable parsed mapping (bindings + metadata)
//! - [`rules`]: the built-in declarative translation table
//! - [`script`]: the sandboxed bridge to legacy mapping scripts
//! - [`dispatcher`]: ties the three together, one wire message at a time

pub use dispatcher::{DispatchError, Dispatcher, LoadError};
pub use document::{ControlBinding, MappingDocument, MappingInfo, OutputBinding, ParseError};
pub use script::{ScriptBridge, ScriptError};

pub mod dispatcher;
pub mod document;
pub mod rules;
pub mod script;
