// This module is the hub for the arch configuration core: the canonical ArchSpec/ArchValue
// types, the parser that validates raw arch arguments, the scope stack that holds the active
// configuration, and the error types shared by the rest of the crate. Nothing in here touches
// the external toolchain; the nvcc module builds on these types.

//! Core arch configuration infrastructure.
//!
//! # Key Components
//!
//! ## Specifications (`spec`)
//! - [`ArchSpec`]: unset, a single `-arch` value or a validated gencode list
//! - [`ArchValue`]: the external none/str/list shape
//!
//! ## Parsing (`parser`)
//! - Short-form expansion (`sm_75` to a `-gencode` pair)
//! - Directive marker validation for explicit lists
//!
//! ## Scoping (`scope`)
//! - LIFO stack of scopes with a permanent root
//! - `previous` tracking on every change

pub mod error;
pub mod parser;
pub mod scope;
pub mod spec;

pub use error::{ArchError, ArchResult};
pub use parser::ArchSpecParser;
pub use scope::{Scope, ScopeId, ScopeStack};
pub use spec::{ArchSpec, ArchValue, GencodeList, GENCODE_FLAG};
