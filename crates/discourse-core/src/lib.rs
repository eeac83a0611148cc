//! # discourse-core
//!
//! The relation-query compiler for discourse graphs - THE COMPILER.
//!
//! Users declare node types (Claim, Evidence, Question...) and relations
//! between them as small pattern specifications. This crate turns those
//! declarations into text queries a Datalog-style store can run.
//!
//! ## Pipeline
//!
//! 1. `clause` - the closed pattern-query AST
//! 2. `scoping` - capture-avoiding variable renaming
//! 3. `translator` - node types and relation triple templates to clauses
//! 4. `compiler` / `query` - clauses to query source text
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO I/O, NO store access (pure Rust)
//! - Deterministic: identical declarations compile to identical text
//! - Unknown clause kinds are dropped, never fatal

// =============================================================================
// MODULES
// =============================================================================

pub mod clause;
pub mod compiler;
pub mod declarations;
pub mod format;
pub mod primitives;
pub mod query;
pub mod scoping;
pub mod translator;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    ClassificationMode, ContextGroup, DiscourseError, EntityId, NodeType, Recognition, Relation,
    ResultRow, Triple,
};

// =============================================================================
// RE-EXPORTS: Compiler
// =============================================================================

pub use clause::{Argument, Clause};
pub use compiler::{compile, compile_all};
pub use declarations::Declarations;
pub use format::FormatMatcher;
pub use query::{ContextQuery, Query, Subject, classification_query, context_query};
pub use scoping::{Alias, localize, rename};
pub use translator::{Projection, ProjectionRole, TranslateOptions, Translator};
