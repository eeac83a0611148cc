//! # Primitives
//!
//! Fixed vocabulary shared by the compiler, the translator and the engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! The store attribute keywords follow the Datascript schema the external
//! store exposes (`:block/uid`, `:node/title`, ...).

// =============================================================================
// TYPE VOCABULARY
// =============================================================================

/// Type id of the wildcard node type. A relation endpoint with this type
/// accepts entities of any type.
pub const WILDCARD_TYPE: &str = "*";

/// Display label resolved for the wildcard type.
pub const WILDCARD_LABEL: &str = "Any";

/// Local subject placeholder that node type specifications are written against.
///
/// The Variable Scoping Pass rebinds it to whatever variable the enclosing
/// query chose for the candidate entity.
pub const SUBJECT_VARIABLE: &str = "node";

/// Placeholder a format template must contain exactly once.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

/// Role name bound to the relation's source endpoint inside triple templates.
pub const SOURCE_ROLE: &str = "source";

/// Role name bound to the relation's destination endpoint inside triple templates.
pub const DESTINATION_ROLE: &str = "destination";

// =============================================================================
// TRIPLE PREDICATES
// =============================================================================

pub const PREDICATE_IS_A: &str = "is a";
pub const PREDICATE_REFERENCES: &str = "references";
pub const PREDICATE_IS_REFERENCED_BY: &str = "is referenced by";
pub const PREDICATE_IS_IN_PAGE: &str = "is in page";
pub const PREDICATE_HAS_TITLE: &str = "has title";
pub const PREDICATE_WITH_TEXT: &str = "with text";
pub const PREDICATE_HAS_CHILD: &str = "has child";
pub const PREDICATE_HAS_PARENT: &str = "has parent";
pub const PREDICATE_HAS_ANCESTOR: &str = "has ancestor";
pub const PREDICATE_HAS_DESCENDANT: &str = "has descendant";

// =============================================================================
// STORE ATTRIBUTES
// =============================================================================

pub const ATTR_UID: &str = ":block/uid";
pub const ATTR_TITLE: &str = ":node/title";
pub const ATTR_STRING: &str = ":block/string";
pub const ATTR_REFS: &str = ":block/refs";
pub const ATTR_PAGE: &str = ":block/page";
pub const ATTR_CHILDREN: &str = ":block/children";
pub const ATTR_PARENTS: &str = ":block/parents";

/// Substring predicate used by `with text`.
pub const FN_INCLUDES: &str = "clojure.string/includes?";

/// Equality predicate.
pub const FN_EQUALS: &str = "=";
