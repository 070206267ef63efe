//! # Waypost Router
//!
//! The routing core shared by the `waypost` generator and the runtime that
//! serves requests from the generated registrations:
//! - Directory-segment translation (`users/[id]` → `/users/{id}`)
//! - Route groups that scope middleware without touching the URL (`(admin)`)
//! - Catch-all and optional catch-all segments (`[...slug]`, `[[...slug]]`)
//! - A priority-ordered route tree with scope-based middleware inheritance
//! - A proxy matcher compiled from a compact pattern language (`/api/:path*`)
//!
//! ## Example
//!
//! ```
//! use waypost_router::{translate_path, Method, RouteRecord, RouteTree};
//!
//! let mut tree = RouteTree::new();
//! let users = translate_path("users/[id]");
//! tree.insert_route(RouteRecord::new(Method::Get, &users, "app/users/[id]/route.rs", "get"));
//!
//! let m = tree.match_request(Method::Get, "/users/42").unwrap();
//! assert_eq!(m.params.get("id"), Some(&"42".to_string()));
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod matcher;
pub mod path;
pub mod record;
pub mod segment;
pub mod tree;

pub use matcher::{compile_pattern, translate_pattern, CompiledMatcher, PatternError};
pub use path::{is_valid_path, normalize_path, ScopeHierarchy};
pub use record::{
    LayoutRecord, Method, MiddlewareRecord, PageParam, PageRecord, ProxyDescriptor, RouteRecord,
};
pub use segment::{
    classify_segment, priority_for, segment_ident, translate_path, translate_segments, Segment,
    Translation, PRIORITY_DYNAMIC, PRIORITY_STATIC, PRIORITY_WILDCARD,
};
pub use tree::{RouteMatch, RouteTree};
