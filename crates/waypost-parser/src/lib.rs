//! # Waypost Parser
//!
//! Static discovery of the files an application drops into its `app/`
//! directory. Nothing discovered here is ever executed:
//! - `route.rs`, `middleware.rs` and `proxy.rs` are parsed with `syn` and
//!   their public entry points validated by signature only
//! - `page.rs` and `layout.rs` are read with a lightweight text scan, since
//!   their bodies are usually template macros
//!
//! Invalid declarations are skipped and reported as [`Diagnostic`]s; a file
//! that does not parse at all aborts the scan with a [`ScanError`].

pub mod diagnostic;
pub mod scanner;
pub mod signature;
pub mod template;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use scanner::{scan, FileKind, ScanError, ScanResult, Scanner, STAGING_MANIFEST};
pub use signature::{
    check_handler, check_middleware, check_proxy, is_handler, is_middleware, is_proxy,
    SignatureMismatch,
};
