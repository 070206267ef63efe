//! # Waypost Codegen
//!
//! Turns scan results into the generated registration module:
//! - [`conflict`] settles page/route GET conflicts and checks page parameters
//! - [`sanitize`] gives illegal directory names legal import aliases
//! - [`generator`] renders and writes the module
//! - [`pipeline`] runs everything in order
//!
//! ```no_run
//! use waypost_codegen::pipeline::{run, Options};
//!
//! let generation = run(&Options::default()).unwrap();
//! for diagnostic in generation.analysis.diagnostics() {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

pub mod alias;
pub mod conflict;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod sanitize;

pub use alias::AliasAllocator;
pub use conflict::{check_params, resolve, Resolved};
pub use error::{GenerateError, Result};
pub use generator::{plan_write, write_output, Generator, PageCall, WriteOutcome, GENERATED_HEADER};
pub use pipeline::{build_tree, check, run, Analysis, Generation, Options};
pub use sanitize::{ImportMapping, ImportPlan, ImportSanitizer, StagingReport};
