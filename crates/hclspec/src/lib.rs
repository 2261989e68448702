//! # hclspec - ordered schema decoding for HCL and JSON
//!
//! ## Introduction for developers
//!
//! Read this to understand how `hclspec` works internally.
//!
//! ### Terms
//!
//! In hcl terms...
//! - a file gets parsed as a `body`
//! - ...which is just a list of `attributes` (`key = value`) and `blocks` (`type "label" { body }`)
//! - JSON files are bodies too: a root object whose properties become attributes or blocks, depending on what the
//!   reader asks for
//!
//! A configuration format is split into root level **block definitions** ([definition]). Each one declares a
//! [grammar::Grammar] describing the part of the root body it owns. A definition may also inject variables and/or
//! functions for every definition decoded after it.
//!
//! ```hcl
//! variables {
//!   region = "eu-west-1"
//! }
//!
//! service "api" {
//!   bucket = "api-${var.region}"
//! }
//! ```
//!
//! Here `variables` has to be decoded before `service`, otherwise `var.region` is unknown.
//!
//! ### Loading files
//!
//! [documents::Documents] parses each file ([syntax]) into a [body::Body] and keeps its source text. All files are
//! merged into one body; attributes and blocks of different files share the same root scope.
//! Problems never abort loading: every file is attempted and every problem is a [diagnostic::Diagnostic].
//!
//! ### Ordered decoding
//!
//! see [registrar::Registrar::parse]
//!
//! Registrations are sorted by order. Each pass partially decodes what is left of the body ([decode::partial_decode]),
//! keeps the diagnostics, continues with the residual body and then merges injected functions and variables into
//! the [eval::EvalContext]. There is no dependency resolution: order is everything.
//!
//! ### Typed result
//!
//! After all passes the merged body can be deserialized into any [serde] type using the final context
//! ([decode::decode_into]).
//!
//! ### Output
//!
//! [schema::Schema] ties it together and returns a [report::Report] for every operation. A report can render its
//! diagnostics with code snippets.
pub mod blocks;
pub mod body;
pub mod decode;
pub mod definition;
pub mod diagnostic;
pub mod documents;
pub mod eval;
pub mod grammar;
pub mod registrar;
pub mod report;
pub mod schema;
pub mod syntax;
mod util;
pub mod value;
mod visit;

pub use visit::{Visit, VisitTraversals};
