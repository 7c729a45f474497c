//! Field extractors (C5): one module per derived project field, each
//! operating on the parsed XML tree and (where relevant) the document's
//! version gate.
//!
//! Every extractor is independently fallible. A missing or malformed field
//! is an [`ExtractionError`](crate::error::ExtractionError) that the
//! reconciler logs and recovers from by leaving the field absent, rather
//! than aborting the whole pass — see `src/reconcile.rs`.

pub mod duration;
pub mod furthest_bar;
pub mod key;
pub mod plugins;
pub mod samples;
pub mod tempo;
pub mod time_signature;
