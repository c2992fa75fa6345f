//! Schema-driven binding of `--flag value` argument vectors to typed values.
//!
//! A schema describes an output shape once; every call to [`parse`] then
//! turns an argument vector into that shape or into the complete list of
//! problems with it. Flag names, required/optional status and command
//! dispatch all come from the schema:
//!
//! - [`RecordSchema`]: ordered fields bound from `--flag value` pairs,
//!   with defaults and exhaustive error reporting.
//! - [`VariantSchema`]: named alternatives selected by the first token,
//!   nestable to any depth.
//! - [`FieldParser`] / [`ParserRegistry`]: pluggable string → value
//!   converters.
//! - [`to_flag_name`]: the `inputPath` → `--input-path` convention shared by
//!   parsing and [`usage`] text.
//! - [`SchemaDocument`]: JSON/YAML declarations compiled to schemas that
//!   bind to [`serde_json::Value`].
//!
//! # Example
//!
//! ```
//! use argbind_core::*;
//!
//! #[derive(Debug, PartialEq)]
//! enum Command {
//!     One { input: String, output: String, mode: String },
//!     Two { input: String, throughput: i64 },
//! }
//!
//! let mut one = RecordBuilder::new();
//! let input = one.add(FieldDef::new("input", parsers::text()));
//! let output = one.add(FieldDef::new("output", parsers::text()));
//! let mode = one.add(FieldDef::new("mode", parsers::text()));
//! let one = one
//!     .build(move |v| Ok(Command::One { input: v.take(input)?, output: v.take(output)?, mode: v.take(mode)? }))
//!     .unwrap();
//!
//! let mut two = RecordBuilder::new();
//! let input = two.add(FieldDef::new("input", parsers::text()));
//! let throughput = two.add(FieldDef::new("throughput", parsers::long()).default_value(100));
//! let two = two
//!     .build(move |v| Ok(Command::Two { input: v.take(input)?, throughput: v.take(throughput)? }))
//!     .unwrap();
//!
//! let commands = VariantBuilder::new()
//!     .variant("CommandOne", one, |c: Command| c)
//!     .variant("CommandTwo", two, |c: Command| c)
//!     .build()
//!     .unwrap();
//!
//! let bound = parse(&commands, &["CommandTwo", "--input", "i"]).unwrap();
//! assert_eq!(bound, Command::Two { input: "i".into(), throughput: 100 });
//!
//! let errors = parse(&commands, &["CommandOne", "--input", "i"]).unwrap_err();
//! assert_eq!(errors.len(), 2);
//! assert!(usage(&commands).contains("--throughput : optional, defaults to 100"));
//! ```

mod document;
mod error;
mod naming;
pub mod parsers;
mod record;
mod schema;
mod tokenize;
mod usage;
mod variant;

use std::io::Write;

use tracing::warn;

pub use document::{
    CommandDocument, DocumentError, FieldDocument, FieldKind, SchemaDocument, validate_document,
};
pub use error::{ParseError, ParseErrors, SchemaError, SchemaResult};
pub use naming::{FLAG_PREFIX, is_flag, to_flag_name};
pub use parsers::{FieldParser, ParserRegistry};
pub use record::{RecordBuilder, RecordSchema};
pub use schema::{Field, FieldDef, FieldSpec, FieldValues, Schema};
pub use tokenize::{ArgMap, tokenize};
pub use usage::{COMMAND_HEADER, field_line};
pub use variant::{VariantBuilder, VariantSchema};

/// Binds `args` against `schema`.
///
/// Never panics; every problem found is returned in the error list.
pub fn parse<T, S, A>(schema: &S, args: &[A]) -> Result<T, ParseErrors>
where
    S: Schema<T> + ?Sized,
    A: AsRef<str>,
{
    let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
    schema.bind(&args)
}

/// Binds `args`, writing the usage text to `sink` when binding fails.
///
/// The returned error's `Display` is every message joined by newlines. A
/// failure to write the usage text is logged and otherwise ignored.
pub fn parse_or_report<T, S, A, W>(schema: &S, args: &[A], sink: &mut W) -> Result<T, ParseErrors>
where
    S: Schema<T> + ?Sized,
    A: AsRef<str>,
    W: Write + ?Sized,
{
    parse(schema, args).inspect_err(|_| {
        if let Err(err) = sink.write_all(schema.usage().as_bytes()) {
            warn!(error = %err, "Failed to write usage text");
        }
    })
}

/// Usage text for `schema`. Pure; calling it twice yields the same text.
pub fn usage<T, S>(schema: &S) -> String
where
    S: Schema<T> + ?Sized,
{
    schema.usage()
}
