//! Record schemas and the field binding algorithm.
//!
//! A record is an ordered list of fields plus a constructor. Binding visits
//! every field even after a failure, so one call reports every missing,
//! malformed and unrecognised argument at once. The constructor only runs
//! when nothing went wrong.
//!
//! # Examples
//!
//! ```
//! use argbind_core::{FieldDef, RecordBuilder, Schema, parsers};
//!
//! #[derive(Debug, PartialEq)]
//! struct Transfer {
//!     input: String,
//!     output: String,
//! }
//!
//! let mut fields = RecordBuilder::new();
//! let input = fields.add(FieldDef::new("input", parsers::text()));
//! let output = fields.add(
//!     FieldDef::new("output", parsers::text()).default_value("/dev/null".to_string()),
//! );
//! let schema = fields
//!     .build(move |v| Ok(Transfer { input: v.take(input)?, output: v.take(output)? }))
//!     .unwrap();
//!
//! let args: Vec<String> = vec!["--input".into(), "x".into()];
//! let transfer = schema.bind(&args).unwrap();
//! assert_eq!(transfer, Transfer { input: "x".into(), output: "/dev/null".into() });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::{ParseError, ParseErrors, SchemaError, SchemaResult};
use crate::schema::{AnyValue, Field, FieldDef, FieldSpec, FieldValues, Schema};
use crate::tokenize::{ArgMap, tokenize};
use crate::usage;

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

type ConstructFn<T> = dyn Fn(&mut FieldValues<'_>) -> Result<T, ParseError> + Send + Sync;

/// Collects field declarations for a [`RecordSchema`].
///
/// Each [`add`](RecordBuilder::add) returns a [`Field`] handle that the
/// constructor passed to [`build`](RecordBuilder::build) uses to take the
/// bound value with its declared type.
pub struct RecordBuilder {
    id: u64,
    fields: Vec<FieldSpec>,
    error: Option<SchemaError>,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self {
            id: NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed),
            fields: Vec::new(),
            error: None,
        }
    }

    /// Appends a field and returns its handle.
    ///
    /// Declaration problems (empty identifier, two identifiers with the same
    /// flag spelling) are remembered and reported by `build`.
    pub fn add<V: 'static>(&mut self, def: FieldDef<V>) -> Field<V> {
        let spec = def.into_spec();
        if self.error.is_none() {
            self.error = self.check(&spec);
        }

        let index = self.fields.len();
        self.fields.push(spec);
        Field::new(self.id, index)
    }

    fn check(&self, spec: &FieldSpec) -> Option<SchemaError> {
        if spec.identifier().trim().is_empty() {
            return Some(SchemaError::EmptyIdentifier);
        }
        self.fields
            .iter()
            .find(|existing| existing.flag() == spec.flag())
            .map(|existing| SchemaError::DuplicateField {
                first: existing.identifier().to_string(),
                second: spec.identifier().to_string(),
                flag: spec.flag().to_string(),
            })
    }

    /// Finishes the schema with a constructor that assembles the output value.
    ///
    /// # Errors
    ///
    /// Returns the first declaration problem recorded by [`add`](Self::add).
    pub fn build<T, F>(self, construct: F) -> SchemaResult<RecordSchema<T>>
    where
        F: Fn(&mut FieldValues<'_>) -> Result<T, ParseError> + Send + Sync + 'static,
    {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(RecordSchema {
            id: self.id,
            fields: self.fields,
            construct: Arc::new(construct),
        })
    }
}

/// An ordered field list and the constructor for the bound value.
pub struct RecordSchema<T> {
    id: u64,
    fields: Vec<FieldSpec>,
    construct: Arc<ConstructFn<T>>,
}

impl<T> Clone for RecordSchema<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fields: self.fields.clone(),
            construct: Arc::clone(&self.construct),
        }
    }
}

impl<T> fmt::Debug for RecordSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T> RecordSchema<T> {
    /// Declared fields, in schema order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field by identifier.
    pub fn field(&self, identifier: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.identifier() == identifier)
    }

    /// Binds an already tokenized argument map.
    ///
    /// Every field is attempted. Consumed entries are removed from `args`;
    /// anything left over is reported as unrecognised. Any error discards
    /// all bound values.
    pub fn bind_map(&self, mut args: ArgMap) -> Result<T, ParseErrors> {
        let mut errors = Vec::new();
        let mut values: Vec<AnyValue> = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            match args.take(field.flag()) {
                Some(raw) => match field.convert(&raw) {
                    Ok(value) => values.push(value),
                    Err(message) => errors.push(ParseError::FieldConversionFailure {
                        field: field.identifier().to_string(),
                        message,
                    }),
                },
                None => match field.default_value() {
                    Some(value) => values.push(value),
                    None => errors.push(ParseError::MissingRequiredField {
                        field: field.identifier().to_string(),
                    }),
                },
            }
        }

        if !args.is_empty() {
            errors.push(ParseError::UnrecognizedArguments {
                flags: args.flags().map(str::to_string).collect(),
            });
        }

        if !errors.is_empty() {
            debug!(errors = errors.len(), "Record binding failed");
            return Err(ParseErrors::new(errors));
        }

        let mut values = FieldValues::new(self.id, &self.fields, values);
        (self.construct)(&mut values).map_err(ParseErrors::from)
    }

    /// Flag spelling of every field, keyed by identifier.
    pub fn flags(&self) -> HashMap<&str, &str> {
        self.fields
            .iter()
            .map(|f| (f.identifier(), f.flag()))
            .collect()
    }
}

impl<T> Schema<T> for RecordSchema<T> {
    fn bind(&self, args: &[String]) -> Result<T, ParseErrors> {
        let map = tokenize(args)?;
        self.bind_map(map)
    }

    fn render_usage(&self, out: &mut String, depth: usize) {
        usage::render_record(&self.fields, out, depth);
    }
}
