//! String → value converters for field types.
//!
//! A [`FieldParser`] turns one raw argument into a typed value or a
//! descriptive failure message. The free functions in this module are the
//! built-in converters; [`ParserRegistry`] maps value types to converters so
//! schemas can be declared by type alone.
//!
//! ```
//! use argbind_core::parsers;
//!
//! assert_eq!(parsers::int().parse("42"), Ok(42));
//! assert!(parsers::int().parse("forty-two").unwrap_err().contains("ParseIntError"));
//! assert_eq!(parsers::optional(parsers::int()).parse("nope"), Ok(None));
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::FieldDef;

type ParseFn<V> = dyn Fn(&str) -> Result<V, String> + Send + Sync;

/// Converter from a raw argument to a field value.
pub struct FieldParser<V> {
    parse: Arc<ParseFn<V>>,
}

impl<V> Clone for FieldParser<V> {
    fn clone(&self) -> Self {
        Self {
            parse: Arc::clone(&self.parse),
        }
    }
}

impl<V> fmt::Debug for FieldParser<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldParser")
            .field("value", &type_name::<V>())
            .finish()
    }
}

impl<V: 'static> FieldParser<V> {
    /// Wraps a function that already reports failures as text.
    pub fn new<F>(parse: F) -> Self
    where
        F: Fn(&str) -> Result<V, String> + Send + Sync + 'static,
    {
        Self {
            parse: Arc::new(parse),
        }
    }

    /// Wraps a conversion that fails with a typed error.
    ///
    /// The failure message is `"<ErrorType>: <description>"`, so the kind of
    /// fault (for instance `ParseIntError`) survives into the field error.
    pub fn fallible<F, E>(parse: F) -> Self
    where
        F: Fn(&str) -> Result<V, E> + Send + Sync + 'static,
        E: fmt::Display + 'static,
    {
        Self::new(move |raw| parse(raw).map_err(|err| describe_fault(&err)))
    }

    /// Converter backed by [`FromStr`].
    pub fn via_from_str() -> Self
    where
        V: FromStr,
        V::Err: fmt::Display + 'static,
    {
        Self::fallible(|raw: &str| raw.parse::<V>())
    }

    /// Runs the conversion.
    pub fn parse(&self, raw: &str) -> Result<V, String> {
        (self.parse)(raw)
    }

    /// Adapts the output of a successful conversion.
    pub fn map<U, F>(self, f: F) -> FieldParser<U>
    where
        U: 'static,
        F: Fn(V) -> U + Send + Sync + 'static,
    {
        FieldParser::new(move |raw| self.parse(raw).map(&f))
    }

    /// Adds a check that runs after a successful conversion.
    pub fn and_then<U, F>(self, f: F) -> FieldParser<U>
    where
        U: 'static,
        F: Fn(V) -> Result<U, String> + Send + Sync + 'static,
    {
        FieldParser::new(move |raw| self.parse(raw).and_then(&f))
    }
}

fn describe_fault<E: fmt::Display + 'static>(err: &E) -> String {
    let full = type_name::<E>();
    // Keep the last path segment of the outermost type, drop generics.
    let base = full.split('<').next().unwrap_or(full);
    let kind = base.rsplit("::").next().unwrap_or(base);
    format!("{kind}: {err}")
}

/// Identity converter.
pub fn text() -> FieldParser<String> {
    FieldParser::new(|raw| Ok(raw.to_string()))
}

/// 32-bit signed integer.
pub fn int() -> FieldParser<i32> {
    FieldParser::via_from_str()
}

/// 64-bit signed integer.
pub fn long() -> FieldParser<i64> {
    FieldParser::via_from_str()
}

/// 64-bit unsigned integer.
pub fn unsigned() -> FieldParser<u64> {
    FieldParser::via_from_str()
}

/// 64-bit float.
pub fn float() -> FieldParser<f64> {
    FieldParser::via_from_str()
}

/// `true`/`false`, also accepting `yes`/`no` and `1`/`0` (case-insensitive).
pub fn boolean() -> FieldParser<bool> {
    FieldParser::new(|raw| match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(format!(
            "expected one of true, false, yes, no, 1, 0 but got '{raw}'"
        )),
    })
}

/// Filesystem path, taken as-is.
pub fn path() -> FieldParser<PathBuf> {
    FieldParser::new(|raw| Ok(PathBuf::from(raw)))
}

/// Splits the raw value on `delimiter` and converts every trimmed item.
///
/// An empty raw value is an empty list. The first failing item is reported
/// with its zero-based position.
pub fn list<V: 'static>(item: FieldParser<V>, delimiter: &str) -> FieldParser<Vec<V>> {
    let delimiter = delimiter.to_string();
    FieldParser::new(move |raw| {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        raw.split(delimiter.as_str())
            .enumerate()
            .map(|(idx, part)| {
                item.parse(part.trim())
                    .map_err(|err| format!("item {idx} ('{}'): {err}", part.trim()))
            })
            .collect()
    })
}

/// Wraps `inner` so that conversion always succeeds.
///
/// A value `inner` accepts becomes `Some`; one it rejects becomes `None`.
/// Absence of the flag itself is handled by the field's default, see
/// [`FieldDef::optional`].
pub fn optional<V: 'static>(inner: FieldParser<V>) -> FieldParser<Option<V>> {
    FieldParser::new(move |raw| Ok(inner.parse(raw).ok()))
}

/// Converters looked up by value type when a schema is declared.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("len", &self.parsers.len())
            .finish()
    }
}

impl ParserRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in converters for `String`, `i32`,
    /// `i64`, `u64`, `f64`, `bool` and `PathBuf`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(text());
        registry.register(int());
        registry.register(long());
        registry.register(unsigned());
        registry.register(float());
        registry.register(boolean());
        registry.register(path());
        registry
    }

    /// Registers (or replaces) the converter for `V`.
    pub fn register<V: 'static>(&mut self, parser: FieldParser<V>) -> &mut Self {
        self.parsers.insert(TypeId::of::<V>(), Box::new(parser));
        self
    }

    /// Converter registered for `V`.
    pub fn get<V: 'static>(&self) -> Option<FieldParser<V>> {
        self.parsers
            .get(&TypeId::of::<V>())
            .and_then(|parser| parser.downcast_ref::<FieldParser<V>>())
            .cloned()
    }

    pub fn contains<V: 'static>(&self) -> bool {
        self.parsers.contains_key(&TypeId::of::<V>())
    }

    /// Declares a field of type `V` using the registered converter.
    pub fn field<V: 'static>(&self, identifier: &str) -> SchemaResult<FieldDef<V>> {
        let parser = self.get::<V>().ok_or_else(|| SchemaError::NoParser {
            field: identifier.to_string(),
            type_name: type_name::<V>().to_string(),
        })?;
        Ok(FieldDef::new(identifier, parser))
    }
}
