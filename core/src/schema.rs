//! Field declarations and the [`Schema`] trait shared by records and variants.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ParseError, ParseErrors};
use crate::naming::to_flag_name;
use crate::parsers::{self, FieldParser};

/// A declared output shape that argument vectors can be bound to.
///
/// Implemented by [`RecordSchema`](crate::RecordSchema),
/// [`VariantSchema`](crate::VariantSchema) and the alternatives stored
/// inside a variant schema. Implementations are immutable and may be shared
/// across threads and reused for any number of calls.
pub trait Schema<T>: Send + Sync {
    /// Binds `args` to a value, reporting every problem found.
    fn bind(&self, args: &[String]) -> Result<T, ParseErrors>;

    /// Appends usage text to `out`, indented by `depth` levels.
    fn render_usage(&self, out: &mut String, depth: usize);

    /// Complete usage text.
    fn usage(&self) -> String {
        let mut out = String::new();
        self.render_usage(&mut out, 0);
        out
    }
}

impl<T, S: Schema<T> + ?Sized> Schema<T> for Box<S> {
    fn bind(&self, args: &[String]) -> Result<T, ParseErrors> {
        (**self).bind(args)
    }

    fn render_usage(&self, out: &mut String, depth: usize) {
        (**self).render_usage(out, depth)
    }
}

impl<T, S: Schema<T> + ?Sized> Schema<T> for Arc<S> {
    fn bind(&self, args: &[String]) -> Result<T, ParseErrors> {
        (**self).bind(args)
    }

    fn render_usage(&self, out: &mut String, depth: usize) {
        (**self).render_usage(out, depth)
    }
}

pub(crate) type AnyValue = Box<dyn Any>;
type ConvertFn = dyn Fn(&str) -> Result<AnyValue, String> + Send + Sync;
type ProduceFn = dyn Fn() -> AnyValue + Send + Sync;

/// Declaration of one field: identifier, converter, optional default and help.
///
/// ```
/// use argbind_core::{FieldDef, parsers};
///
/// let output = FieldDef::new("output", parsers::text())
///     .default_value("/dev/null".to_string())
///     .hint("Where results are written");
/// assert_eq!(output.identifier(), "output");
/// ```
pub struct FieldDef<V> {
    identifier: String,
    parser: FieldParser<V>,
    default: Option<(Arc<dyn Fn() -> V + Send + Sync>, String)>,
    hint: Option<String>,
}

impl<V: 'static> FieldDef<V> {
    /// A required field.
    pub fn new(identifier: impl Into<String>, parser: FieldParser<V>) -> Self {
        Self {
            identifier: identifier.into(),
            parser,
            default: None,
            hint: None,
        }
    }

    /// Adds help text shown in usage output.
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Value used when the flag is absent, rendered with `Display`.
    pub fn default_value(self, value: V) -> Self
    where
        V: Clone + fmt::Display + Send + Sync,
    {
        let rendered = value.to_string();
        self.default_shown_as(value, rendered)
    }

    /// Value used when the flag is absent, with explicit usage rendering.
    pub fn default_shown_as(mut self, value: V, rendering: impl Into<String>) -> Self
    where
        V: Clone + Send + Sync,
    {
        let produce: Arc<dyn Fn() -> V + Send + Sync> = Arc::new(move || value.clone());
        self.default = Some((produce, rendering.into()));
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn into_spec(self) -> FieldSpec {
        let parser = self.parser;
        let convert: Arc<ConvertFn> =
            Arc::new(move |raw: &str| parser.parse(raw).map(|value| Box::new(value) as AnyValue));
        let default = self.default.map(|(produce, rendered)| DefaultSpec {
            produce: Arc::new(move || Box::new(produce()) as AnyValue),
            rendered,
        });

        FieldSpec {
            flag: to_flag_name(&self.identifier),
            identifier: self.identifier,
            convert,
            default,
            hint: self.hint,
        }
    }
}

impl<V: 'static> FieldDef<Option<V>> {
    /// A field that binds to `None` when absent.
    ///
    /// The converter is wrapped with [`parsers::optional`], so a value it
    /// rejects also binds to `None`.
    pub fn optional(identifier: impl Into<String>, parser: FieldParser<V>) -> Self {
        let absent: Arc<dyn Fn() -> Option<V> + Send + Sync> = Arc::new(|| None);
        let mut def = Self::new(identifier, parsers::optional(parser));
        def.default = Some((absent, "none".to_string()));
        def
    }
}

impl<V> fmt::Debug for FieldDef<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("identifier", &self.identifier)
            .field("default", &self.default.as_ref().map(|(_, shown)| shown))
            .field("hint", &self.hint)
            .finish()
    }
}

#[derive(Clone)]
struct DefaultSpec {
    produce: Arc<ProduceFn>,
    rendered: String,
}

/// A field as stored in a built schema, with its value type erased.
#[derive(Clone)]
pub struct FieldSpec {
    identifier: String,
    flag: String,
    convert: Arc<ConvertFn>,
    default: Option<DefaultSpec>,
    hint: Option<String>,
}

impl FieldSpec {
    /// Declared identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// External `--kebab-case` spelling.
    pub fn flag(&self) -> &str {
        &self.flag
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Usage rendering of the default, if one is declared.
    pub fn default_rendering(&self) -> Option<&str> {
        self.default.as_ref().map(|d| d.rendered.as_str())
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub(crate) fn convert(&self, raw: &str) -> Result<AnyValue, String> {
        (self.convert)(raw)
    }

    pub(crate) fn default_value(&self) -> Option<AnyValue> {
        self.default.as_ref().map(|d| (d.produce)())
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("identifier", &self.identifier)
            .field("flag", &self.flag)
            .field("default", &self.default_rendering())
            .field("hint", &self.hint)
            .finish()
    }
}

/// Typed handle to a declared field, used by record constructors.
pub struct Field<V> {
    pub(crate) schema: u64,
    pub(crate) index: usize,
    _value: PhantomData<fn() -> V>,
}

impl<V> Field<V> {
    pub(crate) fn new(schema: u64, index: usize) -> Self {
        Self {
            schema,
            index,
            _value: PhantomData,
        }
    }
}

impl<V> Clone for Field<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Field<V> {}

impl<V> fmt::Debug for Field<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("schema", &self.schema)
            .field("index", &self.index)
            .finish()
    }
}

/// Bound values handed to a record constructor, in schema order.
pub struct FieldValues<'s> {
    schema: u64,
    fields: &'s [FieldSpec],
    slots: Vec<Option<AnyValue>>,
}

impl<'s> FieldValues<'s> {
    pub(crate) fn new(schema: u64, fields: &'s [FieldSpec], values: Vec<AnyValue>) -> Self {
        Self {
            schema,
            fields,
            slots: values.into_iter().map(Some).collect(),
        }
    }

    /// Moves the value of `field` out.
    ///
    /// Fails with [`ParseError::FieldUnavailable`] when the handle belongs to
    /// another schema or the value was already taken.
    pub fn take<V: 'static>(&mut self, field: Field<V>) -> Result<V, ParseError> {
        let fields = self.fields;
        let unavailable = || ParseError::FieldUnavailable {
            field: fields
                .get(field.index)
                .map(|spec| spec.identifier.clone())
                .unwrap_or_else(|| format!("#{}", field.index)),
        };
        if field.schema != self.schema {
            return Err(unavailable());
        }

        let value = self
            .slots
            .get_mut(field.index)
            .and_then(Option::take)
            .ok_or_else(unavailable)?;
        value
            .downcast::<V>()
            .map(|boxed| *boxed)
            .map_err(|_| unavailable())
    }

    /// Number of fields in the schema.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers;

    #[test]
    fn test_spec_carries_flag_and_default() {
        let spec = FieldDef::new("outputPath", parsers::text())
            .default_value("/dev/null".to_string())
            .hint("target")
            .into_spec();
        assert_eq!(spec.identifier(), "outputPath");
        assert_eq!(spec.flag(), "--output-path");
        assert_eq!(spec.default_rendering(), Some("/dev/null"));
        assert_eq!(spec.hint(), Some("target"));
        assert!(!spec.is_required());

        let value = spec.default_value().unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "/dev/null");
    }

    #[test]
    fn test_optional_field_defaults_to_none() {
        let spec = FieldDef::optional("limit", parsers::int()).into_spec();
        assert_eq!(spec.default_rendering(), Some("none"));
        let absent = spec.default_value().unwrap();
        assert_eq!(absent.downcast_ref::<Option<i32>>(), Some(&None));
        let present = spec.convert("3").unwrap();
        assert_eq!(present.downcast_ref::<Option<i32>>(), Some(&Some(3)));
    }

    #[test]
    fn test_take_checks_brand_and_type() {
        let fields = vec![FieldDef::new("age", parsers::int()).into_spec()];
        let own: Field<i32> = Field::new(7, 0);
        let foreign: Field<i32> = Field::new(8, 0);
        let wrong_type: Field<String> = Field::new(7, 0);

        let mut values = FieldValues::new(7, &fields, vec![Box::new(30_i32)]);
        assert!(matches!(
            values.take(foreign),
            Err(ParseError::FieldUnavailable { field }) if field == "age"
        ));
        assert!(values.take(wrong_type).is_err());

        let mut values = FieldValues::new(7, &fields, vec![Box::new(30_i32)]);
        assert_eq!(values.take(own), Ok(30));
        assert!(values.take(own).is_err());
    }
}
