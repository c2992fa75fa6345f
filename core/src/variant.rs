//! One-of dispatch: the leading token selects which schema binds the rest.
//!
//! # Examples
//!
//! ```
//! use argbind_core::{FieldDef, RecordBuilder, Schema, VariantBuilder, parsers};
//!
//! #[derive(Debug, PartialEq)]
//! enum Command {
//!     Fetch(String),
//!     Purge(i64),
//! }
//!
//! let mut fetch = RecordBuilder::new();
//! let url = fetch.add(FieldDef::new("url", parsers::text()));
//! let fetch = fetch.build(move |v| v.take(url)).unwrap();
//!
//! let mut purge = RecordBuilder::new();
//! let days = purge.add(FieldDef::new("olderThanDays", parsers::long()));
//! let purge = purge.build(move |v| v.take(days)).unwrap();
//!
//! let commands = VariantBuilder::new()
//!     .variant("fetch", fetch, Command::Fetch)
//!     .variant("purge", purge, Command::Purge)
//!     .build()
//!     .unwrap();
//!
//! let args: Vec<String> = ["purge", "--older-than-days", "30"].map(String::from).to_vec();
//! assert_eq!(commands.bind(&args), Ok(Command::Purge(30)));
//! assert_eq!(commands.options(), vec!["fetch", "purge"]);
//! ```

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::error::{ParseError, ParseErrors, SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::usage;

/// Wraps a schema's output into the variant set's output type.
struct Injected<S, F, V> {
    inner: S,
    inject: F,
    _value: PhantomData<fn() -> V>,
}

impl<S, F, V, T> Schema<T> for Injected<S, F, V>
where
    S: Schema<V>,
    F: Fn(V) -> T + Send + Sync,
{
    fn bind(&self, args: &[String]) -> Result<T, ParseErrors> {
        self.inner.bind(args).map(&self.inject)
    }

    fn render_usage(&self, out: &mut String, depth: usize) {
        self.inner.render_usage(out, depth)
    }
}

struct Alternative<T> {
    name: String,
    schema: Box<dyn Schema<T>>,
}

/// Collects named alternatives for a [`VariantSchema`].
pub struct VariantBuilder<T> {
    alternatives: Vec<Alternative<T>>,
    error: Option<SchemaError>,
}

impl<T: 'static> Default for VariantBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> VariantBuilder<T> {
    pub fn new() -> Self {
        Self {
            alternatives: Vec::new(),
            error: None,
        }
    }

    /// Adds an alternative selected by the exact token `name`.
    ///
    /// `schema` may be a [`RecordSchema`](crate::RecordSchema) or another
    /// [`VariantSchema`] for nested dispatch; `inject` wraps its value.
    pub fn variant<V, S, F>(mut self, name: impl Into<String>, schema: S, inject: F) -> Self
    where
        V: 'static,
        S: Schema<V> + 'static,
        F: Fn(V) -> T + Send + Sync + 'static,
    {
        let name = name.into();
        if self.error.is_none() {
            if name.trim().is_empty() {
                self.error = Some(SchemaError::EmptyIdentifier);
            } else if self.alternatives.iter().any(|alt| alt.name == name) {
                self.error = Some(SchemaError::DuplicateVariant(name.clone()));
            }
        }

        self.alternatives.push(Alternative {
            name,
            schema: Box::new(Injected {
                inner: schema,
                inject,
                _value: PhantomData,
            }),
        });
        self
    }

    /// Finishes the variant set.
    ///
    /// # Errors
    ///
    /// [`SchemaError::EmptyVariantSet`] when no alternative was added, or the
    /// first naming problem recorded by [`variant`](Self::variant).
    pub fn build(self) -> SchemaResult<VariantSchema<T>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.alternatives.is_empty() {
            return Err(SchemaError::EmptyVariantSet);
        }
        Ok(VariantSchema {
            alternatives: self.alternatives,
        })
    }
}

/// Named alternatives, selected by the first argument.
pub struct VariantSchema<T> {
    alternatives: Vec<Alternative<T>>,
}

impl<T> fmt::Debug for VariantSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantSchema")
            .field("options", &self.options())
            .finish()
    }
}

impl<T> VariantSchema<T> {
    /// Declared variant names, in declaration order.
    pub fn options(&self) -> Vec<&str> {
        self.alternatives.iter().map(|alt| alt.name.as_str()).collect()
    }

    /// Schema bound when `name` is the leading token.
    pub fn alternative(&self, name: &str) -> Option<&dyn Schema<T>> {
        self.alternatives
            .iter()
            .find(|alt| alt.name == name)
            .map(|alt| alt.schema.as_ref())
    }

    fn owned_options(&self) -> Vec<String> {
        self.alternatives.iter().map(|alt| alt.name.clone()).collect()
    }
}

impl<T> Schema<T> for VariantSchema<T> {
    fn bind(&self, args: &[String]) -> Result<T, ParseErrors> {
        let Some((command, rest)) = args.split_first() else {
            return Err(ParseError::NoCommandSpecified {
                options: self.owned_options(),
            }
            .into());
        };

        let Some(schema) = self.alternative(command) else {
            debug!(command = %command, "Unknown command");
            return Err(ParseError::UnknownCommand {
                token: command.clone(),
                options: self.owned_options(),
            }
            .into());
        };

        debug!(command = %command, args = rest.len(), "Dispatching to variant");
        schema.bind(rest)
    }

    fn render_usage(&self, out: &mut String, depth: usize) {
        let entries: Vec<(&str, &dyn Schema<T>)> = self
            .alternatives
            .iter()
            .map(|alt| (alt.name.as_str(), alt.schema.as_ref()))
            .collect();
        usage::render_variant(&entries, out, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers;
    use crate::record::RecordBuilder;
    use crate::schema::FieldDef;

    #[derive(Debug, PartialEq)]
    enum Op {
        Add(i32),
        Remote(Remote),
    }

    #[derive(Debug, PartialEq)]
    enum Remote {
        Show(String),
        Prune,
    }

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn ops() -> VariantSchema<Op> {
        let mut add = RecordBuilder::new();
        let amount = add.add(FieldDef::new("amount", parsers::int()));
        let add = add.build(move |v| v.take(amount)).unwrap();

        let mut show = RecordBuilder::new();
        let name = show.add(FieldDef::new("name", parsers::text()));
        let show = show.build(move |v| v.take(name)).unwrap();
        let prune = RecordBuilder::new().build(|_| Ok(())).unwrap();

        let remote = VariantBuilder::new()
            .variant("show", show, Remote::Show)
            .variant("prune", prune, |_| Remote::Prune)
            .build()
            .unwrap();

        VariantBuilder::new()
            .variant("add", add, Op::Add)
            .variant("remote", remote, Op::Remote)
            .build()
            .unwrap()
    }

    #[test]
    fn test_dispatch_selects_variant() {
        let schema = ops();
        assert_eq!(schema.bind(&args(&["add", "--amount", "3"])), Ok(Op::Add(3)));
    }

    #[test]
    fn test_nested_dispatch() {
        let schema = ops();
        assert_eq!(
            schema.bind(&args(&["remote", "show", "--name", "origin"])),
            Ok(Op::Remote(Remote::Show("origin".to_string())))
        );
        assert_eq!(
            schema.bind(&args(&["remote", "prune"])),
            Ok(Op::Remote(Remote::Prune))
        );
    }

    #[test]
    fn test_empty_args() {
        let errors = ops().bind(&[]).unwrap_err();
        assert_eq!(
            errors.errors(),
            &[ParseError::NoCommandSpecified {
                options: vec!["add".to_string(), "remote".to_string()]
            }]
        );
    }

    #[test]
    fn test_matching_is_exact() {
        for token in ["Add", "ad", "--add", "remote show"] {
            let errors = ops().bind(&args(&[token])).unwrap_err();
            assert!(
                matches!(&errors.errors()[0], ParseError::UnknownCommand { token: t, .. } if t == token),
                "{token} should not match"
            );
        }
    }

    #[test]
    fn test_inner_errors_propagate_unchanged() {
        let errors = ops()
            .bind(&args(&["add", "--amount", "x", "--extra", "1"]))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.errors()[0].field(), Some("amount"));
        assert!(matches!(
            &errors.errors()[1],
            ParseError::UnrecognizedArguments { flags } if flags == &["--extra".to_string()]
        ));

        let errors = ops().bind(&args(&["remote"])).unwrap_err();
        assert!(matches!(
            &errors.errors()[0],
            ParseError::NoCommandSpecified { options } if options.len() == 2
        ));
    }

    #[test]
    fn test_options_without_parsing() {
        let schema = ops();
        assert_eq!(schema.options(), vec!["add", "remote"]);
        assert!(schema.alternative("remote").is_some());
        assert!(schema.alternative("missing").is_none());
    }

    #[test]
    fn test_builder_rejects_bad_sets() {
        let empty = VariantBuilder::<Op>::new().build().unwrap_err();
        assert_eq!(empty, SchemaError::EmptyVariantSet);

        let unit = || RecordBuilder::new().build(|_| Ok(0)).unwrap();
        let dup = VariantBuilder::new()
            .variant("add", unit(), Op::Add)
            .variant("add", unit(), Op::Add)
            .build()
            .unwrap_err();
        assert_eq!(dup, SchemaError::DuplicateVariant("add".to_string()));

        let blank = VariantBuilder::new()
            .variant("", unit(), Op::Add)
            .build()
            .unwrap_err();
        assert_eq!(blank, SchemaError::EmptyIdentifier);
    }
}
