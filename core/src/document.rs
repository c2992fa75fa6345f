//! Declarative schema documents.
//!
//! A [`SchemaDocument`] declares a record (a list of fields) or a variant set
//! (a list of named commands, each with its own fields or nested commands)
//! as plain data, typically loaded from JSON or YAML. Compiling a document
//! yields a [`Schema`] that binds to a [`serde_json::Value`]:
//!
//! - records bind to an object keyed by field name, in declaration order;
//! - variant sets bind to the externally tagged form `{"<command>": <inner>}`,
//!   which deserializes directly into a serde enum.
//!
//! # Example
//!
//! ```
//! use argbind_core::{SchemaDocument, parse};
//! use serde_json::json;
//!
//! let doc: SchemaDocument = serde_json::from_value(json!({
//!     "commands": [
//!         { "name": "copy", "fields": [
//!             { "name": "input" },
//!             { "name": "output", "default": "/dev/null" },
//!             { "name": "retries", "type": "int", "optional": true }
//!         ]}
//!     ]
//! }))
//! .unwrap();
//!
//! let schema = doc.compile().unwrap();
//! let bound = parse(&schema, &["copy", "--input", "a.txt"]).unwrap();
//! assert_eq!(bound, json!({ "copy": { "input": "a.txt", "output": "/dev/null", "retries": null } }));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::error::SchemaError;
use crate::naming::to_flag_name;
use crate::parsers::{self, FieldParser};
use crate::record::RecordBuilder;
use crate::schema::{FieldDef, Schema};
use crate::variant::VariantBuilder;

const ROOT: &str = "<root>";
const DEFAULT_DELIMITER: &str = ",";

/// Value type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Raw text (the default).
    #[default]
    Text,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// Finite floating point number.
    Float,
    /// `true`/`false`/`yes`/`no`/`1`/`0`.
    Bool,
    /// Filesystem path, bound as a string.
    Path,
    /// Delimited list of text items.
    List,
}

impl FieldKind {
    /// Converter producing JSON values for this kind.
    pub fn parser(self, delimiter: Option<&str>) -> FieldParser<Value> {
        match self {
            Self::Text | Self::Path => parsers::text().map(Value::String),
            Self::Int => parsers::int().map(Value::from),
            Self::Long => parsers::long().map(Value::from),
            Self::Float => parsers::float().and_then(|f| {
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("{f} is not a finite number"))
            }),
            Self::Bool => parsers::boolean().map(Value::Bool),
            Self::List => parsers::list(parsers::text(), delimiter.unwrap_or(DEFAULT_DELIMITER))
                .map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
        }
    }
}

/// One field of a record declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDocument {
    /// Field identifier; the flag is derived from it.
    pub name: String,
    /// Value type.
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    /// Help text shown in usage output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Default value, given as a scalar and converted like a raw argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Binds to `null` when absent or unparsable.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    /// Item separator for `list` fields (defaults to `,`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

impl FieldDocument {
    /// A required text field.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            help: None,
            default: None,
            optional: false,
            delimiter: None,
        }
    }

    /// Sets the value type.
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Adds a default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn default_text(&self) -> Result<Option<String>, DocumentError> {
        let invalid = |message: &str| DocumentError::InvalidDefault {
            field: self.name.clone(),
            message: message.to_string(),
        };
        match &self.default {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(Value::Null) => Err(invalid("null is not a default; use optional instead")),
            Some(_) => Err(invalid("default must be a string, number or boolean")),
        }
    }

    fn definition(&self) -> Result<FieldDef<Value>, DocumentError> {
        let parser = self.kind.parser(self.delimiter.as_deref());

        let mut def = if self.optional {
            let lenient = parsers::optional(parser).map(|value| value.unwrap_or(Value::Null));
            FieldDef::new(self.name.as_str(), lenient).default_shown_as(Value::Null, "none")
        } else if let Some(raw) = self.default_text()? {
            let value = parser
                .parse(&raw)
                .map_err(|message| DocumentError::InvalidDefault {
                    field: self.name.clone(),
                    message,
                })?;
            FieldDef::new(self.name.as_str(), parser).default_shown_as(value, raw)
        } else {
            FieldDef::new(self.name.as_str(), parser)
        };

        if let Some(help) = &self.help {
            def = def.hint(help.as_str());
        }
        Ok(def)
    }
}

/// A named alternative inside a variant declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandDocument {
    /// Discriminator token.
    pub name: String,
    /// Fields of this command's record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDocument>,
    /// Nested commands; mutually exclusive with `fields`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDocument>,
}

impl CommandDocument {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, field: FieldDocument) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a nested command.
    pub fn with_command(mut self, command: CommandDocument) -> Self {
        self.commands.push(command);
        self
    }
}

/// Top-level schema declaration: either `fields` or `commands`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Fields of a record schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDocument>,
    /// Alternatives of a variant schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDocument>,
}

impl SchemaDocument {
    /// Whether this document declares a variant set.
    pub fn is_variant(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Validates the document and compiles it into a schema.
    ///
    /// # Errors
    ///
    /// Every problem reported by [`validate_document`].
    pub fn compile(&self) -> Result<Box<dyn Schema<Value>>, Vec<DocumentError>> {
        let errors = validate_document(self);
        if !errors.is_empty() {
            return Err(errors);
        }

        let schema = compile_body(&self.fields, &self.commands).map_err(|err| vec![err])?;
        debug!(
            fields = self.fields.len(),
            commands = self.commands.len(),
            "Compiled schema document"
        );
        Ok(schema)
    }
}

fn compile_body(
    fields: &[FieldDocument],
    commands: &[CommandDocument],
) -> Result<Box<dyn Schema<Value>>, DocumentError> {
    if commands.is_empty() {
        return compile_record(fields);
    }

    let mut variants = VariantBuilder::new();
    for command in commands {
        let inner = compile_body(&command.fields, &command.commands)?;
        let tag = command.name.clone();
        variants = variants.variant(command.name.as_str(), inner, move |value: Value| {
            let mut tagged = Map::new();
            tagged.insert(tag.clone(), value);
            Value::Object(tagged)
        });
    }
    Ok(Box::new(variants.build()?))
}

fn compile_record(fields: &[FieldDocument]) -> Result<Box<dyn Schema<Value>>, DocumentError> {
    let mut record = RecordBuilder::new();
    let mut handles = Vec::with_capacity(fields.len());
    for field in fields {
        handles.push((field.name.clone(), record.add(field.definition()?)));
    }

    let schema = record.build(move |values| {
        let mut object = Map::new();
        for (name, handle) in &handles {
            object.insert(name.clone(), values.take(*handle)?);
        }
        Ok(Value::Object(object))
    })?;
    Ok(Box::new(schema))
}

/// Problems found in a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The top level declares neither fields nor commands.
    #[error("schema document must declare fields or commands")]
    EmptyDocument,
    /// A level declares both fields and commands.
    #[error("{0} declares both fields and commands")]
    MixedBody(String),
    /// A field or command has an empty name.
    #[error("empty name in {0}")]
    EmptyName(String),
    /// Two fields of one record map to the same flag.
    #[error("duplicate field: {0}")]
    DuplicateField(String),
    /// Two commands at one level share a name.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// `delimiter` set on a field that is not a list.
    #[error("field {0} sets a delimiter but is not a list")]
    UnexpectedDelimiter(String),
    /// `delimiter` is the empty string.
    #[error("field {0} has an empty delimiter")]
    EmptyDelimiter(String),
    /// `optional` combined with `default`.
    #[error("field {0} is optional and also declares a default")]
    OptionalWithDefault(String),
    /// The default does not convert with the field's type.
    #[error("invalid default for field {field}: {message}")]
    InvalidDefault { field: String, message: String },
    /// Schema construction failed after validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Validates a schema document, returning every problem found.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
///
/// let mut doc = SchemaDocument::default();
/// doc.fields.push(FieldDocument::new("age").with_kind(FieldKind::Int).with_default("ten"));
/// doc.fields.push(FieldDocument::new("age"));
///
/// let errors = validate_document(&doc);
/// assert_eq!(errors.len(), 2);
/// assert!(matches!(errors[0], DocumentError::InvalidDefault { .. }));
/// assert_eq!(errors[1], DocumentError::DuplicateField("age".to_string()));
/// ```
pub fn validate_document(doc: &SchemaDocument) -> Vec<DocumentError> {
    let mut errors = Vec::new();

    if doc.fields.is_empty() && doc.commands.is_empty() {
        errors.push(DocumentError::EmptyDocument);
        return errors;
    }

    validate_body(&doc.fields, &doc.commands, None, &mut errors);
    errors
}

fn validate_body(
    fields: &[FieldDocument],
    commands: &[CommandDocument],
    scope: Option<&str>,
    errors: &mut Vec<DocumentError>,
) {
    if !fields.is_empty() && !commands.is_empty() {
        errors.push(DocumentError::MixedBody(scope.unwrap_or(ROOT).to_string()));
    }

    validate_fields(fields, scope, errors);

    let mut seen: HashSet<&str> = HashSet::new();
    for command in commands {
        let name = command.name.as_str();
        if name.trim().is_empty() {
            errors.push(DocumentError::EmptyName(scope.unwrap_or(ROOT).to_string()));
            continue;
        }

        let path = qualify(scope, name);
        if !seen.insert(name) {
            errors.push(DocumentError::DuplicateCommand(path));
            continue;
        }
        validate_body(&command.fields, &command.commands, Some(&path), errors);
    }
}

fn validate_fields(fields: &[FieldDocument], scope: Option<&str>, errors: &mut Vec<DocumentError>) {
    let mut seen_flags: HashSet<String> = HashSet::new();

    for field in fields {
        if field.name.trim().is_empty() {
            errors.push(DocumentError::EmptyName(scope.unwrap_or(ROOT).to_string()));
            continue;
        }

        let path = qualify(scope, &field.name);
        if !seen_flags.insert(to_flag_name(&field.name)) {
            errors.push(DocumentError::DuplicateField(path.clone()));
        }

        match (&field.delimiter, field.kind) {
            (Some(delimiter), FieldKind::List) if delimiter.is_empty() => {
                errors.push(DocumentError::EmptyDelimiter(path.clone()));
            }
            (Some(_), kind) if kind != FieldKind::List => {
                errors.push(DocumentError::UnexpectedDelimiter(path.clone()));
            }
            _ => {}
        }

        if field.optional && field.default.is_some() {
            errors.push(DocumentError::OptionalWithDefault(path.clone()));
        } else if let Err(err) = field.definition() {
            errors.push(match err {
                DocumentError::InvalidDefault { message, .. } => DocumentError::InvalidDefault {
                    field: path.clone(),
                    message,
                },
                other => other,
            });
        }
    }
}

fn qualify(scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(scope) => format!("{scope}.{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ParseError;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn copy_document() -> SchemaDocument {
        SchemaDocument {
            fields: vec![
                FieldDocument::new("input").with_help("File to read"),
                FieldDocument::new("output").with_default("/dev/null"),
                FieldDocument::new("retries").with_kind(FieldKind::Int).optional(),
            ],
            commands: Vec::new(),
        }
    }

    #[test]
    fn test_record_document_binds_object_in_field_order() {
        let schema = copy_document().compile().unwrap();
        let value = schema
            .bind(&args(&["--retries", "3", "--input", "a"]))
            .unwrap();
        assert_eq!(value, json!({"input": "a", "output": "/dev/null", "retries": 3}));

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["input", "output", "retries"]);
    }

    #[test]
    fn test_optional_field_binds_null() {
        let schema = copy_document().compile().unwrap();
        let value = schema.bind(&args(&["--input", "a", "--retries", "many"])).unwrap();
        assert_eq!(value["retries"], Value::Null);
    }

    #[test]
    fn test_kinds_convert_to_json() {
        let doc = SchemaDocument {
            fields: vec![
                FieldDocument::new("count").with_kind(FieldKind::Long),
                FieldDocument::new("ratio").with_kind(FieldKind::Float),
                FieldDocument::new("dryRun").with_kind(FieldKind::Bool),
                FieldDocument::new("root").with_kind(FieldKind::Path),
                FieldDocument {
                    delimiter: Some(":".to_string()),
                    ..FieldDocument::new("tags").with_kind(FieldKind::List)
                },
            ],
            commands: Vec::new(),
        };
        let schema = doc.compile().unwrap();
        let value = schema
            .bind(&args(&[
                "--count", "12", "--ratio", "0.5", "--dry-run", "yes", "--root", "/tmp", "--tags",
                "a:b",
            ]))
            .unwrap();
        assert_eq!(
            value,
            json!({"count": 12, "ratio": 0.5, "dryRun": true, "root": "/tmp", "tags": ["a", "b"]})
        );
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        let doc = SchemaDocument {
            fields: vec![FieldDocument::new("ratio").with_kind(FieldKind::Float)],
            commands: Vec::new(),
        };
        let errors = doc
            .compile()
            .unwrap()
            .bind(&args(&["--ratio", "NaN"]))
            .unwrap_err();
        assert!(errors.to_string().contains("is not a finite number"));
    }

    #[test]
    fn test_variant_document_is_externally_tagged() {
        let doc = SchemaDocument {
            fields: Vec::new(),
            commands: vec![
                CommandDocument::new("remote").with_command(
                    CommandDocument::new("add").with_field(FieldDocument::new("url")),
                ),
                CommandDocument::new("status"),
            ],
        };
        let schema = doc.compile().unwrap();

        assert_eq!(
            schema.bind(&args(&["remote", "add", "--url", "u"])).unwrap(),
            json!({"remote": {"add": {"url": "u"}}})
        );
        assert_eq!(schema.bind(&args(&["status"])).unwrap(), json!({"status": {}}));

        let errors = schema.bind(&args(&["push"])).unwrap_err();
        assert!(matches!(errors.errors()[0], ParseError::UnknownCommand { .. }));
    }

    #[test]
    fn test_defaults_accept_scalars() {
        let doc = SchemaDocument {
            fields: vec![
                FieldDocument::new("port").with_kind(FieldKind::Int).with_default(8080),
                FieldDocument::new("verbose").with_kind(FieldKind::Bool).with_default(false),
            ],
            commands: Vec::new(),
        };
        let schema = doc.compile().unwrap();
        assert_eq!(schema.bind(&[]).unwrap(), json!({"port": 8080, "verbose": false}));
        assert!(schema.usage().contains("--port : optional, defaults to 8080"));
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let doc = SchemaDocument {
            fields: Vec::new(),
            commands: vec![
                CommandDocument::new("a")
                    .with_field(FieldDocument::new("x").with_kind(FieldKind::Int).with_default("y"))
                    .with_field(FieldDocument {
                        delimiter: Some(";".to_string()),
                        ..FieldDocument::new("z")
                    }),
                CommandDocument::new("a"),
                CommandDocument::new("b")
                    .with_field(FieldDocument::new("q").optional().with_default("1"))
                    .with_command(CommandDocument::new("")),
            ],
        };

        let errors = validate_document(&doc);
        assert_eq!(
            errors,
            vec![
                DocumentError::InvalidDefault {
                    field: "a.x".to_string(),
                    message: "ParseIntError: invalid digit found in string".to_string(),
                },
                DocumentError::UnexpectedDelimiter("a.z".to_string()),
                DocumentError::DuplicateCommand("a".to_string()),
                DocumentError::MixedBody("b".to_string()),
                DocumentError::OptionalWithDefault("b.q".to_string()),
                DocumentError::EmptyName("b".to_string()),
            ]
        );
        assert_eq!(doc.compile().err(), Some(errors));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        assert_eq!(
            validate_document(&SchemaDocument::default()),
            vec![DocumentError::EmptyDocument]
        );
    }

    #[test]
    fn test_null_and_structured_defaults_are_rejected() {
        let doc = SchemaDocument {
            fields: vec![
                FieldDocument::new("a").with_default(Value::Null),
                FieldDocument::new("b").with_default(json!(["x"])),
            ],
            commands: Vec::new(),
        };
        let errors = validate_document(&doc);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, DocumentError::InvalidDefault { .. })));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
commands:
  - name: CommandOne
    fields:
      - name: input
      - name: output
        default: /dev/null
        help: Where to write
  - name: CommandTwo
    fields:
      - name: throughput
        type: long
        default: 10
"#;
        let doc: SchemaDocument = serde_yaml::from_str(yaml).unwrap();
        assert!(doc.is_variant());
        assert_eq!(doc.commands[1].fields[0].kind, FieldKind::Long);
        assert!(validate_document(&doc).is_empty());

        let unknown = serde_yaml::from_str::<SchemaDocument>("fields:\n  - name: a\n    color: red\n");
        assert!(unknown.is_err());
    }
}
