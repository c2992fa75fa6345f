//! Usage text derived from schemas.
//!
//! Records render one line per field:
//!
//! ```text
//! --input : required [File to read]
//! --output : optional, defaults to /dev/null
//! ```
//!
//! Variant sets render a header followed by every command name with its
//! nested usage indented beneath it.

use crate::schema::{FieldSpec, Schema};

/// Header line written before the command list of a variant set.
pub const COMMAND_HEADER: &str = "Usage: <COMMAND> [--flag <value>]...";

const INDENT: &str = "  ";

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Usage line for a single field, without indentation or newline.
///
/// `<flag> : required` or `<flag> : optional, defaults to <value>`, followed
/// by ` [<hint>]` when the field declares help text.
pub fn field_line(field: &FieldSpec) -> String {
    let mut line = format!("{} : ", field.flag());
    match field.default_rendering() {
        Some(default) => {
            line.push_str("optional, defaults to ");
            line.push_str(default);
        }
        None => line.push_str("required"),
    }
    if let Some(hint) = field.hint() {
        line.push_str(" [");
        line.push_str(hint);
        line.push(']');
    }
    line
}

pub(crate) fn render_record(fields: &[FieldSpec], out: &mut String, depth: usize) {
    for field in fields {
        indent(out, depth);
        out.push_str(&field_line(field));
        out.push('\n');
    }
}

pub(crate) fn render_variant<T>(
    alternatives: &[(&str, &dyn Schema<T>)],
    out: &mut String,
    depth: usize,
) {
    indent(out, depth);
    out.push_str(COMMAND_HEADER);
    out.push('\n');
    for (name, schema) in alternatives {
        indent(out, depth);
        out.push_str(name);
        out.push('\n');
        schema.render_usage(out, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers;
    use crate::record::RecordBuilder;
    use crate::schema::FieldDef;
    use crate::variant::VariantBuilder;

    #[test]
    fn test_record_lines() {
        let mut b = RecordBuilder::new();
        b.add(FieldDef::new("inputPath", parsers::text()).hint("File to read"));
        b.add(FieldDef::new("outputFilePattern", parsers::text()).default_value("out-%d".to_string()));
        b.add(FieldDef::optional("retries", parsers::int()));
        let schema = b.build(|_| Ok(())).unwrap();

        assert_eq!(
            schema.usage(),
            "--input-path : required [File to read]\n\
             --output-file-pattern : optional, defaults to out-%d\n\
             --retries : optional, defaults to none\n"
        );
    }

    #[test]
    fn test_variant_block() {
        let mut one = RecordBuilder::new();
        one.add(FieldDef::new("input", parsers::text()));
        let one = one.build(|_| Ok(1)).unwrap();

        let mut two = RecordBuilder::new();
        two.add(FieldDef::new("throughput", parsers::long()).default_value(10));
        let two = two.build(|_| Ok(2)).unwrap();

        let schema = VariantBuilder::new()
            .variant("CommandOne", one, |n: i32| n)
            .variant("CommandTwo", two, |n: i32| n)
            .build()
            .unwrap();

        let expected = format!(
            "{COMMAND_HEADER}\nCommandOne\n  --input : required\nCommandTwo\n  --throughput : optional, defaults to 10\n"
        );
        assert_eq!(schema.usage(), expected);
    }

    #[test]
    fn test_nested_variants_indent_recursively() {
        let mut leaf = RecordBuilder::new();
        leaf.add(FieldDef::new("name", parsers::text()));
        let leaf = leaf.build(|_| Ok(())).unwrap();
        let inner = VariantBuilder::new()
            .variant("show", leaf, |u: ()| u)
            .build()
            .unwrap();
        let outer = VariantBuilder::new()
            .variant("remote", inner, |u: ()| u)
            .build()
            .unwrap();

        let text = outer.usage();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], COMMAND_HEADER);
        assert_eq!(lines[1], "remote");
        assert_eq!(lines[2], format!("  {COMMAND_HEADER}"));
        assert_eq!(lines[3], "  show");
        assert_eq!(lines[4], "    --name : required");
    }

    #[test]
    fn test_usage_is_idempotent() {
        let mut b = RecordBuilder::new();
        b.add(FieldDef::new("input", parsers::text()));
        let schema = b.build(|_| Ok(())).unwrap();
        assert_eq!(schema.usage(), schema.usage());
    }
}
