use std::io::Write;

use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{illegal_operation, IonResult};
use crate::text::text_formatter::IonValueFormatter;
use crate::types::{Decimal, Int, IonType, Timestamp};
use crate::writer::IonWriter;

/// Configuration for the whitespace a [RawTextWriter] emits around values.
#[derive(Debug, Clone, Copy)]
struct WhitespaceConfig {
    // Between values at the top level
    space_between_top_level_values: &'static str,
    // Between values inside a container
    space_between_nested_values: &'static str,
    // Indentation per level of depth, written after each newline
    indentation: &'static str,
    // Between a field name's `:` and the field value
    space_after_field_name: &'static str,
}

static COMPACT_WHITESPACE_CONFIG: WhitespaceConfig = WhitespaceConfig {
    space_between_top_level_values: " ",
    space_between_nested_values: " ",
    indentation: "",
    space_after_field_name: " ",
};

static PRETTY_WHITESPACE_CONFIG: WhitespaceConfig = WhitespaceConfig {
    space_between_top_level_values: "\n",
    space_between_nested_values: "\n",
    indentation: "  ",
    space_after_field_name: " ",
};

/// Configures and constructs new instances of [RawTextWriter].
pub struct RawTextWriterBuilder {
    whitespace_config: WhitespaceConfig,
}

impl RawTextWriterBuilder {
    /// Constructs a builder for the most compact form of Ion text: values are separated by
    /// single spaces.
    pub fn new() -> RawTextWriterBuilder {
        RawTextWriterBuilder {
            whitespace_config: COMPACT_WHITESPACE_CONFIG,
        }
    }

    /// Constructs a builder for generously-spaced, human-friendly Ion text.
    pub fn pretty() -> RawTextWriterBuilder {
        RawTextWriterBuilder {
            whitespace_config: PRETTY_WHITESPACE_CONFIG,
        }
    }

    pub fn build<W: Write>(self, sink: W) -> IonResult<RawTextWriter<W>> {
        Ok(RawTextWriter {
            output: sink,
            annotations: Vec::new(),
            field_name: None,
            containers: Vec::new(),
            top_level_value_count: 0,
            whitespace_config: self.whitespace_config,
            scratch: String::with_capacity(64),
        })
    }
}

impl Default for RawTextWriterBuilder {
    fn default() -> Self {
        RawTextWriterBuilder::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct ContainerContext {
    ion_type: IonType,
    child_count: usize,
}

/// Writes Ion text to an implementation of [Write], including whatever field names,
/// annotations, and symbol tokens it is given; symbol IDs are rendered in their `$n` form.
/// (The [TextWriter](crate::text::text_writer::TextWriter) resolves symbol IDs to text
/// first.)
pub struct RawTextWriter<W: Write> {
    output: W,
    annotations: Vec<RawSymbolToken>,
    field_name: Option<RawSymbolToken>,
    containers: Vec<ContainerContext>,
    top_level_value_count: usize,
    whitespace_config: WhitespaceConfig,
    // Reusable buffer in which each value's text is assembled
    scratch: String,
}

impl<W: Write> RawTextWriter<W> {
    fn parent_container(&self) -> Option<&ContainerContext> {
        self.containers.last()
    }

    // Writes everything that precedes a value's own text: a separator (if this is not the
    // first value at this level), indentation, the field name, and any annotations.
    fn write_value_preamble(&mut self) -> IonResult<()> {
        let mut preamble = String::new();
        let depth = self.containers.len();
        match self.parent_container() {
            Some(container) => {
                if container.child_count > 0 {
                    let separator = match container.ion_type {
                        IonType::Struct | IonType::List => ",",
                        _ => "",
                    };
                    preamble.push_str(separator);
                    preamble.push_str(self.whitespace_config.space_between_nested_values);
                } else if !self.whitespace_config.indentation.is_empty() {
                    preamble.push('\n');
                }
            }
            None => {
                if self.top_level_value_count > 0 {
                    preamble.push_str(self.whitespace_config.space_between_top_level_values);
                }
            }
        }
        if preamble.ends_with('\n') {
            for _ in 0..depth {
                preamble.push_str(self.whitespace_config.indentation);
            }
        }

        let in_struct = self.parent_type() == Some(IonType::Struct);
        let field_name = self.field_name.take();
        match (in_struct, field_name) {
            (true, Some(token)) => {
                let mut formatter = IonValueFormatter {
                    output: &mut preamble,
                };
                formatter.format_symbol_token(&token)?;
                preamble.push(':');
                preamble.push_str(self.whitespace_config.space_after_field_name);
            }
            (true, None) => {
                return illegal_operation(
                    "a field name must be set before writing a struct field",
                )
            }
            (false, Some(_)) => {
                return illegal_operation("a field name can only be set inside a struct")
            }
            (false, None) => {}
        }

        for annotation in std::mem::take(&mut self.annotations) {
            let mut formatter = IonValueFormatter {
                output: &mut preamble,
            };
            formatter.format_symbol_token(&annotation)?;
            preamble.push_str("::");
        }

        self.output.write_all(preamble.as_bytes())?;
        Ok(())
    }

    // Records that a value was written at the current depth.
    fn increment_child_count(&mut self) {
        match self.containers.last_mut() {
            Some(container) => container.child_count += 1,
            None => self.top_level_value_count += 1,
        }
    }

    fn write_scalar<F>(&mut self, format_fn: F) -> IonResult<()>
    where
        F: FnOnce(&mut IonValueFormatter<'_, String>) -> IonResult<()>,
    {
        self.write_value_preamble()?;
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        let mut formatter = IonValueFormatter {
            output: &mut scratch,
        };
        let result = format_fn(&mut formatter);
        if result.is_ok() {
            self.output.write_all(scratch.as_bytes())?;
        }
        self.scratch = scratch;
        result?;
        self.increment_child_count();
        Ok(())
    }
}

impl<W: Write> IonWriter for RawTextWriter<W> {
    type Output = W;

    fn ion_version(&self) -> (u8, u8) {
        (1, 0)
    }

    fn write_ion_version_marker(&mut self, major: u8, minor: u8) -> IonResult<()> {
        if self.depth() > 0 {
            return illegal_operation("Ion version markers can only appear at the top level");
        }
        if (major, minor) != (1, 0) {
            return illegal_operation(format!(
                "this writer can only write Ion v1.0; v{major}.{minor} was requested"
            ));
        }
        if self.top_level_value_count > 0 {
            self.output.write_all(
                self.whitespace_config
                    .space_between_top_level_values
                    .as_bytes(),
            )?;
        }
        self.output.write_all(b"$ion_1_0")?;
        self.top_level_value_count += 1;
        Ok(())
    }

    fn supports_text_symbol_tokens(&self) -> bool {
        true
    }

    fn set_annotations<I, A>(&mut self, annotations: I)
    where
        A: Into<RawSymbolToken>,
        I: IntoIterator<Item = A>,
    {
        self.annotations.clear();
        self.annotations
            .extend(annotations.into_iter().map(|a| a.into()));
    }

    fn add_annotation<A: Into<RawSymbolToken>>(&mut self, annotation: A) {
        self.annotations.push(annotation.into());
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_null(ion_type))
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_bool(value))
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_integer(&Int::I64(value)))
    }

    fn write_int(&mut self, value: &Int) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_integer(value))
    }

    fn write_f32(&mut self, value: f32) -> IonResult<()> {
        self.write_f64(value as f64)
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_float(value))
    }

    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_decimal(value))
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_timestamp(value))
    }

    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()> {
        let token = value.into();
        self.write_scalar(|formatter| formatter.format_symbol_token(&token))
    }

    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_string(value.as_ref()))
    }

    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_clob(value.as_ref()))
    }

    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.write_scalar(|formatter| formatter.format_blob(value.as_ref()))
    }

    fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        let opening_delimiter = match container_type {
            IonType::List => "[",
            IonType::SExp => "(",
            IonType::Struct => "{",
            _ => {
                return illegal_operation(format!("cannot step into a {container_type}"));
            }
        };
        self.write_value_preamble()?;
        self.output.write_all(opening_delimiter.as_bytes())?;
        self.containers.push(ContainerContext {
            ion_type: container_type,
            child_count: 0,
        });
        Ok(())
    }

    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A) {
        self.field_name = Some(name.into());
    }

    fn parent_type(&self) -> Option<IonType> {
        self.containers.last().map(|container| container.ion_type)
    }

    fn depth(&self) -> usize {
        self.containers.len()
    }

    fn step_out(&mut self) -> IonResult<()> {
        if self.containers.is_empty() {
            return illegal_operation("step_out called at the top level");
        }
        if self.field_name.is_some() || !self.annotations.is_empty() {
            return illegal_operation(
                "cannot step_out with a staged field name or annotations that were never used",
            );
        }
        let container = self.containers.pop().expect("depth was checked above");
        let closing_delimiter = match container.ion_type {
            IonType::List => "]",
            IonType::SExp => ")",
            IonType::Struct => "}",
            other => unreachable!("the container stack contained a scalar type: {other}"),
        };
        // In pretty mode, a non-empty container's closing delimiter goes on its own line.
        if !self.whitespace_config.indentation.is_empty() && container.child_count > 0 {
            let mut closing_line = String::from("\n");
            for _ in 0..self.containers.len() {
                closing_line.push_str(self.whitespace_config.indentation);
            }
            self.output.write_all(closing_line.as_bytes())?;
        }
        self.output.write_all(closing_delimiter.as_bytes())?;
        self.increment_child_count();
        Ok(())
    }

    fn flush(&mut self) -> IonResult<()> {
        if self.depth() > 0 {
            return illegal_operation("flush called with unclosed containers");
        }
        self.output.flush()?;
        Ok(())
    }

    fn output(&self) -> &W {
        &self.output
    }

    fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }
}

#[cfg(test)]
mod raw_text_writer_tests {
    use super::*;

    fn written_text<F>(builder: RawTextWriterBuilder, write_fn: F) -> String
    where
        F: FnOnce(&mut RawTextWriter<&mut Vec<u8>>) -> IonResult<()>,
    {
        let mut output = Vec::new();
        let mut writer = builder.build(&mut output).expect("failed to build writer");
        write_fn(&mut writer).expect("write failed");
        writer.flush().expect("flush failed");
        String::from_utf8(output).expect("writer produced invalid utf-8")
    }

    #[test]
    fn write_scalars() {
        let text = written_text(RawTextWriterBuilder::new(), |writer| {
            writer.write_null(IonType::Int)?;
            writer.write_bool(true)?;
            writer.write_i64(-17)?;
            writer.write_f64(2.5)?;
            writer.write_decimal(&Decimal::new(100, -3))?;
            writer.write_string("hi")?;
            writer.write_symbol("sym")?;
            writer.write_symbol(10usize)
        });
        assert_eq!(text, "null.int true -17 2.5e0 0.100 \"hi\" sym $10");
    }

    #[test]
    fn write_containers_compact() {
        let text = written_text(RawTextWriterBuilder::new(), |writer| {
            writer.step_in(IonType::List)?;
            writer.write_i64(1)?;
            writer.write_i64(2)?;
            writer.step_out()?;
            writer.step_in(IonType::Struct)?;
            writer.set_field_name("a");
            writer.write_i64(1)?;
            writer.set_field_name("needs quoting");
            writer.write_i64(2)?;
            writer.step_out()?;
            writer.step_in(IonType::SExp)?;
            writer.write_symbol("+")?;
            writer.write_i64(1)?;
            writer.step_out()
        });
        assert_eq!(text, "[1, 2] {a: 1, 'needs quoting': 2} ('+' 1)");
    }

    #[test]
    fn write_annotated_values() {
        let text = written_text(RawTextWriterBuilder::new(), |writer| {
            writer.set_annotations(["a", "b c"]);
            writer.write_i64(7)
        });
        assert_eq!(text, "a::'b c'::7");
    }

    #[test]
    fn write_empty_containers() {
        let text = written_text(RawTextWriterBuilder::new(), |writer| {
            writer.step_in(IonType::List)?;
            writer.step_out()?;
            writer.step_in(IonType::Struct)?;
            writer.step_out()
        });
        assert_eq!(text, "[] {}");
    }

    #[test]
    fn pretty_printing_indents_nested_values() {
        let text = written_text(RawTextWriterBuilder::pretty(), |writer| {
            writer.step_in(IonType::Struct)?;
            writer.set_field_name("a");
            writer.step_in(IonType::List)?;
            writer.write_i64(1)?;
            writer.write_i64(2)?;
            writer.step_out()?;
            writer.step_out()
        });
        assert_eq!(text, "{\n  a: [\n    1,\n    2\n  ]\n}");
    }

    #[test]
    fn missing_field_name_is_rejected() {
        let mut output = Vec::new();
        let mut writer = RawTextWriterBuilder::new().build(&mut output).unwrap();
        writer.step_in(IonType::Struct).unwrap();
        assert!(writer.write_i64(1).is_err());
    }
}
