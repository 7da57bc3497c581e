//! Output formatting and writing utilities
//!
//! API responses are JSON values. Machine formats print them as-is; the
//! human format turns list responses into a table and everything else into
//! `key: value` lines.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};
use tracing::trace;

/// Most columns shown for a list response in human format
const MAX_COLUMNS: usize = 6;

/// Formatting of serializable values per output format
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format an API response
    fn format_response(&self, value: &Value) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => {
                Ok(serde_json::to_string_pretty(value)?)
            }
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_response(&self, value: &Value) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_response_human(value)),
            _ => self.format(value),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message (human format only)
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message (human format only)
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write an API response in the configured format
    pub fn response(&mut self, value: &Value) -> Result<()> {
        let mut redacted = value.clone();
        redaction::redact_json_value(&mut redacted);
        trace!("Outputting response: {}", redacted);

        let formatted = self.format.format_response(value)?;
        if formatted.ends_with('\n') {
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }
}

/// Format an API response for human reading
fn format_response_human(value: &Value) -> String {
    match value {
        Value::Object(map) => match list_field(map) {
            Some((name, items)) => format_list_human(map, name, items),
            None => format_object_human(map),
        },
        Value::Array(items) => format_items_table(items),
        other => format_value_compact(other),
    }
}

/// The array-of-objects field of a paginated response, e.g. `documents`
fn list_field(map: &Map<String, Value>) -> Option<(&str, &[Value])> {
    if !map.contains_key("nextToken") {
        return None;
    }
    map.iter().find_map(|(key, value)| match value {
        Value::Array(items) if items.iter().all(Value::is_object) => {
            Some((key.as_str(), items.as_slice()))
        }
        _ => None,
    })
}

fn format_list_human(map: &Map<String, Value>, name: &str, items: &[Value]) -> String {
    let mut output = String::new();

    if items.is_empty() {
        output.push_str(&format!("No {} found\n", name));
    } else {
        output.push_str(&format_items_table(items));
    }

    for (key, value) in map.iter().filter(|(key, _)| key.as_str() != name) {
        if !value.is_null() {
            output.push_str(&format!("{}: {}\n", key, format_value_compact(value)));
        }
    }

    output
}

fn format_items_table(items: &[Value]) -> String {
    let mut headers: Vec<String> = Vec::new();
    for item in items.iter().filter_map(Value::as_object) {
        for (key, value) in item {
            let scalar = !value.is_object() && !value.is_array();
            if scalar && headers.len() < MAX_COLUMNS && !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            headers
                .iter()
                .map(|header| match item.get(header) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();

    render_table(&headers, &rows)
}

fn format_object_human(map: &Map<String, Value>) -> String {
    let width = map.keys().map(|k| k.len()).max().unwrap_or(0);
    let mut output = String::new();

    for (key, value) in map {
        output.push_str(&format!(
            "{:width$}  {}\n",
            format!("{}:", key),
            format_value_compact(value),
            width = width + 1
        ));
    }

    output
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let pad = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut output = pad(headers);
    output.push('\n');
    output.push_str(
        &widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    output.push('\n');
    for row in rows {
        output.push_str(&pad(row.as_slice()));
        output.push('\n');
    }

    output
}

/// Format a JSON value in a compact, human-readable way
fn format_value_compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            if arr.len() <= 3 {
                format!(
                    "[{}]",
                    arr.iter()
                        .map(format_value_compact)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            } else {
                format!("[{} items]", arr.len())
            }
        }
        Value::Object(obj) => {
            if obj.len() <= 2 {
                let items: Vec<String> = obj
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, format_value_compact(v)))
                    .collect();
                format!("{{{}}}", items.join(", "))
            } else {
                format!("{{{} fields}}", obj.len())
            }
        }
    }
}
