//! Source-located error display.
//!
//! Maps byte spans back to lines and renders the offending line with a
//! caret underline:
//!
//! ```text
//!   File "fib.gb", line 2
//!     puts(b);
//!          ^
//! CompileError: undefined variable b
//! ```

use gibbon_parser::Span;

// =============================================================================
// Source Map
// =============================================================================

/// Line start table over one source text.
#[derive(Debug, Clone)]
pub struct SourceMap<'src> {
    /// Byte offset of each line start; the first is always 0.
    line_starts: Vec<usize>,
    source: &'src str,
    filename: &'src str,
}

/// 1-based line, 0-based byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl<'src> SourceMap<'src> {
    /// Index the line starts of `source`.
    pub fn new(source: &'src str, filename: &'src str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            line_starts,
            source,
            filename,
        }
    }

    /// Locate a byte offset. Offsets past the end clamp to the end.
    pub fn locate(&self, offset: usize) -> SourceLocation {
        let offset = offset.min(self.source.len());
        let index = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        SourceLocation {
            line: index + 1,
            column: offset - self.line_starts[index],
        }
    }

    /// Text of a 1-based line without its line terminator.
    pub fn line_text(&self, line: usize) -> Option<&'src str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches(['\n', '\r']))
    }

    #[inline]
    pub fn filename(&self) -> &str {
        self.filename
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Render `label: message` under the source line containing `span`.
///
/// The underline covers the span's part of its first line and is at least
/// one caret wide.
pub fn render_source_error(map: &SourceMap<'_>, span: Span, label: &str, message: &str) -> String {
    let start = map.locate(span.start as usize);
    let mut output = format!("  File \"{}\", line {}\n", map.filename(), start.line);

    if let Some(text) = map.line_text(start.line) {
        let column = start.column.min(text.len());
        let end = (span.end as usize)
            .saturating_sub(span.start as usize)
            .saturating_add(column)
            .min(text.len());
        let indent = text.get(..column).map_or(column, |s| s.chars().count());
        let width = text
            .get(column..end)
            .map_or(0, |s| s.chars().count())
            .max(1);

        output.push_str("    ");
        output.push_str(text);
        output.push('\n');
        output.push_str("    ");
        output.push_str(&" ".repeat(indent));
        output.push_str(&"^".repeat(width));
        output.push('\n');
    }

    output.push_str(label);
    output.push_str(": ");
    output.push_str(message);
    output
}
