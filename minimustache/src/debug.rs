use std::fmt;

use crate::compiler::tokens::Span;
use crate::error::ErrorKind;
use crate::value::Value;

/// This is a snapshot of the debug information.
#[derive(Default)]
pub(crate) struct DebugInfo {
    pub(crate) template_source: Option<String>,
    pub(crate) context: Option<Value>,
}

impl DebugInfo {
    pub(crate) fn source(&self) -> Option<&str> {
        self.template_source.as_deref()
    }
}

pub(crate) fn render_debug_info(
    f: &mut fmt::Formatter,
    name: Option<&str>,
    kind: ErrorKind,
    line: Option<usize>,
    span: Option<Span>,
    info: &DebugInfo,
) -> fmt::Result {
    if let Some(source) = info.source() {
        let title = format!(
            " {} ",
            name.unwrap_or_default()
                .rsplit(&['/', '\\'][..])
                .next()
                .unwrap_or("Template Source")
        );
        writeln!(f)?;
        writeln!(f, "{title:-^79}")?;
        let lines: Vec<_> = source.lines().enumerate().collect();
        let idx = line.unwrap_or(1).saturating_sub(1);
        let skip = idx.saturating_sub(3);
        let pre = lines.iter().skip(skip).take(3.min(idx)).collect::<Vec<_>>();
        let post = lines.iter().skip(idx + 1).take(3).collect::<Vec<_>>();
        for (idx, line) in pre {
            writeln!(f, "{:>4} | {}", idx + 1, line)?;
        }

        if let Some((idx, line)) = lines.get(idx) {
            writeln!(f, "{:>4} > {}", idx + 1, line)?;
            if let Some(span) = span {
                if span.start_line == span.end_line {
                    writeln!(
                        f,
                        "     i {}{} {}",
                        " ".repeat(span.start_col as usize),
                        "^".repeat(span.end_col.saturating_sub(span.start_col) as usize),
                        kind,
                    )?;
                }
            }
        }

        for (idx, line) in post {
            writeln!(f, "{:>4} | {}", idx + 1, line)?;
        }
        write!(f, "{:~^79}", "")?;
    }
    if let Some(ref ctx) = info.context {
        writeln!(f)?;
        writeln!(f, "{ctx:#?}")?;
        write!(f, "{:-^79}", "")?;
    }
    Ok(())
}
