//! HTML and terminal renderings of parsed diffs

use crate::artifacts::diff::processor::{DiffLine, FileDiff, LineAction, LineNumber};
use colored::Colorize;
use std::fmt::Write;

/// CSS classes used by [`as_html`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlClasses {
    pub table: String,
    pub line: String,
    pub old_lineno: String,
    pub new_lineno: String,
    pub code: String,
}

impl Default for HtmlClasses {
    fn default() -> Self {
        HtmlClasses {
            table: "code-difftable".to_string(),
            line: "line".to_string(),
            old_lineno: "lineno old".to_string(),
            new_lineno: "lineno new".to_string(),
            code: "code".to_string(),
        }
    }
}

/// Render `files` as an HTML table, or `None` when there is no hunk at all
pub fn as_html(files: &[FileDiff], classes: &HtmlClasses) -> Option<String> {
    if files.iter().all(|file| file.chunks.is_empty()) {
        return None;
    }

    write_html(files, classes).ok()
}

fn write_html(files: &[FileDiff], classes: &HtmlClasses) -> Result<String, std::fmt::Error> {
    let mut html = String::new();
    writeln!(html, r#"<table class="{}">"#, classes.table)?;

    for file in files {
        let file_id = safe_id(&file.filename);
        for line in file.chunks.iter().flatten() {
            writeln!(html, r#"<tr class="{} {}">"#, classes.line, line.action)?;
            write_lineno_cell(&mut html, &file_id, 'o', line.old_lineno, &classes.old_lineno)?;
            write_lineno_cell(&mut html, &file_id, 'n', line.new_lineno, &classes.new_lineno)?;
            writeln!(
                html,
                "\t<td class=\"{}\">\n\t\t<pre>{}</pre>\n\t</td>",
                classes.code,
                code_html(line)
            )?;
            writeln!(html, "</tr>")?;
        }
    }

    write!(html, "</table>")?;
    Ok(html)
}

fn write_lineno_cell(
    html: &mut String,
    file_id: &str,
    side: char,
    lineno: Option<LineNumber>,
    class: &str,
) -> std::fmt::Result {
    match lineno {
        Some(LineNumber::At(number)) => {
            let anchor = format!("{file_id}_{side}{number}");
            writeln!(
                html,
                "\t<td id=\"{anchor}\" class=\"{class}\"><pre><a href=\"#{anchor}\">{number}</a></pre></td>"
            )
        }
        Some(LineNumber::Elided) => {
            writeln!(html, "\t<td class=\"{class}\"><pre>...</pre></td>")
        }
        None => writeln!(html, "\t<td class=\"{class}\"><pre></pre></td>"),
    }
}

fn code_html(line: &DiffLine) -> String {
    let Some(spans) = &line.spans else {
        return escape(&line.text);
    };

    let tag = match line.action {
        LineAction::Add => "ins",
        _ => "del",
    };
    spans
        .iter()
        .map(|span| {
            if span.changed {
                format!("<{tag}>{}</{tag}>", escape(&span.text))
            } else {
                escape(&span.text)
            }
        })
        .collect()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Make a string usable as an HTML id: whitespace becomes `_`, other punctuation except
/// `-` is dropped, and the result is lowercased
pub fn safe_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| *c == '-' || *c == '_' || c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Render `files` for a terminal, colouring additions, deletions and changed spans
pub fn as_terminal(files: &[FileDiff]) -> String {
    let mut output = String::new();

    for file in files {
        output.push_str(&format!("--- {} ({})", file.filename, file.old_revision).bold().to_string());
        output.push('\n');
        output.push_str(&format!("+++ {} ({})", file.filename, file.new_revision).bold().to_string());
        output.push('\n');

        for line in file.chunks.iter().flatten() {
            let numbers = format!(
                "{:>5} {:>5} ",
                lineno_text(line.old_lineno),
                lineno_text(line.new_lineno)
            );
            output.push_str(&numbers.dimmed().to_string());
            output.push_str(&terminal_code(line));
            output.push('\n');
        }
    }

    output
}

fn lineno_text(lineno: Option<LineNumber>) -> String {
    lineno.map(|lineno| lineno.to_string()).unwrap_or_default()
}

fn terminal_code(line: &DiffLine) -> String {
    let paint = |text: &str| match line.action {
        LineAction::Add => text.green(),
        LineAction::Del => text.red(),
        LineAction::Context => text.cyan(),
        LineAction::Unmod => text.normal(),
    };
    let marker = match line.action {
        LineAction::Add => "+",
        LineAction::Del => "-",
        LineAction::Context => "",
        LineAction::Unmod => " ",
    };

    let mut code = paint(marker).to_string();
    match &line.spans {
        Some(spans) => {
            for span in spans {
                let painted = paint(&span.text);
                let painted = if span.changed {
                    painted.bold().underline()
                } else {
                    painted
                };
                code.push_str(&painted.to_string());
            }
        }
        None => code.push_str(&paint(&line.text).to_string()),
    }
    code
}
