use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::AggregationResult;
use crate::util::pad;

pub const DEFAULT_COLUMN_CAP: usize = 48;

const MISSING: &str = "-";
const ELLIPSIS: char = '…';

/// Render the result as a plain-text table. Each column is as wide as its
/// widest cell in display cells, capped at `column_cap`.
pub fn render_table(result: &AggregationResult, column_cap: usize) -> String {
    let column_cap = column_cap.max(1);
    let columns: Vec<_> = result
        .registry
        .iter()
        .map(|(key, info)| {
            let width = result
                .rows
                .iter()
                .map(|row| row.get(key).map_or(MISSING.width(), cell_width))
                .fold(info.display_name.width(), usize::max)
                .min(column_cap);
            (key, info.display_name.as_str(), width)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .map(|(_, name, width)| pad(fit(name, *width), 1))
        .collect();
    push_line(&mut out, &header.join("|"));

    let rule: Vec<String> = columns
        .iter()
        .map(|(_, _, width)| "-".repeat(width + 2))
        .collect();
    push_line(&mut out, &rule.join("+"));

    for row in &result.rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|(key, _, width)| pad(fit(row.get(key).unwrap_or(MISSING), *width), 1))
            .collect();
        push_line(&mut out, &cells.join("|"));
    }
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn single_line(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

fn cell_width(value: &str) -> usize {
    single_line(value).width()
}

/// Cut `value` to `width` display cells (ending in `…` when cut) and pad it
/// with spaces to exactly that width.
fn fit(value: &str, width: usize) -> String {
    let value = single_line(value);
    let mut out = String::with_capacity(width);
    let mut used = 0;

    if value.width() <= width {
        out.push_str(&value);
        used = value.width();
    } else {
        let budget = width.saturating_sub(1);
        for ch in value.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > budget {
                break;
            }
            out.push(ch);
            used += w;
        }
        if width > 0 {
            out.push(ELLIPSIS);
            used += 1;
        }
    }

    for _ in used..width {
        out.push(' ');
    }
    out
}
