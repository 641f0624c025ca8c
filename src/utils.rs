use std::io::{self, Write};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::utils::models::{Position, TabChar};

pub mod models;

/// Shorten `name` to `limit` chars, marking the cut with an ellipsis
pub fn etc_str(name: &str, limit: usize) -> String {
    match name.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &name[..cut]),
        None => name.to_owned(),
    }
}

/// Rate between 0 and 1 shown as a percentage
pub fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Append the `.html` extension when missing
pub fn html_file_name(filename: &mut String) {
    if !filename.to_lowercase().ends_with(".html") {
        filename.push_str(".html");
    }
}

/// Center `text` in a cell of `width` terminal columns
pub fn center(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    let padding = width.saturating_sub(visible);
    let left = padding / 2;

    format!("{}{}{}", " ".repeat(left), text, " ".repeat(padding - left))
}

/// Cut `text` so it takes at most `width` terminal columns
pub fn fit_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_owned();
    }

    let mut fitted = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        // Keep a column for the ellipsis
        if used + ch_width + 1 > width {
            break;
        }
        used += ch_width;
        fitted.push(ch);
    }
    fitted.push('…');

    fitted
}

/// Draw an horizontal line of the grid.
///
/// `open` tells, per column, if the cell above keeps going below the line.
pub fn line_table<W: Write>(
    out: &mut W,
    widths: &[usize],
    position: Position,
    open: &[bool],
) -> io::Result<()> {
    let is_open = |i: usize| open.get(i).copied().unwrap_or(false);

    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let left = i.checked_sub(1).map(is_open);
        line.push(position.joint(left, Some(is_open(i))).val());

        let fill = if is_open(i) { ' ' } else { TabChar::Bh.val() };
        line.extend(std::iter::repeat(fill).take(*width));
    }
    line.push(
        position
            .joint(widths.len().checked_sub(1).map(is_open), None)
            .val(),
    );

    writeln!(out, "{line}")
}

/// Write rows under headers, every column as wide as its widest cell
pub fn write_table<W: Write>(out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(*h)).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(UnicodeWidthStr::width(cell.as_str()));
            }
        }
    }

    let pad = |text: &str, width: usize| {
        let padding = width.saturating_sub(UnicodeWidthStr::width(text));
        format!("{text}{}", " ".repeat(padding))
    };

    let header: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();
    writeln!(out, "{}", header.join(" ").trim_end())?;

    let rule: Vec<String> = widths
        .iter()
        .map(|w| TabChar::Bh.val().to_string().repeat(*w))
        .collect();
    writeln!(out, "{}", rule.join(" "))?;

    for row in rows {
        let cells: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect();
        writeln!(out, "{}", cells.join(" ").trim_end())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_kept() {
        assert_eq!(etc_str("자료구조", 18), "자료구조");
        assert_eq!(etc_str("exactly eighteen!!", 18), "exactly eighteen!!");
    }

    #[test]
    fn long_names_are_cut_on_chars() {
        assert_eq!(etc_str("nineteen characters", 18), "nineteen character...");
        assert_eq!(
            etc_str("인공지능기반소프트웨어공학특론및실습입니다", 18),
            "인공지능기반소프트웨어공학특론및실습..."
        );
    }

    #[test]
    fn fits_terminal_width() {
        assert_eq!(fit_width("DB", 10), "DB");
        assert_eq!(fit_width("abcdef", 4), "abc…");
        assert_eq!(fit_width("운영체제", 6), "운영…");
    }

    #[test]
    fn percentages() {
        assert_eq!(percent(0.4567), "45.7%");
        assert_eq!(percent(0.0), "0.0%");
    }

    #[test]
    fn html_extension() {
        let mut name = "calendar".to_owned();
        html_file_name(&mut name);
        assert_eq!(name, "calendar.html");

        let mut name = "calendar.HTML".to_owned();
        html_file_name(&mut name);
        assert_eq!(name, "calendar.HTML");
    }

    #[test]
    fn centers_wide_chars() {
        assert_eq!(center("월", 6), "  월  ");
        assert_eq!(center("ab", 5), " ab  ");
    }

    #[test]
    fn line_with_open_cell() {
        let mut out = Vec::new();
        line_table(&mut out, &[2, 2, 2], Position::Middle, &[false, true, false]).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "├──┤  ├──┤\n");
    }

    #[test]
    fn table_columns_are_aligned() {
        let mut out = Vec::new();
        let rows = vec![
            vec!["1".to_owned(), "운영체제".to_owned()],
            vec!["12".to_owned(), "DB".to_owned()],
        ];
        write_table(&mut out, &["ID", "과목명"], &rows).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID 과목명");
        assert_eq!(lines[2], "1  운영체제");
        assert_eq!(lines[3], "12 DB");
    }
}
