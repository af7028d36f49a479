//! Markdown tables and tile grids.
//!
//! General tables go through a real Markdown parser so that links and inline
//! code survive. Tile grids use a line-oriented decoder instead, because grid
//! tables routinely have an empty header row that authors type by hand.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use quill_data::{SemanticTile, TileStamp};
use regex::Regex;

lazy_static! {
    static ref SEPARATOR: Regex = Regex::new(r"^\|[\s-]+(\|[\s-]+)*\|$").expect("separator regex");
}

/// One Markdown table: header cells and the data rows beneath them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkdownTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    /// Rows as maps keyed by header text. Cells beyond the header are dropped.
    pub fn records(&self) -> Vec<BTreeMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, c)| (h.clone(), c.clone()))
                    .collect()
            })
            .collect()
    }

    /// Values of the column whose header matches `name` case-insensitively.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(idx).map(String::as_str))
                .collect(),
        )
    }
}

/// Parse every table in `markdown`.
///
/// Cell text is the concatenation of its inline content, with code spans and
/// links rendered back to `` `code` `` and `[text](url)` form.
pub fn parse_tables(markdown: &str) -> Vec<MarkdownTable> {
    let mut tables = Vec::new();
    let mut current: Option<MarkdownTable> = None;
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut links: Vec<String> = Vec::new();

    for event in Parser::new_ext(markdown, Options::ENABLE_TABLES) {
        match event {
            Event::Start(Tag::Table(_)) => current = Some(MarkdownTable::default()),
            Event::End(TagEnd::Table) => {
                if let Some(table) = current.take() {
                    tables.push(table);
                }
            },
            Event::Start(Tag::TableHead | Tag::TableRow) => row.clear(),
            Event::End(TagEnd::TableHead) => {
                if let Some(table) = current.as_mut() {
                    table.headers = std::mem::take(&mut row);
                }
            },
            Event::End(TagEnd::TableRow) => {
                if let Some(table) = current.as_mut() {
                    table.rows.push(std::mem::take(&mut row));
                }
            },
            Event::Start(Tag::TableCell) => cell.clear(),
            Event::End(TagEnd::TableCell) => row.push(cell.trim().to_string()),
            Event::Start(Tag::Link { dest_url, .. }) => {
                cell.push('[');
                links.push(dest_url.to_string());
            },
            Event::End(TagEnd::Link) => {
                let dest = links.pop().unwrap_or_default();
                cell.push_str("](");
                cell.push_str(&dest);
                cell.push(')');
            },
            Event::Text(text) => {
                if current.is_some() {
                    cell.push_str(&text);
                }
            },
            Event::Code(code) => {
                if current.is_some() {
                    cell.push('`');
                    cell.push_str(&code);
                    cell.push('`');
                }
            },
            Event::SoftBreak | Event::HardBreak => cell.push(' '),
            _ => {},
        }
    }
    tables
}

/// Decode a tile grid from a fenced code block, falling back to a pipe table.
///
/// Returns `None` when neither form yields any rows.
pub fn decode_tile_grid(text: &str) -> Option<TileStamp> {
    let rows = code_block_rows(text)
        .filter(|rows| !rows.is_empty())
        .or_else(|| pipe_table_rows(text))?;
    stamp_from_rows(&rows)
}

/// Whitespace-tokenized rows of the first closed fenced block.
fn code_block_rows(text: &str) -> Option<Vec<Vec<String>>> {
    let mut inside = false;
    let mut rows = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            if inside {
                return Some(rows);
            }
            inside = true;
            continue;
        }
        if inside && !trimmed.is_empty() {
            rows.push(trimmed.split_whitespace().map(str::to_string).collect());
        }
    }
    None
}

/// Data rows of a pipe table; everything up to the separator row is header.
fn pipe_table_rows(text: &str) -> Option<Vec<Vec<String>>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('|'))
        .collect();
    let data = match lines.iter().position(|l| SEPARATOR.is_match(l)) {
        Some(sep) => &lines[sep + 1..],
        None => &lines[..],
    };
    let rows: Vec<Vec<String>> = data.iter().map(|line| split_pipe_row(line)).collect();
    if rows.is_empty() { None } else { Some(rows) }
}

fn split_pipe_row(line: &str) -> Vec<String> {
    let mut cells: Vec<&str> = line.split('|').collect();
    if cells.first().is_some_and(|c| c.trim().is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.trim().is_empty()) {
        cells.pop();
    }
    cells.into_iter().map(|c| c.trim().to_string()).collect()
}

/// Build a stamp, right-padding short rows with empty tiles.
fn stamp_from_rows(rows: &[Vec<String>]) -> Option<TileStamp> {
    let width = rows.iter().map(Vec::len).max()?;
    if width == 0 {
        return None;
    }
    let mut tiles = Vec::with_capacity(width * rows.len());
    for row in rows {
        tiles.extend(row.iter().map(|cell| SemanticTile::from_cell(cell)));
        tiles.extend(std::iter::repeat_n(SemanticTile::Empty, width - row.len()));
    }
    Some(TileStamp {
        width,
        height: rows.len(),
        tiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> SemanticTile {
        SemanticTile::Tag(s.to_string())
    }

    #[test]
    fn code_block_grid_is_row_major() {
        let text = "intro\n```\nterrain:a terrain:b 0\nterrain:c 0 terrain:d\n```\n";
        let stamp = decode_tile_grid(text).unwrap();
        assert_eq!((stamp.width, stamp.height), (3, 2));
        assert_eq!(stamp.tiles[0], tag("terrain:a"));
        assert_eq!(stamp.tiles[2], SemanticTile::Empty);
        assert_eq!(stamp.get(2, 1), Some(&tag("terrain:d")));
    }

    #[test]
    fn pipe_table_with_empty_header() {
        let text = "|   |   |\n|---|---|\n| a | 0 |\n|   | b |\n";
        let stamp = decode_tile_grid(text).unwrap();
        assert_eq!((stamp.width, stamp.height), (2, 2));
        assert_eq!(
            stamp.tiles,
            vec![tag("a"), SemanticTile::Empty, SemanticTile::Empty, tag("b")]
        );
    }

    #[test]
    fn short_rows_are_padded() {
        let text = "```\na b c\nd\n```";
        let stamp = decode_tile_grid(text).unwrap();
        assert_eq!(stamp.width, 3);
        assert_eq!(
            stamp.tiles[3..],
            [tag("d"), SemanticTile::Empty, SemanticTile::Empty]
        );
    }

    #[test]
    fn empty_code_block_falls_back_to_table() {
        let text = "```\n```\n| |\n|--|\n| x |\n";
        let stamp = decode_tile_grid(text).unwrap();
        assert_eq!(stamp.tiles, vec![tag("x")]);
    }

    #[test]
    fn nothing_to_decode() {
        assert_eq!(decode_tile_grid("just prose"), None);
    }

    #[test]
    fn tables_render_links_and_code() {
        let md = "| Item | Source |\n|------|--------|\n| `lantern` | [Mill](maps/mill.md) |\n| rope | shop |\n";
        let tables = parse_tables(md);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["Item", "Source"]);
        let records = tables[0].records();
        assert_eq!(records[0]["Item"], "`lantern`");
        assert_eq!(records[0]["Source"], "[Mill](maps/mill.md)");
        assert_eq!(tables[0].column("item"), Some(vec!["`lantern`", "rope"]));
    }
}
