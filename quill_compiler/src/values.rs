//! Parsers for the small literal shapes embedded in prose and frontmatter.

use lazy_static::lazy_static;
use quill_data::MarkdownLink;
use regex::Regex;

lazy_static! {
    static ref COORD: Regex = Regex::new(r"\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)").expect("coord regex");
    static ref SIZE: Regex = Regex::new(r"^\s*(\d+)\s*[xX×]\s*(\d+)\s*$").expect("size regex");
    static ref LINK: Regex = Regex::new(r"\[([^\]]*)\]\(([^)#\s]*)(?:#([^)\s]*))?\)").expect("link regex");
    static ref RANGE: Regex = Regex::new(
        r"^\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)\s*(?:to|-|–|—|\.\.)\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)\s*$"
    )
    .expect("range regex");
}

/// Inclusive rectangle of tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordRange {
    pub from: (i32, i32),
    pub to: (i32, i32),
}

impl CoordRange {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (min_x, max_x) = (self.from.0.min(self.to.0), self.from.0.max(self.to.0));
        let (min_y, max_y) = (self.from.1.min(self.to.1), self.from.1.max(self.to.1));
        (min_x..=max_x).contains(&x) && (min_y..=max_y).contains(&y)
    }
}

/// Find the first `(x, y)` pair in `s`.
pub fn parse_coord(s: &str) -> Option<(i32, i32)> {
    let caps = COORD.captures(s)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Parse a `WxH` size such as `40x40` or `3 × 2`.
pub fn parse_size(s: &str) -> Option<(usize, usize)> {
    let caps = SIZE.captures(s)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Parse the first `[text](path#anchor)` link in `s`.
///
/// An empty path is not a resolvable link and yields `None`.
pub fn parse_markdown_link(s: &str) -> Option<MarkdownLink> {
    let caps = LINK.captures(s)?;
    let path = caps.get(2).map_or("", |m| m.as_str()).trim();
    if path.is_empty() {
        return None;
    }
    Some(MarkdownLink {
        text: caps[1].trim().to_string(),
        path: path.to_string(),
        anchor: caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .filter(|a| !a.is_empty()),
    })
}

/// Split a comma separated list, trimming entries and dropping blanks.
pub fn parse_comma_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `(x1, y1) to (x2, y2)`; `-`, dashes and `..` are accepted as separators.
pub fn parse_coord_range(s: &str) -> Option<CoordRange> {
    let caps = RANGE.captures(s)?;
    let n = |i: usize| caps[i].parse::<i32>().ok();
    Some(CoordRange {
        from: (n(1)?, n(2)?),
        to: (n(3)?, n(4)?),
    })
}
