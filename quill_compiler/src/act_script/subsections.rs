//! Content pulled from a scene's `###` subsections.

use lazy_static::lazy_static;
use regex::Regex;

use super::effects::item_id;
use crate::table::parse_tables;

lazy_static! {
    static ref LIST_ITEM: Regex = Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.+)$").expect("list item regex");
}

const SUMMARY_LIMIT: usize = 200;

/// First paragraph of `text`, joined onto one line.
pub fn first_paragraph(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty())
        .collect();
    if lines.is_empty() { None } else { Some(lines.join(" ")) }
}

/// Cap `text` at 200 characters, ending in `...` when cut.
pub fn truncate_summary(text: &str) -> String {
    if text.chars().count() <= SUMMARY_LIMIT {
        return text.to_string();
    }
    let kept: String = text.chars().take(SUMMARY_LIMIT - 3).collect();
    format!("{}...", kept.trim_end())
}

/// Text of every list item in `section`.
pub fn list_items(section: &str) -> Vec<String> {
    section
        .lines()
        .filter_map(|line| LIST_ITEM.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// First content line of a section, list marker removed.
pub fn first_line(section: &str) -> Option<String> {
    let line = section.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = LIST_ITEM
        .captures(line)
        .map_or_else(|| line.to_string(), |caps| caps[1].trim().to_string());
    Some(line)
}

/// Item ids from the `Item` column of any table in a rewards section.
pub fn reward_items(section: &str) -> Vec<String> {
    parse_tables(section)
        .iter()
        .filter_map(|table| table.column("Item"))
        .flatten()
        .map(item_id)
        .filter(|id| !id.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_and_truncation() {
        let text = "\n\nThe mill wheel\nhas stopped.\n\nSecond.";
        assert_eq!(first_paragraph(text).as_deref(), Some("The mill wheel has stopped."));
        assert_eq!(first_paragraph("  \n"), None);

        let long = "a".repeat(250);
        let cut = truncate_summary(&long);
        assert_eq!(cut.chars().count(), 200);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_summary("short"), "short");
    }

    #[test]
    fn list_items_and_first_line() {
        let section = "Intro line\n- Walk to the well\n* Talk to Brann\n1. Ring the bell\n";
        assert_eq!(list_items(section), vec!["Walk to the well", "Talk to Brann", "Ring the bell"]);
        assert_eq!(first_line("\n- Movement with arrow keys\n").as_deref(), Some("Movement with arrow keys"));
    }

    #[test]
    fn rewards_table_items() {
        let section = "| Item | Qty |\n|------|-----|\n| `herb.sage` | 2 |\n| Copper Key | 1 |\n";
        assert_eq!(reward_items(section), vec!["herb.sage", "copper-key"]);
    }
}
