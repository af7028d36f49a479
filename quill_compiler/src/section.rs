//! Heading-aware slicing of Markdown bodies.
//!
//! Two matchers live here: an exact matcher (normalized, case-insensitive,
//! optionally level-checked) used for the fixed section names of catalog
//! files, and a four-tier fuzzy matcher for headings that authors may have
//! reworded since a link to them was written.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING: Regex = Regex::new(r"^\s{0,3}(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("heading regex");
}

/// An ATX heading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'a> {
    pub level: usize,
    pub text: &'a str,
}

pub fn parse_heading(line: &str) -> Option<Heading<'_>> {
    let caps = HEADING.captures(line)?;
    Some(Heading {
        level: caps.get(1)?.as_str().len(),
        text: caps.get(2)?.as_str(),
    })
}

/// Lowercase, drop everything but alphanumerics and whitespace, collapse whitespace.
pub fn normalize_heading(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Line scanner that knows when it is inside a fenced code block.
///
/// `#` lines inside a fence are content, not headings.
#[derive(Debug, Default)]
struct FenceTracker {
    in_fence: bool,
}

impl FenceTracker {
    fn heading<'a>(&mut self, line: &'a str) -> Option<Heading<'a>> {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            self.in_fence = !self.in_fence;
            return None;
        }
        if self.in_fence { None } else { parse_heading(line) }
    }
}

/// Every heading in `body` with its 0-based line index.
pub fn headings(body: &str) -> Vec<(usize, Heading<'_>)> {
    let mut fences = FenceTracker::default();
    body.lines()
        .enumerate()
        .filter_map(|(idx, line)| fences.heading(line).map(|h| (idx, h)))
        .collect()
}

/// Text under the heading whose normalized text equals `heading`.
///
/// When `level` is given only headings of exactly that level match, so a
/// `### Objects` layer never satisfies a lookup for `## Objects`. Capture
/// starts on the line after the heading and stops before the next heading of
/// the same or a higher level. Returns `None` if no heading matched.
pub fn extract_section(body: &str, heading: &str, level: Option<usize>) -> Option<String> {
    let target = normalize_heading(heading);
    let mut fences = FenceTracker::default();
    let mut matched_level: Option<usize> = None;
    let mut captured = Vec::new();

    for line in body.lines() {
        let found = fences.heading(line);
        match matched_level {
            None => {
                if let Some(h) = found {
                    if level.is_none_or(|l| l == h.level) && normalize_heading(h.text) == target {
                        matched_level = Some(h.level);
                    }
                }
            },
            Some(matched) => {
                if found.is_some_and(|h| h.level <= matched) {
                    break;
                }
                captured.push(line);
            },
        }
    }

    matched_level.map(|_| captured.join("\n"))
}

/// `extract_section` restricted to level-2 headings.
pub fn extract_level2_section(body: &str, heading: &str) -> Option<String> {
    extract_section(body, heading, Some(2))
}

/// Which tier of the fuzzy matcher produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Substring,
    AllKeywords,
    KeywordOverlap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingMatch {
    /// Index into the candidate list.
    pub index: usize,
    pub tier: MatchTier,
}

const MIN_KEYWORD_LEN: usize = 3;
const OVERLAP_THRESHOLD: f64 = 0.75;

/// Pick the candidate heading that best matches `target`.
///
/// Tiers are tried in order and the first tier with a hit wins:
/// exact normalized text, heading contains the target (targets of three or
/// more characters), heading contains every significant target word, and
/// finally at least 75% of significant words present with the highest count
/// winning.
pub fn find_best_heading_match<S: AsRef<str>>(candidates: &[S], target: &str) -> Option<HeadingMatch> {
    let target = normalize_heading(target);
    if target.is_empty() {
        return None;
    }
    let normalized: Vec<String> = candidates.iter().map(|c| normalize_heading(c.as_ref())).collect();
    let hit = |index: usize, tier: MatchTier| Some(HeadingMatch { index, tier });

    if let Some(index) = normalized.iter().position(|h| *h == target) {
        return hit(index, MatchTier::Exact);
    }

    if target.chars().count() >= MIN_KEYWORD_LEN {
        if let Some(index) = normalized.iter().position(|h| h.contains(&target)) {
            return hit(index, MatchTier::Substring);
        }
    }

    let keywords: Vec<&str> = target
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .collect();
    if keywords.is_empty() {
        return None;
    }

    if let Some(index) = normalized
        .iter()
        .position(|h| keywords.iter().all(|w| h.contains(w)))
    {
        return hit(index, MatchTier::AllKeywords);
    }

    let mut best: Option<(usize, usize)> = None;
    for (index, heading) in normalized.iter().enumerate() {
        let count = keywords.iter().filter(|w| heading.contains(*w)).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = count as f64 / keywords.len() as f64;
        if ratio >= OVERLAP_THRESHOLD && best.is_none_or(|(_, c)| count > c) {
            best = Some((index, count));
        }
    }
    best.and_then(|(index, _)| hit(index, MatchTier::KeywordOverlap))
}

/// Text under the heading that best fuzzily matches `target`.
pub fn extract_section_fuzzy(body: &str, target: &str) -> Option<String> {
    let found = headings(body);
    let texts: Vec<&str> = found.iter().map(|(_, h)| h.text).collect();
    let best = find_best_heading_match(&texts, target)?;
    let (start, heading) = found[best.index];

    let end = found
        .iter()
        .skip(best.index + 1)
        .find(|(_, h)| h.level <= heading.level)
        .map(|(line, _)| *line);

    let lines: Vec<&str> = body.lines().collect();
    let end = end.unwrap_or(lines.len());
    Some(lines[start + 1..end].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_BODY: &str = "# Well\n\nA stone well.\n\n## Layers\n\n### ground\n\n```\na b\n```\n\n### objects\n\n| |\n|---|\n| x |\n\n## Collision\n\n```\n1 1\n```\n\n## Objects\n\n- **bucket**: position (0, 0), type: decoration\n";

    #[test]
    fn heading_parsing() {
        assert_eq!(
            parse_heading("## Scene 1: Dawn"),
            Some(Heading {
                level: 2,
                text: "Scene 1: Dawn"
            })
        );
        assert_eq!(parse_heading("### objects ###").map(|h| h.text), Some("objects"));
        assert_eq!(parse_heading("#hashtag"), None);
        assert_eq!(parse_heading("plain"), None);
    }

    #[test]
    fn normalization_strips_punctuation() {
        assert_eq!(normalize_heading("  Scene 1:  The  Mill! "), "scene 1 the mill");
    }

    #[test]
    fn level2_lookup_ignores_nested_layer_with_same_name() {
        let objects = extract_level2_section(CATALOG_BODY, "Objects").unwrap();
        assert!(objects.contains("**bucket**"));
        assert!(!objects.contains("| x |"));
    }

    #[test]
    fn section_stops_at_same_level_heading() {
        let layers = extract_level2_section(CATALOG_BODY, "layers").unwrap();
        assert!(layers.contains("### ground"));
        assert!(layers.contains("### objects"));
        assert!(!layers.contains("1 1"));
    }

    #[test]
    fn missing_section_is_none() {
        assert_eq!(extract_level2_section(CATALOG_BODY, "Anchors"), None);
    }

    #[test]
    fn fenced_hash_lines_are_not_headings() {
        let body = "## Notes\n```\n# not a heading\n```\nafter\n## Next\n";
        let notes = extract_section(body, "Notes", None).unwrap();
        assert!(notes.contains("# not a heading"));
        assert!(notes.contains("after"));
    }

    #[test]
    fn fuzzy_tiers_in_order() {
        let headings = [
            "Scene 2: The Old Mill",
            "Narrative Context",
            "Player Actions and Choices",
            "Rewards",
        ];
        let m = find_best_heading_match(&headings, "narrative context").unwrap();
        assert_eq!((m.index, m.tier), (1, MatchTier::Exact));

        let m = find_best_heading_match(&headings, "old mill").unwrap();
        assert_eq!((m.index, m.tier), (0, MatchTier::Substring));

        let m = find_best_heading_match(&headings, "choices player").unwrap();
        assert_eq!((m.index, m.tier), (2, MatchTier::AllKeywords));

        let m = find_best_heading_match(&headings, "player actions choices extra").unwrap();
        assert_eq!((m.index, m.tier), (2, MatchTier::KeywordOverlap));

        assert_eq!(find_best_heading_match(&headings, "treasure maps"), None);
    }

    #[test]
    fn keyword_overlap_prefers_more_matches() {
        let headings = [
            "Old Mill River Bridge Night Market",
            "Old Mill River Bridge Night Market Lantern",
        ];
        let m = find_best_heading_match(&headings, "old mill river bridge night market lantern fair").unwrap();
        assert_eq!((m.index, m.tier), (1, MatchTier::KeywordOverlap));
    }

    #[test]
    fn fuzzy_slice_uses_matched_level() {
        let body = "## Scene 1: Dawn\ntext\n### Narrative Context\ncontext line\n### Rewards\nr\n## Scene 2: Dusk\n";
        let slice = extract_section_fuzzy(body, "scene 1 dawn").unwrap();
        assert!(slice.contains("context line"));
        assert!(slice.contains("### Rewards"));
        assert!(!slice.contains("Dusk"));

        let slice = extract_section_fuzzy(body, "narrative context").unwrap();
        assert_eq!(slice, "context line");
    }
}
