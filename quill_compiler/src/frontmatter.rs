//! Leading `---` YAML block extraction.
//!
//! Authors write Markdown links as plain YAML values (`ref: [door](door.md)`),
//! which a YAML parser would read as a flow sequence. The block is sanitized
//! before parsing so those values arrive as strings.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};

lazy_static! {
    static ref LINK_VALUE: Regex =
        Regex::new(r"(?m)(:[ \t]+)(\[[^\]\r\n]*\]\([^)\r\n]*\))[ \t]*(\r?)$").expect("link value regex");
}

/// Malformed frontmatter. This is the only fatal condition in a document parse.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("invalid YAML frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parsed frontmatter (if any) and the remaining document body.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<'a> {
    pub frontmatter: Option<Mapping>,
    pub body: &'a str,
}

/// Split `text` into frontmatter and body.
///
/// Missing opening or closing delimiters mean "no frontmatter" and the whole
/// text is returned as body. A block that parses to null, a scalar, or a
/// sequence yields an empty mapping.
///
/// # Errors
/// Returns `FrontmatterError::Yaml` when the block is not valid YAML.
pub fn extract_frontmatter(text: &str) -> Result<Extracted<'_>, FrontmatterError> {
    let no_frontmatter = Extracted {
        frontmatter: None,
        body: text,
    };
    let trimmed = text.trim_start();
    if !trimmed.starts_with("---") {
        return Ok(no_frontmatter);
    }
    let Some(first_newline) = trimmed.find('\n') else {
        return Ok(no_frontmatter);
    };
    let block_start = first_newline + 1;

    let mut offset = block_start;
    let mut block_end = None;
    for line in trimmed[block_start..].split_inclusive('\n') {
        if line.trim_end() == "---" {
            block_end = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let Some((end, body_start)) = block_end else {
        return Ok(no_frontmatter);
    };

    let block = sanitize_links(&trimmed[block_start..end]);
    if block.trim().is_empty() {
        return Ok(Extracted {
            frontmatter: Some(Mapping::new()),
            body: &trimmed[body_start..],
        });
    }
    let parsed: Value = serde_yaml::from_str(&block)?;
    let mapping = match parsed {
        Value::Mapping(map) => map,
        _ => Mapping::new(),
    };
    Ok(Extracted {
        frontmatter: Some(mapping),
        body: &trimmed[body_start..],
    })
}

/// Quote `key: [text](path)` values so YAML reads them as strings.
pub fn sanitize_links(block: &str) -> String {
    LINK_VALUE
        .replace_all(block, |caps: &Captures<'_>| {
            format!("{}\"{}\"{}", &caps[1], caps[2].replace('"', "\\\""), &caps[3])
        })
        .into_owned()
}

/// String value of `key`, if present and scalar.
pub fn str_field(map: &Mapping, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Sequence value of `key`, if present.
pub fn seq_field<'m>(map: &'m Mapping, key: &str) -> Option<&'m Vec<Value>> {
    map.get(key)?.as_sequence()
}

/// Read a two-element integer pair such as `[3, 4]`.
pub fn int_pair(value: &Value) -> Option<(i64, i64)> {
    match value.as_sequence()?.as_slice() {
        [a, b] => Some((a.as_i64()?, b.as_i64()?)),
        _ => None,
    }
}
