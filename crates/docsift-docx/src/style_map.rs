//! User style-mapping rules for the HTML transform.
//!
//! A rule reads `<matcher> => <path>`:
//!
//! ```text
//! p[style-name='Clause Heading'] => h2.clause:fresh
//! r[style-name='Defined Term'] => strong.term
//! p.ListBullet => ul > li:fresh
//! b => em
//! u => !
//! ```
//!
//! `!` on a paragraph or run style drops the element and its content. On a
//! formatting matcher (`b`, `i`, `u`) it drops only the formatting and keeps
//! the text.

use once_cell::sync::Lazy;
use regex::Regex;

use docsift_core::DocxMessage;

static RULE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(.+?)\s*=>\s*(.*?)\s*$").unwrap());
static BY_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(p|r)\[style-name='([^']+)'\]$").unwrap());
static BY_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(p|r)\.([A-Za-z0-9_-]+)$").unwrap());
static ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z][a-z0-9]*)((?:\.[A-Za-z0-9_-]+)*)(:fresh)?$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSelector {
    Name(String),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Paragraph(StyleSelector),
    Run(StyleSelector),
    Bold,
    Italic,
    Underline,
}

/// One element of an HTML path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    pub tag: String,
    pub classes: Vec<String>,
    /// A fresh element is never merged with an identical open sibling.
    pub fresh: bool,
}

impl HtmlElement {
    pub fn new(tag: &str, fresh: bool) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            fresh,
        }
    }

    /// Same tag and classes, regardless of freshness.
    pub fn same_shape(&self, other: &HtmlElement) -> bool {
        self.tag == other.tag && self.classes == other.classes
    }
}

/// Where a matched element goes: a nested element path, or nowhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlPath {
    Elements(Vec<HtmlElement>),
    Ignore,
}

impl HtmlPath {
    pub fn single(tag: &str, fresh: bool) -> Self {
        HtmlPath::Elements(vec![HtmlElement::new(tag, fresh)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub matcher: Matcher,
    pub path: HtmlPath,
}

/// Parse one rule; `None` if it is not understood.
pub fn parse_rule(line: &str) -> Option<StyleRule> {
    let caps = RULE_RE.captures(line)?;
    let matcher = parse_matcher(caps.get(1)?.as_str())?;
    let path = parse_path(caps.get(2)?.as_str())?;
    Some(StyleRule { matcher, path })
}

fn parse_matcher(s: &str) -> Option<Matcher> {
    match s {
        "b" => return Some(Matcher::Bold),
        "i" => return Some(Matcher::Italic),
        "u" => return Some(Matcher::Underline),
        _ => {}
    }
    let (kind, selector) = if let Some(caps) = BY_NAME_RE.captures(s) {
        (caps.get(1)?.as_str(), StyleSelector::Name(caps.get(2)?.as_str().to_string()))
    } else if let Some(caps) = BY_ID_RE.captures(s) {
        (caps.get(1)?.as_str(), StyleSelector::Id(caps.get(2)?.as_str().to_string()))
    } else {
        return None;
    };
    match kind {
        "p" => Some(Matcher::Paragraph(selector)),
        _ => Some(Matcher::Run(selector)),
    }
}

fn parse_path(s: &str) -> Option<HtmlPath> {
    if s == "!" {
        return Some(HtmlPath::Ignore);
    }
    let mut elements = Vec::new();
    for part in s.split('>') {
        let caps = ELEMENT_RE.captures(part.trim())?;
        let classes = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .split('.')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        elements.push(HtmlElement {
            tag: caps.get(1)?.as_str().to_string(),
            classes,
            fresh: caps.get(3).is_some(),
        });
    }
    if elements.is_empty() {
        None
    } else {
        Some(HtmlPath::Elements(elements))
    }
}

/// Parsed user rules, first match wins.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    rules: Vec<StyleRule>,
}

impl StyleMap {
    /// Parse rule lines. Blank lines and `#` comments are skipped; rules that
    /// do not parse are reported as warnings and ignored.
    pub fn parse(lines: &[String]) -> (Self, Vec<DocxMessage>) {
        let mut rules = Vec::new();
        let mut messages = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_rule(trimmed) {
                Some(rule) => rules.push(rule),
                None => {
                    tracing::debug!(rule = trimmed, "ignoring unparseable style mapping");
                    messages.push(DocxMessage::warning(format!(
                        "Did not understand this style mapping, so ignored it: {}",
                        trimmed
                    )));
                }
            }
        }
        (Self { rules }, messages)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn paragraph(&self, style_id: &str, style_name: &str) -> Option<&HtmlPath> {
        self.rules.iter().find_map(|r| match &r.matcher {
            Matcher::Paragraph(sel) if selects(sel, style_id, style_name) => Some(&r.path),
            _ => None,
        })
    }

    pub fn run(&self, style_id: &str, style_name: &str) -> Option<&HtmlPath> {
        self.rules.iter().find_map(|r| match &r.matcher {
            Matcher::Run(sel) if selects(sel, style_id, style_name) => Some(&r.path),
            _ => None,
        })
    }

    pub fn formatting(&self, matcher: &Matcher) -> Option<&HtmlPath> {
        self.rules
            .iter()
            .find(|r| &r.matcher == matcher)
            .map(|r| &r.path)
    }
}

/// Style names compare case-insensitively, ids exactly.
fn selects(sel: &StyleSelector, style_id: &str, style_name: &str) -> bool {
    match sel {
        StyleSelector::Name(name) => name.eq_ignore_ascii_case(style_name),
        StyleSelector::Id(id) => id == style_id,
    }
}
