use regex::{Regex, RegexBuilder};
use std::fmt;
use tracing::debug;

use super::template::{classify, parse, CompileError, Segment, Template, TemplateKind};

const NAMED_PATTERN: &str = r"([^\s]+)";
const NUMBER_PATTERN: &str = r"([-+]?\d+(?:\.\d+)?)";
const SPLAT_PATTERN: &str = r"(.*?)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    String,
    Number,
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub kind: SlotKind,
}

/// Informational ranking of how specific a template is. Matching never
/// consults it; registration order decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PriorityClass {
    Pattern,
    Parameterized,
    Literal,
}

/// A value captured from a hypothesis and handed to command callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Number(f64),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Text(text) => Some(text),
            Arg::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Arg::Number(n) => Some(*n),
            Arg::Text(_) => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Text(text) => write!(f, "{}", text),
            Arg::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    source: String,
    kind: TemplateKind,
    slots: Vec<Slot>,
    regex: Regex,
}

impl CompiledMatcher {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn priority(&self) -> PriorityClass {
        match self.kind {
            TemplateKind::Plain | TemplateKind::OptionalSegment => PriorityClass::Literal,
            TemplateKind::Named | TemplateKind::Splat => PriorityClass::Parameterized,
            TemplateKind::Regex => PriorityClass::Pattern,
        }
    }

    /// Test the hypothesis and return the captured arguments in slot order.
    /// Blank text never matches a text template.
    pub fn captures(&self, hypothesis: &str) -> Option<Vec<Arg>> {
        if self.kind != TemplateKind::Regex && hypothesis.trim().is_empty() {
            return None;
        }
        let caps = self.regex.captures(hypothesis)?;

        let args = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let text = caps.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
                match slot.kind {
                    SlotKind::Number => text
                        .parse::<f64>()
                        .map(Arg::Number)
                        .unwrap_or_else(|_| Arg::Text(text.to_string())),
                    SlotKind::String | SlotKind::FreeText => Arg::Text(text.to_string()),
                }
            })
            .collect();

        Some(args)
    }
}

/// Compile a template into a matcher.
pub fn compile(template: &Template) -> Result<CompiledMatcher, CompileError> {
    match template {
        Template::Pattern(regex) => Ok(compile_pattern(regex)),
        Template::Text(text) => compile_text(text),
    }
}

fn compile_pattern(regex: &Regex) -> CompiledMatcher {
    let slots = regex
        .capture_names()
        .enumerate()
        .skip(1)
        .map(|(i, name)| Slot {
            name: name.map(str::to_string).unwrap_or_else(|| i.to_string()),
            kind: SlotKind::String,
        })
        .collect();

    CompiledMatcher {
        source: regex.as_str().to_string(),
        kind: TemplateKind::Regex,
        slots,
        regex: regex.clone(),
    }
}

fn compile_text(text: &str) -> Result<CompiledMatcher, CompileError> {
    let segments = parse(text)?;
    let pattern = build_pattern(&segments);

    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| CompileError::Pattern {
            template: text.to_string(),
            reason: e.to_string(),
        })?;

    let slots = segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Named(name) => Some(Slot {
                name: name.clone(),
                kind: SlotKind::String,
            }),
            Segment::Number(name) => Some(Slot {
                name: name.clone(),
                kind: SlotKind::Number,
            }),
            Segment::Splat(name) => Some(Slot {
                name: name.clone(),
                kind: SlotKind::FreeText,
            }),
            Segment::Literal(_) | Segment::Optional(_) => None,
        })
        .collect();

    debug!("Compiled '{}' into /{}/", text, pattern);

    Ok(CompiledMatcher {
        source: text.to_string(),
        kind: classify(&segments),
        slots,
        regex,
    })
}

fn segment_pattern(segment: &Segment) -> String {
    match segment {
        Segment::Literal(word) => regex::escape(word),
        Segment::Named(_) => NAMED_PATTERN.to_string(),
        Segment::Number(_) => NUMBER_PATTERN.to_string(),
        Segment::Splat(_) => SPLAT_PATTERN.to_string(),
        Segment::Optional(words) => words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join(r"\s+"),
    }
}

// Optional segments carry the separator on whichever side has a required
// neighbour, so "open (the) door" accepts both "open door" and
// "open the door".
fn build_pattern(segments: &[Segment]) -> String {
    let required_total = segments.iter().filter(|s| !s.is_optional()).count();
    let mut required_seen = 0;
    let mut pattern = String::from(r"^\s*");

    for segment in segments {
        let body = segment_pattern(segment);
        if segment.is_optional() {
            if required_seen > 0 {
                pattern.push_str(&format!(r"(?:\s+{})?", body));
            } else if required_seen < required_total {
                pattern.push_str(&format!(r"(?:{}\s+)?", body));
            } else {
                // No required neighbour: each word ends at a space or the end.
                pattern.push_str(&format!(r"(?:{}(?:\s+|$))?", body));
            }
        } else {
            if required_seen > 0 {
                pattern.push_str(r"\s+");
            }
            pattern.push_str(&body);
            required_seen += 1;
        }
    }

    pattern.push_str(r"\s*$");
    pattern
}
