use regex::Regex;
use std::fmt;
use thiserror::Error;

/// A command as written by the caller: either placeholder text or a
/// ready-made regular expression.
#[derive(Debug, Clone)]
pub enum Template {
    Text(String),
    Pattern(Regex),
}

impl Template {
    /// The text used to identify this template in the registry.
    pub fn source(&self) -> &str {
        match self {
            Template::Text(text) => text,
            Template::Pattern(regex) => regex.as_str(),
        }
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Template::Text(text.to_string())
    }
}

impl From<String> for Template {
    fn from(text: String) -> Self {
        Template::Text(text)
    }
}

impl From<Regex> for Template {
    fn from(regex: Regex) -> Self {
        Template::Pattern(regex)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Plain,
    Named,
    Splat,
    Regex,
    OptionalSegment,
}

/// One parsed element of a text template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `:name`, a single non-space token.
    Named(String),
    /// `#name`, a numeric token.
    Number(String),
    /// `*name`, free text up to the next literal.
    Splat(String),
    /// `(words)`, zero or one occurrence.
    Optional(Vec<String>),
}

impl Segment {
    pub fn is_optional(&self) -> bool {
        matches!(self, Segment::Optional(_))
    }

    pub fn is_capture(&self) -> bool {
        matches!(
            self,
            Segment::Named(_) | Segment::Number(_) | Segment::Splat(_)
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("template is empty")]
    Empty,

    #[error("unterminated optional segment starting at byte {offset} in '{template}'")]
    UnterminatedOptional { template: String, offset: usize },

    #[error("unexpected ')' at byte {offset} in '{template}'")]
    UnexpectedClose { template: String, offset: usize },

    #[error("nested optional segment at byte {offset} in '{template}'")]
    NestedOptional { template: String, offset: usize },

    #[error("empty optional segment at byte {offset} in '{template}'")]
    EmptyOptional { template: String, offset: usize },

    #[error("invalid placeholder '{token}' in '{template}'")]
    InvalidPlaceholder { template: String, token: String },

    #[error("placeholder '{token}' is not allowed inside an optional segment in '{template}'")]
    PlaceholderInOptional { template: String, token: String },

    #[error("failed to build pattern for '{template}': {reason}")]
    Pattern { template: String, reason: String },
}

const PLACEHOLDER_SIGILS: [char; 3] = [':', '#', '*'];

struct Parser<'a> {
    template: &'a str,
    segments: Vec<Segment>,
    word: String,
    group: Option<(usize, Vec<String>)>,
}

impl<'a> Parser<'a> {
    fn new(template: &'a str) -> Self {
        Self {
            template,
            segments: Vec::new(),
            word: String::new(),
            group: None,
        }
    }

    fn flush_word(&mut self) -> Result<(), CompileError> {
        if self.word.is_empty() {
            return Ok(());
        }
        let word = std::mem::take(&mut self.word);

        if let Some((_, words)) = self.group.as_mut() {
            if word.starts_with(&PLACEHOLDER_SIGILS[..]) {
                return Err(CompileError::PlaceholderInOptional {
                    template: self.template.to_string(),
                    token: word,
                });
            }
            words.push(word);
            return Ok(());
        }

        let segment = match word.chars().next() {
            Some(sigil) if PLACEHOLDER_SIGILS.contains(&sigil) => {
                let name = &word[sigil.len_utf8()..];
                if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return Err(CompileError::InvalidPlaceholder {
                        template: self.template.to_string(),
                        token: word,
                    });
                }
                match sigil {
                    ':' => Segment::Named(name.to_string()),
                    '#' => Segment::Number(name.to_string()),
                    _ => Segment::Splat(name.to_string()),
                }
            }
            _ => Segment::Literal(word),
        };
        self.segments.push(segment);
        Ok(())
    }

    fn open(&mut self, offset: usize) -> Result<(), CompileError> {
        if self.group.is_some() {
            return Err(CompileError::NestedOptional {
                template: self.template.to_string(),
                offset,
            });
        }
        self.flush_word()?;
        self.group = Some((offset, Vec::new()));
        Ok(())
    }

    fn close(&mut self, offset: usize) -> Result<(), CompileError> {
        if self.group.is_none() {
            return Err(CompileError::UnexpectedClose {
                template: self.template.to_string(),
                offset,
            });
        }
        self.flush_word()?;
        if let Some((start, words)) = self.group.take() {
            if words.is_empty() {
                return Err(CompileError::EmptyOptional {
                    template: self.template.to_string(),
                    offset: start,
                });
            }
            self.segments.push(Segment::Optional(words));
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Segment>, CompileError> {
        self.flush_word()?;
        if let Some((offset, _)) = self.group {
            return Err(CompileError::UnterminatedOptional {
                template: self.template.to_string(),
                offset,
            });
        }
        if self.segments.is_empty() {
            return Err(CompileError::Empty);
        }
        Ok(self.segments)
    }
}

/// Split a text template into segments.
pub fn parse(template: &str) -> Result<Vec<Segment>, CompileError> {
    let mut parser = Parser::new(template);

    for (offset, c) in template.char_indices() {
        match c {
            '(' => parser.open(offset)?,
            ')' => parser.close(offset)?,
            c if c.is_whitespace() => parser.flush_word()?,
            c => parser.word.push(c),
        }
    }

    parser.finish()
}

pub(crate) fn classify(segments: &[Segment]) -> TemplateKind {
    if segments.iter().any(|s| matches!(s, Segment::Splat(_))) {
        TemplateKind::Splat
    } else if segments.iter().any(Segment::is_capture) {
        TemplateKind::Named
    } else if segments.iter().any(Segment::is_optional) {
        TemplateKind::OptionalSegment
    } else {
        TemplateKind::Plain
    }
}
