/*!
 * Source path matching and destination path templates
 *
 * A `PathPattern` extracts named fields (sample, lane, mate, batch, ...)
 * from a discovered file path. A `DestTemplate` turns those fields plus the
 * built-in `filename` and `date` values into a remote path.
 */

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, SeqportError};

/// Default expression for matching FASTQ files
pub const DEFAULT_SRC_REGEX: &str = concat!(
    r"(.*/)?(?P<sample>.+?)",
    r"(?:_(?P<lane>L[0-9]+?))?",
    r"(?:_(?P<mate>R[0-9]+?))?",
    r"(?:_(?P<batch>[0-9]+?))?",
    r"\.f(?:ast)?q\.gz",
);

/// Default destination pattern below the destination root
pub const DEFAULT_DEST_PATTERN: &str = "{sample}/{date}/{filename}";

/// Placeholder names that are always available when rendering
pub const BUILTIN_FIELDS: [&str; 2] = ["filename", "date"];

/// Named captures of one path, in field-name order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    fields: BTreeMap<String, String>,
}

impl MatchResult {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MatchResult {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Compiled source expression.
///
/// The expression must match starting at the first character of the path;
/// trailing characters after the match are allowed.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
            SeqportError::InvalidPattern {
                pattern: pattern.to_string(),
                source: e,
            }
        })?;
        let names = regex
            .capture_names()
            .flatten()
            .map(str::to_string)
            .collect();

        Ok(Self {
            source: pattern.to_string(),
            regex,
            names,
        })
    }

    /// The expression as given by the user
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of all named capture groups
    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    /// Match a path; optional groups that did not participate become ""
    pub fn captures(&self, path: &str) -> Option<MatchResult> {
        let caps = self.regex.captures(path)?;
        Some(
            self.names
                .iter()
                .map(|name| {
                    let value = caps.name(name).map(|m| m.as_str()).unwrap_or("");
                    (name.clone(), value.to_string())
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// Values supplied by the planner rather than by the source expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateExtras {
    pub filename: String,
    pub date: String,
}

impl TemplateExtras {
    fn get(&self, name: &str) -> Option<&str> {
        match name {
            "filename" => Some(&self.filename),
            "date" => Some(&self.date),
            _ => None,
        }
    }
}

/// Destination pattern compiled into literal text and `{field}` placeholders.
///
/// `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestTemplate {
    template: String,
    segments: Vec<Segment>,
    fields: Vec<String>,
}

impl DestTemplate {
    pub fn compile(template: &str) -> Result<Self> {
        let syntax = |reason: &str| SeqportError::TemplateSyntax {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut fields: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(syntax("nested '{' in placeholder")),
                            Some(ch) => name.push(ch),
                            None => return Err(syntax("unterminated placeholder")),
                        }
                    }
                    if name.is_empty() {
                        return Err(syntax("empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    if !fields.contains(&name) {
                        fields.push(name.clone());
                    }
                    segments.push(Segment::Field(name));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(syntax("single '}' encountered")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
            fields,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of first appearance
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Fail if a placeholder can be filled neither by the expression nor by a built-in
    pub fn check_fields(&self, pattern: &PathPattern) -> Result<()> {
        let available: BTreeSet<&str> = pattern
            .field_names()
            .iter()
            .map(String::as_str)
            .chain(BUILTIN_FIELDS)
            .collect();

        match self.fields.iter().find(|f| !available.contains(f.as_str())) {
            Some(missing) => Err(self.missing_field(missing)),
            None => Ok(()),
        }
    }

    /// Keep only the captures this template refers to
    pub fn retain(&self, captures: MatchResult) -> MatchResult {
        captures
            .fields
            .into_iter()
            .filter(|(name, _)| self.fields.contains(name))
            .collect()
    }

    /// Substitute every placeholder from `fields` and `extra`; built-ins win on clashes
    pub fn render(&self, fields: &MatchResult, extra: &TemplateExtras) -> Result<String> {
        let mut out = String::with_capacity(self.template.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = extra
                        .get(name)
                        .or_else(|| fields.get(name))
                        .ok_or_else(|| self.missing_field(name))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    fn missing_field(&self, field: &str) -> SeqportError {
        SeqportError::TemplateField {
            field: field.to_string(),
            template: self.template.clone(),
        }
    }
}
