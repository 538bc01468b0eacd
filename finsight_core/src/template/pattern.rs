//! Compilation of template phrases into anchored regular expressions.
//!
//! Literal text is escaped and every `{keyword}` occurrence becomes a lazy
//! positional group `(.*?)`. The `regex` crate rejects duplicate group names
//! and most punctuation in names, so groups stay unnamed and a side table maps
//! each group index back to its keyword.
//!
//! A keyword repeated within one phrase must capture the same text at every
//! occurrence. The regex engine has no backreferences, so when its leftmost
//! lazy match binds a repeated keyword inconsistently, a backtracking search
//! over the phrase segments looks for the first consistent split instead.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use super::catalogue::placeholder_pattern;
use super::{Bindings, TemplateError, TemplateRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Index into `CompiledTemplate::keywords`.
    Slot(usize),
}

/// A template record with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    record: TemplateRecord,
    regex: Regex,
    segments: Vec<Segment>,
    /// Distinct keywords in order of first occurrence.
    keywords: Vec<String>,
    /// Keyword index of capture group `i + 1`.
    groups: Vec<usize>,
    /// For each segment index, the keywords used by `segments[i..]`.
    live: Vec<Vec<usize>>,
}

impl CompiledTemplate {
    /// Compile a record.
    ///
    /// # Errors
    /// Returns `EmptyPlaceholder` for a `{}` placeholder, or `Regex` if the
    /// generated pattern is rejected by the regex engine (e.g. size limits).
    pub fn compile(record: TemplateRecord) -> Result<Self, TemplateError> {
        let phrase = record.phrase.as_str();
        let mut pattern = String::with_capacity(phrase.len() * 2 + 2);
        let mut segments = Vec::new();
        let mut keywords: Vec<String> = Vec::new();
        let mut groups = Vec::new();
        let mut literal_start = 0;

        pattern.push('^');
        for caps in placeholder_pattern().captures_iter(phrase) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder {
                    template_id: record.id,
                });
            }

            push_literal(
                &mut pattern,
                &mut segments,
                &phrase[literal_start..whole.start()],
            );

            let index = keywords.iter().position(|k| k == name).unwrap_or_else(|| {
                keywords.push(name.to_string());
                keywords.len() - 1
            });
            pattern.push_str("(.*?)");
            segments.push(Segment::Slot(index));
            groups.push(index);
            literal_start = whole.end();
        }
        push_literal(&mut pattern, &mut segments, &phrase[literal_start..]);
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|source| TemplateError::Regex {
            template_id: record.id.clone(),
            source,
        })?;

        debug!(
            "Compiled template '{}': {} keywords, {} capture groups",
            record.id,
            keywords.len(),
            groups.len()
        );

        let live = live_keywords(&segments, keywords.len());

        Ok(Self {
            record,
            regex,
            segments,
            keywords,
            groups,
            live,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.record.id
    }

    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.record.phrase
    }

    #[must_use]
    pub const fn record(&self) -> &TemplateRecord {
        &self.record
    }

    /// The generated regular expression.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Distinct keywords in order of first occurrence.
    #[must_use]
    pub fn keywords(&self) -> Vec<&str> {
        self.keywords.iter().map(String::as_str).collect()
    }

    /// Whether some keyword occurs more than once in the phrase.
    #[must_use]
    pub fn has_repeated_keywords(&self) -> bool {
        self.groups.len() > self.keywords.len()
    }

    /// Match the whole `line` and collect the keyword bindings.
    ///
    /// Returns `None` if the line does not have the phrase's shape, or if no
    /// split of the line binds every repeated keyword to a single value.
    #[must_use]
    pub fn captures(&self, line: &str) -> Option<Bindings> {
        let caps = self.regex.captures(line)?;

        let mut values: Vec<Option<&str>> = vec![None; self.keywords.len()];
        let mut consistent = true;
        for (i, &keyword) in self.groups.iter().enumerate() {
            let value = caps.get(i + 1).map_or("", |m| m.as_str());
            match values[keyword] {
                Some(bound) if bound != value => {
                    consistent = false;
                    break;
                }
                Some(_) => {}
                None => values[keyword] = Some(value),
            }
        }

        if !consistent {
            debug!(
                "Template '{}': repeated keyword bound inconsistently, searching for a consistent split",
                self.record.id
            );
            let mut search = Search::new(self, line);
            if !search.run(0, 0) {
                return None;
            }
            values = search
                .spans
                .iter()
                .map(|span| span.map(|(start, end)| &line[start..end]))
                .collect();
        }

        Some(
            self.keywords
                .iter()
                .zip(values)
                .map(|(keyword, value)| (keyword.clone(), value.unwrap_or_default().to_string()))
                .collect(),
        )
    }
}

/// Byte range of a bound value within the line.
type Span = (usize, usize);

/// Backtracking match of the phrase segments against one line.
///
/// Unbound slots try the shortest value first, never crossing a newline;
/// bound slots must repeat their value verbatim. A failed state depends only
/// on the segment, the position and the spans of keywords still used later,
/// so failures are remembered and never explored twice.
struct Search<'a> {
    template: &'a CompiledTemplate,
    line: &'a str,
    spans: Vec<Option<Span>>,
    failed: HashSet<(usize, usize, Vec<Option<Span>>)>,
}

impl<'a> Search<'a> {
    fn new(template: &'a CompiledTemplate, line: &'a str) -> Self {
        Self {
            template,
            line,
            spans: vec![None; template.keywords.len()],
            failed: HashSet::new(),
        }
    }

    /// Match `segments[seg..]` against `line[pos..]`. On success `spans` holds
    /// the first consistent assignment in lazy order.
    fn run(&mut self, seg: usize, pos: usize) -> bool {
        let template = self.template;
        let line = self.line;
        let Some(segment) = template.segments.get(seg) else {
            return pos == line.len();
        };
        let rest = &line[pos..];

        match segment {
            Segment::Literal(text) => {
                rest.starts_with(text.as_str()) && self.run(seg + 1, pos + text.len())
            }
            Segment::Slot(keyword) => {
                if let Some((start, end)) = self.spans[*keyword] {
                    let bound = &line[start..end];
                    return rest.starts_with(bound) && self.run(seg + 1, pos + bound.len());
                }

                let state = (seg, pos, self.live_spans(seg));
                if self.failed.contains(&state) {
                    return false;
                }

                let next_literal = match template.segments.get(seg + 1) {
                    Some(Segment::Literal(text)) => Some(text.as_str()),
                    _ => None,
                };
                let limit = rest.find('\n').unwrap_or(rest.len());
                let ends = rest[..limit]
                    .char_indices()
                    .map(|(i, _)| i)
                    .chain(std::iter::once(limit));
                for end in ends {
                    if next_literal.is_some_and(|text| !rest[end..].starts_with(text)) {
                        continue;
                    }
                    self.spans[*keyword] = Some((pos, pos + end));
                    if self.run(seg + 1, pos + end) {
                        return true;
                    }
                }

                self.spans[*keyword] = None;
                self.failed.insert(state);
                false
            }
        }
    }

    fn live_spans(&self, seg: usize) -> Vec<Option<Span>> {
        self.template.live[seg]
            .iter()
            .map(|&keyword| self.spans[keyword])
            .collect()
    }
}

/// Keywords used by each suffix of `segments`, plus an empty entry for the end.
fn live_keywords(segments: &[Segment], keyword_count: usize) -> Vec<Vec<usize>> {
    let mut used = vec![false; keyword_count];
    let mut live = vec![Vec::new(); segments.len() + 1];
    for (i, segment) in segments.iter().enumerate().rev() {
        if let Segment::Slot(keyword) = segment {
            used[*keyword] = true;
        }
        live[i] = (0..keyword_count).filter(|&k| used[k]).collect();
    }
    live
}

fn push_literal(pattern: &mut String, segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        pattern.push_str(&regex::escape(text));
        segments.push(Segment::Literal(text.to_string()));
    }
}
