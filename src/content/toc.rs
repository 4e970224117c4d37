//! Heading anchors and table of contents

use lazy_static::lazy_static;
use pulldown_cmark::{CowStr, Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::markdown::parser_options;

lazy_static! {
    static ref NON_ANCHOR_CHARS: Regex =
        Regex::new(r"[^a-z0-9\x{4E00}-\x{9FFF}]").expect("valid anchor regex");
    static ref DASH_RUNS: Regex = Regex::new(r"-+").expect("valid dash regex");
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("valid tag regex");
}

/// One entry of a post's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Anchor id for the `index`-th heading of a document (zero based, counted
/// across all levels)
pub fn heading_id(text: &str, index: usize) -> String {
    let lowered = text.to_lowercase();
    let dashed = NON_ANCHOR_CHARS.replace_all(&lowered, "-");
    let collapsed = DASH_RUNS.replace_all(&dashed, "-");
    format!("heading-{}-{}", index, collapsed.trim_matches('-'))
}

/// Table of contents for a markdown body, in document order
pub fn extract_headings(markdown: &str) -> Vec<Heading> {
    let events: Vec<Event> = Parser::new_ext(markdown, parser_options()).collect();
    scan_headings(&events)
        .into_iter()
        .enumerate()
        .map(|(index, (_, level, text))| Heading {
            id: heading_id(&text, index),
            level: level as u8,
            text,
        })
        .collect()
}

/// Give every heading without an explicit id the same anchor
/// [`extract_headings`] reports for it
pub(crate) fn assign_heading_ids(events: &mut [Event<'_>]) {
    for (index, (pos, _, text)) in scan_headings(events).into_iter().enumerate() {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[pos] {
            if id.is_none() {
                *id = Some(CowStr::from(heading_id(&text, index)));
            }
        }
    }
}

/// (position of the start event, level, plain text) for every heading
fn scan_headings(events: &[Event<'_>]) -> Vec<(usize, HeadingLevel, String)> {
    let mut found = Vec::new();
    let mut current: Option<(usize, HeadingLevel, String)> = None;

    for (pos, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((pos, *level, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    found.push(heading);
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push_str(text);
                }
            }
            Event::InlineHtml(html) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push_str(&HTML_TAG.replace_all(html, ""));
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }

    found
}
