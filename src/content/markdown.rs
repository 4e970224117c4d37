//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::toc::{self, Heading};
use crate::config::RenderConfig;

/// Extensions shared by rendering and heading extraction, so both see the
/// same document structure
pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

/// A rendered post body together with its table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub headings: Vec<Heading>,
}

/// Markdown renderer with syntax highlighting
///
/// Raw HTML in the source is passed through untouched: posts are written by
/// the site owner and rendered output is trusted.
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
    heading_ids: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::from_config(&RenderConfig::default())
    }

    /// Create with the rendering section of the site config
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.highlight_theme.clone(),
            highlight: config.highlight,
            line_numbers: config.line_numbers,
            heading_ids: config.heading_ids,
        }
    }

    /// Render a post body and collect its headings
    pub fn render_document(&self, markdown: &str) -> Rendered {
        Rendered {
            html: self.render(markdown),
            headings: toc::extract_headings(markdown),
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, parser_options());

        let mut events: Vec<Event> = Vec::new();
        // (language, accumulated source) of the fenced block being highlighted
        let mut code_block: Option<(String, String)> = None;

        for event in parser {
            if let Some((_, code)) = code_block.as_mut() {
                if let Event::Text(text) = &event {
                    code.push_str(text);
                }
                if let Event::End(TagEnd::CodeBlock) = event {
                    if let Some((lang, code)) = code_block.take() {
                        let highlighted = self.highlight_code(&code, &lang);
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                continue;
            }

            let lang = match &event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) if self.highlight => {
                    fence_language(info).map(str::to_string)
                }
                _ => None,
            };
            match lang {
                Some(lang) => code_block = Some((lang, String::new())),
                None => events.push(event),
            }
        }

        if self.heading_ids {
            toc::assign_heading_ids(&mut events);
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang));

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = match (syntax, theme) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
            }
            _ => None,
        };

        match highlighted {
            Some(highlighted) if self.line_numbers => {
                add_line_numbers(&highlighted, code.lines().count(), lang)
            }
            Some(highlighted) => format!(
                "<figure class=\"highlight {}\">{}</figure>\n",
                lang, highlighted
            ),
            None => format!(
                "<pre><code class=\"language-{}\">{}</code></pre>\n",
                lang,
                html_escape(code)
            ),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap highlighted code in a table with a line-number gutter
fn add_line_numbers(highlighted: &str, line_count: usize, lang: &str) -> String {
    let gutter = (1..=line_count)
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<figure class=\"highlight {}\"><table><tr><td class=\"gutter\"><pre>{}</pre></td><td class=\"code\">{}</td></tr></table></figure>\n",
        lang, gutter, highlighted
    )
}

/// First token of a fence info string: "rust,ignore" and "rust title=x" both
/// give "rust"
fn fence_language(info: &str) -> Option<&str> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|lang| !lang.is_empty())
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
