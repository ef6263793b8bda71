//! Markdown rendering for schema titles, descriptions and example captions.
//!
//! Schema prose is written in Markdown with TeX math between `$` (inline)
//! or `$$` (display) delimiters.

use pulldown_cmark::{html, Event, Options, Parser};

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Render Markdown to an HTML fragment.
pub fn markdown_to_html(source: &str) -> String {
    let parser = Parser::new_ext(source, markdown_options()).map(|event| match event {
        // Raw HTML inside schema descriptions is shown, not interpreted
        Event::Html(text) | Event::InlineHtml(text) => Event::Text(text),
        other => other,
    });
    let mut output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Plain text of a Markdown fragment, used for page titles.
pub fn markdown_to_plain_text(source: &str) -> String {
    let mut text = String::new();
    for event in Parser::new_ext(source, markdown_options()) {
        match event {
            Event::Text(t) | Event::Code(t) | Event::InlineMath(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}
