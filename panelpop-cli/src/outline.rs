//! Plain text outline of a panel and its content tree.

use panelpop::content::markup::{self, Span};
use panelpop::content::{BlockData, ContentDocument, ListData, ListItem, ListStyle};
use panelpop::protocol::{Panel, PanelButton};
use std::fmt::Write;

pub fn render_panel(panel: &Panel, document: &ContentDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", panel.name, panel.token);
    let _ = writeln!(out, "updated {}", panel.last_updated);
    out.push('\n');
    out.push_str(&render_document(document));

    let buttons = panel
        .primary_variant()
        .map(|variant| variant.buttons.as_slice())
        .unwrap_or_default();
    if !buttons.is_empty() {
        out.push('\n');
        let rendered: Vec<String> = buttons.iter().map(render_button).collect();
        let _ = writeln!(out, "{}", rendered.join(" "));
    }

    out
}

pub fn render_document(document: &ContentDocument) -> String {
    if document.is_empty() {
        return "(no content)\n".to_string();
    }

    let mut out = String::new();
    for block in &document.blocks {
        match &block.data {
            BlockData::Paragraph(p) => {
                let _ = writeln!(out, "{}", render_inline(p.text.as_deref().unwrap_or_default()));
            }
            BlockData::Header(h) => {
                let level = h.level.unwrap_or(2).clamp(1, 6) as usize;
                let _ = writeln!(
                    out,
                    "{} {}",
                    "#".repeat(level),
                    markup::plain_text(h.text.as_deref().unwrap_or_default())
                );
            }
            BlockData::Image(img) => {
                let _ = write!(out, "[image: {}]", img.url().unwrap_or("missing"));
                match img.caption.as_deref() {
                    Some(caption) if !caption.is_empty() => {
                        let _ = writeln!(out, " {}", markup::plain_text(caption));
                    }
                    _ => out.push('\n'),
                }
            }
            BlockData::List(list) => render_list(&mut out, list),
            BlockData::Unknown { kind, .. } => {
                let _ = writeln!(out, "[unsupported block: {kind}]");
            }
        }
    }
    out
}

fn render_list(out: &mut String, list: &ListData) {
    let style = list.style.as_ref().unwrap_or(&ListStyle::Unordered);
    render_items(out, style, &list.items, 0);
}

fn render_items(out: &mut String, style: &ListStyle, items: &[ListItem], indent: usize) {
    for (i, item) in items.iter().enumerate() {
        let marker = match style {
            ListStyle::Ordered => format!("{}.", i + 1),
            ListStyle::Checklist if item.checked() == Some(true) => "[x]".to_string(),
            ListStyle::Checklist => "[ ]".to_string(),
            ListStyle::Unordered | ListStyle::Unrecognized(_) => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{:indent$}{marker} {}",
            "",
            render_inline(&item.content),
            indent = indent * 2
        );
        render_items(out, style, &item.items, indent + 1);
    }
}

fn render_button(button: &PanelButton) -> String {
    if button.is_close() {
        format!("[{} x]", button.text)
    } else {
        format!("[{}]", button.text)
    }
}

/// Inline markup flattened to text. Links keep their target in angle brackets.
fn render_inline(text: &str) -> String {
    markup::parse_inline(text)
        .into_iter()
        .map(|Span { text, style }| match style.link {
            Some(href) => format!("{text} <{href}>"),
            None => text,
        })
        .collect()
}
