//! Inline markup subset used inside paragraph and header text.
//!
//! Understood tags: `<b>`/`<strong>`, `<i>`/`<em>`, `<a href="...">` and
//! `<br>`. Any other tag is dropped while its text is kept. The common named
//! entities and numeric character references are decoded. This is not an
//! HTML parser; malformed markup degrades to literal text and never fails.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub link: Option<String>,
}

impl Style {
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && self.link.is_none()
    }
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

/// Splits marked-up text into styled spans. Adjacent runs with the same style
/// are merged.
pub fn parse_inline(input: &str) -> Vec<Span> {
    let mut parser = InlineParser::default();
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        parser.push_text(&rest[..start]);
        let after = &rest[start + 1..];

        if !looks_like_tag(after) {
            parser.append("<");
            rest = after;
            continue;
        }

        match after.find('>') {
            Some(end) => {
                parser.apply_tag(&after[..end]);
                rest = &after[end + 1..];
            }
            None => {
                parser.push_text(&rest[start..]);
                rest = "";
            }
        }
    }
    parser.push_text(rest);

    parser.spans
}

/// Text with all markup removed and entities decoded.
pub fn plain_text(input: &str) -> String {
    parse_inline(input)
        .into_iter()
        .map(|span| span.text)
        .collect()
}

fn looks_like_tag(after_bracket: &str) -> bool {
    let body = after_bracket.strip_prefix('/').unwrap_or(after_bracket);
    body.starts_with(|c: char| c.is_ascii_alphabetic())
}

#[derive(Default)]
struct InlineParser {
    spans: Vec<Span>,
    bold: usize,
    italic: usize,
    // One entry per open <a>; None when the tag had no usable href
    links: Vec<Option<String>>,
}

impl InlineParser {
    fn style(&self) -> Style {
        Style {
            bold: self.bold > 0,
            italic: self.italic > 0,
            link: self.links.last().cloned().flatten(),
        }
    }

    fn push_text(&mut self, raw: &str) {
        if !raw.is_empty() {
            let decoded = decode_entities(raw);
            self.append(&decoded);
        }
    }

    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        let style = self.style();
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    fn apply_tag(&mut self, raw: &str) {
        let raw = raw.trim();
        let (closing, body) = match raw.strip_prefix('/') {
            Some(body) => (true, body.trim_start()),
            None => (false, raw),
        };

        let name_len = body
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(body.len());
        let name = body[..name_len].to_ascii_lowercase();

        match (name.as_str(), closing) {
            ("b" | "strong", false) => self.bold += 1,
            ("b" | "strong", true) => self.bold = self.bold.saturating_sub(1),
            ("i" | "em", false) => self.italic += 1,
            ("i" | "em", true) => self.italic = self.italic.saturating_sub(1),
            ("a", false) => self.links.push(href(&body[name_len..])),
            ("a", true) => {
                self.links.pop();
            }
            ("br", _) => self.append("\n"),
            _ => {}
        }
    }
}

fn href(attributes: &str) -> Option<String> {
    let pos = attributes.to_ascii_lowercase().find("href")?;
    let rest = attributes[pos + "href".len()..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();

    let value = match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let inner = &rest[1..];
            &inner[..inner.find(quote)?]
        }
        _ => rest.split_whitespace().next()?,
    };

    if value.is_empty() {
        return None;
    }
    Some(decode_entities(value))
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .and_then(|semi| entity(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
