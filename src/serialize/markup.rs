//! Markup writer
//!
//! Line-oriented writer used by every markup producer in the crate. In
//! pretty mode each element, text node and closing tag sits on its own line
//! indented by two spaces per level; otherwise output is compact.

/// Namespace of the REST annotations
pub const REST_NAMESPACE: &str = "https://sirix.io/rest";

const INDENT: &str = "  ";

/// Escape character data
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out
}

/// Streaming markup builder
#[derive(Debug)]
pub struct MarkupWriter {
    out: String,
    pretty: bool,
    depth: usize,
}

impl MarkupWriter {
    pub fn new(pretty: bool) -> Self {
        Self {
            out: String::new(),
            pretty,
            depth: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn indent(&mut self) {
        if self.pretty {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
        }
    }

    fn newline(&mut self) {
        if self.pretty {
            self.out.push('\n');
        }
    }

    fn open_tag(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attributes {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape_attribute(value));
            self.out.push('"');
        }
    }

    /// `<name attr="..">` and descend one level
    pub fn start_element(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.indent();
        self.open_tag(name, attributes);
        self.out.push('>');
        self.newline();
        self.depth += 1;
    }

    /// `</name>` after ascending one level
    pub fn end_element(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self.newline();
    }

    /// `<name attr=".."/>`
    pub fn empty_element(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.indent();
        self.open_tag(name, attributes);
        self.out.push_str("/>");
        self.newline();
    }

    /// `<name attr="..">text</name>` on one line
    pub fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) {
        self.indent();
        self.open_tag(name, attributes);
        self.out.push('>');
        self.out.push_str(&escape_text(text));
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self.newline();
    }

    /// Character data on its own line
    pub fn text(&mut self, text: &str) {
        self.indent();
        self.out.push_str(&escape_text(text));
        self.newline();
    }

    pub fn finish(self) -> String {
        self.out
    }
}
