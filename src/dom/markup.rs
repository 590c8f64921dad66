//! HTML-like serialisation of a subtree, for logging and test assertions.

use super::node::NodeId;
use super::tree::Dom;

impl Dom {
    /// Serialise the subtree rooted at `id`.
    ///
    /// Output is `<tag id=".." class=".." attr="..">children</tag>`; text nodes
    /// are written with `<`, `>` and `&` escaped. Missing nodes serialise to an
    /// empty string.
    pub fn markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.get(id) else {
            return;
        };
        if data.is_text() {
            escape_into(&data.text, out);
            return;
        }

        out.push('<');
        out.push_str(&data.tag);
        if let Some(node_id) = &data.id {
            push_attr(out, "id", node_id);
        }
        if !data.classes.is_empty() {
            push_attr(out, "class", &data.classes.join(" "));
        }
        for (name, value) in &data.attributes {
            push_attr(out, name, value);
        }
        out.push('>');
        for &child in self.children(id) {
            self.write_markup(child, out);
        }
        out.push_str("</");
        out.push_str(&data.tag);
        out.push('>');
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
}
