//! Template markup parser.
//!
//! Produces a small element tree from template source. Comments are
//! dropped, whitespace is condensed the way the browser would render it,
//! and a handful of common entities are decoded.

/// Attribute as written: `name`, `name="value"`, `:name="expr"`, `@event.mod="handler"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: Option<String>,
}

/// Element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
}

impl Element {
    /// Attribute by exact name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

/// Template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// `{{ expr }}`, trimmed.
    Interpolation(String),
}

impl Node {
    /// Whether this is a text node containing only whitespace.
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }
}

/// Opening tag as scanned from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    pub name: String,
    pub attrs: Vec<Attr>,
    pub self_closing: bool,
    /// Byte offset just past the closing `>`.
    pub end: usize,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Whether `pos` starts an opening tag (`<` followed by a letter).
#[must_use]
pub fn is_open_tag_start(src: &str, pos: usize) -> bool {
    let bytes = src.as_bytes();
    bytes.get(pos) == Some(&b'<') && bytes.get(pos + 1).is_some_and(u8::is_ascii_alphabetic)
}

/// Scan an opening tag starting at the `<` at `pos`.
pub fn parse_open_tag(src: &str, pos: usize) -> Result<OpenTag, String> {
    let bytes = src.as_bytes();
    let mut i = pos + 1;
    let name_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/'
    {
        i += 1;
    }
    let name = src[name_start..i].to_string();
    let mut attrs = Vec::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            None => return Err(format!("unterminated opening tag <{name}>")),
            Some(b'>') => {
                return Ok(OpenTag {
                    name,
                    attrs,
                    self_closing: false,
                    end: i + 1,
                })
            }
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                return Ok(OpenTag {
                    name,
                    attrs,
                    self_closing: true,
                    end: i + 2,
                })
            }
            Some(b'/') => {
                i += 1;
                continue;
            }
            Some(_) => {}
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>')
            && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
        {
            i += 1;
        }
        let attr_name = src[attr_start..i].to_string();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if bytes.get(i) != Some(&b'=') {
            attrs.push(Attr {
                name: attr_name,
                value: None,
            });
            continue;
        }

        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => {
                let value_start = i + 1;
                let Some(len) = src[value_start..].find(q as char) else {
                    return Err(format!("unterminated attribute value on <{name}>"));
                };
                i = value_start + len + 1;
                &src[value_start..value_start + len]
            }
            _ => {
                let value_start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'>'
                    && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
                {
                    i += 1;
                }
                &src[value_start..i]
            }
        };
        attrs.push(Attr {
            name: attr_name,
            value: Some(decode_entities(value)),
        });
    }
}

/// Parse template markup into a node list.
pub fn parse_template(src: &str) -> Result<Vec<Node>, String> {
    let bytes = src.as_bytes();
    let mut stack: Vec<Element> = vec![Element {
        tag: String::new(),
        attrs: Vec::new(),
        children: Vec::new(),
    }];
    let mut text = String::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if src[pos..].starts_with("<!--") {
            let Some(end) = src[pos + 4..].find("-->") else {
                return Err("unterminated comment".to_string());
            };
            flush_text(&mut text, &mut stack);
            pos += 4 + end + 3;
        } else if src[pos..].starts_with("</") {
            flush_text(&mut text, &mut stack);
            let Some(close) = src[pos..].find('>') else {
                return Err("unterminated closing tag".to_string());
            };
            let name = src[pos + 2..pos + close].trim();
            if stack.len() == 1 {
                return Err(format!("unexpected closing tag </{name}>"));
            }
            let Some(element) = stack.pop() else {
                return Err(format!("unexpected closing tag </{name}>"));
            };
            if element.tag != name {
                return Err(format!(
                    "closing tag </{name}> does not match <{}>",
                    element.tag
                ));
            }
            push_child(&mut stack, Node::Element(element));
            pos += close + 1;
        } else if is_open_tag_start(src, pos) {
            flush_text(&mut text, &mut stack);
            let tag = parse_open_tag(src, pos)?;
            pos = tag.end;
            let element = Element {
                tag: tag.name,
                attrs: tag.attrs,
                children: Vec::new(),
            };
            if tag.self_closing || VOID_ELEMENTS.contains(&element.tag.as_str()) {
                push_child(&mut stack, Node::Element(element));
            } else {
                stack.push(element);
            }
        } else if src[pos..].starts_with("{{") {
            flush_text(&mut text, &mut stack);
            let Some(end) = src[pos + 2..].find("}}") else {
                return Err("unterminated interpolation".to_string());
            };
            let expr = src[pos + 2..pos + 2 + end].trim();
            if expr.is_empty() {
                return Err("empty interpolation".to_string());
            }
            push_child(&mut stack, Node::Interpolation(expr.to_string()));
            pos += 2 + end + 2;
        } else {
            let ch = src[pos..].chars().next().unwrap_or('\0');
            text.push(ch);
            pos += ch.len_utf8().max(1);
        }
    }

    flush_text(&mut text, &mut stack);
    if stack.len() > 1 {
        let unclosed = stack.last().map(|e| e.tag.clone()).unwrap_or_default();
        return Err(format!("element <{unclosed}> is never closed"));
    }

    let root = stack.pop().map(|e| e.children).unwrap_or_default();
    Ok(condense_whitespace(root))
}

fn push_child(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn flush_text(text: &mut String, stack: &mut [Element]) {
    if !text.is_empty() {
        let decoded = decode_entities(text);
        text.clear();
        push_child(stack, Node::Text(decoded));
    }
}

/// Drop whitespace-only text between elements and collapse runs of whitespace.
fn condense_whitespace(nodes: Vec<Node>) -> Vec<Node> {
    let count = nodes.len();
    let mut out = Vec::with_capacity(count);

    for (i, node) in nodes.into_iter().enumerate() {
        match node {
            Node::Text(text) if text.trim().is_empty() => {
                let at_edge = i == 0 || i + 1 == count;
                if at_edge || text.contains('\n') {
                    continue;
                }
                out.push(Node::Text(" ".to_string()));
            }
            Node::Text(text) => {
                out.push(Node::Text(collapse_spaces(&text)));
            }
            Node::Element(mut element) => {
                if element.tag != "pre" {
                    element.children = condense_whitespace(element.children);
                }
                out.push(Node::Element(element));
            }
            other => out.push(other),
        }
    }

    out
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Decode the common named entities plus numeric references.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';').filter(|&s| s <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(e) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_open_tag_attributes() {
        let src = r#"<input type="text" disabled :value='msg' @input.trim=onInput/>"#;
        let tag = parse_open_tag(src, 0).unwrap();
        assert_eq!(tag.name, "input");
        assert!(tag.self_closing);
        assert_eq!(tag.end, src.len());
        let names: Vec<_> = tag.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["type", "disabled", ":value", "@input.trim"]);
        assert_eq!(tag.attrs[1].value, None);
        assert_eq!(tag.attrs[2].value.as_deref(), Some("msg"));
        assert_eq!(tag.attrs[3].value.as_deref(), Some("onInput"));
    }

    #[test]
    fn test_attribute_value_may_contain_gt() {
        let src = r#"<div v-if="a > b">x</div>"#;
        let tag = parse_open_tag(src, 0).unwrap();
        assert_eq!(tag.attrs[0].value.as_deref(), Some("a > b"));
        assert_eq!(&src[tag.end..], "x</div>");
    }

    #[test]
    fn test_parse_nested_tree() {
        let nodes = parse_template("<div id=\"app\"><p>Hello {{ name }}!</p><br></div>").unwrap();
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.children.len(), 2);
        let p = element(&div.children[0]);
        assert_eq!(
            p.children,
            vec![
                Node::Text("Hello ".to_string()),
                Node::Interpolation("name".to_string()),
                Node::Text("!".to_string()),
            ]
        );
        assert_eq!(element(&div.children[1]).tag, "br");
    }

    #[test]
    fn test_interpolation_may_contain_lt() {
        let nodes = parse_template("<span>{{ a < b ? 'x' : 'y' }}</span>").unwrap();
        let span = element(&nodes[0]);
        assert_eq!(
            span.children,
            vec![Node::Interpolation("a < b ? 'x' : 'y'".to_string())]
        );
    }

    #[test]
    fn test_whitespace_condensed() {
        let src = "\n  <ul>\n    <li>a   b</li>\n    <li>c</li>\n  </ul>\n";
        let nodes = parse_template(src).unwrap();
        assert_eq!(nodes.len(), 1);
        let ul = element(&nodes[0]);
        assert_eq!(ul.children.len(), 2);
        assert_eq!(
            element(&ul.children[0]).children,
            vec![Node::Text("a b".to_string())]
        );
    }

    #[test]
    fn test_comments_dropped() {
        let nodes = parse_template("<div><!-- note --><span/></div>").unwrap();
        assert_eq!(element(&nodes[0]).children.len(), 1);
    }

    #[test]
    fn test_entities_decoded() {
        let nodes = parse_template("<p>a &lt; b &amp;&amp; c &#62; d &unknown;</p>").unwrap();
        assert_eq!(
            element(&nodes[0]).children,
            vec![Node::Text("a < b && c > d &unknown;".to_string())]
        );
    }

    #[test]
    fn test_mismatched_closing_tag_errors() {
        let err = parse_template("<div><span></div>").unwrap_err();
        assert!(err.contains("</div>"));
    }

    #[test]
    fn test_unclosed_element_errors() {
        let err = parse_template("<div><p>text</p>").unwrap_err();
        assert!(err.contains("<div>"));
    }

    #[test]
    fn test_unterminated_interpolation_errors() {
        assert!(parse_template("<p>{{ msg </p>").is_err());
    }
}
