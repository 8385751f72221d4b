//! Top-level block splitting for component files.

use super::html::{is_open_tag_start, parse_open_tag};
use super::{ComponentParser, SfcBlock, SfcDescriptor};
use crate::error::DevError;
use std::collections::BTreeMap;

/// Built-in [`ComponentParser`].
///
/// Recognizes `<template>`, `<script>` and `<style>` at the top level of the
/// file; other top-level elements become custom blocks. Text and comments
/// between blocks are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockParser;

impl BlockParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ComponentParser for BlockParser {
    fn parse(&self, source: &str, filename: &str) -> Result<SfcDescriptor, DevError> {
        split_blocks(source, filename).map_err(|message| DevError::parse(filename, message))
    }
}

fn split_blocks(source: &str, filename: &str) -> Result<SfcDescriptor, String> {
    let mut descriptor = SfcDescriptor {
        filename: filename.to_string(),
        ..SfcDescriptor::default()
    };
    let mut pos = 0;

    while pos < source.len() {
        if source[pos..].starts_with("<!--") {
            let Some(end) = source[pos + 4..].find("-->") else {
                return Err("unterminated comment".to_string());
            };
            pos += 4 + end + 3;
            continue;
        }
        if !is_open_tag_start(source, pos) {
            pos += source[pos..].chars().next().map_or(1, char::len_utf8);
            continue;
        }

        let tag = parse_open_tag(source, pos)?;
        let attrs: BTreeMap<String, String> = tag
            .attrs
            .into_iter()
            .map(|a| (a.name, a.value.unwrap_or_else(|| "true".to_string())))
            .collect();

        let (content, next) = if tag.self_closing {
            (String::new(), tag.end)
        } else {
            let close = if tag.name == "template" {
                find_template_close(source, tag.end)
            } else {
                source[tag.end..]
                    .find(&format!("</{}", tag.name))
                    .map(|offset| tag.end + offset)
            };
            let Some(close) = close else {
                return Err(format!("<{}> block is never closed", tag.name));
            };
            let Some(gt) = source[close..].find('>') else {
                return Err(format!("<{}> block is never closed", tag.name));
            };
            (source[tag.end..close].to_string(), close + gt + 1)
        };

        let block = SfcBlock {
            block_type: tag.name,
            content,
            attrs,
        };
        match block.block_type.as_str() {
            "template" if descriptor.template.is_some() => {
                return Err("a component may contain only one <template> block".to_string());
            }
            "template" => descriptor.template = Some(block),
            "script" if descriptor.script.is_some() => {
                return Err("a component may contain only one <script> block".to_string());
            }
            "script" => descriptor.script = Some(block),
            "style" => descriptor.styles.push(block),
            _ => descriptor.custom_blocks.push(block),
        }
        pos = next;
    }

    Ok(descriptor)
}

/// Offset of the `</template` matching a top-level `<template>`, skipping
/// nested `<template>` wrappers.
fn find_template_close(source: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = from;

    loop {
        let rest = &source[pos..];
        let open = rest.find("<template").map(|o| pos + o);
        let close = rest.find("</template").map(|o| pos + o)?;

        match open {
            Some(open) if open < close => {
                let tag = parse_open_tag(source, open).ok()?;
                if !tag.self_closing {
                    depth += 1;
                }
                pos = tag.end;
            }
            _ if depth == 0 => return Some(close),
            _ => {
                depth -= 1;
                pos = close + "</template".len();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENT: &str = r#"<template>
  <div class="greeting">{{ msg }}</div>
</template>

<script>
export default {
  data() {
    return { msg: 'hi' }
  }
}
</script>

<style>
.greeting { color: red; }
</style>
"#;

    #[test]
    fn test_split_three_blocks() {
        let descriptor = BlockParser::new().parse(COMPONENT, "App.vue").unwrap();
        assert_eq!(descriptor.filename, "App.vue");

        let template = descriptor.template.unwrap();
        assert_eq!(
            template.content.trim(),
            r#"<div class="greeting">{{ msg }}</div>"#
        );

        let script = descriptor.script.unwrap();
        assert!(script.content.contains("export default {"));
        assert!(script.lang().is_none());

        assert_eq!(descriptor.styles.len(), 1);
        assert!(descriptor.styles[0].content.contains(".greeting"));
    }

    #[test]
    fn test_block_attributes() {
        let source = "<script lang=\"ts\">x</script><style scoped>a{}</style>";
        let descriptor = BlockParser::new().parse(source, "A.vue").unwrap();
        assert_eq!(descriptor.script.unwrap().lang(), Some("ts"));
        assert!(descriptor.styles[0].has_attr("scoped"));
        assert_eq!(descriptor.styles[0].attrs["scoped"], "true");
    }

    #[test]
    fn test_nested_template_wrappers() {
        let source = "<template><div><template v-if=\"ok\"><b>a</b></template></div></template>\n<script>export default {}</script>";
        let descriptor = BlockParser::new().parse(source, "A.vue").unwrap();
        assert_eq!(
            descriptor.template.unwrap().content,
            "<div><template v-if=\"ok\"><b>a</b></template></div>"
        );
        assert!(descriptor.script.is_some());
    }

    #[test]
    fn test_script_only_component() {
        let source = "<script>export default { name: 'x' }</script>";
        let descriptor = BlockParser::new().parse(source, "A.vue").unwrap();
        assert!(descriptor.template.is_none());
        assert!(descriptor.styles.is_empty());
    }

    #[test]
    fn test_script_containing_markup_strings() {
        let source = "<script>const s = '<div>'; export default {}</script><template><p/></template>";
        let descriptor = BlockParser::new().parse(source, "A.vue").unwrap();
        assert_eq!(
            descriptor.script.unwrap().content,
            "const s = '<div>'; export default {}"
        );
        assert_eq!(descriptor.template.unwrap().content, "<p/>");
    }

    #[test]
    fn test_custom_blocks_and_comments() {
        let source = "<!-- <script>nope</script> -->\n<docs>Usage</docs>\n<script>export default {}</script>";
        let descriptor = BlockParser::new().parse(source, "A.vue").unwrap();
        assert_eq!(descriptor.custom_blocks.len(), 1);
        assert_eq!(descriptor.custom_blocks[0].block_type, "docs");
        assert_eq!(
            descriptor.script.unwrap().content,
            "export default {}"
        );
    }

    #[test]
    fn test_unclosed_block_is_parse_error() {
        let err = BlockParser::new()
            .parse("<script>export default {}", "Broken.vue")
            .unwrap_err();
        assert_eq!(err.code(), crate::error::codes::PARSE_ERROR);
        assert!(err.to_string().contains("Broken.vue"));
    }

    #[test]
    fn test_duplicate_script_is_parse_error() {
        let err = BlockParser::new()
            .parse("<script>a</script><script>b</script>", "A.vue")
            .unwrap_err();
        assert!(matches!(err, DevError::Parse { .. }));
    }
}
