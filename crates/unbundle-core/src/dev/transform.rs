//! Format transformers: one per artifact kind.
//!
//! Each takes raw source text and returns browser-loadable output. None of
//! them touch the filesystem; the router reads bytes and hands them over.

use crate::dev::rewrite::rewrite_imports;
use crate::dev::scan::{tokenize, TokenKind};
use crate::error::DevError;
use crate::sfc::{CompileOptions, SfcBlock, SfcDescriptor, TemplateCompiler};
use std::fmt::Write;

/// Content type for the entry document.
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Content type for every generated module.
pub const JS_CONTENT_TYPE: &str = "application/javascript";

/// Script block defining `process.env` for packages that read it.
pub const ENV_SHIM: &str = "<script>\n  window.process = {env: {NODE_ENV: 'dev'}}\n</script>\n";

/// Local binding the component's options object is assigned to.
const SCRIPT_BINDING: &str = "const __script =";

/// Insert [`ENV_SHIM`] immediately before the first `<script`.
///
/// Documents without a script are returned unchanged.
#[must_use]
pub fn inject_env_shim(html: &str) -> String {
    match html.find("<script") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + ENV_SHIM.len());
            out.push_str(&html[..at]);
            out.push_str(ENV_SHIM);
            out.push_str(&html[at..]);
            out
        }
        None => html.to_string(),
    }
}

/// Source module or package entry: bare imports redirected, nothing else changed.
#[must_use]
pub fn transform_javascript(source: &str) -> String {
    rewrite_imports(source)
}

/// Remove every whitespace character.
#[must_use]
pub fn strip_whitespace(css: &str) -> String {
    css.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Statements that inject `css` (a JS expression) as a `<style>` element.
fn style_injection(css: &str) -> String {
    format!(
        "let link = document.createElement('style')\n\
         link.setAttribute('type', 'text/css')\n\
         document.head.appendChild(link)\n\
         link.innerHTML = {css}\n"
    )
}

/// Stylesheet served as a module that injects itself into the document head.
#[must_use]
pub fn create_css_module(css: &str) -> String {
    let mut out = format!("const css = {}\n", css_literal(css));
    out.push_str(&style_injection("css"));
    out.push_str("export default css\n");
    out
}

/// Whitespace-stripped CSS as a double-quoted JS string literal.
fn css_literal(css: &str) -> String {
    let stripped = strip_whitespace(css);
    format!("\"{}\"", stripped.replace('\\', "\\\\").replace('"', "\\\""))
}

/// URL of a component's template module.
#[must_use]
pub fn template_url(component_path: &str) -> String {
    format!("{component_path}?type=template")
}

/// Script phase of a component.
///
/// Emits the script with its default export bound to `__script`, an import
/// of the render function from the template module, a guarded assignment of
/// it onto `__script`, any style injections, and `export default __script`.
pub fn component_script_module(
    descriptor: &SfcDescriptor,
    component_path: &str,
) -> Result<String, DevError> {
    let script = match &descriptor.script {
        Some(block) => {
            check_script(block, &descriptor.filename)?;
            bind_default_export(&block.content)
        }
        None => format!("{SCRIPT_BINDING} {{}}\n"),
    };

    let mut out = rewrite_imports(&script);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "import {{ render as __render }} from \"{}\"",
        template_url(component_path)
    );
    out.push_str("if (__render) __script.render = __render\n");

    for style in &descriptor.styles {
        check_style(style, &descriptor.filename)?;
        let _ = write!(
            out,
            "{{\n{}}}\n",
            style_injection(&css_literal(&style.content))
        );
    }

    out.push_str("export default __script\n");
    Ok(out)
}

/// Template phase of a component: the compiled render function module.
///
/// A component without a template exports `render` as `undefined`, leaving
/// any render function defined in the script in place.
pub fn component_template_module(
    descriptor: &SfcDescriptor,
    compiler: &dyn TemplateCompiler,
) -> Result<String, DevError> {
    let Some(template) = &descriptor.template else {
        return Ok("export const render = undefined\n".to_string());
    };
    if let Some(lang) = template.lang().filter(|l| *l != "html") {
        return Err(DevError::compile(
            &descriptor.filename,
            format!("unsupported template language \"{lang}\""),
        ));
    }

    let compiled = compiler.compile(
        &template.content,
        &CompileOptions::module(descriptor.filename.clone()),
    )?;
    Ok(rewrite_imports(&compiled.code))
}

fn check_script(block: &SfcBlock, filename: &str) -> Result<(), DevError> {
    if block.has_attr("setup") {
        return Err(DevError::compile(filename, "<script setup> is not supported"));
    }
    match block.lang() {
        None | Some("js") => Ok(()),
        Some(lang) => Err(DevError::compile(
            filename,
            format!("unsupported script language \"{lang}\""),
        )),
    }
}

fn check_style(block: &SfcBlock, filename: &str) -> Result<(), DevError> {
    if block.has_attr("scoped") || block.has_attr("module") {
        return Err(DevError::compile(
            filename,
            "scoped and module styles are not supported",
        ));
    }
    match block.lang() {
        None | Some("css") => Ok(()),
        Some(lang) => Err(DevError::compile(
            filename,
            format!("unsupported style language \"{lang}\""),
        )),
    }
}

/// Replace the first top-level `export default` with the local binding.
///
/// Scripts without a default export get an empty options object appended.
fn bind_default_export(script: &str) -> String {
    let tokens = tokenize(script);
    let found = tokens.windows(2).enumerate().find(|(i, pair)| {
        let after_dot = *i > 0 && tokens[i - 1].kind == TokenKind::Dot;
        !after_dot && pair[0].is_ident(script, "export") && pair[1].is_ident(script, "default")
    });

    match found {
        Some((_, pair)) => {
            let mut out = String::with_capacity(script.len() + 8);
            out.push_str(&script[..pair[0].start]);
            out.push_str(SCRIPT_BINDING);
            out.push_str(&script[pair[1].end..]);
            out
        }
        None => {
            let mut out = script.to_string();
            if !out.ends_with('\n') {
                out.push('\n');
            }
            let _ = writeln!(out, "{SCRIPT_BINDING} {{}}");
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfc::{BlockParser, ComponentParser, RenderCompiler};

    fn descriptor(source: &str) -> SfcDescriptor {
        BlockParser::new().parse(source, "App.vue").unwrap()
    }

    #[test]
    fn test_inject_env_shim_before_first_script() {
        let html = r#"<html><script src="/src/main.js"></script></html>"#;
        let out = inject_env_shim(html);
        assert_eq!(
            out,
            format!(r#"<html>{ENV_SHIM}<script src="/src/main.js"></script></html>"#)
        );
        assert!(out.contains("window.process = {env: {NODE_ENV: 'dev'}}"));
    }

    #[test]
    fn test_inject_env_shim_only_once() {
        let html = "<script>a</script><script>b</script>";
        let out = inject_env_shim(html);
        assert_eq!(out.matches("window.process").count(), 1);
        assert!(out.ends_with("<script>a</script><script>b</script>"));
    }

    #[test]
    fn test_inject_env_shim_without_script() {
        let html = "<html><body>static</body></html>";
        assert_eq!(inject_env_shim(html), html);
    }

    #[test]
    fn test_create_css_module() {
        let module = create_css_module("body { color: red; }");
        assert!(module.starts_with("const css = \"body{color:red;}\"\n"));
        assert!(module.contains("document.createElement('style')"));
        assert!(module.contains("document.head.appendChild(link)"));
        assert!(module.contains("link.innerHTML = css"));
        assert!(module.ends_with("export default css\n"));
    }

    #[test]
    fn test_css_string_is_escaped() {
        let module = create_css_module("a::before { content: \"\\201C\"; }");
        assert!(module.contains(r#"const css = "a::before{content:\"\\201C\";}""#));
    }

    #[test]
    fn test_script_phase_shape() {
        let d = descriptor(
            "<template><div/></template>\n<script>\nimport { ref } from 'vue'\nexport default { render() { return null } }\n</script>",
        );
        let out = component_script_module(&d, "/App.vue").unwrap();
        assert!(out.contains("import { ref } from '/@modules/vue'"));
        assert!(out.contains("const __script = { render() { return null } }"));
        assert!(!out.contains("export default {"));
        assert!(out.contains("import { render as __render } from \"/App.vue?type=template\""));
        assert!(out.contains("if (__render) __script.render = __render"));
        assert!(out.trim_end().ends_with("export default __script"));
    }

    #[test]
    fn test_script_phase_without_script_block() {
        let d = descriptor("<template><p>hi</p></template>");
        let out = component_script_module(&d, "/Hello.vue").unwrap();
        assert!(out.starts_with("const __script = {}\n"));
        assert!(out.contains("from \"/Hello.vue?type=template\""));
    }

    #[test]
    fn test_script_without_default_export() {
        let d = descriptor("<script>console.log('side effect')</script>");
        let out = component_script_module(&d, "/A.vue").unwrap();
        assert!(out.starts_with("console.log('side effect')\nconst __script = {}\n"));
    }

    #[test]
    fn test_export_default_inside_string_is_ignored() {
        let d = descriptor("<script>const s = 'export default x'\nexport default { s }</script>");
        let out = component_script_module(&d, "/A.vue").unwrap();
        assert!(out.contains("const s = 'export default x'"));
        assert!(out.contains("const __script = { s }"));
    }

    #[test]
    fn test_unsupported_script_lang() {
        let d = descriptor("<script lang=\"ts\">export default {}</script>");
        let err = component_script_module(&d, "/A.vue").unwrap_err();
        assert!(matches!(err, DevError::Compile { .. }));
        assert!(err.to_string().contains("\"ts\""));
    }

    #[test]
    fn test_styles_are_injected() {
        let d = descriptor("<script>export default {}</script>\n<style>\n.a { color: blue; }\n</style>");
        let out = component_script_module(&d, "/A.vue").unwrap();
        assert!(out.contains("link.innerHTML = \".a{color:blue;}\""));
        let injection = out.find("link.innerHTML").unwrap();
        let export = out.find("export default __script").unwrap();
        assert!(injection < export);
    }

    #[test]
    fn test_scoped_style_rejected() {
        let d = descriptor("<script>export default {}</script><style scoped>.a{}</style>");
        assert!(component_script_module(&d, "/A.vue").is_err());
    }

    #[test]
    fn test_template_phase() {
        let d = descriptor("<template><div>{{ msg }}</div></template>");
        let out = component_template_module(&d, &RenderCompiler::new()).unwrap();
        assert!(out.contains("from \"/@modules/vue\""));
        assert!(out.contains("export function render(_ctx, _cache)"));
    }

    #[test]
    fn test_template_phase_without_template() {
        let d = descriptor("<script>export default { render() {} }</script>");
        let out = component_template_module(&d, &RenderCompiler::new()).unwrap();
        assert_eq!(out, "export const render = undefined\n");
    }

    #[test]
    fn test_template_compile_error_names_file() {
        let d = descriptor("<template><div></span></template>");
        let err = component_template_module(&d, &RenderCompiler::new()).unwrap_err();
        assert_eq!(err.code(), "COMPILE_ERROR");
        assert!(err.to_string().contains("App.vue"));
    }
}
