//! Render function generation.
//!
//! Turns a parsed template into a `render(_ctx, _cache)` function built from
//! Vue runtime helpers:
//!
//! ```text
//! <div :class="cls" @click="inc">{{ count }}</div>
//! ```
//!
//! becomes
//!
//! ```text
//! import { toDisplayString as _toDisplayString, createVNode as _createVNode, normalizeClass as _normalizeClass } from "vue"
//!
//! export function render(_ctx, _cache) {
//!   return _createVNode("div", { class: _normalizeClass(_ctx.cls), onClick: _ctx.inc }, _toDisplayString(_ctx.count))
//! }
//! ```

use super::expr::{
    is_function_expression, is_member_expression, parse_for_expression, pattern_names,
    prefix_identifiers,
};
use super::html::{parse_template, Attr, Element, Node};
use super::{CompileMode, CompileOptions, CompiledTemplate, TemplateCompiler};
use crate::error::DevError;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Built-in [`TemplateCompiler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderCompiler;

impl RenderCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TemplateCompiler for RenderCompiler {
    fn compile(
        &self,
        template: &str,
        options: &CompileOptions,
    ) -> Result<CompiledTemplate, DevError> {
        compile_template(template, options.mode)
            .map(|code| CompiledTemplate { code })
            .map_err(|message| DevError::compile(options.filename.clone(), message))
    }
}

/// Runtime helpers, in import order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Helper {
    ToDisplayString,
    CreateTextVNode,
    CreateCommentVNode,
    CreateVNode,
    Fragment,
    RenderList,
    RenderSlot,
    ResolveComponent,
    ResolveDynamicComponent,
    WithDirectives,
    VShow,
    VModelText,
    VModelCheckbox,
    VModelRadio,
    VModelSelect,
    VModelDynamic,
    WithModifiers,
    WithKeys,
    NormalizeClass,
    NormalizeStyle,
    MergeProps,
}

impl Helper {
    fn name(self) -> &'static str {
        match self {
            Self::ToDisplayString => "toDisplayString",
            Self::CreateTextVNode => "createTextVNode",
            Self::CreateCommentVNode => "createCommentVNode",
            Self::CreateVNode => "createVNode",
            Self::Fragment => "Fragment",
            Self::RenderList => "renderList",
            Self::RenderSlot => "renderSlot",
            Self::ResolveComponent => "resolveComponent",
            Self::ResolveDynamicComponent => "resolveDynamicComponent",
            Self::WithDirectives => "withDirectives",
            Self::VShow => "vShow",
            Self::VModelText => "vModelText",
            Self::VModelCheckbox => "vModelCheckbox",
            Self::VModelRadio => "vModelRadio",
            Self::VModelSelect => "vModelSelect",
            Self::VModelDynamic => "vModelDynamic",
            Self::WithModifiers => "withModifiers",
            Self::WithKeys => "withKeys",
            Self::NormalizeClass => "normalizeClass",
            Self::NormalizeStyle => "normalizeStyle",
            Self::MergeProps => "mergeProps",
        }
    }
}

/// Modifiers handled by `withModifiers`. Anything else not listed in
/// [`OPTION_MODIFIERS`] is a key filter for `withKeys`.
const EVENT_MODIFIERS: &[&str] = &[
    "stop", "prevent", "self", "ctrl", "shift", "alt", "meta", "exact", "left", "middle", "right",
];

/// Modifiers that become part of the listener key (`onClickOnce`).
const OPTION_MODIFIERS: &[&str] = &["once", "capture", "passive"];

/// Attributes consumed by structural handling before props are built.
const STRUCTURAL: &[&str] = &["v-if", "v-else-if", "v-else", "v-for", "v-once", "v-cloak"];

type GenResult<T> = Result<T, String>;

/// Compile template source to render function code.
pub fn compile_template(template: &str, mode: CompileMode) -> GenResult<String> {
    let nodes = parse_template(template.trim())?;
    let mut gen = Codegen::default();
    let children = gen.children(&nodes, &[])?;

    let root = match children.len() {
        0 => "null".to_string(),
        1 => children.into_iter().next().unwrap_or_default(),
        _ => {
            let create = gen.helper(Helper::CreateVNode);
            let fragment = gen.helper(Helper::Fragment);
            format!("{create}({fragment}, null, {})", array(&children))
        }
    };

    let mut body = String::new();
    if !gen.components.is_empty() {
        let resolve = gen.helper(Helper::ResolveComponent);
        for tag in &gen.components {
            let _ = writeln!(
                body,
                "  const {} = {resolve}({})",
                component_var(tag),
                js_string(tag)
            );
        }
        body.push('\n');
    }
    let _ = writeln!(body, "  return {}", indent(&root, 2).trim_start());

    let mut code = String::new();
    match mode {
        CompileMode::Module => {
            if !gen.helpers.is_empty() {
                let imports: Vec<String> = gen
                    .helpers
                    .iter()
                    .map(|h| format!("{} as _{}", h.name(), h.name()))
                    .collect();
                let _ = writeln!(code, "import {{ {} }} from \"vue\"\n", imports.join(", "));
            }
            let _ = write!(code, "export function render(_ctx, _cache) {{\n{body}}}\n");
        }
        CompileMode::Function => {
            if !gen.helpers.is_empty() {
                let bindings: Vec<String> = gen
                    .helpers
                    .iter()
                    .map(|h| format!("{}: _{}", h.name(), h.name()))
                    .collect();
                let _ = writeln!(code, "const {{ {} }} = Vue\n", bindings.join(", "));
            }
            let _ = write!(code, "return function render(_ctx, _cache) {{\n{body}}}\n");
        }
    }

    Ok(code)
}

#[derive(Default)]
struct Codegen {
    helpers: BTreeSet<Helper>,
    /// Component tags resolved at the top of `render`, in first-use order.
    components: Vec<String>,
}

impl Codegen {
    fn helper(&mut self, helper: Helper) -> String {
        self.helpers.insert(helper);
        format!("_{}", helper.name())
    }

    fn expr(&self, expr: &str, scope: &[String]) -> GenResult<String> {
        prefix_identifiers(expr, scope)
    }

    /// Generate a child list, folding `v-if` / `v-else-if` / `v-else` runs
    /// into conditional expressions.
    fn children(&mut self, nodes: &[Node], scope: &[String]) -> GenResult<Vec<String>> {
        let mut out = Vec::new();
        let mut i = 0;

        while i < nodes.len() {
            let node = &nodes[i];
            i += 1;
            let Node::Element(element) = node else {
                out.push(self.node(node, scope)?);
                continue;
            };

            if element.attr("v-else-if").is_some() || element.attr("v-else").is_some() {
                return Err(format!(
                    "v-else/v-else-if on <{}> has no adjacent v-if",
                    element.tag
                ));
            }
            let Some(cond) = element.attr("v-if") else {
                out.push(self.element(element, scope)?);
                continue;
            };

            let mut branches = vec![(Some(required(cond, "v-if")?), element)];
            loop {
                let mut j = i;
                while j < nodes.len() && nodes[j].is_blank_text() {
                    j += 1;
                }
                let Some(Node::Element(next)) = nodes.get(j) else {
                    break;
                };
                if let Some(cond) = next.attr("v-else-if") {
                    branches.push((Some(required(cond, "v-else-if")?), next));
                } else if next.attr("v-else").is_some() {
                    branches.push((None, next));
                } else {
                    break;
                }
                i = j + 1;
                if branches.last().is_some_and(|(cond, _)| cond.is_none()) {
                    break;
                }
            }
            out.push(self.conditional(&branches, scope)?);
        }

        Ok(out)
    }

    fn conditional(
        &mut self,
        branches: &[(Option<&str>, &Element)],
        scope: &[String],
    ) -> GenResult<String> {
        let Some(((cond, element), rest)) = branches.split_first() else {
            return Ok("null".to_string());
        };
        let consequent = self.element(element, scope)?;
        match cond {
            None => Ok(consequent),
            Some(cond) => {
                let test = self.expr(cond, scope)?;
                let alternate = if rest.is_empty() {
                    let comment = self.helper(Helper::CreateCommentVNode);
                    format!("{comment}(\"v-if\", true)")
                } else {
                    self.conditional(rest, scope)?
                };
                Ok(format!("({test})\n  ? {}\n  : {}", indent(&consequent, 4).trim_start(), indent(&alternate, 4).trim_start()))
            }
        }
    }

    fn node(&mut self, node: &Node, scope: &[String]) -> GenResult<String> {
        match node {
            Node::Element(element) => self.element(element, scope),
            Node::Text(text) => {
                let create = self.helper(Helper::CreateTextVNode);
                Ok(format!("{create}({})", js_string(text)))
            }
            Node::Interpolation(expr) => {
                let create = self.helper(Helper::CreateTextVNode);
                let display = self.helper(Helper::ToDisplayString);
                Ok(format!("{create}({display}({}))", self.expr(expr, scope)?))
            }
        }
    }

    /// Element with its `v-for`, if any.
    fn element(&mut self, element: &Element, scope: &[String]) -> GenResult<String> {
        let Some(attr) = element.attr("v-for") else {
            return self.vnode(element, scope);
        };

        let parsed = parse_for_expression(required(attr, "v-for")?)?;
        let source = self.expr(&parsed.source, scope)?;
        let mut inner_scope = scope.to_vec();
        inner_scope.extend(parsed.names.iter().cloned());
        let item = self.vnode(element, &inner_scope)?;

        let create = self.helper(Helper::CreateVNode);
        let fragment = self.helper(Helper::Fragment);
        let render_list = self.helper(Helper::RenderList);
        Ok(format!(
            "{create}({fragment}, null, {render_list}({source}, ({}) => {{\n  return {}\n}}))",
            parsed.params,
            indent(&item, 2).trim_start()
        ))
    }

    fn vnode(&mut self, element: &Element, scope: &[String]) -> GenResult<String> {
        match element.tag.as_str() {
            "template" => {
                let children = self.children(&element.children, scope)?;
                let create = self.helper(Helper::CreateVNode);
                let fragment = self.helper(Helper::Fragment);
                return Ok(format!("{create}({fragment}, null, {})", array(&children)));
            }
            "slot" => return self.slot_outlet(element, scope),
            _ => {}
        }

        let (vnode_type, is_component) = self.vnode_type(element, scope)?;
        let (props, directives) = self.props(element, scope, is_component)?;
        let children = if is_component {
            self.slots(element, scope)?
        } else {
            self.element_children(&element.children, scope)?
        };

        let create = self.helper(Helper::CreateVNode);
        let mut args = vec![vnode_type];
        match (props, children) {
            (props, Some(children)) => {
                args.push(props.unwrap_or_else(|| "null".to_string()));
                args.push(children);
            }
            (Some(props), None) => args.push(props),
            (None, None) => {}
        }
        let vnode = format!("{create}({})", args.join(", "));

        if directives.is_empty() {
            return Ok(vnode);
        }
        let with_directives = self.helper(Helper::WithDirectives);
        Ok(format!(
            "{with_directives}({vnode}, {})",
            array(&directives)
        ))
    }

    fn vnode_type(&mut self, element: &Element, scope: &[String]) -> GenResult<(String, bool)> {
        let tag = element.tag.as_str();
        if tag == "component" {
            let dynamic = element
                .attr(":is")
                .or_else(|| element.attr("v-bind:is"))
                .map(|a| required(a, ":is").and_then(|e| self.expr(e, scope)))
                .transpose()?;
            let is = match dynamic {
                Some(expr) => expr,
                None => match element.attr("is") {
                    Some(Attr {
                        value: Some(value), ..
                    }) => js_string(value),
                    _ => return Err("<component> requires an `is` binding".to_string()),
                },
            };
            let resolve = self.helper(Helper::ResolveDynamicComponent);
            return Ok((format!("{resolve}({is})"), true));
        }

        if is_component_tag(tag) {
            if !self.components.iter().any(|c| c == tag) {
                self.components.push(tag.to_string());
            }
            return Ok((component_var(tag), true));
        }

        Ok((js_string(tag), false))
    }

    /// Text-only children become a string; anything else an array.
    fn element_children(&mut self, children: &[Node], scope: &[String]) -> GenResult<Option<String>> {
        if children.is_empty() {
            return Ok(None);
        }

        if children.iter().all(|c| !matches!(c, Node::Element(_))) {
            let mut parts = Vec::with_capacity(children.len());
            for child in children {
                match child {
                    Node::Text(text) => parts.push(js_string(text)),
                    Node::Interpolation(expr) => {
                        let display = self.helper(Helper::ToDisplayString);
                        parts.push(format!("{display}({})", self.expr(expr, scope)?));
                    }
                    Node::Element(_) => {}
                }
            }
            return Ok(Some(parts.join(" + ")));
        }

        let items = self.children(children, scope)?;
        Ok(Some(array(&items)))
    }

    /// Slot functions for a component's children.
    fn slots(&mut self, element: &Element, scope: &[String]) -> GenResult<Option<String>> {
        let mut slots: Vec<(String, String)> = Vec::new();
        let mut loose = Vec::new();

        for child in &element.children {
            match child {
                Node::Element(template) if template.tag == "template" => {
                    if let Some((name, params)) = slot_directive(template)? {
                        let mut inner = scope.to_vec();
                        inner.extend(pattern_names(&params));
                        let items = self.children(&template.children, &inner)?;
                        slots.push((name, format!("({params}) => {}", array(&items))));
                        continue;
                    }
                    loose.push(child.clone());
                }
                other => loose.push(other.clone()),
            }
        }

        let own = slot_directive(element)?;
        let loose_has_content = loose.iter().any(|n| !n.is_blank_text());
        if loose_has_content || own.is_some() {
            if slots.iter().any(|(name, _)| name == "default") {
                return Err(format!(
                    "<{}> mixes a default slot template with loose children",
                    element.tag
                ));
            }
            let (_, params) = own.unwrap_or_else(|| ("default".to_string(), String::new()));
            let mut inner = scope.to_vec();
            inner.extend(pattern_names(&params));
            let items = self.children(&loose, &inner)?;
            slots.insert(0, ("default".to_string(), format!("({params}) => {}", array(&items))));
        }

        if slots.is_empty() {
            return Ok(None);
        }
        let entries: Vec<String> = slots
            .iter()
            .map(|(name, body)| format!("{}: {body}", prop_key(name)))
            .collect();
        Ok(Some(format!("{{\n{}\n}}", indent(&entries.join(",\n"), 2))))
    }

    fn slot_outlet(&mut self, element: &Element, scope: &[String]) -> GenResult<String> {
        let name = match element.attr("name") {
            Some(Attr {
                value: Some(value), ..
            }) => js_string(value),
            _ => match element.attr(":name") {
                Some(attr) => self.expr(required(attr, ":name")?, scope)?,
                None => js_string("default"),
            },
        };

        let rest = Element {
            tag: element.tag.clone(),
            attrs: element
                .attrs
                .iter()
                .filter(|a| a.name != "name" && a.name != ":name")
                .cloned()
                .collect(),
            children: Vec::new(),
        };
        let (props, _) = self.props(&rest, scope, true)?;
        let render_slot = self.helper(Helper::RenderSlot);

        let mut args = vec!["_ctx.$slots".to_string(), name];
        if !element.children.is_empty() {
            let fallback = self.children(&element.children, scope)?;
            args.push(props.unwrap_or_else(|| "{}".to_string()));
            args.push(format!("() => {}", array(&fallback)));
        } else if let Some(props) = props {
            args.push(props);
        }
        Ok(format!("{render_slot}({})", args.join(", ")))
    }

    /// Props object plus runtime directives for an element.
    fn props(
        &mut self,
        element: &Element,
        scope: &[String],
        is_component: bool,
    ) -> GenResult<(Option<String>, Vec<String>)> {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut directives = Vec::new();
        let mut static_class = None;
        let mut bound_class = None;
        let mut static_style = None;
        let mut bound_style = None;
        let mut spread = None;

        for attr in &element.attrs {
            let name = attr.name.as_str();
            if STRUCTURAL.contains(&name) || is_slot_directive(name) {
                continue;
            }
            if element.tag == "component" && matches!(name, "is" | ":is" | "v-bind:is") {
                continue;
            }

            if let Some(arg) = name.strip_prefix(':').or_else(|| name.strip_prefix("v-bind:")) {
                let (arg, modifiers) = split_modifiers(arg);
                if arg.starts_with('[') {
                    return Err(format!("dynamic argument `{name}` is not supported"));
                }
                let key = if modifiers.contains(&"camel") {
                    camelize(arg)
                } else {
                    arg.to_string()
                };
                let value = match &attr.value {
                    Some(value) => self.expr(value, scope)?,
                    None => self.expr(&camelize(arg), scope)?,
                };
                match key.as_str() {
                    "class" => bound_class = Some(value),
                    "style" => bound_style = Some(value),
                    _ => entries.push((key, value)),
                }
            } else if name == "v-bind" {
                spread = Some(self.expr(required(attr, "v-bind")?, scope)?);
            } else if let Some(arg) = name.strip_prefix('@').or_else(|| name.strip_prefix("v-on:")) {
                let (key, handler) = self.listener(arg, attr.value.as_deref(), scope)?;
                entries.push((key, handler));
            } else if name == "v-model" || name.starts_with("v-model:") || name.starts_with("v-model.") {
                self.model(element, attr, scope, is_component, &mut entries, &mut directives)?;
            } else if name == "v-show" {
                let show = self.helper(Helper::VShow);
                directives.push(format!("[{show}, {}]", self.expr(required(attr, "v-show")?, scope)?));
            } else if name == "v-html" {
                entries.push(("innerHTML".to_string(), self.expr(required(attr, "v-html")?, scope)?));
            } else if name == "v-text" {
                let display = self.helper(Helper::ToDisplayString);
                let value = self.expr(required(attr, "v-text")?, scope)?;
                entries.push(("textContent".to_string(), format!("{display}({value})")));
            } else if name.starts_with("v-") {
                return Err(format!("unknown directive `{name}`"));
            } else {
                let value = js_string(attr.value.as_deref().unwrap_or(""));
                match name {
                    "class" => static_class = Some(value),
                    "style" => static_style = Some(value),
                    _ => entries.push((name.to_string(), value)),
                }
            }
        }

        if let Some(class) = merge_binding(self, Helper::NormalizeClass, static_class, bound_class) {
            entries.insert(0, ("class".to_string(), class));
        }
        if let Some(style) = merge_binding(self, Helper::NormalizeStyle, static_style, bound_style) {
            let at = usize::from(entries.first().is_some_and(|(k, _)| k == "class"));
            entries.insert(at, ("style".to_string(), style));
        }

        let object = if entries.is_empty() {
            None
        } else {
            let fields: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("{}: {value}", prop_key(key)))
                .collect();
            Some(format!("{{ {} }}", fields.join(", ")))
        };

        let props = match (object, spread) {
            (object, Some(spread)) => {
                let merge = self.helper(Helper::MergeProps);
                Some(match object {
                    Some(object) => format!("{merge}({object}, {spread})"),
                    None => format!("{merge}({spread})"),
                })
            }
            (object, None) => object,
        };
        Ok((props, directives))
    }

    /// `@event.modifiers="handler"` → listener key and handler expression.
    fn listener(&mut self, arg: &str, value: Option<&str>, scope: &[String]) -> GenResult<(String, String)> {
        let (event, modifiers) = split_modifiers(arg);
        if event.is_empty() {
            return Err("v-on object syntax is not supported".to_string());
        }
        if event.starts_with('[') {
            return Err(format!("dynamic event `{event}` is not supported"));
        }

        let mut key = format!("on{}", capitalize(&camelize(event)));
        for option in modifiers.iter().filter(|m| OPTION_MODIFIERS.contains(m)) {
            key.push_str(&capitalize(option));
        }

        let mut handler = match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => "() => {}".to_string(),
            Some(value) if is_member_expression(value) || is_function_expression(value) => {
                self.expr(value, scope)?
            }
            Some(value) => {
                let mut inner = scope.to_vec();
                inner.push("$event".to_string());
                let body = self.expr(value, &inner)?;
                if value.contains(';') {
                    format!("$event => {{ {body} }}")
                } else {
                    format!("$event => ({body})")
                }
            }
        };

        let event_modifiers: Vec<&str> = modifiers
            .iter()
            .copied()
            .filter(|m| EVENT_MODIFIERS.contains(m))
            .collect();
        let key_modifiers: Vec<&str> = modifiers
            .iter()
            .copied()
            .filter(|m| !EVENT_MODIFIERS.contains(m) && !OPTION_MODIFIERS.contains(m))
            .collect();
        if !event_modifiers.is_empty() {
            let with = self.helper(Helper::WithModifiers);
            handler = format!("{with}({handler}, {})", string_array(&event_modifiers));
        }
        if !key_modifiers.is_empty() {
            let with = self.helper(Helper::WithKeys);
            handler = format!("{with}({handler}, {})", string_array(&key_modifiers));
        }

        Ok((key, handler))
    }

    fn model(
        &mut self,
        element: &Element,
        attr: &Attr,
        scope: &[String],
        is_component: bool,
        entries: &mut Vec<(String, String)>,
        directives: &mut Vec<String>,
    ) -> GenResult<()> {
        let spec = attr.name.trim_start_matches("v-model");
        let (arg, modifiers) = split_modifiers(spec.trim_start_matches(':'));
        let target = self.expr(required(attr, "v-model")?, scope)?;
        let prop = if arg.is_empty() { "modelValue" } else { arg };

        entries.push((prop.to_string(), target.clone()));
        entries.push((
            format!("onUpdate:{prop}"),
            format!("$event => (({target}) = $event)"),
        ));

        let flags: Vec<String> = modifiers.iter().map(|m| format!("{m}: true")).collect();
        if is_component {
            if !flags.is_empty() {
                let key = if prop == "modelValue" {
                    "modelModifiers".to_string()
                } else {
                    format!("{prop}Modifiers")
                };
                entries.push((key, format!("{{ {} }}", flags.join(", "))));
            }
            return Ok(());
        }

        if !arg.is_empty() {
            return Err(format!("v-model argument `{arg}` is only valid on components"));
        }
        // Elements take the value through the runtime directive, not a prop.
        entries.retain(|(key, _)| key != "modelValue");

        let input_type = element.attr("type").and_then(|a| a.value.as_deref());
        let dynamic_type = element.attr(":type").is_some() || element.attr("v-bind:type").is_some();
        let directive = match (element.tag.as_str(), input_type) {
            ("select", _) => Helper::VModelSelect,
            ("textarea", _) => Helper::VModelText,
            ("input", _) if dynamic_type => Helper::VModelDynamic,
            ("input", Some("checkbox")) => Helper::VModelCheckbox,
            ("input", Some("radio")) => Helper::VModelRadio,
            ("input", _) => Helper::VModelText,
            (tag, _) => return Err(format!("v-model is not supported on <{tag}>")),
        };
        let directive = self.helper(directive);
        if flags.is_empty() {
            directives.push(format!("[{directive}, {target}]"));
        } else {
            directives.push(format!(
                "[{directive}, {target}, void 0, {{ {} }}]",
                flags.join(", ")
            ));
        }
        Ok(())
    }
}

fn merge_binding(
    gen: &mut Codegen,
    normalize: Helper,
    static_value: Option<String>,
    bound: Option<String>,
) -> Option<String> {
    match (static_value, bound) {
        (None, None) => None,
        (Some(value), None) => Some(value),
        (None, Some(bound)) => Some(format!("{}({bound})", gen.helper(normalize))),
        (Some(value), Some(bound)) => Some(format!("{}([{value}, {bound}])", gen.helper(normalize))),
    }
}

fn required<'a>(attr: &'a Attr, directive: &str) -> GenResult<&'a str> {
    attr.value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("{directive} requires an expression"))
}

fn is_slot_directive(name: &str) -> bool {
    name.starts_with('#') || name == "v-slot" || name.starts_with("v-slot:")
}

/// Slot name and parameter pattern declared by `v-slot` / `#name` on an element.
fn slot_directive(element: &Element) -> GenResult<Option<(String, String)>> {
    let Some(attr) = element.attrs.iter().find(|a| is_slot_directive(&a.name)) else {
        return Ok(None);
    };
    let name = attr
        .name
        .strip_prefix('#')
        .or_else(|| attr.name.strip_prefix("v-slot:"))
        .filter(|n| !n.is_empty())
        .unwrap_or("default");
    if name.starts_with('[') {
        return Err(format!("dynamic slot name `{name}` is not supported"));
    }
    let params = attr.value.as_deref().unwrap_or("").trim().to_string();
    Ok(Some((name.to_string(), params)))
}

fn split_modifiers(arg: &str) -> (&str, Vec<&str>) {
    let mut parts = arg.split('.');
    let name = parts.next().unwrap_or("");
    (name, parts.filter(|m| !m.is_empty()).collect())
}

/// Components start uppercase or contain a hyphen; everything else is a
/// native element.
fn is_component_tag(tag: &str) -> bool {
    tag.starts_with(|c: char| c.is_ascii_uppercase()) || tag.contains('-')
}

fn component_var(tag: &str) -> String {
    let sanitized: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("_component_{sanitized}")
}

fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn prop_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        js_string(name)
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

fn string_array(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| js_string(i)).collect();
    format!("[{}]", quoted.join(", "))
}

fn array(items: &[String]) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    let body: Vec<String> = items.iter().map(|item| indent(item, 2)).collect();
    format!("[\n{}\n]", body.join(",\n"))
}

fn indent(code: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    code.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
