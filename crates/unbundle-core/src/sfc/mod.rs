//! Single-file component support.
//!
//! The dev server talks to components through two seams:
//!
//! - [`ComponentParser`]: component source → [`SfcDescriptor`]
//! - [`TemplateCompiler`]: template source → render function module
//!
//! Both are pure: text in, text out, no I/O. [`BlockParser`] and
//! [`RenderCompiler`] are the built-in implementations; anything else that
//! honors the traits can be plugged into the server instead.
//!
//! ## Usage
//!
//! ```ignore
//! use unbundle_core::sfc::{BlockParser, ComponentParser, CompileOptions, RenderCompiler, TemplateCompiler};
//!
//! let descriptor = BlockParser::new().parse(source, "App.vue")?;
//! let template = descriptor.template.as_ref().unwrap();
//! let compiled = RenderCompiler::new().compile(&template.content, &CompileOptions::module("App.vue"))?;
//! println!("{}", compiled.code);
//! ```

pub mod codegen;
pub mod expr;
pub mod html;
pub mod parse;

pub use codegen::RenderCompiler;
pub use parse::BlockParser;

use crate::error::DevError;
use std::collections::BTreeMap;

/// One top-level block of a component file (`<template>`, `<script>`, `<style>`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfcBlock {
    /// Tag name of the block.
    pub block_type: String,
    /// Raw text between the opening and closing tags.
    pub content: String,
    /// Attributes on the opening tag. Boolean attributes map to `"true"`.
    pub attrs: BTreeMap<String, String>,
}

impl SfcBlock {
    /// The `lang` attribute, if any.
    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.attrs.get("lang").map(String::as_str)
    }

    /// Whether a boolean attribute such as `scoped` or `setup` is present.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }
}

/// Parsed component: its script, template and style sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SfcDescriptor {
    /// Source file name, for diagnostics.
    pub filename: String,
    pub script: Option<SfcBlock>,
    pub template: Option<SfcBlock>,
    pub styles: Vec<SfcBlock>,
    /// Blocks the server does not interpret (`<docs>`, `<i18n>`, ...).
    pub custom_blocks: Vec<SfcBlock>,
}

/// Splits component source into a descriptor.
pub trait ComponentParser: Send + Sync {
    fn parse(&self, source: &str, filename: &str) -> Result<SfcDescriptor, DevError>;
}

/// Output flavor of a compiled template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileMode {
    /// ES module: imports helpers from `vue`, exports `render`.
    #[default]
    Module,
    /// Function body: reads helpers from a global `Vue`, returns `render`.
    Function,
}

/// Template compilation options.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub mode: CompileMode,
    /// Source file name, for diagnostics.
    pub filename: String,
}

impl CompileOptions {
    /// Module-mode options for the given file.
    #[must_use]
    pub fn module(filename: impl Into<String>) -> Self {
        Self {
            mode: CompileMode::Module,
            filename: filename.into(),
        }
    }
}

/// Generated render function code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    pub code: String,
}

/// Compiles a template into a render function.
pub trait TemplateCompiler: Send + Sync {
    fn compile(
        &self,
        template: &str,
        options: &CompileOptions,
    ) -> Result<CompiledTemplate, DevError>;
}
