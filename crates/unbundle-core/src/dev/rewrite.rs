//! Import specifier rewriting for unbundled dev serving.
//!
//! Browsers cannot resolve bare specifiers (`vue`, `@scope/pkg`), so every
//! bare specifier in an import is redirected to the package-import route:
//!
//! - `import { createApp } from 'vue'` → `from '/@modules/vue'`
//! - `export * from "@scope/pkg"` → `from "/@modules/@scope/pkg"`
//! - `import 'pkg/polyfill'` → `import '/@modules/pkg/polyfill'`
//! - `import('lodash')` → `import('/@modules/lodash')`
//!
//! Relative (`./x`, `../x`) and absolute (`/x`) specifiers are left alone, so
//! rewriting already-rewritten output is a no-op. Specifiers are located with
//! the token scanner, never inside string, template or regex literal content.

use crate::dev::scan::{tokenize, TokenKind};
use std::ops::Range;

/// URL prefix under which package imports are served.
pub const MODULES_PREFIX: &str = "/@modules/";

/// Syntactic position of an import specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import x from '...'`, `export { x } from '...'`, `export * from '...'`.
    From,
    /// `import '...'`.
    SideEffect,
    /// `import('...')`.
    Dynamic,
}

/// Import specifier located in module source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    /// Specifier text as written.
    pub specifier: String,
    /// Byte range of the specifier, quotes excluded.
    pub range: Range<usize>,
    /// Quote byte the specifier was written with.
    pub quote: u8,
    pub kind: ImportKind,
}

/// Whether a specifier names a package rather than a file path.
#[must_use]
pub fn is_bare_specifier(specifier: &str) -> bool {
    !specifier.starts_with('.') && !specifier.starts_with('/')
}

/// Package-import route for a bare specifier.
#[must_use]
pub fn package_route(specifier: &str) -> String {
    format!("{MODULES_PREFIX}{specifier}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    From,
    Import,
    ImportCall,
}

/// Find every import specifier in module source, in source order.
#[must_use]
pub fn scan_import_specifiers(code: &str) -> Vec<ImportSpecifier> {
    let tokens = tokenize(code);
    let mut found = Vec::new();
    let mut pending = Pending::None;
    let mut after_dot = false;

    for token in &tokens {
        pending = match token.kind {
            TokenKind::Ident if !after_dot && token.is_ident(code, "from") => Pending::From,
            TokenKind::Ident if !after_dot && token.is_ident(code, "import") => Pending::Import,
            TokenKind::Punct(b'(') if pending == Pending::Import => Pending::ImportCall,
            TokenKind::Str { quote } if pending != Pending::None => {
                if let Some(range) = token.string_contents(code) {
                    let kind = match pending {
                        Pending::From => ImportKind::From,
                        Pending::Import => ImportKind::SideEffect,
                        _ => ImportKind::Dynamic,
                    };
                    found.push(ImportSpecifier {
                        specifier: code[range.clone()].to_string(),
                        range,
                        quote,
                        kind,
                    });
                }
                Pending::None
            }
            _ => Pending::None,
        };
        after_dot = token.kind == TokenKind::Dot;
    }

    found
}

/// Rewrite every bare import specifier to its package-import route.
///
/// Quote style and all surrounding text are preserved byte for byte.
#[must_use]
pub fn rewrite_imports(code: &str) -> String {
    let mut result = String::with_capacity(code.len() + 64);
    let mut last = 0;

    for import in scan_import_specifiers(code) {
        if !is_bare_specifier(&import.specifier) {
            continue;
        }
        result.push_str(&code[last..import.range.start]);
        result.push_str(&package_route(&import.specifier));
        last = import.range.end;
    }

    result.push_str(&code[last..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_bare_specifier() {
        let code = "import { createApp } from 'vue'";
        assert_eq!(
            rewrite_imports(code),
            "import { createApp } from '/@modules/vue'"
        );
    }

    #[test]
    fn test_rewrite_preserves_double_quotes() {
        let code = r#"import lodash from "lodash";"#;
        assert_eq!(
            rewrite_imports(code),
            r#"import lodash from "/@modules/lodash";"#
        );
    }

    #[test]
    fn test_rewrite_scoped_and_dotted_names_verbatim() {
        let code = "import a from '@vue/runtime-dom'\nimport b from 'lodash.debounce'";
        let result = rewrite_imports(code);
        assert!(result.contains("from '/@modules/@vue/runtime-dom'"));
        assert!(result.contains("from '/@modules/lodash.debounce'"));
    }

    #[test]
    fn test_relative_and_absolute_untouched() {
        let code = "import a from './a.js'\nimport b from '../b.js'\nimport c from '/src/c.js'";
        assert_eq!(rewrite_imports(code), code);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let code = "import { h } from 'vue'\nexport * from 'pkg/sub'";
        let once = rewrite_imports(code);
        let twice = rewrite_imports(&once);
        assert_eq!(once, twice);
        assert!(!twice.contains("/@modules//@modules/"));
    }

    #[test]
    fn test_rewrite_export_from() {
        let code = "export { foo } from 'bar';\nexport * from \"baz\";";
        let result = rewrite_imports(code);
        assert!(result.contains("from '/@modules/bar'"));
        assert!(result.contains("from \"/@modules/baz\""));
    }

    #[test]
    fn test_rewrite_side_effect_and_dynamic_imports() {
        let code = "import 'normalize.css/x';\nconst mod = import('lodash');";
        let result = rewrite_imports(code);
        assert!(result.contains("import '/@modules/normalize.css/x'"));
        assert!(result.contains("import('/@modules/lodash')"));
    }

    #[test]
    fn test_multiline_import() {
        let code = "import {\n  ref,\n  computed,\n} from 'vue'\n";
        assert!(rewrite_imports(code).contains("} from '/@modules/vue'"));
    }

    #[test]
    fn test_minified_import_without_spaces() {
        let code = "import{h}from\"vue\";";
        assert_eq!(rewrite_imports(code), "import{h}from\"/@modules/vue\";");
    }

    #[test]
    fn test_string_contents_untouched() {
        let code = r#"const msg = "import x from 'vue'";
const tpl = `from 'react'`;
const re = /from 'preact'/;
// import y from 'svelte'
import z from 'vue'"#;
        let result = rewrite_imports(code);
        assert!(result.contains(r#""import x from 'vue'""#));
        assert!(result.contains("`from 'react'`"));
        assert!(result.contains("/from 'preact'/"));
        assert!(result.contains("// import y from 'svelte'"));
        assert!(result.contains("import z from '/@modules/vue'"));
    }

    #[test]
    fn test_regex_statement_after_if_untouched() {
        let code = "if (a) /from 'x'/.test(s)\nimport v from 'vue'";
        assert_eq!(
            rewrite_imports(code),
            "if (a) /from 'x'/.test(s)\nimport v from '/@modules/vue'"
        );
    }

    #[test]
    fn test_import_inside_template_expression() {
        let code = "const m = `${await import('dayjs')}`";
        assert!(rewrite_imports(code).contains("import('/@modules/dayjs')"));
    }

    #[test]
    fn test_member_named_from_is_ignored() {
        let code = "const a = Array.from('abc'); obj.from 'x'";
        assert_eq!(rewrite_imports(code), code);
    }

    #[test]
    fn test_import_meta_is_ignored() {
        let code = "const url = import.meta.url; const s = 'vue';";
        assert_eq!(rewrite_imports(code), code);
    }

    #[test]
    fn test_scan_import_kinds() {
        let code = "import a from 'a'\nimport 'b'\nimport('c')";
        let found = scan_import_specifiers(code);
        let kinds: Vec<_> = found.iter().map(|i| (i.specifier.as_str(), i.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("a", ImportKind::From),
                ("b", ImportKind::SideEffect),
                ("c", ImportKind::Dynamic),
            ]
        );
        assert_eq!(&code[found[0].range.clone()], "a");
        assert_eq!(found[0].quote, b'\'');
    }

    #[test]
    fn test_is_bare_specifier() {
        assert!(is_bare_specifier("vue"));
        assert!(is_bare_specifier("@scope/pkg"));
        assert!(!is_bare_specifier("./App.vue"));
        assert!(!is_bare_specifier("../util.js"));
        assert!(!is_bare_specifier("/@modules/vue"));
    }
}
