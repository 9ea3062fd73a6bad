//! Module reference rewriting for declaration files
//!
//! Statements are recognized by pattern matching over the raw text, not by
//! parsing. Three single-line shapes are handled:
//!
//! - `import <bindings> from '<module>'`
//! - `import '<module>'`
//! - `export <bindings> from '<module>'`
//!
//! Known limitations, kept on purpose since declaration files rarely hit them:
//! a statement split across lines is left alone, text inside comments or
//! string literals that looks like one of the shapes is rewritten anyway, and
//! the module capture is greedy up to the last quote on the line.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::path::NamespacedPath;
use crate::resolver::resolve;

lazy_static! {
    static ref NAMED_IMPORT: Regex =
        Regex::new(r#"import\s(?P<bindings>.+)\sfrom\s['"](?P<module>.+)['"]"#).unwrap();
    static ref BARE_IMPORT: Regex = Regex::new(r#"import\s['"](?P<module>.+)['"]"#).unwrap();
    static ref RE_EXPORT: Regex =
        Regex::new(r#"export\s(?P<bindings>.+)\sfrom\s['"](?P<module>.+)['"]"#).unwrap();
}

/// Rewrites the module references of one declaration file.
///
/// Implementations must be pure: the output depends only on the text and the
/// path handed in.
pub trait StatementRewriter: Send + Sync {
    /// Replace every recognized module reference in `text` with its resolved
    /// form, as seen from the file at `current_file`.
    fn rewrite_references(&self, text: &str, current_file: &str) -> String;

    /// Rewrite references and wrap the result in the file's module block.
    ///
    /// Call once per file; wrapping twice nests two blocks.
    fn rewrite(&self, text: &str, path: &NamespacedPath) -> String {
        wrap(&self.rewrite_references(text, path.file()), path.module())
    }
}

/// Regex-driven [`StatementRewriter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternRewriter;

impl PatternRewriter {
    pub fn new() -> Self {
        Self
    }
}

impl StatementRewriter for PatternRewriter {
    fn rewrite_references(&self, text: &str, current_file: &str) -> String {
        let text = rewrite_pass(&NAMED_IMPORT, text, current_file);
        let text = rewrite_pass(&BARE_IMPORT, &text, current_file);
        rewrite_pass(&RE_EXPORT, &text, current_file)
    }
}

/// Splice resolved references into `text` for every match of `pattern`.
///
/// Only the `module` capture is replaced; the rest of each statement is
/// copied byte for byte.
fn rewrite_pass(pattern: &Regex, text: &str, current_file: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in pattern.captures_iter(text) {
        let Some(module) = caps.name("module") else {
            continue;
        };

        let resolved = resolve(current_file, module.as_str());
        if resolved != module.as_str() {
            trace!(from = current_file, reference = module.as_str(), resolved = %resolved, "rewrote module reference");
        }

        out.push_str(&text[last..module.start()]);
        out.push_str(&resolved);
        last = module.end();
    }

    out.push_str(&text[last..]);
    out
}

/// Enclose `text` in an ambient module declaration named `module`.
pub fn wrap(text: &str, module: &str) -> String {
    format!("declare module '{}' {{\n{}\n}}", module, text)
}
