//! Built-in minification for scripts and stylesheets.
//!
//! `None` means the source did not parse; callers keep the original bytes.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::AssetKind;

pub fn minify(kind: AssetKind, content: &str) -> Option<String> {
    match kind {
        AssetKind::Js => script(content),
        AssetKind::Css => stylesheet(content),
    }
}

// Classic script, not a module: merged files share one global scope, and a
// top-level declaration unused here may be used by the next file. No
// compressor pass, and mangling stays below the top level.
fn script(source: &str) -> Option<String> {
    let arena = Allocator::default();
    let parsed = Parser::new(&arena, source, SourceType::cjs()).parse();
    if parsed.panicked || !parsed.errors.is_empty() {
        return None;
    }

    let mut program = parsed.program;
    let minified = Minifier::new(MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: None,
    })
    .minify(&arena, &mut program);

    let options = CodegenOptions {
        minify: true,
        comments: CommentOptions::disabled(),
        ..CodegenOptions::default()
    };
    let code = Codegen::new()
        .with_options(options)
        .with_scoping(minified.scoping)
        .build(&program)
        .code;
    Some(code)
}

fn stylesheet(source: &str) -> Option<String> {
    let sheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let printed = sheet
        .to_css(PrinterOptions { minify: true, ..PrinterOptions::default() })
        .ok()?;
    Some(printed.code)
}
