//! JavaScript minification with oxc

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::TransformError;

/// Minify a classic (non-module) browser script
///
/// Top-level names are globals shared between scripts and are never
/// renamed; only locals are mangled when `mangle` is set.
pub fn minify_js(source: &str, mangle: bool) -> Result<String, TransformError> {
    let allocator = Allocator::default();
    let source_type = SourceType::script();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        return Err(TransformError::Script(error.to_string()));
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: mangle.then(MangleOptions::default),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_strips_comments_and_whitespace() {
        let source = r#"
            // toggles the menu
            function toggleMenu(element) {
                /* block comment */
                var isOpen = element.classList.contains("open");
                element.classList.toggle("open", !isOpen);
            }
        "#;

        let minified = minify_js(source, true).unwrap();

        assert!(minified.len() < source.len());
        assert!(!minified.contains("toggles the menu"));
        assert!(!minified.contains("block comment"));
        assert!(minified.contains("toggleMenu"));
    }

    #[test]
    fn test_locals_are_mangled_only_when_enabled() {
        let source = "function area(width, height) { return width * height; }";

        let mangled = minify_js(source, true).unwrap();
        assert!(!mangled.contains("width"));

        let kept = minify_js(source, false).unwrap();
        assert!(kept.contains("width"));
    }

    #[test]
    fn test_top_level_declarations_are_kept() {
        let minified = minify_js("var config = { a: 1 };\nfunction init() { return config.a; }", true).unwrap();

        assert!(minified.contains("config"));
        assert!(minified.contains("init"));
    }

    #[test]
    fn test_parse_error() {
        let err = minify_js("function (", true).unwrap_err();
        assert!(matches!(err, TransformError::Script(_)));
    }
}
