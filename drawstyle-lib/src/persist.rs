//! Writing an edited stylesheet back to disk.
//!
//! The external `.css` file and the `<style>` block of the drawing always
//! receive the same text in the same call.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use log::info;
use regex::{NoExpand, Regex};

use crate::error::StyleError;

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<style[^>]*>.*?</style>").expect("static regex"));

static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\r?\n){2,}").expect("static regex"));

/// Collapses every run of two or more newlines into one, except runs followed
/// by a comment, which keep the category blocks visually apart. Lines holding
/// only spaces or tabs break a run and are kept.
pub fn tidy_blank_lines(css: &str) -> String {
    let mut tidied = String::with_capacity(css.len());
    let mut last = 0;
    for run in NEWLINE_RUN.find_iter(css) {
        if css[run.end()..].trim_start().starts_with("/*") {
            continue;
        }
        tidied.push_str(&css[last..run.start()]);
        tidied.push('\n');
        last = run.end();
    }
    tidied.push_str(&css[last..]);
    tidied
}

/// The `<style>` element the stylesheet is mirrored into.
pub fn style_block(css: &str) -> String {
    format!("<style type=\"text/css\"><![CDATA[{css}]]></style>")
}

/// Replaces the first `<style>` element of `svg` with one holding `css`, or
/// adds one before the closing `</svg>`.
pub fn replace_style_block(svg: &str, css: &str) -> String {
    let block = style_block(css);
    if STYLE_BLOCK.is_match(svg) {
        return STYLE_BLOCK.replace(svg, NoExpand(&block)).into_owned();
    }
    match svg.rfind("</svg>") {
        Some(at) => format!("{}{block}\n{}", &svg[..at], &svg[at..]),
        None => format!("{svg}{block}"),
    }
}

/// Writes `css` to the external stylesheet (when there is one) and into the
/// drawing's `<style>` block.
///
/// # Arguments
///
/// * `css_path` - The external stylesheet, or `None` for drawings without one.
/// * `svg_path` - The drawing file, rewritten in place.
/// * `css` - The stylesheet text.
///
/// # Returns
///
/// The text that was written, after blank-line tidying.
pub fn save_stylesheet(css_path: Option<&Path>, svg_path: &Path, css: &str) -> Result<String, StyleError> {
    let css = tidy_blank_lines(css);
    if let Some(path) = css_path {
        fs::write(path, &css).map_err(|err| StyleError::io(path, err))?;
        info!("stylesheet written to {}", path.display());
    }
    let svg = fs::read_to_string(svg_path).map_err(|err| StyleError::io(svg_path, err))?;
    fs::write(svg_path, replace_style_block(&svg, &css)).map_err(|err| StyleError::io(svg_path, err))?;
    info!("style block of {} updated", svg_path.display());
    Ok(css)
}

/// Appends `markup` to the `<defs>` of a resource file, creating the `<defs>`
/// when the file has none.
pub fn append_definition_to_file(path: &Path, markup: &str) -> Result<(), StyleError> {
    let svg = fs::read_to_string(path).map_err(|err| StyleError::io(path, err))?;
    let updated = match (svg.find("</defs>"), svg.rfind("</svg>")) {
        (Some(at), _) => format!("{}{markup}\n{}", &svg[..at], &svg[at..]),
        (None, Some(at)) => format!("{}<defs>{markup}</defs>\n{}", &svg[..at], &svg[at..]),
        (None, None) => return Err(StyleError::MissingSvgRoot),
    };
    fs::write(path, updated).map_err(|err| StyleError::io(path, err))?;
    info!("definition added to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tidy_keeps_gaps_above_comments() {
        let css = "/* --- DEFAULT --- */\n.a {\n    fill: red;\n}\n\n\n.b {}\n\n/* --- EPSet STYLES --- */\n\n\n.c {}\n";
        assert_eq!(
            tidy_blank_lines(css),
            "/* --- DEFAULT --- */\n.a {\n    fill: red;\n}\n.b {}\n\n/* --- EPSet STYLES --- */\n.c {}\n"
        );
        assert_eq!(tidy_blank_lines("a\n\n"), "a\n");
    }

    #[test]
    fn test_tidy_only_collapses_bare_newline_runs() {
        assert_eq!(tidy_blank_lines(".a {}\n    \n.b {}\n"), ".a {}\n    \n.b {}\n");
        assert_eq!(tidy_blank_lines(".a {}\r\n\r\n.b {}\r\n"), ".a {}\n.b {}\r\n");
        assert_eq!(
            tidy_blank_lines(".a {}\n\n\n  /* --- DEFAULT --- */\n"),
            ".a {}\n\n\n  /* --- DEFAULT --- */\n"
        );
    }

    #[test]
    fn test_replace_existing_style_block() {
        let svg = "<svg><style type=\"text/css\"><![CDATA[.old {}]]></style><g/></svg>";
        assert_eq!(
            replace_style_block(svg, ".new { fill: url(#a$1); }"),
            "<svg><style type=\"text/css\"><![CDATA[.new { fill: url(#a$1); }]]></style><g/></svg>"
        );
    }

    #[test]
    fn test_insert_style_block_before_closing_tag() {
        assert_eq!(
            replace_style_block("<svg><g/></svg>", ".a {}"),
            "<svg><g/><style type=\"text/css\"><![CDATA[.a {}]]></style>\n</svg>"
        );
    }

    #[test]
    fn test_save_writes_both_copies() {
        let dir = tempfile::tempdir().unwrap();
        let css_path = dir.path().join("plan.css");
        let svg_path = dir.path().join("plan.svg");
        fs::write(&svg_path, "<svg><style>.old {}</style></svg>").unwrap();

        let written = save_stylesheet(Some(&css_path), &svg_path, ".a {}\n\n\n.b {}\n").unwrap();
        assert_eq!(written, ".a {}\n.b {}\n");
        assert_eq!(fs::read_to_string(&css_path).unwrap(), written);
        assert_eq!(
            fs::read_to_string(&svg_path).unwrap(),
            "<svg><style type=\"text/css\"><![CDATA[.a {}\n.b {}\n]]></style></svg>"
        );
    }

    #[test]
    fn test_append_definition_to_resource_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.svg");
        fs::write(&path, "<svg><defs><pattern id=\"a\"/></defs></svg>").unwrap();
        append_definition_to_file(&path, "<pattern id=\"b\"/>").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<svg><defs><pattern id=\"a\"/><pattern id=\"b\"/>\n</defs></svg>"
        );
    }
}
