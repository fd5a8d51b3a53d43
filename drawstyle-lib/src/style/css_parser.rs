//! Comment-preserving stylesheet parser on top of the `cssparser` tokenizer.
//!
//! `lightningcss` normalizes and drops comments, which would lose the
//! `--- CATEGORY ---` markers the stylesheet is organized by, so the tree is
//! built straight from tokens instead.

use cssparser::{ParseError, Parser, ParserInput, SourcePosition, Token};
use log::warn;

use crate::error::StyleError;
use crate::style::stylesheet::{AtRule, AtRuleBody, Comment, CssNode, Declaration, Rule, RuleComment, Stylesheet};

/// At-rules whose block holds rules rather than declarations.
const GROUPING_AT_RULES: &[&str] = &["media", "supports", "document", "layer", "container", "scope"];

/// Parses `css` into a [`Stylesheet`], failing on malformed input.
///
/// # Arguments
///
/// * `css` - The stylesheet text.
///
/// # Returns
///
/// The parsed tree, or a `StyleError::Parse` naming the first offending line.
pub fn parse_stylesheet(css: &str) -> Result<Stylesheet, StyleError> {
    parse_nodes(css, 0)
}

/// Parses `css`, logging and returning an empty stylesheet when it is malformed.
pub fn parse_or_empty(css: &str) -> Stylesheet {
    match parse_stylesheet(css) {
        Ok(sheet) => sheet,
        Err(err) => {
            warn!("stylesheet could not be parsed, continuing with an empty one: {err}");
            Stylesheet::new()
        }
    }
}

/// Splits a selector list on its top-level commas.
///
/// Commas inside brackets or parentheses (`:is(a, b)`, `[title="a,b"]`) do not split.
pub fn split_selector_list(prelude: &str) -> Vec<String> {
    let mut input = ParserInput::new(prelude);
    let mut parser = Parser::new(&mut input);
    let mut selectors = Vec::new();
    let mut start = parser.position();
    loop {
        let token_start = parser.position();
        match parser.next_including_whitespace_and_comments().cloned() {
            Ok(Token::Comma) => {
                selectors.push(parser.slice(start..token_start).trim().to_owned());
                start = parser.position();
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    selectors.push(parser.slice_from(start).trim().to_owned());
    selectors.retain(|s| !s.is_empty());
    selectors
}

fn error_at(parser: &Parser<'_, '_>, line_offset: u32, message: impl Into<String>) -> StyleError {
    StyleError::Parse {
        line: parser.current_source_location().line + line_offset + 1,
        message: message.into(),
    }
}

fn consume_block<'i>(block: &mut Parser<'i, '_>) -> Result<&'i str, ParseError<'i, ()>> {
    let start = block.position();
    while block.next_including_whitespace_and_comments().is_ok() {}
    Ok(block.slice_from(start))
}

/// Reads the body of the `{}` block the parser just entered and checks that it was closed.
fn read_block<'i>(parser: &mut Parser<'i, '_>, line_offset: u32) -> Result<(&'i str, u32), StyleError> {
    let body_line = parser.current_source_location().line + line_offset;
    let block_start = parser.position();
    let body = parser
        .parse_nested_block(|block| consume_block(block))
        .map_err(|_| StyleError::Parse {
            line: body_line + 1,
            message: "malformed block".to_owned(),
        })?;
    // The body stops before the block's own `}`; at end of input nothing follows it.
    if parser.slice_from(block_start).len() == body.len() {
        return Err(StyleError::Parse {
            line: body_line + 1,
            message: "unclosed block".to_owned(),
        });
    }
    Ok((body, body_line))
}

fn parse_nodes(css: &str, line_offset: u32) -> Result<Stylesheet, StyleError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut sheet = Stylesheet::new();
    let mut before = String::new();
    let mut block: Option<String> = None;

    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments().cloned() {
            Ok(token) => token,
            Err(_) => break,
        };
        match token {
            Token::WhiteSpace(ws) => before.push_str(ws),
            Token::Comment(text) => {
                let raw = parser.slice_from(start);
                if raw.len() < 4 || !raw.ends_with("*/") {
                    return Err(error_at(&parser, line_offset, "unclosed comment"));
                }
                let mut comment = Comment::new(text);
                comment.before = std::mem::take(&mut before);
                if let Some(label) = comment.block_label() {
                    block = Some(label.to_owned());
                }
                sheet.push(CssNode::Comment(comment));
            }
            Token::CDO | Token::CDC | Token::Semicolon => {}
            Token::CloseCurlyBracket => {
                return Err(error_at(&parser, line_offset, "unexpected `}`"));
            }
            Token::BadString(_) | Token::BadUrl(_) => {
                return Err(error_at(&parser, line_offset, "unterminated string or url"));
            }
            Token::AtKeyword(name) => {
                let mut at_rule = parse_at_rule(&mut parser, start, name.to_string(), line_offset)?;
                at_rule.before = std::mem::take(&mut before);
                sheet.push(CssNode::AtRule(at_rule));
            }
            first => {
                let mut rule = parse_qualified_rule(&mut parser, start, &first, line_offset)?;
                rule.before = std::mem::take(&mut before);
                rule.set_block(block.clone());
                sheet.push(CssNode::Rule(rule.into_handle()));
            }
        }
    }
    sheet.after = before;
    Ok(sheet)
}

fn parse_qualified_rule<'i>(
    parser: &mut Parser<'i, '_>,
    start: SourcePosition,
    first: &Token<'i>,
    line_offset: u32,
) -> Result<Rule, StyleError> {
    let mut prelude_end = start;
    if !matches!(first, Token::CurlyBracketBlock) {
        loop {
            prelude_end = parser.position();
            match parser.next_including_whitespace_and_comments().cloned() {
                Ok(Token::CurlyBracketBlock) => break,
                Ok(Token::Semicolon) => {
                    return Err(error_at(parser, line_offset, "unknown word before `;`"));
                }
                Ok(Token::CloseCurlyBracket) => {
                    return Err(error_at(parser, line_offset, "unexpected `}`"));
                }
                Ok(Token::BadString(_)) | Ok(Token::BadUrl(_)) => {
                    return Err(error_at(parser, line_offset, "unterminated string or url"));
                }
                Ok(_) => {}
                Err(_) => return Err(error_at(parser, line_offset, "selector without a block")),
            }
        }
    }
    let selectors = split_selector_list(parser.slice(start..prelude_end));
    if selectors.is_empty() {
        return Err(error_at(parser, line_offset, "rule without a selector"));
    }
    let (body, body_line) = read_block(parser, line_offset)?;
    let (declarations, comments) = parse_declarations(body, body_line)?;
    let mut rule = Rule::with_selectors(selectors);
    rule.replace_declarations(declarations);
    rule.set_source(parser.slice_from(start).to_owned(), comments);
    Ok(rule)
}

fn parse_at_rule<'i>(
    parser: &mut Parser<'i, '_>,
    start: SourcePosition,
    name: String,
    line_offset: u32,
) -> Result<AtRule, StyleError> {
    let params_start = parser.position();
    loop {
        let token_start = parser.position();
        match parser.next_including_whitespace_and_comments().cloned() {
            Ok(Token::Semicolon) => {
                return Ok(AtRule {
                    name,
                    params: parser.slice(params_start..token_start).trim().to_owned(),
                    body: None,
                    raw: Some(parser.slice_from(start).to_owned()),
                    before: String::new(),
                });
            }
            Ok(Token::CurlyBracketBlock) => {
                let params = parser.slice(params_start..token_start).trim().to_owned();
                let (body, body_line) = read_block(parser, line_offset)?;
                let (body, raw) = if GROUPING_AT_RULES.contains(&name.to_ascii_lowercase().as_str()) {
                    (AtRuleBody::Nodes(parse_nodes(body, body_line)?), None)
                } else {
                    let (declarations, _) = parse_declarations(body, body_line)?;
                    (
                        AtRuleBody::Declarations(declarations),
                        Some(parser.slice_from(start).to_owned()),
                    )
                };
                return Ok(AtRule {
                    name,
                    params,
                    body: Some(body),
                    raw,
                    before: String::new(),
                });
            }
            Ok(Token::CloseCurlyBracket) => {
                return Err(error_at(parser, line_offset, "unexpected `}`"));
            }
            Ok(Token::BadString(_)) | Ok(Token::BadUrl(_)) => {
                return Err(error_at(parser, line_offset, "unterminated string or url"));
            }
            Ok(_) => {}
            Err(_) => {
                return Ok(AtRule {
                    name,
                    params: parser.slice_from(params_start).trim().to_owned(),
                    body: None,
                    raw: Some(parser.slice_from(start).to_owned()),
                    before: String::new(),
                });
            }
        }
    }
}

/// Parses the inside of a rule block into declarations, in source order, and
/// the comments standing between them.
fn parse_declarations(
    body: &str,
    line_offset: u32,
) -> Result<(Vec<Declaration>, Vec<RuleComment>), StyleError> {
    let mut input = ParserInput::new(body);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();
    let mut comments: Vec<(String, usize)> = Vec::new();
    let mut start = parser.position();
    let mut at_start = true;

    loop {
        let token_start = parser.position();
        let token = match parser.next_including_whitespace_and_comments().cloned() {
            Ok(token) => token,
            Err(_) => break,
        };
        match token {
            Token::Comment(text) => {
                let raw = parser.slice_from(token_start);
                if raw.len() < 4 || !raw.ends_with("*/") {
                    return Err(error_at(&parser, line_offset, "unclosed comment"));
                }
                if at_start {
                    comments.push((text.to_owned(), declarations.len()));
                    start = parser.position();
                }
            }
            Token::WhiteSpace(_) if at_start => start = parser.position(),
            Token::Semicolon => {
                push_declaration(&mut declarations, parser.slice(start..token_start), &parser, line_offset)?;
                start = parser.position();
                at_start = true;
            }
            Token::CurlyBracketBlock => {
                warn!(
                    "nested rule `{}` is not editable and is lost once its parent is rewritten",
                    parser.slice(start..token_start).trim()
                );
                read_block(&mut parser, line_offset)?;
                start = parser.position();
                at_start = true;
            }
            Token::BadString(_) | Token::BadUrl(_) => {
                return Err(error_at(&parser, line_offset, "unterminated string or url"));
            }
            _ => at_start = false,
        }
    }
    push_declaration(&mut declarations, parser.slice_from(start), &parser, line_offset)?;
    let comments = comments
        .into_iter()
        .map(|(text, position)| RuleComment {
            text,
            next_property: declarations.get(position).map(|d: &Declaration| d.property.clone()),
        })
        .collect();
    Ok((declarations, comments))
}

fn push_declaration(
    declarations: &mut Vec<Declaration>,
    raw: &str,
    parser: &Parser<'_, '_>,
    line_offset: u32,
) -> Result<(), StyleError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }
    let Some((property, value)) = raw.split_once(':') else {
        return Err(error_at(parser, line_offset, format!("unknown word `{raw}`")));
    };
    let property = property.trim();
    if property.is_empty() {
        return Err(error_at(parser, line_offset, "declaration without a property"));
    }
    let (value, important) = split_important_tail(value);
    declarations.push(Declaration {
        property: property.to_owned(),
        value,
        important,
    });
    Ok(())
}

fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    if let Some(pos) = trimmed.rfind('!') {
        if trimmed[pos + 1..].trim().eq_ignore_ascii_case("important") {
            return (trimmed[..pos].trim_end().to_owned(), true);
        }
    }
    (trimmed.to_owned(), false)
}
