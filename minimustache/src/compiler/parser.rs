use std::borrow::Cow;

use crate::compiler::ast::{self, Spanned};
use crate::compiler::lexer::TokenFilter;
use crate::compiler::tokens::{Span, Token};
use crate::error::{Error, ErrorKind};
use crate::utils::ContentType;

const MAX_RECURSION: usize = 150;

const PRAGMA_CONTENT_TYPE_TEXT: &str = "CONTENT_TYPE:TEXT";
const PRAGMA_CONTENT_TYPE_HTML: &str = "CONTENT_TYPE:HTML";

fn syntax_error(msg: Cow<'static, str>) -> Error {
    Error::new(ErrorKind::SyntaxError, msg)
}

macro_rules! syntax_error {
    ($msg:expr) => {{
        return Err(syntax_error(Cow::Borrowed($msg)));
    }};
    ($msg:expr, $($tt:tt)*) => {{
        return Err(syntax_error(Cow::Owned(format!($msg, $($tt)*))));
    }};
}

macro_rules! with_recursion_guard {
    ($parser:expr, $expr:expr) => {{
        $parser.depth += 1;
        if $parser.depth > MAX_RECURSION {
            return Err(syntax_error(Cow::Borrowed(
                "template exceeds maximum recursion limits",
            )));
        }
        let rv = $expr;
        $parser.depth -= 1;
        rv
    }};
}

struct TokenStream<'a> {
    filter: TokenFilter<'a>,
    last_span: Span,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> TokenStream<'a> {
        TokenStream {
            filter: TokenFilter::new(source),
            last_span: Span::default(),
        }
    }

    /// Advance the stream.
    pub fn next(&mut self) -> Result<Option<(Token<'a>, Span)>, Error> {
        let rv = ok!(self.filter.next_token());
        if let Some((_, span)) = rv {
            self.last_span = span;
        }
        Ok(rv)
    }

    /// Expands the span to the last seen token.
    #[inline(always)]
    pub fn expand_span(&self, mut span: Span) -> Span {
        span.end_line = self.last_span.end_line;
        span.end_col = self.last_span.end_col;
        span.end_offset = self.last_span.end_offset;
        span
    }

    /// Returns the last seen span.
    #[inline(always)]
    pub fn last_span(&self) -> Span {
        self.last_span
    }
}

struct Parser<'a> {
    stream: TokenStream<'a>,
    source: &'a str,
    filename: &'a str,
    content_type: Option<ContentType>,
    saw_rendering_tag: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str, filename: &'a str) -> Parser<'a> {
        Parser {
            stream: TokenStream::new(source),
            source,
            filename,
            content_type: None,
            saw_rendering_tag: false,
            depth: 0,
        }
    }

    /// Parses a template.
    pub fn parse(&mut self) -> Result<ast::Template<'a>, Error> {
        self.subparse(None)
            .map(|(children, _)| ast::Template {
                children,
                content_type: self.content_type,
            })
            .map_err(|err| self.attach_location_to_error(err))
    }

    fn subparse(
        &mut self,
        open_expr: Option<&ast::Expr<'a>>,
    ) -> Result<(Vec<ast::Tag<'a>>, Span), Error> {
        let mut rv = Vec::new();
        while let Some((token, span)) = ok!(self.stream.next()) {
            match token {
                Token::TemplateData(raw) => {
                    rv.push(ast::Tag::EmitRaw(Spanned::new(ast::EmitRaw { raw }, span)));
                }
                Token::Variable(content) => {
                    self.saw_rendering_tag = true;
                    let expr = ok!(parse_expr(content, span));
                    rv.push(ast::Tag::Variable(Spanned::new(
                        ast::Variable { expr, escape: true },
                        span,
                    )));
                }
                Token::UnescapedVariable(content) => {
                    self.saw_rendering_tag = true;
                    let expr = ok!(parse_expr(content, span));
                    rv.push(ast::Tag::Variable(Spanned::new(
                        ast::Variable {
                            expr,
                            escape: false,
                        },
                        span,
                    )));
                }
                Token::SectionOpen(content) | Token::InvertedSectionOpen(content) => {
                    self.saw_rendering_tag = true;
                    let inverted = matches!(token, Token::InvertedSectionOpen(_));
                    let expr = ok!(parse_expr(content, span));
                    let (body, close_span) =
                        ok!(with_recursion_guard!(self, self.subparse(Some(&expr))));
                    let inner =
                        &self.source[span.end_offset as usize..close_span.start_offset as usize];
                    rv.push(ast::Tag::Section(Spanned::new(
                        ast::Section {
                            expr,
                            inverted,
                            body,
                            inner,
                        },
                        self.stream.expand_span(span),
                    )));
                }
                Token::SectionClose(content) => {
                    let open_expr = match open_expr {
                        Some(expr) => expr,
                        None => {
                            return Err(Error::new(
                                ErrorKind::TagMismatch,
                                "closing tag without open section",
                            ))
                        }
                    };
                    // an empty closing tag always closes the innermost
                    // section
                    if !content.is_empty() {
                        let close_expr = ok!(parse_expr(content, span));
                        if close_expr != *open_expr {
                            return Err(Error::new(
                                ErrorKind::TagMismatch,
                                format!("section closed with unmatched tag {{{{/{content}}}}}"),
                            ));
                        }
                    }
                    return Ok((rv, span));
                }
                Token::Partial(name) => {
                    self.saw_rendering_tag = true;
                    if name.is_empty() {
                        syntax_error!("missing partial name");
                    }
                    rv.push(ast::Tag::Partial(Spanned::new(ast::Partial { name }, span)));
                }
                Token::Pragma(content) => {
                    ok!(self.handle_pragma(content));
                }
                Token::Comment | Token::SetDelimiters => {}
            }
        }
        if open_expr.is_some() {
            syntax_error!("unclosed section");
        }
        Ok((rv, self.stream.last_span()))
    }

    fn handle_pragma(&mut self, content: &str) -> Result<(), Error> {
        let content_type = if content == PRAGMA_CONTENT_TYPE_TEXT {
            ContentType::Text
        } else if content == PRAGMA_CONTENT_TYPE_HTML {
            ContentType::Html
        } else {
            syntax_error!("unknown pragma {:?}", content);
        };
        if self.saw_rendering_tag || self.content_type.is_some() {
            return Err(Error::new(
                ErrorKind::MisplacedPragma,
                "content type pragma must come before all other tags",
            ));
        }
        self.content_type = Some(content_type);
        Ok(())
    }

    #[inline]
    fn attach_location_to_error(&mut self, mut err: Error) -> Error {
        if err.line().is_none() {
            err.set_filename_and_span(self.filename, self.stream.last_span())
        }
        err
    }
}

fn is_ident_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '.' | ',' | '(' | ')' | '{' | '}')
}

/// Parses the expression of a single tag.
///
/// There are no literals and no operators.  An expression is an
/// identifier or the implicit iterator, refined by attribute lookups and
/// filter applications.  Identifiers are arbitrary runs of characters
/// without whitespace and the few structural characters, which keeps
/// keys like `0` or `person-name` addressable.
struct ExprParser<'a> {
    rest: &'a str,
    span: Span,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    #[inline]
    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    #[inline]
    fn advance(&mut self, bytes: usize) {
        self.rest = &self.rest[bytes..];
    }

    #[inline]
    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat_ident(&mut self) -> Result<&'a str, Error> {
        let len = self
            .rest
            .chars()
            .take_while(|&c| is_ident_char(c))
            .map(char::len_utf8)
            .sum::<usize>();
        if len == 0 {
            syntax_error!("invalid identifier");
        }
        let (ident, rest) = self.rest.split_at(len);
        self.rest = rest;
        Ok(ident)
    }

    fn parse(&mut self) -> Result<ast::Expr<'a>, Error> {
        let expr = ok!(self.parse_full());
        self.skip_whitespace();
        match self.peek() {
            None => Ok(expr),
            Some(c) => syntax_error!("unexpected `{}` after expression", c),
        }
    }

    fn parse_full(&mut self) -> Result<ast::Expr<'a>, Error> {
        with_recursion_guard!(self, self.parse_full_inner())
    }

    fn parse_full_inner(&mut self) -> Result<ast::Expr<'a>, Error> {
        let mut expr = ok!(self.parse_primary());
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('.') => {
                    self.advance(1);
                    let name = ok!(self.eat_ident());
                    expr = ast::Expr::GetAttr(Spanned::new(
                        ast::GetAttr { expr, name },
                        self.span,
                    ));
                }
                Some('(') => {
                    expr = ok!(self.parse_call(expr));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ast::Expr<'a>, Error> {
        self.skip_whitespace();
        match self.peek() {
            None => syntax_error!("missing expression"),
            Some('.') => {
                self.advance(1);
                if self.peek().map_or(false, is_ident_char) {
                    let name = ok!(self.eat_ident());
                    Ok(ast::Expr::GetAttr(Spanned::new(
                        ast::GetAttr {
                            expr: ast::Expr::ImplicitIterator(Spanned::new(
                                ast::ImplicitIterator,
                                self.span,
                            )),
                            name,
                        },
                        self.span,
                    )))
                } else {
                    Ok(ast::Expr::ImplicitIterator(Spanned::new(
                        ast::ImplicitIterator,
                        self.span,
                    )))
                }
            }
            Some(c) if is_ident_char(c) => {
                let id = ok!(self.eat_ident());
                Ok(ast::Expr::Var(Spanned::new(ast::Var { id }, self.span)))
            }
            Some(c) => syntax_error!("unexpected `{}` in expression", c),
        }
    }

    fn parse_call(&mut self, callee: ast::Expr<'a>) -> Result<ast::Expr<'a>, Error> {
        self.advance(1);
        let mut args = Vec::new();
        loop {
            args.push(ok!(self.parse_full()));
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(1),
                Some(')') => {
                    self.advance(1);
                    break;
                }
                Some(c) => syntax_error!("unexpected `{}` in filter arguments", c),
                None => syntax_error!("unclosed filter arguments"),
            }
        }

        // `f(x)(y)` must build the same tree as `f(x, y)`: whenever
        // another argument follows, the application is partial and has
        // to evaluate to a filter again.
        self.skip_whitespace();
        let followed_by_call = self.peek() == Some('(');
        let last = args.len() - 1;
        let mut expr = callee;
        for (idx, arg) in args.into_iter().enumerate() {
            expr = ast::Expr::Filter(Spanned::new(
                ast::Filter {
                    filter: expr,
                    arg,
                    partial_application: idx < last || followed_by_call,
                },
                self.span,
            ));
        }
        Ok(expr)
    }
}

/// Parses a tag expression.
pub fn parse_expr(source: &str, span: Span) -> Result<ast::Expr<'_>, Error> {
    ExprParser {
        rest: source,
        span,
        depth: 0,
    }
    .parse()
}

/// Parses a template.
pub fn parse<'source>(
    source: &'source str,
    filename: &'source str,
) -> Result<ast::Template<'source>, Error> {
    Parser::new(source, filename).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> ast::Expr<'_> {
        parse_expr(source, Span::default()).expect("failed to parse expression")
    }

    #[test]
    fn test_expr_shapes() {
        assert!(matches!(expr("."), ast::Expr::ImplicitIterator(_)));
        assert!(matches!(expr("name"), ast::Expr::Var(_)));
        assert!(matches!(expr(".name"), ast::Expr::GetAttr(_)));
        assert!(matches!(expr("a.b.c"), ast::Expr::GetAttr(_)));
        assert!(matches!(expr("f(x)"), ast::Expr::Filter(_)));
        assert!(matches!(expr("f(x).len"), ast::Expr::GetAttr(_)));
    }

    #[test]
    fn test_curried_call_normalization() {
        assert_eq!(expr("f(x, y)"), expr("f(x)(y)"));
        assert_eq!(expr("f( x , y )"), expr("f(x,y)"));
        assert!(expr("f(x)") != expr("f(y)"));
        assert!(expr("f(x, y)") != expr("f(x)"));
    }

    #[test]
    fn test_expr_errors() {
        assert!(parse_expr("", Span::default()).is_err());
        assert!(parse_expr("a b", Span::default()).is_err());
        assert!(parse_expr("f(", Span::default()).is_err());
        assert!(parse_expr("f()", Span::default()).is_err());
        assert!(parse_expr("a.", Span::default()).is_err());
        assert!(parse_expr("a..b", Span::default()).is_err());
    }

    #[test]
    fn test_parse_sections() {
        let tmpl = parse("{{#items}}{{name}}{{/items}}", "test").unwrap();
        assert_eq!(tmpl.children.len(), 1);
        match &tmpl.children[0] {
            ast::Tag::Section(section) => {
                assert!(!section.inverted);
                assert_eq!(section.inner, "{{name}}");
                assert_eq!(section.body.len(), 1);
            }
            other => panic!("expected section, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_close_tag() {
        let tmpl = parse("{{#a}}{{#b}}x{{/}}{{/a}}", "test").unwrap();
        assert_eq!(tmpl.children.len(), 1);
    }

    #[test]
    fn test_close_matches_by_expression() {
        assert!(parse("{{#f(x, y)}}x{{/f(x)(y)}}", "test").is_ok());
        assert!(parse("{{#a.b}}x{{/a.b}}", "test").is_ok());
        let err = parse("{{#a}}x{{/b}}", "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TagMismatch);
        let err = parse("x{{/a}}", "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TagMismatch);
    }

    #[test]
    fn test_unclosed_section() {
        let err = parse("{{#a}}x", "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_pragma() {
        let tmpl = parse("{{% CONTENT_TYPE:TEXT }}{{x}}", "test").unwrap();
        assert_eq!(tmpl.content_type, Some(ContentType::Text));
        let tmpl = parse("{{% CONTENT_TYPE:HTML }}{{x}}", "test").unwrap();
        assert_eq!(tmpl.content_type, Some(ContentType::Html));
        let tmpl = parse("{{x}}", "test").unwrap();
        assert_eq!(tmpl.content_type, None);

        let err = parse("{{x}}{{% CONTENT_TYPE:TEXT }}", "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MisplacedPragma);
        let err = parse("{{% CONTENT_TYPE:TEXT }}{{% CONTENT_TYPE:HTML }}", "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MisplacedPragma);
        let err = parse("{{% NOT_A_PRAGMA }}", "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_error_location() {
        let err = parse("line one\n{{#a}}\noops {{/b}}", "test.mustache").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TagMismatch);
        assert_eq!(err.name(), Some("test.mustache"));
        assert_eq!(err.line(), Some(3));
    }
}
