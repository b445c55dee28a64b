use crate::compiler::tokens::{Span, Token};
use crate::error::{Error, ErrorKind};
use crate::utils::{memchr, memstr};

const DEFAULT_START: &str = "{{";
const DEFAULT_END: &str = "}}";

/// Tokenizes mustache templates.
///
/// The tokenizer tracks the current tag delimiters.  Set delimiter tags
/// (`{{=<% %>=}}`) switch them for the rest of the input, which is why
/// tokenizing cannot be a stateless scan.  The triple mustache form
/// (`{{{ ... }}}`) is only recognized while the default delimiters are
/// active.
pub struct Tokenizer<'s> {
    rest: &'s str,
    current_line: u32,
    current_col: u32,
    current_offset: u32,
    start_delim: &'s str,
    end_delim: &'s str,
}

impl<'s> Tokenizer<'s> {
    /// Creates a new tokenizer.
    pub fn new(input: &'s str) -> Tokenizer<'s> {
        Tokenizer {
            rest: input,
            current_line: 1,
            current_col: 0,
            current_offset: 0,
            start_delim: DEFAULT_START,
            end_delim: DEFAULT_END,
        }
    }

    /// Produces the next token from the tokenizer.
    pub fn next_token(&mut self) -> Result<Option<(Token<'s>, Span)>, Error> {
        if self.rest.is_empty() {
            return Ok(None);
        }
        if self.rest.starts_with(self.start_delim) {
            return self.tokenize_tag().map(Some);
        }
        let old_loc = self.loc();
        let lead = match self.find_start_marker() {
            Some(start) => self.advance(start),
            None => self.advance(self.rest.len()),
        };
        Ok(Some((Token::TemplateData(lead), self.span(old_loc))))
    }

    #[inline]
    fn rest_bytes(&self) -> &[u8] {
        self.rest.as_bytes()
    }

    fn advance(&mut self, bytes: usize) -> &'s str {
        let (skipped, new_rest) = self.rest.split_at(bytes);
        for c in skipped.chars() {
            match c {
                '\n' => {
                    self.current_line += 1;
                    self.current_col = 0;
                }
                _ => self.current_col += 1,
            }
        }
        self.current_offset += bytes as u32;
        self.rest = new_rest;
        skipped
    }

    #[inline]
    fn loc(&self) -> (u32, u32, u32) {
        (self.current_line, self.current_col, self.current_offset)
    }

    #[inline]
    fn span(&self, (start_line, start_col, start_offset): (u32, u32, u32)) -> Span {
        Span {
            start_line,
            start_col,
            start_offset,
            end_line: self.current_line,
            end_col: self.current_col,
            end_offset: self.current_offset,
        }
    }

    #[inline]
    fn syntax_error(&mut self, msg: &'static str) -> Error {
        Error::new(ErrorKind::SyntaxError, msg)
    }

    #[inline]
    fn default_delims(&self) -> bool {
        self.start_delim == DEFAULT_START && self.end_delim == DEFAULT_END
    }

    /// Finds the offset of the next tag start in the remaining input.
    fn find_start_marker(&self) -> Option<usize> {
        if self.default_delims() {
            let bytes = self.rest_bytes();
            let mut offset = 0;
            loop {
                let idx = match memchr(&bytes[offset..], b'{') {
                    Some(idx) => idx,
                    None => return None,
                };
                if bytes.get(offset + idx + 1) == Some(&b'{') {
                    return Some(offset + idx);
                }
                offset += idx + 1;
            }
        } else {
            memstr(self.rest_bytes(), self.start_delim.as_bytes())
        }
    }

    /// Consumes the tag content after `skip` bytes up to and including the
    /// end delimiter and returns the trimmed content.
    fn eat_tag_content(&mut self, skip: usize) -> Result<&'s str, Error> {
        match memstr(&self.rest_bytes()[skip..], self.end_delim.as_bytes()) {
            Some(end) => {
                let content = &self.rest[skip..skip + end];
                self.advance(skip + end + self.end_delim.len());
                Ok(content.trim())
            }
            None => Err(self.syntax_error("unclosed tag")),
        }
    }

    fn eat_triple_tag(&mut self) -> Result<&'s str, Error> {
        match memstr(&self.rest_bytes()[3..], b"}}}") {
            Some(end) => {
                let content = &self.rest[3..3 + end];
                self.advance(3 + end + 3);
                Ok(content.trim())
            }
            None => Err(self.syntax_error("unclosed tag")),
        }
    }

    fn tokenize_tag(&mut self) -> Result<(Token<'s>, Span), Error> {
        let old_loc = self.loc();

        if self.default_delims() && self.rest.starts_with("{{{") {
            let content = ok!(self.eat_triple_tag());
            return Ok((Token::UnescapedVariable(content), self.span(old_loc)));
        }

        let skip = self.start_delim.len();
        let token = match self.rest_bytes().get(skip).copied() {
            Some(b'#') => Token::SectionOpen(ok!(self.eat_tag_content(skip + 1))),
            Some(b'^') => Token::InvertedSectionOpen(ok!(self.eat_tag_content(skip + 1))),
            Some(b'/') => Token::SectionClose(ok!(self.eat_tag_content(skip + 1))),
            Some(b'>') => Token::Partial(ok!(self.eat_tag_content(skip + 1))),
            Some(b'&') => Token::UnescapedVariable(ok!(self.eat_tag_content(skip + 1))),
            Some(b'%') => Token::Pragma(ok!(self.eat_tag_content(skip + 1))),
            Some(b'!') => {
                ok!(self.eat_tag_content(skip + 1));
                Token::Comment
            }
            Some(b'=') => {
                let content = ok!(self.eat_tag_content(skip + 1));
                let inner = match content.strip_suffix('=') {
                    Some(inner) => inner,
                    None => return Err(self.syntax_error("invalid set delimiters tag")),
                };
                let mut parts = inner.split_ascii_whitespace();
                let (new_start, new_end) = match (parts.next(), parts.next(), parts.next()) {
                    (Some(start), Some(end), None) => (start, end),
                    _ => return Err(self.syntax_error("invalid set delimiters tag")),
                };
                if new_start.contains('=') || new_end.contains('=') {
                    return Err(self.syntax_error("invalid set delimiters tag"));
                }
                self.start_delim = new_start;
                self.end_delim = new_end;
                Token::SetDelimiters
            }
            _ => Token::Variable(ok!(self.eat_tag_content(skip))),
        };
        Ok((token, self.span(old_loc)))
    }
}

fn is_standalone_kind(token: &Token) -> bool {
    matches!(
        token,
        Token::SectionOpen(_)
            | Token::InvertedSectionOpen(_)
            | Token::SectionClose(_)
            | Token::Partial(_)
            | Token::Pragma(_)
            | Token::Comment
            | Token::SetDelimiters
    )
}

/// Checks that everything between the start of the line and `start` is
/// inline whitespace.
fn only_whitespace_before(source: &str, start: usize) -> bool {
    let before = &source[..start];
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    before[line_start..].bytes().all(|b| b == b' ' || b == b'\t')
}

/// Checks that everything between `end` and the end of the line is inline
/// whitespace.
fn only_whitespace_after(source: &str, end: usize) -> bool {
    let mut rest = source[end..].bytes();
    loop {
        match rest.next() {
            None | Some(b'\n') => return true,
            Some(b' ') | Some(b'\t') => continue,
            Some(b'\r') => return rest.next() == Some(b'\n'),
            Some(_) => return false,
        }
    }
}

/// Strips the final line of inline whitespace from template data that
/// precedes a standalone tag.
fn trim_standalone_tail(data: &str) -> &str {
    &data[..data.rfind('\n').map_or(0, |idx| idx + 1)]
}

/// Strips the inline whitespace and line ending that follow a standalone
/// tag from the template data after it.
fn trim_standalone_lead(data: &str) -> &str {
    let stripped = data.trim_start_matches(|c| c == ' ' || c == '\t');
    stripped
        .strip_prefix("\r\n")
        .or_else(|| stripped.strip_prefix('\n'))
        .unwrap_or(stripped)
}

/// Applies the standalone line rule to the token stream.
///
/// A non variable tag that is alone on its line swallows the whitespace
/// around it: the inline whitespace before the tag and the whitespace plus
/// line ending after it.  Whether a tag is alone on its line is decided
/// against the raw source via the token spans, so a tag next to another
/// tag never qualifies.  Variable tags never trim.
///
/// The filter holds back one token so it can still shorten the template
/// data in front of a standalone tag.
pub struct TokenFilter<'s> {
    tokenizer: Tokenizer<'s>,
    source: &'s str,
    held: Option<(Token<'s>, Span)>,
    trim_lead: bool,
}

impl<'s> TokenFilter<'s> {
    /// Creates a filtered tokenizer for the given input.
    pub fn new(input: &'s str) -> TokenFilter<'s> {
        TokenFilter {
            tokenizer: Tokenizer::new(input),
            source: input,
            held: None,
            trim_lead: false,
        }
    }

    /// Produces the next token with standalone lines trimmed.
    pub fn next_token(&mut self) -> Result<Option<(Token<'s>, Span)>, Error> {
        loop {
            let (mut token, span) = match ok!(self.tokenizer.next_token()) {
                None => return Ok(self.held.take()),
                Some(next) => next,
            };

            if let Token::TemplateData(data) = token {
                if self.trim_lead {
                    self.trim_lead = false;
                    let trimmed = trim_standalone_lead(data);
                    if trimmed.is_empty() {
                        continue;
                    }
                    token = Token::TemplateData(trimmed);
                }
            } else if is_standalone_kind(&token)
                && only_whitespace_before(self.source, span.start_offset as usize)
                && only_whitespace_after(self.source, span.end_offset as usize)
            {
                if let Some((Token::TemplateData(data), held_span)) = self.held {
                    let trimmed = trim_standalone_tail(data);
                    self.held = if trimmed.is_empty() {
                        None
                    } else {
                        Some((Token::TemplateData(trimmed), held_span))
                    };
                }
                self.trim_lead = true;
            }

            match self.held.replace((token, span)) {
                Some(held) => return Ok(Some(held)),
                None => continue,
            }
        }
    }
}

/// Utility function to tokenize a template with standalone lines trimmed.
#[cfg(test)]
pub fn tokenize(input: &str) -> impl Iterator<Item = Result<(Token<'_>, Span), Error>> {
    let mut filter = TokenFilter::new(input);
    std::iter::from_fn(move || filter.next_token().transpose())
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    fn lex(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .map(|x| x.expect("token error").0)
            .collect()
    }

    #[test]
    fn test_basic_tags() {
        assert_eq!(
            lex("Hello {{name}}!"),
            vec![
                Token::TemplateData("Hello "),
                Token::Variable("name"),
                Token::TemplateData("!"),
            ]
        );
        assert_eq!(
            lex("{{{raw}}} and {{& amp }}"),
            vec![
                Token::UnescapedVariable("raw"),
                Token::TemplateData(" and "),
                Token::UnescapedVariable("amp"),
            ]
        );
    }

    #[test]
    fn test_sections_inline() {
        assert_eq!(
            lex("| {{#a}}x{{/a}} |"),
            vec![
                Token::TemplateData("| "),
                Token::SectionOpen("a"),
                Token::TemplateData("x"),
                Token::SectionClose("a"),
                Token::TemplateData(" |"),
            ]
        );
    }

    #[test]
    fn test_standalone_lines() {
        assert_eq!(
            lex("begin\n{{#a}}\nx\n{{/a}}\nend\n"),
            vec![
                Token::TemplateData("begin\n"),
                Token::SectionOpen("a"),
                Token::TemplateData("x\n"),
                Token::SectionClose("a"),
                Token::TemplateData("end\n"),
            ]
        );
        assert_eq!(
            lex("  {{! note }}  \ntext"),
            vec![Token::Comment, Token::TemplateData("text")]
        );
        // a variable tag alone on a line keeps its whitespace
        assert_eq!(
            lex("a\n  {{x}}\nb"),
            vec![
                Token::TemplateData("a\n  "),
                Token::Variable("x"),
                Token::TemplateData("\nb"),
            ]
        );
    }

    #[test]
    fn test_adjacent_tags_not_standalone() {
        assert_eq!(
            lex("{{#a}}{{/a}}\n"),
            vec![
                Token::SectionOpen("a"),
                Token::SectionClose("a"),
                Token::TemplateData("\n"),
            ]
        );
    }

    #[test]
    fn test_set_delimiters() {
        assert_eq!(
            lex("{{=<% %>=}}<%a%> {{b}} <%={{ }}=%>{{c}}"),
            vec![
                Token::SetDelimiters,
                Token::Variable("a"),
                Token::TemplateData(" {{b}} "),
                Token::SetDelimiters,
                Token::Variable("c"),
            ]
        );
    }

    #[test]
    fn test_triple_needs_default_delimiters() {
        assert_eq!(
            lex("{{=<% %>=}}{{{not a tag}}}<%x%>"),
            vec![
                Token::SetDelimiters,
                Token::TemplateData("{{{not a tag}}}"),
                Token::Variable("x"),
            ]
        );
    }

    #[test]
    fn test_unclosed_tag() {
        let err = tokenize("hello {{name")
            .find_map(|x| x.err())
            .expect("expected a lex error");
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_empty_close() {
        assert_eq!(
            lex("{{#a}}x{{/}}"),
            vec![
                Token::SectionOpen("a"),
                Token::TemplateData("x"),
                Token::SectionClose(""),
            ]
        );
    }
}
