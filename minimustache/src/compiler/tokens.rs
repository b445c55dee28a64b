use std::fmt;

/// Represents a token in the stream.
///
/// Tags carry the raw text between the delimiters, with the sigil
/// character already stripped.  Expression parsing happens later in the
/// parser so that tag level errors and expression level errors report
/// through the same machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Raw template data.
    TemplateData(&'a str),
    /// An escaping variable tag (`{{ ... }}`).
    Variable(&'a str),
    /// A non escaping variable tag (`{{{ ... }}}` or `{{& ... }}`).
    UnescapedVariable(&'a str),
    /// A section opening tag (`{{# ... }}`).
    SectionOpen(&'a str),
    /// An inverted section opening tag (`{{^ ... }}`).
    InvertedSectionOpen(&'a str),
    /// A section closing tag (`{{/ ... }}`).  The payload may be empty.
    SectionClose(&'a str),
    /// A partial tag (`{{> ... }}`).
    Partial(&'a str),
    /// A pragma tag (`{{% ... }}`).
    Pragma(&'a str),
    /// A comment tag (`{{! ... }}`).
    Comment,
    /// A set delimiters tag (`{{=<% %>=}}`).  The lexer already switched
    /// delimiters when this token is emitted.
    SetDelimiters,
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::TemplateData(_) => f.write_str("template-data"),
            Token::Variable(_) => f.write_str("variable tag"),
            Token::UnescapedVariable(_) => f.write_str("unescaped variable tag"),
            Token::SectionOpen(_) => f.write_str("section opening tag"),
            Token::InvertedSectionOpen(_) => f.write_str("inverted section opening tag"),
            Token::SectionClose(_) => f.write_str("section closing tag"),
            Token::Partial(_) => f.write_str("partial tag"),
            Token::Pragma(_) => f.write_str("pragma tag"),
            Token::Comment => f.write_str("comment tag"),
            Token::SetDelimiters => f.write_str("set delimiters tag"),
        }
    }
}

/// Token span information
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub start_offset: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub end_offset: u32,
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " @ {}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}
