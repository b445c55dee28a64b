use std::fmt;

use crate::error::Error;
use crate::value::{StringType, Value, ValueKind, ValueRepr};
use crate::Output;

pub fn memchr(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&x| x == needle)
}

pub fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Helper for dealing with untrusted size hints.
#[inline(always)]
pub(crate) fn untrusted_size_hint(value: usize) -> usize {
    value.min(1024)
}

/// The kind of content a template renders.
///
/// Every template carries a content type which decides whether variable
/// tags (`{{ ... }}`) escape their values.  HTML templates escape, text
/// templates insert values verbatim.  The content type of a template is
/// resolved from a `{{% CONTENT_TYPE:... }}` pragma if present, then from
/// the configuration of the repository it was compiled in, and finally
/// from the process wide default configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ContentType {
    /// HTML content.  Variable tags HTML escape the values they render.
    ///
    /// The characters `&`, `<`, `>` and `"` are replaced with `&amp;`,
    /// `&lt;`, `&gt;` and `&quot;` respectively.  No other characters are
    /// touched.
    #[default]
    Html,
    /// Plain text content.  Variable tags never escape.
    Text,
}

fn write_with_html_escaping(out: &mut Output, value: &Value) -> fmt::Result {
    if matches!(
        value.kind(),
        ValueKind::Undefined | ValueKind::None | ValueKind::Bool | ValueKind::Number
    ) {
        write!(out, "{value}")
    } else if let Some(s) = value.as_str() {
        write!(out, "{}", HtmlEscape(s))
    } else {
        write!(out, "{}", HtmlEscape(&value.to_string()))
    }
}

/// Writes a value to the output with the escaping the content type demands.
///
/// Safe strings bypass escaping even for HTML content.
#[inline(always)]
pub fn write_escaped(
    out: &mut Output,
    content_type: ContentType,
    value: &Value,
) -> Result<(), Error> {
    // common case of safe strings or rendering to text
    if let ValueRepr::String(ref s, ty) = value.0 {
        if matches!(ty, StringType::Safe) || matches!(content_type, ContentType::Text) {
            return out.write_str(s).map_err(Error::from);
        }
    }

    match content_type {
        ContentType::Text => write!(out, "{value}").map_err(Error::from),
        ContentType::Html => write_with_html_escaping(out, value).map_err(Error::from),
    }
}

/// Helper to HTML escape a string.
///
/// Replaces `&`, `<`, `>` and `"`.  Single quotes are left alone.
pub struct HtmlEscape<'a>(pub &'a str);

impl<'a> fmt::Display for HtmlEscape<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // this is taken from askama-escape
        let bytes = self.0.as_bytes();
        let mut start = 0;

        for (i, b) in bytes.iter().enumerate() {
            macro_rules! escaping_body {
                ($quote:expr) => {{
                    if start < i {
                        // SAFETY: this is safe because we only push valid utf-8 bytes over
                        ok!(f.write_str(unsafe {
                            std::str::from_utf8_unchecked(&bytes[start..i])
                        }));
                    }
                    ok!(f.write_str($quote));
                    start = i + 1;
                }};
            }
            if b.wrapping_sub(b'"') <= b'>' - b'"' {
                match *b {
                    b'<' => escaping_body!("&lt;"),
                    b'>' => escaping_body!("&gt;"),
                    b'&' => escaping_body!("&amp;"),
                    b'"' => escaping_body!("&quot;"),
                    _ => (),
                }
            }
        }

        if start < bytes.len() {
            // SAFETY: this is safe because we only push valid utf-8 bytes over
            f.write_str(unsafe { std::str::from_utf8_unchecked(&bytes[start..]) })
        } else {
            Ok(())
        }
    }
}

pub struct OnDrop<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> OnDrop<F> {
    pub fn new(f: F) -> Self {
        Self(Some(f))
    }
}

impl<F: FnOnce()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        self.0.take().unwrap()();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_html_escape() {
        let input = "<p class=\"x\">Tom & Jerry's</p>";
        let output = HtmlEscape(input).to_string();
        assert_eq!(
            output,
            "&lt;p class=&quot;x&quot;&gt;Tom &amp; Jerry's&lt;/p&gt;"
        );
    }

    #[test]
    fn test_memstr() {
        assert_eq!(memstr(b"a{{b", b"{{"), Some(1));
        assert_eq!(memstr(b"a{b", b"{{"), None);
        assert_eq!(memstr(b"<%= x %>", b"<%"), Some(0));
    }
}
