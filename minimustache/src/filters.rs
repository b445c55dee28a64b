//! Filter functions and abstractions.
//!
//! This module contains the filters that are registered in the base
//! context of the factory [`Configuration`](crate::Configuration).
//! Filters are applied with call syntax in tags: `{{uppercase(name)}}`
//! evaluates `name` and runs the result through the `uppercase` filter.
//! Filters are values like any other, so they resolve through the context
//! stack first and the base context last, and a context can shadow a
//! builtin filter by carrying a key of the same name.
//!
//! # Custom Filters
//!
//! A filter is a function taking a value reference and returning a new
//! value.  It can be registered in a configuration:
//!
//! ```rust
//! # use minimustache::{Configuration, TemplateRepository, value::Value};
//! let mut config = Configuration::new();
//! config.add_filter("twice", |value: &Value| {
//!     let s = value.to_string();
//!     Ok(Value::from(format!("{s}{s}")))
//! });
//! let repo = TemplateRepository::with_configuration(config);
//! let rv = repo.render_str("{{twice(name)}}", minimustache::context! { name => "ho" });
//! assert_eq!(rv.unwrap(), "hoho");
//! ```
//!
//! A filter that itself returns a filter value consumes another argument:
//! `{{add(a, b)}}` and `{{add(a)(b)}}` both apply `add` to `a` and the
//! returned filter to `b`.
//!
//! # Built-in Filters
//!
//! When the `builtins` feature is enabled a range of built-in filters are
//! automatically registered in the factory configuration.  These are also
//! all provided in this module.  Note though that these functions are not
//! to be called from Rust code as their exact interface (arguments and
//! return types) might change from one version to another.
use crate::error::Error;
use crate::output::Output;
use crate::utils::{write_escaped, ContentType};
use crate::value::Value;

/// Marks a value as safe.  This converts it into a string.
///
/// When a value is marked as safe, no further HTML escaping will take
/// place when a variable tag renders it.
pub fn safe(v: &Value) -> Result<Value, Error> {
    Ok(Value::from_safe_string(v.to_string()))
}

/// Escapes a string.
///
/// This replaces the characters `&`, `<`, `>` and `"` with their HTML
/// entities and marks the result safe, so rendering it under an HTML
/// template does not escape it a second time.  Values that are already
/// safe pass through unchanged.
pub fn escape(v: &Value) -> Result<Value, Error> {
    if v.is_safe() {
        return Ok(v.clone());
    }

    let mut rv = match v.as_str() {
        Some(s) => String::with_capacity(s.len()),
        None => String::new(),
    };
    let mut out = Output::new(&mut rv);
    ok!(write_escaped(&mut out, ContentType::Html, v));
    Ok(Value::from_safe_string(rv))
}

#[cfg(feature = "builtins")]
mod builtins {
    use super::*;

    use std::fmt::Write;

    use crate::error::ErrorKind;

    /// Converts a value to uppercase.
    ///
    /// ```mustache
    /// <h1>{{uppercase(chapter.title)}}</h1>
    /// ```
    #[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
    pub fn uppercase(v: &Value) -> Result<Value, Error> {
        Ok(Value::from(v.to_string().to_uppercase()))
    }

    /// Converts a value to lowercase.
    ///
    /// ```mustache
    /// <h1>{{lowercase(chapter.title)}}</h1>
    /// ```
    #[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
    pub fn lowercase(v: &Value) -> Result<Value, Error> {
        Ok(Value::from(v.to_string().to_lowercase()))
    }

    /// Capitalizes a value word by word.
    ///
    /// The first letter of every word is uppercased, all other letters
    /// are lowercased.
    ///
    /// ```mustache
    /// <h1>{{capitalized(chapter.title)}}</h1>
    /// ```
    #[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
    pub fn capitalized(v: &Value) -> Result<Value, Error> {
        let s = v.to_string();
        let mut rv = String::with_capacity(s.len());
        let mut capitalize = true;
        for c in s.chars() {
            if c.is_ascii_punctuation() || c.is_whitespace() {
                rv.push(c);
                capitalize = true;
            } else if capitalize {
                ok!(write!(rv, "{}", c.to_uppercase()).map_err(Error::from));
                capitalize = false;
            } else {
                ok!(write!(rv, "{}", c.to_lowercase()).map_err(Error::from));
            }
        }
        Ok(Value::from(rv))
    }

    /// Returns the number of items of a collection or characters of a string.
    ///
    /// ```mustache
    /// I have {{count(cats)}} cats.
    /// ```
    #[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
    pub fn count(v: &Value) -> Result<Value, Error> {
        match v.len() {
            Some(len) => Ok(Value::from(len)),
            None => Err(Error::new(
                ErrorKind::FilterError,
                format!("cannot count value of kind {}", v.kind()),
            )),
        }
    }

    /// Reverses a sequence or string.
    ///
    /// ```mustache
    /// {{#reversed(users)}}{{name}} {{/reversed(users)}}
    /// ```
    #[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
    pub fn reversed(v: &Value) -> Result<Value, Error> {
        if let Some(items) = v.as_seq() {
            Ok(items.iter().rev().cloned().collect())
        } else if let Some(s) = v.as_str() {
            Ok(Value::from(s.chars().rev().collect::<String>()))
        } else {
            Err(Error::new(
                ErrorKind::FilterError,
                format!("cannot reverse value of kind {}", v.kind()),
            ))
        }
    }
}

#[cfg(feature = "builtins")]
pub use self::builtins::*;

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_escape_marks_safe() {
        let rv = escape(&Value::from("<b>")).unwrap();
        assert!(rv.is_safe());
        assert_eq!(rv.as_str(), Some("&lt;b&gt;"));
        // already safe values pass through untouched
        let rv = escape(&rv).unwrap();
        assert_eq!(rv.as_str(), Some("&lt;b&gt;"));
    }

    #[test]
    #[cfg(feature = "builtins")]
    fn test_capitalized() {
        let rv = capitalized(&Value::from("the GREAT escape")).unwrap();
        assert_eq!(rv.as_str(), Some("The Great Escape"));
    }

    #[test]
    #[cfg(feature = "builtins")]
    fn test_count() {
        assert_eq!(
            count(&Value::from(vec![1, 2, 3])).unwrap(),
            Value::from(3)
        );
        assert!(count(&Value::from(true)).is_err());
    }

    #[test]
    #[cfg(feature = "builtins")]
    fn test_reversed() {
        let rv = reversed(&Value::from(vec!["a", "b", "c"])).unwrap();
        assert_eq!(rv.to_string(), "cba");
        let rv = reversed(&Value::from("live")).unwrap();
        assert_eq!(rv.as_str(), Some("evil"));
    }
}
