//! MiniMustache is a [Mustache](https://mustache.github.io/) template
//! engine for Rust with minimal dependencies.  It is implemented on top of
//! [`serde`] and renders logic-free templates where tags pull values out
//! of a context, sections repeat or skip parts of the template, and
//! partials stitch templates together.
//!
//! ```mustache
//! {{#users}}
//!   <li>{{name}}</li>
//! {{/users}}
//! ```
//!
//! # Template Usage
//!
//! To use MiniMustache one needs to create a [`TemplateRepository`] and
//! populate it with templates.  Afterwards templates can be fetched and
//! rendered.  To pass data one can pass any serde serializable value.
//! The [`context!`] macro can be used to quickly construct a template
//! context:
//!
//! ```
//! use minimustache::{TemplateRepository, context};
//!
//! let mut repo = TemplateRepository::new();
//! repo.add_template("hello", "Hello {{name}}!").unwrap();
//! let tmpl = repo.get_template("hello").unwrap();
//! println!("{}", tmpl.render(context!(name => "John")).unwrap());
//! ```
//!
//! ```plain
//! Hello John!
//! ```
//!
//! For super trivial cases where you need to render a string once, you can
//! also use the [`render!`] macro which acts a bit like a replacement
//! for the [`format!`] macro.
//!
//! # HTML Escaping
//!
//! Templates render HTML by default: variable tags escape the characters
//! `&`, `<`, `>` and `"`.  A template can opt out with the
//! `{{%CONTENT_TYPE:TEXT}}` pragma, a repository can change the default
//! through its [`Configuration`], and individual tags can use the
//! unescaped forms `{{{...}}}` and `{{&...}}`.  See [`ContentType`] for
//! the resolution order.
//!
//! # Learn more
//!
//! - [`TemplateRepository`]: the main API entry point.  Teaches you how
//!   templates are registered, loaded and linked.
//! - [`Template`]: the template object API.  Shows you how templates can
//!   be rendered.
//! - [`syntax`]: provides documentation of the template syntax.
//! - [`filters`]: teaches you how to write custom filters and to see the
//!   list of built-in filters.
//! - [`Configuration`]: the settings templates compile and render with,
//!   including the base context custom filters are registered in.
//! - [`Value`]: the dynamic value type contexts are made of, including
//!   [renderable values](Value::from_renderable) for custom tag behavior.
//!
//! # Error Handling
//!
//! MiniMustache tries to give you good errors out of the box.  Parsing
//! and partial resolution errors surface when templates are registered or
//! fetched, before anything renders.  With the `debug` feature enabled
//! errors carry the template source and render it when formatted with the
//! alternative representation.  For more information see [`Error`] with
//! an example.
//!
//! # Optional Features
//!
//! Some functionality can be configured through cargo features:
//!
//! - `builtins`: if this feature is removed the built-in filters are not
//!   registered in the factory configuration (enabled by default).
//! - `debug`: if this feature is removed some debug functionality of the
//!   engine is removed as well.  This mainly affects the quality of error
//!   reporting (enabled by default).
//! - `preserve_order`: when enabled the internal value implementation
//!   uses an indexmap which preserves the original order of maps and
//!   structs.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

#[macro_use]
mod macros;

mod compiler;
mod configuration;
mod defaults;
mod error;
mod output;
mod render;
mod repository;
mod template;
mod utils;

pub mod filters;
pub mod syntax;
pub mod value;

#[cfg(feature = "debug")]
mod debug;

pub use self::configuration::Configuration;
pub use self::error::{Error, ErrorKind};
pub use self::output::Output;
pub use self::render::{Rendering, State, TagKind};
pub use self::repository::{path_loader, TemplateRepository};
pub use self::template::Template;
pub use self::utils::{ContentType, HtmlEscape};

/// Re-export for convenience.
pub use self::value::Value;

pub use self::macros::__context;
