//! Documents the syntax for templates.
//!
//! <details><summary><strong style="cursor: pointer">Table of Contents</strong></summary>
//!
//! - [Synopsis](#synopsis)
//! - [Variable Tags](#variable-tags)
//! - [Expressions](#expressions)
//!   - [Keys and Key Paths](#keys-and-key-paths)
//!   - [The Implicit Iterator](#the-implicit-iterator)
//!   - [Filters](#filters)
//! - [Section Tags](#section-tags)
//!   - [Inverted Sections](#inverted-sections)
//!   - [Closing Tags](#closing-tags)
//! - [Partial Tags](#partial-tags)
//! - [Comments](#comments)
//! - [Content Type Pragma](#content-type-pragma)
//! - [Set Delimiters](#set-delimiters)
//! - [Standalone Lines](#standalone-lines)
//!
//! </details>
//!
//! # Synopsis
//!
//! A template is simply a text file.  Any text-based format can be
//! generated (HTML, XML, plain text mail, LaTeX, etc.).  A template
//! contains **tags** which get replaced with values or control what part
//! of the template renders.  Everything outside of tags is emitted as-is.
//! The syntax follows the Mustache template language.
//!
//! This is a minimal template that illustrates a few basics:
//!
//! ```mustache
//! Hello {{name}}!
//!
//! {{#items}}
//!   * {{title}} ({{price}})
//! {{/items}}
//! {{^items}}
//!   The shelf is empty.
//! {{/items}}
//!
//! {{! this line is a comment and renders to nothing }}
//! {{>footer}}
//! ```
//!
//! # Variable Tags
//!
//! `{{expression}}` renders the value of an expression.  In a template
//! with the HTML content type the rendered text is HTML escaped:
//!
//! ```mustache
//! Hello {{name}}!
//! ```
//!
//! renders `Hello Tom &amp; Jerry!` when `name` is `"Tom & Jerry"`.
//!
//! The triple mustache form `{{{expression}}}` and the ampersand form
//! `{{&expression}}` render the value without escaping:
//!
//! ```mustache
//! {{{html_snippet}}}
//! {{&html_snippet}}
//! ```
//!
//! Both forms are equivalent; the ampersand form remains available when
//! [custom delimiters](#set-delimiters) are active and the triple
//! mustache cannot be recognized.  Missing values render as the empty
//! string, they are not an error.
//!
//! # Expressions
//!
//! Tags contain expressions.  There are no literals and no operators;
//! an expression names a value in the context and optionally pipes it
//! through filters.
//!
//! ## Keys and Key Paths
//!
//! The simplest expression is a key such as `name`.  It is looked up in
//! the context stack, innermost frame first.  Keys are not restricted to
//! programming language identifiers; anything without whitespace and the
//! structural characters `.`, `,`, `(`, `)`, `{` and `}` works, so keys
//! like `0` or `first-name` are addressable.
//!
//! Keys can be chained into a path with dots:
//!
//! ```mustache
//! {{person.address.city}}
//! ```
//!
//! The leading key walks the context stack, the rest digs into the found
//! value.  If any step is missing the whole path evaluates to nothing.
//!
//! ## The Implicit Iterator
//!
//! A single dot refers to the value currently on top of the context
//! stack.  Inside a section that iterates a sequence of strings this is
//! the string itself:
//!
//! ```mustache
//! {{#names}}{{.}} {{/names}}
//! ```
//!
//! A path can start from it explicitly: `{{.name}}` looks at the top
//! frame only and does not walk down the stack.
//!
//! ## Filters
//!
//! Filters are functions made available through the context, usually via
//! the [`Configuration`](crate::Configuration) base context.  They are
//! applied with parentheses:
//!
//! ```mustache
//! {{uppercase(name)}}
//! {{count(items)}}
//! ```
//!
//! Filters taking several values can be called with an argument list or
//! curried one argument at a time; `f(x, y)` and `f(x)(y)` are the same
//! expression.  Filter results can be refined further, for instance
//! `{{reversed(items).first}}` renders the last item.  See the
//! [`filters`](crate::filters) module for the builtin filters and for
//! how to write your own.
//!
//! # Section Tags
//!
//! A section renders its body zero or more times, depending on the value
//! of its expression.  It starts with `{{#expression}}` and ends with a
//! [closing tag](#closing-tags):
//!
//! ```mustache
//! {{#items}}
//!   <li>{{title}}</li>
//! {{/items}}
//! ```
//!
//! - A sequence renders the body once per element, with the element
//!   pushed on the context stack.
//! - Any other truthy value renders the body once, with the value pushed
//!   on the context stack.  This is how `{{#person}}{{name}}{{/person}}`
//!   reaches into `person`.
//! - A falsy value (false, zero, an empty string, an empty sequence, or
//!   a missing value) skips the body entirely.
//! - A function value is called with the section and renders whatever it
//!   returns; see [`Value::from_renderable`](crate::Value::from_renderable).
//!
//! ## Inverted Sections
//!
//! An inverted section starts with `{{^expression}}` and renders its
//! body exactly when a regular section would not:
//!
//! ```mustache
//! {{#items}}...{{/items}}
//! {{^items}}No items.{{/items}}
//! ```
//!
//! The body renders in the current context; nothing is pushed.
//!
//! ## Closing Tags
//!
//! `{{/expression}}` closes a section.  The expression must match the
//! opening expression.  The empty form `{{/}}` always closes the
//! innermost open section, which keeps deeply nested templates short:
//!
//! ```mustache
//! {{#a}}{{#b}}{{#c}}deep{{/}}{{/}}{{/}}
//! ```
//!
//! # Partial Tags
//!
//! `{{>name}}` renders another template of the repository in place, in
//! the current context:
//!
//! ```mustache
//! {{>header}}
//! Body
//! {{>footer}}
//! ```
//!
//! Partials are resolved when the including template is fetched from the
//! [`TemplateRepository`](crate::TemplateRepository), so missing
//! partials and inclusion cycles are reported before rendering starts.
//! A partial keeps its own content type; its output is spliced into the
//! including template without further escaping.
//!
//! # Comments
//!
//! `{{! ... }}` is a comment.  Comments render to nothing and may span
//! multiple lines:
//!
//! ```mustache
//! {{! the greeting below is not localized yet }}
//! Hello {{name}}!
//! ```
//!
//! # Content Type Pragma
//!
//! A template renders HTML by default and escapes accordingly.  The
//! pragma tag switches a single template to plain text, which disables
//! escaping:
//!
//! ```mustache
//! {{% CONTENT_TYPE:TEXT }}
//! Hello {{name}}!
//! ```
//!
//! `{{% CONTENT_TYPE:HTML }}` forces HTML in a repository configured for
//! text.  The pragma must come before all rendering tags; only comments,
//! set delimiter tags and other pragmas may precede it.  The
//! [`Configuration`](crate::Configuration) controls the default for
//! templates without a pragma.
//!
//! # Set Delimiters
//!
//! `{{=<% %>=}}` changes the tag delimiters for the rest of the
//! template.  This is useful when generating output where mustaches are
//! common, for example when a template produces other templates:
//!
//! ```mustache
//! {{=<% %>=}}
//! <%name%> lives between literal {{mustaches}} now.
//! <%={{ }}=%>
//! {{name}} is a tag again.
//! ```
//!
//! The new delimiters may not contain `=` or whitespace.  Note that the
//! triple mustache form is only recognized while the default delimiters
//! are active; the `&` form keeps working: `<%&raw%>`.
//!
//! # Standalone Lines
//!
//! A non-variable tag that is alone on its line is removed together with
//! its line: the whitespace before the tag and the line ending after it
//! do not appear in the output.  This is what keeps sections, comments
//! and partials from leaving blank lines behind:
//!
//! ```mustache
//! Begin.
//! {{#section}}
//! Middle.
//! {{/section}}
//! End.
//! ```
//!
//! renders as three lines, not five.  Variable tags never qualify; a
//! line containing only `{{name}}` keeps its whitespace and line ending.
//! Tags sharing a line with other tags or text do not qualify either.
