use std::fmt;

use crate::compiler::ast;
use crate::compiler::tokens::Span;
use crate::error::Error;
use crate::output::Output;
use crate::repository::TemplateRepository;
use crate::template::CompiledTemplate;
use crate::utils::{write_escaped, ContentType, HtmlEscape};
use crate::value::{RenderFunc, Value};

mod context;
mod eval;

use crate::render::context::Context;
use crate::render::eval::eval;

/// The kind of tag a renderable value was invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// A variable tag (`{{ ... }}` or one of the unescaped forms).
    Variable,
    /// A section tag (`{{# ... }} ... {{/ ... }}`).
    Section,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagKind::Variable => f.write_str("variable"),
            TagKind::Section => f.write_str("section"),
        }
    }
}

/// The tag a renderable value is currently rendering for.
#[derive(Clone, Copy)]
pub(crate) struct TagView<'env> {
    kind: TagKind,
    inner: &'env str,
    body: &'env [ast::Tag<'env>],
}

/// The result of a renderable value.
///
/// A rendering pairs the produced string with the content type it claims
/// to be.  The invoking tag uses the content type to decide whether the
/// string still needs escaping: under an HTML template a [`Text`]
/// rendering is escaped on splice, an [`Html`] rendering is trusted and
/// inserted verbatim.
///
/// [`Text`]: crate::ContentType::Text
/// [`Html`]: crate::ContentType::Html
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Rendering {
    string: String,
    content_type: ContentType,
}

impl Rendering {
    /// Creates a rendering with an explicit content type.
    pub fn new<S: Into<String>>(string: S, content_type: ContentType) -> Rendering {
        Rendering {
            string: string.into(),
            content_type,
        }
    }

    /// Creates a plain text rendering.
    ///
    /// Text renderings are escaped when spliced into an HTML template.
    pub fn text<S: Into<String>>(string: S) -> Rendering {
        Rendering::new(string, ContentType::Text)
    }

    /// Creates an HTML rendering.
    ///
    /// HTML renderings are trusted to be escaped already and are spliced
    /// verbatim.
    pub fn html<S: Into<String>>(string: S) -> Rendering {
        Rendering::new(string, ContentType::Html)
    }

    /// Returns the content type of the rendering.
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Returns the rendered string.
    pub fn as_str(&self) -> &str {
        &self.string
    }

    /// Consumes the rendering and returns the string.
    pub fn into_string(self) -> String {
        self.string
    }
}

impl From<String> for Rendering {
    fn from(value: String) -> Rendering {
        Rendering::text(value)
    }
}

impl From<&str> for Rendering {
    fn from(value: &str) -> Rendering {
        Rendering::text(value)
    }
}

/// Provides access to the current rendering from renderable values.
///
/// A [renderable](crate::value::Value::from_renderable) receives a mutable
/// reference to the state of the render it was invoked from.  Through it
/// the renderable can inspect the tag it sits in, resolve identifiers
/// against the context stack and re-render the tag's inner content or
/// another template of the repository.
pub struct State<'env> {
    repo: &'env TemplateRepository<'env>,
    ctx: Context,
    content_type: ContentType,
    name: &'env str,
    source: &'env str,
    tag: Option<TagView<'env>>,
}

impl fmt::Debug for State<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("ctx", &self.ctx)
            .finish()
    }
}

impl<'env> State<'env> {
    /// Looks up an identifier in the context stack.
    ///
    /// The lookup walks the stack from the innermost frame outwards and
    /// falls back to the base context of the repository configuration.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.ctx.load(self.repo.configuration(), name)
    }

    /// Returns the content type the current template renders with.
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Returns the name of the template currently rendering.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Returns the kind of tag the renderable was invoked from.
    pub fn tag_kind(&self) -> TagKind {
        self.tag.map_or(TagKind::Variable, |tag| tag.kind)
    }

    /// Returns the raw source between the opening and the closing tag.
    ///
    /// For variable tags this is an empty string.
    pub fn inner_template(&self) -> &'env str {
        self.tag.map_or("", |tag| tag.inner)
    }

    /// Renders the inner content of the current tag.
    ///
    /// The inner content renders against the current context stack.  For
    /// a variable tag the rendering is empty.  The returned rendering
    /// reports the content type of the surrounding template, so splicing
    /// it back escapes nothing twice.
    pub fn render_inner(&mut self) -> Result<Rendering, Error> {
        let tag = self.tag;
        let mut buf = String::new();
        if let Some(tag) = tag {
            ok!(render_tags(tag.body, self, &mut Output::new(&mut buf)));
        }
        Ok(Rendering::new(buf, self.content_type))
    }

    /// Renders another template of the repository under the current context.
    ///
    /// The template is resolved the way a partial tag would resolve it.
    /// The returned rendering reports the resolved template's own content
    /// type.
    pub fn render_named(&mut self, name: &str) -> Result<Rendering, Error> {
        let template = ok!(self.repo.get_linked(name));
        let content_type = template
            .content_type
            .unwrap_or_else(|| self.repo.configuration().content_type());
        let mut buf = String::new();
        ok!(render_nested(template, self, &mut Output::new(&mut buf)));
        Ok(Rendering::new(buf, content_type))
    }
}

/// Renders a compiled template against a root context value.
pub(crate) fn render<'env>(
    repo: &'env TemplateRepository<'env>,
    template: &'env CompiledTemplate<'env>,
    root: Value,
    out: &mut Output,
) -> Result<(), Error> {
    let root = ok!(root.validate());
    let mut state = State {
        repo,
        ctx: Context::new(root),
        content_type: template
            .content_type
            .unwrap_or_else(|| repo.configuration().content_type()),
        name: template.name,
        source: template.source,
        tag: None,
    };
    render_tags(&template.tags, &mut state, out)
}

fn render_tags<'env>(
    tags: &'env [ast::Tag<'env>],
    state: &mut State<'env>,
    out: &mut Output,
) -> Result<(), Error> {
    for tag in tags {
        if let Err(mut err) = render_tag(tag, state, out) {
            process_err(&mut err, tag.span(), state);
            return Err(err);
        }
    }
    Ok(())
}

fn render_tag<'env>(
    tag: &'env ast::Tag<'env>,
    state: &mut State<'env>,
    out: &mut Output,
) -> Result<(), Error> {
    match tag {
        ast::Tag::EmitRaw(raw) => out.write_str(raw.raw).map_err(Error::from),
        ast::Tag::Variable(var) => render_variable(var, state, out),
        ast::Tag::Section(sec) => render_section(sec, state, out),
        ast::Tag::Partial(partial) => render_partial(partial, state, out),
    }
}

fn render_variable<'env>(
    var: &'env ast::Variable<'env>,
    state: &mut State<'env>,
    out: &mut Output,
) -> Result<(), Error> {
    let value = ok!(eval(&var.expr, state));
    if let Some(render_fn) = value.as_renderable() {
        let tag = TagView {
            kind: TagKind::Variable,
            inner: "",
            body: &[],
        };
        let rendering = ok!(invoke_renderable(render_fn, tag, state));
        splice_rendering(&rendering, var.escape, state, out)
    } else {
        let content_type = if var.escape {
            state.content_type
        } else {
            ContentType::Text
        };
        write_escaped(out, content_type, &value)
    }
}

fn render_section<'env>(
    sec: &'env ast::Section<'env>,
    state: &mut State<'env>,
    out: &mut Output,
) -> Result<(), Error> {
    let value = ok!(eval(&sec.expr, state));

    if sec.inverted {
        // renderables count as truthy here and are never invoked
        if !value.is_true() {
            ok!(render_tags(&sec.body, state, out));
        }
        return Ok(());
    }

    if let Some(render_fn) = value.as_renderable() {
        let tag = TagView {
            kind: TagKind::Section,
            inner: sec.inner,
            body: &sec.body,
        };
        // the rendered value is on the stack while it renders
        state.ctx.push_frame(value.clone());
        let rv = invoke_renderable(render_fn, tag, state);
        state.ctx.pop_frame();
        let rendering = ok!(rv);
        splice_rendering(&rendering, true, state, out)
    } else if let Some(items) = value.as_seq() {
        for item in items {
            state.ctx.push_frame(item.clone());
            let rv = render_tags(&sec.body, state, out);
            state.ctx.pop_frame();
            ok!(rv);
        }
        Ok(())
    } else if value.is_true() {
        state.ctx.push_frame(value);
        let rv = render_tags(&sec.body, state, out);
        state.ctx.pop_frame();
        rv
    } else {
        Ok(())
    }
}

fn render_partial<'env>(
    partial: &ast::Partial<'env>,
    state: &mut State<'env>,
    out: &mut Output,
) -> Result<(), Error> {
    let template = ok!(state.repo.get_cached(partial.name));
    render_nested(template, state, out)
}

/// Renders another template in place, preserving the context stack.
///
/// The nested template renders with its own content type.  Name, source
/// and content type are restored even when rendering fails.
fn render_nested<'env>(
    template: &'env CompiledTemplate<'env>,
    state: &mut State<'env>,
    out: &mut Output,
) -> Result<(), Error> {
    let old_name = state.name;
    let old_source = state.source;
    let old_content_type = state.content_type;
    state.name = template.name;
    state.source = template.source;
    state.content_type = template
        .content_type
        .unwrap_or_else(|| state.repo.configuration().content_type());
    let rv = render_tags(&template.tags, state, out);
    state.name = old_name;
    state.source = old_source;
    state.content_type = old_content_type;
    rv
}

fn invoke_renderable<'env>(
    render_fn: &RenderFunc,
    tag: TagView<'env>,
    state: &mut State<'env>,
) -> Result<Rendering, Error> {
    let old_tag = state.tag.replace(tag);
    let rv = render_fn(state);
    state.tag = old_tag;
    rv
}

/// Splices the result of a renderable into the output.
///
/// A text rendering under an HTML template is escaped on the way out
/// unless the tag was an unescaped variable.  HTML renderings and text
/// templates splice verbatim.
fn splice_rendering(
    rendering: &Rendering,
    escapes: bool,
    state: &State<'_>,
    out: &mut Output,
) -> Result<(), Error> {
    let raw = !escapes
        || state.content_type == ContentType::Text
        || rendering.content_type() == ContentType::Html;
    if raw {
        out.write_str(rendering.as_str()).map_err(Error::from)
    } else {
        write!(out, "{}", HtmlEscape(rendering.as_str())).map_err(Error::from)
    }
}

#[inline(never)]
#[cold]
fn process_err(err: &mut Error, span: Span, state: &State) {
    // only attach line information if the error does not have line
    // info yet.
    if err.line().is_none() {
        err.set_filename_and_span(state.name, span);
    }
    // only attach debug info if we don't have one yet and we are in debug mode.
    #[cfg(feature = "debug")]
    {
        if state.repo.debug() && err.debug_info().is_none() {
            err.attach_debug_info(crate::debug::DebugInfo {
                template_source: Some(state.source.to_string()),
                context: Some(state.ctx.freeze()),
            });
        }
    }
}
