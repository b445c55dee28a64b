use std::fmt;
use std::io;
use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;

use crate::compiler::ast;
use crate::compiler::parser::parse;
use crate::error::{attach_basic_debug_info, Error};
use crate::output::{Output, WriteWrapper};
use crate::repository::TemplateRepository;
use crate::utils::ContentType;
use crate::value::Value;

/// A handle to a compiled template.
///
/// A template is stored in a [`TemplateRepository`] and can be rendered
/// multiple times against different context values.  To render a template
/// with a context, use [`render`](Template::render) with any serializable
/// value, commonly one built with the [`context!`](crate::context!) macro.
///
/// ```
/// # use minimustache::{TemplateRepository, context};
/// # fn test() -> Result<(), minimustache::Error> {
/// let mut repo = TemplateRepository::new();
/// repo.add_template("hello", "Hello {{name}}!")?;
/// let tmpl = repo.get_template("hello")?;
/// println!("{}", tmpl.render(context!(name => "World"))?);
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct Template<'repo, 'source> {
    repo: &'repo TemplateRepository<'source>,
    compiled: CompiledTemplateRef<'repo, 'source>,
}

impl fmt::Debug for Template<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name())
            .field("content_type", &self.content_type())
            .finish()
    }
}

impl<'repo, 'source> Template<'repo, 'source> {
    pub(crate) fn new(
        repo: &'repo TemplateRepository<'source>,
        compiled: CompiledTemplateRef<'repo, 'source>,
    ) -> Template<'repo, 'source> {
        Template { repo, compiled }
    }

    /// Returns the name of the template.
    pub fn name(&self) -> &str {
        self.compiled.name
    }

    /// Returns the source code of the template.
    pub fn source(&self) -> &str {
        self.compiled.source
    }

    /// Returns the content type the template renders with.
    ///
    /// This is the pragma declared type if the template carries one,
    /// otherwise the content type of the repository configuration.
    pub fn content_type(&self) -> ContentType {
        self.compiled
            .content_type
            .unwrap_or_else(|| self.repo.configuration().content_type())
    }

    /// Renders the template into a string.
    ///
    /// The provided value is used as the root of the context stack.
    /// Pass anything serializable; the [`context!`](crate::context!)
    /// macro is the common way to build a context ad-hoc.
    ///
    /// ```
    /// # use minimustache::{TemplateRepository, context};
    /// # fn test() -> Result<(), minimustache::Error> {
    /// # let mut repo = TemplateRepository::new();
    /// # repo.add_template("hello", "Hello {{name}}!")?;
    /// let tmpl = repo.get_template("hello")?;
    /// println!("{}", tmpl.render(context!(name => "John"))?);
    /// # Ok(()) }
    /// ```
    pub fn render<S: Serialize>(&self, ctx: S) -> Result<String, Error> {
        // reduce total amount of code falling under mono morphization into
        // this function, and share the rest in _render.
        self._render(Value::from_serialize(&ctx))
    }

    fn _render(&self, root: Value) -> Result<String, Error> {
        let mut rv = String::with_capacity(self.compiled.source.len());
        ok!(self._render_into(root, &mut Output::new(&mut rv)));
        Ok(rv)
    }

    /// Renders the template into an [`io::Write`].
    ///
    /// This works like [`render`](Template::render) but writes the
    /// rendered output into a writer instead of returning a string.  An
    /// error from the writer aborts the render and surfaces as
    /// [`WriteFailure`](crate::ErrorKind::WriteFailure) with the original
    /// I/O error as source.
    pub fn render_to_write<S: Serialize, W: io::Write>(&self, ctx: S, w: W) -> Result<(), Error> {
        let mut wrapper = WriteWrapper { w, err: None };
        let rv = self._render_into(Value::from_serialize(&ctx), &mut Output::new(&mut wrapper));
        rv.map_err(|err| wrapper.take_err(err))
    }

    fn _render_into(&self, root: Value, out: &mut Output) -> Result<(), Error> {
        crate::render::render(self.repo, &self.compiled, root, out)
    }
}

/// Reference to a compiled template, either borrowed from the repository
/// cache or owned by the handle.
#[derive(Clone)]
pub(crate) enum CompiledTemplateRef<'repo, 'source> {
    Owned(Arc<CompiledTemplate<'source>>),
    Borrowed(&'repo CompiledTemplate<'source>),
}

impl<'source> Deref for CompiledTemplateRef<'_, 'source> {
    type Target = CompiledTemplate<'source>;

    fn deref(&self) -> &Self::Target {
        match self {
            CompiledTemplateRef::Owned(ref x) => x,
            CompiledTemplateRef::Borrowed(x) => x,
        }
    }
}

/// Represents a compiled template in memory.
pub(crate) struct CompiledTemplate<'source> {
    pub(crate) name: &'source str,
    pub(crate) source: &'source str,
    pub(crate) tags: Vec<ast::Tag<'source>>,
    pub(crate) content_type: Option<ContentType>,
}

impl fmt::Debug for CompiledTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl<'source> CompiledTemplate<'source> {
    pub(crate) fn new(
        name: &'source str,
        source: &'source str,
    ) -> Result<CompiledTemplate<'source>, Error> {
        attach_basic_debug_info(CompiledTemplate::_new_impl(name, source), source)
    }

    fn _new_impl(
        name: &'source str,
        source: &'source str,
    ) -> Result<CompiledTemplate<'source>, Error> {
        let tree = ok!(parse(source, name));
        Ok(CompiledTemplate {
            name,
            source,
            tags: tree.children,
            content_type: tree.content_type,
        })
    }
}
