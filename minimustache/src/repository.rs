use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use memo_map::MemoMap;
use self_cell::self_cell;
use serde::Serialize;

use crate::compiler::ast;
use crate::configuration::Configuration;
use crate::error::{Error, ErrorKind};
use crate::output::Output;
use crate::template::{CompiledTemplate, CompiledTemplateRef, Template};
use crate::value::Value;

type LoadFunc = dyn for<'a> Fn(&'a str) -> Result<Option<String>, Error> + Send + Sync;

/// Storage for compiled templates, borrowed and loaded ones.
///
/// Templates registered with [`TemplateRepository::add_template`] borrow
/// their name and source and live in the borrowed map.  Templates pulled
/// in through the loader own their source; they are compiled once and
/// memoized, which is what makes render time partial lookup a plain read.
#[derive(Clone)]
struct TemplateStore<'source> {
    loader: Option<Arc<LoadFunc>>,
    owned_templates: MemoMap<Arc<str>, Arc<LoadedTemplate>>,
    borrowed_templates: BTreeMap<&'source str, Arc<CompiledTemplate<'source>>>,
}

impl fmt::Debug for TemplateStore<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut l = f.debug_list();
        for key in self.owned_templates.keys() {
            l.entry(key);
        }
        for key in self.borrowed_templates.keys() {
            if !self.owned_templates.contains_key(*key) {
                l.entry(key);
            }
        }
        l.finish()
    }
}

self_cell! {
    struct LoadedTemplate {
        owner: (Arc<str>, Box<str>),
        #[covariant]
        dependent: CompiledTemplate,
    }
}

impl fmt::Debug for LoadedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.borrow_dependent(), f)
    }
}

impl<'source> TemplateStore<'source> {
    fn new() -> TemplateStore<'source> {
        TemplateStore {
            loader: None,
            owned_templates: MemoMap::default(),
            borrowed_templates: BTreeMap::default(),
        }
    }

    fn insert(&mut self, name: &'source str, source: &'source str) -> Result<(), Error> {
        self.owned_templates.remove(name);
        self.borrowed_templates
            .insert(name, Arc::new(ok!(CompiledTemplate::new(name, source))));
        Ok(())
    }

    fn remove(&mut self, name: &str) {
        self.borrowed_templates.remove(name);
        self.owned_templates.remove(name);
    }

    fn clear(&mut self) {
        self.borrowed_templates.clear();
        self.owned_templates.clear();
    }

    /// Returns a template, asking the loader on a cache miss.
    fn get(&self, name: &str) -> Result<&CompiledTemplate<'_>, Error> {
        if let Some(rv) = self.borrowed_templates.get(name) {
            Ok(&**rv)
        } else {
            let name: Arc<str> = name.into();
            self.owned_templates
                .get_or_try_insert(&name.clone(), || -> Result<_, Error> {
                    let loader_result = match self.loader {
                        Some(ref loader) => ok!(loader(&name)),
                        None => None,
                    }
                    .ok_or_else(|| Error::new_not_found(&name));
                    make_owned_template(name, ok!(loader_result))
                })
                .map(|x| x.borrow_dependent())
        }
    }

    /// Returns a template without consulting the loader.
    fn get_cached(&self, name: &str) -> Option<&CompiledTemplate<'_>> {
        if let Some(rv) = self.borrowed_templates.get(name) {
            Some(&**rv)
        } else {
            self.owned_templates
                .get(name)
                .map(|x| x.borrow_dependent())
        }
    }

    fn set_loader<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Result<Option<String>, Error> + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(f));
    }
}

fn make_owned_template(name: Arc<str>, source: String) -> Result<Arc<LoadedTemplate>, Error> {
    LoadedTemplate::try_new(
        (name, source.into_boxed_str()),
        |(name, source)| -> Result<_, Error> { CompiledTemplate::new(name, source) },
    )
    .map(Arc::new)
}

/// Names currently being linked and names already linked.
///
/// The loading stack is the cycle guard: a name that shows up on it a
/// second time closes an inclusion cycle.
#[derive(Clone, Default)]
struct LinkState {
    loading: Vec<Arc<str>>,
    linked: BTreeSet<Arc<str>>,
}

/// Loads, compiles, caches and renders templates.
///
/// The repository is the root object of this crate.  Templates are
/// registered in memory with [`add_template`](Self::add_template), loaded
/// on demand through a loader installed with
/// [`set_loader`](Self::set_loader), or compiled from loose strings with
/// [`template_from_str`](Self::template_from_str) and the
/// [`render_str`](Self::render_str) shortcut.
///
/// Fetching a template resolves its partials immediately and
/// transitively, so an inclusion cycle fails the fetch with
/// [`CircularPartialInclusion`](crate::ErrorKind::CircularPartialInclusion)
/// instead of hanging a render.
///
/// The repository starts with a copy of the process wide default
/// [`Configuration`].  The configuration can be changed up to the first
/// compilation; afterwards it is frozen and mutation fails with
/// [`ConfigurationFrozen`](crate::ErrorKind::ConfigurationFrozen).
///
/// # Example
///
/// ```
/// use minimustache::{TemplateRepository, context};
///
/// let mut repo = TemplateRepository::new();
/// repo.add_template("hello.html", "Hello {{name}}!").unwrap();
/// let tmpl = repo.get_template("hello.html").unwrap();
/// assert_eq!(
///     tmpl.render(context! { name => "<World>" }).unwrap(),
///     "Hello &lt;World&gt;!"
/// );
/// ```
pub struct TemplateRepository<'source> {
    templates: TemplateStore<'source>,
    configuration: Configuration,
    link_state: Mutex<LinkState>,
    frozen: AtomicBool,
    #[cfg(feature = "debug")]
    debug: bool,
}

impl fmt::Debug for TemplateRepository<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRepository")
            .field("configuration", &self.configuration)
            .field("templates", &self.templates)
            .finish()
    }
}

impl<'source> Default for TemplateRepository<'source> {
    fn default() -> TemplateRepository<'source> {
        TemplateRepository::new()
    }
}

impl<'source> Clone for TemplateRepository<'source> {
    fn clone(&self) -> TemplateRepository<'source> {
        TemplateRepository {
            templates: self.templates.clone(),
            configuration: self.configuration.clone(),
            link_state: Mutex::new(self.lock_link_state().clone()),
            frozen: AtomicBool::new(self.frozen.load(Ordering::Relaxed)),
            #[cfg(feature = "debug")]
            debug: self.debug,
        }
    }
}

impl<'source> TemplateRepository<'source> {
    /// Creates a repository with the process wide default configuration.
    ///
    /// The repository holds a copy taken at construction time; later
    /// changes to the default configuration do not affect it.
    pub fn new() -> TemplateRepository<'source> {
        TemplateRepository::with_configuration(Configuration::default_configuration())
    }

    /// Creates a repository with an empty configuration.
    ///
    /// No builtin filters are registered in the base context, not even
    /// when the process wide default configuration carries them.
    pub fn empty() -> TemplateRepository<'source> {
        TemplateRepository::with_configuration(Configuration::empty())
    }

    /// Creates a repository with an explicit configuration.
    pub fn with_configuration(configuration: Configuration) -> TemplateRepository<'source> {
        TemplateRepository {
            templates: TemplateStore::new(),
            configuration,
            link_state: Mutex::new(LinkState::default()),
            frozen: AtomicBool::new(false),
            #[cfg(feature = "debug")]
            debug: cfg!(debug_assertions),
        }
    }

    /// Registers a template by name and source.
    ///
    /// The template is compiled eagerly, so syntax errors surface here.
    /// Its partials are not resolved yet; that happens when the template
    /// is fetched with [`get_template`](Self::get_template).  Registering
    /// a name twice replaces the earlier template.
    ///
    /// Note that the name and source strings are borrowed for the life of
    /// the repository.  Templates with owned sources come in through the
    /// loader instead.
    pub fn add_template(&mut self, name: &'source str, source: &'source str) -> Result<(), Error> {
        // every template linked through the old version holds a stale
        // memo entry, so the whole set goes
        self.lock_link_state().linked.clear();
        self.templates.insert(name, source)
    }

    /// Removes a template by name.
    pub fn remove_template(&mut self, name: &str) {
        self.lock_link_state().linked.clear();
        self.templates.remove(name);
    }

    /// Removes all registered and loaded templates.
    pub fn clear_templates(&mut self) {
        self.lock_link_state().linked.clear();
        self.templates.clear();
    }

    /// Installs a template loader.
    ///
    /// The loader is invoked when a template name is not registered.  It
    /// returns the template source, `Ok(None)` for not-found (reported as
    /// [`TemplateNotFound`](crate::ErrorKind::TemplateNotFound)), or an
    /// error of its own.  Once loaded, a template stays cached; the
    /// loader is not asked again for the same name.
    ///
    /// ```
    /// # use minimustache::{path_loader, TemplateRepository};
    /// fn create_repo() -> TemplateRepository<'static> {
    ///     let mut repo = TemplateRepository::new();
    ///     repo.set_loader(path_loader("path/to/templates"));
    ///     repo
    /// }
    /// ```
    pub fn set_loader<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Result<Option<String>, Error> + Send + Sync + 'static,
    {
        self.templates.set_loader(f);
    }

    /// Fetches a template by name.
    ///
    /// Registered templates are looked up first, then the loader.  The
    /// template and every partial it transitively references are compiled
    /// and cached before the handle is returned, so rendering it cannot
    /// run into unresolved partials.  This freezes the configuration.
    pub fn get_template(&self, name: &str) -> Result<Template<'_, '_>, Error> {
        self.freeze();
        ok!(self.link(name));
        let compiled = ok!(self.templates.get(name));
        Ok(Template::new(self, CompiledTemplateRef::Borrowed(compiled)))
    }

    /// Compiles a template from a string without registering it.
    ///
    /// The template is not cached, but partials it references resolve
    /// against this repository and are cached like any other fetch.  This
    /// freezes the configuration.
    pub fn template_from_str(&self, source: &'source str) -> Result<Template<'_, 'source>, Error> {
        self.template_from_named_str("<string>", source)
    }

    /// Like [`template_from_str`](Self::template_from_str), but with a name
    /// for error messages.
    pub fn template_from_named_str(
        &self,
        name: &'source str,
        source: &'source str,
    ) -> Result<Template<'_, 'source>, Error> {
        self.freeze();
        let compiled = Arc::new(ok!(CompiledTemplate::new(name, source)));
        ok!(self.link_tree(&compiled.tags));
        Ok(Template::new(self, CompiledTemplateRef::Owned(compiled)))
    }

    /// Renders a template from a string in one go.
    ///
    /// The template is compiled, rendered and thrown away; nothing is
    /// cached.  Its name in error messages is `<string>`.
    ///
    /// ```
    /// # use minimustache::{TemplateRepository, context};
    /// let repo = TemplateRepository::new();
    /// let rv = repo.render_str("Hello {{name}}", context! { name => "World" });
    /// println!("{}", rv.unwrap());
    /// ```
    pub fn render_str<S: Serialize>(&self, source: &str, ctx: S) -> Result<String, Error> {
        // reduce total amount of code falling under mono morphization into
        // this function, and share the rest in _render_str.
        self._render_str("<string>", source, Value::from_serialize(&ctx))
    }

    /// Like [`render_str`](Self::render_str), but provide a name for the
    /// template to be used instead of the default `<string>`.
    pub fn render_named_str<S: Serialize>(
        &self,
        name: &str,
        source: &str,
        ctx: S,
    ) -> Result<String, Error> {
        // reduce total amount of code falling under mono morphization into
        // this function, and share the rest in _render_str.
        self._render_str(name, source, Value::from_serialize(&ctx))
    }

    fn _render_str(&self, name: &str, source: &str, root: Value) -> Result<String, Error> {
        self.freeze();
        let compiled = ok!(CompiledTemplate::new(name, source));
        ok!(self.link_tree(&compiled.tags));
        let mut rv = String::with_capacity(source.len());
        ok!(crate::render::render(
            self,
            &compiled,
            root,
            &mut Output::new(&mut rv)
        ));
        Ok(rv)
    }

    /// Returns the configuration of the repository.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Returns a mutable reference to the configuration.
    ///
    /// This fails with
    /// [`ConfigurationFrozen`](crate::ErrorKind::ConfigurationFrozen) once
    /// the repository has compiled a template.
    pub fn configuration_mut(&mut self) -> Result<&mut Configuration, Error> {
        ok!(self.check_not_frozen());
        Ok(&mut self.configuration)
    }

    /// Replaces the configuration of the repository.
    ///
    /// Like [`configuration_mut`](Self::configuration_mut) this fails once
    /// the repository has compiled a template.
    pub fn set_configuration(&mut self, configuration: Configuration) -> Result<(), Error> {
        ok!(self.check_not_frozen());
        self.configuration = configuration;
        Ok(())
    }

    /// Enable or disable the debug mode.
    ///
    /// When the debug mode is enabled rendering errors carry the template
    /// source and a snapshot of the context stack, and printing the error
    /// with alternative formatting (`{:#}`) includes them.  The cost of
    /// this is relatively high as the source and context are cloned into
    /// the error.
    ///
    /// This requires the `debug` feature.  This is enabled by default if
    /// debug assertions are enabled and false otherwise.
    #[cfg(feature = "debug")]
    #[cfg_attr(docsrs, doc(cfg(feature = "debug")))]
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    /// Returns the current value of the debug flag.
    #[cfg(feature = "debug")]
    pub(crate) fn debug(&self) -> bool {
        self.debug
    }

    /// Returns a cached template for a partial tag.
    ///
    /// Linking already pulled every reachable partial into the cache, so
    /// a miss means the template was removed since and maps to
    /// [`MissingPartial`](crate::ErrorKind::MissingPartial).
    pub(crate) fn get_cached(&self, name: &str) -> Result<&CompiledTemplate<'_>, Error> {
        self.templates.get_cached(name).ok_or_else(|| {
            Error::new(
                ErrorKind::MissingPartial,
                format!("partial {name:?} is not loaded"),
            )
        })
    }

    /// Returns a template by name, loading and linking it if necessary.
    pub(crate) fn get_linked(&self, name: &str) -> Result<&CompiledTemplate<'_>, Error> {
        ok!(self.link(name));
        self.templates.get(name)
    }

    fn freeze(&self) {
        self.frozen.store(true, Ordering::Relaxed);
    }

    fn check_not_frozen(&self) -> Result<(), Error> {
        if self.frozen.load(Ordering::Relaxed) {
            Err(Error::new(
                ErrorKind::ConfigurationFrozen,
                "configuration cannot change after the repository compiled a template",
            ))
        } else {
            Ok(())
        }
    }

    fn lock_link_state(&self) -> std::sync::MutexGuard<'_, LinkState> {
        self.link_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads a template and everything it references, cycle checked.
    ///
    /// The name goes onto the loading stack before any work and comes off
    /// it on every exit path.  Hitting a name that is already on the
    /// stack is an inclusion cycle.
    fn link(&self, name: &str) -> Result<(), Error> {
        let mut link_state = self.lock_link_state();
        if link_state.linked.contains(name) {
            return Ok(());
        }
        if link_state.loading.iter().any(|loading| **loading == *name) {
            return Err(Error::new(
                ErrorKind::CircularPartialInclusion,
                format!("template {name:?} transitively includes itself"),
            ));
        }
        let name: Arc<str> = name.into();
        link_state.loading.push(name.clone());
        drop(link_state);

        let rv = self.link_partials_of(&name);

        let mut link_state = self.lock_link_state();
        link_state.loading.pop();
        if rv.is_ok() {
            link_state.linked.insert(name);
        }
        rv
    }

    fn link_partials_of(&self, name: &str) -> Result<(), Error> {
        let template = ok!(self.templates.get(name));
        self.link_tree(&template.tags)
    }

    fn link_tree(&self, tags: &[ast::Tag<'_>]) -> Result<(), Error> {
        let mut partials = Vec::new();
        collect_partials(tags, &mut partials);
        for partial in partials {
            ok!(self.link(partial));
        }
        Ok(())
    }
}

fn collect_partials<'s>(tags: &[ast::Tag<'s>], out: &mut Vec<&'s str>) {
    for tag in tags {
        match tag {
            ast::Tag::Partial(partial) => out.push(partial.name),
            ast::Tag::Section(section) => collect_partials(&section.body, out),
            _ => {}
        }
    }
}

/// Safely joins two paths.
fn safe_join(base: &Path, template: &str) -> Option<PathBuf> {
    let mut rv = base.to_path_buf();
    for segment in template.split('/') {
        if segment.starts_with('.') || segment.contains('\\') {
            return None;
        }
        rv.push(segment);
    }
    Some(rv)
}

/// Helper to load templates from a given directory.
///
/// This creates a dynamic loader which looks up templates in the given
/// directory.  Names without a file extension get `.mustache` appended,
/// so the partial tag `{{>header}}` finds `header.mustache`.  Templates
/// that start with a dot (`.`) or are contained in a folder starting with
/// a dot cannot be loaded.
///
/// # Example
///
/// ```rust
/// # use minimustache::{path_loader, TemplateRepository};
/// fn create_repo() -> TemplateRepository<'static> {
///     let mut repo = TemplateRepository::new();
///     repo.set_loader(path_loader("path/to/templates"));
///     repo
/// }
/// ```
pub fn path_loader<'x, P: AsRef<Path> + 'x>(
    dir: P,
) -> impl for<'a> Fn(&'a str) -> Result<Option<String>, Error> + Send + Sync + 'static {
    let dir = dir.as_ref().to_path_buf();
    move |name| {
        let mut path = match safe_join(&dir, name) {
            Some(path) => path,
            None => return Ok(None),
        };
        if path.extension().is_none() {
            path.set_extension("mustache");
        }
        match fs::read_to_string(path) {
            Ok(result) => Ok(Some(result)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(
                Error::new(ErrorKind::TemplateNotFound, "could not read template")
                    .with_source(err),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_safe_join() {
        assert_eq!(
            safe_join(Path::new("foo"), "bar/baz"),
            Some(PathBuf::from("foo").join("bar").join("baz"))
        );
        assert_eq!(safe_join(Path::new("foo"), ".bar/baz"), None);
        assert_eq!(safe_join(Path::new("foo"), "bar/.baz"), None);
        assert_eq!(safe_join(Path::new("foo"), "bar/../baz"), None);
    }

    #[test]
    fn test_collect_partials() {
        let tree = crate::compiler::parser::parse(
            "{{>top}}{{#section}}{{>nested}}{{/section}}",
            "tmpl",
        )
        .unwrap();
        let mut partials = Vec::new();
        collect_partials(&tree.children, &mut partials);
        assert_eq!(partials, vec!["top", "nested"]);
    }
}
