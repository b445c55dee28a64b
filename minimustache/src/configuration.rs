use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::defaults;
use crate::error::Error;
use crate::render::{Rendering, State};
use crate::utils::ContentType;
use crate::value::{Value, ValueMap};

/// The process wide default configuration.
///
/// It's lazily initialized to the factory configuration on first access
/// so that merely linking the crate does not build the builtin filter
/// table.
static DEFAULT_CONFIGURATION: Mutex<Option<Configuration>> = Mutex::new(None);

fn lock_default() -> MutexGuard<'static, Option<Configuration>> {
    DEFAULT_CONFIGURATION
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Settings a repository compiles and renders templates with.
///
/// A configuration carries the default content type of templates (which
/// decides whether variable tags escape HTML) and the base context, a set
/// of values every render can resolve identifiers against after the
/// regular context stack is exhausted.  The builtin filters live in the
/// base context of the factory configuration.
///
/// Detached configuration values are freely mutable.  Once a repository
/// compiled its first template the configuration it holds is frozen and
/// [`configuration_mut`](crate::TemplateRepository::configuration_mut)
/// fails with [`ConfigurationFrozen`](crate::ErrorKind::ConfigurationFrozen).
///
/// # Example
///
/// ```
/// use minimustache::{Configuration, ContentType, TemplateRepository};
///
/// let mut config = Configuration::new();
/// config.set_content_type(ContentType::Text);
/// let repo = TemplateRepository::with_configuration(config);
/// let rv = repo.render_str("{{.}}", "Tom & Jerry").unwrap();
/// assert_eq!(rv, "Tom & Jerry");
/// ```
#[derive(Clone)]
pub struct Configuration {
    content_type: ContentType,
    base_context: ValueMap,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("content_type", &self.content_type)
            .field("base_context", &self.base_context)
            .finish()
    }
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration::new()
    }
}

impl Configuration {
    /// Creates the factory configuration.
    ///
    /// The content type is [`Html`](ContentType::Html) and the base
    /// context holds the builtin filters.  If you do not want the
    /// builtins you can use the alternative [`empty`](Configuration::empty)
    /// method.
    pub fn new() -> Configuration {
        Configuration {
            content_type: ContentType::Html,
            base_context: defaults::builtin_base_context(),
        }
    }

    /// Creates a configuration with an empty base context.
    ///
    /// The content type is [`Html`](ContentType::Html) like in the factory
    /// configuration, but no builtin filters are registered.
    pub fn empty() -> Configuration {
        Configuration {
            content_type: ContentType::Html,
            base_context: ValueMap::default(),
        }
    }

    /// Returns the default content type of templates.
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Sets the default content type of templates.
    ///
    /// A `{{%CONTENT_TYPE:...}}` pragma in a template overrides this for
    /// that template.
    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = content_type;
    }

    /// Registers a value in the base context.
    ///
    /// Identifiers that resolve nowhere in the context stack of a render
    /// fall back to the base context.
    pub fn extend_base_context<N: Into<String>>(&mut self, name: N, value: Value) {
        self.base_context.insert(name.into(), value);
    }

    /// Registers a filter in the base context.
    ///
    /// This is a convenience for [`extend_base_context`] with
    /// [`Value::from_filter`].
    ///
    /// [`extend_base_context`]: Configuration::extend_base_context
    pub fn add_filter<N, F>(&mut self, name: N, f: F)
    where
        N: Into<String>,
        F: Fn(&Value) -> Result<Value, Error> + Sync + Send + 'static,
    {
        self.extend_base_context(name, Value::from_filter(f));
    }

    /// Registers a renderable in the base context.
    ///
    /// This is a convenience for [`extend_base_context`] with
    /// [`Value::from_renderable`].
    ///
    /// [`extend_base_context`]: Configuration::extend_base_context
    pub fn add_renderable<N, F>(&mut self, name: N, f: F)
    where
        N: Into<String>,
        F: Fn(&mut State<'_>) -> Result<Rendering, Error> + Sync + Send + 'static,
    {
        self.extend_base_context(name, Value::from_renderable(f));
    }

    /// Looks up a name in the base context.
    pub(crate) fn get_base(&self, key: &str) -> Option<Value> {
        self.base_context.get(key).cloned()
    }

    /// Returns a copy of the process wide default configuration.
    ///
    /// New repositories start from this configuration.  It is the factory
    /// configuration unless it was replaced with
    /// [`set_default`](Configuration::set_default) or modified with
    /// [`update_default`](Configuration::update_default).
    pub fn default_configuration() -> Configuration {
        lock_default()
            .get_or_insert_with(Configuration::new)
            .clone()
    }

    /// Replaces the process wide default configuration.
    ///
    /// Repositories created earlier are unaffected, they hold a copy.
    pub fn set_default(configuration: Configuration) {
        *lock_default() = Some(configuration);
    }

    /// Modifies the process wide default configuration in place.
    ///
    /// ```
    /// use minimustache::{Configuration, ContentType};
    ///
    /// Configuration::update_default(|config| {
    ///     config.set_content_type(ContentType::Text);
    /// });
    /// # Configuration::set_default(Configuration::new());
    /// ```
    pub fn update_default<F: FnOnce(&mut Configuration)>(f: F) {
        let mut guard = lock_default();
        f(guard.get_or_insert_with(Configuration::new));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_factory_configuration() {
        let config = Configuration::new();
        assert_eq!(config.content_type(), ContentType::Html);
        #[cfg(feature = "builtins")]
        assert!(config.get_base("uppercase").is_some());
        assert!(Configuration::empty().get_base("uppercase").is_none());
    }

    #[test]
    fn test_extend_base_context() {
        let mut config = Configuration::empty();
        config.extend_base_context("answer", Value::from(42));
        config.add_filter("double", |value: &Value| {
            Ok(Value::from(value.as_i64().unwrap_or(0) * 2))
        });
        assert_eq!(config.get_base("answer"), Some(Value::from(42)));
        assert!(config.get_base("double").is_some());
        assert!(config.get_base("missing").is_none());
    }
}
