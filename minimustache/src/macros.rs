// `ok!` is a less bloaty alternative to the standard library's try operator (`?`).
// Since we do not need type conversions in this crate we can fall back to a much easier match
// pattern that compiles faster and produces less bloaty code.

macro_rules! ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => return Err(err),
        }
    };
}

/// Hidden utility module for the [`context!`](crate::context!) macro.
#[doc(hidden)]
pub mod __context {
    use std::sync::Arc;

    use crate::value::{Value, ValueMap, ValueRepr};

    #[inline(always)]
    pub fn make() -> ValueMap {
        ValueMap::default()
    }

    #[inline(always)]
    pub fn add(ctx: &mut ValueMap, key: &'static str, value: Value) {
        ctx.insert(key.into(), value);
    }

    #[inline(always)]
    pub fn build(ctx: ValueMap) -> Value {
        Value::from(ValueRepr::Map(Arc::new(ctx)))
    }
}

/// Creates a template context from keys and values.
///
/// ```rust
/// # use minimustache::context;
/// let ctx = context! {
///     name => "Peter",
///     location => "World",
/// };
/// ```
///
/// Alternatively if the variable name matches the key name it can
/// be omitted:
///
/// ```rust
/// # use minimustache::context;
/// let name = "Peter";
/// let ctx = context! { name };
/// ```
///
/// The return value is a [`Value`](crate::Value).
///
/// Note that [`context!`](crate::context!) can also be used recursively if you need to
/// create nested objects:
///
/// ```rust
/// # use minimustache::context;
/// let ctx = context! {
///     user => context!(name => "Peter"),
///     page => "Index",
/// };
/// ```
///
/// # Note on Conversions
///
/// This macro uses [`Value::from_serialize`](crate::Value::from_serialize)
/// for conversions, so values that already are [`Value`](crate::Value)s
/// (including filters and renderables) pass through unchanged.
#[macro_export]
macro_rules! context {
    () => {
        $crate::__context::build($crate::__context::make())
    };
    (
        $($key:ident $(=> $value:expr)?),* $(,)?
    ) => {{
        let mut ctx = $crate::__context::make();
        $(
            $crate::__context_pair!(ctx, $key $(=> $value)?);
        )*
        $crate::__context::build(ctx)
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! __context_pair {
    ($ctx:ident, $key:ident) => {{
        $crate::__context_pair!($ctx, $key => $key);
    }};
    ($ctx:ident, $key:ident => $value:expr) => {
        $crate::__context::add(
            &mut $ctx,
            stringify!($key),
            $crate::Value::from_serialize(&$value),
        );
    };
}

/// A macro similar to [`format!`] but that uses Mustache for rendering.
///
/// This can be used to quickly render a template into a string without
/// having to create a repository first which can be useful in some
/// situations.  Note however that the template is re-parsed every time
/// the [`render!`](crate::render) macro is called which is potentially
/// slow, and that partials cannot resolve because the implicit repository
/// is empty.
///
/// There are two forms for this macro.  The default form takes template
/// source and context variables, the extended form also lets you provide
/// a repository that should be used rather than a fresh one.  The context
/// variables are passed the same way as with the
/// [`context!`](crate::context) macro.
///
/// # Example
///
/// Passing context explicitly:
///
/// ```
/// # use minimustache::render;
/// println!("{}", render!("Hello {{name}}!", name => "World"));
/// ```
///
/// Passing variables with the default name:
///
/// ```
/// # use minimustache::render;
/// let name = "World";
/// println!("{}", render!("Hello {{name}}!", name));
/// ```
///
/// Passing an explicit repository:
///
/// ```
/// # use minimustache::{TemplateRepository, render};
/// let repo = TemplateRepository::new();
/// println!("{}", render!(in repo, "Hello {{name}}!", name => "World"));
/// ```
///
/// # Panics
///
/// This macro panics if the format string is an invalid template or the
/// template evaluation failed.
#[macro_export]
macro_rules! render {
    (
        in $repo:expr,
        $tmpl:expr
        $(, $key:ident $(=> $value:expr)?)* $(,)?
    ) => {
        ($repo).render_str($tmpl, $crate::context! { $($key $(=> $value)? ,)* })
            .expect("failed to render template")
    };
    (
        $tmpl:expr
        $(, $key:ident $(=> $value:expr)?)* $(,)?
    ) => {
        $crate::render!(in $crate::TemplateRepository::new(), $tmpl, $($key $(=> $value)? ,)*)
    }
}
