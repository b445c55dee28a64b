//! Provides a dynamic value type abstraction.
//!
//! This module gives access to a dynamically typed value which is used by
//! the template engine during rendering.
//!
//! For the most part the existence of the value type can be ignored as
//! the engine will perform the necessary conversions for you.  Context
//! data is normally ingested via [`serde`] through the
//! [`context!`](crate::context) macro or [`Value::from_serialize`].  For
//! some more advanced use cases it's useful to know that this type exists.
//!
//! # Basic Value Conversions
//!
//! Values are typically created via the [`From`] trait:
//!
//! ```
//! # use minimustache::value::Value;
//! let int_value = Value::from(42);
//! let none_value = Value::from(());
//! let true_value = Value::from(true);
//! ```
//!
//! Or via the [`FromIterator`] trait:
//!
//! ```
//! # use minimustache::value::Value;
//! // collection into a sequence
//! let value: Value = (1..10).into_iter().collect();
//!
//! // collection into a map
//! let value: Value = [("key", "value")].into_iter().collect();
//! ```
//!
//! The special [`Undefined`](Value::UNDEFINED) value also exists but does not
//! have a rust equivalent.  It can be created via the [`UNDEFINED`](Value::UNDEFINED)
//! constant.  It's what an identifier resolves to when no frame of the
//! rendering context knows it, and it renders as the empty string.
//!
//! # Serde Conversions
//!
//! The engine creates values via an indirection via [`serde`] when a
//! template is rendered.  This can also be triggered manually by using the
//! [`Value::from_serialize`] method:
//!
//! ```
//! # use minimustache::value::Value;
//! let value = Value::from_serialize(&[1, 2, 3]);
//! ```
//!
//! # Memory Management
//!
//! Values are immutable objects which are internally reference counted which
//! means they can be copied relatively cheaply.  Special care must be taken
//! so that cycles are not created to avoid causing memory leaks.
//!
//! # HTML Escaping
//!
//! A value rendered by a variable tag of an HTML template is escaped.  To
//! prevent this behavior the [`Value::from_safe_string`] method can be used
//! to mark a string as already escaped, or the template can opt out of
//! escaping entirely with the `{{%CONTENT_TYPE:TEXT}}` pragma.
//!
//! # Filters and Renderables
//!
//! Two kinds of behavior can be attached to values.  A filter
//! ([`Value::from_filter`]) is a function a template applies with call
//! syntax (`{{uppercase(name)}}`).  A renderable ([`Value::from_renderable`])
//! takes over rendering of the tag that references it, which is how custom
//! section behavior such as pluralization is implemented.  See
//! [`State`](crate::State) for what a renderable can do.
//!
//! # Dynamic Objects
//!
//! Values can also hold "dynamic" objects.  These are objects which implement
//! the [`Object`] trait.  They expose named attributes to dotted-path lookup
//! without going through serde, which is useful for types that borrow or
//! that want lazy attribute resolution:
//!
//! ```rust
//! # use minimustache::value::{Value, Object};
//! use std::fmt;
//!
//! #[derive(Debug)]
//! struct User {
//!     name: String,
//! }
//!
//! impl fmt::Display for User {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "{}", self.name)
//!     }
//! }
//!
//! impl Object for User {
//!     fn get_attr(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "name" => Some(Value::from(self.name.as_str())),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let value = Value::from_object(User { name: "Arthur".into() });
//! ```
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, Serializer};

use crate::error::{Error, ErrorKind};
use crate::render::{Rendering, State};
use crate::utils::OnDrop;
use crate::value::serialize::transform;

pub use crate::value::object::Object;

mod object;
mod serialize;

// We use in-band signalling to roundtrip some internal values.  This is
// not ideal but unfortunately there is no better system in serde today.
const VALUE_HANDLE_MARKER: &str = "\x01__minimustache_ValueHandle";

#[cfg(feature = "preserve_order")]
pub(crate) type ValueMap = indexmap::IndexMap<String, Value>;

#[cfg(not(feature = "preserve_order"))]
pub(crate) type ValueMap = std::collections::BTreeMap<String, Value>;

#[inline(always)]
pub(crate) fn value_map_with_capacity(capacity: usize) -> ValueMap {
    #[cfg(not(feature = "preserve_order"))]
    {
        let _ = capacity;
        ValueMap::new()
    }
    #[cfg(feature = "preserve_order")]
    {
        ValueMap::with_capacity(crate::utils::untrusted_size_hint(capacity))
    }
}

thread_local! {
    static INTERNAL_SERIALIZATION: Cell<bool> = Cell::new(false);

    // This should be an AtomicU64 but sadly 32bit targets do not necessarily have
    // AtomicU64 available.
    static LAST_VALUE_HANDLE: Cell<u32> = Cell::new(0);
    static VALUE_HANDLES: RefCell<BTreeMap<u32, Value>> = RefCell::new(BTreeMap::new());
}

/// Function that returns true when serialization for [`Value`] is taking place.
///
/// The engine internally creates [`Value`] objects from all values passed
/// to it.  It does this by going through the regular serde serialization
/// trait.  In some cases users might want to customize the serialization
/// specifically for the template engine because they want to tune the
/// object for the engine independently of what is normally serialized to
/// disk.
///
/// This function returns `true` when the engine is serializing to [`Value`]
/// and `false` otherwise.  You can call this within your own [`Serialize`]
/// implementation to change the output format.
///
/// This is particularly useful as serialization for the engine does not
/// need to support deserialization.  So it becomes possible to completely
/// change what gets sent there, even at the cost of serializing something
/// that cannot be deserialized.
pub fn serializing_for_value() -> bool {
    INTERNAL_SERIALIZATION.with(|flag| flag.get())
}

fn mark_internal_serialization() -> impl Drop {
    let old = INTERNAL_SERIALIZATION.with(|flag| {
        let old = flag.get();
        flag.set(true);
        old
    });
    OnDrop::new(move || {
        if !old {
            INTERNAL_SERIALIZATION.with(|flag| flag.set(false));
        }
    })
}

/// Describes the kind of value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum ValueKind {
    /// The value is undefined
    Undefined,
    /// The value is the none singleton (`()`)
    None,
    /// The value is a [`bool`]
    Bool,
    /// The value is a number of a supported type.
    Number,
    /// The value is a string.
    String,
    /// The value is an array of other values.
    Seq,
    /// The value is a key/value mapping.
    Map,
    /// The value is a dynamic object.
    Object,
    /// The value is a filter function.
    Filter,
    /// The value renders itself.
    Renderable,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            ValueKind::Undefined => "undefined",
            ValueKind::None => "none",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "map",
            ValueKind::Object => "object",
            ValueKind::Filter => "filter",
            ValueKind::Renderable => "renderable",
        })
    }
}

/// The type of string
#[derive(Copy, Clone, Debug)]
pub(crate) enum StringType {
    Normal,
    Safe,
}

/// The type of a boxed filter function.
pub(crate) type FilterFunc = dyn Fn(&Value) -> Result<Value, Error> + Sync + Send;

/// The type of a boxed renderable function.
pub(crate) type RenderFunc =
    dyn Fn(&mut State<'_>) -> Result<Rendering, Error> + Sync + Send;

#[derive(Clone)]
pub(crate) enum ValueRepr {
    Undefined,
    Bool(bool),
    U64(u64),
    I64(i64),
    F64(f64),
    None,
    Invalid(Arc<str>),
    String(Arc<str>, StringType),
    Seq(Arc<Vec<Value>>),
    Map(Arc<ValueMap>),
    Object(Arc<dyn Object>),
    Filter(Arc<FilterFunc>),
    Renderable(Arc<RenderFunc>),
}

impl fmt::Debug for ValueRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRepr::Undefined => f.write_str("undefined"),
            ValueRepr::Bool(val) => fmt::Debug::fmt(val, f),
            ValueRepr::U64(val) => fmt::Debug::fmt(val, f),
            ValueRepr::I64(val) => fmt::Debug::fmt(val, f),
            ValueRepr::F64(val) => fmt::Debug::fmt(val, f),
            ValueRepr::None => f.write_str("none"),
            ValueRepr::Invalid(ref val) => write!(f, "<invalid value: {}>", val),
            ValueRepr::String(val, _) => fmt::Debug::fmt(val, f),
            ValueRepr::Seq(val) => fmt::Debug::fmt(val, f),
            ValueRepr::Map(val) => fmt::Debug::fmt(val, f),
            ValueRepr::Object(val) => fmt::Debug::fmt(val, f),
            ValueRepr::Filter(_) => f.write_str("<filter>"),
            ValueRepr::Renderable(_) => f.write_str("<renderable>"),
        }
    }
}

/// Represents a dynamically typed value in the template engine.
#[derive(Clone)]
pub struct Value(pub(crate) ValueRepr);

fn as_f64(value: &Value) -> Option<f64> {
    match value.0 {
        ValueRepr::Bool(x) => Some(x as u64 as f64),
        ValueRepr::U64(x) => Some(x as f64),
        ValueRepr::I64(x) => Some(x as f64),
        ValueRepr::F64(x) => Some(x),
        _ => None,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (ValueRepr::None, ValueRepr::None) => true,
            (ValueRepr::Undefined, ValueRepr::Undefined) => true,
            (ValueRepr::Bool(a), ValueRepr::Bool(b)) => a == b,
            (ValueRepr::String(ref a, _), ValueRepr::String(ref b, _)) => a == b,
            (ValueRepr::Seq(ref a), ValueRepr::Seq(ref b)) => a == b,
            (ValueRepr::Map(ref a), ValueRepr::Map(ref b)) => a == b,
            _ => match (as_f64(self), as_f64(other)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ValueRepr::Undefined | ValueRepr::None => Ok(()),
            ValueRepr::Bool(val) => val.fmt(f),
            ValueRepr::U64(val) => val.fmt(f),
            ValueRepr::I64(val) => val.fmt(f),
            ValueRepr::F64(val) => {
                if val.is_nan() {
                    f.write_str("NaN")
                } else if val.is_infinite() {
                    write!(f, "{}inf", if val.is_sign_negative() { "-" } else { "" })
                } else {
                    let mut num = val.to_string();
                    if !num.contains('.') {
                        num.push_str(".0");
                    }
                    write!(f, "{num}")
                }
            }
            ValueRepr::Invalid(ref val) => write!(f, "<invalid value: {}>", val),
            ValueRepr::String(val, _) => write!(f, "{val}"),
            ValueRepr::Seq(val) => {
                for item in val.iter() {
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            ValueRepr::Map(_)
            | ValueRepr::Filter(_)
            | ValueRepr::Renderable(_) => Ok(()),
            ValueRepr::Object(val) => write!(f, "{val}"),
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        ValueRepr::Undefined.into()
    }
}

#[allow(clippy::len_without_is_empty)]
impl Value {
    /// The undefined value.
    ///
    /// This constant exists because the undefined type does not exist in Rust
    /// and this is the only way to construct it.
    pub const UNDEFINED: Value = Value(ValueRepr::Undefined);

    /// Creates a value from something that can be serialized.
    ///
    /// This is the method that the engine will generally use whenever a
    /// serializable object is passed to one of the APIs that internally
    /// want to create a value.  For instance this is what
    /// [`context!`](crate::context) and
    /// [`render`](crate::Template::render) will use.
    ///
    /// During serialization of the value, [`serializing_for_value`] will return
    /// `true` which makes it possible to customize serialization for the
    /// engine.  For more information see [`serializing_for_value`].
    ///
    /// ```
    /// # use minimustache::value::Value;
    /// let val = Value::from_serialize(&vec![1, 2, 3]);
    /// ```
    ///
    /// This method does not fail but it might return a value that is not valid.
    /// Such values will fail when rendered with a
    /// [`BadSerialization`](crate::ErrorKind::BadSerialization) error.  This
    /// for instance can happen if the underlying implementation of
    /// [`Serialize`] fails.
    pub fn from_serialize<T: Serialize>(value: T) -> Value {
        let _serialization_guard = mark_internal_serialization();
        transform(value)
    }

    /// Creates a value from a safe string.
    ///
    /// A safe string is one that will bypass escaping.  For instance if you
    /// want to have the template engine render some HTML without it getting
    /// escaped a second time, you can use a value of this type instead.
    ///
    /// ```
    /// # use minimustache::value::Value;
    /// let val = Value::from_safe_string("<em>note</em>".into());
    /// ```
    pub fn from_safe_string(value: String) -> Value {
        ValueRepr::String(Arc::from(value), StringType::Safe).into()
    }

    /// Creates a value from a dynamic object.
    ///
    /// For more information see [`Object`].
    pub fn from_object<T: Object + 'static>(value: T) -> Value {
        Value(ValueRepr::Object(Arc::new(value)))
    }

    /// Creates a value holding a filter function.
    ///
    /// A filter takes a single value and produces a new one.  Templates
    /// apply filters with call syntax (`{{uppercase(name)}}`), and a call
    /// with several arguments is sugar for a chain of single-argument
    /// applications, so a two-argument filter is written as a filter that
    /// returns another filter.
    ///
    /// ```
    /// # use minimustache::value::Value;
    /// let uppercase = Value::from_filter(|value: &Value| {
    ///     Ok(Value::from(value.to_string().to_uppercase()))
    /// });
    /// ```
    pub fn from_filter<F>(f: F) -> Value
    where
        F: Fn(&Value) -> Result<Value, Error> + Sync + Send + 'static,
    {
        Value(ValueRepr::Filter(Arc::new(f)))
    }

    /// Creates a value that renders itself.
    ///
    /// When a variable or section tag resolves to a renderable value, the
    /// function is invoked with the rendering [`State`] and takes over
    /// producing the tag's output.  For section tags the state exposes the
    /// tag's inner template so the function can decide what to do with it.
    ///
    /// ```
    /// # use minimustache::value::Value;
    /// use minimustache::Rendering;
    ///
    /// let bold = Value::from_renderable(|state: &mut minimustache::State| {
    ///     let inner = state.render_inner()?;
    ///     Ok(Rendering::html(format!("<b>{}</b>", inner.into_string())))
    /// });
    /// ```
    pub fn from_renderable<F>(f: F) -> Value
    where
        F: Fn(&mut State<'_>) -> Result<Rendering, Error> + Sync + Send + 'static,
    {
        Value(ValueRepr::Renderable(Arc::new(f)))
    }

    /// Returns the kind of the value.
    ///
    /// This can be used to determine what's in the value before trying to
    /// perform operations on it.
    pub fn kind(&self) -> ValueKind {
        match self.0 {
            ValueRepr::Undefined => ValueKind::Undefined,
            ValueRepr::Bool(_) => ValueKind::Bool,
            ValueRepr::U64(_) | ValueRepr::I64(_) | ValueRepr::F64(_) => ValueKind::Number,
            ValueRepr::None => ValueKind::None,
            // invalid values report themselves as undefined so they stay
            // inert until rendering surfaces the error
            ValueRepr::Invalid(_) => ValueKind::Undefined,
            ValueRepr::String(..) => ValueKind::String,
            ValueRepr::Seq(_) => ValueKind::Seq,
            ValueRepr::Map(_) => ValueKind::Map,
            ValueRepr::Object(_) => ValueKind::Object,
            ValueRepr::Filter(_) => ValueKind::Filter,
            ValueRepr::Renderable(_) => ValueKind::Renderable,
        }
    }

    /// Is this value truthy?
    ///
    /// This is the test section tags apply: `false`, zero, empty strings,
    /// empty sequences, none and undefined are falsy.  Maps, objects,
    /// filters and renderables are always truthy.
    pub fn is_true(&self) -> bool {
        match self.0 {
            ValueRepr::Bool(val) => val,
            ValueRepr::U64(x) => x != 0,
            ValueRepr::I64(x) => x != 0,
            ValueRepr::F64(x) => x != 0.0,
            ValueRepr::String(ref x, _) => !x.is_empty(),
            ValueRepr::Seq(ref x) => !x.is_empty(),
            ValueRepr::None | ValueRepr::Undefined | ValueRepr::Invalid(_) => false,
            ValueRepr::Map(_)
            | ValueRepr::Object(_)
            | ValueRepr::Filter(_)
            | ValueRepr::Renderable(_) => true,
        }
    }

    /// Returns `true` if this value is safe.
    pub fn is_safe(&self) -> bool {
        matches!(&self.0, ValueRepr::String(_, StringType::Safe))
    }

    /// Returns `true` if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(&self.0, ValueRepr::Undefined)
    }

    /// Returns `true` if this value is none.
    pub fn is_none(&self) -> bool {
        matches!(&self.0, ValueRepr::None)
    }

    /// If the value is a string, return it.
    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            ValueRepr::String(ref s, _) => Some(s as &str),
            _ => None,
        }
    }

    /// If the value is a number, losslessly convert it into an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self.0 {
            ValueRepr::I64(x) => Some(x),
            ValueRepr::U64(x) => i64::try_from(x).ok(),
            ValueRepr::F64(x) => {
                if x as i64 as f64 == x {
                    Some(x as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// If the value is a sequence, return it as a slice.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self.0 {
            ValueRepr::Seq(ref items) => Some(items),
            _ => None,
        }
    }

    /// Returns the length of the contained value.
    ///
    /// Values without a length will return `None`.
    ///
    /// ```
    /// # use minimustache::value::Value;
    /// let seq = Value::from(vec![1, 2, 3, 4]);
    /// assert_eq!(seq.len(), Some(4));
    /// ```
    pub fn len(&self) -> Option<usize> {
        match self.0 {
            ValueRepr::String(ref s, _) => Some(s.chars().count()),
            ValueRepr::Seq(ref items) => Some(items.len()),
            ValueRepr::Map(ref map) => Some(map.len()),
            _ => None,
        }
    }

    /// Looks up an attribute by attribute name.
    ///
    /// This is the lookup dotted paths perform per path segment.  Maps
    /// resolve their keys and [`Object`]s their attributes.  Sequences
    /// expose `count`, `first` and `last`.  A missing attribute resolves
    /// to [`UNDEFINED`](Self::UNDEFINED), never an error.
    ///
    /// ```
    /// # use minimustache::value::Value;
    /// let ctx = minimustache::context! {
    ///     name => "Arthur"
    /// };
    /// assert_eq!(ctx.get_attr("name").to_string(), "Arthur");
    /// ```
    pub fn get_attr(&self, key: &str) -> Value {
        let value = match self.0 {
            ValueRepr::Map(ref map) => map.get(key).cloned(),
            ValueRepr::Object(ref obj) => obj.get_attr(key),
            ValueRepr::Seq(ref items) => match key {
                "count" => Some(Value::from(items.len())),
                "first" => items.first().cloned(),
                "last" => items.last().cloned(),
                _ => None,
            },
            _ => None,
        };

        value.unwrap_or(Value::UNDEFINED)
    }

    /// If the value holds a filter function, returns it.
    pub(crate) fn as_filter(&self) -> Option<&FilterFunc> {
        match self.0 {
            ValueRepr::Filter(ref f) => Some(&**f),
            _ => None,
        }
    }

    /// If the value holds a renderable function, returns it.
    pub(crate) fn as_renderable(&self) -> Option<&RenderFunc> {
        match self.0 {
            ValueRepr::Renderable(ref f) => Some(&**f),
            _ => None,
        }
    }

    /// Deferred serialization failures surface here, at first use.
    pub(crate) fn validate(self) -> Result<Value, Error> {
        if let ValueRepr::Invalid(ref detail) = self.0 {
            Err(Error::new(
                ErrorKind::BadSerialization,
                detail.to_string(),
            ))
        } else {
            Ok(self)
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // enable round tripping of values
        if serializing_for_value() {
            let handle = LAST_VALUE_HANDLE.with(|x| {
                // we are okay with overflowing the handle here because these values only
                // live for a very short period of time and it's not likely that you run out
                // of an entire u32 worth of handles in a single serialization operation.
                // This lets us stick the handle into a unit variant in the serde data model.
                let rv = x.get().wrapping_add(1);
                x.set(rv);
                rv
            });
            VALUE_HANDLES.with(|handles| handles.borrow_mut().insert(handle, self.clone()));
            return serializer.serialize_unit_variant(
                VALUE_HANDLE_MARKER,
                handle,
                VALUE_HANDLE_MARKER,
            );
        }

        match self.0 {
            ValueRepr::Bool(b) => serializer.serialize_bool(b),
            ValueRepr::U64(u) => serializer.serialize_u64(u),
            ValueRepr::I64(i) => serializer.serialize_i64(i),
            ValueRepr::F64(f) => serializer.serialize_f64(f),
            ValueRepr::None | ValueRepr::Undefined | ValueRepr::Invalid(_) => {
                serializer.serialize_unit()
            }
            ValueRepr::String(ref s, _) => serializer.serialize_str(s),
            ValueRepr::Seq(ref elements) => elements.serialize(serializer),
            ValueRepr::Map(ref entries) => {
                use serde::ser::SerializeMap;
                let mut map = ok!(serializer.serialize_map(Some(entries.len())));
                for (ref k, ref v) in entries.iter() {
                    ok!(map.serialize_entry(k, v));
                }
                map.end()
            }
            ValueRepr::Object(ref obj) => serializer.serialize_str(&obj.to_string()),
            ValueRepr::Filter(_) | ValueRepr::Renderable(_) => serializer.serialize_unit(),
        }
    }
}

impl From<ValueRepr> for Value {
    #[inline(always)]
    fn from(val: ValueRepr) -> Value {
        Value(val)
    }
}

impl<'a> From<&'a str> for Value {
    #[inline(always)]
    fn from(val: &'a str) -> Self {
        ValueRepr::String(Arc::from(val), StringType::Normal).into()
    }
}

impl From<String> for Value {
    #[inline(always)]
    fn from(val: String) -> Self {
        ValueRepr::String(Arc::from(val), StringType::Normal).into()
    }
}

impl<'a> From<std::borrow::Cow<'a, str>> for Value {
    #[inline(always)]
    fn from(val: std::borrow::Cow<'a, str>) -> Self {
        match val {
            std::borrow::Cow::Borrowed(x) => x.into(),
            std::borrow::Cow::Owned(x) => x.into(),
        }
    }
}

impl From<()> for Value {
    #[inline(always)]
    fn from(_: ()) -> Self {
        ValueRepr::None.into()
    }
}

impl From<char> for Value {
    #[inline(always)]
    fn from(val: char) -> Self {
        ValueRepr::String(Arc::from(val.to_string()), StringType::Normal).into()
    }
}

macro_rules! value_from {
    ($src:ty, $dst:ident) => {
        impl From<$src> for Value {
            #[inline(always)]
            fn from(val: $src) -> Self {
                ValueRepr::$dst(val as _).into()
            }
        }
    };
}

value_from!(bool, Bool);
value_from!(u8, U64);
value_from!(u16, U64);
value_from!(u32, U64);
value_from!(u64, U64);
value_from!(i8, I64);
value_from!(i16, I64);
value_from!(i32, I64);
value_from!(i64, I64);
value_from!(f32, F64);
value_from!(f64, F64);

impl From<usize> for Value {
    #[inline(always)]
    fn from(val: usize) -> Self {
        Value::from(val as u64)
    }
}

impl<V: Into<Value>> FromIterator<V> for Value {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let vec = iter.into_iter().map(|v| v.into()).collect();

        ValueRepr::Seq(Arc::new(vec)).into()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        ValueRepr::Map(Arc::new(map)).into()
    }
}

impl<K: Into<String>, V: Into<Value>> From<std::collections::BTreeMap<K, V>> for Value {
    fn from(val: std::collections::BTreeMap<K, V>) -> Self {
        val.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<std::collections::HashMap<K, V>> for Value {
    fn from(val: std::collections::HashMap<K, V>) -> Self {
        val.into_iter().collect()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(val: Vec<T>) -> Self {
        val.into_iter().collect()
    }
}

impl<T: Object + 'static> From<Arc<T>> for Value {
    fn from(object: Arc<T>) -> Self {
        Value(ValueRepr::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_display() {
        assert_eq!(Value::UNDEFINED.to_string(), "");
        assert_eq!(Value::from(()).to_string(), "");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from(10000.0).to_string(), "10000.0");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(
            Value::from(vec!["Kitty", "Pussy", "Melba"]).to_string(),
            "KittyPussyMelba"
        );
    }

    #[test]
    fn test_is_true() {
        assert!(!Value::UNDEFINED.is_true());
        assert!(!Value::from(()).is_true());
        assert!(!Value::from(false).is_true());
        assert!(!Value::from(0).is_true());
        assert!(!Value::from(0.0).is_true());
        assert!(!Value::from("").is_true());
        assert!(!Value::from(Vec::<Value>::new()).is_true());
        assert!(Value::from(1).is_true());
        assert!(Value::from("x").is_true());
        assert!(Value::from_iter([("a", 1)]).is_true());
        assert!(Value::from_filter(|v: &Value| Ok(v.clone())).is_true());
    }

    #[test]
    fn test_get_attr() {
        let map = Value::from_iter([("name", "Arthur")]);
        assert_eq!(map.get_attr("name").as_str(), Some("Arthur"));
        assert!(map.get_attr("missing").is_undefined());

        let seq = Value::from(vec!["Kitty", "Pussy", "Melba"]);
        assert_eq!(seq.get_attr("count"), Value::from(3));
        assert_eq!(seq.get_attr("first").as_str(), Some("Kitty"));
        assert_eq!(seq.get_attr("last").as_str(), Some("Melba"));
    }

    #[test]
    fn test_number_equality() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::from(1), Value::from(2));
        assert_ne!(Value::from("1"), Value::from(1));
    }

    #[test]
    fn test_value_handle_roundtrip() {
        let filter = Value::from_filter(|value: &Value| {
            Ok(Value::from(value.to_string().to_uppercase()))
        });
        let ctx = crate::context! { upper => filter };
        assert_eq!(ctx.get_attr("upper").kind(), ValueKind::Filter);
    }

    #[test]
    fn test_invalid_value_surfaces() {
        struct Broken;

        impl Serialize for Broken {
            fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("broken"))
            }
        }

        let value = Value::from_serialize(&Broken);
        let err = value.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadSerialization);
    }
}
