use std::fmt;

use crate::value::Value;

/// A utility trait that represents a dynamic object.
///
/// The engine uses this trait to resolve attributes during dotted-path
/// lookup and when an object sits on top of the context stack.  Unlike
/// going through serde with [`Value::from_serialize`](crate::Value::from_serialize)
/// no copy of the data is made up front; attributes are produced on
/// demand.
///
/// Objects are always truthy for section tags and render through their
/// [`Display`](std::fmt::Display) implementation when used by a variable
/// tag.
///
/// ```
/// # use minimustache::value::{Value, Object};
/// use std::fmt;
///
/// #[derive(Debug)]
/// struct Point(f32, f32);
///
/// impl fmt::Display for Point {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "({}, {})", self.0, self.1)
///     }
/// }
///
/// impl Object for Point {
///     fn get_attr(&self, name: &str) -> Option<Value> {
///         match name {
///             "x" => Some(Value::from(self.0)),
///             "y" => Some(Value::from(self.1)),
///             _ => None,
///         }
///     }
/// }
///
/// let value = Value::from_object(Point(1.0, 2.5));
/// assert_eq!(value.get_attr("x"), Value::from(1.0));
/// ```
pub trait Object: fmt::Display + fmt::Debug + Sync + Send {
    /// Invoked by the engine to get the attribute of an object.
    ///
    /// If an attribute does not exist, `None` shall be returned, in which
    /// case lookup falls back to the undefined value.  The default
    /// implementation returns `None` for all attributes.
    fn get_attr(&self, name: &str) -> Option<Value> {
        let _name = name;
        None
    }
}
