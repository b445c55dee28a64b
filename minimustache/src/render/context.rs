use std::fmt;

use crate::configuration::Configuration;
use crate::value::Value;

/// The stack of context frames identifier resolution walks top-down.
///
/// Section tags push the value they render under and pop it afterwards.
/// The bottom frame is the root context the render was called with.
/// Lookups that fall through every frame consult the configuration's
/// base context last.
pub(crate) struct Context {
    stack: Vec<Value>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stack.iter()).finish()
    }
}

impl Context {
    /// Creates a context with a root frame.
    pub fn new(root: Value) -> Context {
        Context { stack: vec![root] }
    }

    /// Looks up an identifier in the context.
    pub fn load(&self, config: &Configuration, key: &str) -> Option<Value> {
        for frame in self.stack.iter().rev() {
            // scalar frames resolve nothing and fall through
            let rv = frame.get_attr(key);
            if !rv.is_undefined() {
                return Some(rv);
            }
        }
        config.get_base(key)
    }

    /// Returns the topmost frame.
    pub fn top(&self) -> Option<&Value> {
        self.stack.last()
    }

    /// Pushes a new frame.
    pub fn push_frame(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pops the topmost frame.
    pub fn pop_frame(&mut self) {
        self.stack.pop();
    }

    /// Captures the stack for debug rendering, innermost frame last.
    #[cfg(feature = "debug")]
    pub fn freeze(&self) -> Value {
        Value::from(self.stack.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_load_walks_top_down() {
        let config = Configuration::empty();
        let mut ctx = Context::new(crate::context! { a => 1, b => 2 });
        ctx.push_frame(crate::context! { a => 3 });

        assert_eq!(ctx.load(&config, "a"), Some(Value::from(3)));
        assert_eq!(ctx.load(&config, "b"), Some(Value::from(2)));
        assert_eq!(ctx.load(&config, "c"), None);

        // scalar frames are transparent
        ctx.push_frame(Value::from("scalar"));
        assert_eq!(ctx.load(&config, "a"), Some(Value::from(3)));
    }

    #[test]
    fn test_load_falls_back_to_base_context() {
        let mut config = Configuration::empty();
        config.extend_base_context("greeting", Value::from("Hello"));
        let ctx = Context::new(crate::context! { name => "World" });

        assert_eq!(ctx.load(&config, "greeting"), Some(Value::from("Hello")));
        assert_eq!(ctx.load(&config, "name"), Some(Value::from("World")));
    }

    #[test]
    fn test_explicit_none_shadows() {
        let config = Configuration::empty();
        let mut ctx = Context::new(crate::context! { a => "outer" });
        ctx.push_frame(crate::context! { a => () });

        // an explicit none stops the walk rather than falling through
        assert_eq!(ctx.load(&config, "a"), Some(Value::from(())));
    }
}
