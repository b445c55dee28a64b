use crate::value::ValueMap;

#[cfg(feature = "builtins")]
pub(crate) fn builtin_base_context() -> ValueMap {
    use crate::filters;
    use crate::value::Value;

    let mut rv = ValueMap::new();
    rv.insert("safe".into(), Value::from_filter(filters::safe));
    rv.insert("escape".into(), Value::from_filter(filters::escape));
    rv.insert("uppercase".into(), Value::from_filter(filters::uppercase));
    rv.insert("lowercase".into(), Value::from_filter(filters::lowercase));
    rv.insert(
        "capitalized".into(),
        Value::from_filter(filters::capitalized),
    );
    rv.insert("count".into(), Value::from_filter(filters::count));
    rv.insert("reversed".into(), Value::from_filter(filters::reversed));
    rv
}

#[cfg(not(feature = "builtins"))]
pub(crate) fn builtin_base_context() -> ValueMap {
    ValueMap::default()
}
