use std::fmt;

use minimustache::value::{Object, Value, ValueKind};
use minimustache::{context, TemplateRepository};

use serde::Serialize;
use similar_asserts::assert_eq;

#[test]
fn test_conversions() {
    assert_eq!(Value::from(42).kind(), ValueKind::Number);
    assert_eq!(Value::from("x").kind(), ValueKind::String);
    assert_eq!(Value::from(()).kind(), ValueKind::None);
    assert_eq!(Value::from(true).kind(), ValueKind::Bool);
    assert_eq!(Value::from(vec![1, 2]).kind(), ValueKind::Seq);
    assert_eq!(Value::from_iter([("a", 1)]).kind(), ValueKind::Map);
    assert_eq!(Value::UNDEFINED.kind(), ValueKind::Undefined);

    let seq: Value = (1..4).collect();
    assert_eq!(seq.len(), Some(3));
}

#[test]
fn test_serialized_structs() {
    #[derive(Serialize)]
    struct Cat {
        name: String,
        lives: u32,
    }

    let repo = TemplateRepository::new();
    let rv = repo
        .render_str(
            "{{cat.name}} has {{cat.lives}} lives",
            context! { cat => Cat { name: "Melba".into(), lives: 9 } },
        )
        .unwrap();
    assert_eq!(rv, "Melba has 9 lives");
}

#[test]
fn test_serde_json_contexts() {
    let ctx = Value::from_serialize(serde_json::json!({
        "users": [{"name": "Tom"}, {"name": "Jerry"}],
    }));
    let repo = TemplateRepository::new();
    let rv = repo
        .render_str("{{#users}}{{name}};{{/users}}", ctx)
        .unwrap();
    assert_eq!(rv, "Tom;Jerry;");
}

#[test]
fn test_dynamic_objects() {
    #[derive(Debug)]
    struct User {
        name: String,
    }

    impl fmt::Display for User {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.name)
        }
    }

    impl Object for User {
        fn get_attr(&self, name: &str) -> Option<Value> {
            match name {
                "name" => Some(Value::from(self.name.as_str())),
                "shouted" => Some(Value::from(self.name.to_uppercase())),
                _ => None,
            }
        }
    }

    let ctx = context! {
        user => Value::from_object(User { name: "Arthur".into() }),
    };
    let repo = TemplateRepository::new();
    assert_eq!(
        repo.render_str("Hello {{user.name}}!", ctx.clone()).unwrap(),
        "Hello Arthur!"
    );
    assert_eq!(
        repo.render_str("{{user.shouted}}", ctx.clone()).unwrap(),
        "ARTHUR"
    );
    // objects are truthy sections and display as variables
    assert_eq!(
        repo.render_str("{{#user}}{{.}}{{/user}}", ctx).unwrap(),
        "Arthur"
    );
}

#[test]
fn test_values_roundtrip_through_context() {
    let filter = Value::from_filter(|value: &Value| {
        Ok(Value::from(value.to_string().to_uppercase()))
    });
    let ctx = context! { upper => filter, name => "tom" };
    assert_eq!(ctx.get_attr("upper").kind(), ValueKind::Filter);

    let repo = TemplateRepository::new();
    assert_eq!(repo.render_str("{{upper(name)}}", ctx).unwrap(), "TOM");
}

#[test]
fn test_maps_render_empty() {
    let repo = TemplateRepository::new();
    assert_eq!(
        repo.render_str("[{{user}}]", context! { user => context! { name => "x" } })
            .unwrap(),
        "[]"
    );
}

#[test]
fn test_undefined_and_none_render_empty() {
    assert_eq!(Value::UNDEFINED.to_string(), "");
    assert_eq!(Value::from(()).to_string(), "");
}

#[test]
fn test_float_formatting() {
    let repo = TemplateRepository::new();
    assert_eq!(
        repo.render_str("{{a}} {{b}}", context! { a => 10000.0, b => 2.5 })
            .unwrap(),
        "10000.0 2.5"
    );
}
