use minimustache::value::Value;
use minimustache::{context, render, TemplateRepository};

use similar_asserts::assert_eq;

#[test]
fn test_context() {
    let ctx = context! {
        name => "Peter",
        location => "World",
    };
    assert_eq!(ctx.get_attr("name").as_str(), Some("Peter"));
    assert_eq!(ctx.get_attr("location").as_str(), Some("World"));

    let empty = context! {};
    assert!(empty.get_attr("anything").is_undefined());
}

#[test]
fn test_context_shorthand() {
    let name = "Peter";
    let ctx = context! { name };
    assert_eq!(ctx.get_attr("name").as_str(), Some("Peter"));
}

#[test]
fn test_context_nested() {
    let ctx = context! {
        user => context! { name => "Peter" },
        page => "Index",
    };
    assert_eq!(
        ctx.get_attr("user").get_attr("name").as_str(),
        Some("Peter")
    );
}

#[test]
fn test_render_macro() {
    insta::assert_snapshot!(
        render!("Hello {{name}}!", name => "World"),
        @"Hello World!"
    );

    let name = "World";
    assert_eq!(render!("Hello {{name}}!", name), "Hello World!");
    assert_eq!(render!("no tags"), "no tags");
}

#[test]
fn test_render_macro_with_repository() {
    let mut repo = TemplateRepository::new();
    repo.configuration_mut().unwrap().add_filter("twice", |v: &Value| {
        let s = v.to_string();
        Ok(Value::from(format!("{s}{s}")))
    });
    assert_eq!(
        render!(in repo, "{{twice(word)}}", word => "ho"),
        "hoho"
    );
}
