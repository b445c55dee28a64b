#![cfg(feature = "builtins")]

use minimustache::value::Value;
use minimustache::{context, Configuration, ErrorKind, TemplateRepository};

use similar_asserts::assert_eq;

fn render(source: &str, ctx: Value) -> String {
    TemplateRepository::new().render_str(source, ctx).unwrap()
}

#[test]
fn test_case_filters() {
    assert_eq!(
        render("{{uppercase(name)}}", context! { name => "gandalf" }),
        "GANDALF"
    );
    assert_eq!(
        render("{{lowercase(name)}}", context! { name => "GANDALF" }),
        "gandalf"
    );
    assert_eq!(
        render("{{capitalized(title)}}", context! { title => "the GREAT escape" }),
        "The Great Escape"
    );
}

#[test]
fn test_count() {
    assert_eq!(
        render("{{count(items)}}", context! { items => vec![1, 2, 3] }),
        "3"
    );
    assert_eq!(render("{{count(word)}}", context! { word => "héllo" }), "5");
    let err = TemplateRepository::new()
        .render_str("{{count(x)}}", context! { x => true })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FilterError);
}

#[test]
fn test_reversed() {
    assert_eq!(
        render(
            "{{#reversed(items)}}{{.}} {{/reversed(items)}}",
            context! { items => vec!["a", "b", "c"] }
        ),
        "c b a "
    );
    assert_eq!(render("{{reversed(word)}}", context! { word => "live" }), "evil");
    assert_eq!(
        render("{{reversed(items).first}}", context! { items => vec![1, 2, 3] }),
        "3"
    );
}

#[test]
fn test_safe_and_escape() {
    assert_eq!(
        render("{{safe(snippet)}}", context! { snippet => "<em>hi</em>" }),
        "<em>hi</em>"
    );
    // escape marks the result safe, so it does not escape twice
    assert_eq!(
        render("{{escape(snippet)}}", context! { snippet => "<b>" }),
        "&lt;b&gt;"
    );
    assert_eq!(
        render("{{%CONTENT_TYPE:TEXT}}{{escape(snippet)}}", context! { snippet => "<b>" }),
        "&lt;b&gt;"
    );
}

#[test]
fn test_filters_compose() {
    assert_eq!(
        render("{{uppercase(reversed(word))}}", context! { word => "live" }),
        "EVIL"
    );
}

#[test]
fn test_curried_filters() {
    let repeat = Value::from_filter(|count: &Value| {
        let n = count.as_i64().unwrap_or(0) as usize;
        Ok(Value::from_filter(move |value: &Value| {
            Ok(Value::from(value.to_string().repeat(n)))
        }))
    });
    let ctx = context! { repeat, n => 3, word => "na" };
    // f(x, y) and f(x)(y) are the same expression
    assert_eq!(render("{{repeat(n, word)}}", ctx.clone()), "nanana");
    assert_eq!(render("{{repeat(n)(word)}}", ctx), "nanana");
}

#[test]
fn test_unknown_filter() {
    let err = TemplateRepository::new()
        .render_str("{{sparkle(x)}}", context! { x => 1 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAFilter);
    assert_eq!(err.detail(), Some("filter sparkle is unknown"));
}

#[test]
fn test_not_a_filter() {
    let err = TemplateRepository::new()
        .render_str("{{name(x)}}", context! { name => "text", x => 1 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAFilter);
}

#[test]
fn test_too_many_arguments() {
    let err = TemplateRepository::new()
        .render_str("{{uppercase(a, b)}}", context! { a => "x", b => "y" })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooManyArguments);
}

#[test]
fn test_context_shadows_builtins() {
    let shouting = Value::from_filter(|value: &Value| {
        Ok(Value::from(format!("{}!!!", value.to_string().to_uppercase())))
    });
    assert_eq!(
        render(
            "{{uppercase(name)}}",
            context! { name => "odin", uppercase => shouting }
        ),
        "ODIN!!!"
    );
}

#[test]
fn test_filter_errors_carry_location() {
    let mut config = Configuration::new();
    config.add_filter("fail", |_: &Value| {
        Err(minimustache::Error::new(ErrorKind::FilterError, "nope"))
    });
    let repo = TemplateRepository::with_configuration(config);
    let err = repo
        .render_named_str("broken", "line\n{{fail(x)}}", context! { x => 1 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FilterError);
    assert_eq!(err.name(), Some("broken"));
    assert_eq!(err.line(), Some(2));
}
