use std::io;

use minimustache::value::Value;
use minimustache::{
    context, Configuration, ContentType, ErrorKind, Rendering, State, TemplateRepository,
};

use similar_asserts::assert_eq;

fn render(source: &str, ctx: Value) -> String {
    TemplateRepository::new().render_str(source, ctx).unwrap()
}

#[test]
fn test_variable_escaping() {
    assert_eq!(
        render("Hello {{name}}!", context! { name => "Tom & <Jerry>" }),
        "Hello Tom &amp; &lt;Jerry&gt;!"
    );
    assert_eq!(
        render("{{quote}}", context! { quote => r#"she said "hi""# }),
        "she said &quot;hi&quot;"
    );
    // single quotes are not touched
    assert_eq!(
        render("{{x}}", context! { x => "it's" }),
        "it's"
    );
}

#[test]
fn test_unescaped_variables() {
    let ctx = context! { snippet => "<em>hi</em>" };
    assert_eq!(render("{{{snippet}}}", ctx.clone()), "<em>hi</em>");
    assert_eq!(render("{{&snippet}}", ctx.clone()), "<em>hi</em>");
    assert_eq!(render("{{snippet}}", ctx), "&lt;em&gt;hi&lt;/em&gt;");
}

#[test]
fn test_safe_strings_bypass_escaping() {
    let ctx = context! { snippet => Value::from_safe_string("<em>hi</em>".into()) };
    assert_eq!(render("{{snippet}}", ctx), "<em>hi</em>");
}

#[test]
fn test_missing_values_render_empty() {
    assert_eq!(render("[{{missing}}]", context! {}), "[]");
    assert_eq!(
        render("[{{a.b.c}}]", context! { a => context! { x => 1 } }),
        "[]"
    );
}

#[test]
fn test_scalar_rendering() {
    assert_eq!(
        render(
            "{{int}} {{float}} {{yes}} {{no}}",
            context! { int => 42, float => 10000.0, yes => true, no => false }
        ),
        "42 10000.0 true false"
    );
}

#[test]
fn test_sections_iterate_sequences() {
    let ctx = context! {
        users => vec![
            context! { name => "Tom" },
            context! { name => "Jerry" },
        ],
    };
    assert_eq!(
        render("{{#users}}<li>{{name}}</li>{{/users}}", ctx),
        "<li>Tom</li><li>Jerry</li>"
    );
}

#[test]
fn test_sections_push_truthy_values() {
    let ctx = context! { person => context! { name => "Arthur" } };
    assert_eq!(render("{{#person}}{{name}}{{/person}}", ctx), "Arthur");

    // a scalar frame is pushed too and reachable as the implicit iterator
    let ctx = context! { name => "x" };
    assert_eq!(render("{{#name}}<{{.}}>{{/name}}", ctx), "<x>");
}

#[test]
fn test_sections_skip_falsy_values() {
    for ctx in [
        context! {},
        context! { x => false },
        context! { x => 0 },
        context! { x => "" },
        context! { x => Vec::<i32>::new() },
        context! { x => () },
    ] {
        assert_eq!(render("[{{#x}}y{{/x}}]", ctx), "[]");
    }
}

#[test]
fn test_inverted_sections() {
    assert_eq!(
        render(
            "{{#items}}{{.}}{{/items}}{{^items}}none{{/items}}",
            context! { items => Vec::<i32>::new() }
        ),
        "none"
    );
    assert_eq!(
        render(
            "{{#items}}{{.}}{{/items}}{{^items}}none{{/items}}",
            context! { items => vec![1, 2] }
        ),
        "12"
    );
    // the inverted body renders in the current context, nothing is pushed
    assert_eq!(
        render("{{^missing}}{{name}}{{/missing}}", context! { name => "n" }),
        "n"
    );
}

#[test]
fn test_implicit_iterator() {
    assert_eq!(
        render(
            "{{#names}}{{.}} {{/names}}",
            context! { names => vec!["Kitty", "Pussy", "Melba"] }
        ),
        "Kitty Pussy Melba "
    );
}

#[test]
fn test_dotted_paths() {
    let ctx = context! {
        person => context! {
            address => context! { city => "Vienna" },
        },
    };
    assert_eq!(render("{{person.address.city}}", ctx), "Vienna");
}

#[test]
fn test_dot_prefix_stays_on_top_frame() {
    let ctx = context! {
        b => "root",
        user => context! { a => "inner" },
    };
    // the plain key walks down the stack, the dotted form does not
    assert_eq!(render("{{#user}}[{{b}}]{{/user}}", ctx.clone()), "[root]");
    assert_eq!(render("{{#user}}[{{.b}}]{{/user}}", ctx.clone()), "[]");
    assert_eq!(render("{{#user}}[{{.a}}]{{/user}}", ctx), "[inner]");
}

#[test]
fn test_sequence_attributes() {
    let ctx = context! { items => vec!["a", "b", "c"] };
    assert_eq!(
        render("{{items.count}} {{items.first}} {{items.last}}", ctx),
        "3 a c"
    );
}

#[test]
fn test_standalone_lines() {
    let tmpl = "Begin.\n{{#section}}\nMiddle.\n{{/section}}\nEnd.\n";
    assert_eq!(
        render(tmpl, context! { section => true }),
        "Begin.\nMiddle.\nEnd.\n"
    );
    assert_eq!(render(tmpl, context! {}), "Begin.\nEnd.\n");

    // variable tags keep their line
    assert_eq!(
        render("a\n  {{x}}\nb", context! { x => "v" }),
        "a\n  v\nb"
    );
}

#[test]
fn test_comments() {
    assert_eq!(
        render("Hello{{! ignore me }} World", context! {}),
        "Hello World"
    );
    assert_eq!(
        render("a\n{{! a standalone comment vanishes }}\nb", context! {}),
        "a\nb"
    );
}

#[test]
fn test_set_delimiters() {
    assert_eq!(
        render(
            "{{=<% %>=}}<%name%> lives between literal {{mustaches}}",
            context! { name => "Tom" }
        ),
        "Tom lives between literal {{mustaches}}"
    );
    // the ampersand form keeps working under custom delimiters
    assert_eq!(
        render("{{=<% %>=}}<%&x%>", context! { x => "<b>" }),
        "<b>"
    );
}

#[test]
fn test_empty_close_tag() {
    assert_eq!(
        render(
            "{{#a}}{{#b}}deep{{/}}{{/}}",
            context! { a => true, b => true }
        ),
        "deep"
    );
}

#[test]
fn test_pragma_beats_configuration() {
    let repo = TemplateRepository::new();
    assert_eq!(
        repo.render_str("{{%CONTENT_TYPE:TEXT}}{{x}}", context! { x => "<b>" })
            .unwrap(),
        "<b>"
    );

    let mut config = Configuration::new();
    config.set_content_type(ContentType::Text);
    let repo = TemplateRepository::with_configuration(config);
    assert_eq!(
        repo.render_str("{{x}}", context! { x => "<b>" }).unwrap(),
        "<b>"
    );
    assert_eq!(
        repo.render_str("{{%CONTENT_TYPE:HTML}}{{x}}", context! { x => "<b>" })
            .unwrap(),
        "&lt;b&gt;"
    );
}

#[test]
fn test_template_content_type() {
    let mut repo = TemplateRepository::new();
    repo.add_template("html", "{{x}}").unwrap();
    repo.add_template("text", "{{%CONTENT_TYPE:TEXT}}{{x}}")
        .unwrap();
    assert_eq!(
        repo.get_template("html").unwrap().content_type(),
        ContentType::Html
    );
    assert_eq!(
        repo.get_template("text").unwrap().content_type(),
        ContentType::Text
    );
}

#[test]
fn test_misplaced_pragma() {
    let repo = TemplateRepository::new();
    let err = repo
        .render_str("{{x}}{{%CONTENT_TYPE:TEXT}}", context! { x => 1 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MisplacedPragma);

    // a second pragma does not override the first
    let err = repo
        .render_str(
            "{{%CONTENT_TYPE:TEXT}}{{%CONTENT_TYPE:HTML}}{{x}}",
            context! { x => "<b>" },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MisplacedPragma);

    // comments and set delimiter tags may come first
    assert_eq!(
        repo.render_str(
            "{{! note }}{{=<% %>=}}<%%CONTENT_TYPE:TEXT%><%x%>",
            context! { x => "<b>" }
        )
        .unwrap(),
        "<b>"
    );
}

#[test]
fn test_renderable_section_html() {
    let ctx = context! {
        name => "<Tom>",
        bold => Value::from_renderable(|state: &mut State| {
            let inner = state.render_inner()?;
            Ok(Rendering::html(format!("<b>{}</b>", inner.into_string())))
        }),
    };
    // the inner template escapes once, the html rendering splices verbatim
    assert_eq!(
        render("{{#bold}}{{name}}{{/bold}}", ctx),
        "<b>&lt;Tom&gt;</b>"
    );
}

#[test]
fn test_renderable_text_escapes_on_splice() {
    let ctx = context! {
        amp => Value::from_renderable(|_: &mut State| Ok(Rendering::text("a & b"))),
    };
    assert_eq!(render("{{amp}}", ctx.clone()), "a &amp; b");
    assert_eq!(render("{{&amp}}", ctx.clone()), "a & b");
    assert_eq!(render("{{%CONTENT_TYPE:TEXT}}{{amp}}", ctx), "a & b");
}

#[test]
fn test_renderable_sees_tag() {
    let ctx = context! {
        probe => Value::from_renderable(|state: &mut State| {
            Ok(Rendering::text(format!(
                "{}:{}",
                state.tag_kind(),
                state.inner_template()
            )))
        }),
    };
    assert_eq!(
        render("{{probe}}|{{#probe}}{{x}} and text{{/probe}}", ctx),
        "variable:|section:{{x}} and text"
    );
}

#[test]
fn test_renderable_pluralize() {
    let pluralize = Value::from_renderable(|state: &mut State| {
        let mut inner = state.render_inner()?.into_string();
        let count = state.lookup("count").and_then(|v| v.as_i64()).unwrap_or(0);
        if count != 1 {
            inner.push('s');
        }
        Ok(Rendering::new(inner, state.content_type()))
    });
    let tmpl = "{{count}} {{#pluralize}}{{item}}{{/pluralize}}";
    assert_eq!(
        render(
            tmpl,
            context! { count => 2, item => "cat", pluralize => pluralize.clone() }
        ),
        "2 cats"
    );
    assert_eq!(
        render(tmpl, context! { count => 1, item => "cat", pluralize }),
        "1 cat"
    );
}

#[test]
fn test_filter_returning_renderable() {
    let pluralize = Value::from_filter(|count: &Value| {
        let n = count.as_i64().unwrap_or(0);
        Ok(Value::from_renderable(move |state: &mut State| {
            let mut inner = state.render_inner()?.into_string();
            if n != 1 {
                inner.push('s');
            }
            Ok(Rendering::new(inner, state.content_type()))
        }))
    });
    let ctx = context! {
        pluralize,
        cats => vec!["Kitty", "Pussy", "Melba"],
    };
    assert_eq!(
        render("{{cats.count}} {{#pluralize(cats.count)}}cat{{/}}", ctx),
        "3 cats"
    );
}

#[test]
fn test_renderable_render_named() {
    let mut repo = TemplateRepository::new();
    repo.add_template("snippet", "<b>{{name}}</b>").unwrap();
    repo.add_template("main", "{{insert}}").unwrap();
    let ctx = context! {
        name => "Tom",
        insert => Value::from_renderable(|state: &mut State| state.render_named("snippet")),
    };
    // the named template reports its own content type, so no re-escaping
    assert_eq!(
        repo.get_template("main").unwrap().render(ctx).unwrap(),
        "<b>Tom</b>"
    );
}

#[test]
fn test_renderables_are_truthy_in_inverted_sections() {
    let ctx = context! {
        noisy => Value::from_renderable(|_: &mut State| {
            panic!("must not be invoked by an inverted section");
        }),
    };
    assert_eq!(render("[{{^noisy}}x{{/noisy}}]", ctx), "[]");
}

#[test]
fn test_winnings_letter() {
    let tmpl = "\
{{%CONTENT_TYPE:TEXT}}
Hello {{name}},
You have just won {{value}} dollars!
{{#in_ca}}
Well, {{taxed_value}} dollars, after taxes.
{{/in_ca}}";
    let value = 10000.0_f64;
    let ctx = context! {
        name => "Chris",
        value => 10000,
        taxed_value => value - value * 0.4,
        in_ca => true,
    };
    assert_eq!(
        render(tmpl, ctx),
        "Hello Chris,\nYou have just won 10000 dollars!\nWell, 6000.0 dollars, after taxes.\n"
    );
}

#[test]
fn test_tag_mismatch() {
    let mut repo = TemplateRepository::new();
    let err = repo.add_template("bad", "{{#a}}x{{/b}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TagMismatch);
    let err = repo.add_template("bad", "x{{/a}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TagMismatch);
    let err = repo.add_template("bad", "{{#a}}x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
}

#[test]
fn test_error_location() {
    let mut repo = TemplateRepository::new();
    let err = repo
        .add_template("layout.mustache", "fine\n{{bad expression}}")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    assert_eq!(err.name(), Some("layout.mustache"));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_render_to_write() {
    let mut repo = TemplateRepository::new();
    repo.add_template("hello", "Hello {{name}}!").unwrap();
    let tmpl = repo.get_template("hello").unwrap();

    let mut buf = Vec::new();
    tmpl.render_to_write(context! { name => "World" }, &mut buf)
        .unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "Hello World!");
}

#[test]
fn test_render_to_write_failure() {
    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut repo = TemplateRepository::new();
    repo.add_template("hello", "Hello {{name}}!").unwrap();
    let tmpl = repo.get_template("hello").unwrap();
    let err = tmpl
        .render_to_write(context! { name => "World" }, FailingWriter)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WriteFailure);
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_rendering_is_idempotent() {
    let mut repo = TemplateRepository::new();
    repo.add_template("list", "{{#items}}<li>{{.}}</li>{{/items}}")
        .unwrap();
    let tmpl = repo.get_template("list").unwrap();
    let ctx = context! { items => vec!["a", "b"] };
    let first = tmpl.render(ctx.clone()).unwrap();
    let second = tmpl.render(ctx).unwrap();
    assert_eq!(first, second);
    insta::assert_snapshot!(first, @"<li>a</li><li>b</li>");
}
