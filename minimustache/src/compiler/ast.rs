use std::fmt;
use std::ops::Deref;

use crate::compiler::tokens::Span;
use crate::utils::ContentType;

/// Container for nodes with location info.
///
/// This container fulfills two purposes: it adds location information
/// to nodes, but it also ensures the nodes is heap allocated.  The
/// latter is useful to ensure that enum variants do not cause the enum
/// to become too large.
pub struct Spanned<T> {
    inner: Box<(T, Span)>,
}

impl<T> Spanned<T> {
    /// Creates a new spanned node.
    pub fn new(node: T, span: Span) -> Spanned<T> {
        Spanned {
            inner: Box::new((node, span)),
        }
    }

    /// Accesses the span.
    pub fn span(&self) -> Span {
        self.inner.1
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner.0
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.0 == other.inner.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ok!(fmt::Debug::fmt(&self.inner.0, f));
        write!(f, "{:?}", self.inner.1)
    }
}

/// Root template node.
///
/// `content_type` is only set when the template carried a content type
/// pragma.  Otherwise the repository configuration decides.
#[derive(Debug)]
pub struct Template<'a> {
    pub children: Vec<Tag<'a>>,
    pub content_type: Option<ContentType>,
}

/// A tag node of the template tree.
pub enum Tag<'a> {
    EmitRaw(Spanned<EmitRaw<'a>>),
    Variable(Spanned<Variable<'a>>),
    Section(Spanned<Section<'a>>),
    Partial(Spanned<Partial<'a>>),
}

impl fmt::Debug for Tag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::EmitRaw(t) => fmt::Debug::fmt(t, f),
            Tag::Variable(t) => fmt::Debug::fmt(t, f),
            Tag::Section(t) => fmt::Debug::fmt(t, f),
            Tag::Partial(t) => fmt::Debug::fmt(t, f),
        }
    }
}

impl Tag<'_> {
    pub fn span(&self) -> Span {
        match self {
            Tag::EmitRaw(t) => t.span(),
            Tag::Variable(t) => t.span(),
            Tag::Section(t) => t.span(),
            Tag::Partial(t) => t.span(),
        }
    }
}

/// An expression node.
pub enum Expr<'a> {
    ImplicitIterator(Spanned<ImplicitIterator>),
    Var(Spanned<Var<'a>>),
    GetAttr(Spanned<GetAttr<'a>>),
    Filter(Spanned<Filter<'a>>),
}

impl fmt::Debug for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::ImplicitIterator(s) => fmt::Debug::fmt(s, f),
            Expr::Var(s) => fmt::Debug::fmt(s, f),
            Expr::GetAttr(s) => fmt::Debug::fmt(s, f),
            Expr::Filter(s) => fmt::Debug::fmt(s, f),
        }
    }
}

/// Two expressions are equal when they resolve the same way.  Spans and
/// the partial application marker do not take part in the comparison, so
/// a section opened with `{{#f(x)}}` can be closed with `{{/f(x)}}` no
/// matter how the tags were spelled.
impl PartialEq for Expr<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::ImplicitIterator(_), Expr::ImplicitIterator(_)) => true,
            (Expr::Var(a), Expr::Var(b)) => a == b,
            (Expr::GetAttr(a), Expr::GetAttr(b)) => a == b,
            (Expr::Filter(a), Expr::Filter(b)) => a == b,
            _ => false,
        }
    }
}

/// Outputs raw template code.
#[derive(Debug)]
pub struct EmitRaw<'a> {
    pub raw: &'a str,
}

/// Renders an expression into the output.
#[derive(Debug)]
pub struct Variable<'a> {
    pub expr: Expr<'a>,
    pub escape: bool,
}

/// A regular or inverted section.
///
/// `inner` holds the raw source between the opening and the closing tag
/// so that renderable values can inspect the literal inner template.
#[derive(Debug)]
pub struct Section<'a> {
    pub expr: Expr<'a>,
    pub inverted: bool,
    pub body: Vec<Tag<'a>>,
    pub inner: &'a str,
}

/// Splices another template into the output.
#[derive(Debug)]
pub struct Partial<'a> {
    pub name: &'a str,
}

/// The implicit iterator (a single dot).
#[derive(Debug, PartialEq)]
pub struct ImplicitIterator;

/// Looks up a variable.
#[derive(Debug, PartialEq)]
pub struct Var<'a> {
    pub id: &'a str,
}

/// An attribute lookup expression.
#[derive(Debug, PartialEq)]
pub struct GetAttr<'a> {
    pub expr: Expr<'a>,
    pub name: &'a str,
}

/// A filter application.
///
/// Multi argument calls are stored curried: `f(x, y)` and `f(x)(y)` both
/// become `Filter(Filter(f, x), y)`.  Every inner application carries
/// `partial_application` so the evaluator can demand that it produces
/// another filter.
#[derive(Debug)]
pub struct Filter<'a> {
    pub filter: Expr<'a>,
    pub arg: Expr<'a>,
    pub partial_application: bool,
}

impl PartialEq for Filter<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.filter == other.filter && self.arg == other.arg
    }
}
