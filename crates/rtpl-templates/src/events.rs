use rtpl_source::Span;
use serde::Serialize;

/// Which kind of source a body belongs to. Layout bodies may declare
/// `@section` placeholders anywhere; other bodies only inside a `@layout` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Template,
    Tag,
    Layout,
}

/// One structural event emitted by the body parser.
///
/// `depth` is the nesting level: an opening event and its matching
/// `else`/`end` events share a depth, and everything between them sits one
/// level deeper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Event {
    pub depth: usize,
    pub span: Span,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub fn new(depth: usize, span: Span, kind: EventKind) -> Self {
        Self { depth, span, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    Text { text: String },
    Code { code: String },
    Statement { code: String },
    ConditionStart { condition: String },
    ConditionElseIf { condition: String },
    ConditionElse,
    ConditionEnd,
    LoopStart { header: String },
    LoopEnd,
    TagCall { name: String, args: String },
    LayoutCall { name: String, args: String },
    SectionStart { name: String },
    SectionEnd,
    LayoutEnd,
}
