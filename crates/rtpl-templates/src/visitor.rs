use rtpl_source::Span;
use serde::Serialize;

use crate::error::ParseError;
use crate::events::Event;
use crate::events::EventKind;

/// Consumer of the events produced by [`crate::Parser`].
///
/// Every method defaults to doing nothing, so a consumer only implements the
/// events it cares about. Returning an error stops the parse.
pub trait Visitor {
    type Error: From<ParseError>;

    fn visit_event(&mut self, event: &Event) -> Result<(), Self::Error> {
        walk_event(self, event)
    }

    fn visit_text(&mut self, _depth: usize, _text: &str, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_code(&mut self, _depth: usize, _code: &str, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_statement(
        &mut self,
        _depth: usize,
        _code: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_condition_start(
        &mut self,
        _depth: usize,
        _condition: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_condition_else_if(
        &mut self,
        _depth: usize,
        _condition: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_condition_else(&mut self, _depth: usize, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_condition_end(&mut self, _depth: usize, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_loop_start(
        &mut self,
        _depth: usize,
        _header: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_loop_end(&mut self, _depth: usize, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_tag_call(
        &mut self,
        _depth: usize,
        _name: &str,
        _args: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_layout_call(
        &mut self,
        _depth: usize,
        _name: &str,
        _args: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_section_start(
        &mut self,
        _depth: usize,
        _name: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_section_end(&mut self, _depth: usize, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_layout_end(&mut self, _depth: usize, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Dispatch a single event to the matching visitor method.
pub fn walk_event<V: Visitor + ?Sized>(visitor: &mut V, event: &Event) -> Result<(), V::Error> {
    let Event { depth, span, kind } = event;
    let (depth, span) = (*depth, *span);
    match kind {
        EventKind::Text { text } => visitor.visit_text(depth, text, span),
        EventKind::Code { code } => visitor.visit_code(depth, code, span),
        EventKind::Statement { code } => visitor.visit_statement(depth, code, span),
        EventKind::ConditionStart { condition } => {
            visitor.visit_condition_start(depth, condition, span)
        }
        EventKind::ConditionElseIf { condition } => {
            visitor.visit_condition_else_if(depth, condition, span)
        }
        EventKind::ConditionElse => visitor.visit_condition_else(depth, span),
        EventKind::ConditionEnd => visitor.visit_condition_end(depth, span),
        EventKind::LoopStart { header } => visitor.visit_loop_start(depth, header, span),
        EventKind::LoopEnd => visitor.visit_loop_end(depth, span),
        EventKind::TagCall { name, args } => visitor.visit_tag_call(depth, name, args, span),
        EventKind::LayoutCall { name, args } => visitor.visit_layout_call(depth, name, args, span),
        EventKind::SectionStart { name } => visitor.visit_section_start(depth, name, span),
        EventKind::SectionEnd => visitor.visit_section_end(depth, span),
        EventKind::LayoutEnd => visitor.visit_layout_end(depth, span),
    }
}

/// Records the event stream as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl Visitor for EventList {
    type Error = ParseError;

    fn visit_event(&mut self, event: &Event) -> Result<(), Self::Error> {
        self.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TemplateKind;
    use crate::parser::Parser;

    /// Counts calls and stops at the first tag call.
    #[derive(Default)]
    struct TagCounter {
        texts: usize,
        loops: usize,
    }

    #[derive(Debug, PartialEq)]
    enum CounterError {
        Parse(ParseError),
        TagCall(String),
    }

    impl From<ParseError> for CounterError {
        fn from(err: ParseError) -> Self {
            CounterError::Parse(err)
        }
    }

    impl Visitor for TagCounter {
        type Error = CounterError;

        fn visit_text(&mut self, _depth: usize, _text: &str, _span: Span) -> Result<(), Self::Error> {
            self.texts += 1;
            Ok(())
        }

        fn visit_loop_start(
            &mut self,
            _depth: usize,
            _header: &str,
            _span: Span,
        ) -> Result<(), Self::Error> {
            self.loops += 1;
            Ok(())
        }

        fn visit_tag_call(
            &mut self,
            _depth: usize,
            name: &str,
            _args: &str,
            _span: Span,
        ) -> Result<(), Self::Error> {
            Err(CounterError::TagCall(name.to_string()))
        }
    }

    #[test]
    fn test_dispatch_to_kind_methods() {
        let mut counter = TagCounter::default();
        Parser::new("a@for(x in y)b${x}@endfor", 0, TemplateKind::Template)
            .parse(&mut counter)
            .unwrap();
        assert_eq!(counter.texts, 2);
        assert_eq!(counter.loops, 1);
    }

    #[test]
    fn test_visitor_error_stops_parse() {
        let mut counter = TagCounter::default();
        let err = Parser::new("a@tag.x()b", 0, TemplateKind::Template)
            .parse(&mut counter)
            .unwrap_err();
        assert_eq!(err, CounterError::TagCall("x".to_string()));
        assert_eq!(counter.texts, 1);
    }

    #[test]
    fn test_parse_errors_convert() {
        let mut counter = TagCounter::default();
        let err = Parser::new("@endfor", 0, TemplateKind::Template)
            .parse(&mut counter)
            .unwrap_err();
        assert!(matches!(err, CounterError::Parse(ParseError::UnexpectedDirective { .. })));
    }

    #[test]
    fn test_event_list_records_in_order() {
        let mut events = EventList::new();
        Parser::new("x${y}", 0, TemplateKind::Template)
            .parse(&mut events)
            .unwrap();
        let kinds: Vec<_> = events.events().iter().map(|event| &event.kind).collect();
        assert!(matches!(kinds[..], [EventKind::Text { .. }, EventKind::Code { .. }]));
    }
}
