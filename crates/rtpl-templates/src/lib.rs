//! Template source parsing.
//!
//! A template source is a header block followed by a body:
//!
//! - [`HeaderParser`] reads the `@import`/`@param` declarations and reports
//!   where the body starts.
//! - [`Parser`] scans the body in one pass and reports literal text and
//!   directives to a [`Visitor`] as depth-annotated [`Event`]s.
//!
//! Embedded Rust (expressions, statements, conditions, call arguments) is
//! located by delimiter matching only and passed through verbatim.
//!
//! ## Example
//!
//! ```
//! use rtpl_templates::parse_events;
//! use rtpl_templates::EventKind;
//! use rtpl_templates::TemplateKind;
//!
//! let source = "@param name: String\nHello ${name}!";
//! let (header, events) = parse_events(source, TemplateKind::Template).unwrap();
//!
//! assert_eq!(header.model.unwrap().ty, "String");
//! assert_eq!(events.events().len(), 3);
//! assert!(matches!(events.events()[1].kind, EventKind::Code { .. }));
//! ```

mod delimiters;
mod error;
mod events;
mod header;
mod parser;
mod visitor;

pub use error::HeaderError;
pub use error::ParseError;
pub use error::TemplateError;
pub use events::Event;
pub use events::EventKind;
pub use events::TemplateKind;
pub use header::HeaderParser;
pub use header::Parameter;
pub use header::ParsedHeader;
pub use parser::Parser;
pub use visitor::walk_event;
pub use visitor::EventList;
pub use visitor::Visitor;

/// Parse the header matching `kind`, then collect the body's events.
pub fn parse_events(
    source: &str,
    kind: TemplateKind,
) -> Result<(ParsedHeader, EventList), TemplateError> {
    let header_parser = HeaderParser::new(source);
    let header = match kind {
        TemplateKind::Template => header_parser.parse_template()?,
        TemplateKind::Tag | TemplateKind::Layout => header_parser.parse_fragment()?,
    };

    let mut events = EventList::new();
    Parser::new(source, header.body_start, kind).parse(&mut events)?;

    Ok((header, events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events_template() {
        let source = "@import crate::model::User\n@param user: User\n<b>${user.name}</b>";
        let (header, events) = parse_events(source, TemplateKind::Template).unwrap();

        assert_eq!(header.imports, vec!["crate::model::User".to_string()]);
        assert_eq!(header.model.unwrap().name, "user");
        assert_eq!(events.events().len(), 3);
        assert_eq!(events.events()[0].span.start_usize(), header.body_start);
    }

    #[test]
    fn test_parse_events_header_error() {
        let err = parse_events("<p>no params</p>", TemplateKind::Template).unwrap_err();
        assert_eq!(err, TemplateError::Header(HeaderError::MissingParam));
    }

    #[test]
    fn test_parse_events_fragment_without_params() {
        let (header, events) = parse_events("<hr>", TemplateKind::Tag).unwrap();
        assert!(header.params.is_empty());
        assert_eq!(events.events().len(), 1);
    }

    #[test]
    fn test_parse_events_body_error() {
        let err = parse_events("@param x: X\n@if(x)", TemplateKind::Template).unwrap_err();
        assert!(matches!(err, TemplateError::Parse(ParseError::UnclosedTag { .. })));
    }
}
