use rtpl_source::Span;

use crate::delimiters::find_closing;
use crate::delimiters::is_ident_byte;
use crate::error::ParseError;
use crate::events::Event;
use crate::events::EventKind;
use crate::events::TemplateKind;
use crate::header::is_identifier;
use crate::visitor::Visitor;

const EXPRESSION_START: &str = "${";
const STATEMENT_START: &str = "!{";
const COMMENT_START: &str = "<%--";
const COMMENT_END: &str = "--%>";

/// Single-pass scanner over a template body.
///
/// Literal text runs and directives are reported to a [`Visitor`] in source
/// order. Code spans are located by delimiter matching only and handed over
/// verbatim.
pub struct Parser<'src> {
    source: &'src str,
    kind: TemplateKind,
    current: usize,
    stack: Vec<Frame>,
}

#[derive(Debug)]
enum Frame {
    Condition { opener: usize, seen_else: bool },
    Loop { opener: usize },
    Layout { opener: usize, sections: Vec<String> },
    Section { opener: usize },
}

impl Frame {
    fn opener(&self) -> usize {
        match self {
            Frame::Condition { opener, .. }
            | Frame::Loop { opener }
            | Frame::Layout { opener, .. }
            | Frame::Section { opener } => *opener,
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Frame::Condition { .. } => "@if",
            Frame::Loop { .. } => "@for",
            Frame::Layout { .. } => "@layout",
            Frame::Section { .. } => "@section",
        }
    }

    fn closer(&self) -> &'static str {
        match self {
            Frame::Condition { .. } => "@endif",
            Frame::Loop { .. } => "@endfor",
            Frame::Layout { .. } => "@endlayout",
            Frame::Section { .. } => "@endsection",
        }
    }
}

#[derive(Debug)]
enum Directive {
    Expression(String),
    Statement(String),
    Comment,
    If(String),
    ElseIf(String),
    Else,
    EndIf,
    For(String),
    EndFor,
    Tag { name: String, args: String },
    Layout { name: String, args: String },
    Section(String),
    EndSection,
    EndLayout,
}

impl<'src> Parser<'src> {
    #[must_use]
    pub fn new(source: &'src str, body_start: usize, kind: TemplateKind) -> Self {
        Self {
            source,
            kind,
            current: body_start.min(source.len()),
            stack: Vec::new(),
        }
    }

    pub fn parse<V: Visitor + ?Sized>(mut self, visitor: &mut V) -> Result<(), V::Error> {
        let mut text_start = self.current;

        while !self.is_at_end() {
            let marker_start = self.current;
            if let Some(directive) = self.next_directive()? {
                self.flush_text(text_start, marker_start, visitor)?;
                self.handle_directive(directive, marker_start, visitor)?;
                text_start = self.current;
            } else {
                self.current = self.next_marker(self.current + 1);
            }
        }

        self.flush_text(text_start, self.source.len(), visitor)?;

        if let Some(frame) = self.stack.last() {
            return Err(ParseError::UnclosedTag {
                directive: frame.directive().to_string(),
                opener: frame.opener(),
                expected_closer: frame.closer().to_string(),
            }
            .into());
        }

        Ok(())
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Markers are ASCII, so the returned offset is always a char boundary.
    fn next_marker(&self, from: usize) -> usize {
        self.source.as_bytes()[from..]
            .iter()
            .position(|b| matches!(b, b'$' | b'!' | b'<' | b'@'))
            .map_or(self.source.len(), |offset| from + offset)
    }

    fn in_layout_call(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Layout { .. }))
    }

    fn emit<V: Visitor + ?Sized>(
        visitor: &mut V,
        depth: usize,
        span: Span,
        kind: EventKind,
    ) -> Result<(), V::Error> {
        visitor.visit_event(&Event::new(depth, span, kind))
    }

    fn flush_text<V: Visitor + ?Sized>(
        &self,
        start: usize,
        end: usize,
        visitor: &mut V,
    ) -> Result<(), V::Error> {
        if start >= end {
            return Ok(());
        }
        let text = &self.source[start..end];

        if self.in_layout_call() {
            let trimmed = text.trim_start();
            if trimmed.is_empty() {
                return Ok(());
            }
            return Err(ParseError::ContentOutsideSection {
                position: start + (text.len() - trimmed.len()),
            }
            .into());
        }

        let span = Span::saturating_from_parts_usize(start, end);
        Self::emit(
            visitor,
            self.stack.len(),
            span,
            EventKind::Text {
                text: text.to_string(),
            },
        )
    }

    /// Recognize a directive at the current position. On a match the cursor
    /// moves past it; otherwise it stays put.
    fn next_directive(&mut self) -> Result<Option<Directive>, ParseError> {
        let start = self.current;
        let rest = &self.source[start..];

        let directive = match self.source.as_bytes()[start] {
            b'$' if rest.starts_with(EXPRESSION_START) => {
                let code = self.code_block(start, "expression")?;
                Directive::Expression(code)
            }
            b'!' if rest.starts_with(STATEMENT_START) => {
                let code = self.code_block(start, "statement")?;
                Directive::Statement(code.trim_end_matches(';').trim_end().to_string())
            }
            b'<' if rest.starts_with(COMMENT_START) => {
                let body_start = start + COMMENT_START.len();
                let end = self.source[body_start..].find(COMMENT_END).ok_or_else(|| {
                    ParseError::Unterminated {
                        construct: "comment".to_string(),
                        position: start,
                    }
                })?;
                self.current = body_start + end + COMMENT_END.len();
                Directive::Comment
            }
            b'@' => match self.keyword_directive(start)? {
                Some(directive) => directive,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };

        Ok(Some(directive))
    }

    fn keyword_directive(&mut self, start: usize) -> Result<Option<Directive>, ParseError> {
        let rest = &self.source[start + 1..];

        let directive = if rest.starts_with("if(") {
            Directive::If(self.condition(start, "@if")?)
        } else if rest.starts_with("elseif(") {
            Directive::ElseIf(self.condition(start, "@elseif")?)
        } else if self.keyword(start, "else") {
            Directive::Else
        } else if self.keyword(start, "endif") {
            Directive::EndIf
        } else if rest.starts_with("for(") {
            let header = self.paren_block(start + "@for".len(), start, "'@for' header")?;
            if header.is_empty() {
                return Err(ParseError::MissingIterator { position: start });
            }
            Directive::For(header)
        } else if self.keyword(start, "endfor") {
            Directive::EndFor
        } else if rest.starts_with("tag.") {
            match self.call(start, "@tag.".len())? {
                Some((name, args)) => Directive::Tag { name, args },
                None => return Ok(None),
            }
        } else if rest.starts_with("layout.") {
            match self.call(start, "@layout.".len())? {
                Some((name, args)) => Directive::Layout { name, args },
                None => return Ok(None),
            }
        } else if rest.starts_with("section(") {
            let name = self.paren_block(start + "@section".len(), start, "'@section' name")?;
            if name.is_empty()
                || !name.bytes().all(|b| is_ident_byte(b) || b == b'-')
            {
                return Err(ParseError::MalformedSection {
                    position: start,
                    reason: format!("invalid section name '{name}'"),
                });
            }
            Directive::Section(name)
        } else if self.keyword(start, "endsection") {
            Directive::EndSection
        } else if self.keyword(start, "endlayout") {
            Directive::EndLayout
        } else {
            return Ok(None);
        };

        Ok(Some(directive))
    }

    /// `@<word>` not followed by an identifier character. Advances past it on a match.
    fn keyword(&mut self, start: usize, word: &str) -> bool {
        let rest = &self.source[start + 1..];
        let matched = rest.starts_with(word)
            && !rest
                .as_bytes()
                .get(word.len())
                .is_some_and(|&b| is_ident_byte(b));
        if matched {
            self.current = start + 1 + word.len();
        }
        matched
    }

    fn condition(&mut self, start: usize, tag: &str) -> Result<String, ParseError> {
        let condition = self.paren_block(start + tag.len(), start, "condition")?;
        if condition.is_empty() {
            return Err(ParseError::MissingCondition {
                tag: tag.to_string(),
                position: start,
            });
        }
        Ok(condition)
    }

    /// `open` is the index of a `(`; returns the trimmed inner text and moves
    /// past the matching `)`.
    fn paren_block(
        &mut self,
        open: usize,
        start: usize,
        construct: &str,
    ) -> Result<String, ParseError> {
        let close = find_closing(self.source, open + 1, b'(', b')').ok_or_else(|| {
            ParseError::Unterminated {
                construct: construct.to_string(),
                position: start,
            }
        })?;
        self.current = close + 1;
        Ok(self.source[open + 1..close].trim().to_string())
    }

    /// `${...}` or `!{...}` starting at `start`.
    fn code_block(&mut self, start: usize, construct: &str) -> Result<String, ParseError> {
        let inner_start = start + 2;
        let close = find_closing(self.source, inner_start, b'{', b'}').ok_or_else(|| {
            ParseError::Unterminated {
                construct: construct.to_string(),
                position: start,
            }
        })?;
        let code = self.source[inner_start..close].trim();
        if code.is_empty() {
            return Err(ParseError::EmptyCode {
                construct: construct.to_string(),
                position: start,
            });
        }
        self.current = close + 1;
        Ok(code.to_string())
    }

    /// `@tag.a.b(args)` / `@layout.a.b(args)`; `prefix_len` covers `@tag.`.
    ///
    /// Without a `(` after the name this is not a call and `None` is returned,
    /// so text like `x@tag.example` stays literal.
    fn call(
        &mut self,
        start: usize,
        prefix_len: usize,
    ) -> Result<Option<(String, String)>, ParseError> {
        let name_start = start + prefix_len;
        let name_len = self.source.as_bytes()[name_start..]
            .iter()
            .take_while(|&&b| is_ident_byte(b) || b == b'.')
            .count();
        let name_end = name_start + name_len;
        let name = &self.source[name_start..name_end];

        if self.source.as_bytes().get(name_end) != Some(&b'(') {
            return Ok(None);
        }
        if !name.split('.').all(is_identifier) {
            return Err(ParseError::MalformedCall {
                position: start,
                reason: format!("invalid name '{name}'"),
            });
        }

        let args = self.paren_block(name_end, start, "argument list")?;
        Ok(Some((name.to_string(), args)))
    }

    fn handle_directive<V: Visitor + ?Sized>(
        &mut self,
        directive: Directive,
        start: usize,
        visitor: &mut V,
    ) -> Result<(), V::Error> {
        if self.in_layout_call()
            && !matches!(
                directive,
                Directive::Comment | Directive::Section(_) | Directive::EndLayout
            )
        {
            return Err(ParseError::ContentOutsideSection { position: start }.into());
        }

        let span = Span::saturating_from_parts_usize(start, self.current);
        let depth = self.stack.len();

        match directive {
            Directive::Comment => Ok(()),
            Directive::Expression(code) => {
                Self::emit(visitor, depth, span, EventKind::Code { code })
            }
            Directive::Statement(code) => {
                Self::emit(visitor, depth, span, EventKind::Statement { code })
            }
            Directive::If(condition) => {
                Self::emit(visitor, depth, span, EventKind::ConditionStart { condition })?;
                self.stack.push(Frame::Condition {
                    opener: start,
                    seen_else: false,
                });
                Ok(())
            }
            Directive::ElseIf(condition) => {
                self.check_branch("@elseif", start, false)?;
                Self::emit(
                    visitor,
                    depth - 1,
                    span,
                    EventKind::ConditionElseIf { condition },
                )
            }
            Directive::Else => {
                self.check_branch("@else", start, true)?;
                Self::emit(visitor, depth - 1, span, EventKind::ConditionElse)
            }
            Directive::EndIf => {
                self.close("@endif", start)?;
                Self::emit(visitor, self.stack.len(), span, EventKind::ConditionEnd)
            }
            Directive::For(header) => {
                Self::emit(visitor, depth, span, EventKind::LoopStart { header })?;
                self.stack.push(Frame::Loop { opener: start });
                Ok(())
            }
            Directive::EndFor => {
                self.close("@endfor", start)?;
                Self::emit(visitor, self.stack.len(), span, EventKind::LoopEnd)
            }
            Directive::Tag { name, args } => {
                Self::emit(visitor, depth, span, EventKind::TagCall { name, args })
            }
            Directive::Layout { name, args } => {
                Self::emit(visitor, depth, span, EventKind::LayoutCall { name, args })?;
                self.stack.push(Frame::Layout {
                    opener: start,
                    sections: Vec::new(),
                });
                Ok(())
            }
            Directive::Section(name) => {
                self.open_section(&name, start)?;
                Self::emit(visitor, depth, span, EventKind::SectionStart { name })?;
                self.stack.push(Frame::Section { opener: start });
                Ok(())
            }
            Directive::EndSection => {
                self.close("@endsection", start)?;
                Self::emit(visitor, self.stack.len(), span, EventKind::SectionEnd)
            }
            Directive::EndLayout => {
                self.close("@endlayout", start)?;
                Self::emit(visitor, self.stack.len(), span, EventKind::LayoutEnd)
            }
        }
    }

    fn check_branch(
        &mut self,
        directive: &str,
        position: usize,
        is_else: bool,
    ) -> Result<(), ParseError> {
        match self.stack.last_mut() {
            Some(Frame::Condition { seen_else, .. }) => {
                if *seen_else {
                    return Err(ParseError::UnexpectedDirective {
                        directive: directive.to_string(),
                        position,
                        reason: "'@else' already seen for this '@if'".to_string(),
                    });
                }
                *seen_else = is_else;
                Ok(())
            }
            Some(frame) => Err(ParseError::UnexpectedDirective {
                directive: directive.to_string(),
                position,
                reason: format!(
                    "expected '{}' to close '{}' at position {}",
                    frame.closer(),
                    frame.directive(),
                    frame.opener()
                ),
            }),
            None => Err(ParseError::UnexpectedDirective {
                directive: directive.to_string(),
                position,
                reason: "no open '@if'".to_string(),
            }),
        }
    }

    fn close(&mut self, closer: &str, position: usize) -> Result<Frame, ParseError> {
        let top = self
            .stack
            .last()
            .map(|frame| (frame.closer(), frame.directive(), frame.opener()));

        match top {
            Some((expected, ..)) if expected == closer => {
                self.stack.pop().ok_or(ParseError::UnexpectedDirective {
                    directive: closer.to_string(),
                    position,
                    reason: "nothing is open".to_string(),
                })
            }
            Some((expected, directive, opener)) => Err(ParseError::UnexpectedDirective {
                directive: closer.to_string(),
                position,
                reason: format!(
                    "expected '{expected}' to close '{directive}' at position {opener}"
                ),
            }),
            None => Err(ParseError::UnexpectedDirective {
                directive: closer.to_string(),
                position,
                reason: "nothing is open".to_string(),
            }),
        }
    }

    /// Caller sections must sit directly in a `@layout` call and be unique
    /// there; layouts may place their own placeholders anywhere else.
    fn open_section(&mut self, name: &str, position: usize) -> Result<(), ParseError> {
        match self.stack.last_mut() {
            Some(Frame::Layout { sections, .. }) => {
                if sections.iter().any(|existing| existing == name) {
                    return Err(ParseError::DuplicateSection {
                        name: name.to_string(),
                        position,
                    });
                }
                sections.push(name.to_string());
                Ok(())
            }
            _ if self.kind == TemplateKind::Layout => Ok(()),
            _ => Err(ParseError::SectionOutsideLayout { position }),
        }
    }
}
