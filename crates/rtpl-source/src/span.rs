use serde::Serialize;

/// A byte range into a template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: u32,
    pub length: u32,
}

impl Span {
    #[must_use]
    pub fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// Build a span from `usize` byte offsets, saturating at `u32::MAX`.
    #[must_use]
    pub fn saturating_from_parts_usize(start: usize, end: usize) -> Self {
        let start_u32 = u32::try_from(start).unwrap_or(u32::MAX);
        let length = u32::try_from(end.saturating_sub(start)).unwrap_or(u32::MAX);
        Self::new(start_u32, length)
    }

    #[must_use]
    pub fn start_usize(&self) -> usize {
        self.start as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_from_parts() {
        let span = Span::saturating_from_parts_usize(4, 10);
        assert_eq!(span, Span::new(4, 6));
        assert_eq!(span.start_usize(), 4);
    }

    #[test]
    fn test_saturating_from_reversed_parts() {
        let span = Span::saturating_from_parts_usize(10, 4);
        assert_eq!(span, Span::new(10, 0));
    }
}
