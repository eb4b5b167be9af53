use std::fmt;
use std::fmt::Write as _;
use std::io;

/// Destination for everything a template renders.
pub trait TemplateOutput {
    /// Write text that needs no further treatment, such as template markup.
    fn write_safe(&mut self, value: &str);

    /// Write the result of an embedded expression.
    fn write(&mut self, value: &dyn fmt::Display) {
        self.write_safe(&value.to_string());
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StringOutput {
    buffer: String,
}

impl StringOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl TemplateOutput for StringOutput {
    fn write_safe(&mut self, value: &str) {
        self.buffer.push_str(value);
    }

    fn write(&mut self, value: &dyn fmt::Display) {
        // Writing into a String cannot fail.
        let _ = write!(self.buffer, "{value}");
    }
}

impl fmt::Display for StringOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buffer)
    }
}

/// Streams into any [`io::Write`].
///
/// Rendering has no error channel, so the first IO failure is kept and every
/// later write is skipped; [`WriterOutput::finish`] reports it.
pub struct WriterOutput<W: io::Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: io::Write> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> TemplateOutput for WriterOutput<W> {
    fn write_safe(&mut self, value: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.writer.write_all(value.as_bytes()) {
            self.error = Some(err);
        }
    }

    fn write(&mut self, value: &dyn fmt::Display) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = write!(self.writer, "{value}") {
            self.error = Some(err);
        }
    }
}
