//! Runtime support linked into generated template code.
//!
//! Generated units only ever talk to this crate: they write into a
//! [`TemplateOutput`], expose themselves as [`Renderable`] and exchange
//! layout sections through a [`SectionLookup`].

mod output;
mod renderable;

pub use output::StringOutput;
pub use output::TemplateOutput;
pub use output::WriterOutput;
pub use renderable::downcast_model;
pub use renderable::EmptyTemplate;
pub use renderable::RenderError;
pub use renderable::Renderable;

/// Caller-supplied section bodies handed to a layout.
///
/// The layout calls it with a section name; the caller runs the matching
/// body against the given output and returns `true`, or returns `false` when
/// it has no content for that name.
pub type SectionLookup<'a> = dyn FnMut(&str, &mut dyn TemplateOutput) -> bool + 'a;

/// Builds a fresh renderable for one generated template unit.
pub type Constructor = fn() -> Box<dyn Renderable>;
