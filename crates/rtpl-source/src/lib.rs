mod resolver;
mod span;

pub use resolver::DirectoryResolver;
pub use resolver::InMemoryResolver;
pub use resolver::TemplateResolver;
pub use span::Span;
