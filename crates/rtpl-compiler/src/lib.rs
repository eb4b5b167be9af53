//! Template to Rust compilation.
//!
//! [`Compiler`] resolves a template through a
//! [`TemplateResolver`](rtpl_source::TemplateResolver), parses it with
//! `rtpl-templates` and generates one Rust module per template, tag and
//! layout it reaches. Dependencies are collected in a [`DependencySet`] keyed
//! by [`QualifiedName`], so each tag or layout is generated once per compile
//! however often (or however recursively) it is referenced.
//!
//! The generated set is either written out with [`SourceTree`] for inclusion
//! in a crate, or handed to a [`BuildBackend`] to obtain a
//! [`Renderable`](rtpl_runtime::Renderable).
//!
//! ## Generated code
//!
//! | body construct | generated statement |
//! |---|---|
//! | text | `output.write_safe("...");` |
//! | `${expr}` | `output.write(&(expr));` |
//! | `!{stmt}` | `stmt;` |
//! | `@if(c)` … `@endif` | `if c { … }` |
//! | `@for(h)` … `@endfor` | `for h { … }` |
//! | `@tag.a.b(args)` | `crate::rtpl::tags::a::b_rtpl::render(output, args);` |
//! | `@layout.a(args)` … `@endlayout` | `render(output, args, &mut \|section, output\| match section { … })` |

mod backend;
mod codegen;
mod compiler;
pub mod emit;
mod error;
mod names;
mod unit;

pub use backend::BuildBackend;
pub use backend::LinkedBackend;
pub use backend::LoadedArtifact;
pub use codegen::escape_literal;
pub use compiler::Compiler;
pub use compiler::Generated;
pub use emit::SourceTree;
pub use error::BuildError;
pub use error::CompileError;
pub use names::Namespace;
pub use names::Naming;
pub use names::QualifiedName;
pub use unit::CompilationUnit;
pub use unit::DependencySet;
pub use unit::NameCollision;
