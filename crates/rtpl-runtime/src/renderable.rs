use std::any::type_name;
use std::any::Any;

use thiserror::Error;

use crate::TemplateOutput;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Template expects a model of type `{expected}`")]
    ModelType { expected: &'static str },
}

/// A loaded, ready-to-run template.
///
/// The model is passed type-erased so renderables for different templates can
/// sit behind one trait object; generated code downcasts it back with
/// [`downcast_model`].
pub trait Renderable: Send + Sync {
    fn render(&self, model: &dyn Any, output: &mut dyn TemplateOutput) -> Result<(), RenderError>;
}

pub fn downcast_model<T: Any>(model: &dyn Any) -> Result<&T, RenderError> {
    model.downcast_ref::<T>().ok_or(RenderError::ModelType {
        expected: type_name::<T>(),
    })
}

/// What an empty template source compiles to: accepts any model, writes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyTemplate;

impl Renderable for EmptyTemplate {
    fn render(&self, _model: &dyn Any, _output: &mut dyn TemplateOutput) -> Result<(), RenderError> {
        Ok(())
    }
}
