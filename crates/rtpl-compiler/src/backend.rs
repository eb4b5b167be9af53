//! Turning a [`DependencySet`] into something that can render.
//!
//! Generated Rust has to be compiled by `rustc` before it can run, which
//! rules out building it in-process. [`LinkedBackend`] closes the loop for
//! units that were emitted ahead of time (see [`crate::emit::SourceTree`])
//! and compiled into the host binary.

use std::sync::Arc;

use rtpl_runtime::Constructor;
use rtpl_runtime::Renderable;
use rustc_hash::FxHashMap;

use crate::error::BuildError;
use crate::names::QualifiedName;
use crate::unit::DependencySet;

pub trait BuildBackend {
    /// Build every unit of `units` into a loaded artifact. Called once per
    /// compile and never retried.
    fn compile(&self, units: &DependencySet) -> Result<Box<dyn LoadedArtifact>, BuildError>;
}

pub trait LoadedArtifact {
    fn instantiate(&self, name: &QualifiedName) -> Result<Box<dyn Renderable>, BuildError>;
}

/// Backend over template units already compiled into the running binary,
/// keyed by module path.
#[derive(Clone, Debug, Default)]
pub struct LinkedBackend {
    constructors: Arc<FxHashMap<String, Constructor>>,
}

impl LinkedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a generated `templates()` table.
    #[must_use]
    pub fn from_table<'a>(table: impl IntoIterator<Item = (&'a str, Constructor)>) -> Self {
        let constructors = table
            .into_iter()
            .map(|(path, constructor)| (path.to_string(), constructor))
            .collect();
        Self {
            constructors: Arc::new(constructors),
        }
    }

    pub fn register(&mut self, module_path: impl Into<String>, constructor: Constructor) {
        Arc::make_mut(&mut self.constructors).insert(module_path.into(), constructor);
    }

    #[must_use]
    pub fn with(mut self, module_path: impl Into<String>, constructor: Constructor) -> Self {
        self.register(module_path, constructor);
        self
    }

    #[must_use]
    pub fn is_linked(&self, name: &QualifiedName) -> bool {
        self.constructors.contains_key(&name.module_path())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl BuildBackend for LinkedBackend {
    fn compile(&self, units: &DependencySet) -> Result<Box<dyn LoadedArtifact>, BuildError> {
        let missing: Vec<String> = units
            .templates()
            .filter(|unit| !self.is_linked(unit.name()))
            .map(|unit| unit.name().module_path())
            .collect();

        if !missing.is_empty() {
            tracing::warn!(?missing, "template units are not linked");
            return Err(BuildError::Rejected(format!(
                "template units not linked into this binary: {}",
                missing.join(", ")
            )));
        }

        tracing::debug!(units = units.len(), "linked units");
        Ok(Box::new(LinkedArtifact {
            constructors: Arc::clone(&self.constructors),
        }))
    }
}

struct LinkedArtifact {
    constructors: Arc<FxHashMap<String, Constructor>>,
}

impl LoadedArtifact for LinkedArtifact {
    fn instantiate(&self, name: &QualifiedName) -> Result<Box<dyn Renderable>, BuildError> {
        let path = name.module_path();
        let constructor = self
            .constructors
            .get(&path)
            .ok_or(BuildError::MissingUnit(path))?;
        Ok(constructor())
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use rtpl_runtime::RenderError;
    use rtpl_runtime::StringOutput;
    use rtpl_runtime::TemplateOutput;

    use super::*;
    use crate::names::Namespace;
    use crate::names::Naming;
    use crate::unit::CompilationUnit;

    struct Hello;

    impl Renderable for Hello {
        fn render(&self, _model: &dyn Any, output: &mut dyn TemplateOutput) -> Result<(), RenderError> {
            output.write_safe("hello");
            Ok(())
        }
    }

    fn hello() -> Box<dyn Renderable> {
        Box::new(Hello)
    }

    fn units_with(path: &str) -> (QualifiedName, DependencySet) {
        let name = Naming::default().qualify(Namespace::Templates, path);
        let mut units = DependencySet::new();
        units.finalize(CompilationUnit::new(name.clone(), path, String::new()));
        (name, units)
    }

    #[test]
    fn test_instantiate_linked_unit() {
        let backend = LinkedBackend::new().with("rtpl::templates::hello_rtpl", hello);
        let (name, units) = units_with("hello.rtpl");

        let artifact = backend.compile(&units).unwrap();
        let template = artifact.instantiate(&name).unwrap();

        let mut output = StringOutput::new();
        template.render(&(), &mut output).unwrap();
        assert_eq!(output.as_str(), "hello");
    }

    #[test]
    fn test_rejects_unlinked_templates() {
        let backend = LinkedBackend::from_table([("rtpl::templates::other_rtpl", hello as Constructor)]);
        let (_, units) = units_with("hello.rtpl");

        let Err(err) = backend.compile(&units) else {
            panic!("expected rejection");
        };
        assert!(matches!(err, BuildError::Rejected(message) if message.contains("hello_rtpl")));
    }

    #[test]
    fn test_unknown_unit() {
        let backend = LinkedBackend::new();
        let artifact = backend.compile(&DependencySet::new()).unwrap();
        let name = Naming::default().qualify(Namespace::Templates, "nope.rtpl");

        let Err(err) = artifact.instantiate(&name) else {
            panic!("expected missing unit");
        };
        assert!(matches!(err, BuildError::MissingUnit(path) if path == "rtpl::templates::nope_rtpl"));
    }
}
