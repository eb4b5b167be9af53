use rtpl_conf::Settings;
use rtpl_runtime::EmptyTemplate;
use rtpl_runtime::Renderable;
use rtpl_source::TemplateResolver;
use rtpl_templates::HeaderParser;
use rtpl_templates::ParsedHeader;
use rtpl_templates::Parser;
use rtpl_templates::TemplateKind;

use crate::backend::BuildBackend;
use crate::codegen::CodeGenerator;
use crate::codegen::GenerateError;
use crate::error::BuildError;
use crate::error::CompileError;
use crate::names::Namespace;
use crate::names::Naming;
use crate::names::QualifiedName;
use crate::unit::CompilationUnit;
use crate::unit::DependencySet;
use crate::unit::NameCollision;

/// Result of generating a template without building it.
#[derive(Debug)]
pub enum Generated {
    /// The source was empty; there is nothing to build.
    Empty,
    /// Every unit the template needs, with the template itself last.
    Units(DependencySet),
}

/// Drives header parsing, body parsing and code generation for one template
/// and everything it calls.
///
/// The compiler holds no per-compile state: each call owns a fresh
/// [`DependencySet`], so a `Compiler` over a `Sync` resolver can be shared
/// across threads.
pub struct Compiler<R> {
    resolver: R,
    naming: Naming,
}

impl<R: TemplateResolver> Compiler<R> {
    #[must_use]
    pub fn new(resolver: R) -> Self {
        Self::with_naming(resolver, Naming::default())
    }

    #[must_use]
    pub fn with_naming(resolver: R, naming: Naming) -> Self {
        Self { resolver, naming }
    }

    #[must_use]
    pub fn with_settings(resolver: R, settings: &Settings) -> Self {
        Self::with_naming(resolver, Naming::from(settings))
    }

    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Generate the units for template `name` and every tag and layout it
    /// reaches.
    pub fn generate(&self, name: &str) -> Result<Generated, CompileError> {
        let source = self
            .resolver
            .resolve(name)
            .ok_or_else(|| CompileError::NotFound {
                name: name.to_string(),
            })?;

        if source.is_empty() {
            tracing::debug!(template = name, "empty template source");
            return Ok(Generated::Empty);
        }

        let header = HeaderParser::new(&source)
            .parse_template()
            .map_err(|source| CompileError::MalformedHeader {
                name: name.to_string(),
                source,
            })?;

        let qualified = self.naming.qualify(Namespace::Templates, name);
        tracing::debug!(template = name, unit = %qualified, "generating template");

        let mut units = DependencySet::new();
        let code = self.generate_unit(
            name,
            &source,
            &header,
            &qualified,
            TemplateKind::Template,
            &mut units,
        )?;
        finalize(&mut units, qualified, name, code);

        tracing::debug!(template = name, units = units.len(), "generated");
        Ok(Generated::Units(units))
    }

    /// Generate template `name` and hand the result to `backend`.
    ///
    /// An empty source yields [`EmptyTemplate`] without calling the backend.
    pub fn compile<B: BuildBackend + ?Sized>(
        &self,
        name: &str,
        backend: &B,
    ) -> Result<Box<dyn Renderable>, CompileError> {
        let units = match self.generate(name)? {
            Generated::Empty => return Ok(Box::new(EmptyTemplate)),
            Generated::Units(units) => units,
        };
        let main = units
            .main()
            .ok_or_else(|| BuildError::MissingUnit(name.to_string()))?;

        let artifact = backend.compile(&units)?;
        Ok(artifact.instantiate(main.name())?)
    }

    /// Make sure the tag or layout referenced as `name` is part of `units`
    /// and return its qualified name.
    ///
    /// A name already in the set, whether finished or still being generated
    /// further up the call chain, is returned as-is without resolving it again.
    pub(crate) fn compile_fragment(
        &self,
        name: &str,
        namespace: Namespace,
        units: &mut DependencySet,
        referrer: &QualifiedName,
        position: usize,
    ) -> Result<QualifiedName, CompileError> {
        let path = self.naming.source_path(namespace, name);
        let qualified = self.naming.qualify(namespace, &path);
        if let Some(existing) = units.source(&qualified) {
            if existing != path {
                return Err(NameCollision {
                    name: qualified,
                    existing: existing.to_string(),
                    incoming: path,
                }
                .into());
            }
            return Ok(qualified);
        }

        let source =
            self.resolver
                .resolve(&path)
                .ok_or_else(|| CompileError::UnresolvedReference {
                    kind: namespace,
                    name: name.to_string(),
                    referrer: referrer.to_string(),
                    position,
                })?;

        units.reserve(qualified.clone(), path.as_str());
        tracing::debug!(%namespace, unit = %qualified, "generating dependency");

        let header = HeaderParser::new(&source)
            .parse_fragment()
            .map_err(|source| CompileError::MalformedHeader {
                name: path.clone(),
                source,
            })?;
        let code = self.generate_unit(
            &path,
            &source,
            &header,
            &qualified,
            namespace.kind(),
            units,
        )?;
        finalize(units, qualified.clone(), &path, code);

        Ok(qualified)
    }

    fn generate_unit(
        &self,
        source_name: &str,
        source: &str,
        header: &ParsedHeader,
        qualified: &QualifiedName,
        kind: TemplateKind,
        units: &mut DependencySet,
    ) -> Result<String, CompileError> {
        let mut generator = CodeGenerator::new(self, units, qualified, kind);
        Parser::new(source, header.body_start, kind)
            .parse(&mut generator)
            .map_err(|err| match err {
                GenerateError::Parse(source) => CompileError::Structure {
                    name: source_name.to_string(),
                    source,
                },
                GenerateError::Compile(err) => err,
            })?;
        Ok(generator.finish(header, source_name))
    }
}

fn finalize(units: &mut DependencySet, name: QualifiedName, source: &str, code: String) {
    tracing::trace!(unit = %name, source, "generated unit\n{code}");
    units.finalize(CompilationUnit::new(name, source, code));
}
