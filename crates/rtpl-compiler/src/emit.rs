//! Writing generated units out as a Rust module tree.
//!
//! Each unit lands at its [`QualifiedName::file_path`], every directory gets
//! a `mod.rs` declaring its children, and each root `mod.rs` carries a
//! `templates()` table for [`crate::LinkedBackend::from_table`]:
//!
//! ```text
//! out/rtpl/mod.rs
//! out/rtpl/tags/mod.rs
//! out/rtpl/tags/card_rtpl.rs
//! out/rtpl/templates/mod.rs
//! out/rtpl/templates/index_rtpl.rs
//! ```

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;

use camino::Utf8Path;
use camino::Utf8PathBuf;

use crate::error::BuildError;
use crate::error::CompileError;
use crate::unit::DependencySet;

const HEADER: &str = "// Generated by rtpl. Do not edit.\n";

#[derive(Debug, Default)]
pub struct SourceTree {
    units: DependencySet,
}

impl SourceTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a generated set into the tree. Units already present win; a
    /// unit generated from a different source under an existing name is an
    /// error and leaves the tree unchanged.
    pub fn add(&mut self, units: DependencySet) -> Result<(), CompileError> {
        Ok(self.units.merge(units)?)
    }

    #[must_use]
    pub fn units(&self) -> &DependencySet {
        &self.units
    }

    /// Every file of the tree as `(relative path, contents)`, modules first.
    #[must_use]
    pub fn files(&self) -> Vec<(Utf8PathBuf, String)> {
        let mut dirs: BTreeMap<Vec<&str>, BTreeSet<&str>> = BTreeMap::new();
        for unit in self.units.units() {
            let segments = unit.name().segments();
            for depth in 1..segments.len() {
                let dir = segments[..depth].iter().map(String::as_str).collect();
                dirs.entry(dir)
                    .or_default()
                    .insert(segments[depth].as_str());
            }
        }

        let mut files = Vec::with_capacity(dirs.len() + self.units.len());
        for (dir, children) in &dirs {
            let mut code = String::from(HEADER);
            code.push('\n');
            for child in children {
                let _ = writeln!(code, "pub mod {child};");
            }
            if let [root] = dir.as_slice() {
                code.push('\n');
                self.write_table(&mut code, root);
            }

            let mut path: Utf8PathBuf = dir.iter().collect();
            path.push("mod.rs");
            files.push((path, code));
        }

        files.extend(
            self.units
                .units()
                .map(|unit| (unit.name().file_path(), unit.code().to_string())),
        );
        files
    }

    fn write_table(&self, code: &mut String, root: &str) {
        let mut templates: Vec<_> = self
            .units
            .templates()
            .map(|unit| unit.name())
            .filter(|name| name.segments().first().is_some_and(|first| first == root))
            .collect();
        templates.sort();

        code.push_str("pub fn templates() -> Vec<(&'static str, rtpl_runtime::Constructor)> {\n");
        if templates.is_empty() {
            code.push_str("    Vec::new()\n");
        } else {
            code.push_str("    vec![\n");
            for name in templates {
                let relative = name.segments()[1..].join("::");
                let _ = writeln!(
                    code,
                    "        (\"{name}\", self::{relative}::new as rtpl_runtime::Constructor),"
                );
            }
            code.push_str("    ]\n");
        }
        code.push_str("}\n");
    }

    /// Write the tree below `out_dir`, leaving files whose contents did not
    /// change untouched. Returns the paths that were written.
    pub fn write_to(&self, out_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, BuildError> {
        let mut written = Vec::new();
        for (relative, code) in self.files() {
            let path = out_dir.join(&relative);
            if fs::read_to_string(&path).is_ok_and(|existing| existing == code) {
                tracing::trace!(%path, "unchanged");
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|err| BuildError::io(parent, err))?;
            }
            fs::write(&path, code).map_err(|err| BuildError::io(&path, err))?;
            tracing::debug!(%path, "wrote");
            written.push(path);
        }
        Ok(written)
    }
}
