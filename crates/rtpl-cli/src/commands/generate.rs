use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use rtpl_compiler::Compiler;
use rtpl_compiler::Generated;
use rtpl_compiler::SourceTree;
use rtpl_source::DirectoryResolver;
use rtpl_source::TemplateResolver;

use crate::args::Args;
use crate::commands::Command;
use crate::commands::Project;

#[derive(Debug, Parser)]
pub struct Generate {
    /// Template names relative to the template directory (e.g. `pages/index.rtpl`).
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Template directory. Defaults to `template_dir` from the settings.
    #[arg(long)]
    pub templates: Option<Utf8PathBuf>,

    /// Directory the module tree is written into. Defaults to `src`.
    #[arg(long)]
    pub out: Option<Utf8PathBuf>,
}

impl Command for Generate {
    fn execute(&self, project: &Project, args: &Args) -> Result<ExitCode> {
        let template_dir = project.template_dir(self.templates.as_deref());
        let out_dir = match &self.out {
            Some(out) => project.root.join(out),
            None => project.root.join("src"),
        };

        let compiler =
            Compiler::with_settings(DirectoryResolver::new(template_dir), &project.settings);
        let tree = generate_tree(&compiler, &self.names)?;

        let written = tree
            .write_to(&out_dir)
            .with_context(|| format!("Failed to write generated modules to {out_dir}"))?;

        if !args.global.quiet {
            println!(
                "Generated {} units for {} templates into {out_dir} ({} files written).",
                tree.units().len(),
                self.names.len(),
                written.len()
            );
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn generate_tree<R: TemplateResolver>(compiler: &Compiler<R>, names: &[String]) -> Result<SourceTree> {
    let mut tree = SourceTree::new();
    for name in names {
        match compiler
            .generate(name)
            .with_context(|| format!("Failed to compile {name}"))?
        {
            Generated::Empty => tracing::warn!(template = %name, "empty template, nothing generated"),
            Generated::Units(units) => tree
                .add(units)
                .with_context(|| format!("Failed to add {name} to the module tree"))?,
        }
    }
    Ok(tree)
}
