use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use clap::ValueEnum;
use rtpl_conf::Settings;
use rtpl_source::DirectoryResolver;
use rtpl_source::TemplateResolver;
use rtpl_templates::parse_events;
use rtpl_templates::TemplateKind;

use crate::args::Args;
use crate::commands::Command;
use crate::commands::Project;

#[derive(Debug, Parser)]
pub struct Events {
    /// Template name relative to the template directory.
    pub name: String,

    /// How to parse the source. Inferred from the file extension when omitted.
    #[arg(long, value_enum)]
    pub kind: Option<Kind>,

    /// Template directory. Defaults to `template_dir` from the settings.
    #[arg(long)]
    pub templates: Option<Utf8PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Template,
    Tag,
    Layout,
}

impl From<Kind> for TemplateKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Template => TemplateKind::Template,
            Kind::Tag => TemplateKind::Tag,
            Kind::Layout => TemplateKind::Layout,
        }
    }
}

fn infer_kind(name: &str, settings: &Settings) -> TemplateKind {
    if name.ends_with(&settings.tag_extension) {
        TemplateKind::Tag
    } else if name.ends_with(&settings.layout_extension) {
        TemplateKind::Layout
    } else {
        TemplateKind::Template
    }
}

impl Command for Events {
    fn execute(&self, project: &Project, _args: &Args) -> Result<ExitCode> {
        let resolver = DirectoryResolver::new(project.template_dir(self.templates.as_deref()));
        let source = resolver
            .resolve(&self.name)
            .with_context(|| format!("Template {} not found", self.name))?;

        let kind = self
            .kind
            .map_or_else(|| infer_kind(&self.name, &project.settings), TemplateKind::from);
        let (header, events) =
            parse_events(&source, kind).with_context(|| format!("Failed to parse {}", self.name))?;

        let dump = serde_json::json!({
            "name": self.name,
            "kind": kind,
            "header": header,
            "events": events,
        });
        println!("{}", serde_json::to_string_pretty(&dump)?);
        Ok(ExitCode::SUCCESS)
    }
}
