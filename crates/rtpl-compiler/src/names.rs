use std::fmt;

use camino::Utf8PathBuf;
use rtpl_conf::Settings;
use rtpl_templates::TemplateKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Templates,
    Tags,
    Layouts,
}

impl Namespace {
    /// Module directory below the root module.
    #[must_use]
    pub fn dir(self) -> &'static str {
        match self {
            Namespace::Templates => "templates",
            Namespace::Tags => "tags",
            Namespace::Layouts => "layouts",
        }
    }

    #[must_use]
    pub fn kind(self) -> TemplateKind {
        match self {
            Namespace::Templates => TemplateKind::Template,
            Namespace::Tags => TemplateKind::Tag,
            Namespace::Layouts => TemplateKind::Layout,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Namespace::Templates => "template",
            Namespace::Tags => "tag",
            Namespace::Layouts => "layout",
        };
        f.write_str(name)
    }
}

/// The naming knobs of [`Settings`] needed to place generated units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Naming {
    pub root_module: String,
    pub unit_suffix: String,
    pub tag_extension: String,
    pub layout_extension: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for Naming {
    fn from(settings: &Settings) -> Self {
        Self {
            root_module: settings.root_module.clone(),
            unit_suffix: settings.unit_suffix.clone(),
            tag_extension: settings.tag_extension.clone(),
            layout_extension: settings.layout_extension.clone(),
        }
    }
}

impl Naming {
    /// Source path of a tag or layout referenced as `a.b.c` in a body.
    #[must_use]
    pub fn source_path(&self, namespace: Namespace, dotted: &str) -> String {
        let path = dotted.replace('.', "/");
        match namespace {
            Namespace::Templates => path,
            Namespace::Tags => path + &self.tag_extension,
            Namespace::Layouts => path + &self.layout_extension,
        }
    }

    #[must_use]
    pub fn qualify(&self, namespace: Namespace, path: &str) -> QualifiedName {
        let mut parts: Vec<&str> = path.split('/').collect();
        let last = parts.pop().unwrap_or_default();

        let mut segments = vec![sanitize(&self.root_module), namespace.dir().to_string()];
        segments.extend(
            parts
                .into_iter()
                .filter(|part| !part.is_empty())
                .map(sanitize),
        );

        let stem = match last.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => last,
        };
        let mut unit = if stem.is_empty() {
            String::new()
        } else {
            sanitize(stem)
        };
        unit.push_str(&self.unit_suffix);
        if unit.is_empty() || is_keyword(&unit) {
            unit.push('_');
        }
        segments.push(unit);

        QualifiedName {
            namespace,
            segments,
        }
    }
}

/// Fully qualified module of one generated unit, e.g. `rtpl::tags::card_rtpl`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    namespace: Namespace,
    segments: Vec<String>,
}

impl QualifiedName {
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn module_path(&self) -> String {
        self.segments.join("::")
    }

    /// Path used by generated code to call into this unit.
    #[must_use]
    pub fn call_path(&self) -> String {
        format!("crate::{}", self.module_path())
    }

    /// Location of the unit's source file relative to the output directory.
    #[must_use]
    pub fn file_path(&self) -> Utf8PathBuf {
        let mut path: Utf8PathBuf = self.segments.iter().collect();
        path.set_extension("rs");
        path
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.module_path())
    }
}

fn sanitize(segment: &str) -> String {
    let mut ident: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if ident.is_empty() || ident == "_" || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if is_keyword(&ident) {
        ident.push('_');
    }
    ident
}

fn is_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "as" | "async"
            | "await"
            | "box"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "do"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "gen"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "macro"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "try"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "yield"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    mod qualify {
        use super::*;

        #[test]
        fn test_template_name() {
            let name = Naming::default().qualify(Namespace::Templates, "pages/index.rtpl");
            assert_eq!(name.module_path(), "rtpl::templates::pages::index_rtpl");
            assert_eq!(name.call_path(), "crate::rtpl::templates::pages::index_rtpl");
            assert_eq!(
                name.file_path(),
                Utf8PathBuf::from("rtpl/templates/pages/index_rtpl.rs")
            );
        }

        #[test]
        fn test_tag_and_layout_do_not_collide() {
            let naming = Naming::default();
            let tag = naming.qualify(Namespace::Tags, "card.rtag");
            let layout = naming.qualify(Namespace::Layouts, "card.rlayout");
            assert_ne!(tag, layout);
            assert_eq!(tag.module_path(), "rtpl::tags::card_rtpl");
            assert_eq!(layout.module_path(), "rtpl::layouts::card_rtpl");
        }

        #[test]
        fn test_sanitizes_segments() {
            let name = Naming::default().qualify(Namespace::Templates, "2024/my-page.v2.html");
            assert_eq!(name.segments()[2], "_2024");
            assert_eq!(name.segments()[3], "my_page_v2_rtpl");
        }

        #[test]
        fn test_keyword_segments() {
            let name = Naming::default().qualify(Namespace::Templates, "static/mod/x.rtpl");
            assert_eq!(name.module_path(), "rtpl::templates::static_::mod_::x_rtpl");
        }

        #[test]
        fn test_empty_segments_are_skipped() {
            let name = Naming::default().qualify(Namespace::Templates, "/a//b.rtpl");
            assert_eq!(name.module_path(), "rtpl::templates::a::b_rtpl");
        }

        #[test]
        fn test_custom_naming() {
            let naming = Naming {
                root_module: "views".to_string(),
                unit_suffix: "_view".to_string(),
                ..Naming::default()
            };
            let name = naming.qualify(Namespace::Tags, "user/card.rtag");
            assert_eq!(name.to_string(), "views::tags::user::card_view");
        }

        #[test]
        fn test_qualification_is_deterministic() {
            let naming = Naming::default();
            assert_eq!(
                naming.qualify(Namespace::Tags, "a/b.rtag"),
                naming.qualify(Namespace::Tags, "a/b.rtag")
            );
        }
    }

    mod source_path {
        use super::*;

        #[test]
        fn test_tag_path() {
            let naming = Naming::default();
            assert_eq!(naming.source_path(Namespace::Tags, "user.card"), "user/card.rtag");
        }

        #[test]
        fn test_layout_path() {
            let naming = Naming::default();
            assert_eq!(naming.source_path(Namespace::Layouts, "page"), "page.rlayout");
        }
    }
}
