//! The declaration block at the top of every template source.
//!
//! ```text
//! @import crate::model::Page
//! @param page: Page
//! <h1>${page.title}</h1>
//! ```
//!
//! Directives sit one per line and may be separated by blank lines. The
//! first line that is not a directive starts the body.

use serde::Serialize;

use crate::error::HeaderError;

const IMPORT_DIRECTIVE: &str = "@import";
const PARAM_DIRECTIVE: &str = "@param";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub ty: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedHeader {
    /// Paths to bring into scope, in declaration order, without `use`/`;`.
    pub imports: Vec<String>,
    /// Tag and layout parameters. Empty for templates.
    pub params: Vec<Parameter>,
    /// The model parameter of a template. `None` for tags and layouts.
    pub model: Option<Parameter>,
    /// Byte offset of the first body character.
    pub body_start: usize,
}

pub struct HeaderParser<'src> {
    source: &'src str,
}

struct RawHeader {
    imports: Vec<String>,
    params: Vec<(usize, Parameter)>,
    body_start: usize,
}

impl<'src> HeaderParser<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self { source }
    }

    /// Parse a top-level template header: any number of imports and exactly
    /// one `@param` naming the model type and the instance bound in the body.
    pub fn parse_template(&self) -> Result<ParsedHeader, HeaderError> {
        let raw = self.scan()?;
        let mut params = raw.params.into_iter();
        let Some((_, model)) = params.next() else {
            return Err(HeaderError::MissingParam);
        };
        if let Some((position, _)) = params.next() {
            return Err(HeaderError::DuplicateParam { position });
        }

        Ok(ParsedHeader {
            imports: raw.imports,
            params: Vec::new(),
            model: Some(model),
            body_start: raw.body_start,
        })
    }

    /// Parse a tag or layout header: any number of imports and parameters.
    pub fn parse_fragment(&self) -> Result<ParsedHeader, HeaderError> {
        let raw = self.scan()?;
        Ok(ParsedHeader {
            imports: raw.imports,
            params: raw.params.into_iter().map(|(_, param)| param).collect(),
            model: None,
            body_start: raw.body_start,
        })
    }

    fn scan(&self) -> Result<RawHeader, HeaderError> {
        let mut raw = RawHeader {
            imports: Vec::new(),
            params: Vec::new(),
            body_start: 0,
        };
        let mut current = 0;

        loop {
            let rest = &self.source[current..];
            let line_start = current + (rest.len() - rest.trim_start().len());
            let line_rest = &self.source[line_start..];

            let directive = if starts_with_directive(line_rest, IMPORT_DIRECTIVE) {
                IMPORT_DIRECTIVE
            } else if starts_with_directive(line_rest, PARAM_DIRECTIVE) {
                PARAM_DIRECTIVE
            } else {
                break;
            };

            let line_end = line_rest
                .find('\n')
                .map_or(self.source.len(), |idx| line_start + idx);
            let content = self.source[line_start + directive.len()..line_end].trim();

            if directive == IMPORT_DIRECTIVE {
                let path = content.trim_end_matches(';').trim();
                if path.is_empty() {
                    return Err(HeaderError::EmptyImport {
                        position: line_start,
                    });
                }
                raw.imports.push(path.to_string());
            } else {
                let param = parse_parameter(content, line_start)?;
                raw.params.push((line_start, param));
            }

            current = (line_end + 1).min(self.source.len());
            raw.body_start = current;
        }

        Ok(raw)
    }
}

fn starts_with_directive(line: &str, directive: &str) -> bool {
    line.strip_prefix(directive)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c == ' ' || c == '\t')
}

fn parse_parameter(content: &str, position: usize) -> Result<Parameter, HeaderError> {
    let malformed = |reason: &str| HeaderError::MalformedParam {
        position,
        reason: reason.to_string(),
    };

    let Some((name, ty)) = content.split_once(':') else {
        return Err(malformed("expected '<name>: <type>'"));
    };
    if ty.starts_with(':') {
        return Err(malformed("expected '<name>: <type>'"));
    }

    let name = name.trim();
    let ty = ty.trim();
    if !is_identifier(name) {
        return Err(malformed("parameter name must be an identifier"));
    }
    if ty.is_empty() {
        return Err(malformed("missing parameter type"));
    }

    Ok(Parameter {
        name: name.to_string(),
        ty: ty.to_string(),
    })
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            ty: ty.to_string(),
        }
    }

    mod template {
        use super::*;

        #[test]
        fn test_param_only() {
            let source = "@param page: Page\n<h1>${page.title}</h1>";
            let header = HeaderParser::new(source).parse_template().unwrap();
            assert_eq!(header.model, Some(param("page", "Page")));
            assert!(header.imports.is_empty());
            assert_eq!(&source[header.body_start..], "<h1>${page.title}</h1>");
        }

        #[test]
        fn test_imports_and_blank_lines() {
            let source = "@import crate::model::Page\n\n@import std::fmt;\n@param page: Page\n\nbody";
            let header = HeaderParser::new(source).parse_template().unwrap();
            assert_eq!(header.imports, vec!["crate::model::Page", "std::fmt"]);
            assert_eq!(&source[header.body_start..], "\nbody");
        }

        #[test]
        fn test_path_type() {
            let source = "@param items: Vec<crate::Item>\n";
            let header = HeaderParser::new(source).parse_template().unwrap();
            assert_eq!(header.model, Some(param("items", "Vec<crate::Item>")));
            assert_eq!(header.body_start, source.len());
        }

        #[test]
        fn test_header_without_trailing_newline() {
            let source = "@param page: Page";
            let header = HeaderParser::new(source).parse_template().unwrap();
            assert_eq!(header.body_start, source.len());
        }

        #[test]
        fn test_missing_param() {
            let source = "@import crate::Page\n<p>no param</p>";
            let err = HeaderParser::new(source).parse_template().unwrap_err();
            assert_eq!(err, HeaderError::MissingParam);
        }

        #[test]
        fn test_duplicate_param() {
            let source = "@param a: A\n@param b: B\n";
            let err = HeaderParser::new(source).parse_template().unwrap_err();
            assert_eq!(err, HeaderError::DuplicateParam { position: 12 });
        }

        #[test]
        fn test_malformed_param() {
            let source = "@param page\n";
            let err = HeaderParser::new(source).parse_template().unwrap_err();
            assert!(matches!(err, HeaderError::MalformedParam { position: 0, .. }));
        }

        #[test]
        fn test_missing_type() {
            let source = "@param page:  \n";
            let err = HeaderParser::new(source).parse_template().unwrap_err();
            assert!(matches!(err, HeaderError::MalformedParam { .. }));
        }

        #[test]
        fn test_path_separator_is_not_a_name() {
            let err = HeaderParser::new("@param page::Page\n")
                .parse_template()
                .unwrap_err();
            assert!(matches!(err, HeaderError::MalformedParam { .. }));
        }

        #[test]
        fn test_empty_import() {
            let source = "@param page: Page\n@import ;\n";
            let err = HeaderParser::new(source).parse_template().unwrap_err();
            assert_eq!(err, HeaderError::EmptyImport { position: 18 });
        }

        #[test]
        fn test_directive_needs_separator() {
            // `@imported` is body text, not an import.
            let source = "@param page: Page\n@imported stuff";
            let header = HeaderParser::new(source).parse_template().unwrap();
            assert!(header.imports.is_empty());
            assert_eq!(&source[header.body_start..], "@imported stuff");
        }
    }

    mod fragment {
        use super::*;

        #[test]
        fn test_no_directives() {
            let source = "  <b>bold</b>";
            let header = HeaderParser::new(source).parse_fragment().unwrap();
            assert_eq!(header, ParsedHeader::default());
            assert_eq!(&source[header.body_start..], source);
        }

        #[test]
        fn test_multiple_params_in_order() {
            let source = "@import crate::User\n@param user: &User\n@param highlight: bool\n<div></div>";
            let header = HeaderParser::new(source).parse_fragment().unwrap();
            assert_eq!(
                header.params,
                vec![param("user", "&User"), param("highlight", "bool")]
            );
            assert_eq!(header.imports, vec!["crate::User"]);
            assert_eq!(header.model, None);
            assert_eq!(&source[header.body_start..], "<div></div>");
        }

        #[test]
        fn test_malformed_param() {
            let source = "@param 1st: u8\n";
            let err = HeaderParser::new(source).parse_fragment().unwrap_err();
            assert!(matches!(err, HeaderError::MalformedParam { .. }));
        }
    }
}
