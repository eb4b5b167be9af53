use std::fmt::Write as _;

use rtpl_source::Span;
use rtpl_source::TemplateResolver;
use rtpl_templates::ParseError;
use rtpl_templates::ParsedHeader;
use rtpl_templates::TemplateKind;
use rtpl_templates::Visitor;

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::names::Namespace;
use crate::names::QualifiedName;
use crate::unit::DependencySet;

const INDENT: &str = "    ";

/// Escape `text` for use inside a Rust `"..."` literal so that the literal
/// evaluates back to exactly `text`.
#[must_use]
pub fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\u{c}' => escaped.push_str("\\u{c}"),
            '\u{8}' => escaped.push_str("\\u{8}"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug)]
pub(crate) enum GenerateError {
    Parse(ParseError),
    Compile(CompileError),
}

impl From<ParseError> for GenerateError {
    fn from(err: ParseError) -> Self {
        GenerateError::Parse(err)
    }
}

impl From<CompileError> for GenerateError {
    fn from(err: CompileError) -> Self {
        GenerateError::Compile(err)
    }
}

/// Turns the event stream of one body into the statements of its `render`
/// function. Tag and layout calls re-enter the [`Compiler`] so the callee
/// lands in the same [`DependencySet`].
pub(crate) struct CodeGenerator<'a, R> {
    compiler: &'a Compiler<R>,
    units: &'a mut DependencySet,
    name: &'a QualifiedName,
    kind: TemplateKind,
    body: String,
    /// Depths of the `@layout` calls currently open in this body.
    layout_calls: Vec<usize>,
}

impl<'a, R: TemplateResolver> CodeGenerator<'a, R> {
    pub(crate) fn new(
        compiler: &'a Compiler<R>,
        units: &'a mut DependencySet,
        name: &'a QualifiedName,
        kind: TemplateKind,
    ) -> Self {
        Self {
            compiler,
            units,
            name,
            kind,
            body: String::new(),
            layout_calls: Vec::new(),
        }
    }

    fn indent(&self, depth: usize) -> usize {
        1 + depth + self.layout_calls.len()
    }

    fn line(&mut self, indent: usize, code: &str) {
        for _ in 0..indent {
            self.body.push_str(INDENT);
        }
        self.body.push_str(code);
        self.body.push('\n');
    }

    fn call(target: &QualifiedName, args: &str) -> String {
        if args.is_empty() {
            format!("{}::render(output", target.call_path())
        } else {
            format!("{}::render(output, {args}", target.call_path())
        }
    }

    /// Wrap the generated statements into a complete module.
    pub(crate) fn finish(self, header: &ParsedHeader, source_name: &str) -> String {
        let mut code = String::new();
        let _ = writeln!(code, "// Generated by rtpl from `{source_name}`. Do not edit.");
        code.push_str("#![allow(unused_imports, unused_mut, unused_variables, clippy::all)]\n\n");
        code.push_str("use rtpl_runtime::TemplateOutput;\n");
        for import in &header.imports {
            let _ = writeln!(code, "use {import};");
        }
        code.push('\n');

        match self.kind {
            TemplateKind::Template => {
                let (model, ty) = header
                    .model
                    .as_ref()
                    .map_or(("_model", "()"), |param| (param.name.as_str(), param.ty.as_str()));
                let _ = write!(
                    code,
                    "\
pub struct Template;

pub fn new() -> Box<dyn rtpl_runtime::Renderable> {{
    Box::new(Template)
}}

impl rtpl_runtime::Renderable for Template {{
    fn render(
        &self,
        model: &dyn std::any::Any,
        output: &mut dyn TemplateOutput,
    ) -> Result<(), rtpl_runtime::RenderError> {{
        let model = rtpl_runtime::downcast_model::<{ty}>(model)?;
        render(model, output);
        Ok(())
    }}
}}

pub fn render({model}: &{ty}, output: &mut dyn TemplateOutput) {{
"
                );
            }
            TemplateKind::Tag | TemplateKind::Layout => {
                code.push_str("pub fn render(output: &mut dyn TemplateOutput");
                for param in &header.params {
                    let _ = write!(code, ", {}: {}", param.name, param.ty);
                }
                if self.kind == TemplateKind::Layout {
                    code.push_str(", rtpl_sections: &mut rtpl_runtime::SectionLookup<'_>");
                }
                code.push_str(") {\n");
            }
        }

        code.push_str(&self.body);
        code.push_str("}\n");
        code
    }
}

impl<R: TemplateResolver> Visitor for CodeGenerator<'_, R> {
    type Error = GenerateError;

    fn visit_text(&mut self, depth: usize, text: &str, _span: Span) -> Result<(), Self::Error> {
        if !text.is_empty() {
            let indent = self.indent(depth);
            self.line(
                indent,
                &format!("output.write_safe(\"{}\");", escape_literal(text)),
            );
        }
        Ok(())
    }

    fn visit_code(&mut self, depth: usize, code: &str, _span: Span) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, &format!("output.write(&({code}));"));
        Ok(())
    }

    fn visit_statement(
        &mut self,
        depth: usize,
        code: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, &format!("{code};"));
        Ok(())
    }

    fn visit_condition_start(
        &mut self,
        depth: usize,
        condition: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, &format!("if {condition} {{"));
        Ok(())
    }

    fn visit_condition_else_if(
        &mut self,
        depth: usize,
        condition: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, &format!("}} else if {condition} {{"));
        Ok(())
    }

    fn visit_condition_else(&mut self, depth: usize, _span: Span) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, "} else {");
        Ok(())
    }

    fn visit_condition_end(&mut self, depth: usize, _span: Span) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, "}");
        Ok(())
    }

    fn visit_loop_start(
        &mut self,
        depth: usize,
        header: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, &format!("for {header} {{"));
        Ok(())
    }

    fn visit_loop_end(&mut self, depth: usize, _span: Span) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, "}");
        Ok(())
    }

    fn visit_tag_call(
        &mut self,
        depth: usize,
        name: &str,
        args: &str,
        span: Span,
    ) -> Result<(), Self::Error> {
        let target = self.compiler.compile_fragment(
            name,
            Namespace::Tags,
            self.units,
            self.name,
            span.start_usize(),
        )?;
        let indent = self.indent(depth);
        self.line(indent, &format!("{});", Self::call(&target, args)));
        Ok(())
    }

    fn visit_layout_call(
        &mut self,
        depth: usize,
        name: &str,
        args: &str,
        span: Span,
    ) -> Result<(), Self::Error> {
        let target = self.compiler.compile_fragment(
            name,
            Namespace::Layouts,
            self.units,
            self.name,
            span.start_usize(),
        )?;
        let indent = self.indent(depth);
        self.line(
            indent,
            &format!(
                "{}, &mut |rtpl_section: &str, output: &mut dyn rtpl_runtime::TemplateOutput| {{",
                Self::call(&target, args)
            ),
        );
        self.layout_calls.push(depth);
        self.line(indent + 1, "match rtpl_section {");
        Ok(())
    }

    fn visit_section_start(
        &mut self,
        depth: usize,
        name: &str,
        _span: Span,
    ) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        let in_caller = self
            .layout_calls
            .last()
            .is_some_and(|&call| call + 1 == depth);
        if in_caller {
            self.line(indent, &format!("\"{name}\" => {{"));
        } else {
            self.line(
                indent,
                &format!("if !rtpl_sections(\"{name}\", &mut *output) {{"),
            );
        }
        Ok(())
    }

    fn visit_section_end(&mut self, depth: usize, _span: Span) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent, "}");
        Ok(())
    }

    fn visit_layout_end(&mut self, depth: usize, _span: Span) -> Result<(), Self::Error> {
        let indent = self.indent(depth);
        self.line(indent + 1, "_ => return false,");
        self.line(indent, "}");
        self.line(indent, "true");
        self.layout_calls.pop();
        self.line(indent - 1, "});");
        Ok(())
    }
}
