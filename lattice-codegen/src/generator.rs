//! Generator driving header and implementation translation.

use crate::cpp::header::HeaderTranslator;
use crate::cpp::implementation::ImplementationTree;
use crate::diagnostic::Diagnostic;
use crate::error::CodegenError;
use crate::session::CompilationSession;
use lattice_schema::{SchemaIr, kebab_style};

/// Output of one translated schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    /// Header file name (`fan.h`).
    pub header_name: String,
    /// Header text.
    pub header: String,
    /// Implementation text.
    pub implementation: String,
    /// Non-fatal problems found during translation.
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedCode {
    /// Returns true if translation produced no diagnostics.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Code generator for one compilation session.
pub struct Generator<'a> {
    session: &'a CompilationSession,
}

impl<'a> Generator<'a> {
    /// Creates a new generator.
    #[must_use]
    pub fn new(session: &'a CompilationSession) -> Self {
        Self { session }
    }

    /// Generates the header and implementation of a resolved schema.
    ///
    /// # Errors
    /// Returns `CodegenError` if translation fails.
    pub fn generate(&self, ir: &SchemaIr) -> Result<GeneratedCode, CodegenError> {
        let options = self.session.options();
        let translated = HeaderTranslator::new(self.session).translate(ir)?;
        let implementation =
            ImplementationTree::from_declarations(&translated.tree, options, self.session.extensions())?;

        let mut source = format!("#include <{}.h>\n", kebab_style(&ir.schema_name));
        source.push_str(&format!("#include <{}>\n", options.support_include));
        for include in implementation.factory_includes() {
            source.push_str(&format!("#include <{include}>\n"));
        }
        source.push('\n');
        source.push_str(&implementation.render(implementation.root()));
        source.push('\n');

        tracing::info!(
            "Generated {} ({} declarations, {} diagnostics)",
            ir.header_name(),
            translated.tree.len(),
            translated.diagnostics.len()
        );

        Ok(GeneratedCode {
            header_name: ir.header_name(),
            header: translated.render(&options.generated_note),
            implementation: source,
            diagnostics: translated.diagnostics,
        })
    }
}
