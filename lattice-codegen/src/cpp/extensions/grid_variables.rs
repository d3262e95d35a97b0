//! Index enumeration for grid-variable groups.

use super::{DataElementsOperation, StructContext};
use crate::cpp::declarations::{CustomDeclaration, DeclKind, DeclarationTree, NodeId};
use crate::error::CodegenError;

/// Template the hook is registered for.
pub const TEMPLATE: &str = "GridVariablesTemplate";

/// Anonymous `enum { a_index, b_index, index_count };`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridIndexEnum {
    /// Grid variable names, in declaration order.
    pub variables: Vec<String>,
}

impl GridIndexEnum {
    fn entries(&self) -> impl Iterator<Item = String> + '_ {
        self.variables
            .iter()
            .map(|v| format!("{v}_index"))
            .chain(std::iter::once("index_count".to_string()))
    }
}

impl CustomDeclaration for GridIndexEnum {
    fn kind(&self) -> &'static str {
        "grid index enum"
    }

    fn render(&self, _tree: &DeclarationTree, _id: NodeId, indent: &str) -> String {
        let entries: Vec<String> = self.entries().map(|e| format!("{indent}\t{e}")).collect();
        format!("{indent}enum {{\n{}\n{indent}}};", entries.join(",\n"))
    }

    fn reference_text(&self, _tree: &DeclarationTree, _id: NodeId) -> String {
        self.entries().collect::<Vec<_>>().join("\n")
    }
}

/// Declares the default elements, then the index enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridVariablesIndexEnum;

impl DataElementsOperation for GridVariablesIndexEnum {
    fn build_elements(&self, ctx: &mut StructContext<'_>, struct_id: NodeId) -> Result<(), CodegenError> {
        ctx.default_elements(struct_id);
        let variables = ctx.group.elements.iter().map(|e| e.name.clone()).collect();
        ctx.tree.add(
            struct_id,
            "",
            DeclKind::Custom(Box::new(GridIndexEnum { variables })),
        );
        Ok(())
    }
}
