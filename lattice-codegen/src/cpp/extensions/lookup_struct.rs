//! Struct-of-values companion for lookup-variable groups.
//!
//! A group deriving from `LookupVariablesTemplate` holds one array per
//! looked-up quantity. Interpolation returns one value per quantity, so the
//! group also gets a sibling `<Name>Struct` with a scalar member per array.

use super::{DataGroupOperation, StructContext};
use crate::cpp::declarations::{CustomDeclaration, DeclKind, DeclarationTree, NodeId};
use crate::error::CodegenError;
use lattice_schema::TypeReference;

/// Template the hook is registered for.
pub const TEMPLATE: &str = "LookupVariablesTemplate";

/// `struct <Name>Struct { T member; ... };`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupStruct {
    /// `(cpp type, member name)` pairs.
    pub members: Vec<(String, String)>,
}

impl CustomDeclaration for LookupStruct {
    fn kind(&self) -> &'static str {
        "lookup struct"
    }

    fn render(&self, tree: &DeclarationTree, id: NodeId, indent: &str) -> String {
        let mut output = format!("{indent}struct {} {{\n", tree.node(id).name);
        for (cpp_type, name) in &self.members {
            output.push_str(&format!("{indent}\t{cpp_type} {name};\n"));
        }
        output.push_str(&format!("{indent}}};"));
        output
    }

    fn reference_text(&self, tree: &DeclarationTree, id: NodeId) -> String {
        std::iter::once(format!("struct {}", tree.node(id).name))
            .chain(self.members.iter().map(|(t, n)| format!("{t} {n}")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Declares the group normally and adds its lookup struct.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupStructOperation;

impl DataGroupOperation for LookupStructOperation {
    fn build_group(&self, ctx: &mut StructContext<'_>) -> Result<NodeId, CodegenError> {
        let struct_id = ctx.default_struct();

        let members = ctx
            .group
            .elements
            .iter()
            .filter_map(|element| match &element.ty {
                TypeReference::ArrayOf(inner) => Some((inner.cpp_type(), element.name.clone())),
                _ => None,
            })
            .collect();

        ctx.tree.add(
            ctx.namespace,
            format!("{}Struct", ctx.group.name),
            DeclKind::Custom(Box::new(LookupStruct { members })),
        );
        Ok(struct_id)
    }
}
