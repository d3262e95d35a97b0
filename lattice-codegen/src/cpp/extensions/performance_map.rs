//! `calculate_performance` overloads for performance maps.
//!
//! A `PerformanceMap<X>` struct whose namespace also declares
//! `GridVariables<X>` and `LookupVariables<X>` gets an overload taking one
//! `double` per grid variable and returning `LookupVariables<X>Struct`.

use super::PostPassOperation;
use super::grid_variables::TEMPLATE as GRID_VARIABLES_TEMPLATE;
use super::lookup_struct::TEMPLATE as LOOKUP_VARIABLES_TEMPLATE;
use crate::cpp::declarations::{CustomDeclaration, DeclKind, DeclarationTree, NodeId};
use crate::error::CodegenError;

/// Template the pass is registered for.
pub const TEMPLATE: &str = "PerformanceMapTemplate";

const INTERPOLATION_ARGUMENT: &str =
    "Btwxt::Method performance_interpolation_method = Btwxt::Method::LINEAR";

/// Using-declaration plus the overload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatePerformanceOverload {
    /// Lookup struct returned by the overload.
    pub return_type: String,
    /// Parameter declarations.
    pub arguments: Vec<String>,
}

impl CustomDeclaration for CalculatePerformanceOverload {
    fn kind(&self) -> &'static str {
        "performance overload"
    }

    fn render(&self, tree: &DeclarationTree, id: NodeId, indent: &str) -> String {
        let name = &tree.node(id).name;
        format!(
            "{indent}using {TEMPLATE}::{name};\n{indent}{} {name}({});",
            self.return_type,
            self.arguments.join(", ")
        )
    }

    fn reference_text(&self, _tree: &DeclarationTree, _id: NodeId) -> String {
        format!("{TEMPLATE} {} {}", self.return_type, self.arguments.join(" "))
    }
}

/// Adds `calculate_performance` overloads to performance map structs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceMapOverloads;

fn sibling_with_template(
    tree: &DeclarationTree,
    namespace: NodeId,
    name: &str,
    template: &str,
) -> Option<NodeId> {
    tree.structs(namespace)
        .find(|(id, superclass)| {
            tree.node(*id).name == name && superclass.is_some_and(|s| s.name == template)
        })
        .map(|(id, _)| id)
}

impl PostPassOperation for PerformanceMapOverloads {
    fn visit(&self, tree: &mut DeclarationTree, namespace: NodeId) -> Result<(), CodegenError> {
        let maps: Vec<(NodeId, String)> = tree
            .structs(namespace)
            .filter(|(_, superclass)| superclass.is_some_and(|s| s.name == TEMPLATE))
            .filter_map(|(id, _)| {
                tree.node(id)
                    .name
                    .strip_prefix("PerformanceMap")
                    .map(|suffix| (id, suffix.to_string()))
            })
            .collect();

        for (map, suffix) in maps {
            let lookup = format!("LookupVariables{suffix}");
            let grid = format!("GridVariables{suffix}");
            if sibling_with_template(tree, namespace, &lookup, LOOKUP_VARIABLES_TEMPLATE).is_none() {
                tracing::debug!("No {} next to {}", lookup, tree.node(map).name);
                continue;
            }
            let Some(grid_id) = sibling_with_template(tree, namespace, &grid, GRID_VARIABLES_TEMPLATE)
            else {
                tracing::debug!("No {} next to {}", grid, tree.node(map).name);
                continue;
            };

            let arguments = tree
                .data_elements(grid_id)
                .map(|(id, _)| format!("double {}", tree.node(id).name))
                .chain(std::iter::once(INTERPOLATION_ARGUMENT.to_string()))
                .collect();
            tree.add(
                map,
                "calculate_performance",
                DeclKind::Custom(Box::new(CalculatePerformanceOverload {
                    return_type: format!("{lookup}Struct"),
                    arguments,
                })),
            );
        }
        Ok(())
    }
}
