//! Polymorphism resolver.
//!
//! A data element whose type is an alternation is declared as an owning
//! pointer to the shared base template. Expansion attaches a discriminant
//! table to each such element; the implementation tree turns the table into
//! dispatch statements.

use crate::cpp::declarations::{DeclKind, DeclarationTree, NodeId};
use crate::error::CodegenError;
use lattice_schema::{Alternation, QualifiedName, TypeReference};

/// One discriminant branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCase {
    /// Scoped enumerator (`fan_ns::SpeedControlType::CONTINUOUS`).
    pub enumerator: String,
    /// Concrete data group.
    pub concrete: QualifiedName,
}

/// Discriminant table of a polymorphic data element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Sibling data element holding the discriminant.
    pub discriminant: String,
    /// Branches, in constraint order.
    pub cases: Vec<DispatchCase>,
    /// Base template.
    pub base: QualifiedName,
}

impl Selector {
    /// Builds the table of a resolved alternation.
    #[must_use]
    pub fn from_alternation(alternation: &Alternation) -> Self {
        Self {
            discriminant: alternation.discriminant.clone(),
            cases: alternation
                .cases
                .iter()
                .map(|case| DispatchCase {
                    enumerator: alternation.scoped_enumerator(case),
                    concrete: case.concrete.clone(),
                })
                .collect(),
            base: alternation.base_template.clone(),
        }
    }

    /// Returns the declared pointer type.
    #[must_use]
    pub fn pointer_type(&self) -> String {
        format!("std::unique_ptr<{}>", self.base)
    }

    /// Returns the number of branches.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.cases.len()
    }
}

/// How a polymorphic member is constructed from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// Allocate the concrete type and deserialize into it (`from_json`).
    DirectConstruction,
    /// Ask the runtime factory registered for the member to create the
    /// concrete type by name, then let it initialize itself.
    FactoryDispatch,
}

/// Attaches discriminant tables to every alternation-typed data element
/// below `scope`.
///
/// Returns the number of expanded elements.
///
/// # Errors
/// Returns `CodegenError::Generation` if a discriminant is not a sibling of
/// its polymorphic element.
pub fn expand(tree: &mut DeclarationTree, scope: NodeId) -> Result<usize, CodegenError> {
    let targets: Vec<(NodeId, Selector)> = tree
        .descendants(scope)
        .into_iter()
        .filter_map(|id| match &tree.node(id).kind {
            DeclKind::DataElement(decl) => match &decl.ty {
                TypeReference::Alternation(alt) => Some((id, Selector::from_alternation(alt))),
                _ => None,
            },
            _ => None,
        })
        .collect();

    for (id, selector) in &targets {
        let node = tree.node(*id);
        let owner = node.parent.ok_or_else(|| {
            CodegenError::generation(format!("polymorphic element '{}' has no owner", node.name))
        })?;
        if tree.find_child(owner, &selector.discriminant).is_none() {
            return Err(CodegenError::generation(format!(
                "discriminant '{}' of '{}' is not declared in '{}'",
                selector.discriminant,
                node.name,
                tree.node(owner).name
            )));
        }
        tracing::debug!(
            "Expanding '{}' into {} with {} branches",
            node.name,
            selector.pointer_type(),
            selector.arity()
        );
    }

    let count = targets.len();
    for (id, selector) in targets {
        if let DeclKind::DataElement(decl) = &mut tree.node_mut(id).kind {
            decl.cpp_type = selector.pointer_type();
            decl.selector = Some(selector);
        }
    }
    Ok(count)
}

/// Returns the dispatch statements for a polymorphic member.
///
/// Direct construction addresses the member through the deserialized object
/// `x`; factory dispatch runs inside a member function and uses the member
/// directly.
#[must_use]
pub fn dispatch_lines(field: &str, selector: &Selector, strategy: DispatchStrategy) -> Vec<String> {
    let discriminant = &selector.discriminant;
    let mut lines = Vec::with_capacity(selector.arity() * 6);
    for case in &selector.cases {
        let enumerator = &case.enumerator;
        match strategy {
            DispatchStrategy::DirectConstruction => {
                let concrete = case.concrete.to_string();
                lines.push(format!("if (x.{discriminant} == {enumerator}) {{"));
                lines.push(format!("\tx.{field} = std::make_unique<{concrete}>();"));
                lines.push(format!("\tif (x.{field}) {{"));
                lines.push(format!(
                    "\t\tfrom_json(j.at(\"{field}\"), *dynamic_cast<{concrete}*>(x.{field}.get()));"
                ));
                lines.push("\t}".to_string());
                lines.push("}".to_string());
            }
            DispatchStrategy::FactoryDispatch => {
                lines.push(format!("if ({discriminant} == {enumerator}) {{"));
                lines.push(format!(
                    "\t{field} = {field}Factory::create(\"{}\");",
                    case.concrete.name
                ));
                lines.push(format!("\tif ({field}) {{"));
                lines.push(format!("\t\t{field}->initialize(j.at(\"{field}\"));"));
                lines.push("\t}".to_string());
                lines.push("}".to_string());
            }
        }
    }
    lines
}
