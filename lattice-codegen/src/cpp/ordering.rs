//! Dependency ordering of sibling declarations.
//!
//! Sibling `A` must precede sibling `B` when `A`'s name occurs as a whole
//! word in the reference text of `B` or any of `B`'s descendants. The
//! resulting graph is sorted with Kahn's algorithm; among ready nodes the one
//! declared first goes first, so untouched siblings keep their relative
//! order.

use crate::cpp::declarations::{DeclarationTree, NodeId};
use crate::error::CodegenError;
use regex::Regex;
use std::collections::BTreeSet;

/// Builds the dependency graph over the children of `parent`.
///
/// `edges[a]` lists the child positions that must come after child `a`.
///
/// # Errors
/// Returns `CodegenError::Generation` if a name cannot be turned into a
/// search pattern.
pub fn dependency_edges(tree: &DeclarationTree, parent: NodeId) -> Result<Vec<Vec<usize>>, CodegenError> {
    let children = tree.children(parent);
    let texts: Vec<String> = children.iter().map(|&c| tree.reference_text(c)).collect();

    let mut edges = vec![Vec::new(); children.len()];
    for (a, &child) in children.iter().enumerate() {
        let name = &tree.node(child).name;
        if name.is_empty() {
            continue;
        }
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
            .map_err(|e| CodegenError::generation(format!("bad pattern for '{name}': {e}")))?;
        for (b, text) in texts.iter().enumerate() {
            if a != b && pattern.is_match(text) {
                edges[a].push(b);
            }
        }
    }
    Ok(edges)
}

/// Reorders the children of `parent` so every declaration precedes its users.
///
/// # Errors
/// Returns `CodegenError::CyclicDeclarations` if siblings reference each
/// other.
pub fn order_children(tree: &mut DeclarationTree, parent: NodeId) -> Result<(), CodegenError> {
    let edges = dependency_edges(tree, parent)?;
    let children = tree.children(parent).to_vec();

    let mut in_degree = vec![0usize; children.len()];
    for targets in &edges {
        for &b in targets {
            in_degree[b] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..children.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(children.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &b in &edges[next] {
            in_degree[b] -= 1;
            if in_degree[b] == 0 {
                ready.insert(b);
            }
        }
    }

    if order.len() < children.len() {
        let names = (0..children.len())
            .filter(|i| in_degree[*i] > 0)
            .map(|i| tree.node(children[i]).name.clone())
            .collect();
        return Err(CodegenError::CyclicDeclarations {
            namespace: tree.node(parent).name.clone(),
            names,
        });
    }

    if order.iter().enumerate().any(|(position, &i)| position != i) {
        tracing::debug!("Reordered children of '{}'", tree.node(parent).name);
    }
    tree.set_children(parent, order.into_iter().map(|i| children[i]).collect());
    Ok(())
}
