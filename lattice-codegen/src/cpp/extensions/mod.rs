//! Extension registry.
//!
//! Extensions customize translation of the data groups deriving from one
//! Data Group Template. They are registered on an [`ExtensionRegistryBuilder`]
//! and frozen into an [`ExtensionRegistry`] before any translation starts;
//! the frozen registry is read-only and can be shared between sessions.

pub mod grid_variables;
pub mod lookup_struct;
pub mod performance_map;

pub use grid_variables::GridVariablesIndexEnum;
pub use lookup_struct::LookupStructOperation;
pub use performance_map::PerformanceMapOverloads;

use crate::cpp::declarations::{
    DataElementDecl, DeclKind, DeclarationTree, NodeId, Superclass,
};
use crate::cpp::implementation::{ImplId, ImplementationTree};
use crate::error::CodegenError;
use lattice_schema::ResolvedGroup;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// State handed to group and element hooks while one data group is built.
pub struct StructContext<'a> {
    /// Tree under construction.
    pub tree: &'a mut DeclarationTree,
    /// Schema namespace node the group is declared in.
    pub namespace: NodeId,
    /// Group being translated.
    pub group: &'a ResolvedGroup,
    /// Base class, if the group derives from a template.
    pub superclass: Option<Superclass>,
}

impl StructContext<'_> {
    /// Declares the group's struct the default way and returns it.
    pub fn default_struct(&mut self) -> NodeId {
        self.tree.add(
            self.namespace,
            &self.group.name,
            DeclKind::Struct {
                superclass: self.superclass.clone(),
            },
        )
    }

    /// Declares each element of the group inside `struct_id`: the typed
    /// member, its is-set flag and its units, description and name metadata.
    pub fn default_elements(&mut self, struct_id: NodeId) {
        for element in &self.group.elements {
            let name = &element.name;
            self.tree.add(
                struct_id,
                name,
                DeclKind::DataElement(DataElementDecl {
                    ty: element.ty.clone(),
                    cpp_type: element.ty.cpp_type(),
                    required: element.required.is_required(),
                    selector: None,
                }),
            );
            self.tree.add(struct_id, format!("{name}_is_set"), DeclKind::IsSetFlag);
            for (suffix, value) in [
                ("units", element.units.clone().unwrap_or_default()),
                ("description", element.description.clone().unwrap_or_default()),
                ("name", name.clone()),
            ] {
                self.tree.add(
                    struct_id,
                    format!("{name}_{suffix}"),
                    DeclKind::StaticMetainfo { value },
                );
            }
        }
    }
}

/// Replaces default struct construction for a whole data group.
pub trait DataGroupOperation: Send + Sync {
    /// Declares the group and returns the struct its elements belong to.
    ///
    /// # Errors
    /// Returns `CodegenError` if the group cannot be translated.
    fn build_group(&self, ctx: &mut StructContext<'_>) -> Result<NodeId, CodegenError>;
}

/// Replaces or augments the declaration of a group's element set.
pub trait DataElementsOperation: Send + Sync {
    /// Declares the elements of the group inside `struct_id`.
    ///
    /// # Errors
    /// Returns `CodegenError` if the elements cannot be translated.
    fn build_elements(&self, ctx: &mut StructContext<'_>, struct_id: NodeId) -> Result<(), CodegenError>;
}

/// Runs once after every group is declared, with all siblings visible.
pub trait PostPassOperation: Send + Sync {
    /// Visits the schema namespace.
    ///
    /// # Errors
    /// Returns `CodegenError` if synthesis fails.
    fn visit(&self, tree: &mut DeclarationTree, namespace: NodeId) -> Result<(), CodegenError>;
}

/// Adds statements to implementation entries of derived groups.
pub trait ImplementationOperation: Send + Sync {
    /// Called once per struct deriving from the template; `entry` is the
    /// namespace entry the struct's definitions were added to.
    ///
    /// # Errors
    /// Returns `CodegenError` if the statements cannot be produced.
    fn process(
        &self,
        declarations: &DeclarationTree,
        source: NodeId,
        implementation: &mut ImplementationTree,
        entry: ImplId,
    ) -> Result<(), CodegenError>;
}

/// Builder collecting extension hooks keyed by template name.
#[derive(Default)]
pub struct ExtensionRegistryBuilder {
    group_operations: HashMap<String, Arc<dyn DataGroupOperation>>,
    element_operations: HashMap<String, Arc<dyn DataElementsOperation>>,
    post_passes: HashMap<String, Arc<dyn PostPassOperation>>,
    implementation_operations: HashMap<String, Arc<dyn ImplementationOperation>>,
}

fn register<T: ?Sized>(map: &mut HashMap<String, Arc<T>>, kind: &str, template: String, op: Arc<T>) {
    if map.insert(template.clone(), op).is_some() {
        tracing::warn!("Replacing {} extension for template '{}'", kind, template);
    }
}

impl ExtensionRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a data group hook.
    #[must_use]
    pub fn group_operation<O: DataGroupOperation + 'static>(mut self, template: impl Into<String>, op: O) -> Self {
        let op: Arc<dyn DataGroupOperation> = Arc::new(op);
        register(&mut self.group_operations, "group", template.into(), op);
        self
    }

    /// Registers a data elements hook.
    #[must_use]
    pub fn elements_operation<O: DataElementsOperation + 'static>(
        mut self,
        template: impl Into<String>,
        op: O,
    ) -> Self {
        let op: Arc<dyn DataElementsOperation> = Arc::new(op);
        register(&mut self.element_operations, "elements", template.into(), op);
        self
    }

    /// Registers a post-pass.
    #[must_use]
    pub fn post_pass<O: PostPassOperation + 'static>(mut self, template: impl Into<String>, op: O) -> Self {
        let op: Arc<dyn PostPassOperation> = Arc::new(op);
        register(&mut self.post_passes, "post-pass", template.into(), op);
        self
    }

    /// Registers an implementation hook.
    #[must_use]
    pub fn implementation_operation<O: ImplementationOperation + 'static>(
        mut self,
        template: impl Into<String>,
        op: O,
    ) -> Self {
        let op: Arc<dyn ImplementationOperation> = Arc::new(op);
        register(&mut self.implementation_operations, "implementation", template.into(), op);
        self
    }

    /// Registers the bundled extensions for the lookup-variables,
    /// grid-variables and performance-map templates.
    #[must_use]
    pub fn with_stock_extensions(self) -> Self {
        self.group_operation(lookup_struct::TEMPLATE, LookupStructOperation)
            .elements_operation(grid_variables::TEMPLATE, GridVariablesIndexEnum)
            .post_pass(performance_map::TEMPLATE, PerformanceMapOverloads)
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> ExtensionRegistry {
        ExtensionRegistry {
            group_operations: self.group_operations,
            element_operations: self.element_operations,
            post_passes: self.post_passes,
            implementation_operations: self.implementation_operations,
        }
    }
}

/// Read-only extension tables keyed by template name.
#[derive(Default)]
pub struct ExtensionRegistry {
    group_operations: HashMap<String, Arc<dyn DataGroupOperation>>,
    element_operations: HashMap<String, Arc<dyn DataElementsOperation>>,
    post_passes: HashMap<String, Arc<dyn PostPassOperation>>,
    implementation_operations: HashMap<String, Arc<dyn ImplementationOperation>>,
}

impl ExtensionRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> ExtensionRegistryBuilder {
        ExtensionRegistryBuilder::new()
    }

    /// Returns the data group hook for a template.
    #[must_use]
    pub fn group_operation(&self, template: &str) -> Option<&dyn DataGroupOperation> {
        self.group_operations.get(template).map(Arc::as_ref)
    }

    /// Returns the data elements hook for a template.
    #[must_use]
    pub fn elements_operation(&self, template: &str) -> Option<&dyn DataElementsOperation> {
        self.element_operations.get(template).map(Arc::as_ref)
    }

    /// Returns the post-pass for a template.
    #[must_use]
    pub fn post_pass(&self, template: &str) -> Option<&dyn PostPassOperation> {
        self.post_passes.get(template).map(Arc::as_ref)
    }

    /// Returns the implementation hook for a template.
    #[must_use]
    pub fn implementation_operation(&self, template: &str) -> Option<&dyn ImplementationOperation> {
        self.implementation_operations.get(template).map(Arc::as_ref)
    }

    /// Returns true if no hook is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group_operations.is_empty()
            && self.element_operations.is_empty()
            && self.post_passes.is_empty()
            && self.implementation_operations.is_empty()
    }

    /// Returns every template with at least one hook, sorted.
    #[must_use]
    pub fn templates(&self) -> Vec<&str> {
        let mut templates: Vec<&str> = self
            .group_operations
            .keys()
            .chain(self.element_operations.keys())
            .chain(self.post_passes.keys())
            .chain(self.implementation_operations.keys())
            .map(String::as_str)
            .collect();
        templates.sort_unstable();
        templates.dedup();
        templates
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("templates", &self.templates())
            .finish()
    }
}
