//! Implementation tree.
//!
//! Mirrors the namespaces of a [`DeclarationTree`] and holds the definitions
//! the header only declares: `from_json` bodies, static metadata
//! initializers, the logger setter and member function overrides.

use crate::cpp::declarations::{DeclKind, DeclarationTree, FunctionFlavor, NodeId, escape_string};
use crate::cpp::extensions::ExtensionRegistry;
use crate::cpp::polymorphism::{DispatchStrategy, dispatch_lines};
use crate::error::CodegenError;
use crate::session::GeneratorOptions;

/// Stable index of a node in an [`ImplementationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImplId(usize);

/// Implementation node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplKind {
    /// `namespace name { ... }`
    Namespace {
        /// Namespace name.
        name: String,
    },
    /// Free `from_json` definition of a struct.
    StructSerialization {
        /// Deserialized struct.
        struct_name: String,
        /// Signature without the opening brace.
        signature: String,
    },
    /// Out-of-class definition of an overridden member function.
    MemberFunctionDefinition {
        /// Owning struct.
        owner: String,
        /// Signature without the opening brace.
        signature: String,
    },
    /// Statements reading one data element, inside a function body.
    ElementSerialization {
        /// Data element name.
        element: String,
        /// Statement lines, relative to the body indentation.
        lines: Vec<String>,
    },
    /// `const std::string_view Owner::name = "value";`
    StaticInitialization {
        /// Owning struct.
        owner: String,
        /// Member name.
        name: String,
        /// Initializer value.
        value: String,
    },
    /// Setter definition of an inline dependency.
    DependencyInitialization {
        /// Dependency name.
        name: String,
        /// Dependency type.
        cpp_type: String,
    },
}

/// A node of the implementation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplNode {
    /// Owning node (`None` for the root).
    pub parent: Option<ImplId>,
    /// Children in emission order.
    pub children: Vec<ImplId>,
    /// Declaration this entry was mirrored from.
    pub source: NodeId,
    /// Node kind.
    pub kind: ImplKind,
}

/// Arena-backed implementation tree.
#[derive(Debug, Clone)]
pub struct ImplementationTree {
    nodes: Vec<ImplNode>,
    factory_includes: Vec<String>,
}

impl ImplementationTree {
    /// Builds the implementation of a finished declaration tree.
    ///
    /// # Errors
    /// Returns `CodegenError` if an implementation extension fails.
    pub fn from_declarations(
        declarations: &DeclarationTree,
        options: &GeneratorOptions,
        extensions: &ExtensionRegistry,
    ) -> Result<Self, CodegenError> {
        let root = declarations.root();
        let mut tree = Self {
            nodes: vec![ImplNode {
                parent: None,
                children: Vec::new(),
                source: root,
                kind: ImplKind::Namespace {
                    name: declarations.node(root).name.clone(),
                },
            }],
            factory_includes: Vec::new(),
        };
        let entry = tree.root();
        tree.mirror_namespace(declarations, root, entry, options, extensions)?;
        Ok(tree)
    }

    fn mirror_namespace(
        &mut self,
        declarations: &DeclarationTree,
        namespace: NodeId,
        entry: ImplId,
        options: &GeneratorOptions,
        extensions: &ExtensionRegistry,
    ) -> Result<(), CodegenError> {
        for &child in declarations.children(namespace) {
            let node = declarations.node(child);
            match &node.kind {
                DeclKind::Namespace => {
                    let nested = self.add(
                        entry,
                        child,
                        ImplKind::Namespace {
                            name: node.name.clone(),
                        },
                    );
                    self.mirror_namespace(declarations, child, nested, options, extensions)?;
                }
                DeclKind::InlineDependency { cpp_type } => {
                    self.add(
                        entry,
                        child,
                        ImplKind::DependencyInitialization {
                            name: node.name.clone(),
                            cpp_type: cpp_type.clone(),
                        },
                    );
                }
                DeclKind::Struct { superclass } => {
                    self.define_struct(declarations, child, entry, options);
                    if let Some(superclass) = superclass
                        && let Some(op) = extensions.implementation_operation(&superclass.name)
                    {
                        tracing::debug!("Running implementation extension for '{}'", node.name);
                        op.process(declarations, child, self, entry)
                            .map_err(|e| e.in_extension(&superclass.name))?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn define_struct(
        &mut self,
        declarations: &DeclarationTree,
        struct_id: NodeId,
        entry: ImplId,
        options: &GeneratorOptions,
    ) {
        let owner = declarations.node(struct_id).name.clone();

        for &child in declarations.children(struct_id) {
            let node = declarations.node(child);
            if let DeclKind::StaticMetainfo { value } = &node.kind {
                self.add(
                    entry,
                    child,
                    ImplKind::StaticInitialization {
                        owner: owner.clone(),
                        name: node.name.clone(),
                        value: value.clone(),
                    },
                );
            }
        }

        if declarations.data_elements(struct_id).next().is_some() {
            let function = self.add(
                entry,
                struct_id,
                ImplKind::StructSerialization {
                    struct_name: owner.clone(),
                    signature: format!("void from_json({}, {owner}& x)", options.json_parameter()),
                },
            );
            for (id, decl) in declarations.data_elements(struct_id) {
                let field = &declarations.node(id).name;
                let lines = match &decl.selector {
                    Some(selector) => dispatch_lines(field, selector, DispatchStrategy::DirectConstruction),
                    None => vec![format!(
                        "json_get<{}>(j, logger.get(), \"{field}\", x.{field}, x.{field}_is_set, {});",
                        decl.cpp_type, decl.required
                    )],
                };
                self.add(
                    function,
                    id,
                    ImplKind::ElementSerialization {
                        element: field.clone(),
                        lines,
                    },
                );
            }
        }

        for &child in declarations.children(struct_id) {
            let DeclKind::Function(f) = &declarations.node(child).kind else {
                continue;
            };
            if f.flavor != FunctionFlavor::Override {
                continue;
            }
            let signature = f.signature();
            let reads_json = signature.takes(&options.json_type);
            let function = self.add(
                entry,
                child,
                ImplKind::MemberFunctionDefinition {
                    owner: owner.clone(),
                    signature: format!(
                        "{} {owner}::{}({})",
                        signature.return_type,
                        signature.name,
                        signature.arguments_without_defaults().join(", ")
                    ),
                },
            );
            // Element initialization reads `j`, so functions without a JSON
            // parameter get an empty body.
            if !reads_json {
                tracing::debug!("Override '{}::{}' takes no JSON parameter", owner, f.name);
                continue;
            }
            for (id, decl) in declarations.data_elements(struct_id) {
                let field = &declarations.node(id).name;
                let lines = match &decl.selector {
                    Some(selector) => {
                        self.record_factory_include(field);
                        dispatch_lines(field, selector, DispatchStrategy::FactoryDispatch)
                    }
                    None => vec![format!(
                        "json_get<{}>(j, logger.get(), \"{field}\", {field}, {field}_is_set, {});",
                        decl.cpp_type, decl.required
                    )],
                };
                self.add(
                    function,
                    id,
                    ImplKind::ElementSerialization {
                        element: field.clone(),
                        lines,
                    },
                );
            }
        }
    }

    fn record_factory_include(&mut self, field: &str) {
        let header = format!("{field}_factory.h");
        if !self.factory_includes.contains(&header) {
            self.factory_includes.push(header);
        }
    }

    /// Returns the root id.
    #[must_use]
    pub const fn root(&self) -> ImplId {
        ImplId(0)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if only the root exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Appends a node as the last child of `parent`.
    pub fn add(&mut self, parent: ImplId, source: NodeId, kind: ImplKind) -> ImplId {
        let id = ImplId(self.nodes.len());
        self.nodes.push(ImplNode {
            parent: Some(parent),
            children: Vec::new(),
            source,
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Returns a node.
    #[must_use]
    pub fn node(&self, id: ImplId) -> &ImplNode {
        &self.nodes[id.0]
    }

    /// Returns the children of a node.
    #[must_use]
    pub fn children(&self, id: ImplId) -> &[ImplId] {
        &self.nodes[id.0].children
    }

    /// Returns every node mirrored from the given declaration.
    #[must_use]
    pub fn entries_for(&self, source: NodeId) -> Vec<ImplId> {
        (0..self.nodes.len())
            .map(ImplId)
            .filter(|id| self.nodes[id.0].source == source)
            .collect()
    }

    /// Returns the factory headers polymorphic overrides depend on.
    #[must_use]
    pub fn factory_includes(&self) -> &[String] {
        &self.factory_includes
    }

    fn depth(&self, id: ImplId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent.0].parent;
        }
        depth
    }

    /// Renders a node and its subtree.
    #[must_use]
    pub fn render(&self, id: ImplId) -> String {
        let indent = "\t".repeat(self.depth(id));
        match &self.nodes[id.0].kind {
            ImplKind::Namespace { name } => {
                let body: Vec<String> = self.children(id).iter().map(|&c| self.render(c)).collect();
                format!("{indent}namespace {name} {{\n\n{}\n{indent}}}", body.join("\n\n"))
            }
            ImplKind::StructSerialization { signature, .. }
            | ImplKind::MemberFunctionDefinition { signature, .. } => {
                let mut output = format!("{indent}{signature} {{\n");
                for &c in self.children(id) {
                    output.push_str(&self.render(c));
                }
                output.push_str(&format!("{indent}}}"));
                output
            }
            ImplKind::ElementSerialization { lines, .. } => lines
                .iter()
                .map(|line| format!("{indent}{line}\n"))
                .collect(),
            ImplKind::StaticInitialization { owner, name, value } => format!(
                "{indent}const std::string_view {owner}::{name} = \"{}\";",
                escape_string(value)
            ),
            ImplKind::DependencyInitialization { name, cpp_type } => {
                format!("{indent}void set_{name}({cpp_type} value) {{ {name} = value; }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpp::declarations::{DataElementDecl, FunctionDecl, Superclass};
    use crate::cpp::extensions::ImplementationOperation;
    use crate::cpp::polymorphism::{DispatchCase, Selector};
    use lattice_schema::{QualifiedName, TypeReference};

    fn element(tree: &mut DeclarationTree, s: NodeId, name: &str, cpp_type: &str, required: bool) -> NodeId {
        tree.add(
            s,
            name,
            DeclKind::DataElement(DataElementDecl {
                ty: TypeReference::Primitive(cpp_type.to_string()),
                cpp_type: cpp_type.to_string(),
                required,
                selector: None,
            }),
        )
    }

    fn selector() -> Selector {
        let q = |name: &str| QualifiedName::new(name, "fan", "fan_ns");
        Selector {
            discriminant: "operation_speed_control_type".to_string(),
            cases: vec![DispatchCase {
                enumerator: "fan_ns::SpeedControlType::CONTINUOUS".to_string(),
                concrete: q("PerformanceMapContinuous"),
            }],
            base: q("PerformanceMapTemplate"),
        }
    }

    fn fan_tree() -> (DeclarationTree, NodeId, NodeId) {
        let mut tree = DeclarationTree::new("lattice");
        let ns = tree.add(tree.root(), "fan_ns", DeclKind::Namespace);
        tree.add(
            ns,
            "logger",
            DeclKind::InlineDependency {
                cpp_type: "std::shared_ptr<Courier::Courier>".to_string(),
            },
        );
        let s = tree.add(ns, "Performance", DeclKind::Struct { superclass: None });
        element(&mut tree, s, "fan_count", "int", true);
        tree.add(s, "fan_count_is_set", DeclKind::IsSetFlag);
        tree.add(
            s,
            "fan_count_units",
            DeclKind::StaticMetainfo {
                value: "-".to_string(),
            },
        );
        (tree, ns, s)
    }

    #[test]
    fn test_struct_serialization() {
        let (tree, _, _) = fan_tree();
        let implementation =
            ImplementationTree::from_declarations(&tree, &GeneratorOptions::default(), &ExtensionRegistry::default())
                .expect("Failed to build implementation");
        let text = implementation.render(implementation.root());

        assert!(text.starts_with("namespace lattice {\n\n\tnamespace fan_ns {"));
        assert!(text.contains(
            "\t\tvoid set_logger(std::shared_ptr<Courier::Courier> value) { logger = value; }"
        ));
        assert!(text.contains("\t\tconst std::string_view Performance::fan_count_units = \"-\";"));
        assert!(text.contains(
            "\t\tvoid from_json(const nlohmann::json& j, Performance& x) {\n\
             \t\t\tjson_get<int>(j, logger.get(), \"fan_count\", x.fan_count, x.fan_count_is_set, true);\n\
             \t\t}"
        ));
        assert!(implementation.factory_includes().is_empty());
    }

    #[test]
    fn test_direct_dispatch_in_from_json() {
        let (mut tree, _, s) = fan_tree();
        let map = tree.add(
            s,
            "performance_map",
            DeclKind::DataElement(DataElementDecl {
                ty: TypeReference::Primitive(String::new()),
                cpp_type: selector().pointer_type(),
                required: true,
                selector: Some(selector()),
            }),
        );
        let implementation =
            ImplementationTree::from_declarations(&tree, &GeneratorOptions::default(), &ExtensionRegistry::default())
                .expect("Failed to build implementation");

        let entries = implementation.entries_for(map);
        assert_eq!(entries.len(), 1);
        let text = implementation.render(entries[0]);
        assert!(text.starts_with(
            "\t\t\tif (x.operation_speed_control_type == fan_ns::SpeedControlType::CONTINUOUS) {\n"
        ));
        assert!(!text.contains("json_get"));
    }

    #[test]
    fn test_override_definition() {
        let mut tree = DeclarationTree::new("lattice");
        let ns = tree.add(tree.root(), "fan_ns", DeclKind::Namespace);
        let s = tree.add(
            ns,
            "Fan",
            DeclKind::Struct {
                superclass: Some(Superclass {
                    name: "RatingTemplate".to_string(),
                    spelled: "core_ns::RatingTemplate".to_string(),
                    external: true,
                }),
            },
        );
        element(&mut tree, s, "operation_speed_control_type", "fan_ns::SpeedControlType", true);
        tree.add(
            s,
            "performance_map",
            DeclKind::DataElement(DataElementDecl {
                ty: TypeReference::Primitive(String::new()),
                cpp_type: selector().pointer_type(),
                required: true,
                selector: Some(selector()),
            }),
        );
        tree.add(
            s,
            "initialize",
            DeclKind::Function(FunctionDecl {
                ret: "void".to_string(),
                name: "initialize".to_string(),
                args: vec!["const nlohmann::json& j".to_string(), "bool strict = false".to_string()],
                flavor: FunctionFlavor::Override,
            }),
        );

        let implementation =
            ImplementationTree::from_declarations(&tree, &GeneratorOptions::default(), &ExtensionRegistry::default())
                .expect("Failed to build implementation");
        let text = implementation.render(implementation.root());

        assert!(text.contains("\t\tvoid Fan::initialize(const nlohmann::json& j, bool strict) {\n"));
        assert!(text.contains(
            "\t\t\tjson_get<fan_ns::SpeedControlType>(j, logger.get(), \"operation_speed_control_type\", operation_speed_control_type, operation_speed_control_type_is_set, true);"
        ));
        assert!(text.contains(
            "\t\t\tperformance_map = performance_mapFactory::create(\"PerformanceMapContinuous\");"
        ));
        assert_eq!(implementation.factory_includes(), ["performance_map_factory.h"]);
    }

    struct CountingStatement;

    impl ImplementationOperation for CountingStatement {
        fn process(
            &self,
            declarations: &DeclarationTree,
            source: NodeId,
            implementation: &mut ImplementationTree,
            entry: ImplId,
        ) -> Result<(), CodegenError> {
            let name = &declarations.node(source).name;
            implementation.add(
                entry,
                source,
                ImplKind::StaticInitialization {
                    owner: name.clone(),
                    name: "kind".to_string(),
                    value: "rating".to_string(),
                },
            );
            Ok(())
        }
    }

    #[test]
    fn test_implementation_extension_runs() {
        let mut tree = DeclarationTree::new("lattice");
        let ns = tree.add(tree.root(), "fan_ns", DeclKind::Namespace);
        tree.add(
            ns,
            "Fan",
            DeclKind::Struct {
                superclass: Some(Superclass {
                    name: "RatingTemplate".to_string(),
                    spelled: "RatingTemplate".to_string(),
                    external: false,
                }),
            },
        );
        let registry = ExtensionRegistry::builder()
            .implementation_operation("RatingTemplate", CountingStatement)
            .build();

        let implementation =
            ImplementationTree::from_declarations(&tree, &GeneratorOptions::default(), &registry)
                .expect("Failed to build implementation");
        assert!(implementation
            .render(implementation.root())
            .contains("const std::string_view Fan::kind = \"rating\";"));
    }

    #[test]
    fn test_override_without_json_parameter() {
        let mut tree = DeclarationTree::new("lattice");
        let ns = tree.add(tree.root(), "fan_ns", DeclKind::Namespace);
        let s = tree.add(
            ns,
            "Fan",
            DeclKind::Struct {
                superclass: Some(Superclass {
                    name: "RatingTemplate".to_string(),
                    spelled: "core_ns::RatingTemplate".to_string(),
                    external: true,
                }),
            },
        );
        element(&mut tree, s, "operation_speed_control_type", "fan_ns::SpeedControlType", true);
        tree.add(
            s,
            "performance_map",
            DeclKind::DataElement(DataElementDecl {
                ty: TypeReference::Primitive(String::new()),
                cpp_type: selector().pointer_type(),
                required: true,
                selector: Some(selector()),
            }),
        );
        tree.add(
            s,
            "reset",
            DeclKind::Function(FunctionDecl {
                ret: "void".to_string(),
                name: "reset".to_string(),
                args: vec!["int stage = 0".to_string()],
                flavor: FunctionFlavor::Override,
            }),
        );

        let implementation =
            ImplementationTree::from_declarations(&tree, &GeneratorOptions::default(), &ExtensionRegistry::default())
                .expect("Failed to build implementation");
        let text = implementation.render(implementation.root());

        assert!(text.contains("\t\tvoid Fan::reset(int stage) {\n\t\t}"));
        assert!(!text.contains("Factory::create"));
        assert!(!text.contains("->initialize(j.at("));
        assert!(implementation.factory_includes().is_empty());
    }

    struct RejectingStatement;

    impl ImplementationOperation for RejectingStatement {
        fn process(
            &self,
            _declarations: &DeclarationTree,
            _source: NodeId,
            _implementation: &mut ImplementationTree,
            _entry: ImplId,
        ) -> Result<(), CodegenError> {
            Err(CodegenError::generation("rating has no units"))
        }
    }

    #[test]
    fn test_implementation_extension_failure_names_template() {
        let mut tree = DeclarationTree::new("lattice");
        let ns = tree.add(tree.root(), "fan_ns", DeclKind::Namespace);
        tree.add(
            ns,
            "Fan",
            DeclKind::Struct {
                superclass: Some(Superclass {
                    name: "RatingTemplate".to_string(),
                    spelled: "RatingTemplate".to_string(),
                    external: false,
                }),
            },
        );
        let registry = ExtensionRegistry::builder()
            .implementation_operation("RatingTemplate", RejectingStatement)
            .build();

        let result = ImplementationTree::from_declarations(&tree, &GeneratorOptions::default(), &registry);
        assert!(matches!(
            result,
            Err(CodegenError::Extension { template, message })
                if template == "RatingTemplate" && message.contains("rating has no units")
        ));
    }
}
