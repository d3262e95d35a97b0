//! Declaration tree.
//!
//! Nodes live in an arena owned by [`DeclarationTree`] and are referenced by
//! [`NodeId`]. Every node except the root has exactly one parent; reordering
//! siblings only permutes a parent's child list, so ids stay stable across
//! passes.

use crate::cpp::polymorphism::Selector;
use crate::interfaces::MethodSignature;
use lattice_schema::TypeReference;
use std::fmt;

/// Stable index of a node in a [`DeclarationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One enumerator with its info-table text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratorEntry {
    /// Enumerator name.
    pub name: String,
    /// Display text (defaults to the name).
    pub display_text: String,
    /// Description.
    pub description: String,
}

/// Base class of a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superclass {
    /// Unqualified template name.
    pub name: String,
    /// Name as written after the colon (qualified when external).
    pub spelled: String,
    /// True if the template is declared by another schema.
    pub external: bool,
}

/// A typed data member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataElementDecl {
    /// Resolved schema type.
    pub ty: TypeReference,
    /// Declared C++ type.
    pub cpp_type: String,
    /// Statically required.
    pub required: bool,
    /// Discriminant table, attached by polymorphism expansion.
    pub selector: Option<Selector>,
}

/// How a function declaration is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionFlavor {
    /// `ret name(args);`
    Plain,
    /// `ret name(args) override;`
    Override,
    /// `virtual ret name(args) = 0;`
    PureVirtual,
    /// `virtual ~Name() = default;`
    VirtualDestructor,
    /// Free `from_json` declaration for a struct.
    Serialization,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    /// Return type (empty for destructors).
    pub ret: String,
    /// Function name.
    pub name: String,
    /// Parameter declarations.
    pub args: Vec<String>,
    /// Spelling.
    pub flavor: FunctionFlavor,
}

impl FunctionDecl {
    /// Declares a base-class member function with the given spelling.
    #[must_use]
    pub fn from_signature(method: &MethodSignature, flavor: FunctionFlavor) -> Self {
        Self {
            ret: method.return_type.clone(),
            name: method.name.clone(),
            args: method.arguments.clone(),
            flavor,
        }
    }

    /// Returns the declaration as a member function signature.
    #[must_use]
    pub fn signature(&self) -> MethodSignature {
        MethodSignature::new(&self.ret, &self.name, self.args.iter().cloned())
    }

    /// Returns the parenthesized parameter list.
    #[must_use]
    pub fn parameter_list(&self) -> String {
        format!("({})", self.args.join(", "))
    }
}

/// Declaration kinds an extension can add without changing this module.
pub trait CustomDeclaration: Send + Sync + fmt::Debug {
    /// Short kind label, used in logs.
    fn kind(&self) -> &'static str;

    /// Renders the node at the given indentation.
    fn render(&self, tree: &DeclarationTree, id: NodeId, indent: &str) -> String;

    /// Text searched for sibling names during dependency ordering.
    fn reference_text(&self, tree: &DeclarationTree, id: NodeId) -> String;
}

/// Node kinds.
#[derive(Debug)]
pub enum DeclKind {
    /// `namespace name { ... }`
    Namespace,
    /// `typedef target name;`
    Typedef {
        /// Aliased type.
        target: String,
    },
    /// `enum class` plus its `enum_info` table.
    Enumeration {
        /// Declared enumerators (the `UNKNOWN` sentinel is added on render).
        enumerators: Vec<EnumeratorEntry>,
    },
    /// `NLOHMANN_JSON_SERIALIZE_ENUM` block.
    EnumSerialization {
        /// Declared enumerators (the `UNKNOWN` sentinel is added on render).
        enumerators: Vec<String>,
    },
    /// `struct name : superclass { ... };`
    Struct {
        /// Base class.
        superclass: Option<Superclass>,
    },
    /// Typed data member.
    DataElement(DataElementDecl),
    /// `bool name = false;` presence flag of a data member.
    IsSetFlag,
    /// `const static std::string_view name;` with an out-of-class initializer.
    StaticMetainfo {
        /// Initializer value.
        value: String,
    },
    /// `inline T name;` plus a setter.
    InlineDependency {
        /// Dependency type.
        cpp_type: String,
    },
    /// Function declaration.
    Function(FunctionDecl),
    /// Extension-defined node.
    Custom(Box<dyn CustomDeclaration>),
}

impl DeclKind {
    /// Returns a short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Typedef { .. } => "typedef",
            Self::Enumeration { .. } => "enumeration",
            Self::EnumSerialization { .. } => "enum serialization",
            Self::Struct { .. } => "struct",
            Self::DataElement(_) => "data element",
            Self::IsSetFlag => "is-set flag",
            Self::StaticMetainfo { .. } => "static metainfo",
            Self::InlineDependency { .. } => "inline dependency",
            Self::Function(_) => "function",
            Self::Custom(custom) => custom.kind(),
        }
    }
}

/// A node of the declaration tree.
#[derive(Debug)]
pub struct DeclNode {
    /// Declared name.
    pub name: String,
    /// Owning node (`None` for the root).
    pub parent: Option<NodeId>,
    /// Children in emission order.
    pub children: Vec<NodeId>,
    /// Node kind.
    pub kind: DeclKind,
}

/// Arena-backed declaration tree rooted at a namespace.
#[derive(Debug)]
pub struct DeclarationTree {
    nodes: Vec<DeclNode>,
}

impl DeclarationTree {
    /// Creates a tree whose root is the named namespace.
    #[must_use]
    pub fn new(root_namespace: impl Into<String>) -> Self {
        Self {
            nodes: vec![DeclNode {
                name: root_namespace.into(),
                parent: None,
                children: Vec::new(),
                kind: DeclKind::Namespace,
            }],
        }
    }

    /// Returns the root id.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
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
    pub fn add(&mut self, parent: NodeId, name: impl Into<String>, kind: DeclKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let name = name.into();
        tracing::debug!("Declaring {} '{}' under '{}'", kind.label(), name, self.nodes[parent.0].name);
        self.nodes.push(DeclNode {
            name,
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Returns a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &DeclNode {
        &self.nodes[id.0]
    }

    /// Returns a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut DeclNode {
        &mut self.nodes[id.0]
    }

    /// Returns the children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Replaces the child order of a node.
    ///
    /// `order` must be a permutation of the current children.
    pub(crate) fn set_children(&mut self, id: NodeId, order: Vec<NodeId>) {
        debug_assert_eq!(order.len(), self.nodes[id.0].children.len());
        self.nodes[id.0].children = order;
    }

    /// Returns the nesting depth (root is 0).
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent.0].parent;
        }
        depth
    }

    /// Finds a direct child by name.
    #[must_use]
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].name == name)
    }

    /// Returns all descendants of a node in pre-order, excluding the node.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Returns the struct children of a node with their superclass.
    pub fn structs(&self, parent: NodeId) -> impl Iterator<Item = (NodeId, Option<&Superclass>)> {
        self.children(parent)
            .iter()
            .filter_map(|&c| match &self.nodes[c.0].kind {
                DeclKind::Struct { superclass } => Some((c, superclass.as_ref())),
                _ => None,
            })
    }

    /// Returns the data element children of a node.
    pub fn data_elements(&self, parent: NodeId) -> impl Iterator<Item = (NodeId, &DataElementDecl)> {
        self.children(parent)
            .iter()
            .filter_map(|&c| match &self.nodes[c.0].kind {
                DeclKind::DataElement(decl) => Some((c, decl)),
                _ => None,
            })
    }

    /// Renders a node and its subtree.
    #[must_use]
    pub fn render(&self, id: NodeId) -> String {
        let node = &self.nodes[id.0];
        let indent = "\t".repeat(self.depth(id));
        let name = &node.name;

        match &node.kind {
            DeclKind::Namespace => {
                format!("{indent}namespace {name} {{\n{}\n{indent}}}", self.render_children(id))
            }
            DeclKind::Typedef { target } => format!("{indent}typedef {target} {name};"),
            DeclKind::Enumeration { enumerators } => render_enumeration(&indent, name, enumerators),
            DeclKind::EnumSerialization { enumerators } => {
                let entries: Vec<String> = std::iter::once("UNKNOWN")
                    .chain(enumerators.iter().map(String::as_str))
                    .map(|e| format!("{indent}\t{{{name}::{e}, \"{e}\"}}"))
                    .collect();
                format!(
                    "{indent}NLOHMANN_JSON_SERIALIZE_ENUM ({name}, {{\n{}\n{indent}}})",
                    entries.join(",\n")
                )
            }
            DeclKind::Struct { superclass } => {
                let base = superclass
                    .as_ref()
                    .map(|s| format!(" : {}", s.spelled))
                    .unwrap_or_default();
                format!(
                    "{indent}struct {name}{base} {{\n{}\n{indent}}};",
                    self.render_children(id)
                )
            }
            DeclKind::DataElement(decl) => format!("{indent}{} {name};", decl.cpp_type),
            DeclKind::IsSetFlag => format!("{indent}bool {name} = false;"),
            DeclKind::StaticMetainfo { .. } => {
                format!("{indent}const static std::string_view {name};")
            }
            DeclKind::InlineDependency { cpp_type } => format!(
                "{indent}inline {cpp_type} {name};\n{indent}void set_{name}({cpp_type} value);"
            ),
            DeclKind::Function(f) => render_function(&indent, f),
            DeclKind::Custom(custom) => custom.render(self, id, &indent),
        }
    }

    fn render_children(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .map(|&c| self.render(c))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the text of a single node searched during dependency ordering.
    ///
    /// Literal values (descriptions, display text) are excluded so prose
    /// never creates an ordering constraint.
    #[must_use]
    pub fn own_reference_text(&self, id: NodeId) -> String {
        let node = &self.nodes[id.0];
        let name = &node.name;
        match &node.kind {
            DeclKind::Namespace => format!("namespace {name}"),
            DeclKind::Typedef { target } => format!("typedef {target} {name}"),
            DeclKind::Enumeration { .. } => format!("enum class {name}"),
            DeclKind::EnumSerialization { .. } => format!("NLOHMANN_JSON_SERIALIZE_ENUM {name}"),
            DeclKind::Struct { superclass } => match superclass {
                Some(s) => format!("struct {name} {}", s.spelled),
                None => format!("struct {name}"),
            },
            DeclKind::DataElement(decl) => format!("{} {name}", decl.cpp_type),
            DeclKind::IsSetFlag => format!("bool {name}"),
            DeclKind::StaticMetainfo { .. } => format!("std::string_view {name}"),
            DeclKind::InlineDependency { cpp_type } => format!("{cpp_type} {name}"),
            DeclKind::Function(f) => format!("{} {}", f.ret, f.parameter_list()),
            DeclKind::Custom(custom) => custom.reference_text(self, id),
        }
    }

    /// Returns the reference text of a node and all of its descendants.
    #[must_use]
    pub fn reference_text(&self, id: NodeId) -> String {
        std::iter::once(id)
            .chain(self.descendants(id))
            .map(|n| self.own_reference_text(n))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_enumeration(indent: &str, name: &str, enumerators: &[EnumeratorEntry]) -> String {
    let mut output = format!("{indent}enum class {name} {{\n");
    for e in enumerators {
        output.push_str(&format!("{indent}\t{},\n", e.name));
    }
    output.push_str(&format!("{indent}\tUNKNOWN\n{indent}}};"));

    output.push_str(&format!(
        "\n{indent}const static std::unordered_map<{name}, enum_info> {name}_info {{\n"
    ));
    for e in enumerators {
        output.push_str(&format!(
            "{indent}\t{{{name}::{}, {{\"{}\", \"{}\", \"{}\"}}}},\n",
            e.name,
            e.name,
            escape_string(&e.display_text),
            escape_string(&e.description)
        ));
    }
    output.push_str(&format!(
        "{indent}\t{{{name}::UNKNOWN, {{\"UNKNOWN\", \"None\", \"None\"}}}}\n{indent}}};"
    ));
    output
}

fn render_function(indent: &str, f: &FunctionDecl) -> String {
    let params = f.parameter_list();
    match f.flavor {
        FunctionFlavor::Plain | FunctionFlavor::Serialization => {
            format!("{indent}{} {}{params};", f.ret, f.name)
        }
        FunctionFlavor::Override => format!("{indent}{} {}{params} override;", f.ret, f.name),
        FunctionFlavor::PureVirtual => format!("{indent}virtual {} {}{params} = 0;", f.ret, f.name),
        FunctionFlavor::VirtualDestructor => format!("{indent}virtual ~{}() = default;", f.name),
    }
}

/// Escapes text for use inside a C++ string literal.
#[must_use]
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Three-digit octal escape.
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", u32::from(c))),
            _ => out.push(c),
        }
    }
    out
}
