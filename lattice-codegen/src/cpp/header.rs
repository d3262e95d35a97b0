//! Header translation.
//!
//! [`HeaderTranslator`] builds the declaration tree of one schema in a fixed
//! category order (typedefs, enumerations, the logger, the meta struct,
//! templates, data groups), runs the post-passes, orders the namespace,
//! expands polymorphic members and finally appends the serialization
//! declarations.

use crate::cpp::declarations::{
    DeclKind, DeclarationTree, EnumeratorEntry, FunctionDecl, FunctionFlavor, NodeId, Superclass,
};
use crate::cpp::extensions::StructContext;
use crate::cpp::{ordering, polymorphism};
use crate::diagnostic::Diagnostic;
use crate::error::CodegenError;
use crate::session::CompilationSession;
use lattice_schema::{ResolvedGroup, SchemaIr, TypeReference, kebab_style};

/// Declaration tree of one schema plus the text around it.
#[derive(Debug)]
pub struct TranslatedHeader {
    /// Declarations, rooted at the top namespace.
    pub tree: DeclarationTree,
    /// Schema namespace node.
    pub namespace: NodeId,
    /// Include guard and include lines.
    pub preamble: Vec<String>,
    /// Closing lines.
    pub epilogue: Vec<String>,
    /// Non-fatal problems found during translation.
    pub diagnostics: Vec<Diagnostic>,
}

impl TranslatedHeader {
    /// Renders the header text.
    #[must_use]
    pub fn render(&self, note: &str) -> String {
        format!(
            "{}\n\n{note}\n\n{}\n{}\n",
            self.preamble.join("\n"),
            self.tree.render(self.tree.root()),
            self.epilogue.join("\n")
        )
    }
}

/// Translates resolved schemas into declaration trees.
#[derive(Debug, Clone, Copy)]
pub struct HeaderTranslator<'a> {
    session: &'a CompilationSession,
}

impl<'a> HeaderTranslator<'a> {
    /// Creates a translator bound to a session.
    #[must_use]
    pub fn new(session: &'a CompilationSession) -> Self {
        Self { session }
    }

    /// Translates one schema.
    ///
    /// # Errors
    /// Returns `CodegenError` if an extension fails, if sibling
    /// declarations are cyclic or if a polymorphic member has no
    /// discriminant.
    pub fn translate(&self, ir: &SchemaIr) -> Result<TranslatedHeader, CodegenError> {
        let options = self.session.options();
        let guard = ir.include_guard();
        let mut preamble = vec![format!("#ifndef {guard}"), format!("#define {guard}")];
        for reference in &ir.references {
            push_include(&mut preamble, &format!("{}.h", kebab_style(reference)));
        }
        for include in &options.standard_includes {
            push_include(&mut preamble, include);
        }
        let epilogue = vec!["#endif".to_string()];

        let mut tree = DeclarationTree::new(&options.top_namespace);
        let namespace = tree.add(tree.root(), &ir.namespace, DeclKind::Namespace);
        let mut diagnostics = Vec::new();

        for string_type in &ir.string_types {
            tree.add(
                namespace,
                &string_type.name,
                DeclKind::Typedef {
                    target: "std::string".to_string(),
                },
            );
        }

        for enumeration in &ir.enumerations {
            let enumerators = enumeration
                .enumerators
                .iter()
                .map(|e| EnumeratorEntry {
                    name: e.name.clone(),
                    display_text: e.display_text.clone().unwrap_or_else(|| e.name.clone()),
                    description: e.description.clone().unwrap_or_default(),
                })
                .collect();
            tree.add(namespace, &enumeration.name, DeclKind::Enumeration { enumerators });
        }

        tree.add(
            namespace,
            "logger",
            DeclKind::InlineDependency {
                cpp_type: options.logger_type.clone(),
            },
        );

        if let Some(meta) = &ir.meta {
            let s = tree.add(namespace, &meta.tag, DeclKind::Struct { superclass: None });
            let prefix = meta.tag.to_lowercase();
            for (suffix, value) in [
                ("title", &meta.title),
                ("version", &meta.version),
                ("description", &meta.description),
            ] {
                tree.add(
                    s,
                    format!("{prefix}_{suffix}"),
                    DeclKind::StaticMetainfo {
                        value: value.clone().unwrap_or_default(),
                    },
                );
            }
        }

        for template in &ir.templates {
            let s = tree.add(namespace, &template.name, DeclKind::Struct { superclass: None });
            tree.add(
                s,
                format!("~{}", template.name),
                DeclKind::Function(FunctionDecl {
                    ret: String::new(),
                    name: template.name.clone(),
                    args: Vec::new(),
                    flavor: FunctionFlavor::VirtualDestructor,
                }),
            );
            for method in self.session.interfaces().get(&template.name).unwrap_or_default() {
                tree.add(
                    s,
                    &method.name,
                    DeclKind::Function(FunctionDecl::from_signature(method, FunctionFlavor::PureVirtual)),
                );
            }
        }

        for group in &ir.data_groups {
            self.translate_group(&mut tree, namespace, ir, group, &mut diagnostics)?;
        }

        let mut templates_seen: Vec<&str> = Vec::new();
        for group in &ir.data_groups {
            let Some(template) = &group.template else {
                continue;
            };
            if templates_seen.contains(&template.name.as_str()) {
                continue;
            }
            templates_seen.push(&template.name);
            if let Some(pass) = self.session.extensions().post_pass(&template.name) {
                tracing::debug!("Running post-pass for '{}'", template.name);
                pass.visit(&mut tree, namespace)
                    .map_err(|e| e.in_extension(&template.name))?;
            }
        }

        for include in member_includes(ir) {
            push_include(&mut preamble, &include);
        }

        ordering::order_children(&mut tree, namespace)?;
        let expanded = polymorphism::expand(&mut tree, namespace)?;
        tracing::debug!("Expanded {} polymorphic members in '{}'", expanded, ir.namespace);

        for enumeration in &ir.enumerations {
            tree.add(
                namespace,
                &enumeration.name,
                DeclKind::EnumSerialization {
                    enumerators: enumeration.enumerators.iter().map(|e| e.name.clone()).collect(),
                },
            );
        }
        for group in &ir.data_groups {
            tree.add(
                namespace,
                "from_json",
                DeclKind::Function(FunctionDecl {
                    ret: "void".to_string(),
                    name: "from_json".to_string(),
                    args: vec![options.json_parameter(), format!("{}& x", group.name)],
                    flavor: FunctionFlavor::Serialization,
                }),
            );
        }

        Ok(TranslatedHeader {
            tree,
            namespace,
            preamble,
            epilogue,
            diagnostics,
        })
    }

    fn translate_group(
        &self,
        tree: &mut DeclarationTree,
        namespace: NodeId,
        ir: &SchemaIr,
        group: &ResolvedGroup,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), CodegenError> {
        let superclass = group.template.as_ref().map(|t| {
            let external = t.schema != ir.schema_name;
            Superclass {
                name: t.name.clone(),
                spelled: if external { t.to_string() } else { t.name.clone() },
                external,
            }
        });
        let template = superclass.as_ref().map(|s| s.name.clone());
        let extensions = self.session.extensions();

        let mut ctx = StructContext {
            tree: &mut *tree,
            namespace,
            group,
            superclass: superclass.clone(),
        };
        let struct_id = match template.as_deref().and_then(|t| Some((t, extensions.group_operation(t)?))) {
            Some((t, op)) => op.build_group(&mut ctx).map_err(|e| e.in_extension(t))?,
            None => ctx.default_struct(),
        };
        match template.as_deref().and_then(|t| Some((t, extensions.elements_operation(t)?))) {
            Some((t, op)) => op
                .build_elements(&mut ctx, struct_id)
                .map_err(|e| e.in_extension(t))?,
            None => ctx.default_elements(struct_id),
        }

        let Some(superclass) = superclass else {
            return Ok(());
        };
        match self.session.interfaces().get(&superclass.name) {
            Some(methods) => {
                for method in methods {
                    tree.add(
                        struct_id,
                        &method.name,
                        DeclKind::Function(FunctionDecl::from_signature(method, FunctionFlavor::Override)),
                    );
                }
            }
            None if superclass.external => {
                tracing::warn!(
                    "No interface known for base class '{}' of '{}'",
                    superclass.name,
                    group.name
                );
                diagnostics.push(Diagnostic::MissingBaseInterface {
                    group: group.name.clone(),
                    template: superclass.name,
                });
            }
            None => {}
        }
        Ok(())
    }
}

fn push_include(lines: &mut Vec<String>, header: &str) {
    let line = format!("#include <{header}>");
    if !lines.contains(&line) {
        lines.push(line);
    }
}

/// Headers required by declarations that name other schemas.
fn member_includes(ir: &SchemaIr) -> Vec<String> {
    let mut includes = Vec::new();
    let mut push = |header: String| {
        if !includes.contains(&header) {
            includes.push(header);
        }
    };

    for group in &ir.data_groups {
        for element in &group.elements {
            for schema in element.ty.schemas() {
                if schema != ir.schema_name {
                    push(format!("{}.h", kebab_style(schema)));
                }
            }
            if let TypeReference::Alternation(alt) = &element.ty
                && alt.base_template.schema != ir.schema_name
            {
                push(format!("{}.h", kebab_style(&alt.base_template.name)));
            }
        }
        if let Some(template) = &group.template
            && template.schema != ir.schema_name
        {
            push(format!("{}.h", kebab_style(&template.name)));
        }
    }
    includes
}
