//! Base-class interface descriptors.
//!
//! A derived data group overrides every virtual member function of its
//! template. The signatures are supplied up front, keyed by template name,
//! instead of being rediscovered from generated headers mid-translation.
//! [`scan_header`] and [`BaseInterfaces::load_header_dir`] fill the table
//! from headers that already exist on disk.

use crate::diagnostic::Diagnostic;
use indexmap::IndexMap;
use lattice_schema::kebab_style;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// A virtual member function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Return type.
    pub return_type: String,
    /// Function name.
    pub name: String,
    /// Parameter declarations, possibly with default values.
    pub arguments: Vec<String>,
}

impl MethodSignature {
    /// Creates a signature.
    pub fn new<I, S>(return_type: impl Into<String>, name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            return_type: return_type.into(),
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the parameter list with default values removed.
    #[must_use]
    pub fn arguments_without_defaults(&self) -> Vec<String> {
        self.arguments
            .iter()
            .map(|a| a.split('=').next().unwrap_or(a).trim().to_string())
            .collect()
    }

    /// Returns true if any parameter has the given type in it.
    #[must_use]
    pub fn takes(&self, type_name: &str) -> bool {
        self.arguments.iter().any(|a| a.contains(type_name))
    }
}

/// Interface descriptors keyed by template name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseInterfaces {
    interfaces: IndexMap<String, Vec<MethodSignature>>,
}

impl BaseInterfaces {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the interface of a template, replacing any previous one.
    pub fn insert(&mut self, template: impl Into<String>, methods: Vec<MethodSignature>) {
        self.interfaces.insert(template.into(), methods);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, template: impl Into<String>, methods: Vec<MethodSignature>) -> Self {
        self.insert(template, methods);
        self
    }

    /// Returns the interface of a template.
    #[must_use]
    pub fn get(&self, template: &str) -> Option<&[MethodSignature]> {
        self.interfaces.get(template).map(Vec::as_slice)
    }

    /// Returns true if an interface is known for the template.
    #[must_use]
    pub fn contains(&self, template: &str) -> bool {
        self.interfaces.contains_key(template)
    }

    /// Returns the number of known interfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Returns true if no interface is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Reads `<dir>/<kebab(template)>.h` for each template.
    ///
    /// Headers that do not exist are skipped; headers that exist but cannot
    /// be read produce a diagnostic.
    pub fn load_header_dir<'a, I>(dir: &Path, templates: I) -> (Self, Vec<Diagnostic>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut interfaces = Self::new();
        let mut diagnostics = Vec::new();

        for template in templates {
            let path = dir.join(format!("{}.h", kebab_style(template)));
            if !path.exists() {
                tracing::debug!("No base header for {} at {}", template, path.display());
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    let methods = scan_header(template, &text);
                    tracing::debug!(
                        "Found {} virtual functions for {} in {}",
                        methods.len(),
                        template,
                        path.display()
                    );
                    interfaces.insert(template, methods);
                }
                Err(e) => {
                    tracing::warn!("Cannot read base header {}: {}", path.display(), e);
                    diagnostics.push(Diagnostic::UnreadableBaseHeader {
                        template: template.to_string(),
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        (interfaces, diagnostics)
    }
}

static VIRTUAL_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*virtual\s(?P<ret>.*)\s(?P<name>\w+)\((?P<args>.*)\)")
        .expect("virtual signature pattern is valid")
});

/// Splits a parameter list on the commas outside brackets, so
/// `std::map<std::string, double> m` stays one parameter.
fn split_arguments(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(args[start..].trim());
    parts.retain(|a| !a.is_empty());
    parts
}

/// Extracts `virtual <ret> <name>(<args>)` declarations from header text.
///
/// Lines mentioning the template name itself are skipped so the virtual
/// destructor is never picked up.
#[must_use]
pub fn scan_header(template: &str, text: &str) -> Vec<MethodSignature> {
    text.lines()
        .filter(|line| !line.contains(template))
        .filter_map(|line| VIRTUAL_SIGNATURE.captures(line))
        .map(|c| MethodSignature::new(c["ret"].trim(), &c["name"], split_arguments(&c["args"])))
        .collect()
}
