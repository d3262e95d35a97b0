//! # Lattice
//!
//! Compiles a YAML schema DSL describing engineering data models into C++
//! declarations and their JSON deserialization code.
//!
//! ## Features
//!
//! - **Type grammar** - `Name`, `{Group}`, `<Enum>`, `[Type]` and
//!   discriminated `(A, B)` alternations
//! - **Declare-before-use ordering** - deterministic topological sort with
//!   cycle detection
//! - **Polymorphic members** - owning base pointers with discriminant dispatch
//! - **Template extensions** - per-template hooks registered up front
//!
//! ## Quick Start
//!
//! ```ignore
//! use lattice::prelude::*;
//! use std::sync::Arc;
//!
//! let session = CompilationSession::new(GeneratorOptions::default())
//!     .with_extensions(Arc::new(ExtensionRegistry::builder().with_stock_extensions().build()));
//! let code = generate_from_file(Path::new("schema/fan.schema.yaml"), &session)?;
//! std::fs::write(&code.header_name, &code.header)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Document model, type resolution and validation
//! - [`codegen`] - Declaration and implementation trees, C++ rendering

pub mod prelude;

/// Schema loading, type resolution and validation.
pub mod schema {
    pub use lattice_schema::*;
}

/// C++ code generation from resolved schemas.
pub mod codegen {
    pub use lattice_codegen::*;
}
