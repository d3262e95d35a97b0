//! C++ code generation.
//!
//! This module generates C++ headers and implementation files from
//! resolved schemas.

pub mod declarations;
pub mod extensions;
pub mod header;
pub mod implementation;
pub mod ordering;
pub mod polymorphism;

pub use declarations::{DeclKind, DeclarationTree, NodeId};
pub use header::{HeaderTranslator, TranslatedHeader};
pub use implementation::{ImplKind, ImplementationTree};
