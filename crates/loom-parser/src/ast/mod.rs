//! Typed AST for the Loom DSL.
//!
//! Declarations are plain data produced by the parser. Cross-declaration
//! relations (variant -> function, type reference -> class/enum) are arena
//! indices into the owning [`Unit`](unit::Unit) rather than pointers; the
//! validator fills them in after merging.

pub mod item;
pub mod ty;
pub mod unit;

pub use item::{
    ClassDecl, ClientDecl, EnumDecl, FunctionDecl, LangBlock, Language, Method, Property,
    StringifyOverride, StringifyProperty, TestCase, TestGroup, Variant, VariantKind,
};
pub use ty::{Primitive, RefTarget, Ty, TypeExpr};
pub use unit::{DeclId, FileAst, Unit};
