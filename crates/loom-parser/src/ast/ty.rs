//! The Loom type micro-grammar.
//!
//! ```text
//! Type ::= int | float | bool | char | string | null   primitives
//!        | Name                                        reference, resolved later
//!        | Type?                                       optional
//!        | Type[]                                      list
//!        | Type|Type|...                               union
//! ```
//!
//! A type is spelled as a single token and parsed by scanning the spelling
//! right to left: a trailing `?` or `[]` wraps everything to its left, then
//! `|` splits the remainder into union members, and the atom scan resolves
//! primitives and references. The scan must end exactly at the start of the
//! spelling or the type is rejected.

use std::fmt;

use loom_common::error::{Error, Result};
use loom_common::loc::Loc;
use loom_common::token::Token;
use rustc_hash::{FxHashMap, FxHashSet};

/// The six primitive type spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Float,
    Bool,
    Char,
    String,
    Null,
}

impl Primitive {
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::String => "string",
            Primitive::Null => "null",
        }
    }
}

/// Resolved target of a type reference: an index into the unit's class or
/// enum arena. Filled in by the validator's link pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    Class(usize),
    Enum(usize),
}

/// A node in the type tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive(Primitive),
    Ref {
        name: String,
        target: Option<RefTarget>,
    },
    Optional(Box<TypeExpr>),
    List(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

/// A parsed type with the location of its source token.
#[derive(Debug, Clone, PartialEq)]
pub struct Ty {
    pub loc: Loc,
    pub expr: TypeExpr,
}

impl Ty {
    /// Parse a type from its source token.
    pub fn parse(token: &Token) -> Result<Ty> {
        Ty::parse_spelling(&token.loc, &token.value)
    }

    /// Parse a type from a spelling at a known location.
    pub fn parse_spelling(loc: &Loc, spelling: &str) -> Result<Ty> {
        let bytes = spelling.as_bytes();
        let mut pos: isize = bytes.len() as isize - 1;
        let expr = parse_expr(loc, spelling, bytes, &mut pos)?;
        if pos != -1 {
            return Err(invalid(loc, spelling));
        }
        Ok(Ty {
            loc: loc.clone(),
            expr,
        })
    }

    /// Names of every reference in the type tree, first occurrence order.
    pub fn ref_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = FxHashSet::default();
        collect_refs(&self.expr, &mut names, &mut seen);
        names
    }

    /// Check that every reference names a declared class or enum.
    pub fn validate(
        &self,
        class_names: &FxHashSet<String>,
        enum_names: &FxHashSet<String>,
    ) -> Result<()> {
        validate_expr(&self.expr, &self.loc, class_names, enum_names)
    }

    /// Bind every reference to its declaration index.
    pub fn link(&mut self, targets: &FxHashMap<String, RefTarget>) {
        link_expr(&mut self.expr, targets);
    }

    /// The resolved class index when the type is a direct class reference.
    pub fn class_target(&self) -> Option<usize> {
        match &self.expr {
            TypeExpr::Ref {
                target: Some(RefTarget::Class(idx)),
                ..
            } => Some(*idx),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive(p) => write!(f, "{}", p.as_str()),
            TypeExpr::Ref { name, .. } => write!(f, "{name}"),
            TypeExpr::Optional(inner) => write!(f, "{inner}?"),
            TypeExpr::List(inner) => write!(f, "{inner}[]"),
            TypeExpr::Union(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

fn invalid(loc: &Loc, spelling: &str) -> Error {
    Error::syntax(loc.clone(), format!("invalid type: {spelling}"))
}

/// Parse the spelling right to left from `pos` down to the start.
///
/// A trailing `?` or `[]` wraps the whole remaining prefix; after the atom
/// scan, a `|` at the cursor means the prefix is a union whose left part is
/// parsed recursively and spliced flat.
fn parse_expr(loc: &Loc, spelling: &str, bytes: &[u8], pos: &mut isize) -> Result<TypeExpr> {
    if *pos < 0 {
        return Err(invalid(loc, spelling));
    }
    if bytes[*pos as usize] == b'?' {
        *pos -= 1;
        let inner = parse_expr(loc, spelling, bytes, pos)?;
        return Ok(TypeExpr::Optional(Box::new(inner)));
    }
    if *pos >= 1 && bytes[*pos as usize] == b']' && bytes[(*pos - 1) as usize] == b'[' {
        *pos -= 2;
        let inner = parse_expr(loc, spelling, bytes, pos)?;
        return Ok(TypeExpr::List(Box::new(inner)));
    }

    let first = parse_atom(loc, spelling, bytes, pos)?;
    if *pos >= 0 && bytes[*pos as usize] == b'|' {
        *pos -= 1;
        let rest = parse_expr(loc, spelling, bytes, pos)?;
        let mut items = match rest {
            TypeExpr::Union(items) => items,
            other => vec![other],
        };
        items.push(first);
        return Ok(TypeExpr::Union(items));
    }
    Ok(first)
}

/// Scan an identifier atom backwards and resolve primitives.
fn parse_atom(loc: &Loc, spelling: &str, bytes: &[u8], pos: &mut isize) -> Result<TypeExpr> {
    let end = *pos;
    while *pos >= 0 {
        let b = bytes[*pos as usize];
        if b.is_ascii_alphanumeric() || b == b'_' {
            *pos -= 1;
        } else {
            break;
        }
    }
    if end == *pos {
        return Err(invalid(loc, spelling));
    }
    let name = &spelling[(*pos + 1) as usize..=end as usize];
    Ok(match name {
        "int" => TypeExpr::Primitive(Primitive::Int),
        "float" => TypeExpr::Primitive(Primitive::Float),
        "bool" => TypeExpr::Primitive(Primitive::Bool),
        "char" => TypeExpr::Primitive(Primitive::Char),
        "string" => TypeExpr::Primitive(Primitive::String),
        "null" => TypeExpr::Primitive(Primitive::Null),
        _ => TypeExpr::Ref {
            name: name.to_string(),
            target: None,
        },
    })
}

fn collect_refs(expr: &TypeExpr, names: &mut Vec<String>, seen: &mut FxHashSet<String>) {
    match expr {
        TypeExpr::Primitive(_) => {}
        TypeExpr::Ref { name, .. } => {
            if seen.insert(name.clone()) {
                names.push(name.clone());
            }
        }
        TypeExpr::Optional(inner) | TypeExpr::List(inner) => collect_refs(inner, names, seen),
        TypeExpr::Union(items) => {
            for item in items {
                collect_refs(item, names, seen);
            }
        }
    }
}

fn validate_expr(
    expr: &TypeExpr,
    loc: &Loc,
    class_names: &FxHashSet<String>,
    enum_names: &FxHashSet<String>,
) -> Result<()> {
    match expr {
        TypeExpr::Primitive(_) => Ok(()),
        TypeExpr::Ref { name, .. } => {
            if class_names.contains(name) || enum_names.contains(name) {
                Ok(())
            } else {
                Err(Error::undefined(
                    loc.clone(),
                    format!("unknown type: {name}"),
                ))
            }
        }
        TypeExpr::Optional(inner) | TypeExpr::List(inner) => {
            validate_expr(inner, loc, class_names, enum_names)
        }
        TypeExpr::Union(items) => {
            for item in items {
                validate_expr(item, loc, class_names, enum_names)?;
            }
            Ok(())
        }
    }
}

fn link_expr(expr: &mut TypeExpr, targets: &FxHashMap<String, RefTarget>) {
    match expr {
        TypeExpr::Primitive(_) => {}
        TypeExpr::Ref { name, target } => {
            if let Some(t) = targets.get(name) {
                *target = Some(*t);
            }
        }
        TypeExpr::Optional(inner) | TypeExpr::List(inner) => link_expr(inner, targets),
        TypeExpr::Union(items) => {
            for item in items {
                link_expr(item, targets);
            }
        }
    }
}
