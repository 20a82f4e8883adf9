//! Per-file declaration bags and the merged compilation unit.

use loom_common::loc::Loc;

use crate::ast::item::{ClassDecl, ClientDecl, EnumDecl, FunctionDecl, TestGroup, Variant};

/// Top-level declarations parsed from one source file.
#[derive(Debug, Default)]
pub struct FileAst {
    pub enums: Vec<EnumDecl>,
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<FunctionDecl>,
    pub clients: Vec<ClientDecl>,
    pub variants: Vec<Variant>,
    pub test_groups: Vec<TestGroup>,
}

/// All declarations of a compilation, merged across files.
///
/// The unit owns every declaration; relations between declarations are
/// stored as indices into these vectors. File order is preserved by the
/// merge; it only matters for breaking ties in the final emission order.
#[derive(Debug, Default)]
pub struct Unit {
    pub enums: Vec<EnumDecl>,
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<FunctionDecl>,
    pub clients: Vec<ClientDecl>,
    pub variants: Vec<Variant>,
    pub test_groups: Vec<TestGroup>,
}

impl Unit {
    /// Concatenate per-file bags into one unit, preserving per-file order.
    pub fn merge(files: Vec<FileAst>) -> Unit {
        let mut unit = Unit::default();
        for file in files {
            unit.enums.extend(file.enums);
            unit.classes.extend(file.classes);
            unit.functions.extend(file.functions);
            unit.clients.extend(file.clients);
            unit.variants.extend(file.variants);
            unit.test_groups.extend(file.test_groups);
        }
        unit
    }

    /// Every declaration in the unit, grouped by kind in unit order.
    pub fn decl_ids(&self) -> Vec<DeclId> {
        let mut ids = Vec::new();
        ids.extend((0..self.enums.len()).map(DeclId::Enum));
        ids.extend((0..self.classes.len()).map(DeclId::Class));
        ids.extend((0..self.clients.len()).map(DeclId::Client));
        ids.extend((0..self.functions.len()).map(DeclId::Function));
        ids.extend((0..self.variants.len()).map(DeclId::Variant));
        ids.extend((0..self.test_groups.len()).map(DeclId::TestGroup));
        ids
    }
}

/// A reference to one declaration in a [`Unit`]: kind plus arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclId {
    Enum(usize),
    Class(usize),
    Client(usize),
    Function(usize),
    Variant(usize),
    TestGroup(usize),
}

impl DeclId {
    /// Fixed emission ordering of declaration kinds: type declarations come
    /// before the things that reference them within a single wave.
    pub fn kind_order(self) -> u8 {
        match self {
            DeclId::Enum(_) => 1,
            DeclId::Class(_) => 2,
            DeclId::Client(_) => 3,
            DeclId::Function(_) => 4,
            DeclId::Variant(_) => 5,
            DeclId::TestGroup(_) => 6,
        }
    }

    /// The graph key: the plain name for top-level declarations,
    /// `<function>::<name>` for variants and test groups.
    pub fn unique_name(self, unit: &Unit) -> String {
        match self {
            DeclId::Enum(i) => unit.enums[i].name.clone(),
            DeclId::Class(i) => unit.classes[i].name.clone(),
            DeclId::Client(i) => unit.clients[i].name.clone(),
            DeclId::Function(i) => unit.functions[i].name.clone(),
            DeclId::Variant(i) => {
                let v = &unit.variants[i];
                format!("{}::{}", v.function_name, v.name)
            }
            DeclId::TestGroup(i) => {
                let g = &unit.test_groups[i];
                format!("{}::{}", g.function_name, g.name)
            }
        }
    }

    /// The declaration's source location, used for error blame and for the
    /// source-line tie-break of the emission order.
    pub fn loc(self, unit: &Unit) -> &Loc {
        match self {
            DeclId::Enum(i) => &unit.enums[i].loc,
            DeclId::Class(i) => &unit.classes[i].loc,
            DeclId::Client(i) => &unit.clients[i].loc,
            DeclId::Function(i) => &unit.functions[i].loc,
            DeclId::Variant(i) => &unit.variants[i].loc,
            DeclId::TestGroup(i) => &unit.test_groups[i].loc,
        }
    }
}
