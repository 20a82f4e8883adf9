//! Top-level declarations and their shared pieces.

use std::collections::BTreeMap;
use std::fmt;

use loom_common::loc::Loc;

use crate::ast::ty::Ty;

/// Target language of a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    TypeScript,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::TypeScript => "ts",
        }
    }
}

/// One `@lang[..]` body inside a method.
#[derive(Debug, Clone, PartialEq)]
pub struct LangBlock {
    pub loc: Loc,
    pub language: Language,
    pub code: String,
}

/// A named method with one body per language.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub loc: Loc,
    pub name: String,
    pub langs: Vec<LangBlock>,
}

impl Method {
    /// The body for a given language, if present.
    pub fn body(&self, language: Language) -> Option<&LangBlock> {
        self.langs.iter().find(|l| l.language == language)
    }
}

/// `@enum NAME { value value ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub loc: Loc,
    pub name: String,
    /// Value identifiers in source order.
    pub values: Vec<String>,
}

/// One `name TYPE` property inside a class.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub loc: Loc,
    pub name: String,
    pub ty: Ty,
}

/// `@class NAME { property... @method... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub loc: Loc,
    pub name: String,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
}

/// `@client[llm] NAME { @provider ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClientDecl {
    pub loc: Loc,
    pub name: String,
    pub provider: String,
    /// Key/value arguments forwarded to the runtime client factory.
    pub args: BTreeMap<String, String>,
    pub num_retries: u32,
    /// `@fallback NAME`: client used when any request fails.
    pub default_fallback: Option<String>,
    /// `@fallback[CODE] NAME`: per-status-code fallback clients.
    pub fallback_by_code: BTreeMap<i64, String>,
}

impl ClientDecl {
    /// Names of every fallback client, default first, then by code.
    pub fn fallback_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(name) = &self.default_fallback {
            names.push(name.clone());
        }
        for name in self.fallback_by_code.values() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

/// `@function NAME { @input TYPE @output TYPE }`
///
/// `variants` and `test_groups` index into the unit's arenas and are filled
/// by the validator's attachment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub loc: Loc,
    pub name: String,
    pub input: Ty,
    pub output: Ty,
    pub variants: Vec<usize>,
    pub test_groups: Vec<usize>,
}

/// One property line inside a `@stringify` block.
#[derive(Debug, Clone, PartialEq)]
pub struct StringifyProperty {
    pub loc: Loc,
    pub name: String,
    pub rename: Option<String>,
    pub describe: Option<String>,
    pub skip: bool,
}

/// `@stringify TYPE { property... }`: per-type rendering overrides for the
/// LLM boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct StringifyOverride {
    pub loc: Loc,
    pub type_name: String,
    pub properties: Vec<StringifyProperty>,
}

/// Implementation-specific payload of a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantKind {
    /// A prompt-driven LLM call.
    Llm {
        client_name: String,
        prompt: String,
        stringify: Vec<StringifyOverride>,
    },
    /// Hand-written code, optionally calling other functions.
    Code { depends_on: Vec<String> },
}

/// `@variant[llm|code] NAME for FUNCTION { ... }`
///
/// An LLM variant declared against N > 1 clients is fanned out by the
/// parser into N variants named `<name>_<client>`. `function` is the owning
/// function's index, filled by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub loc: Loc,
    pub name: String,
    pub function_name: String,
    pub methods: Vec<Method>,
    pub kind: VariantKind,
    pub function: Option<usize>,
}

impl Variant {
    /// `"llm"` or `"code"`, as used in generated file names.
    pub fn kind_str(&self) -> &'static str {
        match self.kind {
            VariantKind::Llm { .. } => "llm",
            VariantKind::Code { .. } => "code",
        }
    }
}

/// `@case [NAME] { @input STRING @method... }`
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub loc: Loc,
    pub name: String,
    pub input: String,
    pub methods: Vec<Method>,
}

/// `@test_group NAME for FUNCTION { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct TestGroup {
    pub loc: Loc,
    pub name: String,
    pub function_name: String,
    pub cases: Vec<TestCase>,
    pub methods: Vec<Method>,
    pub function: Option<usize>,
}

impl fmt::Display for EnumDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enum {}", self.name)
    }
}

impl fmt::Display for ClassDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.name)
    }
}

impl fmt::Display for ClientDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client[llm] {}", self.name)
    }
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function {}", self.name)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}[{}]", self.function_name, self.name, self.kind_str())
    }
}

impl fmt::Display for TestGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::test_group[{}]", self.function_name, self.name)
    }
}
