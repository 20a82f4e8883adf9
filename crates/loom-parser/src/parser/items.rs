//! One parse function per top-level declaration kind.
//!
//! Each function is entered with the cursor on the declaration's keyword
//! token (the leading `@` has already been consumed by the dispatch loop).

use loom_common::error::{Error, Result};
use loom_common::token::TokenKind;
use rustc_hash::FxHashMap;

use crate::ast::item::{
    ClassDecl, ClientDecl, EnumDecl, FunctionDecl, LangBlock, Language, Method, Property,
    StringifyOverride, StringifyProperty, TestCase, TestGroup, Variant, VariantKind,
};
use crate::ast::ty::Ty;

use super::{parse_identifier_list, parse_string, Parser};

/// `@enum NAME { value value ... }`
pub(crate) fn parse_enum(p: &mut Parser) -> Result<EnumDecl> {
    let start = p.expect(TokenKind::Enum)?;
    let name = p.expect_name()?;
    p.expect(TokenKind::LBrace)?;

    let mut values: Vec<String> = Vec::new();
    let mut locs = FxHashMap::default();
    while p.at(TokenKind::Identifier) {
        let token = p.bump();
        locs.entry(token.value.clone())
            .or_insert_with(Vec::new)
            .push(token.loc);
        if !values.contains(&token.value) {
            values.push(token.value);
        }
    }
    p.expect(TokenKind::RBrace)?;

    for value in &values {
        let seen = &locs[value];
        if seen.len() > 1 {
            return Err(Error::duplicate(
                seen[0].clone(),
                seen[1..].to_vec(),
                format!("duplicate value in enum: {value}"),
            ));
        }
    }

    Ok(EnumDecl {
        loc: start.loc,
        name,
        values,
    })
}

/// `@class NAME { (property | @method ...)* }`
pub(crate) fn parse_class(p: &mut Parser) -> Result<ClassDecl> {
    let start = p.expect(TokenKind::Class)?;
    let name = p.expect_name()?;
    p.expect(TokenKind::LBrace)?;

    let mut properties = Vec::new();
    let mut methods = Vec::new();
    loop {
        if p.at(TokenKind::Identifier) {
            properties.push(parse_property(p)?);
        } else if p.at(TokenKind::At) {
            p.bump();
            methods.push(parse_method(p)?);
        } else {
            break;
        }
    }
    p.expect(TokenKind::RBrace)?;

    Ok(ClassDecl {
        loc: start.loc,
        name,
        properties,
        methods,
    })
}

/// `NAME TYPE` inside a class body.
fn parse_property(p: &mut Parser) -> Result<Property> {
    let name_token = p.expect(TokenKind::Identifier)?;
    let type_token = p.expect(TokenKind::Identifier)?;
    let ty = Ty::parse(&type_token)?;
    Ok(Property {
        loc: name_token.loc,
        name: name_token.value,
        ty,
    })
}

/// `@function NAME { @input TYPE @output TYPE }`
pub(crate) fn parse_function(p: &mut Parser) -> Result<FunctionDecl> {
    let start = p.expect(TokenKind::Function)?;
    let name = p.expect_name()?;
    p.expect(TokenKind::LBrace)?;

    p.expect(TokenKind::At)?;
    p.expect(TokenKind::Input)?;
    let input_token = p.expect(TokenKind::Identifier)?;
    let input = Ty::parse(&input_token)?;

    p.expect(TokenKind::At)?;
    p.expect(TokenKind::Output)?;
    let output_token = p.expect(TokenKind::Identifier)?;
    let output = Ty::parse(&output_token)?;

    p.expect(TokenKind::RBrace)?;

    Ok(FunctionDecl {
        loc: start.loc,
        name,
        input,
        output,
        variants: Vec::new(),
        test_groups: Vec::new(),
    })
}

/// `@method NAME { (@lang[..] BODY)* }`
pub(crate) fn parse_method(p: &mut Parser) -> Result<Method> {
    let start = p.expect(TokenKind::Method)?;
    let name = p.expect_name()?;
    p.expect(TokenKind::LBrace)?;

    let mut langs = Vec::new();
    while p.at(TokenKind::At) {
        p.bump();
        langs.push(parse_lang_block(p)?);
    }
    p.expect(TokenKind::RBrace)?;

    Ok(Method {
        loc: start.loc,
        name,
        langs,
    })
}

fn parse_lang_block(p: &mut Parser) -> Result<LangBlock> {
    let token = p.expect(TokenKind::Lang)?;
    let language = match token.bracket_payload() {
        Some("py") => Language::Python,
        Some("ts") => Language::TypeScript,
        other => {
            let payload = other.unwrap_or("").to_string();
            return Err(Error::syntax(
                token.loc.clone(),
                format!("unknown language: {payload}"),
            ));
        }
    };
    let code = parse_string(p)?;
    Ok(LangBlock {
        loc: token.loc,
        language,
        code,
    })
}

/// `@variant[KIND] NAME for FUNCTION { ... }`, dispatched on the bracketed
/// payload. An `llm` variant listed against several clients fans out into
/// one variant per client named `<name>_<client>`.
pub(crate) fn parse_variant(p: &mut Parser) -> Result<Vec<Variant>> {
    let keyword = p.expect(TokenKind::Variant)?;
    enum Tag {
        Llm,
        Code,
    }
    let tag = match keyword.bracket_payload() {
        Some("llm") => Tag::Llm,
        Some("code") => Tag::Code,
        other => {
            let payload = other.unwrap_or("").to_string();
            return Err(Error::syntax(
                keyword.loc.clone(),
                format!("unknown variant type: {payload}"),
            ));
        }
    };

    let name = p.expect_name()?;
    let for_token = p.current().clone();
    let for_keyword = p.expect_name()?;
    if for_keyword != "for" {
        return Err(Error::syntax(
            for_token.loc,
            format!("expected `for` keyword, got: {for_keyword}"),
        ));
    }
    let function_name = p.expect_name()?;

    match tag {
        Tag::Llm => parse_llm_variant(p, name, function_name),
        Tag::Code => Ok(vec![parse_code_variant(p, name, function_name)?]),
    }
}

/// `{ @client id (id)* (@prompt STRING | @stringify ... | @method ...)* }`
fn parse_llm_variant(
    p: &mut Parser,
    name: String,
    function_name: String,
) -> Result<Vec<Variant>> {
    let brace = p.expect(TokenKind::LBrace)?;
    p.expect(TokenKind::At)?;
    p.expect(TokenKind::Client)?;
    let client_names = parse_identifier_list(p)?;

    let mut prompt: Option<String> = None;
    let mut stringify = Vec::new();
    let mut methods = Vec::new();
    while p.at(TokenKind::At) {
        p.bump();
        let token = p.current().clone();
        match token.kind {
            TokenKind::Prompt => {
                p.bump();
                prompt = Some(parse_string(p)?);
            }
            TokenKind::Method => methods.push(parse_method(p)?),
            TokenKind::Stringify => stringify.push(parse_stringify(p)?),
            _ => {
                return Err(Error::syntax(
                    token.loc,
                    format!("unexpected field: {}", token.value),
                ))
            }
        }
    }
    p.expect(TokenKind::RBrace)?;

    let Some(prompt) = prompt else {
        return Err(Error::syntax(brace.loc, "a prompt must be specified"));
    };
    if client_names.is_empty() {
        return Err(Error::syntax(
            brace.loc,
            "at least one client must be specified",
        ));
    }

    let fan_out = client_names.len() > 1;
    Ok(client_names
        .into_iter()
        .map(|client_name| Variant {
            loc: brace.loc.clone(),
            name: if fan_out {
                format!("{name}_{client_name}")
            } else {
                name.clone()
            },
            function_name: function_name.clone(),
            methods: methods.clone(),
            kind: VariantKind::Llm {
                client_name,
                prompt: prompt.clone(),
                stringify: stringify.clone(),
            },
            function: None,
        })
        .collect())
}

/// `{ (@depends_on id (id)* | @method ...)* }`, at most one `@depends_on`.
fn parse_code_variant(p: &mut Parser, name: String, function_name: String) -> Result<Variant> {
    let brace = p.expect(TokenKind::LBrace)?;
    let mut depends_on: Option<Vec<String>> = None;
    let mut methods = Vec::new();
    while p.at(TokenKind::At) {
        p.bump();
        let token = p.current().clone();
        match token.kind {
            TokenKind::DependsOn => {
                p.bump();
                if depends_on.is_some() {
                    return Err(Error::syntax(token.loc, "multiple depends_on statements"));
                }
                depends_on = Some(parse_identifier_list(p)?);
            }
            TokenKind::Method => methods.push(parse_method(p)?),
            _ => {
                return Err(Error::syntax(
                    token.loc,
                    format!("unexpected field: {}", token.value),
                ))
            }
        }
    }
    p.expect(TokenKind::RBrace)?;

    Ok(Variant {
        loc: brace.loc,
        name,
        function_name,
        methods,
        kind: VariantKind::Code {
            depends_on: depends_on.unwrap_or_default(),
        },
        function: None,
    })
}

/// `@stringify TYPE { (NAME (@rename STRING | @describe STRING | @skip)*)* }`
fn parse_stringify(p: &mut Parser) -> Result<StringifyOverride> {
    let start = p.expect(TokenKind::Stringify)?;
    let type_name = p.expect_name()?;
    p.expect(TokenKind::LBrace)?;

    let mut properties = Vec::new();
    while p.at(TokenKind::Identifier) {
        properties.push(parse_stringify_property(p)?);
    }
    p.expect(TokenKind::RBrace)?;

    Ok(StringifyOverride {
        loc: start.loc,
        type_name,
        properties,
    })
}

fn parse_stringify_property(p: &mut Parser) -> Result<StringifyProperty> {
    let name_token = p.expect(TokenKind::Identifier)?;
    let mut rename = None;
    let mut describe = None;
    let mut skip = false;

    while p.at(TokenKind::At) {
        p.bump();
        let token = p.current().clone();
        match token.kind {
            TokenKind::Rename => {
                p.bump();
                rename = Some(parse_string(p)?);
            }
            TokenKind::Describe => {
                p.bump();
                describe = Some(parse_string(p)?);
            }
            TokenKind::Skip => {
                p.bump();
                skip = true;
            }
            _ => {
                return Err(Error::syntax(
                    token.loc,
                    format!("unknown stringify property: {}", token.value),
                ))
            }
        }
    }

    Ok(StringifyProperty {
        loc: name_token.loc,
        name: name_token.value,
        rename,
        describe,
        skip,
    })
}

/// `@test_group NAME for FUNCTION { (@case ... | @input STRING | @method ...)* }`
pub(crate) fn parse_test_group(p: &mut Parser) -> Result<TestGroup> {
    let start = p.expect(TokenKind::TestGroup)?;
    let name = p.expect_name()?;
    let for_token = p.current().clone();
    let for_keyword = p.expect_name()?;
    if for_keyword != "for" {
        return Err(Error::syntax(
            for_token.loc,
            format!("expected `for` keyword, got: {for_keyword}"),
        ));
    }
    let function_name = p.expect_name()?;
    p.expect(TokenKind::LBrace)?;

    let mut cases = Vec::new();
    let mut methods = Vec::new();
    while p.at(TokenKind::At) {
        p.bump();
        let token = p.current().clone();
        match token.kind {
            TokenKind::Case => {
                let case = parse_test_case(p, cases.len())?;
                cases.push(case);
            }
            TokenKind::Input => {
                // Bare `@input` at group level synthesizes an anonymous case.
                p.bump();
                let input = parse_string(p)?;
                cases.push(TestCase {
                    loc: token.loc,
                    name: format!("case_{}", cases.len()),
                    input,
                    methods: Vec::new(),
                });
            }
            TokenKind::Method => methods.push(parse_method(p)?),
            _ => {
                return Err(Error::syntax(
                    token.loc,
                    format!("unexpected token parsing `test_group`: {}", token.value),
                ))
            }
        }
    }
    p.expect(TokenKind::RBrace)?;

    Ok(TestGroup {
        loc: start.loc,
        name,
        function_name,
        cases,
        methods,
        function: None,
    })
}

/// `@case [NAME] { @input STRING (@method ...)* }`
fn parse_test_case(p: &mut Parser, index: usize) -> Result<TestCase> {
    let start = p.expect(TokenKind::Case)?;
    let mut name = format!("case_{index}");
    if p.at(TokenKind::Identifier) {
        name = p.bump().value;
    }
    p.expect(TokenKind::LBrace)?;

    let mut saw_input = false;
    let mut input = String::new();
    let mut methods = Vec::new();
    while p.at(TokenKind::At) {
        p.bump();
        let token = p.current().clone();
        match token.kind {
            TokenKind::Input => {
                if saw_input {
                    return Err(Error::syntax(token.loc, "duplicate input"));
                }
                saw_input = true;
                p.bump();
                input = parse_string(p)?;
            }
            TokenKind::Method => methods.push(parse_method(p)?),
            _ => {
                return Err(Error::syntax(
                    token.loc,
                    format!("unexpected token parsing `case`: {}", token.value),
                ))
            }
        }
    }
    p.expect(TokenKind::RBrace)?;

    Ok(TestCase {
        loc: start.loc,
        name,
        input,
        methods,
    })
}

/// `@client[llm] NAME { @provider STRING (KV | @retry INT | @fallback ...)* }`
pub(crate) fn parse_client(p: &mut Parser) -> Result<ClientDecl> {
    let start = p.expect(TokenKind::Client)?;
    let name = p.expect_name()?;
    p.expect(TokenKind::LBrace)?;

    p.expect(TokenKind::At)?;
    p.expect(TokenKind::Provider)?;
    let provider = parse_string(p)?;

    let mut num_retries = 0u32;
    let mut default_fallback: Option<String> = None;
    let mut fallback_by_code = std::collections::BTreeMap::new();
    let mut args = std::collections::BTreeMap::new();

    loop {
        let token = p.current().clone();
        match token.kind {
            TokenKind::RBrace => break,
            TokenKind::Identifier => {
                let key = p.expect_name()?;
                let value = parse_string(p)?;
                args.insert(key, value);
            }
            TokenKind::At => {
                p.bump();
                let token = p.current().clone();
                match token.kind {
                    TokenKind::Retry => {
                        p.bump();
                        let count = p.expect(TokenKind::Identifier)?;
                        num_retries = count.value.parse().map_err(|_| {
                            Error::syntax(
                                count.loc.clone(),
                                format!("invalid retry count: {}", count.value),
                            )
                        })?;
                    }
                    TokenKind::Fallback => {
                        let keyword = p.bump();
                        match keyword.bracket_payload() {
                            None => default_fallback = Some(parse_string(p)?),
                            Some(payload) => {
                                let code: i64 = payload.parse().map_err(|_| {
                                    Error::syntax(
                                        keyword.loc.clone(),
                                        format!("invalid fallback code: {payload}"),
                                    )
                                })?;
                                if fallback_by_code.contains_key(&code) {
                                    return Err(Error::syntax(
                                        keyword.loc.clone(),
                                        format!("duplicate fallback code: {code}"),
                                    ));
                                }
                                fallback_by_code.insert(code, parse_string(p)?);
                            }
                        }
                    }
                    _ => {
                        return Err(Error::syntax(
                            token.loc,
                            format!("unexpected token after `@`: {}", token.value),
                        ))
                    }
                }
            }
            _ => {
                return Err(Error::syntax(
                    token.loc,
                    format!(
                        "unexpected token in client[llm]: {}: {}",
                        token.kind.label(),
                        token.value
                    ),
                ))
            }
        }
    }
    p.expect(TokenKind::RBrace)?;

    Ok(ClientDecl {
        loc: start.loc,
        name,
        provider,
        args,
        num_retries,
        default_fallback,
        fallback_by_code,
    })
}
