//! Validation and linking of a merged unit.
//!
//! Order of checks:
//!
//! 1. Global name uniqueness across enums, classes, functions, and clients
//!    (one shared namespace), with the identifier rule
//!    `[A-Za-z][A-Za-z0-9_]*`.
//! 2. Variant attachment to owning functions; variant names unique per
//!    function.
//! 3. Test-group attachment; group names unique per function, case names
//!    unique per group.
//! 4. Per-declaration semantic checks.
//! 5. Linking of every type reference to its class or enum index.

use loom_common::error::{Error, Result};
use loom_common::loc::Loc;
use loom_parser::ast::{
    ClassDecl, ClientDecl, Method, RefTarget, Unit, Variant, VariantKind,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Validate the unit and fill in its cross-declaration links.
pub fn validate(unit: &mut Unit) -> Result<()> {
    let names = check_global_names(unit)?;
    attach_variants(unit)?;
    attach_test_groups(unit)?;

    for client in &unit.clients {
        check_client(client, &names.clients)?;
    }
    for decl in &unit.enums {
        if decl.values.is_empty() {
            return Err(Error::syntax(
                decl.loc.clone(),
                "enum must have at least one value",
            ));
        }
    }
    for class in &unit.classes {
        check_class(class, &names.classes, &names.enums)?;
    }
    for function in &unit.functions {
        function.input.validate(&names.classes, &names.enums)?;
        function.output.validate(&names.classes, &names.enums)?;
    }
    for variant in &unit.variants {
        check_variant(variant, &names)?;
    }

    link_types(unit);
    Ok(())
}

/// Name sets collected by the global pass.
struct NameSets {
    enums: FxHashSet<String>,
    classes: FxHashSet<String>,
    functions: FxHashSet<String>,
    clients: FxHashSet<String>,
}

/// Enforce the identifier grammar `[A-Za-z][A-Za-z0-9_]*`.
fn check_identifier(loc: &Loc, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::syntax(
            loc.clone(),
            format!("invalid identifier: {name}"),
        ))
    }
}

/// Walk enums, classes, functions, and clients, checking spelling and
/// global uniqueness across the shared namespace.
fn check_global_names(unit: &Unit) -> Result<NameSets> {
    let mut all: FxHashMap<String, Loc> = FxHashMap::default();
    let mut names = NameSets {
        enums: FxHashSet::default(),
        classes: FxHashSet::default(),
        functions: FxHashSet::default(),
        clients: FxHashSet::default(),
    };

    for decl in &unit.enums {
        claim_name(&mut all, &mut names.enums, &decl.loc, &decl.name, decl.to_string())?;
    }
    for decl in &unit.classes {
        claim_name(&mut all, &mut names.classes, &decl.loc, &decl.name, decl.to_string())?;
    }
    for decl in &unit.functions {
        claim_name(&mut all, &mut names.functions, &decl.loc, &decl.name, decl.to_string())?;
    }
    for decl in &unit.clients {
        claim_name(&mut all, &mut names.clients, &decl.loc, &decl.name, decl.to_string())?;
    }
    Ok(names)
}

/// Claim a name in the shared namespace, recording it in its kind's set.
fn claim_name(
    all: &mut FxHashMap<String, Loc>,
    target: &mut FxHashSet<String>,
    loc: &Loc,
    name: &str,
    described: String,
) -> Result<()> {
    check_identifier(loc, name)?;
    if let Some(first) = all.get(name) {
        return Err(Error::duplicate(
            first.clone(),
            vec![loc.clone()],
            format!("duplicate name `{name}` in {described}"),
        ));
    }
    all.insert(name.to_string(), loc.clone());
    target.insert(name.to_string());
    Ok(())
}

/// Attach each variant to its owning function; names unique per function.
fn attach_variants(unit: &mut Unit) -> Result<()> {
    let function_index: FxHashMap<String, usize> = unit
        .functions
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.clone(), i))
        .collect();

    let mut seen: FxHashMap<(usize, String), Loc> = FxHashMap::default();
    for vi in 0..unit.variants.len() {
        let variant = &unit.variants[vi];
        let Some(&fi) = function_index.get(&variant.function_name) else {
            return Err(Error::undefined(
                variant.loc.clone(),
                format!("function not found: {}", variant.function_name),
            ));
        };
        check_identifier(&variant.loc, &variant.name)?;
        if let Some(first) = seen.insert((fi, variant.name.clone()), variant.loc.clone()) {
            return Err(Error::duplicate(
                first,
                vec![variant.loc.clone()],
                format!("duplicate variant `{}` for {}", variant.name, unit.functions[fi]),
            ));
        }
        unit.functions[fi].variants.push(vi);
        unit.variants[vi].function = Some(fi);
    }
    Ok(())
}

/// Attach each test group to its owning function; group names unique per
/// function, case names unique per group.
fn attach_test_groups(unit: &mut Unit) -> Result<()> {
    let function_index: FxHashMap<String, usize> = unit
        .functions
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.clone(), i))
        .collect();

    let mut seen: FxHashMap<(usize, String), Loc> = FxHashMap::default();
    for gi in 0..unit.test_groups.len() {
        let group = &unit.test_groups[gi];
        let Some(&fi) = function_index.get(&group.function_name) else {
            return Err(Error::undefined(
                group.loc.clone(),
                format!("function not found: {}", group.function_name),
            ));
        };
        check_identifier(&group.loc, &group.name)?;
        if let Some(first) = seen.insert((fi, group.name.clone()), group.loc.clone()) {
            return Err(Error::duplicate(
                first,
                vec![group.loc.clone()],
                format!("duplicate test group `{}` for {}", group.name, unit.functions[fi]),
            ));
        }

        let mut case_locs: FxHashMap<&str, &Loc> = FxHashMap::default();
        for case in &group.cases {
            if let Some(first) = case_locs.insert(&case.name, &case.loc) {
                return Err(Error::duplicate(
                    first.clone(),
                    vec![case.loc.clone()],
                    format!("{}: duplicate test case: {}", group.name, case.name),
                ));
            }
        }
        for method in &group.methods {
            check_method(method)?;
        }
        for case in &group.cases {
            for method in &case.methods {
                check_method(method)?;
            }
        }

        unit.functions[fi].test_groups.push(gi);
        unit.test_groups[gi].function = Some(fi);
    }
    Ok(())
}

/// A method needs at least one language body, each language at most once.
fn check_method(method: &Method) -> Result<()> {
    if method.langs.is_empty() {
        return Err(Error::syntax(
            method.loc.clone(),
            format!("method {} must have at least one lang", method.name),
        ));
    }
    let mut seen: FxHashMap<&'static str, &Loc> = FxHashMap::default();
    for lang in &method.langs {
        if let Some(first) = seen.insert(lang.language.as_str(), &lang.loc) {
            return Err(Error::duplicate(
                first.clone(),
                vec![lang.loc.clone()],
                format!(
                    "duplicate lang[{}] in method {}",
                    lang.language.as_str(),
                    method.name
                ),
            ));
        }
    }
    Ok(())
}

/// Client checks: non-empty args, fallbacks exist and are not the client
/// itself.
fn check_client(client: &ClientDecl, client_names: &FxHashSet<String>) -> Result<()> {
    if client.args.is_empty() {
        return Err(Error::syntax(
            client.loc.clone(),
            "at least the model name is required for client[llm]",
        ));
    }
    for fallback in client
        .default_fallback
        .iter()
        .chain(client.fallback_by_code.values())
    {
        if *fallback == client.name {
            return Err(Error::syntax(
                client.loc.clone(),
                "cannot fallback to self",
            ));
        }
        if !client_names.contains(fallback) {
            return Err(Error::undefined(
                client.loc.clone(),
                format!("fallback client not found: {fallback}"),
            ));
        }
    }
    Ok(())
}

/// Class checks: property and method names share one pool, property types
/// resolve, methods are well-formed.
fn check_class(
    class: &ClassDecl,
    class_names: &FxHashSet<String>,
    enum_names: &FxHashSet<String>,
) -> Result<()> {
    let mut pool: FxHashMap<&str, &Loc> = FxHashMap::default();
    for property in &class.properties {
        if let Some(first) = pool.insert(&property.name, &property.loc) {
            return Err(Error::duplicate(
                first.clone(),
                vec![property.loc.clone()],
                format!("duplicate property name: {}", property.name),
            ));
        }
        property.ty.validate(class_names, enum_names)?;
    }
    for method in &class.methods {
        if let Some(first) = pool.insert(&method.name, &method.loc) {
            return Err(Error::duplicate(
                first.clone(),
                vec![method.loc.clone()],
                format!("duplicate method name: {}", method.name),
            ));
        }
        check_method(method)?;
    }
    Ok(())
}

/// Variant checks per kind.
fn check_variant(variant: &Variant, names: &NameSets) -> Result<()> {
    match &variant.kind {
        VariantKind::Llm {
            client_name,
            stringify,
            ..
        } => {
            if !names.clients.contains(client_name) {
                return Err(Error::undefined(
                    variant.loc.clone(),
                    format!("client[llm] not found: {client_name}"),
                ));
            }
            let mut overridden: FxHashSet<&str> = FxHashSet::default();
            for s in stringify {
                if !overridden.insert(&s.type_name) {
                    return Err(Error::duplicate(
                        variant.loc.clone(),
                        vec![s.loc.clone()],
                        format!("duplicate stringified type: {}", s.type_name),
                    ));
                }
                if !names.classes.contains(&s.type_name) && !names.enums.contains(&s.type_name) {
                    return Err(Error::undefined(
                        s.loc.clone(),
                        format!("stringified type must be enum or class: {}", s.type_name),
                    ));
                }
                let mut props: FxHashMap<&str, &Loc> = FxHashMap::default();
                for property in &s.properties {
                    if let Some(first) = props.insert(&property.name, &property.loc) {
                        return Err(Error::duplicate(
                            first.clone(),
                            vec![property.loc.clone()],
                            format!("duplicate stringified property: {}", property.name),
                        ));
                    }
                }
            }
            let mut method_names: FxHashMap<&str, &Loc> = FxHashMap::default();
            for method in &variant.methods {
                if let Some(first) = method_names.insert(&method.name, &method.loc) {
                    return Err(Error::duplicate(
                        first.clone(),
                        vec![method.loc.clone()],
                        format!("duplicate method: {}", method.name),
                    ));
                }
                check_method(method)?;
            }
        }
        VariantKind::Code { depends_on } => {
            for dep in depends_on {
                if !names.functions.contains(dep) {
                    return Err(Error::undefined(
                        variant.loc.clone(),
                        format!("dependency not found: {dep}"),
                    ));
                }
            }
            for method in &variant.methods {
                check_method(method)?;
            }
        }
    }
    Ok(())
}

/// Bind every `Ref` in class properties and function signatures to its
/// declaration index.
fn link_types(unit: &mut Unit) {
    let mut targets: FxHashMap<String, RefTarget> = FxHashMap::default();
    for (i, class) in unit.classes.iter().enumerate() {
        targets.insert(class.name.clone(), RefTarget::Class(i));
    }
    for (i, decl) in unit.enums.iter().enumerate() {
        targets.insert(decl.name.clone(), RefTarget::Enum(i));
    }

    for class in &mut unit.classes {
        for property in &mut class.properties {
            property.ty.link(&targets);
        }
    }
    for function in &mut unit.functions {
        function.input.link(&targets);
        function.output.link(&targets);
    }
}
