//! Emission of functions, variants, and test groups.

use loom_common::error::Result;
use loom_parser::ast::{StringifyOverride, Unit, Variant, VariantKind};
use rustc_hash::FxHashMap;

use crate::writer::DirectoryWriter;

use super::types::STRINGIFY_IMPORTS;
use super::util::{as_value, as_value_typed, indent, method_py, py_stringify, py_type};

const FUNCTION_TEMPLATE: &str = "import typing

VariantTypes = {@@variant_types}

async def {@@name}(variant: VariantTypes, args: {@@input_type}) -> {@@output_type}:
{@@variant_impls}
    raise NotImplementedError(f'Variant not found: {@@name}::{variant}')
";

const LLM_VARIANT_TEMPLATE: &str = "import typing
import json
from loom_py import LLMVariant

prompt = \"\"\"\\
{@@prompt}\"\"\"

stringifiers: typing.List[typing.Any] = []
def gen_stringify() -> StringifyBase[{@@output_type}]:
    with StringifyCtx():
        {@@stringify_init}
        return OUTPUT_STRINGIFY

OUTPUT_STRINGIFY = gen_stringify()

{@@methods}
{@@parser_middleware}
{@@custom_vars_middleware}
async def parser(raw_llm_output: str) -> {@@output_type}:
    return OUTPUT_STRINGIFY.parse(parser_middleware(raw_llm_output))

async def prompt_vars(arg: {@@input_type}) -> typing.Dict[str, str]:
    vars = {
        'input': str(arg),
        {@@input_props}
        'output.json': OUTPUT_STRINGIFY.json,
    }
    vars.update(custom_vars())
    for stringify in stringifiers:
        vars.update(**stringify.vars())
    vars.update(**OUTPUT_STRINGIFY.vars())
    return vars

Variant{@@name} = LLMVariant[{@@input_type}, {@@output_type}](
    '{@@func_name}', '{@@name}', prompt=prompt, client={@@client}, parser=parser, prompt_vars=prompt_vars)

async def RunVariant_{@@name}(arg: {@@input_type}) -> {@@output_type}:
    return await Variant{@@name}.run(arg)
";

const CODE_VARIANT_TEMPLATE: &str = "import typing
from loom_py import CodeVariant

InputType = {@@input_type}
OutputType = {@@output_type}

{@@method_str}

Variant{@@name} = CodeVariant[InputType, OutputType]('{@@func_name}', '{@@name}', func={@@name}_impl)

async def RunVariant_{@@name}(arg: InputType) -> OutputType:
    return await Variant{@@name}.run(arg)
";

const CODE_VARIANT_IMPL_TEMPLATE: &str = "import typing

InputType = {@@input_type}
OutputType = {@@output_type}

async def {@@name}_impl(arg: InputType) -> OutputType:
    # Write your code here
    raise NotImplementedError('Code Variants must be custom implemented: {@@unique_name}')
";

const TEST_GROUP_TEMPLATE: &str = "import typing
import pytest

InputType = typing.TypeVar('InputType', bound={@@input_type})
OutputType = typing.TypeVar('OutputType', bound={@@output_type})

@pytest.mark.loom_test
@pytest.mark.asyncio
@pytest.mark.parametrize(\"variant\", [{@@variants}])
class Test{@@group_name}:
";

pub(super) fn emit_function(
    unit: &Unit,
    index: usize,
    deps: &[String],
    out: &mut DirectoryWriter,
) -> Result<()> {
    let function = &unit.functions[index];
    let variant_names: Vec<&str> = function
        .variants
        .iter()
        .map(|&vi| unit.variants[vi].name.as_str())
        .collect();

    let variant_types = if variant_names.is_empty() {
        "typing.Never".to_string()
    } else {
        let quoted: Vec<String> = variant_names.iter().map(|n| format!("'{n}'")).collect();
        format!("typing.Literal[{}]", quoted.join(", "))
    };

    let mut variant_impls = String::new();
    for name in &variant_names {
        variant_impls.push_str(&format!(
            "    if variant == '{name}':\n        return await RunVariant_{name}(args)\n"
        ));
    }

    let file = out.file(format!("functions/{}_/__init__.py", function.name));
    for dep in deps {
        file.add_import("...custom_types", dep.clone(), false);
    }
    for name in &variant_names {
        file.add_import(".variants", format!("RunVariant_{name}"), false);
    }
    file.set_var("name", &function.name);
    file.set_var("input_type", py_type(&function.input.expr));
    file.set_var("output_type", py_type(&function.output.expr));
    file.set_var("variant_types", variant_types);
    file.set_var("variant_impls", variant_impls);
    file.append(FUNCTION_TEMPLATE);

    out.file("functions/__init__.py")
        .add_import(format!(".{}_", function.name), function.name.clone(), true);

    let variants_init = out.file(format!("functions/{}_/variants/__init__.py", function.name));
    for &vi in &function.variants {
        let variant = &unit.variants[vi];
        variants_init.add_import(
            format!(".{}_{}", variant.kind_str(), variant.name),
            format!("RunVariant_{}", variant.name),
            true,
        );
    }
    Ok(())
}

pub(super) fn emit_variant(
    unit: &Unit,
    index: usize,
    deps: &[String],
    out: &mut DirectoryWriter,
) -> Result<()> {
    let variant = &unit.variants[index];
    match &variant.kind {
        VariantKind::Llm {
            client_name,
            prompt,
            stringify,
        } => emit_llm_variant(unit, variant, client_name, prompt, stringify, deps, out),
        VariantKind::Code { depends_on } => {
            emit_code_variant(unit, variant, depends_on, deps, out)
        }
    }
}

fn emit_llm_variant(
    unit: &Unit,
    variant: &Variant,
    client_name: &str,
    prompt: &str,
    stringify: &[StringifyOverride],
    deps: &[String],
    out: &mut DirectoryWriter,
) -> Result<()> {
    let fi = variant
        .function
        .expect("variants are attached during validation");
    let function = &unit.functions[fi];

    let overrides: FxHashMap<&str, &StringifyOverride> = stringify
        .iter()
        .map(|s| (s.type_name.as_str(), s))
        .collect();

    // One stringifier per dependent type; the output stringifier is either
    // one of those (custom output type) or built from the type shape.
    let mut stringify_init = String::new();
    for dep in deps {
        stringify_init.push_str(&format!("stringify_{dep} = Stringify{dep}("));
        if let Some(over) = overrides.get(dep.as_str()) {
            stringify_init.push_str(&stringify_kwargs(over));
        }
        stringify_init.push_str(")\n");
        stringify_init.push_str(&format!("stringifiers.append(stringify_{dep})\n"));
    }
    if let TypeRefName::Custom(name) = output_ref_name(function) {
        stringify_init.push_str(&format!("OUTPUT_STRINGIFY = stringify_{name}\n"));
    } else {
        stringify_init.push_str(&format!(
            "OUTPUT_STRINGIFY = {}\n",
            py_stringify(&function.output.expr)
        ));
        stringify_init.push_str("stringifiers.append(OUTPUT_STRINGIFY)\n");
    }

    let mut methods = String::new();
    let mut has_parser_middleware = false;
    let mut has_custom_vars = false;
    for method in &variant.methods {
        methods.push_str(&method_py(method, false)?);
        methods.push('\n');
        if method.name == "parser_middleware" {
            has_parser_middleware = true;
        }
        if method.name == "custom_vars" {
            has_custom_vars = true;
        }
    }
    let parser_middleware = if has_parser_middleware {
        String::new()
    } else {
        "def parser_middleware(raw_llm_output: str) -> str:\n    return raw_llm_output\n"
            .to_string()
    };
    let custom_vars = if has_custom_vars {
        String::new()
    } else {
        "def custom_vars() -> typing.Dict[str, str]:\n    return {}\n".to_string()
    };

    let file = out.file(format!(
        "functions/{}_/variants/llm_{}.py",
        variant.function_name, variant.name
    ));
    for dep in deps {
        file.add_import("....custom_types", dep.clone(), false);
        file.add_import("....custom_types.stringify", format!("Stringify{dep}"), false);
    }
    file.add_import("....clients", client_name.to_string(), false);

    file.set_var("name", &variant.name);
    file.set_var("func_name", &function.name);
    file.set_var("client", client_name);
    file.set_var("input_type", py_type(&function.input.expr));
    file.set_var("output_type", py_type(&function.output.expr));
    file.set_var("prompt", prompt);
    file.set_var("stringify_init", indent(&stringify_init, 2));
    file.set_var("methods", methods);
    file.set_var("parser_middleware", parser_middleware);
    file.set_var("custom_vars_middleware", custom_vars);
    file.set_var("input_props", indent(&input_props(unit, fi), 2));
    file.append(STRINGIFY_IMPORTS);
    file.append(LLM_VARIANT_TEMPLATE);
    Ok(())
}

enum TypeRefName {
    Custom(String),
    Builtin,
}

/// The output type's reference name when it is a direct class or enum ref.
fn output_ref_name(function: &loom_parser::ast::FunctionDecl) -> TypeRefName {
    match &function.output.expr {
        loom_parser::ast::TypeExpr::Ref { name, .. } => TypeRefName::Custom(name.clone()),
        _ => TypeRefName::Builtin,
    }
}

/// Keyword arguments for a stringify override block.
fn stringify_kwargs(over: &StringifyOverride) -> String {
    let mut out = String::new();
    for property in &over.properties {
        out.push_str(&format!("{}=StringifyRemappedField(", property.name));
        if property.skip {
            out.push_str("skip=True,");
        } else {
            if let Some(rename) = &property.rename {
                out.push_str(&format!("rename={},", as_value(rename)));
            }
            if let Some(describe) = &property.describe {
                out.push_str(&format!("describe={},", as_value(describe)));
            }
        }
        out.push_str("),");
    }
    out
}

/// Template variables exposing the input's properties, walking nested
/// linked classes.
fn input_props(unit: &Unit, fi: usize) -> String {
    let function = &unit.functions[fi];
    let mut props = String::new();
    let mut pending: Vec<(String, usize)> = Vec::new();
    if let Some(ci) = function.input.class_target() {
        pending.push((String::new(), ci));
    }
    while let Some((prefix, ci)) = pending.pop() {
        let class = &unit.classes[ci];
        for property in &class.properties {
            let path = format!("{prefix}{}", property.name);
            props.push_str(&format!("'input.{path}': str(arg.{path}),\n"));
            if let Some(nested) = property.ty.class_target() {
                pending.push((format!("{path}."), nested));
            }
        }
        for method in &class.methods {
            let path = format!("{prefix}{}", method.name);
            props.push_str(&format!("'input.{path}': str(arg.{path}),\n"));
        }
    }
    props
}

fn emit_code_variant(
    unit: &Unit,
    variant: &Variant,
    depends_on: &[String],
    deps: &[String],
    out: &mut DirectoryWriter,
) -> Result<()> {
    let fi = variant
        .function
        .expect("variants are attached during validation");
    let function = &unit.functions[fi];

    let mut method_str = String::new();
    for method in &variant.methods {
        method_str.push_str(&method_py(method, false)?);
        method_str.push('\n');
    }
    let has_impl = variant.methods.iter().any(|m| m.name == "impl");
    if has_impl {
        method_str.push_str(&format!("{}_impl = impl", variant.name));
    }

    let unique_name = format!("{}::{}", variant.function_name, variant.name);
    let file = out.file(format!(
        "functions/{}_/variants/code_{}.py",
        variant.function_name, variant.name
    ));
    for dep in depends_on {
        file.add_import(format!("...{dep}_"), dep.clone(), false);
    }
    for dep in deps {
        if depends_on.contains(dep) {
            continue;
        }
        file.add_import("....custom_types", dep.clone(), false);
    }
    if !has_impl {
        file.add_import(
            format!(".code_{}_impl", variant.name),
            format!("{}_impl", variant.name),
            false,
        );
    }
    file.set_var("name", &variant.name);
    file.set_var("func_name", &function.name);
    file.set_var("input_type", py_type(&function.input.expr));
    file.set_var("output_type", py_type(&function.output.expr));
    file.set_var("method_str", method_str);
    file.append(CODE_VARIANT_TEMPLATE);

    if !has_impl {
        let impl_file = out.file(format!(
            "functions/{}_/variants/code_{}_impl.py",
            variant.function_name, variant.name
        ));
        for dep in depends_on {
            impl_file.add_import(format!("...{dep}_"), dep.clone(), false);
        }
        for dep in deps {
            if depends_on.contains(dep) {
                continue;
            }
            impl_file.add_import("....custom_types", dep.clone(), false);
        }
        impl_file.set_var("name", &variant.name);
        impl_file.set_var("unique_name", unique_name);
        impl_file.set_var("input_type", py_type(&function.input.expr));
        impl_file.set_var("output_type", py_type(&function.output.expr));
        impl_file.append(CODE_VARIANT_IMPL_TEMPLATE);
    }
    Ok(())
}

pub(super) fn emit_test_group(
    unit: &Unit,
    index: usize,
    deps: &[String],
    out: &mut DirectoryWriter,
) -> Result<()> {
    let group = &unit.test_groups[index];
    let fi = group
        .function
        .expect("test groups are attached during validation");
    let function = &unit.functions[fi];

    // Make sure the tests package exists even when the group is empty.
    out.file(format!("functions/{}_/tests/__init__.py", group.function_name));

    let variants: Vec<String> = function
        .variants
        .iter()
        .map(|&vi| format!("'{}'", unit.variants[vi].name))
        .collect();

    let mut group_eval_methods = String::new();
    for method in &group.methods {
        group_eval_methods.push_str(&method_py(method, true)?);
    }

    let mut cases = String::new();
    for case in &group.cases {
        let mut case_eval_methods = String::new();
        for method in &case.methods {
            case_eval_methods.push_str(&method_py(method, true)?);
        }
        let setter = if group_eval_methods.is_empty() && case_eval_methods.is_empty() {
            ""
        } else {
            "output = "
        };
        cases.push_str(&format!(
            "    async def test_{case_name}(self, variant: VariantTypes) -> None:
        arg = {arg}
        {setter}await {func_name}(variant, arg)
        {group_evals}
        {case_evals}
",
            case_name = case.name,
            arg = as_value_typed(&function.input, &case.input)?,
            setter = setter,
            func_name = function.name,
            group_evals = indent(&group_eval_methods, 2),
            case_evals = indent(&case_eval_methods, 2),
        ));
    }

    let file = out.file(format!(
        "functions/{}_/tests/test_{}.py",
        group.function_name, group.name
    ));
    file.add_import("..", group.function_name.clone(), false);
    file.add_import("..", "VariantTypes", false);
    for dep in deps {
        if dep != &group.function_name {
            file.add_import("....custom_types", dep.clone(), false);
        }
    }
    file.set_var("group_name", &group.name);
    file.set_var("func_name", &function.name);
    file.set_var("input_type", py_type(&function.input.expr));
    file.set_var("output_type", py_type(&function.output.expr));
    file.set_var("variants", variants.join(", "));
    file.append(TEST_GROUP_TEMPLATE);
    file.append(&cases);
    Ok(())
}
