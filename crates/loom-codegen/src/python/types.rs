//! Emission of enums, classes, and LLM clients.

use loom_common::error::Result;
use loom_parser::ast::Unit;

use crate::writer::DirectoryWriter;

use super::util::{as_value, indent, method_py, py_default, py_stringify, py_type};

/// Shared import block for modules using the stringify runtime.
pub(super) const STRINGIFY_IMPORTS: &str = "import typing
from loom_py.stringify import (
    StringifyBase,
    StringifyError,
    StringifyNone,
    StringifyBool,
    StringifyInt,
    StringifyChar,
    StringifyString,
    StringifyFloat,
    StringifyEnum,
    StringifyUnion,
    StringifyOptional,
    StringifyList,
    StringifyClass,
    FieldDescription,
    EnumFieldDescription,
    StringifyRemappedField,
    StringifyCtx
)
";

const ENUM_TEMPLATE: &str = "from enum import Enum

class {@@name}(str, Enum):
    {@@values}

class Stringify{@@name}(StringifyEnum[{@@name}]):
    def __init__(self, **update_kwargs: StringifyRemappedField) -> None:
        values = {
            v: EnumFieldDescription(name=v.value, description=None, skip=False)
            for v in {@@name}
        }
        super().__init__(values=values, updates=update_kwargs)
";

const CLASS_TEMPLATE: &str = "from pydantic import BaseModel

class {@@name}(BaseModel):
    {@@properties}

class Stringify{@@name}(StringifyClass[{@@name}]):
    def __init__(self, **update_kwargs: StringifyRemappedField) -> None:
        values: typing.Dict[str, FieldDescription[typing.Any]] = {{@@property_descriptions}}
        super().__init__(model={@@name}, values=values, updates=update_kwargs)
";

const CLIENT_TEMPLATE: &str = "from loom_py import llm_client_factory, ENV

{@@name} = llm_client_factory(provider='{@@provider}', {@@params})
";

pub(super) fn emit_enum(unit: &Unit, index: usize, out: &mut DirectoryWriter) -> Result<()> {
    let decl = &unit.enums[index];
    let file = out.file(format!("custom_types/{}_.py", decl.name));
    file.set_var("name", &decl.name);

    let mut values = String::new();
    for value in &decl.values {
        values.push_str(&format!("{value} = \"{value}\"\n"));
    }
    file.set_var("values", indent(&values, 1));
    file.append(STRINGIFY_IMPORTS);
    file.append(ENUM_TEMPLATE);

    register_custom_type(out, &decl.name);
    Ok(())
}

pub(super) fn emit_class(
    unit: &Unit,
    index: usize,
    deps: &[String],
    out: &mut DirectoryWriter,
) -> Result<()> {
    let decl = &unit.classes[index];

    let mut properties = String::new();
    let mut descriptions = String::new();
    for property in &decl.properties {
        properties.push_str(&format!(
            "{}: {}{}\n",
            property.name,
            py_type(&property.ty.expr),
            py_default(&property.ty.expr)
        ));
        descriptions.push_str(&format!(
            "\"{name}\": FieldDescription(name=\"{name}\", description=None, type_desc={desc}),",
            name = property.name,
            desc = py_stringify(&property.ty.expr)
        ));
    }
    let mut methods = String::new();
    for method in &decl.methods {
        methods.push_str(&method_py(method, false)?);
    }
    if !methods.is_empty() {
        properties.push_str(&methods);
    }

    let file = out.file(format!("custom_types/{}_.py", decl.name));
    for dep in deps {
        file.add_import(format!(".{dep}_"), dep.clone(), false);
        file.add_import(format!(".{dep}_"), format!("Stringify{dep}"), false);
    }
    file.set_var("name", &decl.name);
    file.set_var("properties", indent(&properties, 1));
    file.set_var("property_descriptions", descriptions);
    file.append(STRINGIFY_IMPORTS);
    file.append(CLASS_TEMPLATE);

    register_custom_type(out, &decl.name);
    Ok(())
}

/// Re-export a type and its stringify wrapper from the package registries.
fn register_custom_type(out: &mut DirectoryWriter, name: &str) {
    out.file("custom_types/__init__.py")
        .add_import(format!(".{name}_"), name, true);
    out.file("custom_types/stringify.py")
        .add_import(format!(".{name}_"), format!("Stringify{name}"), true);
}

pub(super) fn emit_client(unit: &Unit, index: usize, out: &mut DirectoryWriter) -> Result<()> {
    let decl = &unit.clients[index];
    let file = out.file(format!("clients/llm_{}.py", decl.name));
    file.set_var("name", &decl.name);
    file.set_var("provider", &decl.provider);

    let mut params: Vec<String> = decl
        .args
        .iter()
        .map(|(key, value)| format!("{key}={}", as_value(value)))
        .collect();
    if decl.num_retries > 0 {
        params.push(format!("__retries__={}", decl.num_retries));
    }
    if let Some(fallback) = &decl.default_fallback {
        file.add_import(format!(".llm_{fallback}"), fallback.clone(), false);
        params.push(format!("__default_fallback__={fallback}"));
    }
    if !decl.fallback_by_code.is_empty() {
        let entries: Vec<String> = decl
            .fallback_by_code
            .iter()
            .map(|(code, client)| {
                file.add_import(format!(".llm_{client}"), client.clone(), false);
                format!("{code}: {client}")
            })
            .collect();
        params.push(format!("__fallback__={{{}}}", entries.join(", ")));
    }
    file.set_var("params", params.join(", "));
    file.append(CLIENT_TEMPLATE);

    out.file("clients/__init__.py")
        .add_import(format!(".llm_{}", decl.name), decl.name.clone(), true);
    Ok(())
}
