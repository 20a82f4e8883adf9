//! Python rendering helpers: type spellings, stringify expressions, value
//! literals, indentation, and method bodies.

use loom_common::error::{Error, Result};
use loom_parser::ast::{Language, Method, Primitive, Ty, TypeExpr};

/// The Python type annotation for a Loom type.
pub(crate) fn py_type(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Primitive(p) => match p {
            Primitive::Int => "int".to_string(),
            Primitive::Float => "float".to_string(),
            Primitive::Bool => "bool".to_string(),
            Primitive::Char | Primitive::String => "str".to_string(),
            Primitive::Null => "None".to_string(),
        },
        TypeExpr::Ref { name, .. } => name.clone(),
        TypeExpr::Optional(inner) => format!("typing.Optional[{}]", py_type(inner)),
        TypeExpr::List(inner) => format!("typing.List[{}]", py_type(inner)),
        TypeExpr::Union(items) => {
            let parts: Vec<String> = items.iter().map(py_type).collect();
            format!("typing.Union[{}]", parts.join(", "))
        }
    }
}

/// The runtime stringify expression for a Loom type.
pub(crate) fn py_stringify(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Primitive(p) => match p {
            Primitive::Int => "StringifyInt()".to_string(),
            Primitive::Float => "StringifyFloat()".to_string(),
            Primitive::Bool => "StringifyBool()".to_string(),
            Primitive::Char => "StringifyChar()".to_string(),
            Primitive::String => "StringifyString()".to_string(),
            Primitive::Null => "StringifyNone()".to_string(),
        },
        TypeExpr::Ref { name, .. } => format!("Stringify{name}()"),
        TypeExpr::Optional(inner) => format!("StringifyOptional({})", py_stringify(inner)),
        TypeExpr::List(inner) => format!("StringifyList({})", py_stringify(inner)),
        TypeExpr::Union(items) => {
            let parts: Vec<String> = items.iter().map(py_stringify).collect();
            format!("StringifyUnion[{}]({})", py_type(expr), parts.join(", "))
        }
    }
}

/// The property default suffix: optionals default to `None`.
pub(crate) fn py_default(expr: &TypeExpr) -> &'static str {
    match expr {
        TypeExpr::Optional(_) => " = None",
        _ => "",
    }
}

/// Format a client-arg or free-form value as a Python expression.
///
/// Numbers, booleans, already-quoted literals, f-strings, constructor
/// calls, and `None` pass through; `@ENV.X` drops the sigil; everything
/// else is triple-quoted.
pub(crate) fn as_value(value: &str) -> String {
    if is_number(value) {
        return value.to_string();
    }
    match value {
        "true" | "True" => return "True".to_string(),
        "false" | "False" => return "False".to_string(),
        "None" => return "None".to_string(),
        "" => return "''".to_string(),
        _ => {}
    }
    if is_wrapped(value) || is_f_string(value) {
        return value.to_string();
    }
    if let Some(env) = env_reference(value) {
        return env.to_string();
    }
    if is_constructor(value) {
        return value.to_string();
    }
    format!("'''{value}'''")
}

/// Format a test-case input checked against the function's input type.
pub(crate) fn as_value_typed(ty: &Ty, value: &str) -> Result<String> {
    match &ty.expr {
        TypeExpr::Primitive(Primitive::Bool) => match value {
            "true" | "True" => Ok("True".to_string()),
            "false" | "False" => Ok("False".to_string()),
            _ => Err(Error::syntax(
                ty.loc.clone(),
                format!("invalid boolean value: {value}"),
            )),
        },
        TypeExpr::Primitive(Primitive::Int) | TypeExpr::Primitive(Primitive::Float) => {
            if is_number(value) {
                Ok(value.to_string())
            } else {
                Err(Error::syntax(
                    ty.loc.clone(),
                    format!("invalid number value: {value}"),
                ))
            }
        }
        TypeExpr::Primitive(Primitive::String) | TypeExpr::Primitive(Primitive::Char) => {
            let bytes = value.as_bytes();
            let quoted = bytes.len() >= 2
                && ((bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
                    || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\''));
            if quoted || is_f_string(value) {
                return Ok(value.to_string());
            }
            if let Some(env) = env_reference(value) {
                return Ok(env.to_string());
            }
            if value.is_empty() {
                return Ok("''".to_string());
            }
            Ok(format!("'''{value}'''"))
        }
        _ => Ok(value.to_string()),
    }
}

/// Render a method's Python body; optionally append the eval-style call
/// used by generated tests.
pub(crate) fn method_py(method: &Method, with_usage: bool) -> Result<String> {
    let Some(block) = method.body(Language::Python) else {
        return Err(Error::syntax(
            method.loc.clone(),
            format!("no python implementation for method {}", method.name),
        ));
    };
    let mut out = block.code.clone();
    out.push('\n');
    if with_usage {
        if block.code.starts_with("async") {
            out.push_str("await ");
        }
        out.push_str(&method.name);
        out.push_str("(arg, output)\n");
    }
    Ok(out)
}

/// Re-indent a block: every line after the first is prefixed with
/// `level * 4` spaces. Leading and trailing newlines are dropped.
pub(crate) fn indent(value: &str, level: usize) -> String {
    let pad = "    ".repeat(level);
    let trimmed = value.trim_matches('\n');
    trimmed.replace('\n', &format!("\n{pad}"))
}

/// `[-+]?[0-9]*\.?[0-9]+`
fn is_number(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    match frac_part {
        Some(frac) => {
            !frac.is_empty()
                && frac.bytes().all(|b| b.is_ascii_digit())
                && int_part.bytes().all(|b| b.is_ascii_digit())
        }
        None => !int_part.is_empty() && int_part.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// Wrapped in matching `()`, `[]`, `{}`, `""`, or `''`.
fn is_wrapped(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    matches!(
        (bytes[0], bytes[bytes.len() - 1]),
        (b'(', b')') | (b'[', b']') | (b'{', b'}') | (b'"', b'"') | (b'\'', b'\'')
    )
}

/// `f"..."` or `f'...'`.
fn is_f_string(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 3
        && bytes[0] == b'f'
        && bytes[1] == bytes[bytes.len() - 1]
        && (bytes[1] == b'"' || bytes[1] == b'\'')
}

/// `@ENV.NAME` returns the reference without the sigil.
fn env_reference(value: &str) -> Option<&str> {
    let rest = value.strip_prefix("@ENV.")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(&value[1..])
    } else {
        None
    }
}

/// Constructor-shaped: `Name(...)` with balanced pairs outside strings.
fn is_constructor(value: &str) -> bool {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string: Option<char> = None;
    for c in value.chars() {
        if let Some(quote) = in_string {
            if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '(' | '[' | '{' => stack.push(c),
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            '}' => {
                if stack.pop() != Some('{') {
                    return false;
                }
            }
            _ => {}
        }
    }
    if !stack.is_empty() || in_string.is_some() {
        return false;
    }

    let trimmed = value.trim_end();
    if !trimmed.ends_with(')') {
        return false;
    }
    let Some(open) = trimmed.find('(') else {
        return false;
    };
    let head = &trimmed[..open];
    let mut chars = head.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
