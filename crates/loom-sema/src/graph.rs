//! Dependency graph construction, topological ordering, and transitive
//! dependency closure.
//!
//! Every declaration contributes one vertex keyed by its unique name
//! (`name`, or `<function>::<name>` for variants and test groups). Edges
//! follow the per-kind rules of the data model: clients depend on their
//! fallback clients, classes and functions on the type names they
//! reference, variants on their function's dependencies (plus
//! `depends_on` functions for code variants), and test groups on their
//! function.
//!
//! The sort runs in waves: every vertex whose remaining dependency set is
//! empty is emitted, its name struck from the survivors, and the wave
//! number recorded as the vertex's depth. Vertices are then ordered by
//! `(depth, kind, source line)` so emission is deterministic and type
//! declarations precede their users inside a wave.

use loom_common::error::{Error, Result};
use loom_parser::ast::{DeclId, Unit, VariantKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// Safety bound on sort iterations; a graph this deep is pathological.
const MAX_WAVES: usize = 1000;

/// The emission order and per-declaration transitive dependency sets.
#[derive(Debug)]
pub struct Resolution {
    /// Declarations in emission order.
    pub order: Vec<DeclId>,
    /// Unique name -> transitive dependency names, sorted.
    pub deps: FxHashMap<String, Vec<String>>,
}

impl Resolution {
    /// The transitive dependencies of a declaration, by unique name.
    pub fn deps_of(&self, unique_name: &str) -> &[String] {
        self.deps.get(unique_name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Build the graph and compute `(order, transitive deps)` for a validated
/// unit.
pub fn resolve(unit: &Unit) -> Result<Resolution> {
    let ids = unit.decl_ids();
    let names: Vec<String> = ids.iter().map(|id| id.unique_name(unit)).collect();
    let direct: Vec<Vec<String>> = ids.iter().map(|id| direct_deps(unit, *id)).collect();

    // ── Topological sort in waves ──────────────────────────────────────
    let mut outstanding: Vec<Option<FxHashSet<String>>> = direct
        .iter()
        .map(|deps| Some(deps.iter().cloned().collect()))
        .collect();
    let mut depth = vec![0usize; ids.len()];
    let mut remaining = ids.len();

    for wave in 1..=MAX_WAVES {
        if remaining == 0 {
            break;
        }
        let ready: Vec<usize> = (0..ids.len())
            .filter(|&i| matches!(&outstanding[i], Some(deps) if deps.is_empty()))
            .collect();
        if ready.is_empty() {
            break;
        }
        let mut emitted: FxHashSet<&str> = FxHashSet::default();
        for &i in &ready {
            depth[i] = wave;
            outstanding[i] = None;
            emitted.insert(names[i].as_str());
            remaining -= 1;
        }
        for slot in outstanding.iter_mut() {
            if let Some(deps) = slot {
                deps.retain(|d| !emitted.contains(d.as_str()));
            }
        }
    }

    if remaining > 0 {
        let survivors: Vec<&str> = (0..ids.len())
            .filter(|&i| outstanding[i].is_some())
            .map(|i| names[i].as_str())
            .collect();
        let first = ids
            .iter()
            .zip(&outstanding)
            .find(|(_, slot)| slot.is_some())
            .map(|(id, _)| *id)
            .expect("a survivor exists when remaining > 0");
        return Err(Error::circular(
            first.loc(unit).clone(),
            format!("dependency cycle involving: {}", survivors.join(", ")),
        ));
    }

    // ── Secondary ordering: (depth, kind, source line) ─────────────────
    let mut order_indices: Vec<usize> = (0..ids.len()).collect();
    order_indices.sort_by_key(|&i| (depth[i], ids[i].kind_order(), ids[i].loc(unit).line));

    // ── Transitive closure, folded in topological order ────────────────
    // A vertex's dependencies always sit in strictly earlier waves, so by
    // the time a vertex is folded its dependencies' closures are complete.
    let mut closure: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for &i in &order_indices {
        let mut set: FxHashSet<String> = direct[i].iter().cloned().collect();
        for dep in &direct[i] {
            if let Some(dep_closure) = closure.get(dep.as_str()) {
                set.extend(dep_closure.iter().cloned());
            }
        }
        let mut sorted: Vec<String> = set.into_iter().collect();
        sorted.sort();
        closure.insert(names[i].clone(), sorted);
    }

    Ok(Resolution {
        order: order_indices.into_iter().map(|i| ids[i]).collect(),
        deps: closure,
    })
}

/// The direct dependency names of one declaration.
fn direct_deps(unit: &Unit, id: DeclId) -> Vec<String> {
    match id {
        DeclId::Enum(_) => Vec::new(),
        DeclId::Class(i) => {
            let mut deps = Vec::new();
            for property in &unit.classes[i].properties {
                for name in property.ty.ref_names() {
                    if !deps.contains(&name) {
                        deps.push(name);
                    }
                }
            }
            deps
        }
        DeclId::Client(i) => unit.clients[i].fallback_names(),
        DeclId::Function(i) => function_deps(unit, i),
        DeclId::Variant(i) => {
            let variant = &unit.variants[i];
            let fi = variant
                .function
                .expect("variants are attached during validation");
            let mut deps = function_deps(unit, fi);
            if let VariantKind::Code { depends_on } = &variant.kind {
                for name in depends_on {
                    if !deps.contains(name) {
                        deps.push(name.clone());
                    }
                }
            }
            deps
        }
        DeclId::TestGroup(i) => vec![unit.test_groups[i].function_name.clone()],
    }
}

/// Type names referenced by a function's input and output.
fn function_deps(unit: &Unit, fi: usize) -> Vec<String> {
    let function = &unit.functions[fi];
    let mut deps = function.input.ref_names();
    for name in function.output.ref_names() {
        if !deps.contains(&name) {
            deps.push(name);
        }
    }
    deps
}
