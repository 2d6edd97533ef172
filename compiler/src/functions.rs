//! Shared registries for callable signatures: C externs and user functions.
//!
//! Kept separate from [`crate::structs::StructRegistry`] and
//! [`crate::emitter::Emitter`] per the distilled design's "ExternTable" /
//! "FunctionTable" split, even though all three now live inside one
//! [`crate::compilation::Compilation`] handle instead of free globals.

use indexmap::IndexMap;

use crate::types::IrType;

#[derive(Debug, Clone)]
pub struct ExternSignature {
    pub name: String,
    pub return_ty: IrType,
    pub params: Vec<IrType>,
    pub variadic: bool,
}

#[derive(Debug, Default)]
pub struct ExternTable {
    externs: IndexMap<String, ExternSignature>,
}

impl ExternTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// First registration for a name wins; re-declaring an extern with the
    /// same name is a no-op (mirrors the Emitter's own deduplication).
    pub fn register(&mut self, sig: ExternSignature) {
        self.externs.entry(sig.name.clone()).or_insert(sig);
    }

    pub fn lookup(&self, name: &str) -> Option<&ExternSignature> {
        self.externs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.externs.contains_key(name)
    }
}

/// A user function's signature, keyed in [`FunctionTable`] by its mangled
/// (public, IR-level) name.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub local_name: String,
    pub mangled_name: String,
    pub return_ty: IrType,
    /// For a method, index 0 is the implicit `this` parameter.
    pub params: Vec<IrType>,
}

/// Global registry of every function and method lowered so far, shared
/// across all modules in the compilation.
///
/// Free-function lookup by *local* name is inherently module-scoped (two
/// modules may each declare a function called `helper`), so that lookup is
/// the [`crate::walker::Walker`]'s own per-module responsibility; this table
/// only ever indexes by the globally unique mangled name. Method dispatch,
/// by contrast, is genuinely global — `obj.m(...)` must resolve the same way
/// no matter which module's code is doing the calling — so the method table
/// lives here.
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: IndexMap<String, FunctionSignature>,
    methods: IndexMap<String, IndexMap<String, FunctionSignature>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sig: FunctionSignature) {
        self.functions.insert(sig.mangled_name.clone(), sig);
    }

    pub fn lookup(&self, mangled_name: &str) -> Option<&FunctionSignature> {
        self.functions.get(mangled_name)
    }

    pub fn contains(&self, mangled_name: &str) -> bool {
        self.functions.contains_key(mangled_name)
    }

    pub fn register_method(&mut self, record: &str, method_name: &str, sig: FunctionSignature) {
        self.methods
            .entry(record.to_string())
            .or_default()
            .insert(method_name.to_string(), sig);
    }

    pub fn lookup_method(&self, record: &str, method_name: &str) -> Option<&FunctionSignature> {
        self.methods.get(record)?.get(method_name)
    }
}
