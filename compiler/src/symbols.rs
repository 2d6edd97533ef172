//! Per-function variable scopes and the temp/label register supply.

use fxhash::FxHashMap;

use crate::types::IrType;

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub register: String,
    pub ir_ty: IrType,
    /// Always true under the current stack-allocation convention: every
    /// variable is an `alloca`'d slot, never a bare SSA value.
    pub is_pointer: bool,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<FxHashMap<String, Variable>>,
    temp_counter: u32,
    label_counter: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets scopes and counters for a new function.
    pub fn enter_function(&mut self) {
        self.scopes.clear();
        self.scopes.push(FxHashMap::default());
        self.temp_counter = 0;
        self.label_counter = 0;
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declares `name` in the innermost scope, shadowing any outer binding
    /// for the remainder of that scope's lifetime.
    pub fn declare(&mut self, name: &str, ir_ty: IrType) -> Variable {
        let var = Variable {
            name: name.to_string(),
            register: format!("%{name}"),
            ir_ty,
            is_pointer: true,
        };
        self.scopes
            .last_mut()
            .expect("enter_function must be called before declare")
            .insert(name.to_string(), var.clone());
        var
    }

    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn fresh_temp(&mut self) -> String {
        let t = format!("%t{}", self.temp_counter);
        self.temp_counter += 1;
        t
    }

    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}{}", self.label_counter);
        self.label_counter += 1;
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut table = SymbolTable::new();
        table.enter_function();
        table.declare("x", IrType::I32);
        table.push_scope();
        table.declare("x", IrType::I64);
        assert_eq!(table.lookup("x").unwrap().ir_ty, IrType::I64);
        table.pop_scope();
        assert_eq!(table.lookup("x").unwrap().ir_ty, IrType::I32);
    }

    #[test]
    fn temp_and_label_counters_reset_per_function() {
        let mut table = SymbolTable::new();
        table.enter_function();
        assert_eq!(table.fresh_temp(), "%t0");
        assert_eq!(table.fresh_temp(), "%t1");
        assert_eq!(table.fresh_label("if.then"), "if.then0");
        table.enter_function();
        assert_eq!(table.fresh_temp(), "%t0");
        assert_eq!(table.fresh_label("if.then"), "if.then0");
    }
}
