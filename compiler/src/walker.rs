//! AST-to-IR lowering.
//!
//! A [`Walker`] processes one [`Module`] against a shared [`Compilation`]
//! handle in three passes — records, externs, bodies — matching the order
//! the emitter's own sections are written in. The same function-call
//! resolution order (imports, then this module's own functions, then
//! externs) backs both plain calls and the uniform-call-syntax dispatch
//! used for methods.

use std::collections::HashMap;

use parser::ast::{
    BinOp, Block, Expr, ExprKind, FunctionDecl, ItemKind, Stmt, StmtKind, Type, UnaryOp,
};

use crate::compilation::Compilation;
use crate::error::CompileError;
use crate::functions::FunctionSignature;
use crate::resolver::Module;
use crate::symbols::SymbolTable;
use crate::types::{get_binary_op, get_compare_op, map_type, IrType};

/// A lowered expression's register together with its static IR type —
/// carrying the type alongside every value is what lets boolean coercion
/// and call-argument formatting avoid guessing from the register's text.
#[derive(Debug, Clone)]
struct IrValue {
    reg: String,
    ty: IrType,
}

pub struct Walker<'a> {
    module: &'a Module,
    comp: &'a mut Compilation,
    symbols: SymbolTable,
    /// This module's own top-level functions, keyed by local (unmangled)
    /// name. Distinct from `comp.functions`, which is keyed by the globally
    /// unique mangled name — free-function lookup by local name is only
    /// ever meaningful within the declaring module.
    local_functions: HashMap<String, FunctionSignature>,
    current_return_ty: IrType,
}

impl<'a> Walker<'a> {
    pub fn new(module: &'a Module, comp: &'a mut Compilation) -> Self {
        Self {
            module,
            comp,
            symbols: SymbolTable::new(),
            local_functions: HashMap::new(),
            current_return_ty: IrType::Void,
        }
    }

    pub fn walk(mut self) -> Result<(), CompileError> {
        log::info!("lowering module `{}`", self.module.short_name);
        self.records_pass()?;
        self.externs_pass()?;
        self.bodies_pass()?;
        Ok(())
    }

    fn records_pass(&mut self) -> Result<(), CompileError> {
        for item in &self.module.ast.items {
            let ItemKind::Interface(decl) = &item.kind else {
                continue;
            };
            if decl.type_params.is_empty() {
                let mut field_specs = Vec::with_capacity(decl.fields.len());
                for field in &decl.fields {
                    let ir_ty = map_type(&field.ty, &mut self.comp.structs, &self.comp.templates)?;
                    field_specs.push((field.name.clone(), ir_ty, field.ty.to_string()));
                }
                self.comp.structs.register(decl.name.clone(), field_specs)?;
            } else {
                self.comp.templates.insert(decl.name.clone(), decl.clone());
            }
        }
        Ok(())
    }

    fn externs_pass(&mut self) -> Result<(), CompileError> {
        for item in &self.module.ast.items {
            let ItemKind::Extern(decl) = &item.kind else {
                continue;
            };
            let return_ty = map_type(&decl.return_ty, &mut self.comp.structs, &self.comp.templates)?;
            let mut params = Vec::with_capacity(decl.params.len());
            let mut variadic = false;
            for p in &decl.params {
                if p.variadic {
                    variadic = true;
                    continue;
                }
                params.push(map_type(&p.ty, &mut self.comp.structs, &self.comp.templates)?);
            }
            let param_strs: Vec<String> = params.iter().map(|t| t.to_string()).collect();
            self.comp
                .emitter
                .add_extern_function(&decl.name, &return_ty.to_string(), &param_strs, variadic);
            self.comp.externs.register(crate::functions::ExternSignature {
                name: decl.name.clone(),
                return_ty,
                params,
                variadic,
            });
        }
        Ok(())
    }

    /// Two sweeps over this module's functions: first every signature is
    /// computed and registered (`comp.functions`, `local_functions`, and the
    /// per-record method table), then every body is lowered. Splitting these
    /// is what lets a call or method dispatch inside an earlier function's
    /// body resolve a function declared later in the same module — the
    /// surface language hoists declarations the way the scripting language
    /// it models does, so forward references and mutual recursion between
    /// two functions in one module must both resolve.
    fn bodies_pass(&mut self) -> Result<(), CompileError> {
        let module = self.module;
        let funcs: Vec<&FunctionDecl> = module
            .ast
            .items
            .iter()
            .filter_map(|item| match &item.kind {
                ItemKind::Function(f) | ItemKind::ExportFunction(f) => Some(f),
                _ => None,
            })
            .collect();

        for &func in &funcs {
            self.register_function_signature(func)?;
        }
        for &func in &funcs {
            self.lower_function(func)?;
        }
        Ok(())
    }

    fn register_function_signature(&mut self, func: &FunctionDecl) -> Result<(), CompileError> {
        let (mangled, method_of) = mangled_name(func, &self.module.short_name);
        let return_ty = map_type(&func.return_ty, &mut self.comp.structs, &self.comp.templates)?;
        let mut param_tys = Vec::with_capacity(func.params.len());
        for p in &func.params {
            param_tys.push(map_type(&p.ty, &mut self.comp.structs, &self.comp.templates)?);
        }

        let sig = FunctionSignature {
            local_name: func.name.clone(),
            mangled_name: mangled,
            return_ty,
            params: param_tys,
        };
        self.comp.functions.register(sig.clone());
        if let Some(record_name) = &method_of {
            self.comp.functions.register_method(record_name, &func.name, sig);
        } else {
            self.local_functions.insert(func.name.clone(), sig);
        }
        Ok(())
    }

    fn lower_function(&mut self, func: &FunctionDecl) -> Result<(), CompileError> {
        log::debug!("lowering function `{}`", func.name);
        let (mangled, _) = mangled_name(func, &self.module.short_name);
        let sig = self
            .comp
            .functions
            .lookup(&mangled)
            .cloned()
            .expect("register_function_signature runs for every function before lower_function");
        let return_ty = sig.return_ty;
        let param_tys = sig.params;

        self.symbols.enter_function();
        self.current_return_ty = return_ty.clone();

        let param_strs: Vec<String> = func
            .params
            .iter()
            .zip(&param_tys)
            .map(|(p, t)| format!("{t} %{}.param", p.name))
            .collect();
        self.comp
            .emitter
            .start_function(&format!("define {return_ty} @{mangled}({})", param_strs.join(", ")));
        self.comp.emitter.emit_label("entry");

        for (p, ty) in func.params.iter().zip(&param_tys) {
            let var = self.symbols.declare(&p.name, ty.clone());
            self.comp.emitter.emit_line(format!("{} = alloca {ty}", var.register));
            self.comp
                .emitter
                .emit_line(format!("store {ty} %{}.param, {ty}* {}", p.name, var.register));
        }

        self.lower_block(&func.body)?;

        if return_ty == IrType::Void && !block_terminates(&func.body) {
            self.comp.emitter.emit_line("ret void");
        }
        self.comp.emitter.end_function();
        Ok(())
    }

    fn lower_block(&mut self, block: &Block) -> Result<(), CompileError> {
        for stmt in &block.stmts {
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match &stmt.kind {
            StmtKind::Return(expr) => self.lower_return(expr.as_ref()),
            StmtKind::Let { name, ty, init } => self.lower_let(name, ty, init),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(cond, then_branch, else_branch.as_deref()),
            StmtKind::While { cond, body } => self.lower_while(cond, body),
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => self.lower_for(init.as_deref(), cond.as_ref(), step.as_ref(), body),
            StmtKind::Block(b) => {
                self.symbols.push_scope();
                let result = self.lower_block(b);
                self.symbols.pop_scope();
                result
            }
            StmtKind::Expr(e) => {
                self.lower_expr(e)?;
                Ok(())
            }
        }
    }

    fn lower_return(&mut self, expr: Option<&Expr>) -> Result<(), CompileError> {
        match expr {
            Some(e) => {
                let val = self.lower_expr(e)?;
                let ty = self.current_return_ty.clone();
                self.comp.emitter.emit_line(format!("ret {ty} {}", val.reg));
            }
            None => self.comp.emitter.emit_line("ret void"),
        }
        Ok(())
    }

    fn lower_let(&mut self, name: &str, ty: &Type, init: &Expr) -> Result<(), CompileError> {
        let var_ty = map_type(ty, &mut self.comp.structs, &self.comp.templates)?;
        let init_val = self.lower_expr(init)?;
        let value_reg = self.coerce_to_declared(&var_ty, init_val);

        let var = self.symbols.declare(name, var_ty.clone());
        self.comp.emitter.emit_line(format!("{} = alloca {var_ty}", var.register));
        self.comp
            .emitter
            .emit_line(format!("store {var_ty} {value_reg}, {var_ty}* {}", var.register));
        Ok(())
    }

    fn lower_if(&mut self, cond: &Expr, then_branch: &Block, else_branch: Option<&Stmt>) -> Result<(), CompileError> {
        let cond_val = self.lower_expr(cond)?;
        let cond_bool = self.coerce_bool(cond_val);
        let then_label = self.symbols.fresh_label("if.then");
        let end_label = self.symbols.fresh_label("if.end");
        let else_label = else_branch.map(|_| self.symbols.fresh_label("if.else"));
        let false_target = else_label.clone().unwrap_or_else(|| end_label.clone());

        self.comp
            .emitter
            .emit_line(format!("br i1 {cond_bool}, label %{then_label}, label %{false_target}"));
        self.comp.emitter.emit_label(&then_label);
        self.symbols.push_scope();
        self.lower_block(then_branch)?;
        self.symbols.pop_scope();
        if !block_terminates(then_branch) {
            self.comp.emitter.emit_line(format!("br label %{end_label}"));
        }

        // The end label has no predecessor (and must be omitted, not left as
        // a dangling empty block) only when an else branch is present and
        // both arms terminate — otherwise the false edge out of the initial
        // `br` always reaches it.
        let mut end_reachable = else_branch.is_none() || !block_terminates(then_branch);

        if let (Some(else_label), Some(else_stmt)) = (else_label, else_branch) {
            self.comp.emitter.emit_label(&else_label);
            self.symbols.push_scope();
            self.lower_stmt(else_stmt)?;
            self.symbols.pop_scope();
            if !stmt_terminates(else_stmt) {
                self.comp.emitter.emit_line(format!("br label %{end_label}"));
                end_reachable = true;
            }
        }

        if end_reachable {
            self.comp.emitter.emit_label(&end_label);
        }
        Ok(())
    }

    fn lower_while(&mut self, cond: &Expr, body: &Block) -> Result<(), CompileError> {
        let cond_label = self.symbols.fresh_label("while.cond");
        let body_label = self.symbols.fresh_label("while.body");
        let end_label = self.symbols.fresh_label("while.end");

        self.comp.emitter.emit_line(format!("br label %{cond_label}"));
        self.comp.emitter.emit_label(&cond_label);
        let cond_val = self.lower_expr(cond)?;
        let cond_bool = self.coerce_bool(cond_val);
        self.comp
            .emitter
            .emit_line(format!("br i1 {cond_bool}, label %{body_label}, label %{end_label}"));
        self.comp.emitter.emit_label(&body_label);
        self.symbols.push_scope();
        self.lower_block(body)?;
        self.symbols.pop_scope();
        if !block_terminates(body) {
            self.comp.emitter.emit_line(format!("br label %{cond_label}"));
        }
        // The conditional branch out of `cond_label` always gives `end_label`
        // a predecessor, whether or not the body falls through.
        self.comp.emitter.emit_label(&end_label);
        Ok(())
    }

    fn lower_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        step: Option<&Expr>,
        body: &Block,
    ) -> Result<(), CompileError> {
        self.symbols.push_scope();
        if let Some(s) = init {
            self.lower_stmt(s)?;
        }
        let cond_label = self.symbols.fresh_label("for.cond");
        let body_label = self.symbols.fresh_label("for.body");
        let end_label = self.symbols.fresh_label("for.end");

        self.comp.emitter.emit_line(format!("br label %{cond_label}"));
        self.comp.emitter.emit_label(&cond_label);
        // A condition's false edge is `end_label`'s only possible predecessor
        // (there is no `break`) — with no condition the loop is unconditionally
        // infinite and `end_label` is unreachable.
        let end_reachable = cond.is_some();
        match cond {
            Some(c) => {
                let cond_val = self.lower_expr(c)?;
                let cond_bool = self.coerce_bool(cond_val);
                self.comp
                    .emitter
                    .emit_line(format!("br i1 {cond_bool}, label %{body_label}, label %{end_label}"));
            }
            // No condition: unconditional branch into the body, forming an infinite loop.
            None => self.comp.emitter.emit_line(format!("br label %{body_label}")),
        }

        self.comp.emitter.emit_label(&body_label);
        self.symbols.push_scope();
        self.lower_block(body)?;
        self.symbols.pop_scope();
        if !block_terminates(body) {
            if let Some(s) = step {
                self.lower_expr(s)?;
            }
            self.comp.emitter.emit_line(format!("br label %{cond_label}"));
        }
        if end_reachable {
            self.comp.emitter.emit_label(&end_label);
        }
        self.symbols.pop_scope();
        Ok(())
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<IrValue, CompileError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(IrValue {
                reg: n.to_string(),
                ty: IrType::I32,
            }),
            ExprKind::Bool(b) => Ok(IrValue {
                reg: if *b { "1" } else { "0" }.to_string(),
                ty: IrType::I1,
            }),
            ExprKind::Str(s) => self.lower_string_literal(s),
            ExprKind::This => self.load_var("this"),
            ExprKind::Ident(name) => self.load_var(name),
            ExprKind::Paren(inner) => self.lower_expr(inner),
            ExprKind::Unary(UnaryOp::Neg, operand) => {
                let v = self.lower_expr(operand)?;
                let t = self.symbols.fresh_temp();
                self.comp.emitter.emit_line(format!("{t} = sub i32 0, {}", v.reg));
                Ok(IrValue { reg: t, ty: IrType::I32 })
            }
            ExprKind::Unary(UnaryOp::Not, operand) => {
                let v = self.lower_expr(operand)?;
                let t = self.symbols.fresh_temp();
                self.comp.emitter.emit_line(format!("{t} = icmp eq i32 {}, 0", v.reg));
                Ok(IrValue { reg: t, ty: IrType::I1 })
            }
            ExprKind::Binary(op, l, r) => self.lower_binary(*op, l, r),
            ExprKind::Assign { target, value } => self.lower_assign(target, value),
            ExprKind::Call { callee, args } => self.lower_call(callee, args),
            ExprKind::SizeOf(ty) => self.lower_sizeof(ty),
            ExprKind::Field { .. } => {
                let (ptr, ty) = self.address_of(expr)?;
                let t = self.symbols.fresh_temp();
                self.comp.emitter.emit_line(format!("{t} = load {ty}, {ty}* {ptr}"));
                Ok(IrValue { reg: t, ty })
            }
            ExprKind::MethodCall { base, method, args } => self.lower_method_call(base, method, args),
            ExprKind::Index { base, index } => {
                let (ptr, ty) = self.array_element_ptr(base, index)?;
                let t = self.symbols.fresh_temp();
                self.comp.emitter.emit_line(format!("{t} = load {ty}, {ty}* {ptr}"));
                Ok(IrValue { reg: t, ty })
            }
        }
    }

    fn lower_string_literal(&mut self, s: &str) -> Result<IrValue, CompileError> {
        let (global, len) = self.comp.emitter.add_string_constant(s);
        let t = self.symbols.fresh_temp();
        self.comp
            .emitter
            .emit_line(format!("{t} = getelementptr [{len} x i8], [{len} x i8]* {global}, i32 0, i32 0"));
        Ok(IrValue {
            reg: t,
            ty: IrType::ptr(IrType::I8),
        })
    }

    fn lower_binary(&mut self, op: BinOp, l: &Expr, r: &Expr) -> Result<IrValue, CompileError> {
        let lv = self.lower_expr(l)?;
        let rv = self.lower_expr(r)?;
        let t = self.symbols.fresh_temp();
        if matches!(op, BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne) {
            let (instruction, predicate) = get_compare_op(op, &lv.ty);
            self.comp
                .emitter
                .emit_line(format!("{t} = {instruction} {predicate} {} {}, {}", lv.ty, lv.reg, rv.reg));
            Ok(IrValue { reg: t, ty: IrType::I1 })
        } else {
            let mnemonic = get_binary_op(op, &lv.ty);
            self.comp
                .emitter
                .emit_line(format!("{t} = {mnemonic} {} {}, {}", lv.ty, lv.reg, rv.reg));
            Ok(IrValue { reg: t, ty: lv.ty })
        }
    }

    fn lower_assign(&mut self, target: &Expr, value: &Expr) -> Result<IrValue, CompileError> {
        let (ptr, pointee_ty) = self.lvalue_address(target)?;
        let val = self.lower_expr(value)?;
        let store_reg = self.coerce_to_declared(&pointee_ty, val);
        self.comp
            .emitter
            .emit_line(format!("store {pointee_ty} {store_reg}, {pointee_ty}* {ptr}"));
        Ok(IrValue {
            reg: store_reg,
            ty: pointee_ty,
        })
    }

    fn lower_sizeof(&mut self, ty: &Type) -> Result<IrValue, CompileError> {
        let ir_ty = map_type(ty, &mut self.comp.structs, &self.comp.templates)?;
        let record_name = struct_name_of(&ir_ty).ok_or_else(|| {
            CompileError::intrinsic_misuse(format!("`sizeof<{ty}>()` is only valid for a record type"))
        })?;
        let record = self.comp.structs.lookup(&record_name).ok_or_else(|| {
            CompileError::intrinsic_misuse(format!("`sizeof<{record_name}>` refers to an unregistered record"))
        })?;
        Ok(IrValue {
            reg: record.total_size.to_string(),
            ty: IrType::I32,
        })
    }

    fn lower_call(&mut self, callee: &str, args: &[Expr]) -> Result<IrValue, CompileError> {
        enum Resolved {
            User {
                mangled: String,
                return_ty: IrType,
                params: Vec<IrType>,
            },
            Extern {
                name: String,
                return_ty: IrType,
                params: Vec<IrType>,
                variadic: bool,
            },
        }

        let resolved = if let Some(import) = self.module.imports.iter().find(|i| i.local_name == callee) {
            let mangled = format!("{}_{}", import.source_module, import.exported_name);
            let sig = self
                .comp
                .functions
                .lookup(&mangled)
                .cloned()
                .ok_or_else(|| CompileError::unknown_symbol(callee))?;
            Resolved::User {
                mangled: sig.mangled_name,
                return_ty: sig.return_ty,
                params: sig.params,
            }
        } else if let Some(sig) = self.local_functions.get(callee).cloned() {
            Resolved::User {
                mangled: sig.mangled_name,
                return_ty: sig.return_ty,
                params: sig.params,
            }
        } else if let Some(sig) = self.comp.externs.lookup(callee).cloned() {
            Resolved::Extern {
                name: sig.name,
                return_ty: sig.return_ty,
                params: sig.params,
                variadic: sig.variadic,
            }
        } else {
            return Err(CompileError::unknown_symbol(callee));
        };

        let (name, return_ty, params, variadic) = match resolved {
            Resolved::User { mangled, return_ty, params } => (mangled, return_ty, params, false),
            Resolved::Extern {
                name,
                return_ty,
                params,
                variadic,
            } => (name, return_ty, params, variadic),
        };

        let mut arg_strs = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let val = self.lower_expr(arg)?;
            let declared_ty = params.get(i).cloned().unwrap_or_else(|| fallback_arg_type(arg));
            arg_strs.push(format!("{declared_ty} {}", val.reg));
        }

        let call_sig = if variadic {
            let mut parts: Vec<String> = params.iter().map(|t| t.to_string()).collect();
            parts.push("...".to_string());
            format!("{return_ty} ({})", parts.join(", "))
        } else {
            return_ty.to_string()
        };

        self.emit_call(&call_sig, &return_ty, &name, &arg_strs)
    }

    fn lower_method_call(&mut self, base: &Expr, method: &str, args: &[Expr]) -> Result<IrValue, CompileError> {
        let receiver = self.lower_expr(base)?;
        let record_name = struct_name_of(&receiver.ty)
            .ok_or_else(|| CompileError::unsupported(format!("`{method}` called on a non-record value")))?;
        let sig = self
            .comp
            .functions
            .lookup_method(&record_name, method)
            .cloned()
            .ok_or_else(|| CompileError::unknown_symbol(format!("{record_name}.{method}")))?;

        let this_ty = sig
            .params
            .first()
            .cloned()
            .unwrap_or_else(|| IrType::ptr(IrType::Struct(record_name.clone())));
        let mut arg_strs = Vec::with_capacity(args.len() + 1);
        arg_strs.push(format!("{this_ty} {}", receiver.reg));
        for (i, arg) in args.iter().enumerate() {
            let val = self.lower_expr(arg)?;
            let declared_ty = sig.params.get(i + 1).cloned().unwrap_or_else(|| fallback_arg_type(arg));
            arg_strs.push(format!("{declared_ty} {}", val.reg));
        }

        self.emit_call(&sig.return_ty.to_string(), &sig.return_ty, &sig.mangled_name, &arg_strs)
    }

    fn emit_call(&mut self, call_sig: &str, return_ty: &IrType, name: &str, arg_strs: &[String]) -> Result<IrValue, CompileError> {
        if *return_ty == IrType::Void {
            self.comp.emitter.emit_line(format!("call {call_sig} @{name}({})", arg_strs.join(", ")));
            Ok(IrValue {
                reg: String::new(),
                ty: IrType::Void,
            })
        } else {
            let t = self.symbols.fresh_temp();
            self.comp
                .emitter
                .emit_line(format!("{t} = call {call_sig} @{name}({})", arg_strs.join(", ")));
            Ok(IrValue { reg: t, ty: return_ty.clone() })
        }
    }

    fn array_element_ptr(&mut self, base: &Expr, index: &Expr) -> Result<(String, IrType), CompileError> {
        let base_val = self.lower_expr(base)?;
        let elem_ty = match base_val.ty {
            IrType::Ptr(inner) => *inner,
            _ => return Err(CompileError::unsupported("indexing a non-array value")),
        };
        let idx_val = self.lower_expr(index)?;
        let t = self.symbols.fresh_temp();
        self.comp
            .emitter
            .emit_line(format!("{t} = getelementptr {elem_ty}, {elem_ty}* {}, i32 {}", base_val.reg, idx_val.reg));
        Ok((t, elem_ty))
    }

    /// Resolves a property-access chain to the address of its final field —
    /// the same slot-address convention `Variable` uses everywhere else
    /// (the returned `IrType` describes what's stored *at* the address, not
    /// the address's own pointer type). The identifier/`this` base case is
    /// just the variable's own slot, unloaded; each `.field` step loads the
    /// record pointer out of its base's slot before computing a
    /// `getelementptr` into it, so a chain of any depth walks one real
    /// pointer indirection per step.
    fn address_of(&mut self, expr: &Expr) -> Result<(String, IrType), CompileError> {
        match &expr.kind {
            ExprKind::Ident(name) => {
                let var = self.symbols.lookup(name).cloned().ok_or_else(|| CompileError::unknown_symbol(name))?;
                Ok((var.register, var.ir_ty))
            }
            ExprKind::This => {
                let var = self
                    .symbols
                    .lookup("this")
                    .cloned()
                    .ok_or_else(|| CompileError::unknown_symbol("this"))?;
                Ok((var.register, var.ir_ty))
            }
            ExprKind::Paren(inner) => self.address_of(inner),
            ExprKind::Field { base, name } => {
                let (base_addr, base_ty) = self.address_of(base)?;
                let record_name = struct_name_of(&base_ty)
                    .ok_or_else(|| CompileError::unsupported(format!("`{name}` accessed on a non-record value")))?;
                let base_ptr = self.symbols.fresh_temp();
                self.comp
                    .emitter
                    .emit_line(format!("{base_ptr} = load {base_ty}, {base_ty}* {base_addr}"));
                let field = self
                    .comp
                    .structs
                    .lookup_field(&record_name, name)
                    .cloned()
                    .ok_or_else(|| CompileError::unknown_symbol(name))?;
                let t = self.symbols.fresh_temp();
                self.comp.emitter.emit_line(format!(
                    "{t} = getelementptr %{record_name}, %{record_name}* {base_ptr}, i32 0, i32 {}",
                    field.index
                ));
                Ok((t, field.ir_ty))
            }
            _ => Err(CompileError::bad_assignment_target("expression is not a property path")),
        }
    }

    /// Assignment's own target dispatch. An identifier target stores
    /// straight into its slot (no load needed); array and property targets
    /// fall through to the computations above.
    fn lvalue_address(&mut self, target: &Expr) -> Result<(String, IrType), CompileError> {
        match &target.kind {
            ExprKind::Ident(name) => {
                let var = self.symbols.lookup(name).cloned().ok_or_else(|| CompileError::unknown_symbol(name))?;
                Ok((var.register, var.ir_ty))
            }
            ExprKind::This => {
                let var = self
                    .symbols
                    .lookup("this")
                    .cloned()
                    .ok_or_else(|| CompileError::unknown_symbol("this"))?;
                Ok((var.register, var.ir_ty))
            }
            ExprKind::Paren(inner) => self.lvalue_address(inner),
            ExprKind::Field { .. } => self.address_of(target),
            ExprKind::Index { base, index } => self.array_element_ptr(base, index),
            _ => Err(CompileError::bad_assignment_target(
                "left-hand side must be an identifier, array element, or property path",
            )),
        }
    }

    fn load_var_ptr(&mut self, name: &str) -> Result<(String, IrType), CompileError> {
        let var = self.symbols.lookup(name).cloned().ok_or_else(|| CompileError::unknown_symbol(name))?;
        let t = self.symbols.fresh_temp();
        self.comp
            .emitter
            .emit_line(format!("{t} = load {}, {}* {}", var.ir_ty, var.ir_ty, var.register));
        Ok((t, var.ir_ty))
    }

    fn load_var(&mut self, name: &str) -> Result<IrValue, CompileError> {
        let (reg, ty) = self.load_var_ptr(name)?;
        Ok(IrValue { reg, ty })
    }

    /// `true`/register conditions pass through unchanged; anything else is
    /// compared against zero at its own static type.
    fn coerce_bool(&mut self, val: IrValue) -> String {
        if val.ty.is_i1() {
            val.reg
        } else {
            let t = self.symbols.fresh_temp();
            self.comp.emitter.emit_line(format!("{t} = icmp ne {} {}, 0", val.ty, val.reg));
            t
        }
    }

    /// A freshly `malloc`'d `i8*` assigned into a record- or array-typed slot
    /// needs a `bitcast` to the slot's own pointer type before it can be
    /// stored.
    fn coerce_to_declared(&mut self, declared_ty: &IrType, val: IrValue) -> String {
        let needs_cast = matches!(declared_ty, IrType::Ptr(_))
            && val.ty == IrType::ptr(IrType::I8)
            && *declared_ty != IrType::ptr(IrType::I8);
        if !needs_cast {
            return val.reg;
        }
        let t = self.symbols.fresh_temp();
        self.comp.emitter.emit_line(format!("{t} = bitcast i8* {} to {declared_ty}", val.reg));
        t
    }
}

fn struct_name_of(ty: &IrType) -> Option<String> {
    match ty {
        IrType::Ptr(inner) => match inner.as_ref() {
            IrType::Struct(name) => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn fallback_arg_type(arg: &Expr) -> IrType {
    if matches!(arg.kind, ExprKind::Str(_)) {
        IrType::ptr(IrType::I8)
    } else {
        IrType::I32
    }
}

/// `main` keeps its exact name. A first parameter named `this` with a
/// record type makes the function a method, mangled `Record_name`.
/// Everything else is `ModuleName_name`.
fn mangled_name(func: &FunctionDecl, module_name: &str) -> (String, Option<String>) {
    if func.name == "main" {
        return ("main".to_string(), None);
    }
    if let Some(first) = func.params.first() {
        if first.name == "this" {
            if let Type::Name(record_name) = &first.ty {
                return (format!("{record_name}_{}", func.name), Some(record_name.clone()));
            }
        }
    }
    (format!("{module_name}_{}", func.name), None)
}

fn stmt_terminates(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::Block(b) => block_terminates(b),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            let then_term = block_terminates(then_branch);
            let else_term = else_branch.as_ref().is_some_and(|e| stmt_terminates(e));
            then_term && else_term
        }
        _ => false,
    }
}

fn block_terminates(block: &Block) -> bool {
    block.stmts.last().is_some_and(stmt_terminates)
}
