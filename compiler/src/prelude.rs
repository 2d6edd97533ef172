//! Standard-library extern descriptors loaded once before any user module.
//!
//! Kept as a small declarative table rather than scattered `register` calls
//! so every compilation sees the exact same baseline regardless of which
//! modules it happens to walk — mirroring how a libc header would be
//! `#include`d ahead of translation-unit-specific code.

use crate::compilation::Compilation;
use crate::functions::ExternSignature;
use crate::types::IrType;

pub fn load(comp: &mut Compilation) {
    register(comp, "printf", IrType::I32, vec![IrType::ptr(IrType::I8)], true);
    register(comp, "malloc", IrType::ptr(IrType::I8), vec![IrType::I64], false);
    register(comp, "free", IrType::Void, vec![IrType::ptr(IrType::I8)], false);
    register(comp, "strlen", IrType::I64, vec![IrType::ptr(IrType::I8)], false);
    register(comp, "exit", IrType::Void, vec![IrType::I32], false);
}

fn register(comp: &mut Compilation, name: &str, return_ty: IrType, params: Vec<IrType>, variadic: bool) {
    let param_strs: Vec<String> = params.iter().map(|t| t.to_string()).collect();
    comp.emitter
        .add_extern_function(name, &return_ty.to_string(), &param_strs, variadic);
    comp.externs.register(ExternSignature {
        name: name.to_string(),
        return_ty,
        params,
        variadic,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_expected_externs() {
        let mut comp = Compilation::new("test", "arm64-apple-macosx");
        load(&mut comp);
        for name in ["printf", "malloc", "free", "strlen", "exit"] {
            assert!(comp.externs.contains(name), "missing extern `{name}`");
        }
        assert!(comp.emitter.get_output().contains("declare i32 @printf(i8*, ...)"));
    }
}
