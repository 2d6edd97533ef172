//! Mapping from surface types to IR types, and generic-instantiation mangling.
//!
//! `IrType` replaces the bare strings the distilled design implies: every
//! lowered expression carries one of these alongside its register name, which
//! is what lets boolean coercion check a static type instead of sniffing the
//! register's textual form.

use std::collections::HashMap;
use std::fmt;

use parser::ast::{BinOp, InterfaceDecl, Type};

use crate::error::CompileError;
use crate::structs::StructRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    I1,
    I8,
    I32,
    I64,
    Float,
    Double,
    Ptr(Box<IrType>),
    Struct(String),
    Void,
}

impl IrType {
    pub fn ptr(inner: IrType) -> IrType {
        IrType::Ptr(Box::new(inner))
    }

    pub fn is_i1(&self) -> bool {
        matches!(self, IrType::I1)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::Float | IrType::Double)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::Float => write!(f, "float"),
            IrType::Double => write!(f, "double"),
            IrType::Ptr(inner) => write!(f, "{inner}*"),
            IrType::Struct(name) => write!(f, "%{name}"),
            IrType::Void => write!(f, "void"),
        }
    }
}

/// Record declarations parameterized over type variables, keyed by name.
/// A concrete instantiation is monomorphized into the `StructRegistry` lazily
/// the first time it is encountered — these templates are never registered
/// there themselves.
pub type RecordTemplates = HashMap<String, InterfaceDecl>;

/// Converts a surface [`Type`] to its mangled textual form, used both as the
/// monomorphized record name and as a component of a parent mangled name.
pub fn mangle(ty: &Type) -> String {
    match ty {
        Type::Name(name) => mangle_leaf(name),
        Type::Array(elem) => format!("{}Arr", mangle(elem)),
        Type::Generic(name, args) => {
            let mut mangled = name.clone();
            for arg in args {
                mangled.push('_');
                mangled.push_str(&mangle(arg));
            }
            mangled
        }
    }
}

fn mangle_leaf(name: &str) -> String {
    match name {
        "number" | "i32" => "i32".to_string(),
        "i64" => "i64".to_string(),
        "f32" => "float".to_string(),
        "f64" => "double".to_string(),
        "boolean" => "i1".to_string(),
        "string" => "i8".to_string(),
        "void" => "void".to_string(),
        other => other.to_string(),
    }
}

/// Maps a surface type reference to an [`IrType`], monomorphizing generic
/// record instantiations into `structs` on first use.
pub fn map_type(
    ty: &Type,
    structs: &mut StructRegistry,
    templates: &RecordTemplates,
) -> Result<IrType, CompileError> {
    match ty {
        Type::Name(name) => Ok(match name.as_str() {
            "number" | "i32" => IrType::I32,
            "i64" => IrType::I64,
            "f32" => IrType::Float,
            "f64" => IrType::Double,
            "boolean" => IrType::I1,
            "string" => IrType::ptr(IrType::I8),
            "void" => IrType::Void,
            record_name => IrType::ptr(IrType::Struct(record_name.to_string())),
        }),
        Type::Array(elem) => {
            let elem_ty = map_type(elem, structs, templates)?;
            Ok(IrType::ptr(elem_ty))
        }
        Type::Generic(name, args) => {
            let mangled_name = mangle(ty);
            if structs.lookup(&mangled_name).is_none() {
                instantiate_generic(name, args, &mangled_name, structs, templates)?;
            }
            Ok(IrType::ptr(IrType::Struct(mangled_name)))
        }
    }
}

fn instantiate_generic(
    template_name: &str,
    args: &[Type],
    mangled_name: &str,
    structs: &mut StructRegistry,
    templates: &RecordTemplates,
) -> Result<(), CompileError> {
    let template = templates.get(template_name).ok_or_else(|| {
        CompileError::type_layout(format!("no generic record template named `{template_name}`"))
    })?;
    if template.type_params.len() != args.len() {
        return Err(CompileError::type_layout(format!(
            "`{template_name}` expects {} type argument(s), got {}",
            template.type_params.len(),
            args.len()
        )));
    }
    let substitution: HashMap<&str, &Type> = template
        .type_params
        .iter()
        .map(|p| p.as_str())
        .zip(args.iter())
        .collect();

    let mut field_specs = Vec::with_capacity(template.fields.len());
    for field in &template.fields {
        let concrete_ty = substitute(&field.ty, &substitution);
        let ir_ty = map_type(&concrete_ty, structs, templates)?;
        field_specs.push((field.name.clone(), ir_ty, concrete_ty.to_string()));
    }
    structs.register(mangled_name.to_string(), field_specs)?;
    Ok(())
}

fn substitute(ty: &Type, substitution: &HashMap<&str, &Type>) -> Type {
    match ty {
        Type::Name(name) => match substitution.get(name.as_str()) {
            Some(concrete) => (*concrete).clone(),
            None => ty.clone(),
        },
        Type::Array(elem) => Type::Array(Box::new(substitute(elem, substitution))),
        Type::Generic(name, args) => {
            Type::Generic(name.clone(), args.iter().map(|a| substitute(a, substitution)).collect())
        }
    }
}

/// `(instruction, predicate)` for a comparison operator at the given IR type.
pub fn get_compare_op(op: BinOp, ty: &IrType) -> (&'static str, &'static str) {
    let instruction = if ty.is_float() { "fcmp" } else { "icmp" };
    let predicate = if ty.is_float() {
        match op {
            BinOp::Lt => "olt",
            BinOp::Gt => "ogt",
            BinOp::Le => "ole",
            BinOp::Ge => "oge",
            BinOp::Eq => "oeq",
            BinOp::Ne => "one",
            _ => unreachable!("get_compare_op called with a non-comparison operator"),
        }
    } else {
        match op {
            BinOp::Lt => "slt",
            BinOp::Gt => "sgt",
            BinOp::Le => "sle",
            BinOp::Ge => "sge",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            _ => unreachable!("get_compare_op called with a non-comparison operator"),
        }
    };
    (instruction, predicate)
}

/// Arithmetic instruction mnemonic for `op` at the given IR type.
pub fn get_binary_op(op: BinOp, ty: &IrType) -> &'static str {
    if ty.is_float() {
        match op {
            BinOp::Add => "fadd",
            BinOp::Sub => "fsub",
            BinOp::Mul => "fmul",
            BinOp::Div => "fdiv",
            BinOp::Mod => "frem",
            _ => unreachable!("get_binary_op called with a non-arithmetic operator"),
        }
    } else {
        match op {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "sdiv",
            BinOp::Mod => "srem",
            _ => unreachable!("get_binary_op called with a non-arithmetic operator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangles_nested_generics() {
        let box_i32 = Type::Generic("Box".into(), vec![Type::Name("number".into())]);
        assert_eq!(mangle(&box_i32), "Box_i32");

        let nested = Type::Generic("Box".into(), vec![box_i32]);
        assert_eq!(mangle(&nested), "Box_Box_i32");
    }

    #[test]
    fn mangles_multi_arg_generic() {
        let pair = Type::Generic(
            "Pair".into(),
            vec![Type::Name("i32".into()), Type::Name("f64".into())],
        );
        assert_eq!(mangle(&pair), "Pair_i32_double");
    }

    #[test]
    fn maps_primitive_types() {
        let mut structs = StructRegistry::new();
        let templates = RecordTemplates::new();
        assert_eq!(
            map_type(&Type::Name("i64".into()), &mut structs, &templates).unwrap(),
            IrType::I64
        );
        assert_eq!(
            map_type(&Type::Name("boolean".into()), &mut structs, &templates).unwrap(),
            IrType::I1
        );
    }

    #[test]
    fn maps_record_reference_to_pointer() {
        let mut structs = StructRegistry::new();
        let templates = RecordTemplates::new();
        let ty = map_type(&Type::Name("Rect".into()), &mut structs, &templates).unwrap();
        assert_eq!(ty, IrType::ptr(IrType::Struct("Rect".into())));
        assert_eq!(ty.to_string(), "%Rect*");
    }
}
