//! Canonical record (struct) layouts.

use fxhash::FxHashSet;
use indexmap::IndexMap;

use crate::error::CompileError;
use crate::types::IrType;

#[derive(Debug, Clone)]
pub struct RecordField {
    pub name: String,
    pub surface_ty: String,
    pub ir_ty: IrType,
    pub index: usize,
    pub offset: usize,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct Record {
    pub name: String,
    pub fields: Vec<RecordField>,
    pub total_size: usize,
    pub pointer_ty: IrType,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Byte size contributed by a field of the given IR type. Records, arrays,
/// and strings are always stored by pointer, so their own layout never
/// affects a containing record's size — this is what lets `register` avoid
/// depending on forward-declared nested records.
pub fn type_size(ty: &IrType) -> usize {
    match ty {
        IrType::I1 | IrType::I8 => 1,
        IrType::I32 | IrType::Float => 4,
        IrType::I64 | IrType::Double | IrType::Ptr(_) => 8,
        IrType::Struct(_) => 8,
        IrType::Void => 0,
    }
}

#[derive(Debug, Default)]
pub struct StructRegistry {
    records: IndexMap<String, Record>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record's layout. `fields` is (name, IR type, surface type
    /// string) in declaration order. Re-registering an existing name is an
    /// error, as is a duplicate field name within the record.
    pub fn register(
        &mut self,
        name: String,
        fields: Vec<(String, IrType, String)>,
    ) -> Result<(), CompileError> {
        if self.records.contains_key(&name) {
            return Err(CompileError::type_layout(format!(
                "record `{name}` is already registered"
            )));
        }

        let mut seen = FxHashSet::default();
        let mut offset = 0usize;
        let mut laid_out = Vec::with_capacity(fields.len());
        for (index, (field_name, ir_ty, surface_ty)) in fields.into_iter().enumerate() {
            if !seen.insert(field_name.clone()) {
                return Err(CompileError::type_layout(format!(
                    "record `{name}` declares field `{field_name}` more than once"
                )));
            }
            let size = type_size(&ir_ty);
            laid_out.push(RecordField {
                name: field_name,
                surface_ty,
                ir_ty,
                index,
                offset,
                size,
            });
            offset += size;
        }

        let record = Record {
            name: name.clone(),
            fields: laid_out,
            total_size: offset,
            pointer_ty: IrType::ptr(IrType::Struct(name.clone())),
        };
        self.records.insert(name, record);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Record> {
        self.records.get(name)
    }

    pub fn lookup_field(&self, name: &str, field: &str) -> Option<&RecordField> {
        self.lookup(name)?.field(field)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Records referenced by `record`'s fields (pointer-to-struct fields only).
    fn dependencies(&self, record: &Record) -> Vec<String> {
        record
            .fields
            .iter()
            .filter_map(|f| match &f.ir_ty {
                IrType::Ptr(inner) => match inner.as_ref() {
                    IrType::Struct(name) if self.records.contains_key(name) => Some(name.clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    /// Depth-first post-order over the field-reference graph: every record a
    /// field points to appears before the record itself. Rejects cycles.
    pub fn topological_order(&self) -> Result<Vec<&Record>, CompileError> {
        let mut order = Vec::with_capacity(self.records.len());
        let mut visited = FxHashSet::default();
        let mut visiting = FxHashSet::default();

        for name in self.records.keys() {
            self.visit(name, &mut visited, &mut visiting, &mut order)?;
        }
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        visited: &mut FxHashSet<String>,
        visiting: &mut FxHashSet<String>,
        order: &mut Vec<&'a Record>,
    ) -> Result<(), CompileError> {
        if visited.contains(name) {
            return Ok(());
        }
        if visiting.contains(name) {
            return Err(CompileError::resolve_cycle(format!(
                "record `{name}` participates in a cyclic field-type reference"
            )));
        }
        let record = match self.records.get(name) {
            Some(r) => r,
            None => return Ok(()),
        };
        visiting.insert(name.to_string());
        for dep in self.dependencies(record) {
            self.visit(&dep, visited, visiting, order)?;
        }
        visiting.remove(name);
        visited.insert(name.to_string());
        order.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_lays_out_fields() {
        let mut registry = StructRegistry::new();
        registry
            .register(
                "Rect".into(),
                vec![
                    ("width".into(), IrType::I32, "i32".into()),
                    ("height".into(), IrType::I32, "i32".into()),
                ],
            )
            .unwrap();
        let rect = registry.lookup("Rect").unwrap();
        assert_eq!(rect.total_size, 8);
        assert_eq!(rect.fields[1].offset, 4);
    }

    #[test]
    fn empty_record_has_zero_size() {
        let mut registry = StructRegistry::new();
        registry.register("Unit".into(), vec![]).unwrap();
        assert_eq!(registry.lookup("Unit").unwrap().total_size, 0);
    }

    #[test]
    fn rejects_duplicate_registration() {
        let mut registry = StructRegistry::new();
        registry.register("Point".into(), vec![]).unwrap();
        assert!(registry.register("Point".into(), vec![]).is_err());
    }

    #[test]
    fn topological_order_places_dependencies_first() {
        let mut registry = StructRegistry::new();
        registry
            .register(
                "Point".into(),
                vec![
                    ("x".into(), IrType::I32, "i32".into()),
                    ("y".into(), IrType::I32, "i32".into()),
                ],
            )
            .unwrap();
        registry
            .register(
                "Line".into(),
                vec![
                    (
                        "start".into(),
                        IrType::ptr(IrType::Struct("Point".into())),
                        "Point".into(),
                    ),
                    (
                        "end".into(),
                        IrType::ptr(IrType::Struct("Point".into())),
                        "Point".into(),
                    ),
                ],
            )
            .unwrap();

        let order: Vec<&str> = registry
            .topological_order()
            .unwrap()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        let point_pos = order.iter().position(|n| *n == "Point").unwrap();
        let line_pos = order.iter().position(|n| *n == "Line").unwrap();
        assert!(point_pos < line_pos);
    }
}
