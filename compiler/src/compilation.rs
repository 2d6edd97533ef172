//! The shared state threaded through every module's walk.
//!
//! A single `Compilation` replaces what the distilled design describes as
//! free-standing globals (the struct registry, the extern/function tables,
//! the emitter): one value, passed by `&mut` reference, owns all of it for
//! the lifetime of a compile.

use std::path::Path;

use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::functions::FunctionTable;
use crate::prelude;
use crate::resolver::ModuleResolver;
use crate::structs::StructRegistry;
use crate::types::RecordTemplates;
use crate::walker::Walker;
use crate::functions::ExternTable;

pub const DEFAULT_TARGET_TRIPLE: &str = "arm64-apple-macosx";

pub struct Compilation {
    pub emitter: Emitter,
    pub externs: ExternTable,
    pub functions: FunctionTable,
    pub structs: StructRegistry,
    pub templates: RecordTemplates,
}

impl Compilation {
    pub fn new(module_id: impl Into<String>, target_triple: impl Into<String>) -> Self {
        Self {
            emitter: Emitter::new(module_id, target_triple),
            externs: ExternTable::new(),
            functions: FunctionTable::new(),
            structs: StructRegistry::new(),
            templates: RecordTemplates::new(),
        }
    }

    /// Resolves, lowers, and emits a complete program starting from `entry`.
    /// Returns the final LLVM IR text.
    pub fn compile_file(entry: &Path, target_triple: &str) -> Result<String, CompileError> {
        log::info!("resolving modules from {}", entry.display());
        let modules = ModuleResolver::new().resolve(entry)?;

        let module_id = entry
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| entry.display().to_string());
        let mut comp = Compilation::new(module_id, target_triple);
        prelude::load(&mut comp);

        for module in &modules {
            Walker::new(module, &mut comp).walk()?;
        }

        comp.finalize_struct_types()?;
        log::info!("lowered {} module(s)", modules.len());
        Ok(comp.emitter.get_output())
    }

    /// Hands the struct registry's complete topological order to the emitter.
    /// Done once, after every module has been walked, because a record's
    /// surface-level field types are resolved without requiring the
    /// referenced record to already be registered (see
    /// [`crate::types::map_type`]) — so dependency order can only be known
    /// once the whole program's records, including lazily-monomorphized
    /// generics, have been collected.
    fn finalize_struct_types(&mut self) -> Result<(), CompileError> {
        let specs: Vec<(String, Vec<String>)> = self
            .structs
            .topological_order()?
            .iter()
            .map(|record| {
                (
                    record.name.clone(),
                    record.fields.iter().map(|f| f.ir_ty.to_string()).collect(),
                )
            })
            .collect();
        for (name, fields) in specs {
            self.emitter.add_struct_type(&name, &fields);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn compiles_a_single_module_program() {
        crate::logging::init_test();
        let dir = std::env::temp_dir().join(format!("kiln_compilation_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let entry = write_file(
            &dir,
            "main.kiln",
            r#"
            export function main(): i32 {
                return 42;
            }
            "#,
        );

        let output = Compilation::compile_file(&entry, DEFAULT_TARGET_TRIPLE).unwrap();
        assert!(output.contains("define i32 @main()"));
        assert!(output.contains("ret i32 42"));

        fs::remove_dir_all(&dir).ok();
    }
}
