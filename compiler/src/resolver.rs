//! Module discovery and compile-order resolution.
//!
//! Follows relative `import` specifiers outward from an entry file, parsing
//! each module exactly once and producing a flat list ordered so that every
//! module appears after all of its own dependencies — a plain post-order
//! depth-first walk over the import graph.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parser::ast::{ItemKind, SourceFile};

use crate::error::CompileError;

const SOURCE_EXTENSION: &str = "kiln";

/// One `import { a, b } from "./x"` binding, expanded to one entry per name.
///
/// The grammar has no `as` aliasing, so `local_name` and `exported_name` are
/// always identical today; the two fields are kept distinct because the
/// walker's call-resolution logic treats them as conceptually separate
/// (the name in scope here vs. the name registered in the exporting module).
#[derive(Debug, Clone)]
pub struct Import {
    pub local_name: String,
    pub exported_name: String,
    /// Short name of the module this was imported from, or the raw
    /// specifier verbatim for a non-relative (external) import.
    pub source_module: String,
    /// Absolute path of the source module, or empty for an external import.
    pub source_path: PathBuf,
}

#[derive(Debug)]
pub struct Module {
    pub path: PathBuf,
    pub short_name: String,
    pub ast: SourceFile,
    pub imports: Vec<Import>,
    pub exports: HashSet<String>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ModuleResolver {
    extension: String,
}

impl ModuleResolver {
    pub fn new() -> Self {
        Self {
            extension: SOURCE_EXTENSION.to_string(),
        }
    }

    /// Resolves every module reachable from `entry` through relative
    /// imports, returning them leaves-first. Detects import cycles.
    pub fn resolve(&self, entry: &Path) -> Result<Vec<Module>, CompileError> {
        let entry_path = normalize(entry, &self.extension)?;
        let mut modules: IndexMap<PathBuf, Module> = IndexMap::new();
        let mut visiting: HashSet<PathBuf> = HashSet::new();
        let mut order: Vec<PathBuf> = Vec::new();

        self.visit(&entry_path, &mut modules, &mut visiting, &mut order)?;

        Ok(order
            .into_iter()
            .map(|p| modules.shift_remove(&p).expect("module visited but not recorded"))
            .collect())
    }

    fn visit(
        &self,
        path: &Path,
        modules: &mut IndexMap<PathBuf, Module>,
        visiting: &mut HashSet<PathBuf>,
        order: &mut Vec<PathBuf>,
    ) -> Result<(), CompileError> {
        if modules.contains_key(path) {
            return Ok(());
        }
        if visiting.contains(path) {
            return Err(CompileError::resolve_cycle(format!(
                "import cycle detected at module `{}`",
                short_name(path)
            )));
        }
        visiting.insert(path.to_path_buf());

        let source = fs::read_to_string(path).map_err(|_| CompileError::IoMissing {
            path: path.display().to_string(),
        })?;
        let short = short_name(path);
        let ast = parser::parse_source_file(&short, &source).map_err(|message| CompileError::Parse {
            message,
            span: None,
        })?;

        let mut imports = Vec::new();
        let mut exports = HashSet::new();
        let mut dependencies = Vec::new();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        for item in &ast.items {
            match &item.kind {
                ItemKind::Import(decl) => {
                    if is_relative(&decl.from) {
                        let dep_path = normalize_relative(dir, &decl.from, &self.extension)?;
                        let dep_short = short_name(&dep_path);
                        for name in &decl.names {
                            imports.push(Import {
                                local_name: name.clone(),
                                exported_name: name.clone(),
                                source_module: dep_short.clone(),
                                source_path: dep_path.clone(),
                            });
                        }
                        if !dependencies.contains(&dep_short) {
                            dependencies.push(dep_short.clone());
                        }
                        self.visit(&dep_path, modules, visiting, order)?;
                    } else {
                        for name in &decl.names {
                            imports.push(Import {
                                local_name: name.clone(),
                                exported_name: name.clone(),
                                source_module: decl.from.clone(),
                                source_path: PathBuf::new(),
                            });
                        }
                    }
                }
                ItemKind::ExportNames(names) => exports.extend(names.iter().cloned()),
                ItemKind::ExportFunction(func) => {
                    exports.insert(func.name.clone());
                }
                _ => {}
            }
        }

        visiting.remove(path);
        modules.insert(
            path.to_path_buf(),
            Module {
                path: path.to_path_buf(),
                short_name: short,
                ast,
                imports,
                exports,
                dependencies,
            },
        );
        order.push(path.to_path_buf());
        Ok(())
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

fn short_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn with_extension_if_missing(path: PathBuf, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(extension)
    }
}

fn normalize(path: &Path, extension: &str) -> Result<PathBuf, CompileError> {
    let candidate = with_extension_if_missing(path.to_path_buf(), extension);
    fs::canonicalize(&candidate).map_err(|_| CompileError::IoMissing {
        path: candidate.display().to_string(),
    })
}

fn normalize_relative(dir: &Path, specifier: &str, extension: &str) -> Result<PathBuf, CompileError> {
    let candidate = with_extension_if_missing(dir.join(specifier), extension);
    fs::canonicalize(&candidate).map_err(|_| CompileError::IoMissing {
        path: candidate.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn orders_dependencies_before_dependents() {
        let dir = std::env::temp_dir().join(format!("kiln_resolver_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        write_file(
            &dir,
            "math.kiln",
            "export function add(a: i32, b: i32): i32 { return a + b; }",
        );
        let entry = write_file(
            &dir,
            "main.kiln",
            r#"
            import { add } from "./math";
            export function main(): i32 {
                return add(1, 2);
            }
            "#,
        );

        let resolver = ModuleResolver::new();
        let modules = resolver.resolve(&entry).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].short_name, "math");
        assert_eq!(modules[1].short_name, "main");
        assert_eq!(modules[1].imports[0].source_module, "math");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn detects_import_cycles() {
        let dir = std::env::temp_dir().join(format!("kiln_resolver_cycle_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        write_file(&dir, "a.kiln", r#"import { b } from "./b"; export function a(): i32 { return 1; }"#);
        let entry = write_file(
            &dir,
            "b.kiln",
            r#"import { a } from "./a"; export function b(): i32 { return 1; }"#,
        );

        let resolver = ModuleResolver::new();
        let result = resolver.resolve(&entry);
        assert!(result.is_err());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_entry_file_is_io_error() {
        let resolver = ModuleResolver::new();
        let result = resolver.resolve(Path::new("/nonexistent/path/to/nowhere.kiln"));
        assert!(matches!(result, Err(CompileError::IoMissing { .. })));
    }
}
