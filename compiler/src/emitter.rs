//! Buffered, append-only assembly of a well-formed LLVM IR text module.
//!
//! Nothing here performs I/O; `get_output` is the single point where the
//! accumulated segments are concatenated into the final text.

use indexmap::IndexMap;

pub struct Emitter {
    module_id: String,
    target_triple: String,
    struct_types: IndexMap<String, String>,
    externs: IndexMap<String, String>,
    strings: IndexMap<String, (String, usize)>,
    function_bodies: Vec<String>,
    current_function: Vec<String>,
}

impl Emitter {
    pub fn new(module_id: impl Into<String>, target_triple: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            target_triple: target_triple.into(),
            struct_types: IndexMap::new(),
            externs: IndexMap::new(),
            strings: IndexMap::new(),
            function_bodies: Vec::new(),
            current_function: Vec::new(),
        }
    }

    /// Records `%Name = type { … }`. Callers must add struct types in
    /// dependency order (leaves first) — the emitter only deduplicates by
    /// name, it does not reorder.
    pub fn add_struct_type(&mut self, name: &str, field_irs: &[String]) {
        if self.struct_types.contains_key(name) {
            return;
        }
        let line = if field_irs.is_empty() {
            format!("%{name} = type {{ }}")
        } else {
            format!("%{name} = type {{ {} }}", field_irs.join(", "))
        };
        self.struct_types.insert(name.to_string(), line);
    }

    /// Deduplicated `declare` line. A variadic signature gets a trailing `, ...`.
    pub fn add_extern_function(&mut self, name: &str, return_ir: &str, params: &[String], variadic: bool) {
        if self.externs.contains_key(name) {
            return;
        }
        let mut param_list = params.join(", ");
        if variadic {
            if !param_list.is_empty() {
                param_list.push_str(", ");
            }
            param_list.push_str("...");
        }
        let line = format!("declare {return_ir} @{name}({param_list})");
        self.externs.insert(name.to_string(), line);
    }

    pub fn has_extern(&self, name: &str) -> bool {
        self.externs.contains_key(name)
    }

    /// Interns `decoded` (the already-unescaped literal value) and returns
    /// its global name and the byte length of the IR array it will occupy
    /// (decoded length plus one for the trailing NUL).
    pub fn add_string_constant(&mut self, decoded: &str) -> (String, usize) {
        if let Some((global, len)) = self.strings.get(decoded) {
            return (global.clone(), *len);
        }
        let global = format!("@.str.{}", self.strings.len());
        let byte_len = decoded.len() + 1;
        self.strings.insert(decoded.to_string(), (global.clone(), byte_len));
        (global, byte_len)
    }

    pub fn start_function(&mut self, header: &str) {
        self.current_function.clear();
        self.current_function.push(format!("{header} {{"));
    }

    pub fn emit_label(&mut self, label: &str) {
        self.current_function.push(format!("{label}:"));
    }

    /// Appends one instruction line, indented two spaces under its block.
    pub fn emit_line(&mut self, line: impl Into<String>) {
        self.current_function.push(format!("  {}", line.into()));
    }

    pub fn end_function(&mut self) {
        self.current_function.push("}".to_string());
        self.function_bodies.push(self.current_function.join("\n"));
        self.current_function.clear();
    }

    /// Concatenates header, struct types, externs, string constants, and
    /// function bodies, in that stable order.
    pub fn get_output(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("; ModuleID = '{}'\n", self.module_id));
        out.push_str(&format!("target triple = \"{}\"\n\n", self.target_triple));

        for line in self.struct_types.values() {
            out.push_str(line);
            out.push('\n');
        }
        if !self.struct_types.is_empty() {
            out.push('\n');
        }

        for line in self.externs.values() {
            out.push_str(line);
            out.push('\n');
        }
        if !self.externs.is_empty() {
            out.push('\n');
        }

        for (decoded, (global, byte_len)) in &self.strings {
            out.push_str(&format!(
                "{global} = private unnamed_addr constant [{byte_len} x i8] c\"{}\"\n",
                escape_for_ir(decoded)
            ));
        }
        if !self.strings.is_empty() {
            out.push('\n');
        }

        for (i, body) in self.function_bodies.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(body);
            out.push('\n');
        }

        out
    }
}

fn escape_for_ir(decoded: &str) -> String {
    let mut out = String::new();
    for byte in decoded.bytes() {
        match byte {
            b'\n' => out.push_str("\\0A"),
            b'\t' => out.push_str("\\09"),
            b'\r' => out.push_str("\\0D"),
            b'\\' => out.push_str("\\5C"),
            b'"' => out.push_str("\\22"),
            0x20..=0x7E => out.push(byte as char),
            other => out.push_str(&format!("\\{other:02X}")),
        }
    }
    out.push_str("\\00");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_extern_declarations() {
        let mut e = Emitter::new("test", "arm64-apple-macosx");
        e.add_extern_function("printf", "i32", &["i8*".to_string()], true);
        e.add_extern_function("printf", "i32", &["i8*".to_string()], true);
        let output = e.get_output();
        assert_eq!(output.matches("declare i32 @printf").count(), 1);
    }

    #[test]
    fn interns_repeated_string_literal() {
        let mut e = Emitter::new("test", "arm64-apple-macosx");
        let (g1, l1) = e.add_string_constant("hi");
        let (g2, l2) = e.add_string_constant("hi");
        assert_eq!(g1, g2);
        assert_eq!(l1, l2);
        assert_eq!(e.get_output().matches("@.str.0").count(), 2);
    }

    #[test]
    fn escape_only_string_has_correct_byte_length() {
        let mut e = Emitter::new("test", "arm64-apple-macosx");
        let (_, len) = e.add_string_constant("\n\t");
        assert_eq!(len, 3);
        assert!(e.get_output().contains("[3 x i8] c\"\\0A\\09\\00\""));
    }

    #[test]
    fn empty_record_struct_type_has_no_fields() {
        let mut e = Emitter::new("test", "arm64-apple-macosx");
        e.add_struct_type("Unit", &[]);
        assert!(e.get_output().contains("%Unit = type { }"));
    }
}
