//! End-to-end assertions against emitted IR text.
//!
//! No LLVM or `cc` toolchain is invoked — these tests check the textual
//! shape of the compiler's own output, not that the result actually runs.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use compiler::compilation::{Compilation, DEFAULT_TARGET_TRIPLE};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kiln_e2e_{tag}_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

fn compile(dir: &Path, entry_name: &str) -> String {
    let entry = dir.join(entry_name);
    Compilation::compile_file(&entry, DEFAULT_TARGET_TRIPLE).expect("compilation should succeed")
}

#[test]
fn heap_array_sum_lowers_to_malloc_and_getelementptr() {
    let dir = scratch_dir("array_sum");
    write_file(
        &dir,
        "main.kiln",
        r#"
        export function main(): i32 {
            let arr: i32[] = malloc(40);
            let i: i32 = 0;
            let total: i32 = 0;
            for (let i: i32 = 0; i < 10; i = i + 1) {
                total = total + 15;
            }
            return total;
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("@malloc"));
    assert!(ir.contains("for.cond0:"));
    assert!(ir.contains("for.body1:"));
    assert!(ir.contains("for.end2:"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn fibonacci_recursion_resolves_self_call_through_local_functions() {
    let dir = scratch_dir("fib");
    write_file(
        &dir,
        "main.kiln",
        r#"
        function fib(n: i32): i32 {
            if (n < 2) {
                return n;
            } else {
                return fib(n - 1) + fib(n - 2);
            }
        }

        export function main(): i32 {
            return fib(10);
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("define i32 @main_fib(i32 %n.param)"));
    assert!(ir.contains("call i32 @main_fib("));
    assert!(ir.contains("if.then0:"));
    assert!(ir.contains("if.else2:"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn forward_reference_to_a_later_declared_function_resolves() {
    let dir = scratch_dir("forward_ref");
    write_file(
        &dir,
        "main.kiln",
        r#"
        export function main(): i32 {
            return helper(5);
        }

        function helper(x: i32): i32 {
            return x + 1;
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("define i32 @main_helper(i32 %x.param)"));
    assert!(ir.contains("call i32 @main_helper(i32 5)"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn mutually_recursive_functions_in_one_module_resolve_each_other() {
    let dir = scratch_dir("mutual_recursion");
    write_file(
        &dir,
        "main.kiln",
        r#"
        function isEven(n: i32): i32 {
            if (n < 1) {
                return 1;
            } else {
                return isOdd(n - 1);
            }
        }

        function isOdd(n: i32): i32 {
            if (n < 1) {
                return 0;
            } else {
                return isEven(n - 1);
            }
        }

        export function main(): i32 {
            return isEven(10);
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("call i32 @main_isOdd("));
    assert!(ir.contains("call i32 @main_isEven("));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn method_forward_reference_to_a_later_declared_method_resolves() {
    let dir = scratch_dir("method_forward_ref");
    write_file(
        &dir,
        "main.kiln",
        r#"
        interface Rect {
            width: i32;
            height: i32;
        }

        function perimeter(this: Rect): i32 {
            return this.area() * 2;
        }

        function area(this: Rect): i32 {
            return this.width * this.height;
        }

        export function main(): i32 {
            let r: Rect = malloc(sizeof<Rect>());
            return r.perimeter();
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("call i32 @Rect_area(%Rect*"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn nested_property_write_and_read_chains_getelementptr() {
    let dir = scratch_dir("nested_property");
    write_file(
        &dir,
        "main.kiln",
        r#"
        interface Point {
            x: i32;
            y: i32;
        }

        interface Line {
            start: Point;
            end: Point;
        }

        export function main(): i32 {
            let line: Line = malloc(sizeof<Line>());
            line.start.x = 5;
            return line.start.x;
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("%Point = type { i32, i32 }"));
    assert!(ir.contains("%Line = type { %Point*, %Point* }"));
    assert!(ir.matches("getelementptr %Point, %Point*").count() >= 2);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn method_dispatch_lowers_to_mangled_direct_calls() {
    let dir = scratch_dir("method_dispatch");
    write_file(
        &dir,
        "main.kiln",
        r#"
        interface Rect {
            width: i32;
            height: i32;
        }

        function area(this: Rect): i32 {
            return this.width * this.height;
        }

        function scale(this: Rect, factor: i32): void {
            this.width = this.width * factor;
        }

        export function main(): i32 {
            let r: Rect = malloc(sizeof<Rect>());
            r.scale(2);
            return r.area();
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("define i32 @Rect_area(%Rect* %this.param)"));
    assert!(ir.contains("define void @Rect_scale(%Rect* %this.param, i32 %factor.param)"));
    assert!(ir.contains("call void @Rect_scale(%Rect*"));
    assert!(ir.contains("call i32 @Rect_area(%Rect*"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn free_functions_mangle_with_their_declaring_module_name() {
    let dir = scratch_dir("module_mangling");
    write_file(
        &dir,
        "math.kiln",
        "export function add(a: i32, b: i32): i32 { return a + b; }",
    );
    write_file(
        &dir,
        "main.kiln",
        r#"
        import { add } from "./math";
        export function main(): i32 {
            return add(10, 20);
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("define i32 @math_add(i32 %a.param, i32 %b.param)"));
    assert!(ir.contains("call i32 @math_add(i32 10, i32 20)"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn generic_record_monomorphizes_to_mangled_struct_names() {
    let dir = scratch_dir("generics");
    write_file(
        &dir,
        "main.kiln",
        r#"
        interface Box<T> {
            value: T;
        }

        export function main(): i32 {
            let b: Box<i32> = malloc(sizeof<Box<i32>>());
            let nested: Box<Box<i32>> = malloc(sizeof<Box<Box<i32>>>());
            return 0;
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("%Box_i32 = type { i32 }"));
    assert!(ir.contains("%Box_Box_i32 = type { %Box_i32* }"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn import_cycle_between_two_modules_is_rejected() {
    let dir = scratch_dir("cycle");
    write_file(
        &dir,
        "a.kiln",
        r#"import { b } from "./b"; export function a(): i32 { return 1; }"#,
    );
    write_file(
        &dir,
        "b.kiln",
        r#"import { a } from "./a"; export function b(): i32 { return 1; }"#,
    );
    let entry = dir.join("a.kiln");
    let result = Compilation::compile_file(&entry, DEFAULT_TARGET_TRIPLE);
    assert!(result.is_err());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn empty_record_has_a_zero_size_type() {
    let dir = scratch_dir("empty_record");
    write_file(
        &dir,
        "main.kiln",
        r#"
        interface Unit {
        }

        export function main(): i32 {
            return sizeof<Unit>();
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("%Unit = type { }"));
    assert!(ir.contains("ret i32 0"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn for_loop_with_no_condition_is_an_infinite_loop() {
    let dir = scratch_dir("infinite_for");
    write_file(
        &dir,
        "main.kiln",
        r#"
        export function main(): i32 {
            for (let i: i32 = 0;;) {
                return i;
            }
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    let cond_block_start = ir.find("for.cond0:").unwrap();
    let body_branch = ir.find("br label %for.body1").unwrap();
    assert!(body_branch > cond_block_start);
    assert!(!ir.contains("icmp"));
    // `end` has no predecessor when the loop has no condition — it must
    // never be emitted.
    assert!(!ir.contains("for.end"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn loop_body_ending_in_return_has_no_back_edge_or_dangling_end_block() {
    let dir = scratch_dir("loop_return");
    write_file(
        &dir,
        "main.kiln",
        r#"
        export function main(): i32 {
            while (true) {
                return 1;
            }
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    // The condition is always checked, so its false edge always reaches
    // `end` — even though the body itself falls off the end via `return`
    // rather than looping back.
    assert!(ir.contains("while.end"));
    let body_start = ir.find("while.body1:").unwrap();
    let body_text = &ir[body_start..];
    let ret_pos = body_text.find("ret i32 1").unwrap();
    let next_label = body_text[ret_pos..].find("while.end").unwrap();
    // Nothing but the next block's label may follow the body's `ret` —
    // in particular no `br label %while.cond0` back-edge.
    assert!(!body_text[ret_pos..ret_pos + next_label].contains("br label"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn for_loop_body_ending_in_return_omits_step_and_back_edge() {
    let dir = scratch_dir("for_loop_return");
    write_file(
        &dir,
        "main.kiln",
        r#"
        export function main(): i32 {
            for (let i: i32 = 0; i < 10; i = i + 1) {
                return i;
            }
            return -1;
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("for.end"));
    let body_start = ir.find("for.body1:").unwrap();
    let body_text = &ir[body_start..];
    let ret_pos = body_text.find("ret i32").unwrap();
    let next_label = body_text[ret_pos..].find("for.end").unwrap();
    // No step re-evaluation and no back-edge branch after a `return`.
    assert!(!body_text[ret_pos..ret_pos + next_label].contains("add i32"));
    assert!(!body_text[ret_pos..ret_pos + next_label].contains("br label"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn return_type_is_not_hardcoded_i32() {
    let dir = scratch_dir("return_ty");
    write_file(
        &dir,
        "main.kiln",
        r#"
        function half(x: f64): f64 {
            return x;
        }

        export function main(): i32 {
            return 0;
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert!(ir.contains("define double @main_half(double %x.param)"));
    assert!(ir.contains("ret double"));
    assert!(!ir.contains("ret i32 %x"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn repeated_identical_string_literal_shares_one_global() {
    let dir = scratch_dir("string_interning");
    write_file(
        &dir,
        "main.kiln",
        r#"
        extern function printf(fmt: string, ...args: i32): i32;

        export function main(): i32 {
            printf("hello");
            printf("hello");
            return 0;
        }
        "#,
    );
    let ir = compile(&dir, "main.kiln");
    assert_eq!(ir.matches("private unnamed_addr constant").count(), 1);
    assert_eq!(ir.matches("@.str.0").count(), 3);
    fs::remove_dir_all(&dir).ok();
}
