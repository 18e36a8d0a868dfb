//! Key derivation tests for compile invocations
//!
//! Drives `find_wrapper` + `derive_key` end to end against a scripted
//! toolchain, checking that keys follow output-affecting inputs only.

mod fixtures;

use std::fs;

use tempfile::TempDir;

use bcache_key::{derive_key, ErrorKind, KeyDerivation, KeyError, ProgramWrapper, WrapperError};
use fixtures::{context, context_with, wrapper, write_file, FakeToolchain};

const SOURCE: &str = "int main(void) { return 0; }\n";

/// A checkout with `src/foo.c` and an `include/` directory.
fn checkout(source: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/foo.c", source);
    write_file(dir.path(), "include/config.h", "#define CONFIG 1\n");
    dir
}

fn compile_key(checkout: &TempDir, exe: &str, extra: &[&str]) -> String {
    let tmp = TempDir::new().unwrap();
    let (_, ctx) = context(&tmp);
    let include = format!("-I{}", checkout.path().join("include").display());
    let source = checkout.path().join("src/foo.c").display().to_string();

    let mut argv = vec![exe, "--compile_only", include.as_str()];
    argv.extend_from_slice(extra);
    argv.push(source.as_str());
    argv.push("--output_file=foo.o");

    derive_key(&wrapper(&argv, &ctx)).unwrap().key
}

// =============================================================================
// Machine and checkout independence
// =============================================================================

#[test]
fn test_key_independent_of_checkout_location() {
    let a = checkout(SOURCE);
    let b = checkout(SOURCE);
    assert_ne!(a.path(), b.path());

    let key_a = compile_key(&a, "/opt/ti/c6000_8.3.12/bin/cl6x", &["-O2"]);
    let key_b = compile_key(&b, "/home/ci/ti/bin/cl6x", &["-O2"]);
    assert_eq!(key_a, key_b);
}

#[test]
fn test_key_inputs_hold_no_host_paths() {
    let src = checkout(SOURCE);
    let tmp = TempDir::new().unwrap();
    let (_, ctx) = context(&tmp);
    let source = src.path().join("src/foo.c").display().to_string();
    let include = format!("-I{}", src.path().join("include").display());

    let derivation = derive_key(&wrapper(
        &[
            "/opt/ti/bin/cl6x",
            "--compile_only",
            &include,
            "-DX=1",
            &source,
            "--output_file=foo.o",
        ],
        &ctx,
    ))
    .unwrap();

    assert_eq!(
        derivation.inputs.relevant_args.as_slice(),
        &["cl6x", "--compile_only"]
    );
    let json = derivation.inputs.to_json().unwrap();
    assert!(!json.contains(&src.path().display().to_string()));
    assert!(!json.contains(&tmp.path().display().to_string()));
    assert!(!json.contains("/opt/ti"));
}

#[test]
fn test_response_file_matches_inline_options() {
    let src = checkout(SOURCE);
    let inline = compile_key(&src, "cl6x", &["-O3", "-mv6600"]);

    let opts = TempDir::new().unwrap();
    let rsp = write_file(opts.path(), "opts.rsp", "-O3\n-mv6600\n");
    let cmd_file = format!("--cmd_file={}", rsp);
    assert_eq!(compile_key(&src, "cl6x", &[cmd_file.as_str()]), inline);

    let short = format!("-@{}", rsp);
    assert_eq!(compile_key(&src, "cl6x", &[short.as_str()]), inline);
}

// =============================================================================
// Sensitivity to output-affecting inputs
// =============================================================================

#[test]
fn test_key_changes_with_source() {
    let a = checkout(SOURCE);
    let b = checkout("int main(void) { return 1; }\n");
    assert_ne!(
        compile_key(&a, "cl6x", &["-O2"]),
        compile_key(&b, "cl6x", &["-O2"])
    );
}

#[test]
fn test_key_changes_with_defines_through_preprocessed_text() {
    let src = checkout(SOURCE);
    let one = compile_key(&src, "cl6x", &["-DLEVEL=1"]);
    let two = compile_key(&src, "cl6x", &["--define=LEVEL=2"]);
    assert_ne!(one, two);
}

#[test]
fn test_key_changes_with_codegen_flags() {
    let src = checkout(SOURCE);
    assert_ne!(
        compile_key(&src, "cl6x", &["-O2"]),
        compile_key(&src, "cl6x", &["-O3"])
    );
}

#[test]
fn test_key_changes_with_toolchain_version() {
    let src = checkout(SOURCE);
    let source = src.path().join("src/foo.c").display().to_string();
    let argv = ["cl6x", "--compile_only", source.as_str(), "--output_file=foo.o"];

    let key_for = |banner: &str| {
        let tmp = TempDir::new().unwrap();
        let (_, ctx) = context_with(&tmp, FakeToolchain::with_banner(banner));
        derive_key(&wrapper(&argv, &ctx)).unwrap().key
    };

    assert_ne!(
        key_for("TMS320C6x C/C++ Compiler v8.3.12\n"),
        key_for("TMS320C6x C/C++ Compiler v8.3.13\n")
    );
}

// =============================================================================
// Argument filtering
// =============================================================================

#[test]
fn test_relevant_arguments_idempotent() {
    let src = checkout(SOURCE);
    let tmp = TempDir::new().unwrap();
    let (_, ctx) = context(&tmp);
    let source = src.path().join("src/foo.c").display().to_string();

    let first = wrapper(
        &[
            "/opt/ti/bin/cl6x",
            "--compile_only",
            "-O2",
            "--include_path=/opt/ti/include",
            "--preinclude=cfg.h",
            "-DDEBUG",
            "--opt_for_speed=5",
            &source,
            "--output_file=foo.o",
            "-ppd=foo.pp",
        ],
        &ctx,
    );
    let filtered = first.relevant_arguments(&first.resolve_args().unwrap());
    assert_eq!(
        filtered.as_slice(),
        &["cl6x", "--compile_only", "-O2", "--opt_for_speed=5"]
    );

    let argv: Vec<&str> = filtered.iter().map(String::as_str).collect();
    let second = wrapper(&argv, &ctx);
    let refiltered = second.relevant_arguments(&second.resolve_args().unwrap());
    assert_eq!(refiltered, filtered);
}

// =============================================================================
// Build file descriptors
// =============================================================================

#[test]
fn test_compile_build_files_descriptor() {
    let src = checkout(SOURCE);
    let tmp = TempDir::new().unwrap();
    let (_, ctx) = context(&tmp);
    let source = src.path().join("src/foo.c").display().to_string();

    let derivation = derive_key(&wrapper(
        &[
            "/opt/ti/bin/cl6x",
            "--compile_only",
            "-I/tmp/inc",
            "-DX=1",
            &source,
            "--output_file=foo.o",
        ],
        &ctx,
    ))
    .unwrap();

    assert_eq!(
        serde_json::to_value(&derivation.build_files).unwrap(),
        serde_json::json!({ "object": { "path": "foo.o", "cacheable": true } })
    );
}

#[test]
fn test_preprocessor_temp_file_removed() {
    let src = checkout(SOURCE);
    let tmp = TempDir::new().unwrap();
    let (toolchain, ctx) = context(&tmp);
    let source = src.path().join("src/foo.c").display().to_string();

    derive_key(&wrapper(
        &["cl6x", "--compile_only", &source, "--output_file=foo.o"],
        &ctx,
    ))
    .unwrap();

    // One preprocess run plus one identification run.
    assert_eq!(toolchain.call_count(), 2);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

// =============================================================================
// Failures
// =============================================================================

fn expect_kind(result: Result<KeyDerivation, KeyError>, kind: ErrorKind) -> KeyError {
    let err = result.unwrap_err();
    assert_eq!(err.kind(), Some(kind), "unexpected error: {}", err);
    err
}

#[test]
fn test_self_referential_response_file() {
    let tmp = TempDir::new().unwrap();
    let (toolchain, ctx) = context(&tmp);
    let rsp = tmp.path().join("self.rsp");
    fs::write(&rsp, format!("-O2 --cmd_file={}\n", rsp.display())).unwrap();

    let err = expect_kind(
        derive_key(&wrapper(
            &["cl6x", &format!("--cmd_file={}", rsp.display())],
            &ctx,
        )),
        ErrorKind::UnsupportedInvocation,
    );
    assert!(err.kind().unwrap().is_fallback());
    assert_eq!(toolchain.call_count(), 0);
}

#[test]
fn test_mutually_referencing_response_files() {
    let tmp = TempDir::new().unwrap();
    let (toolchain, ctx) = context(&tmp);
    let a = tmp.path().join("a.rsp");
    let b = tmp.path().join("b.rsp");
    fs::write(&a, format!("-@{}", b.display())).unwrap();
    fs::write(&b, format!("-@{}", a.display())).unwrap();

    expect_kind(
        derive_key(&wrapper(&["cl6x", &format!("-@{}", a.display())], &ctx)),
        ErrorKind::UnsupportedInvocation,
    );
    assert_eq!(toolchain.call_count(), 0);
}

#[test]
fn test_missing_response_file_is_io_fallback() {
    let tmp = TempDir::new().unwrap();
    let (_, ctx) = context(&tmp);
    let err = expect_kind(
        derive_key(&wrapper(
            &["cl6x", "--compile_only", "--cmd_file=/nonexistent/opts.rsp"],
            &ctx,
        )),
        ErrorKind::Io,
    );
    assert!(err.kind().unwrap().is_fallback());
}

#[test]
fn test_invocation_without_mode_is_unsupported() {
    let tmp = TempDir::new().unwrap();
    let (toolchain, ctx) = context(&tmp);
    expect_kind(
        derive_key(&wrapper(&["cl6x", "foo.c", "--output_file=foo.o"], &ctx)),
        ErrorKind::UnsupportedInvocation,
    );
    assert_eq!(toolchain.call_count(), 0);
}

#[test]
fn test_conflicting_output_files() {
    let tmp = TempDir::new().unwrap();
    let (_, ctx) = context(&tmp);
    let err = expect_kind(
        derive_key(&wrapper(
            &[
                "cl6x",
                "--compile_only",
                "--output_file=a.o",
                "--output_file=b.o",
            ],
            &ctx,
        )),
        ErrorKind::ConflictingOutputDeclaration,
    );
    assert!(!err.kind().unwrap().is_fallback());
    assert_eq!(err.to_string(), "only a single output file can be specified");
}

#[test]
fn test_preprocess_failure_carries_toolchain_output() {
    let src = checkout(SOURCE);
    let tmp = TempDir::new().unwrap();
    let (_, ctx) = context_with(&tmp, FakeToolchain::failing(1));
    let source = src.path().join("src/foo.c").display().to_string();

    let err = expect_kind(
        derive_key(&wrapper(
            &["cl6x", "--compile_only", &source, "--output_file=foo.o"],
            &ctx,
        )),
        ErrorKind::PreprocessFailed,
    );
    assert!(err.kind().unwrap().is_toolchain_failure());
    match err {
        KeyError::Wrapper(WrapperError::PreprocessFailed { exit_code, output }) => {
            assert_eq!(exit_code, 1);
            assert!(output.contains("expected a"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
