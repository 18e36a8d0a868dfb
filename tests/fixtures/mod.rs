//! Shared fixtures for key derivation tests
//!
//! This module provides:
//! - A scripted toolchain standing in for `cl6x` (preprocessor and `--help`)
//! - An `ar` archive builder with controllable member timestamps
//! - Helpers to build wrappers over a temporary directory

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use bcache_key::sys::{CommandRunner, RunResult};
use bcache_key::{find_wrapper, ArgList, Wrapper, WrapperContext};

/// Version banner printed by the fake toolchain's `--help`.
pub const BANNER: &str = "TMS320C6x C/C++ Compiler v8.3.12\nUsage: cl6x [options] [filenames]\n";

/// Scripted stand-in for the `cl6x` driver.
///
/// In preprocess mode it writes one `#define` line per `-D`/`--define=`
/// option followed by the contents of every existing source file, the way a
/// real preprocessor makes defines and include paths disappear into the text.
pub struct FakeToolchain {
    pub calls: Mutex<Vec<Vec<String>>>,
    pub banner: String,
    pub exit_code: i32,
}

impl Default for FakeToolchain {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            banner: BANNER.to_string(),
            exit_code: 0,
        }
    }
}

impl FakeToolchain {
    pub fn with_banner(banner: &str) -> Self {
        Self {
            banner: banner.to_string(),
            ..Default::default()
        }
    }

    pub fn failing(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn preprocess(&self, args: &[String], out: &str) -> io::Result<()> {
        let mut text = String::new();
        for arg in args.iter().skip(1) {
            if let Some(def) = arg
                .strip_prefix("--define=")
                .or_else(|| arg.strip_prefix("-D"))
            {
                text.push_str(&format!("#define {}\n", def.replacen('=', " ", 1)));
            }
        }
        for arg in args.iter().skip(1) {
            if !arg.starts_with('-') && Path::new(arg).is_file() {
                text.push_str(&fs::read_to_string(arg)?);
            }
        }
        fs::write(out, text)
    }
}

impl CommandRunner for FakeToolchain {
    fn run(&self, args: &[String]) -> io::Result<RunResult> {
        self.calls.lock().unwrap().push(args.to_vec());

        if args.iter().any(|a| a == "--help") {
            return Ok(RunResult {
                exit_code: self.exit_code,
                std_out: self.banner.clone(),
                std_err: String::new(),
            });
        }

        if self.exit_code != 0 {
            return Ok(RunResult {
                exit_code: self.exit_code,
                std_out: String::new(),
                std_err: "\"foo.c\", line 1: error: expected a \";\"\n".to_string(),
            });
        }

        if let Some(out) = args
            .iter()
            .rev()
            .find_map(|a| a.strip_prefix("--output_file="))
        {
            self.preprocess(args, out)?;
        }
        Ok(RunResult {
            exit_code: 0,
            std_out: String::new(),
            std_err: String::new(),
        })
    }
}

/// One `ar` member: name, modification time, payload.
pub struct Member<'a> {
    pub name: &'a str,
    pub mtime: u64,
    pub data: &'a [u8],
}

impl<'a> Member<'a> {
    pub fn new(name: &'a str, mtime: u64, data: &'a [u8]) -> Self {
        Self { name, mtime, data }
    }
}

/// Build a System V `ar` archive.
pub fn ar_archive(members: &[Member<'_>]) -> Vec<u8> {
    let mut out = b"!<arch>\n".to_vec();
    for m in members {
        let header = format!(
            "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
            format!("{}/", m.name),
            m.mtime,
            0,
            0,
            644,
            m.data.len()
        );
        assert_eq!(header.len(), 60);
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(m.data);
        if m.data.len() % 2 == 1 {
            out.push(b'\n');
        }
    }
    out
}

/// Write `contents` to `dir/name` and return the path as a string.
pub fn write_file(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> String {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path.display().to_string()
}

/// Context with a fresh fake toolchain and temp files under `tmp`.
pub fn context(tmp: &TempDir) -> (Arc<FakeToolchain>, WrapperContext) {
    context_with(tmp, FakeToolchain::default())
}

pub fn context_with(
    tmp: &TempDir,
    toolchain: FakeToolchain,
) -> (Arc<FakeToolchain>, WrapperContext) {
    let toolchain = Arc::new(toolchain);
    let ctx = WrapperContext::new(toolchain.clone(), tmp.path());
    (toolchain, ctx)
}

/// Wrapper for `argv`, which must name a supported toolchain.
pub fn wrapper(argv: &[&str], ctx: &WrapperContext) -> Wrapper {
    let args: ArgList = argv.iter().copied().collect();
    find_wrapper(&args, ctx).expect("argv should name a supported toolchain")
}
