//! Wrapper for the TI C6000 compiler/linker driver (`cl6x`).
//!
//! The driver compiles with `--compile_only` and links with `--run_linker`.
//! Options use `--name=value` syntax and may be loaded from command files
//! via `--cmd_file=<path>` or `-@<path>`.

use sha2::{Digest, Sha256};
use tracing::debug;

use bcache_args::{split_args, starts_with, value_after_eq, ArgList};

use super::files::{BuildFiles, ExpectedFile, FileRole};
use super::{ContentIdentity, InvocationMode, ProgramWrapper, ResolvedArgs, WrapperContext};
use crate::error::{WrapperError, WrapperResult};
use crate::link;
use crate::sys;

const COMPILE_ONLY: &str = "--compile_only";
const RUN_LINKER: &str = "--run_linker";
const OUTPUT_FILE: &str = "--output_file=";
const MAP_FILE: &str = "--map_file=";
const DEP_FILE: &[&str] = &["-ppd=", "--preproc_dependency="];
const CMD_FILE: &str = "--cmd_file=";
const CMD_FILE_SHORT: &str = "-@";
const PREPROC_ONLY: &str = "--preproc_only";

/// Options that change where output goes or how sources are found, but not
/// the code generated from the preprocessed source.
const UNWANTED_PREFIXES: &[&str] = &[
    "-I",
    "--include",
    "--preinclude=",
    "-D",
    "--define=",
    "--c_file=",
    "--cpp_file=",
    "--output_file=",
    "--map_file=",
    "-ppd=",
    "--preproc_dependency=",
];

/// Options replaced when turning a compile command into a preprocess command.
const PREPROCESS_DROP_PREFIXES: &[&str] = &["--output_file=", "-pp", "--preproc_"];

const RECURSIVE_RESPONSE_FILE: &str = "recursive response files are not supported";

/// Wrapper instance for one `cl6x` invocation.
#[derive(Debug)]
pub struct TiC6xWrapper {
    args: ArgList,
    ctx: WrapperContext,
}

impl TiC6xWrapper {
    pub fn new(args: ArgList, ctx: WrapperContext) -> Self {
        Self { args, ctx }
    }

    /// True if the executable's file name contains `cl6x`, ignoring case.
    pub fn can_handle(args: &ArgList) -> bool {
        args.first()
            .map(|exe| sys::file_part(exe, true).to_lowercase().contains("cl6x"))
            .unwrap_or(false)
    }

    fn preprocess(&self, resolved: &ArgList) -> WrapperResult<ContentIdentity> {
        let preprocessed = sys::tmp_file(&self.ctx.temp_dir, ".i")?;
        let cmd = make_preprocessor_cmd(resolved, &preprocessed.path().to_string_lossy());
        debug!(command = %cmd.join(" ", true), "running preprocessor");

        let result = self
            .ctx
            .runner
            .run(cmd.as_slice())
            .map_err(|e| WrapperError::io(&cmd[0], e))?;
        if !result.success() {
            return Err(WrapperError::PreprocessFailed {
                exit_code: result.exit_code,
                output: format!("{}{}", result.std_out, result.std_err),
            });
        }

        Ok(ContentIdentity::Preprocessed(sys::read(preprocessed.path())?))
    }

    fn hash_link_inputs(&self, resolved: &ArgList) -> WrapperResult<ContentIdentity> {
        let mut hasher = Sha256::new();
        for arg in resolved.iter().skip(1) {
            if !is_input_file(arg) {
                continue;
            }
            if link::is_link_script(arg) {
                link::hash_link_cmd_file(arg, &mut hasher)?;
            } else {
                link::hash_link_file(arg, &mut hasher)?;
            }
        }
        Ok(ContentIdentity::LinkDigest(hex::encode(hasher.finalize())))
    }
}

impl ProgramWrapper for TiC6xWrapper {
    fn name(&self) -> &'static str {
        "ti-c6x"
    }

    fn resolve_args(&self) -> WrapperResult<ResolvedArgs> {
        let mut resolved = ArgList::new();
        for arg in &self.args {
            match response_file(arg) {
                Some(path) => {
                    let tokens = read_response_file(path)?;
                    if let Some(nested) = tokens.iter().find(|t| response_file(t).is_some()) {
                        debug!(file = path, nested = %nested, "nested response file");
                        return Err(WrapperError::UnsupportedInvocation(
                            RECURSIVE_RESPONSE_FILE.to_string(),
                        ));
                    }
                    resolved.extend(tokens);
                }
                None => resolved.push(arg.clone()),
            }
        }
        Ok(ResolvedArgs::new(resolved))
    }

    fn content_identity(&self, resolved: &ResolvedArgs) -> WrapperResult<ContentIdentity> {
        let args = resolved.args();
        let mut is_compile = false;
        let mut is_link = false;
        let mut has_output_file = false;
        for arg in args {
            if arg == COMPILE_ONLY {
                is_compile = true;
            } else if arg == RUN_LINKER {
                is_link = true;
            } else if starts_with(arg, OUTPUT_FILE) {
                has_output_file |= value_after_eq(arg).is_some_and(|v| !v.is_empty());
            } else if response_file(arg).is_some() {
                return Err(WrapperError::UnsupportedInvocation(
                    RECURSIVE_RESPONSE_FILE.to_string(),
                ));
            }
        }

        if is_compile && has_output_file {
            self.preprocess(args)
        } else if is_link && has_output_file {
            self.hash_link_inputs(args)
        } else {
            Err(WrapperError::UnsupportedInvocation(
                "unsupported compilation command".to_string(),
            ))
        }
    }

    fn relevant_arguments(&self, resolved: &ResolvedArgs) -> ArgList {
        let args = resolved.args();
        let mut filtered = ArgList::new();

        // The executable without its install location.
        if let Some(exe) = args.first() {
            filtered.push(sys::file_part(exe, false));
        }

        for arg in args.iter().skip(1) {
            if arg.is_empty() || is_unwanted(arg) || is_input_file(arg) {
                continue;
            }
            filtered.push(arg.clone());
        }

        debug!(args = %filtered.join(" ", true), "filtered arguments");
        filtered
    }

    fn program_identity(&self) -> WrapperResult<String> {
        // The help text carries the version banner.
        let exe = self.args.first().ok_or_else(|| {
            WrapperError::UnsupportedInvocation("empty command line".to_string())
        })?;
        let cmd = vec![exe.to_string(), "--help".to_string()];
        let result = self
            .ctx
            .runner
            .run(&cmd)
            .map_err(|e| WrapperError::io(exe, e))?;
        if !result.success() {
            return Err(WrapperError::ToolchainProbeFailed {
                exit_code: result.exit_code,
                output: format!("{}{}", result.std_out, result.std_err),
            });
        }
        Ok(result.std_out)
    }

    fn build_files(&self, resolved: &ResolvedArgs) -> WrapperResult<BuildFiles> {
        let mut mode = None;
        let mut output_file = None;
        let mut dep_file = None;
        let mut map_file = None;

        for arg in resolved.args() {
            if arg == COMPILE_ONLY {
                // --compile_only overrides --run_linker.
                mode = Some(InvocationMode::Compile);
            } else if arg == RUN_LINKER {
                mode = mode.or(Some(InvocationMode::Link));
            } else if starts_with(arg, OUTPUT_FILE) {
                set_once(&mut output_file, arg, "output")?;
            } else if DEP_FILE.iter().any(|p| starts_with(arg, p)) {
                set_once(&mut dep_file, arg, FileRole::Dep.as_str())?;
            } else if starts_with(arg, MAP_FILE) {
                set_once(&mut map_file, arg, FileRole::Map.as_str())?;
            }
        }

        let output_file = output_file.ok_or(WrapperError::MissingOutputFile)?;
        let primary = match mode {
            Some(InvocationMode::Compile) => FileRole::Object,
            Some(InvocationMode::Link) => FileRole::LinkTarget,
            None => {
                return Err(WrapperError::UnsupportedInvocation(
                    "unrecognized compilation type".to_string(),
                ))
            }
        };

        let mut files = BuildFiles::new();
        files.insert_unique(primary, ExpectedFile::cacheable(output_file))?;
        if let Some(dep) = dep_file {
            files.insert_unique(FileRole::Dep, ExpectedFile::cacheable(dep))?;
        }
        if let Some(map) = map_file {
            files.insert_unique(FileRole::Map, ExpectedFile::cacheable(map))?;
        }
        Ok(files)
    }
}

/// Path named by a `--cmd_file=` or `-@` token.
fn response_file(arg: &str) -> Option<&str> {
    let path = if starts_with(arg, CMD_FILE) {
        value_after_eq(arg)
    } else {
        arg.strip_prefix(CMD_FILE_SHORT)
    };
    path.filter(|p| !p.is_empty())
}

fn read_response_file(path: &str) -> WrapperResult<ArgList> {
    let data = sys::read(path)?;
    let text = String::from_utf8(data).map_err(|_| {
        WrapperError::UnsupportedInvocation(format!("response file {} is not valid UTF-8", path))
    })?;
    Ok(split_args(&text.replace('\n', " ")))
}

fn is_unwanted(arg: &str) -> bool {
    UNWANTED_PREFIXES.iter().any(|p| starts_with(arg, p))
}

/// Non-flag tokens naming existing files are inputs; their content is hashed
/// elsewhere and their (possibly absolute) path must stay out of the key.
fn is_input_file(arg: &str) -> bool {
    !arg.is_empty() && !arg.starts_with('-') && sys::file_exists(arg)
}

/// Record the value of an output flag. An empty value declares nothing.
fn set_once(slot: &mut Option<String>, arg: &str, role: &str) -> WrapperResult<()> {
    let Some(value) = value_after_eq(arg).filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    if slot.is_some() {
        return Err(WrapperError::ConflictingOutputDeclaration {
            role: role.to_string(),
        });
    }
    *slot = Some(value.to_string());
    Ok(())
}

fn make_preprocessor_cmd(args: &ArgList, preprocessed_file: &str) -> ArgList {
    let mut cmd: ArgList = args
        .iter()
        .filter(|arg| {
            arg.as_str() != COMPILE_ONLY
                && !PREPROCESS_DROP_PREFIXES.iter().any(|p| starts_with(arg, p))
        })
        .cloned()
        .collect();
    cmd.push(PREPROC_ONLY);
    cmd.push(format!("{}{}", OUTPUT_FILE, preprocessed_file));
    cmd
}
