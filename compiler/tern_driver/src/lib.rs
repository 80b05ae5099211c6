//! Command-line boundary of the Tern lowering pipeline.
//!
//! The driver reads one source file, hands it to a [`Frontend`] (the
//! preprocess, lex, parse, resolve and const-eval stages, which live
//! outside this workspace), lowers the resolved crate and writes the
//! rendered module.
//!
//! Output is all or nothing: the module text is staged in a temporary
//! file beside the destination and only persisted once lowering and
//! rendering have both succeeded. Any failure is reported as a single
//! `error:` line and a failing exit status.

mod args;
mod error;
mod tracing_setup;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tempfile::NamedTempFile;
use tern_ir::{ResolvedCrate, StringInterner};
use tern_lower::{lower_crate, LowerOptions};
use tracing::{debug, info};

pub use args::{parse_args, DebugStages, DriverOptions};
pub use error::{DriverError, FrontendError};
pub use tracing_setup::{init_tracing, stage_directives};

/// The front end's output for one source file.
pub struct Resolved {
    pub krate: ResolvedCrate,
    pub interner: StringInterner,
}

/// The stages that turn source text into a [`ResolvedCrate`].
pub trait Frontend {
    /// `stages` are the front-end stages the user asked to trace.
    fn resolve(
        &self,
        path: &Path,
        source: &str,
        stages: DebugStages,
    ) -> Result<Resolved, FrontendError>;
}

/// Parse `args` (without the program name), compile, and report.
pub fn run<S: AsRef<str>>(args: &[S], frontend: &dyn Frontend) -> ExitCode {
    let result = parse_args(args).and_then(|options| {
        init_tracing(options.debug);
        compile(&options, frontend)
    });
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Compile `options.input` and return the path the module was written to.
pub fn compile(options: &DriverOptions, frontend: &dyn Frontend) -> Result<PathBuf, DriverError> {
    let input = &options.input;
    let _span = tracing::info_span!("compile", input = %input.display()).entered();

    let source = std::fs::read_to_string(input).map_err(|e| DriverError::io(input, e))?;
    let frontend_stages = options.debug & DebugStages::FRONTEND;
    let Resolved { krate, interner } = frontend.resolve(input, &source, frontend_stages)?;
    debug!(items = krate.items.len(), exprs = krate.arena.len(), "front end done");

    let lower_options = LowerOptions {
        module_name: module_name(input),
        ..LowerOptions::default()
    };
    let module = lower_crate(&krate, &interner, &lower_options).map_err(|err| {
        DriverError::Lower {
            path: input.clone(),
            err,
        }
    })?;
    let text = module.render();

    let out = options.output_path();
    write_atomically(&out, &text)?;
    info!(out = %out.display(), bytes = text.len(), "module written");
    Ok(out)
}

/// File stem of the input, or `main` when it has none.
fn module_name(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("main")
        .to_owned()
}

fn write_atomically(out: &Path, text: &str) -> Result<(), DriverError> {
    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| DriverError::io(dir, e))?;
    staged
        .write_all(text.as_bytes())
        .map_err(|e| DriverError::io(staged.path(), e))?;
    staged
        .persist(out)
        .map_err(|e| DriverError::io(out, e.error))?;
    Ok(())
}
