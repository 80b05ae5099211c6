//! Command-line options.
//!
//! ```text
//! tern <file> [--debug | --debug=<stage>,<stage>...] [--ir-out=<path>]
//! ```

use std::path::PathBuf;

use bitflags::bitflags;

use crate::DriverError;

bitflags! {
    /// Pipeline stages whose tracing output is enabled.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct DebugStages: u8 {
        const PREPROCESS = 1 << 0;
        const LEX = 1 << 1;
        const PARSE = 1 << 2;
        const RESOLVE = 1 << 3;
        const CONST_EVAL = 1 << 4;
        const LOWER = 1 << 5;
        const SERIALIZE = 1 << 6;
    }
}

impl DebugStages {
    /// Stages run by the external front end, before lowering.
    pub const FRONTEND: Self = Self::PREPROCESS
        .union(Self::LEX)
        .union(Self::PARSE)
        .union(Self::RESOLVE)
        .union(Self::CONST_EVAL);

    /// Parse one command-line stage name (`lex`, `const-eval`, ...).
    pub fn from_stage_name(name: &str) -> Option<Self> {
        Self::from_name(&name.trim().to_ascii_uppercase().replace('-', "_"))
    }

    /// Command-line spellings of every stage, for usage messages.
    pub fn stage_names() -> Vec<String> {
        Self::all()
            .iter_names()
            .map(|(name, _)| name.to_ascii_lowercase().replace('_', "-"))
            .collect()
    }
}

/// Everything one driver invocation needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverOptions {
    pub input: PathBuf,
    /// Where the rendered module goes; `None` means next to the input
    /// with a `.tir` extension.
    pub ir_out: Option<PathBuf>,
    pub debug: DebugStages,
}

impl DriverOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ir_out: None,
            debug: DebugStages::empty(),
        }
    }

    /// The path the rendered module is written to.
    pub fn output_path(&self) -> PathBuf {
        self.ir_out
            .clone()
            .unwrap_or_else(|| self.input.with_extension("tir"))
    }
}

/// Parse the arguments that follow the program name.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<DriverOptions, DriverError> {
    let mut input: Option<PathBuf> = None;
    let mut ir_out = None;
    let mut debug = DebugStages::empty();

    for arg in args.iter().map(AsRef::as_ref) {
        if arg == "--debug" {
            debug = DebugStages::all();
        } else if let Some(list) = arg.strip_prefix("--debug=") {
            debug |= parse_stage_list(list)?;
        } else if let Some(path) = arg.strip_prefix("--ir-out=") {
            if path.is_empty() {
                return Err(DriverError::Usage("`--ir-out=` needs a path".to_owned()));
            }
            ir_out = Some(PathBuf::from(path));
        } else if arg.starts_with('-') {
            return Err(DriverError::Usage(format!("unknown option `{arg}`")));
        } else if let Some(first) = &input {
            return Err(DriverError::Usage(format!(
                "more than one input file (`{}` and `{arg}`)",
                first.display()
            )));
        } else {
            input = Some(PathBuf::from(arg));
        }
    }

    let Some(input) = input else {
        return Err(DriverError::Usage("missing input file".to_owned()));
    };
    Ok(DriverOptions {
        input,
        ir_out,
        debug,
    })
}

fn parse_stage_list(list: &str) -> Result<DebugStages, DriverError> {
    let mut stages = DebugStages::empty();
    for name in list.split(',').filter(|name| !name.trim().is_empty()) {
        let Some(stage) = DebugStages::from_stage_name(name) else {
            return Err(DriverError::Usage(format!(
                "unknown debug stage `{}` (expected one of: {})",
                name.trim(),
                DebugStages::stage_names().join(", ")
            )));
        };
        stages |= stage;
    }
    Ok(stages)
}
