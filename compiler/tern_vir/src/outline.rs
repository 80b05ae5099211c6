//! Structural outline of rendered module text.
//!
//! Recovers function, block and instruction counts from the output of
//! [`Module::render`](crate::Module::render) without rebuilding values.
//! Names are not preserved; structure is.

/// Shape of one block in the text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockOutline {
    pub label: String,
    pub instructions: usize,
    pub terminated: bool,
}

/// Shape of one `define`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FunctionOutline {
    pub name: String,
    pub blocks: Vec<BlockOutline>,
}

impl FunctionOutline {
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions).sum()
    }
}

/// Everything [`parse_outline`] recovers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outline {
    pub types: usize,
    pub globals: usize,
    pub declarations: usize,
    pub functions: Vec<FunctionOutline>,
}

const TERMINATORS: [&str; 3] = ["ret ", "br ", "jmp "];

/// Parse rendered module text into its outline. Unrecognised lines are
/// ignored.
pub fn parse_outline(text: &str) -> Outline {
    let mut outline = Outline::default();
    let mut current: Option<FunctionOutline> = None;

    for line in text.lines() {
        if let Some(func) = current.as_mut() {
            if line == "}" {
                if let Some(done) = current.take() {
                    outline.functions.push(done);
                }
                continue;
            }
            if let Some(body) = line.strip_prefix("  ") {
                let Some(block) = func.blocks.last_mut() else {
                    continue;
                };
                if TERMINATORS.iter().any(|t| body.starts_with(t)) {
                    block.terminated = true;
                } else if body.starts_with('%') && body.contains(" = ") {
                    block.instructions += 1;
                }
            } else if let Some(label) = line.strip_suffix(':') {
                func.blocks.push(BlockOutline {
                    label: label.to_owned(),
                    ..BlockOutline::default()
                });
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("define ") {
            current = Some(FunctionOutline {
                name: function_name(rest),
                blocks: Vec::new(),
            });
        } else if line.starts_with("declare ") {
            outline.declarations += 1;
        } else if line.starts_with('@') && line.contains(" = constant ") {
            outline.globals += 1;
        } else if line.starts_with('%') && line.contains(" = type ") {
            outline.types += 1;
        }
    }

    outline
}

/// `<ret> @name(<params>) {` → `name`.
fn function_name(signature: &str) -> String {
    signature
        .split_once('@')
        .and_then(|(_, rest)| rest.split_once('('))
        .map(|(name, _)| name.to_owned())
        .unwrap_or_default()
}
