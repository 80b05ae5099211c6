//! Deterministic text form of a [`Module`].
//!
//! ```text
//! %Point = type { i32, i32 }
//!
//! @.str.0 = constant [2 x u8] c"hi"
//!
//! declare void @memcpy(ptr mut u8, ptr u8, usize)
//!
//! define i32 @add(i32 %x, i32 %y) {
//! entry:
//!   %0 = add i32 %x, %y
//!   ret i32 %0
//! }
//! ```
//!
//! Every non-terminator instruction is one `  %<id> = <op> <type> <operands>`
//! line; terminators are `ret`, `br` and `jmp`.

use std::fmt::{self, Write as _};

use crate::{Function, InstKind, Instruction, Module, Terminator, Value};

impl Module {
    /// Render the whole module.
    pub fn render(&self) -> String {
        let text = self.to_string();
        tracing::debug!(
            module = %self.name,
            types = self.all_types().len(),
            globals = self.all_globals().len(),
            functions = self.all_functions().len(),
            bytes = text.len(),
            "rendered module"
        );
        text
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections: Vec<String> = Vec::new();

        let types: String = self
            .all_types()
            .iter()
            .map(|def| match &def.fields {
                Some(fields) => {
                    let parts: Vec<String> = fields.iter().map(ToString::to_string).collect();
                    format!("%{} = type {{ {} }}\n", def.name, parts.join(", "))
                }
                None => format!("%{} = type opaque\n", def.name),
            })
            .collect();
        sections.push(types);

        let globals: String = self
            .all_globals()
            .iter()
            .map(|g| format!("@{} = constant {} {}\n", g.name, g.ty, g.init))
            .collect();
        sections.push(globals);

        let mut declares = String::new();
        for func in self.all_functions().iter().filter(|f| f.is_declaration()) {
            let params: Vec<String> = func.params.iter().map(|p| p.ty.to_string()).collect();
            let _ = writeln!(
                declares,
                "declare {} @{}({})",
                func.ret,
                func.name,
                params.join(", ")
            );
        }
        sections.push(declares);

        for func in self.all_functions().iter().filter(|f| !f.is_declaration()) {
            sections.push(FunctionDisplay(func).to_string());
        }

        let mut first = true;
        for section in sections.iter().filter(|s| !s.is_empty()) {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            f.write_str(section)?;
        }
        Ok(())
    }
}

/// A defined function as a `define` listing.
pub struct FunctionDisplay<'a>(pub &'a Function);

impl fmt::Display for FunctionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.0;
        write!(f, "define {} @{}(", func.ret, func.name)?;
        for (i, p) in func.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} %{}", p.ty, p.name)?;
        }
        f.write_str(") {\n")?;
        for block in func.blocks() {
            writeln!(f, "{}:", block.label)?;
            for inst in block.instructions() {
                f.write_str("  ")?;
                write_inst(f, func, inst)?;
                f.write_str("\n")?;
            }
            if let Some(term) = block.terminator() {
                f.write_str("  ")?;
                write_terminator(f, func, term)?;
                f.write_str("\n")?;
            }
        }
        f.write_str("}\n")
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, func: &Function, value: &Value) -> fmt::Result {
    match value {
        Value::Label(block) => write!(f, "%{}", func.label(*block)),
        other => write!(f, "{other}"),
    }
}

fn write_operands<'v>(
    f: &mut fmt::Formatter<'_>,
    func: &Function,
    values: impl IntoIterator<Item = &'v Value>,
) -> fmt::Result {
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_operand(f, func, v)?;
    }
    Ok(())
}

fn write_inst(f: &mut fmt::Formatter<'_>, func: &Function, inst: &Instruction) -> fmt::Result {
    write!(f, "{} = ", inst.name)?;
    let ty = inst.display_ty();
    match &inst.kind {
        InstKind::Const(v) => {
            write!(f, "const {ty} ")?;
            write_operand(f, func, v)
        }
        InstKind::Alloca { .. } => write!(f, "alloca {ty}"),
        InstKind::Load { ptr } => {
            write!(f, "load {ty} ")?;
            write_operand(f, func, ptr)
        }
        InstKind::Store { ptr, value } => {
            write!(f, "store {ty} ")?;
            write_operands(f, func, [value, ptr])
        }
        InstKind::Binary { op, lhs, rhs } => {
            write!(f, "{op} {ty} ")?;
            write_operands(f, func, [lhs, rhs])
        }
        InstKind::Unary { op, operand } => {
            write!(f, "{} {ty} ", op.as_str())?;
            write_operand(f, func, operand)
        }
        InstKind::Cmp { pred, lhs, rhs } => {
            write!(f, "cmp {pred} {ty} ")?;
            write_operands(f, func, [lhs, rhs])
        }
        InstKind::Call { callee, args } => {
            write!(f, "call {ty} ")?;
            write_operand(f, func, callee)?;
            f.write_str("(")?;
            write_operands(f, func, args)?;
            f.write_str(")")
        }
        InstKind::Gep {
            base, indices, ..
        } => {
            write!(f, "gep {ty} ")?;
            write_operand(f, func, base)?;
            for index in indices {
                f.write_str(", ")?;
                write_operand(f, func, index)?;
            }
            Ok(())
        }
        InstKind::Phi { incoming } => {
            write!(f, "phi {ty} ")?;
            for (i, (value, block)) in incoming.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str("[")?;
                write_operand(f, func, value)?;
                write!(f, ", %{}]", func.label(*block))?;
            }
            Ok(())
        }
        InstKind::Cast { kind, value } => {
            write!(f, "{} {ty} ", kind.as_str())?;
            write_operand(f, func, value)?;
            write!(f, " to {}", inst.ty)
        }
    }
}

fn write_terminator(f: &mut fmt::Formatter<'_>, func: &Function, term: &Terminator) -> fmt::Result {
    match term {
        Terminator::Return(None) => f.write_str("ret void"),
        Terminator::Return(Some(value)) => {
            write!(f, "ret {} ", value.ty())?;
            write_operand(f, func, value)
        }
        Terminator::Branch {
            cond,
            then_block,
            else_block,
        } => {
            f.write_str("br ")?;
            write_operand(f, func, cond)?;
            write!(
                f,
                ", %{}, %{}",
                func.label(*then_block),
                func.label(*else_block)
            )
        }
        Terminator::Jump(target) => write!(f, "jmp %{}", func.label(*target)),
    }
}
