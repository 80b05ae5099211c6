//! Operands: registers, parameters, globals, labels, constants.

use std::fmt;

use crate::IrType;

// ── ID newtypes ─────────────────────────────────────────────────────

/// Basic block index within one [`Function`](crate::Function).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The id at position `index`, if it fits in a `u32`.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Function index within a [`Module`](crate::Module).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FuncId(u32);

impl FuncId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The id at position `index`, if it fits in a `u32`.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The result name of an instruction.
///
/// Builders hand out `Temp` ids from a per-function counter; `Named`
/// results carry a caller-chosen, function-unique name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueName {
    Temp(u32),
    Named(String),
}

impl fmt::Display for ValueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temp(n) => write!(f, "%{n}"),
            Self::Named(name) => write!(f, "%{name}"),
        }
    }
}

// ── Constants ───────────────────────────────────────────────────────

/// A compile-time constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i128),
    Bool(bool),
    Char(char),
    /// Raw bytes of a string global's initializer.
    Bytes(Vec<u8>),
    /// `{ @global, len }` string-slice constant.
    Slice { global: String, len: u64 },
    Array(Vec<Constant>),
    Struct(Vec<Constant>),
    Unit,
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Constant]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(c) => write!(f, "'{}'", c.escape_default()),
            Self::Bytes(bytes) => {
                f.write_str("c\"")?;
                for &b in bytes {
                    if (b.is_ascii_graphic() && b != b'"' && b != b'\\') || b == b' ' {
                        write!(f, "{}", char::from(b))?;
                    } else {
                        write!(f, "\\{b:02X}")?;
                    }
                }
                f.write_str("\"")
            }
            Self::Slice { global, len } => write!(f, "{{ @{global}, {len} }}"),
            Self::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Self::Struct(items) => {
                f.write_str("{ ")?;
                write_list(f, items)?;
                f.write_str(" }")
            }
            Self::Unit => f.write_str("()"),
        }
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// Anything usable as an instruction operand. Every value knows its type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    /// Result of a prior instruction.
    Reg { name: ValueName, ty: IrType },
    /// A function parameter.
    Param { name: String, ty: IrType },
    /// Address of a global or a function; `ty` is the pointer type.
    Global { name: String, ty: IrType },
    /// A block label. Renders through the owning function.
    Label(BlockId),
    /// Placeholder for a value that is never produced at runtime.
    Undef(IrType),
    Const { value: Constant, ty: IrType },
}

impl Value {
    pub fn int(value: i128, ty: IrType) -> Self {
        Self::Const {
            value: Constant::Int(value),
            ty,
        }
    }

    pub fn bool(value: bool) -> Self {
        Self::Const {
            value: Constant::Bool(value),
            ty: IrType::BOOL,
        }
    }

    pub fn unit() -> Self {
        Self::Const {
            value: Constant::Unit,
            ty: IrType::UNIT,
        }
    }

    /// The `undef` placeholder yielded by `break`/`continue`/`return`.
    pub fn unreachable() -> Self {
        Self::Undef(IrType::NEVER)
    }

    pub fn ty(&self) -> &IrType {
        static LABEL: IrType = IrType::Label;
        match self {
            Self::Reg { ty, .. }
            | Self::Param { ty, .. }
            | Self::Global { ty, .. }
            | Self::Undef(ty)
            | Self::Const { ty, .. } => ty,
            Self::Label(_) => &LABEL,
        }
    }

    /// The register name, if this is an instruction result.
    pub fn reg_name(&self) -> Option<&ValueName> {
        match self {
            Self::Reg { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&Constant> {
        match self {
            Self::Const { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Self::Undef(_))
    }
}

/// Renders a value as an operand. Labels render as `%bb<N>`; inside a
/// module listing they are replaced by the block's own label.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg { name, .. } => write!(f, "{name}"),
            Self::Param { name, .. } => write!(f, "%{name}"),
            Self::Global { name, .. } => write!(f, "@{name}"),
            Self::Label(block) => write!(f, "%bb{}", block.raw()),
            Self::Undef(_) => f.write_str("undef"),
            Self::Const { value, .. } => write!(f, "{value}"),
        }
    }
}
