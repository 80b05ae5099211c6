//! IR types.
//!
//! Struct types are referenced by name; their field lists live in the
//! owning [`Module`](crate::Module)'s type table, which is also what
//! answers size and alignment queries.

use std::fmt;

/// Scalar and zero-sized primitive types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimType {
    Bool,
    Char,
    I32,
    U32,
    Isize,
    Usize,
    U8,
    Unit,
    Never,
}

impl PrimType {
    /// Size in bytes.
    pub const fn size(self) -> u64 {
        match self {
            Self::Bool | Self::U8 => 1,
            Self::Char | Self::I32 | Self::U32 => 4,
            Self::Isize | Self::Usize => 8,
            Self::Unit | Self::Never => 0,
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Char | Self::I32 | Self::U32 | Self::Isize | Self::Usize | Self::U8
        )
    }

    /// Signed integers pick `sdiv`/`srem`/`ashr`/`slt`; everything else the
    /// unsigned forms.
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I32 | Self::Isize)
    }

    /// Unit and never both render as `void` but stay distinct here.
    pub const fn is_void(self) -> bool {
        matches!(self, Self::Unit | Self::Never)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::Isize => "isize",
            Self::Usize => "usize",
            Self::U8 => "u8",
            Self::Unit | Self::Never => "void",
        }
    }
}

/// A type in the virtual instruction set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    Prim(PrimType),
    /// Pointer. `mutable` only matters to reinterpreting casts.
    Ptr { pointee: Box<IrType>, mutable: bool },
    Array { elem: Box<IrType>, len: u64 },
    /// Named struct; fields are in the module's type table.
    Struct(String),
    /// Pointer + length pair.
    Slice(Box<IrType>),
    Func { params: Vec<IrType>, ret: Box<IrType> },
    /// Type of a block label operand.
    Label,
    /// A type the mapper could not resolve.
    Opaque(String),
}

impl IrType {
    pub const BOOL: IrType = IrType::Prim(PrimType::Bool);
    pub const CHAR: IrType = IrType::Prim(PrimType::Char);
    pub const I32: IrType = IrType::Prim(PrimType::I32);
    pub const U32: IrType = IrType::Prim(PrimType::U32);
    pub const ISIZE: IrType = IrType::Prim(PrimType::Isize);
    pub const USIZE: IrType = IrType::Prim(PrimType::Usize);
    pub const U8: IrType = IrType::Prim(PrimType::U8);
    pub const UNIT: IrType = IrType::Prim(PrimType::Unit);
    pub const NEVER: IrType = IrType::Prim(PrimType::Never);

    pub fn ptr(pointee: IrType, mutable: bool) -> Self {
        Self::Ptr {
            pointee: Box::new(pointee),
            mutable,
        }
    }

    pub fn array(elem: IrType, len: u64) -> Self {
        Self::Array {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn slice(elem: IrType) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn func(params: Vec<IrType>, ret: IrType) -> Self {
        Self::Func {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn as_prim(&self) -> Option<PrimType> {
        match self {
            Self::Prim(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Prim(PrimType::Bool))
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Self::Ptr { .. })
    }

    /// Unit or never.
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Prim(p) if p.is_void())
    }

    /// Structs and arrays: values moved between addresses as a block.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Struct(_) | Self::Array { .. })
    }

    /// Signedness as seen by opcode selection.
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Prim(p) if p.is_signed())
    }

    /// Pointee and mutability of a pointer type.
    pub fn pointee(&self) -> Option<(&IrType, bool)> {
        match self {
            Self::Ptr { pointee, mutable } => Some((pointee, *mutable)),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prim(p) => f.write_str(p.as_str()),
            Self::Ptr {
                pointee,
                mutable: false,
            } => write!(f, "ptr {pointee}"),
            Self::Ptr {
                pointee,
                mutable: true,
            } => write!(f, "ptr mut {pointee}"),
            Self::Array { elem, len } => write!(f, "[{len} x {elem}]"),
            Self::Struct(name) => write!(f, "%{name}"),
            Self::Slice(elem) => write!(f, "slice {elem}"),
            Self::Func { params, ret } => {
                f.write_str("fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            Self::Label => f.write_str("label"),
            Self::Opaque(name) => write!(f, "opaque {name}"),
        }
    }
}
