//! Resolved type pool.
//!
//! `TyId` is the resolver's canonical type handle. Structural types
//! (references, arrays, slices, function types) are hash-consed, so two
//! structurally equal types share one `TyId` and equality is an index
//! comparison. Structs are nominal: each declaration gets its own id and
//! its ordered field list is filled in once the resolver has fixed it.
//!
//! # Design
//!
//! - Primitive types have fixed indices for O(1) access
//! - Everything else is interned on demand

use std::fmt;

use rustc_hash::FxHashMap;

use crate::Name;

/// A 32-bit index into the [`TypePool`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TyId(u32);

impl TyId {
    pub const BOOL: Self = Self(0);
    pub const CHAR: Self = Self(1);
    pub const I32: Self = Self(2);
    pub const U32: Self = Self(3);
    pub const ISIZE: Self = Self(4);
    pub const USIZE: Self = Self(5);
    pub const U8: Self = Self(6);
    /// The unsized `str` type; only ever seen behind a reference.
    pub const STR: Self = Self(7);
    /// The unit type `()`.
    pub const UNIT: Self = Self(8);
    /// The never type `!` (bottom type, no values).
    pub const NEVER: Self = Self(9);
    /// Placeholder for types the resolver left unresolved.
    pub const INFER: Self = Self(10);

    /// Number of pre-interned primitive types.
    pub const PRIMITIVE_COUNT: u32 = 11;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }
}

impl fmt::Debug for TyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TyId({})", self.0)
    }
}

/// A nominal struct type with its fields in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructDef {
    pub name: Name,
    pub fields: Vec<(Name, TyId)>,
}

impl StructDef {
    /// Sequential position of a named field.
    pub fn field_index(&self, field: Name) -> Option<usize> {
        self.fields.iter().position(|(name, _)| *name == field)
    }

    /// Position and type of a named field.
    pub fn field(&self, field: Name) -> Option<(usize, TyId)> {
        self.fields
            .iter()
            .enumerate()
            .find_map(|(i, (name, ty))| (*name == field).then_some((i, *ty)))
    }
}

/// The shape of a resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TyKind {
    Bool,
    Char,
    I32,
    U32,
    Isize,
    Usize,
    U8,
    Str,
    Unit,
    Never,
    Infer,
    /// `&T` / `&mut T`.
    Ref { mutable: bool, pointee: TyId },
    /// `[T; N]`.
    Array { elem: TyId, len: u64 },
    /// `[T]` (only behind a reference).
    Slice { elem: TyId },
    /// Function item/pointer type.
    Fn { params: Vec<TyId>, ret: TyId },
    Struct(StructDef),
}

/// Pool of resolved types.
#[derive(Clone, Debug)]
pub struct TypePool {
    kinds: Vec<TyKind>,
    interned: FxHashMap<TyKind, TyId>,
    structs_by_name: FxHashMap<Name, TyId>,
}

impl TypePool {
    /// Create a pool with all primitive types pre-interned.
    pub fn new() -> Self {
        let mut pool = Self {
            kinds: Vec::with_capacity(64),
            interned: FxHashMap::default(),
            structs_by_name: FxHashMap::default(),
        };
        for kind in [
            TyKind::Bool,
            TyKind::Char,
            TyKind::I32,
            TyKind::U32,
            TyKind::Isize,
            TyKind::Usize,
            TyKind::U8,
            TyKind::Str,
            TyKind::Unit,
            TyKind::Never,
            TyKind::Infer,
        ] {
            pool.intern(kind);
        }
        debug_assert_eq!(pool.kinds.len(), TyId::PRIMITIVE_COUNT as usize);
        pool
    }

    fn push(&mut self, kind: TyKind) -> TyId {
        let raw = u32::try_from(self.kinds.len())
            .unwrap_or_else(|_| panic!("type pool exceeded u32::MAX entries"));
        self.kinds.push(kind);
        TyId(raw)
    }

    /// Intern a structural type, returning the existing id when present.
    pub fn intern(&mut self, kind: TyKind) -> TyId {
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = self.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn reference(&mut self, pointee: TyId, mutable: bool) -> TyId {
        self.intern(TyKind::Ref { mutable, pointee })
    }

    pub fn array(&mut self, elem: TyId, len: u64) -> TyId {
        self.intern(TyKind::Array { elem, len })
    }

    pub fn slice(&mut self, elem: TyId) -> TyId {
        self.intern(TyKind::Slice { elem })
    }

    pub fn function(&mut self, params: &[TyId], ret: TyId) -> TyId {
        self.intern(TyKind::Fn {
            params: params.to_vec(),
            ret,
        })
    }

    /// Declare a nominal struct with no fields yet.
    ///
    /// Redeclaring a name returns the existing id, so self-referential
    /// structs can mention themselves before their fields are set.
    pub fn declare_struct(&mut self, name: Name) -> TyId {
        if let Some(&id) = self.structs_by_name.get(&name) {
            return id;
        }
        let id = self.push(TyKind::Struct(StructDef {
            name,
            fields: Vec::new(),
        }));
        self.structs_by_name.insert(name, id);
        id
    }

    /// Set the ordered fields of a declared struct.
    pub fn define_struct_fields(&mut self, id: TyId, fields: Vec<(Name, TyId)>) {
        if let Some(TyKind::Struct(def)) = self.kinds.get_mut(id.index()) {
            def.fields = fields;
        }
    }

    /// Declare and define a struct in one step.
    pub fn struct_ty(&mut self, name: Name, fields: Vec<(Name, TyId)>) -> TyId {
        let id = self.declare_struct(name);
        self.define_struct_fields(id, fields);
        id
    }

    /// Look up a type by id. Unknown ids read as [`TyKind::Infer`].
    pub fn kind(&self, id: TyId) -> &TyKind {
        self.kinds.get(id.index()).unwrap_or(&TyKind::Infer)
    }

    pub fn struct_def(&self, id: TyId) -> Option<&StructDef> {
        match self.kind(id) {
            TyKind::Struct(def) => Some(def),
            _ => None,
        }
    }

    pub fn struct_by_name(&self, name: Name) -> Option<TyId> {
        self.structs_by_name.get(&name).copied()
    }

    /// Pointee of a reference type.
    pub fn pointee(&self, id: TyId) -> Option<(TyId, bool)> {
        match self.kind(id) {
            TyKind::Ref { mutable, pointee } => Some((*pointee, *mutable)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}
