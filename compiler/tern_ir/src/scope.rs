//! Scope chain produced by the resolver.
//!
//! Each scope maps names to [`Symbol`]s in two namespaces (values and
//! types) and links to its parent. Lowering only walks this chain; it
//! never adds to it.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{Name, TyId};

/// Index of a scope in a [`ScopeTree`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The crate-level scope.
    pub const ROOT: ScopeId = ScopeId(0);

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
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

/// Which table a lookup consults.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Value,
    Type,
}

/// What a resolved name refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A function; `link_name` is the symbol emitted in the module.
    Function { link_name: Name, ty: TyId },
    /// A module-level constant.
    Const { link_name: Name, ty: TyId },
    Struct { ty: TyId },
    /// A local binding or parameter. Its storage is owned by lowering.
    Local { ty: TyId },
}

impl Symbol {
    pub const fn ty(self) -> TyId {
        match self {
            Self::Function { ty, .. }
            | Self::Const { ty, .. }
            | Self::Struct { ty }
            | Self::Local { ty } => ty,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ScopeData {
    parent: Option<ScopeId>,
    values: FxHashMap<Name, Symbol>,
    types: FxHashMap<Name, Symbol>,
}

/// Parent-linked scopes, rooted at [`ScopeId::ROOT`].
#[derive(Clone, Debug)]
pub struct ScopeTree {
    scopes: Vec<ScopeData>,
}

impl ScopeTree {
    /// Create a tree containing only the root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeData::default()],
        }
    }

    /// Open a child of `parent`.
    pub fn push_child(&mut self, parent: ScopeId) -> ScopeId {
        let raw = u32::try_from(self.scopes.len())
            .unwrap_or_else(|_| panic!("scope tree exceeded u32::MAX scopes"));
        self.scopes.push(ScopeData {
            parent: Some(parent),
            ..ScopeData::default()
        });
        ScopeId(raw)
    }

    /// Bind `name` in `scope`, shadowing any previous binding there.
    pub fn define(&mut self, scope: ScopeId, ns: Namespace, name: Name, symbol: Symbol) {
        if let Some(data) = self.scopes.get_mut(scope.index()) {
            let table = match ns {
                Namespace::Value => &mut data.values,
                Namespace::Type => &mut data.types,
            };
            table.insert(name, symbol);
        }
    }

    /// Look `name` up starting at `scope` and walking towards the root.
    pub fn resolve(&self, scope: ScopeId, name: Name, ns: Namespace) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.scopes.get(id.index())?;
            let table = match ns {
                Namespace::Value => &data.values,
                Namespace::Type => &data.types,
            };
            if let Some(symbol) = table.get(&name) {
                return Some(symbol);
            }
            current = data.parent;
        }
        None
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.index()).and_then(|data| data.parent)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
