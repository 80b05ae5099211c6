//! Basic blocks and functions.

use crate::{BlockId, Instruction, IrError, IrType, Terminator, Value};

/// A label, a straight-line instruction list, and at most one terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    insts: Vec<Instruction>,
    terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            insts: Vec::new(),
            terminator: None,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.insts
    }

    pub fn terminator(&self) -> Option<&Terminator> {
        self.terminator.as_ref()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }

    /// Append at the end. Fails once the block is terminated.
    pub fn append(&mut self, inst: Instruction) -> Result<(), IrError> {
        if self.is_terminated() {
            return Err(self.terminated_error());
        }
        self.insts.push(inst);
        Ok(())
    }

    /// Insert at `index`, ahead of the terminator.
    ///
    /// Used only for the entry block's allocation prologue, which may grow
    /// after the entry block has been terminated.
    pub fn insert(&mut self, index: usize, inst: Instruction) {
        let index = index.min(self.insts.len());
        self.insts.insert(index, inst);
    }

    /// Set the terminator. Fails if one is already set.
    pub fn set_terminator(&mut self, term: Terminator) -> Result<(), IrError> {
        if self.is_terminated() {
            return Err(self.terminated_error());
        }
        self.terminator = Some(term);
        Ok(())
    }

    /// Remove the instruction at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Instruction> {
        (index < self.insts.len()).then(|| self.insts.remove(index))
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    fn terminated_error(&self) -> IrError {
        IrError::BlockTerminated {
            label: self.label.clone(),
        }
    }
}

/// A named, typed function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: IrType,
}

/// A function: signature plus blocks. No blocks means an external
/// declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: IrType,
    blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<Param>, ret: IrType) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            blocks: Vec::new(),
        }
    }

    /// The function type `fn(params) -> ret`.
    pub fn signature(&self) -> IrType {
        IrType::func(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.ret.clone(),
        )
    }

    /// `true` until the first block is created.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The entry block, creating it on first request.
    pub fn entry(&mut self) -> BlockId {
        if self.blocks.is_empty() {
            self.blocks.push(BasicBlock::new(BlockId::new(0), "entry"));
        }
        BlockId::new(0)
    }

    /// Append a new block labelled `<hint>.<index>`.
    pub fn add_block(&mut self, hint: &str) -> Result<BlockId, IrError> {
        self.entry();
        let id = BlockId::from_index(self.blocks.len())
            .ok_or_else(|| IrError::TooManyBlocks(self.name.clone()))?;
        self.blocks
            .push(BasicBlock::new(id, format!("{hint}.{}", id.raw())));
        Ok(id)
    }

    pub fn block(&self, id: BlockId) -> Result<&BasicBlock, IrError> {
        self.blocks
            .get(id.index())
            .ok_or_else(|| IrError::UnknownBlock(id, self.name.clone()))
    }

    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut BasicBlock, IrError> {
        let name = &self.name;
        self.blocks
            .get_mut(id.index())
            .ok_or_else(|| IrError::UnknownBlock(id, name.clone()))
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Label of `id`, or `?` for an unknown block.
    pub fn label(&self, id: BlockId) -> &str {
        self.blocks.get(id.index()).map_or("?", |b| b.label.as_str())
    }

    /// Total non-terminator instructions over all blocks.
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(BasicBlock::len).sum()
    }

    /// Operand for the `index`th parameter.
    pub fn param_value(&self, index: usize) -> Option<Value> {
        self.params.get(index).map(|p| Value::Param {
            name: p.name.clone(),
            ty: p.ty.clone(),
        })
    }
}
