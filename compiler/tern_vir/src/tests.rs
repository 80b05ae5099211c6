//! Crate-level properties: block termination and render/outline round trip.

use proptest::prelude::*;

use crate::outline::parse_outline;
use crate::{
    BasicBlock, BinOp, BlockId, InstKind, Instruction, IrError, IrType, Module, Terminator, Value,
    ValueName,
};

fn add_inst(n: u32) -> Instruction {
    Instruction::new(
        ValueName::Temp(n),
        IrType::I32,
        InstKind::Binary {
            op: BinOp::Add,
            lhs: Value::int(1, IrType::I32),
            rhs: Value::int(2, IrType::I32),
        },
    )
}

#[derive(Clone, Debug)]
enum TermShape {
    Open,
    Ret,
    JumpNext,
}

fn term_shape() -> impl Strategy<Value = TermShape> {
    prop_oneof![
        Just(TermShape::Open),
        Just(TermShape::Ret),
        Just(TermShape::JumpNext),
    ]
}

/// Functions as lists of (instruction count, terminator shape) per block.
fn module_shape() -> impl Strategy<Value = Vec<Vec<(usize, TermShape)>>> {
    proptest::collection::vec(
        proptest::collection::vec((0usize..6, term_shape()), 1..5),
        0..4,
    )
}

fn build_module(shape: &[Vec<(usize, TermShape)>]) -> Module {
    let mut module = Module::new("prop");
    for (fi, blocks) in shape.iter().enumerate() {
        let id = module
            .declare_function(&format!("f{fi}"), vec![], IrType::UNIT)
            .unwrap();
        let func = module.function_mut(id).unwrap();
        let mut ids = vec![func.entry()];
        for _ in 1..blocks.len() {
            ids.push(func.add_block("bb").unwrap());
        }
        let mut counter = 0;
        for (bi, (count, term)) in blocks.iter().enumerate() {
            let next = ids.get(bi + 1).copied().unwrap_or(ids[0]);
            let block = func.block_mut(ids[bi]).unwrap();
            for _ in 0..*count {
                block.append(add_inst(counter)).unwrap();
                counter += 1;
            }
            match term {
                TermShape::Open => {}
                TermShape::Ret => block.set_terminator(Terminator::Return(None)).unwrap(),
                TermShape::JumpNext => block.set_terminator(Terminator::Jump(next)).unwrap(),
            }
        }
    }
    module
}

#[allow(
    clippy::disallowed_types,
    reason = "proptest macros internally use Arc"
)]
mod properties {
    use super::*;

    proptest! {
        #[test]
        fn terminated_block_rejects_everything(
            before in 0usize..8,
            use_jump in any::<bool>(),
        ) {
            let mut block = BasicBlock::new(BlockId::new(0), "entry");
            for n in 0..before {
                block.append(add_inst(u32::try_from(n).unwrap())).unwrap();
            }
            let term = if use_jump {
                Terminator::Jump(BlockId::new(0))
            } else {
                Terminator::Return(None)
            };
            block.set_terminator(term.clone()).unwrap();

            let expected = IrError::BlockTerminated { label: "entry".to_owned() };
            prop_assert_eq!(block.append(add_inst(99)), Err(expected.clone()));
            prop_assert_eq!(block.set_terminator(term), Err(expected));
            prop_assert_eq!(block.len(), before);
        }

        #[test]
        fn outline_preserves_structure(shape in module_shape()) {
            let module = build_module(&shape);
            let outline = parse_outline(&module.render());

            let defined: Vec<_> = module
                .all_functions()
                .iter()
                .filter(|f| !f.is_declaration())
                .collect();
            prop_assert_eq!(outline.functions.len(), defined.len());
            for (parsed, func) in outline.functions.iter().zip(defined) {
                prop_assert_eq!(parsed.blocks.len(), func.blocks().len());
                prop_assert_eq!(parsed.instruction_count(), func.instruction_count());
                for (pb, fb) in parsed.blocks.iter().zip(func.blocks()) {
                    prop_assert_eq!(pb.instructions, fb.len());
                    prop_assert_eq!(pb.terminated, fb.is_terminated());
                }
            }
        }
    }
}
