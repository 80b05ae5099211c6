use pretty_assertions::assert_eq;

use crate::{BlockId, Constant, FuncId, IrError, IrType, Module, Param};

use super::Global;

fn point_fields() -> Vec<IrType> {
    vec![IrType::I32, IrType::I32]
}

// Types

#[test]
fn identical_type_redeclaration_is_a_no_op() {
    let mut module = Module::new("m");
    module.declare_type("Point", point_fields()).unwrap();
    module.declare_type("Point", point_fields()).unwrap();
    assert_eq!(module.all_types().len(), 1);
}

#[test]
fn conflicting_type_declaration_fails() {
    let mut module = Module::new("m");
    module.declare_type("Point", point_fields()).unwrap();
    let err = module
        .declare_type("Point", vec![IrType::I32, IrType::BOOL])
        .unwrap_err();
    assert!(matches!(err, IrError::TypeConflict { ref name, .. } if name == "Point"));
}

#[test]
fn opaque_type_is_completed_later() {
    let mut module = Module::new("m");
    module.declare_opaque_type("Node");
    assert!(module.struct_fields("Node").is_none());
    let next = IrType::ptr(IrType::Struct("Node".to_owned()), false);
    module
        .declare_type("Node", vec![IrType::I32, next.clone()])
        .unwrap();
    assert_eq!(module.struct_fields("Node"), Some(&[IrType::I32, next][..]));
}

// Globals

#[test]
fn global_redeclaration_returns_same_address() {
    let mut module = Module::new("m");
    let global = Global {
        name: "LIMIT".to_owned(),
        ty: IrType::I32,
        init: Constant::Int(10),
    };
    let a = module.declare_global(global.clone()).unwrap();
    let b = module.declare_global(global).unwrap();
    assert_eq!(a, b);
    assert_eq!(module.all_globals().len(), 1);
    assert_eq!(a.ty(), &IrType::ptr(IrType::I32, false));
}

#[test]
fn conflicting_global_fails() {
    let mut module = Module::new("m");
    let mut global = Global {
        name: "LIMIT".to_owned(),
        ty: IrType::I32,
        init: Constant::Int(10),
    };
    module.declare_global(global.clone()).unwrap();
    global.init = Constant::Int(11);
    assert_eq!(
        module.declare_global(global),
        Err(IrError::GlobalConflict {
            name: "LIMIT".to_owned()
        })
    );
}

// Functions

#[test]
fn function_redeclaration_with_same_signature_reuses_id() {
    let mut module = Module::new("m");
    let params = vec![Param {
        name: "x".to_owned(),
        ty: IrType::I32,
    }];
    let a = module
        .declare_function("f", params.clone(), IrType::I32)
        .unwrap();
    // Parameter names are not part of the signature.
    let renamed = vec![Param {
        name: "y".to_owned(),
        ty: IrType::I32,
    }];
    let b = module.declare_function("f", renamed, IrType::I32).unwrap();
    assert_eq!(a, b);
    assert!(module
        .declare_function("f", params, IrType::BOOL)
        .is_err());
}

#[test]
fn entry_block_is_created_lazily() {
    let mut module = Module::new("m");
    let id = module.declare_function("f", vec![], IrType::UNIT).unwrap();
    assert!(module.function(id).unwrap().is_declaration());
    let func = module.function_mut(id).unwrap();
    let entry = func.entry();
    assert_eq!(func.entry(), entry);
    assert_eq!(func.blocks().len(), 1);
    assert_eq!(func.blocks()[0].label, "entry");
    let next = func.add_block("then").unwrap();
    assert_eq!(func.label(next), "then.1");
}

#[test]
fn ids_past_u32_are_refused() {
    assert_eq!(BlockId::from_index(7), Some(BlockId::new(7)));
    assert_eq!(
        FuncId::from_index(u32::MAX as usize),
        Some(FuncId::new(u32::MAX))
    );
    #[cfg(target_pointer_width = "64")]
    {
        let past = u32::MAX as usize + 1;
        assert_eq!(BlockId::from_index(past), None);
        assert_eq!(FuncId::from_index(past), None);
    }
}

#[test]
fn lookups_of_unknown_ids_are_errors() {
    let mut module = Module::new("m");
    let id = module.declare_function("f", vec![], IrType::UNIT).unwrap();
    let missing = FuncId::new(id.raw() + 1);
    assert_eq!(
        module.function(missing).unwrap_err(),
        IrError::UnknownFunction("#1".to_owned())
    );
    let func = module.function_mut(id).unwrap();
    func.entry();
    assert!(matches!(
        func.block_mut(BlockId::new(3)),
        Err(IrError::UnknownBlock(block, ref name)) if block == BlockId::new(3) && name == "f"
    ));
}

// Layout

#[test]
fn struct_layout_pads_fields() {
    let mut module = Module::new("m");
    module
        .declare_type("Mixed", vec![IrType::U8, IrType::I32, IrType::U8])
        .unwrap();
    let mixed = IrType::Struct("Mixed".to_owned());
    assert_eq!(module.size_of(&mixed), 12);
    assert_eq!(module.align_of(&mixed), 4);
}

#[test]
fn array_and_slice_sizes() {
    let module = Module::new("m");
    assert_eq!(module.size_of(&IrType::array(IrType::I32, 5)), 20);
    assert_eq!(module.size_of(&IrType::slice(IrType::U8)), 16);
    assert_eq!(module.size_of(&IrType::UNIT), 0);
    assert_eq!(module.size_of(&IrType::ptr(IrType::UNIT, true)), 8);
}
