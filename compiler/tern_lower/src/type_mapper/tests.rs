use pretty_assertions::assert_eq;

use super::*;

struct Fixture {
    pool: TypePool,
    interner: StringInterner,
    module: Module,
    mapper: TypeMapper,
}

impl Fixture {
    fn new() -> Self {
        Self {
            pool: TypePool::new(),
            interner: StringInterner::new(),
            module: Module::new("test"),
            mapper: TypeMapper::new(),
        }
    }

    fn map(&mut self, ty: TyId) -> IrType {
        self.mapper
            .map(&self.pool, &self.interner, &mut self.module, ty)
            .unwrap()
    }
}

#[test]
fn primitives_map_one_to_one() {
    let mut fx = Fixture::new();
    assert_eq!(fx.map(TyId::BOOL), IrType::BOOL);
    assert_eq!(fx.map(TyId::ISIZE), IrType::ISIZE);
    assert_eq!(fx.map(TyId::U8), IrType::U8);
    assert_eq!(fx.map(TyId::UNIT), IrType::UNIT);
    assert_eq!(fx.map(TyId::NEVER), IrType::NEVER);
    assert_ne!(fx.map(TyId::UNIT), fx.map(TyId::NEVER));
}

#[test]
fn references_become_pointers_and_str_becomes_slice() {
    let mut fx = Fixture::new();
    let mut_ref = fx.pool.reference(TyId::I32, true);
    let str_ref = fx.pool.reference(TyId::STR, false);
    let byte_slice = fx.pool.slice(TyId::U8);
    let slice_ref = fx.pool.reference(byte_slice, false);
    assert_eq!(fx.map(mut_ref), IrType::ptr(IrType::I32, true));
    assert_eq!(fx.map(str_ref), IrType::slice(IrType::U8));
    assert_eq!(fx.map(slice_ref), IrType::slice(IrType::U8));
}

#[test]
fn arrays_and_functions_map_structurally() {
    let mut fx = Fixture::new();
    let arr = fx.pool.array(TyId::U32, 4);
    let func = fx.pool.function(&[TyId::I32, TyId::BOOL], TyId::UNIT);
    assert_eq!(fx.map(arr).to_string(), "[4 x u32]");
    assert_eq!(fx.map(func).to_string(), "fn(i32, bool) -> void");
}

#[test]
fn struct_fields_keep_declared_order() {
    let mut fx = Fixture::new();
    let y = fx.interner.intern("y");
    let x = fx.interner.intern("x");
    let point = fx.interner.intern("Point");
    let ty = fx.pool.struct_ty(point, vec![(y, TyId::U8), (x, TyId::I32)]);

    assert_eq!(fx.map(ty), IrType::Struct("Point".to_owned()));
    assert_eq!(
        fx.module.struct_fields("Point"),
        Some(&[IrType::U8, IrType::I32][..])
    );
}

#[test]
fn self_referential_struct_maps_through_pointer() {
    let mut fx = Fixture::new();
    let node_name = fx.interner.intern("Node");
    let node = fx.pool.declare_struct(node_name);
    let next = fx.pool.reference(node, false);
    let fields = vec![
        (fx.interner.intern("next"), next),
        (fx.interner.intern("value"), TyId::I32),
    ];
    fx.pool.define_struct_fields(node, fields);

    assert_eq!(fx.map(node), IrType::Struct("Node".to_owned()));
    assert_eq!(
        fx.module.struct_fields("Node"),
        Some(&[IrType::ptr(IrType::Struct("Node".to_owned()), false), IrType::I32][..])
    );
    assert_eq!(fx.module.all_types().len(), 1);
}

#[test]
fn repeated_mapping_declares_once() {
    let mut fx = Fixture::new();
    let name = fx.interner.intern("Pair");
    let a = fx.interner.intern("a");
    let ty = fx.pool.struct_ty(name, vec![(a, TyId::I32)]);
    let first = fx.map(ty);
    let second = fx.map(ty);
    assert_eq!(first, second);
    assert_eq!(fx.module.all_types().len(), 1);
}
