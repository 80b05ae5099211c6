use pretty_assertions::assert_eq;
use tern_ir::{BinaryOp, Stmt, TyId};
use tern_vir::IrType;

use crate::test_helpers::CrateBuilder;
use crate::LowerError;

fn big(cb: &mut CrateBuilder) -> TyId {
    cb.struct_ty(
        "Big",
        &[
            ("a", TyId::I32),
            ("b", TyId::I32),
            ("c", TyId::I32),
            ("d", TyId::I32),
            ("e", TyId::I32),
        ],
    )
}

// ── Literals ───────────────────────────────────────────────────

#[test]
fn struct_literal_initialises_in_declared_field_order() {
    // Pair { b: two(), a: one() }
    let mut cb = CrateBuilder::new();
    let pair = cb.struct_ty("Pair", &[("a", TyId::I32), ("b", TyId::I32)]);
    cb.extern_fn("one", &[], TyId::I32);
    cb.extern_fn("two", &[], TyId::I32);
    let two = cb.call("two", &[], TyId::I32);
    let one = cb.call("one", &[], TyId::I32);
    let lit = cb.struct_lit(pair, &[("b", two), ("a", one)]);

    let (module, value, _) = cb.lower_open(lit).unwrap();
    assert_eq!(value.to_string(), "%7");
    assert_eq!(
        module.render(),
        "\
%Pair = type { i32, i32 }

declare i32 @one()
declare i32 @two()

define void @scratch() {
entry:
  %0 = alloca %Pair
  %1 = call i32 @one()
  %2 = gep %Pair %0, 0, 0
  %3 = store i32 %1, %2
  %4 = call i32 @two()
  %5 = gep %Pair %0, 0, 1
  %6 = store i32 %4, %5
  %7 = load %Pair %0
}
"
    );
}

#[test]
fn struct_literal_field_errors() {
    let mut cb = CrateBuilder::new();
    let pair = cb.struct_ty("Pair", &[("a", TyId::I32), ("b", TyId::I32)]);
    let one = cb.int(1, TyId::I32);
    let missing = cb.struct_lit(pair, &[("a", one)]);
    let two = cb.int(2, TyId::I32);
    let three = cb.int(3, TyId::I32);
    let stray = cb.struct_lit(pair, &[("a", two), ("b", three), ("z", one)]);
    let not_struct = cb.struct_lit(TyId::I32, &[]);

    assert!(matches!(
        cb.lower_open(missing),
        Err(LowerError::MissingField { field, .. }) if field == "b"
    ));
    assert!(matches!(
        cb.lower_open(stray),
        Err(LowerError::UnknownField { field, ty, .. }) if field == "z" && ty == "%Pair"
    ));
    assert!(matches!(
        cb.lower_open(not_struct),
        Err(LowerError::ExpectedStruct { found, .. }) if found == "i32"
    ));
}

#[test]
fn array_literal_stores_each_element() {
    let mut cb = CrateBuilder::new();
    let arr = cb.krate.types.array(TyId::I32, 3);
    let elems: Vec<_> = (1..=3).map(|v| cb.int(v, TyId::I32)).collect();
    let lit = cb.array(&elems, arr);

    let (module, _, _) = cb.lower_open(lit).unwrap();
    assert_eq!(
        module.render(),
        "\
define void @scratch() {
entry:
  %0 = alloca [3 x i32]
  %1 = gep [3 x i32] %0, 0, 0
  %2 = store i32 1, %1
  %3 = gep [3 x i32] %0, 0, 1
  %4 = store i32 2, %3
  %5 = gep [3 x i32] %0, 0, 2
  %6 = store i32 3, %5
  %7 = load [3 x i32] %0
}
"
    );
}

// ── Field access ───────────────────────────────────────────────

#[test]
fn field_of_a_param_spills_then_addresses() {
    // fn f(p: Point) -> i32 { p.y }
    let mut cb = CrateBuilder::new();
    let point = cb.struct_ty("Point", &[("x", TyId::I32), ("y", TyId::I32)]);
    let f = cb.begin_fn("f", &[("p", point, false)], TyId::I32);
    let p = cb.path("p", point);
    let y = cb.field(p, "y", TyId::I32);
    let body = cb.block(f.body_scope, &[], Some(y), TyId::I32);
    cb.end_fn(f, body);

    assert_eq!(
        cb.render(),
        "\
%Point = type { i32, i32 }

define i32 @f(%Point %p) {
entry:
  %p.addr = alloca %Point
  %0 = store %Point %p, %p.addr
  %1 = gep %Point %p.addr, 0, 1
  %2 = load i32 %1
  ret i32 %2
}
"
    );
}

#[test]
fn immutable_struct_used_as_a_place_is_stored_once() {
    // fn f() -> i32 { let p = Point { x: 1, y: 2 }; p.x + p.y }
    let mut cb = CrateBuilder::new();
    let point = cb.struct_ty("Point", &[("x", TyId::I32), ("y", TyId::I32)]);
    let f = cb.begin_fn("f", &[], TyId::I32);
    let one = cb.int(1, TyId::I32);
    let two = cb.int(2, TyId::I32);
    let lit = cb.struct_lit(point, &[("x", one), ("y", two)]);
    let decl = cb.let_stmt("p", false, point, Some(lit));
    let p = cb.path("p", point);
    let x = cb.field(p, "x", TyId::I32);
    let p = cb.path("p", point);
    let y = cb.field(p, "y", TyId::I32);
    let sum = cb.binary(BinaryOp::Add, x, y, TyId::I32);
    let body = cb.block(f.body_scope, &[decl], Some(sum), TyId::I32);
    cb.end_fn(f, body);

    let module = cb.lower().unwrap();
    let text = module.render();
    let entry = &module.function_by_name("f").unwrap().blocks()[0];
    let allocas = entry.instructions().iter().filter(|i| i.kind.is_alloca()).count();
    // The literal's temporary and `p` itself.
    assert_eq!(allocas, 2);
    assert_eq!(text.matches("store %Point").count(), 1);
    assert!(text.contains("%p.addr = alloca %Point\n"));
    assert!(!text.contains("%p.addr.1"));
}

#[test]
fn address_taken_param_is_spilled_before_any_branch() {
    // fn f(c: bool, p: Point) -> i32 { (if c { p.x } else { 0 }) + p.y }
    let mut cb = CrateBuilder::new();
    let point = cb.struct_ty("Point", &[("x", TyId::I32), ("y", TyId::I32)]);
    let f = cb.begin_fn("f", &[("c", TyId::BOOL, false), ("p", point, false)], TyId::I32);
    let c = cb.path("c", TyId::BOOL);
    let p = cb.path("p", point);
    let x = cb.field(p, "x", TyId::I32);
    let zero = cb.int(0, TyId::I32);
    let pick = cb.if_else(c, x, Some(zero), TyId::I32);
    let p = cb.path("p", point);
    let y = cb.field(p, "y", TyId::I32);
    let sum = cb.binary(BinaryOp::Add, pick, y, TyId::I32);
    let body = cb.block(f.body_scope, &[], Some(sum), TyId::I32);
    cb.end_fn(f, body);

    let text = cb.render();
    assert!(text.contains(
        "entry:\n  %p.addr = alloca %Point\n  %0 = store %Point %p, %p.addr\n  br %c, %then.1, %else.2\n"
    ));
    assert_eq!(text.matches("alloca").count(), 1);
}

#[test]
fn field_through_a_mutable_reference_is_assignable() {
    // fn f(p: &mut Point) { p.x = 7; }
    let mut cb = CrateBuilder::new();
    let point = cb.struct_ty("Point", &[("x", TyId::I32), ("y", TyId::I32)]);
    let point_mut = cb.krate.types.reference(point, true);
    let f = cb.begin_fn("f", &[("p", point_mut, false)], TyId::UNIT);
    let p = cb.path("p", point_mut);
    let x = cb.field(p, "x", TyId::I32);
    let seven = cb.int(7, TyId::I32);
    let assign = cb.assign(x, seven);
    let body = cb.block(f.body_scope, &[Stmt::Semi(assign)], None, TyId::UNIT);
    cb.end_fn(f, body);

    assert_eq!(
        cb.render(),
        "\
%Point = type { i32, i32 }

define void @f(ptr mut %Point %p) {
entry:
  %0 = gep %Point %p, 0, 0
  %1 = store i32 7, %0
  ret void
}
"
    );
}

#[test]
fn field_through_a_shared_reference_is_read_only() {
    // fn f(p: &Point) { p.x = 7; }
    let mut cb = CrateBuilder::new();
    let point = cb.struct_ty("Point", &[("x", TyId::I32), ("y", TyId::I32)]);
    let point_ref = cb.krate.types.reference(point, false);
    let f = cb.begin_fn("f", &[("p", point_ref, false)], TyId::UNIT);
    let p = cb.path("p", point_ref);
    let x = cb.field(p, "x", TyId::I32);
    let seven = cb.int(7, TyId::I32);
    let assign = cb.assign(x, seven);
    let body = cb.block(f.body_scope, &[Stmt::Semi(assign)], None, TyId::UNIT);
    cb.end_fn(f, body);

    assert!(matches!(cb.lower(), Err(LowerError::ImmutablePlace { .. })));
}

#[test]
fn unknown_field_access_fails() {
    let mut cb = CrateBuilder::new();
    let point = cb.struct_ty("Point", &[("x", TyId::I32), ("y", TyId::I32)]);
    let x = cb.int(0, TyId::I32);
    let y = cb.int(0, TyId::I32);
    let lit = cb.struct_lit(point, &[("x", x), ("y", y)]);
    let z = cb.field(lit, "z", TyId::I32);
    assert!(matches!(
        cb.lower_open(z),
        Err(LowerError::UnknownField { field, .. }) if field == "z"
    ));
}

// ── Indexing ───────────────────────────────────────────────────

#[test]
fn index_uses_the_index_type_for_both_steps() {
    // fn f(a: [i32; 4], i: usize) -> i32 { a[i] }
    let mut cb = CrateBuilder::new();
    let arr = cb.krate.types.array(TyId::I32, 4);
    let f = cb.begin_fn("f", &[("a", arr, false), ("i", TyId::USIZE, false)], TyId::I32);
    let a = cb.path("a", arr);
    let i = cb.path("i", TyId::USIZE);
    let elem = cb.index(a, i, TyId::I32);
    let body = cb.block(f.body_scope, &[], Some(elem), TyId::I32);
    cb.end_fn(f, body);

    let module = cb.lower().unwrap();
    let entry = &module.function_by_name("f").unwrap().blocks()[0];
    let gep = entry
        .instructions()
        .iter()
        .find(|inst| inst.kind.opcode() == "gep")
        .unwrap();
    assert!(gep
        .kind
        .operands()
        .iter()
        .skip(1)
        .all(|v| v.ty() == &IrType::USIZE));
    assert!(module
        .render()
        .contains("  %1 = gep [4 x i32] %a.addr, 0, %i\n  %2 = load i32 %1\n"));
}

#[test]
fn indexing_a_non_array_fails() {
    let mut cb = CrateBuilder::new();
    let base = cb.int(5, TyId::I32);
    let zero = cb.int(0, TyId::USIZE);
    let elem = cb.index(base, zero, TyId::I32);
    assert!(matches!(
        cb.lower_open(elem),
        Err(LowerError::IndexNonArray { found, .. }) if found == "i32"
    ));
}

// ── Aggregate copies ───────────────────────────────────────────

#[test]
fn large_struct_copy_becomes_a_bulk_copy_call() {
    // fn f(src: &Big) { let mut copy = *src; }
    let mut cb = CrateBuilder::new();
    let big = big(&mut cb);
    let big_ref = cb.krate.types.reference(big, false);
    let f = cb.begin_fn("f", &[("src", big_ref, false)], TyId::UNIT);
    let src = cb.path("src", big_ref);
    let value = cb.deref(src, big);
    let decl = cb.let_stmt("copy", true, big, Some(value));
    let body = cb.block(f.body_scope, &[decl], None, TyId::UNIT);
    cb.end_fn(f, body);

    assert_eq!(
        cb.render(),
        "\
%Big = type { i32, i32, i32, i32, i32 }

declare void @memcpy(ptr mut u8, ptr u8, usize)

define void @f(ptr %Big %src) {
entry:
  %copy.addr = alloca %Big
  %1 = bitcast ptr mut %Big %copy.addr to ptr mut u8
  %2 = bitcast ptr %Big %src to ptr u8
  %3 = call void @memcpy(%1, %2, 20)
  ret void
}
"
    );
}

#[test]
fn immutable_binding_keeps_its_load() {
    // { let copy = *src; let mut other = copy; } with src: &Big
    let mut cb = CrateBuilder::new();
    let big = big(&mut cb);
    let big_ref = cb.krate.types.reference(big, false);
    let f = cb.begin_fn("f", &[("src", big_ref, false)], TyId::UNIT);
    let src = cb.path("src", big_ref);
    let value = cb.deref(src, big);
    let bind = cb.let_stmt("copy", false, big, Some(value));
    let copy = cb.path("copy", big);
    let spill = cb.let_stmt("other", true, big, Some(copy));
    let scope = cb.child_scope(f.body_scope);
    let inner = cb.block(scope, &[bind, spill], None, TyId::UNIT);
    let body = cb.block(f.body_scope, &[Stmt::Expr(inner)], None, TyId::UNIT);
    cb.end_fn(f, body);

    let text = cb.render();
    assert!(text.contains("  %0 = load %Big %src\n"));
    assert!(text.contains("  %1 = store %Big %0, %other.addr\n"));
    assert!(!text.contains("memcpy"));
}

#[test]
fn every_struct_literal_copy_into_a_slot_is_bulk_copied() {
    // fn f() { let mut a = Big { .. }; let mut b = a; }
    let mut cb = CrateBuilder::new();
    let big = big(&mut cb);
    let f = cb.begin_fn("f", &[], TyId::UNIT);
    let fields: Vec<(&str, _)> = ["a", "b", "c", "d", "e"]
        .into_iter()
        .map(|name| (name, cb.int(0, TyId::I32)))
        .collect();
    let lit = cb.struct_lit(big, &fields);
    let first = cb.let_stmt("a", true, big, Some(lit));
    let a = cb.path("a", big);
    let second = cb.let_stmt("b", true, big, Some(a));
    let body = cb.block(f.body_scope, &[first, second], None, TyId::UNIT);
    cb.end_fn(f, body);

    let module = cb.lower().unwrap();
    let entry = &module.function_by_name("f").unwrap().blocks()[0];
    let count = |opcode: &str| {
        entry
            .instructions()
            .iter()
            .filter(|inst| inst.kind.opcode() == opcode)
            .count()
    };
    assert_eq!(count("call"), 2);
    assert_eq!(count("load"), 0);
    assert_eq!(count("alloca"), 3);
}
