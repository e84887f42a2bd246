//! Call-site cache state machine.

use pretty_assertions::assert_eq;
use subset_r_vm::prelude::*;
use subset_r_vm::vm::{ArgShape, CallSiteStats};

fn state_label(vm: &Vm, site: CallSiteId) -> &'static str {
    vm.dispatcher().site(site).expect("call site").state().label()
}

fn stats(vm: &Vm, site: CallSiteId) -> CallSiteStats {
    vm.dispatcher().site(site).expect("call site").stats()
}

// ==================== State transitions ====================

#[test]
fn test_monomorphic_to_megamorphic() {
    let mut vm = Vm::new();
    let site = vm.call_site("abs").unwrap();
    assert_eq!(state_label(&vm, site), "uninitialized");

    let abs = |vm: &mut Vm, x: Value| vm.call(site, vec![Arg::positional(x)]).unwrap();

    assert_eq!(abs(&mut vm, Value::Integer(-1)), Value::Integer(1));
    assert_eq!(state_label(&vm, site), "monomorphic");
    assert_eq!(abs(&mut vm, Value::Integer(-2)), Value::Integer(2));
    assert_eq!(state_label(&vm, site), "monomorphic");

    assert_eq!(abs(&mut vm, Value::Double(-1.5)), Value::Double(1.5));
    assert_eq!(state_label(&vm, site), "polymorphic");
    assert_eq!(
        abs(&mut vm, Value::int_vec(vec![-1, 2])),
        Value::int_vec(vec![1, 2])
    );
    assert_eq!(state_label(&vm, site), "polymorphic");

    assert_eq!(
        abs(&mut vm, Value::double_vec(vec![-3.0, 4.0])),
        Value::double_vec(vec![3.0, 4.0])
    );
    assert_eq!(state_label(&vm, site), "megamorphic");

    // every later shape still gets a correct answer
    assert_eq!(abs(&mut vm, Value::from(true)), Value::Integer(1));
    assert_eq!(abs(&mut vm, Value::Integer(-7)), Value::Integer(7));
    assert_eq!(state_label(&vm, site), "megamorphic");

    assert_eq!(
        stats(&vm, site),
        CallSiteStats {
            hits: 1,
            misses: 4,
            generic_calls: 3,
        }
    );
}

#[test]
fn test_type_error_leaves_cache_untouched() {
    let mut vm = Vm::new();
    let site = vm.call_site("sqrt").unwrap();
    vm.call(site, vec![Arg::positional(4.0)]).unwrap();

    let err = vm.call(site, vec![Arg::positional("x")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(
        err.to_string(),
        "Error in sqrt() : non-numeric argument to mathematical function"
    );
    assert_eq!(state_label(&vm, site), "monomorphic");

    assert_eq!(
        vm.call(site, vec![Arg::positional(9.0)]).unwrap(),
        Value::Double(3.0)
    );
}

#[test]
fn test_megamorphic_generic_path_reports_type_errors() {
    let config = SessionConfig::from_toml_str("[dispatch]\ncache_limit = 1\n").unwrap();
    let mut vm = Vm::with_config(&config).unwrap();
    let site = vm.call_site("floor").unwrap();
    vm.call(site, vec![Arg::positional(1.5)]).unwrap();
    vm.call(site, vec![Arg::positional(2)]).unwrap();
    assert_eq!(state_label(&vm, site), "megamorphic");

    let err = vm
        .call(site, vec![Arg::positional(Value::raw_vec(vec![1]))])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(
        vm.call(site, vec![Arg::positional(-0.5)]).unwrap(),
        Value::Double(-1.0)
    );
}

#[test]
fn test_sites_are_independent() {
    let mut vm = Vm::new();
    let a = vm.call_site("+").unwrap();
    let b = vm.call_site("+").unwrap();
    let shapes = [
        Value::Integer(1),
        Value::Double(1.0),
        Value::from(true),
        Value::double_vec(vec![1.0, 2.0]),
    ];
    for x in shapes {
        vm.call(a, vec![Arg::positional(x.clone()), Arg::positional(x)])
            .unwrap();
    }
    vm.call(b, vec![Arg::positional(1), Arg::positional(2)])
        .unwrap();
    assert_eq!(state_label(&vm, a), "megamorphic");
    assert_eq!(state_label(&vm, b), "monomorphic");
}

#[test]
fn test_monomorphic_entry_key() {
    let mut vm = Vm::new();
    let site = vm.call_site("+").unwrap();
    vm.call(site, vec![Arg::positional(1.0), Arg::positional(2.0)])
        .unwrap();
    match vm.dispatcher().site(site).unwrap().state() {
        CacheState::Monomorphic(entry) => {
            assert_eq!(&*entry.key, &[ArgShape::Double, ArgShape::Double]);
        }
        other => panic!("unexpected state {:?}", other),
    }
}

// ==================== Argument matching ====================

#[test]
fn test_partial_and_unknown_names() {
    let mut vm = Vm::new();
    let v = vm
        .call_builtin(
            "round",
            vec![Arg::positional(2.7), Arg::named("dig", 0)],
        )
        .unwrap();
    assert_eq!(v, Value::Double(3.0));

    let err = vm
        .call_builtin("abs", vec![Arg::named("y", 1)])
        .unwrap_err();
    assert!(err.message().starts_with("unused argument"));

    let err = vm.call_builtin("abs", vec![]).unwrap_err();
    assert_eq!(err.message(), "argument \"x\" is missing, with no default");
}

#[test]
fn test_unknown_builtin() {
    let mut vm = Vm::new();
    let err = vm.call_builtin("no.such.fn", vec![]).unwrap_err();
    assert_eq!(err.to_string(), "Error: could not find function \"no.such.fn\"");
}
