use super::*;
use pretty_assertions::assert_eq;

fn call(arena: &mut ExprArena, interner: &StringInterner, head: &str, args: Vec<ExprId>) -> ExprId {
    let head = arena.alloc(ExprKind::Symbol(interner.intern(head)), Span::DUMMY);
    let mut items = vec![head];
    items.extend(args);
    arena.alloc(ExprKind::List(items), Span::new(0, 10))
}

#[test]
fn test_alloc_assigns_sequential_ids() {
    let mut arena = ExprArena::new();
    let a = arena.alloc(ExprKind::Nil, Span::DUMMY);
    let b = arena.alloc(ExprKind::Int(1), Span::new(2, 3));
    assert_eq!(a, ExprId::new(0));
    assert_eq!(b, ExprId::new(1));
    assert_eq!(arena.len(), 2);
    assert_eq!(arena.span(b), Some(Span::new(2, 3)));
}

#[test]
fn test_get_rejects_invalid_and_foreign_ids() {
    let mut arena = ExprArena::new();
    arena.alloc(ExprKind::Nil, Span::DUMMY);
    assert!(arena.get(ExprId::INVALID).is_none());
    assert!(arena.get(ExprId::new(5)).is_none());
}

#[test]
fn test_display_nested_call() {
    let interner = StringInterner::new();
    let mut arena = ExprArena::new();
    let n = arena.alloc(ExprKind::Symbol(interner.intern("n")), Span::DUMMY);
    let one = arena.alloc(ExprKind::Int(1), Span::DUMMY);
    let minus = call(&mut arena, &interner, "-", vec![n, one]);
    let fact = call(&mut arena, &interner, "fact", vec![minus]);

    assert_eq!(arena.display(fact, &interner), "(fact (- n 1))");
}

#[test]
fn test_display_atoms() {
    let interner = StringInterner::new();
    let mut arena = ExprArena::new();
    let nil = arena.alloc(ExprKind::Nil, Span::DUMMY);
    let t = arena.alloc(ExprKind::Bool(true), Span::DUMMY);
    let s = arena.alloc(ExprKind::Str("a \"b\"".to_string()), Span::DUMMY);
    let empty = arena.alloc(ExprKind::List(Vec::new()), Span::DUMMY);

    assert_eq!(arena.display(nil, &interner), "nil");
    assert_eq!(arena.display(t, &interner), "true");
    assert_eq!(arena.display(s, &interner), r#""a \"b\"""#);
    assert_eq!(arena.display(empty, &interner), "()");
    assert_eq!(arena.display(ExprId::INVALID, &interner), "<unknown>");
}
