use super::*;
use crate::call_stack::Frame;
use crate::errors::{CallStackError, EvalErrorKind};
use crate::observer::{StackEvent, StackObserver};
use crate::config::DebugFlags;
use pretty_assertions::assert_eq;
use serene_ir::{ExprKind, Span};
use std::io;
use std::sync::{Arc, Mutex};

/// Writer collecting formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a debug-level subscriber and return what it logged.
fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().expect("log buffer").clone();
    String::from_utf8(bytes).expect("utf-8 log output")
}

/// Allocate `(head arg...)` and return the list's id.
fn call_expr(runtime: &mut Runtime, head: &str, args: &[ExprKind]) -> ExprId {
    let head = runtime.interner().intern(head);
    let mut items = vec![runtime.arena_mut().alloc(ExprKind::Symbol(head), Span::DUMMY)];
    for arg in args {
        let id = runtime.arena_mut().alloc(arg.clone(), Span::DUMMY);
        items.push(id);
    }
    runtime.arena_mut().alloc(ExprKind::List(items), Span::new(0, 12))
}

#[test]
fn builtins_get_ids_per_runtime() {
    let runtime = Runtime::new(RuntimeConfig::default());
    let hash = runtime.builtin("hash").expect("hash is a builtin");
    assert_eq!(runtime.function_name(hash), Some("hash"));
    assert_eq!(runtime.builtin("require"), None);
}

#[test]
fn declared_functions_are_distinct_callables() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let a = runtime.declare_function("loop");
    let b = runtime.declare_function("loop");
    assert_ne!(a, b);
    assert_eq!(runtime.function_name(a), Some("loop"));
    assert_eq!(runtime.function_name(b), Some("loop"));
}

#[test]
fn call_native_restores_depth_on_success() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let hash = runtime.builtin("hash").expect("hash is a builtin");
    let site = call_expr(&mut runtime, "hash", &[ExprKind::Int(1)]);

    let result = runtime.call_native(&Scope::new(), site, hash, &[Value::Int(1)]);
    assert!(matches!(result, Ok(Value::Int(_))));
    assert_eq!(runtime.call_stack().count(), 0);
}

#[test]
fn call_native_restores_collapsed_caller_frame() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let hash = runtime.builtin("hash").expect("hash is a builtin");
    let site = call_expr(&mut runtime, "hash", &[ExprKind::Nil]);

    runtime.call_stack_mut().push(site, hash).expect("push hash");
    let before = runtime.call_stack().peek().copied();

    runtime
        .call_native(&Scope::new(), site, hash, &[Value::Nil])
        .expect("hash of nil");
    assert_eq!(runtime.call_stack().peek().copied(), before);

    runtime
        .call_native(&Scope::new(), site, hash, &[])
        .expect_err("hash without arguments");
    assert_eq!(runtime.call_stack().peek().copied(), before);
    assert_eq!(runtime.call_stack().count(), 1);
}

#[test]
fn call_native_failure_carries_traceback() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let main = runtime.declare_function("main");
    let hash = runtime.builtin("hash").expect("hash is a builtin");
    let main_site = call_expr(&mut runtime, "main", &[]);
    let hash_site = call_expr(&mut runtime, "hash", &[]);

    runtime
        .call_stack_mut()
        .push(main_site, main)
        .expect("push main");

    let err = runtime
        .call_native(&Scope::new(), hash_site, hash, &[])
        .expect_err("hash without arguments");

    assert_eq!(
        err.kind,
        EvalErrorKind::ArityMismatch {
            name: "hash".to_string(),
            expected: 1,
            got: 0,
        }
    );
    assert_eq!(err.span, Some(Span::new(0, 12)));
    let traceback = err.traceback.expect("traceback attached");
    assert_eq!(
        traceback.frames(),
        &[
            Frame::new(main_site, main, 0),
            Frame::new(hash_site, hash, 0),
        ]
    );
    // Only the native frame is gone; the caller's frame is still active.
    assert_eq!(runtime.call_stack().count(), 1);
    assert_eq!(runtime.call_stack().current_fn(), Some(main));
}

#[test]
fn call_native_rejects_user_function() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let user = runtime.declare_function("fact");
    let site = call_expr(&mut runtime, "fact", &[ExprKind::Int(5)]);

    let err = runtime
        .call_native(&Scope::new(), site, user, &[Value::Int(5)])
        .expect_err("user functions are run by the evaluator");
    assert_eq!(
        err.kind,
        EvalErrorKind::NotCallable {
            name: "fact".to_string()
        }
    );
    assert_eq!(err.traceback.map(|t| t.len()), Some(1));
    assert_eq!(runtime.call_stack().count(), 0);
}

#[test]
fn call_native_with_nil_call_site_leaves_stack_alone() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let hash = runtime.builtin("hash").expect("hash is a builtin");

    let err = runtime
        .call_native(&Scope::new(), ExprId::INVALID, hash, &[Value::Nil])
        .expect_err("nil call site");
    assert_eq!(err.kind, EvalErrorKind::CallStack(CallStackError::NilCallSite));
    assert!(err.traceback.is_none());
    assert_eq!(runtime.call_stack().count(), 0);
}

#[test]
fn traceback_renders_names_and_sources() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let fact = runtime.declare_function("fact");
    let n = runtime.interner().intern("n");
    let site = call_expr(&mut runtime, "fact", &[ExprKind::Symbol(n)]);

    // A tail-recursive loop: the evaluator pushes on every iteration.
    for _ in 0..3 {
        runtime.call_stack_mut().push(site, fact).expect("push fact");
    }

    let rendered = runtime.call_stack().to_traceback().display(&runtime).to_string();
    assert_eq!(
        rendered,
        "traceback (most recent call last):\n  0: <Frame: fn: fact, count: 2, caller: (fact n)>\n"
    );
}

#[test]
fn unknown_callable_renders_as_id() {
    let runtime = Runtime::new(RuntimeConfig::default());
    let stranger = FnId::from_raw(999);
    assert_eq!(runtime.callable_name(stranger), "fn#999");
    assert_eq!(runtime.call_site_source(ExprId::new(42)), "<unknown>");
}

#[test]
fn stack_diagnostics_config_selects_tracing_observer() {
    let runtime = Runtime::new(RuntimeConfig::default().with_stack_diagnostics(true));
    assert!(matches!(
        runtime.call_stack().observer(),
        StackObserver::Tracing(_)
    ));
    assert!(runtime.config().stack_diagnostics());
}

#[test]
fn observer_sees_native_call_protocol() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    *runtime.call_stack_mut() = CallStack::with_observer(StackObserver::buffer());
    let hash = runtime.builtin("hash").expect("hash is a builtin");
    let site = call_expr(&mut runtime, "hash", &[ExprKind::Nil]);

    runtime
        .call_native(&Scope::new(), site, hash, &[Value::Nil])
        .expect("hash of nil");

    assert_eq!(
        runtime.call_stack().observer().events(),
        &[
            StackEvent::Push {
                callable: hash,
                repeat_count: 0,
                collapsed: false,
            },
            StackEvent::Pop {
                callable: Some(hash),
            },
        ]
    );
}

#[test]
fn traceback_flag_logs_failed_calls() {
    let config = RuntimeConfig {
        debug: DebugFlags::TRACEBACK,
    };
    let mut runtime = Runtime::new(config);
    let hash = runtime.builtin("hash").expect("hash is a builtin");
    let site = call_expr(&mut runtime, "hash", &[]);

    let logs = capture_logs(|| {
        let err = runtime
            .call_native(&Scope::new(), site, hash, &[])
            .expect_err("hash without arguments");
        assert!(err.traceback.is_some());
    });
    assert!(logs.contains("hash expects 1 argument, got 0"), "{logs}");
    assert!(
        logs.contains("0: <Frame: fn: hash, count: 0, caller: (hash)>"),
        "{logs}"
    );
}

#[test]
fn failed_calls_are_not_logged_without_traceback_flag() {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let hash = runtime.builtin("hash").expect("hash is a builtin");
    let site = call_expr(&mut runtime, "hash", &[]);

    let logs = capture_logs(|| {
        let _ = runtime.call_native(&Scope::new(), site, hash, &[]);
    });
    assert!(!logs.contains("traceback (most recent call last)"), "{logs}");
}

#[test]
fn stack_trace_lines_name_callables() {
    let mut runtime = Runtime::new(RuntimeConfig::default().with_stack_diagnostics(true));
    let fact = runtime.declare_function("fact");
    let site = call_expr(&mut runtime, "fact", &[ExprKind::Int(3)]);

    let logs = capture_logs(|| {
        let stack = runtime.call_stack_mut();
        stack.push(site, fact).expect("push fact");
        stack.push(site, fact).expect("push fact");
        stack.pop();
    });
    assert!(logs.contains("[Stack] --> fact"), "{logs}");
    assert!(logs.contains("[Stack] --> fact (repeat 1)"), "{logs}");
    assert!(logs.contains("[Stack] <-- fact"), "{logs}");
}
