//! Running untrusted callables without letting panics escape.
//!
//! [`call_guarded`] runs a body under `catch_unwind` and turns a panic into a
//! [`Raised`] of type `PanicException` whose trace records the panic site.
//! While a guarded call is running on a thread, the process panic hook stays
//! quiet for that thread; panics elsewhere still reach the previous hook.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use fyzz_core::runtime::{Raised, PANIC_EXCEPTION};

thread_local! {
    static GUARDED: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn install_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARDED.with(Cell::get) {
                let location = info
                    .location()
                    .map(|l| format!("panicked at {}:{}:{}", l.file(), l.line(), l.column()))
                    .unwrap_or_else(|| "panicked".to_string());
                let backtrace = Backtrace::capture();
                let trace = match backtrace.status() {
                    BacktraceStatus::Captured => format!("{}\n{}", location, backtrace),
                    _ => location,
                };
                LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(trace));
            } else {
                previous(info);
            }
        }));
    });
}

/// Run `body`, converting a panic into a raised `PanicException`.
pub fn call_guarded<T, F>(body: F) -> Result<T, Raised>
where
    F: FnOnce() -> Result<T, Raised>,
{
    install_hook();
    let was_guarded = GUARDED.with(|g| g.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(body));
    GUARDED.with(|g| g.set(was_guarded));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let raised = Raised::new(PANIC_EXCEPTION, panic_message(payload.as_ref()));
            match LAST_PANIC.with(|slot| slot.borrow_mut().take()) {
                Some(trace) => Err(raised.with_trace(trace)),
                None => Err(raised),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_results() {
        assert_eq!(call_guarded(|| Ok::<_, Raised>(3)), Ok(3));
        let err = call_guarded(|| Err::<(), _>(Raised::value_error("bad"))).unwrap_err();
        assert_eq!(err.type_name(), "ValueError");
    }

    #[test]
    fn panics_become_panic_exception() {
        let err = call_guarded(|| -> Result<(), Raised> { panic!("index {} out of range", 7) })
            .unwrap_err();
        assert_eq!(err.type_name(), PANIC_EXCEPTION);
        assert_eq!(err.message(), "index 7 out of range");
        assert!(err.is_standard());
        assert!(err.trace().is_some_and(|t| t.starts_with("panicked at")));
    }

    #[test]
    fn static_str_payload() {
        let err = call_guarded(|| -> Result<(), Raised> { panic!("plain") }).unwrap_err();
        assert_eq!(err.message(), "plain");
    }

    #[test]
    fn nested_guards_restore_state() {
        let outer = call_guarded(|| {
            let inner = call_guarded(|| -> Result<(), Raised> { panic!("inner") });
            assert!(inner.is_err());
            Ok::<_, Raised>(GUARDED.with(Cell::get))
        });
        assert_eq!(outer, Ok(true));
        assert!(!GUARDED.with(Cell::get));
    }
}
