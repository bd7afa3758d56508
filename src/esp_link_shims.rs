//! `critical-section` implementation for the device.
//!
//! `embassy-sync`'s `CriticalSectionRawMutex` guards the frame buffer, which
//! the main task and the HTTP server task share. The section is a
//! process-wide lock, re-entrant per thread via a nesting count.

#![cfg(target_os = "espidf")]

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

use critical_section::RawRestoreState;

static SECTION: Mutex<()> = Mutex::new(());

thread_local! {
    static NESTING: Cell<u32> = const { Cell::new(0) };
    static HELD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

struct TaskCriticalSection;

critical_section::set_impl!(TaskCriticalSection);

// SAFETY: the outermost acquire takes a process-wide lock that only the
// matching outermost release drops; inner pairs just move the count.
unsafe impl critical_section::Impl for TaskCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let depth = NESTING.get();
        if depth == 0 {
            // The lock guards `()`, so poisoning leaves nothing stale.
            let guard = SECTION.lock().unwrap_or_else(PoisonError::into_inner);
            HELD.with_borrow_mut(|held| *held = Some(guard));
        }
        NESTING.set(depth.saturating_add(1));
    }

    unsafe fn release(_restore: RawRestoreState) {
        match NESTING.get() {
            0 => {}
            1 => {
                NESTING.set(0);
                HELD.with_borrow_mut(|held| *held = None);
            }
            depth => NESTING.set(depth - 1),
        }
    }
}
