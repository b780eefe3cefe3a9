//! Bounded busy-wait polling
//!
//! None of the drivers block on a scheduler. Whenever they need to wait for
//! a hardware flag they spin on it with a fixed iteration budget and give up
//! with [`Timeout`] once the budget is spent.

/// A poll ran out of iterations before its condition became true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout;

/// Spins until `done` returns `true`.
///
/// `done` is evaluated at most `budget + 1` times. A budget of 0 still
/// checks the condition once.
///
/// ```
/// use mcu_hal_common::poll::{wait_until, Timeout};
///
/// let mut polls = 0;
/// assert_eq!(wait_until(10, || { polls += 1; polls == 3 }), Ok(()));
/// assert_eq!(wait_until(2, || false), Err(Timeout));
/// ```
#[inline]
pub fn wait_until(budget: u32, mut done: impl FnMut() -> bool) -> Result<(), Timeout> {
    let mut remaining = budget;
    loop {
        if done() {
            return Ok(());
        }
        if remaining == 0 {
            return Err(Timeout);
        }
        remaining -= 1;
        core::hint::spin_loop();
    }
}
