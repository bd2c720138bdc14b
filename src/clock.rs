//! Monotonic microsecond clock
//!
//! On Unix the clock reads `CLOCK_MONOTONIC`, so timestamps taken by one
//! process can be compared with timestamps taken by another process on
//! the same host. Elsewhere it falls back to a process-local anchor, which
//! only supports round trips measured by a single bot.

#[cfg(unix)]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(not(unix))]
use std::sync::OnceLock;
#[cfg(not(unix))]
use std::time::Instant;

/// Latest successful reading, repeated if the clock ever fails.
#[cfg(unix)]
static LAST_READING_US: AtomicU64 = AtomicU64::new(0);

/// Current monotonic time in microseconds. Never goes backwards and is
/// unaffected by wall-clock adjustments.
#[cfg(unix)]
pub fn now_us() -> u64 {
    match read_clock_us(libc::CLOCK_MONOTONIC) {
        Some(now) => {
            let previous = LAST_READING_US.fetch_max(now, Ordering::Relaxed);
            previous.max(now)
        }
        None => LAST_READING_US.load(Ordering::Relaxed),
    }
}

/// Read `clock` in microseconds, or `None` if the kernel rejects the call
#[cfg(unix)]
fn read_clock_us(clock: libc::clockid_t) -> Option<u64> {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    // SAFETY: `ts` is a valid, exclusively borrowed timespec for the call.
    let rc = unsafe { libc::clock_gettime(clock, &mut ts) };
    if rc != 0 || ts.tv_sec < 0 || ts.tv_nsec < 0 {
        return None;
    }
    Some(ts.tv_sec as u64 * 1_000_000 + ts.tv_nsec as u64 / 1_000)
}

#[cfg(not(unix))]
pub fn now_us() -> u64 {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    ANCHOR.get_or_init(Instant::now).elapsed().as_micros() as u64
}

/// Microseconds elapsed since `timestamp_us`, or `None` when the timestamp
/// lies in the future (sender and receiver are not in one clock domain).
pub fn latency_since(timestamp_us: u64) -> Option<u64> {
    now_us().checked_sub(timestamp_us)
}
