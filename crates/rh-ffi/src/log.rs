//! Core log sink
//!
//! Cores log through a variadic printf callback. The C shim formats the
//! message and hands the result to [`rh_core_log`].

use crate::abi::{
    retro_log_printf_t, RETRO_LOG_DEBUG, RETRO_LOG_ERROR, RETRO_LOG_INFO, RETRO_LOG_WARN,
};
use std::ffi::{c_char, c_int, CStr};

extern "C" {
    fn rh_log_printf(level: c_int, fmt: *const c_char, ...);
}

/// The printf callback handed to cores asking for a log interface
pub fn log_printf() -> retro_log_printf_t {
    rh_log_printf
}

/// Receives formatted core log lines from the C shim
#[no_mangle]
pub extern "C" fn rh_core_log(level: c_int, msg: *const c_char) {
    if msg.is_null() {
        return;
    }
    // SAFETY: the shim always passes its NUL-terminated stack buffer
    let msg = unsafe { CStr::from_ptr(msg) }.to_string_lossy();
    emit(level, msg.trim_end_matches('\n'));
}

fn emit(level: c_int, msg: &str) {
    match level {
        RETRO_LOG_DEBUG => tracing::debug!(target: "core", "{}", msg),
        RETRO_LOG_INFO => tracing::info!(target: "core", "{}", msg),
        RETRO_LOG_WARN => tracing::warn!(target: "core", "{}", msg),
        RETRO_LOG_ERROR => tracing::error!(target: "core", "{}", msg),
        _ => tracing::info!(target: "core", "{}", msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_through_shim() {
        let printf = log_printf();
        let fmt = c"frame %d of %s\n";
        let name = c"test";
        // Only checks the variadic round trip doesn't crash
        unsafe { printf(RETRO_LOG_INFO, fmt.as_ptr(), 3 as c_int, name.as_ptr()) };
        rh_core_log(RETRO_LOG_WARN, std::ptr::null());
    }
}
