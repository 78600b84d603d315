/// OpenGL error checks - glGetError after device calls, with colored stats
///
/// With the `gl-debug` feature every device call is followed by
/// `check_gl_error`, which logs failures and counts them per call site.
/// Without the feature the checks compile to nothing.

use colored::*;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

#[cfg(feature = "gl-debug")]
use glow::HasContext;
#[cfg(feature = "gl-debug")]
use galaxy_3d_rasterizer::engine_error;

/// Total GL errors seen since the last reset
static ERROR_COUNT: AtomicU32 = AtomicU32::new(0);

/// Errors grouped by "call: code"
static ERROR_TRACKER: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Name of a glGetError code
pub fn error_name(code: u32) -> &'static str {
    match code {
        glow::NO_ERROR => "NO_ERROR",
        glow::INVALID_ENUM => "INVALID_ENUM",
        glow::INVALID_VALUE => "INVALID_VALUE",
        glow::INVALID_OPERATION => "INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "OUT_OF_MEMORY",
        _ => "unknown",
    }
}

/// Count one error for `call`, returns how often this pair was seen
pub fn record_error(call: &str, code: u32) -> u32 {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
    let key = format!("{}: {}", call, error_name(code));
    let Ok(mut tracker) = ERROR_TRACKER.lock() else {
        return 1;
    };
    let count = tracker.get_or_insert_with(FxHashMap::default).entry(key).or_insert(0);
    *count += 1;
    *count
}

/// Errors recorded since the last reset
pub fn gl_error_count() -> u32 {
    ERROR_COUNT.load(Ordering::Relaxed)
}

pub fn reset_gl_error_stats() {
    ERROR_COUNT.store(0, Ordering::Relaxed);
    if let Ok(mut tracker) = ERROR_TRACKER.lock() {
        *tracker = None;
    }
}

/// Log the GL error raised by `call`, if any (first occurrence per call only)
#[cfg(feature = "gl-debug")]
pub fn check_gl_error(gl: &glow::Context, call: &str) {
    let code = unsafe { gl.get_error() };
    if code != glow::NO_ERROR && record_error(call, code) == 1 {
        engine_error!("galaxy3d::GlDevice", "{} raised {} (0x{:04X})", call, error_name(code), code);
    }
}

#[cfg(not(feature = "gl-debug"))]
#[inline(always)]
pub fn check_gl_error(_gl: &glow::Context, _call: &str) {}

/// Print the grouped error report to stdout
pub fn print_gl_error_report() {
    let total = gl_error_count();
    if total == 0 {
        println!("\n{}", "✓ No GL errors".green().bold());
        return;
    }

    println!("\n{}", "=== GL Error Report ===".bright_blue().bold());
    if let Ok(tracker) = ERROR_TRACKER.lock() {
        if let Some(tracker) = tracker.as_ref() {
            let mut entries: Vec<_> = tracker.iter().collect();
            entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (message, count) in entries {
                println!("  {} x{}", message.red(), count);
            }
        }
    }
    println!("  {} {}", "Total:".white().bold(), total);
    println!("{}\n", "=======================".bright_blue().bold());
}
