use std::time::{SystemTime, UNIX_EPOCH};

const FORMAT: &[u8] = b"%Y-%m-%d %H:%M:%S %Z\0";

/// Returns the current local time in the format YYYY-MM-DD HH:MM:SS TZ
#[cfg(target_family = "unix")]
pub fn now() -> String {
    let secs = unix_timestamp() as libc::time_t;

    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    let mut buf = [0u8; 100];

    let written = unsafe {
        if libc::localtime_r(&secs, &mut tm).is_null() {
            return format!("{}", secs);
        }
        libc::strftime(
            buf.as_mut_ptr() as *mut libc::c_char,
            buf.len(),
            FORMAT.as_ptr() as *const libc::c_char,
            &tm,
        )
    };

    String::from_utf8_lossy(&buf[..written]).into_owned()
}

/// Falls back to raw seconds where libc time formatting is unavailable
#[cfg(not(target_family = "unix"))]
pub fn now() -> String {
    let _ = FORMAT;
    format!("{}", unix_timestamp())
}

/// Returns the current Unix timestamp in seconds
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
