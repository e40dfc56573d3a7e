use std::sync::OnceLock;

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str) -> bool {
    env_true(key).unwrap_or(false)
}

/// `SPYGLASS_DISABLE_TRACING`: skip both tracing passes regardless of options.
pub fn tracing_disabled() -> bool {
    static DISABLED: OnceLock<bool> = OnceLock::new();
    *DISABLED.get_or_init(|| bool_from_env("SPYGLASS_DISABLE_TRACING"))
}

/// `SPYGLASS_DISABLE_INTRINSICS`: leave intrinsic calls and caller-capture defaults untouched.
pub fn intrinsics_disabled() -> bool {
    static DISABLED: OnceLock<bool> = OnceLock::new();
    *DISABLED.get_or_init(|| bool_from_env("SPYGLASS_DISABLE_INTRINSICS"))
}

/// `SPYGLASS_DUMP_IR`: log the pretty-printed module after every pass at debug level.
pub fn dump_ir() -> bool {
    static DUMP: OnceLock<bool> = OnceLock::new();
    *DUMP.get_or_init(|| bool_from_env("SPYGLASS_DUMP_IR"))
}
