use std::path::PathBuf;

fn env_or(name: &str, default: &str) -> String {
    println!("cargo:rerun-if-env-changed={name}");
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn main() {
    let timeout = env_or("DIODE_SAMPLE_TIMEOUT_TICKS", "");
    let interval = env_or("DIODE_BLOCKING_INTERVAL_MS", "100");
    let read_limit = env_or("DIODE_BLOCKING_READ_LIMIT", "");

    let timeout: Option<u32> = if timeout.is_empty() {
        None
    } else {
        Some(timeout.parse().expect("DIODE_SAMPLE_TIMEOUT_TICKS must be a u32"))
    };
    let read_limit: Option<u32> = if read_limit.is_empty() {
        None
    } else {
        Some(read_limit.parse().expect("DIODE_BLOCKING_READ_LIMIT must be a u32"))
    };
    let interval: u32 = interval.parse().expect("DIODE_BLOCKING_INTERVAL_MS must be a u32");

    let out_dir_path = PathBuf::from(std::env::var_os("OUT_DIR").unwrap());
    let out_file_path = out_dir_path.join("consts.rs");

    std::fs::write(
        out_file_path,
        format!(
            "
            // generated form env vars
            pub const SAMPLE_TIMEOUT_TICKS: Option<u32> = {timeout:?};
            pub const BLOCKING_INTERVAL_MS: u32 = {interval};
            pub const BLOCKING_READ_LIMIT: Option<u32> = {read_limit:?};"
        ),
    )
    .unwrap();
}
