/// Formats a byte count as megabytes with one decimal, e.g. `52.4 MB`.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}
