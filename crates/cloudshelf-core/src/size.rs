//! Byte size formatting and parsing.

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a human-readable size such as `"12.5 KB"`, `"3 MB"` or `"512"`.
///
/// Units are binary multiples. Placeholders the backend emits for
/// "nothing here" (`"Empty"`, `"—"`, `"-"`) parse as zero. Returns `None`
/// for anything else that is not a size, such as `"N/A"`.
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("empty") || s == "—" || s == "-" {
        return Some(0);
    }

    let upper = s.to_uppercase();
    let unit_start = upper
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(upper.len());
    let (num, unit) = upper.split_at(unit_start);
    let num: f64 = num.trim().parse().ok()?;

    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        "T" | "TB" | "TIB" => 1024 * 1024 * 1024 * 1024,
        _ => return None,
    };

    Some((num * multiplier as f64).round() as u64)
}
