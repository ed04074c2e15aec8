use serde::Serialize;

/// Byte-level size comparison between the source and the minified output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizeSummary {
    pub original_bytes: u64,
    pub minified_bytes: u64,
    pub saved_bytes: u64,
    pub saved_ratio: f64,
}

/// Compute size savings. An empty source reports a ratio of 0 rather than NaN.
pub fn compute_size_summary(source: &str, minified: &str) -> SizeSummary {
    let original_bytes = source.len() as u64;
    let minified_bytes = minified.len() as u64;
    let saved_bytes = original_bytes.saturating_sub(minified_bytes);
    let saved_ratio = if original_bytes == 0 {
        0.0
    } else {
        saved_bytes as f64 / original_bytes as f64
    };
    SizeSummary {
        original_bytes,
        minified_bytes,
        saved_bytes,
        saved_ratio,
    }
}

/// Human-readable byte count (B / KiB / MiB).
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}
