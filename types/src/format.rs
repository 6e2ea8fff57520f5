//! Duration formatting shared by the entity accessors.

/// Format a second count as zero-padded `HH:MM:SS`.
///
/// Plain integer arithmetic, no calendar awareness: durations of 24 hours
/// or more roll the hour field past two digits instead of wrapping.
#[must_use]
pub fn format_seconds_as_hhmmss(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    format!("{hours:02}:{minutes:02}:{secs:02}")
}
