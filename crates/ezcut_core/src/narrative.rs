use std::time::Duration;

/// `[HH:MM:SS]`
const MARKER_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampMarker {
    /// Byte offset of the opening bracket.
    pub offset: usize,
    pub at: Duration,
}

/// Puts every `[HH:MM:SS]` marker on its own line and trims the result.
pub fn format_narrative(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for marker in timestamp_markers(text) {
        out.push_str(&text[last..marker.offset]);
        out.push('\n');
        last = marker.offset;
    }
    out.push_str(&text[last..]);
    out.trim().to_string()
}

pub fn timestamp_markers(text: &str) -> Vec<TimestampMarker> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'[' {
            if let Some(at) = parse_marker(&bytes[index..]) {
                markers.push(TimestampMarker { offset: index, at });
                index += MARKER_LEN;
                continue;
            }
        }
        index += 1;
    }
    markers
}

/// Offset of the first marker in `text`, e.g. `"[00:01:30]"` -> 90 s.
pub fn parse_timestamp(text: &str) -> Option<Duration> {
    timestamp_markers(text).first().map(|marker| marker.at)
}

fn parse_marker(candidate: &[u8]) -> Option<Duration> {
    if candidate.len() < MARKER_LEN
        || candidate[0] != b'['
        || candidate[3] != b':'
        || candidate[6] != b':'
        || candidate[9] != b']'
    {
        return None;
    }
    let field = |at: usize| -> Option<u64> {
        let (tens, ones) = (candidate[at], candidate[at + 1]);
        if tens.is_ascii_digit() && ones.is_ascii_digit() {
            Some(u64::from((tens - b'0') * 10 + (ones - b'0')))
        } else {
            None
        }
    };
    let seconds = field(1)? * 3600 + field(4)? * 60 + field(7)?;
    Some(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_move_to_their_own_lines() {
        let text = "[00:00:00] Opening. More. [00:01:00] Second act.";
        assert_eq!(
            format_narrative(text),
            "[00:00:00] Opening. More. \n[00:01:00] Second act."
        );
    }

    #[test]
    fn text_without_markers_is_only_trimmed() {
        assert_eq!(format_narrative("  plain story \n"), "plain story");
    }

    #[test]
    fn markers_report_offsets_and_durations() {
        let markers = timestamp_markers("a [01:02:03] b [xx:00:00] [00:00:09]");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].offset, 2);
        assert_eq!(markers[0].at, Duration::from_secs(3723));
        assert_eq!(markers[1].at, Duration::from_secs(9));
    }

    #[test]
    fn parse_timestamp_reads_first_marker() {
        assert_eq!(parse_timestamp("[00:01:30]"), Some(Duration::from_secs(90)));
        assert_eq!(parse_timestamp("no marker"), None);
    }
}
