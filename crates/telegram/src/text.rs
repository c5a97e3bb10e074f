//! Fitting outgoing text into Telegram messages.

/// Telegram rejects messages longer than this.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into pieces of at most `max_len` bytes.
///
/// Splits prefer the last newline, then the last space, inside the window;
/// a line with neither is cut at the nearest char boundary.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 {
        return Vec::new();
    }
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut window_end = remaining.floor_char_boundary(max_len);
        if window_end == 0 {
            window_end = remaining
                .chars()
                .next()
                .map_or(remaining.len(), char::len_utf8);
        }

        let window = &remaining[..window_end];
        let split_at = match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(0) | None => window_end,
            Some(at) => at,
        };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches('\n');
        remaining = remaining.strip_prefix(' ').unwrap_or(remaining);
    }

    chunks
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_message("Print queue:\nPDF-1", 4096), vec![
            "Print queue:\nPDF-1".to_string()
        ]);
    }

    #[test]
    fn splits_on_line_breaks() {
        let line = "PDF-12  alice  20480  Mon 12 Oct 2026 10:00:00";
        let text = vec![line; 200].join("\n");
        let chunks = chunk_message(&text, TELEGRAM_MAX_MESSAGE_LEN);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= TELEGRAM_MAX_MESSAGE_LEN);
            assert!(chunk.lines().all(|l| l == line), "line was cut: {chunk:?}");
        }
        assert_eq!(chunks.iter().map(|c| c.lines().count()).sum::<usize>(), 200);
    }

    #[test]
    fn unbroken_text_respects_utf8_boundary() {
        let text = format!("{}лz", "a".repeat(4095));
        let chunks = chunk_message(&text, TELEGRAM_MAX_MESSAGE_LEN);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4095);
        assert_eq!(chunks[1], "лz");
    }
}
