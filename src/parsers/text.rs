/// Normalizes whitespace within a single line or label
pub fn normalize_whitespace_in_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits text into chunks of at most `max_chars` characters.
///
/// Chunks break on line boundaries; empty lines are dropped. A single line
/// longer than `max_chars` is cut into several chunks on char boundaries.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        for piece in split_long_line(line, max_chars) {
            let piece_len = piece.chars().count();

            if !current.is_empty() && current_len + 1 + piece_len > max_chars {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(piece);
            current_len += piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Cuts a line into pieces of at most `max_chars` characters
fn split_long_line(line: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in line.char_indices() {
        if count == max_chars {
            pieces.push(&line[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < line.len() {
        pieces.push(&line[start..]);
    }

    pieces
}
