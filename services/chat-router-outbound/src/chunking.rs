//! Splits outbound text into chunks that respect a platform's message
//! size cap, expressed in Unicode code points rather than UTF-16 units
//! or bytes. Since Rust strings are UTF-8 and `char` already denotes a
//! full Unicode scalar value, iterating by `char` can never split a
//! surrogate pair — there is no surrogate encoding to split.

pub const DEFAULT_CHUNK_CAP: usize = 4096;

/// Splits `text` into chunks of at most `cap` code points each,
/// preferring to break after the last newline inside each window.
///
/// Invariants: `chunks.concat() == text`; no chunk exceeds `cap` code
/// points; an empty `text` produces a single empty chunk.
pub fn chunk_text(text: &str, cap: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= cap {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let remaining = chars.len() - start;
        if remaining <= cap {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let window_end = start + cap;
        let window = &chars[start..window_end];
        match window.iter().rposition(|&c| c == '\n') {
            Some(pos) if pos > 0 => {
                chunks.push(chars[start..=start + pos].iter().collect());
                start += pos + 1;
            }
            _ => {
                chunks.push(window.iter().collect());
                start = window_end;
            }
        }
    }
    chunks
}
