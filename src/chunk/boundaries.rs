//! Split point detection for chunking
//!
//! All positions are char indices into a `&[char]` view of the document.

/// One entry of the separator priority list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// Split just after this character sequence
    Separator(Vec<char>),
    /// Split anywhere (last resort)
    Character,
}

impl Boundary {
    /// Build the priority list from configured separators; "" means [`Boundary::Character`]
    pub fn parse_all(separators: &[String]) -> Vec<Boundary> {
        separators
            .iter()
            .map(|s| {
                if s.is_empty() {
                    Boundary::Character
                } else {
                    Boundary::Separator(s.chars().collect())
                }
            })
            .collect()
    }
}

/// Position just past the last occurrence of `needle` inside `chars[from..to]`,
/// provided that position is at least `min_end`
pub fn last_split(
    chars: &[char],
    needle: &[char],
    from: usize,
    to: usize,
    min_end: usize,
) -> Option<usize> {
    if needle.is_empty() || to <= from || to - from < needle.len() {
        return None;
    }

    chars[from..to]
        .windows(needle.len())
        .rposition(|w| w == needle)
        .map(|i| from + i + needle.len())
        .filter(|&end| end >= min_end)
}

/// Position just past the earliest separator occurrence starting at or after `from`
pub fn next_split(chars: &[char], boundaries: &[Boundary], from: usize) -> Option<usize> {
    boundaries
        .iter()
        .filter_map(|b| match b {
            Boundary::Separator(needle) if chars.len() >= from + needle.len() => chars[from..]
                .windows(needle.len())
                .position(|w| w == needle.as_slice())
                .map(|i| from + i + needle.len()),
            _ => None,
        })
        .min()
}

/// Move `pos` back to the start of the word it falls in, looking at most
/// `lookback` chars behind and never at or before `floor`
pub fn word_start_before(chars: &[char], pos: usize, floor: usize, lookback: usize) -> usize {
    if pos == 0 || pos >= chars.len() || chars[pos - 1].is_whitespace() {
        return pos;
    }

    let lowest = pos.saturating_sub(lookback).max(floor + 1);
    (lowest..pos)
        .rev()
        .find(|&p| chars[p - 1].is_whitespace())
        .unwrap_or(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_parse_all_maps_empty_to_character() {
        let list = vec!["\n\n".to_string(), " ".to_string(), String::new()];
        let parsed = Boundary::parse_all(&list);
        assert_eq!(parsed[0], Boundary::Separator(vec!['\n', '\n']));
        assert_eq!(parsed[2], Boundary::Character);
    }

    #[test]
    fn test_last_split_prefers_latest_occurrence() {
        let text = chars("one. two. three");
        let needle = chars(". ");
        assert_eq!(last_split(&text, &needle, 0, text.len(), 0), Some(10));
        // the latest occurrence is before min_end, so nothing qualifies
        assert_eq!(last_split(&text, &needle, 0, text.len(), 11), None);
        // window that stops before the second sentence end
        assert_eq!(last_split(&text, &needle, 0, 8, 0), Some(5));
    }

    #[test]
    fn test_last_split_multibyte() {
        let text = chars("café. naïve");
        assert_eq!(last_split(&text, &chars(". "), 0, text.len(), 0), Some(6));
    }

    #[test]
    fn test_next_split_picks_earliest_of_any() {
        let text = chars("https://example.com/a_very_long_path and more");
        let boundaries = Boundary::parse_all(&["\n".to_string(), " ".to_string()]);
        assert_eq!(next_split(&text, &boundaries, 10), Some(37));
        assert_eq!(next_split(&text, &boundaries, 42), None);
    }

    #[test]
    fn test_word_start_before() {
        let text = chars("alpha bravo charlie");
        // inside "charlie" -> start of "charlie"
        assert_eq!(word_start_before(&text, 14, 0, 32), 12);
        // already at a word start
        assert_eq!(word_start_before(&text, 6, 0, 32), 6);
        // lookback too short to reach the space
        assert_eq!(word_start_before(&text, 16, 0, 2), 16);
        // floor blocks the move
        assert_eq!(word_start_before(&text, 14, 12, 32), 14);
    }
}
