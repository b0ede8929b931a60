//! Inverted abstract index decoding

use std::collections::HashMap;

/// Rebuild abstract prose from a word -> positions index.
///
/// Words are ordered by position and joined with single spaces. Two words
/// claiming the same position are both kept, ordered alphabetically.
/// Returns `None` for an empty index.
pub fn reconstruct_abstract(index: &HashMap<String, Vec<usize>>) -> Option<String> {
    let mut words: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&pos| (pos, word.as_str())))
        .collect();

    if words.is_empty() {
        return None;
    }

    words.sort_unstable();

    let text = words
        .into_iter()
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ");

    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(&str, &[usize])]) -> HashMap<String, Vec<usize>> {
        entries
            .iter()
            .map(|(word, positions)| (word.to_string(), positions.to_vec()))
            .collect()
    }

    #[test]
    fn test_reconstructs_repeated_words() {
        let idx = index(&[("the", &[0, 2]), ("fox", &[1])]);
        assert_eq!(reconstruct_abstract(&idx).as_deref(), Some("the fox the"));
    }

    #[test]
    fn test_empty_index() {
        assert_eq!(reconstruct_abstract(&HashMap::new()), None);
        assert_eq!(reconstruct_abstract(&index(&[("orphan", &[])])), None);
    }

    #[test]
    fn test_gaps_in_positions_are_closed() {
        let idx = index(&[("end", &[10]), ("start", &[0])]);
        assert_eq!(reconstruct_abstract(&idx).as_deref(), Some("start end"));
    }

    #[test]
    fn test_tied_positions_are_deterministic() {
        let idx = index(&[("beta", &[0]), ("alpha", &[0])]);
        assert_eq!(reconstruct_abstract(&idx).as_deref(), Some("alpha beta"));
    }
}
