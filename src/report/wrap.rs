/// Greedily packs whitespace separated words into lines of at most `width`
/// characters. Words are never split; a word longer than `width` gets a
/// line of its own.
pub fn wrap_line(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len > 0 && line_len + 1 + word_len > width {
            out.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.push_str(word);
        line_len += word_len;
    }

    if line_len > 0 {
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::wrap_line;

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_line("breed: beagle", 90), vec!["breed: beagle"]);
    }

    #[test]
    fn long_text_wraps_without_breaking_words() {
        let text = "summary: The photo is well lit and sharp, the coat looks glossy and \
                    the eyes are clear which suggests good overall condition for this dog today";
        let lines = wrap_line(text, 40);

        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 40));
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(lines.join(" "), original.join(" "));
    }

    #[test]
    fn overlong_word_stands_alone() {
        let lines = wrap_line("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap_line("   ", 90).is_empty());
    }
}
