/// `#` counts so that JS private names and preprocessor directives come out
/// whole.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '#'
}

/// The word surrounding a collapsed caret at `offset` (in chars) within
/// `text`.  A caret right after a word still picks that word up, but a caret
/// sitting on punctuation or whitespace does not.
pub fn target_word(text: &str, offset: usize) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return None;
    }
    let offset = offset.min(chars.len());
    if offset < chars.len() && !is_word_char(chars[offset]) {
        return None;
    }

    let mut start = offset;
    let mut end = offset;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }

    if end <= start {
        return None;
    }
    Some(chars[start..end].iter().collect())
}

#[test]
fn test_target_word() {
    let line = "  nsresult rv = mFoo->Bar(#priv);";
    assert_eq!(target_word(line, 4).as_deref(), Some("nsresult"));
    assert_eq!(target_word(line, 2).as_deref(), Some("nsresult"));
    assert_eq!(target_word(line, 17).as_deref(), Some("mFoo"));
    assert_eq!(target_word(line, 27).as_deref(), Some("#priv"));
    // Whitespace and punctuation aren't words.
    assert_eq!(target_word(line, 0), None);
    assert_eq!(target_word(line, 13), None);
    // The end of the text counts as being just after the last word.
    assert_eq!(target_word("foo_bar", 7).as_deref(), Some("foo_bar"));
    assert_eq!(target_word("a;", 2), None);
    assert_eq!(target_word("", 0), None);
}
