/// English plural of a lowercase resource name.
///
/// `y` after a consonant becomes `ies`; `s`, `x`, `z`, `ch` and `sh` take
/// `es`; everything else takes `s`.
#[must_use]
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y')
        && stem.chars().last().is_some_and(|c| !is_vowel(c))
    {
        return format!("{stem}ies");
    }

    if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }

    format!("{word}s")
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}
