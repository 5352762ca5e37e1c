use hlre::Regex;

fn find(pattern: &str, haystack: &str) -> Option<(usize, usize)> {
    Regex::new(pattern)
        .unwrap()
        .find(haystack)
        .unwrap()
        .map(|m| (m.start(), m.end()))
}

fn find_backwards(pattern: &str, haystack: &str) -> Option<(usize, usize)> {
    Regex::new(pattern)
        .unwrap()
        .find_backwards(haystack)
        .unwrap()
        .map(|m| (m.start(), m.end()))
}

fn find_all(pattern: &str, haystack: &str) -> Vec<(usize, usize)> {
    Regex::new(pattern)
        .unwrap()
        .find_iter(haystack)
        .map(|m| m.map(|m| (m.start(), m.end())))
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn literal_prefix() {
    assert_eq!(find("asdf?b", "000asdfbasdfb"), Some((3, 8)));
    assert_eq!(find_backwards("asdf?b", "000asdfbasdfb"), Some((8, 13)));
    assert_eq!(find("asdf?b", "000asdbasdfb"), Some((3, 7)));
    assert_eq!(find("asdf?b", "000asdasdfx"), None);
    assert_eq!(find_backwards("asdf?b", "000asdasdfx"), None);
}

#[test]
fn overlapping_candidates_are_not_skipped() {
    // The first candidate at 0 fails; the match starts inside it.
    assert_eq!(find("aab+", "aaab"), Some((1, 4)));
    assert_eq!(find("abab", "abababx"), Some((0, 4)));
    assert_eq!(find_backwards("abab", "abababx"), Some((2, 6)));
}

#[test]
fn without_a_prefix() {
    assert_eq!(find("[0-9]+", "ab12cd345"), Some((2, 4)));
    assert_eq!(find("[0-9]+", "abcd"), None);
    // The rightmost start wins, not the longest match.
    assert_eq!(find_backwards("[0-9]+", "ab12cd345"), Some((8, 9)));
    assert_eq!(find("x|^y", "zy"), None);
    assert_eq!(find("x|^y", "yx"), Some((0, 1)));
}

#[test]
fn find_at_and_find_backwards_at() {
    let re = Regex::new("asdf?b").unwrap();
    let text = "000asdfbasdfb";
    assert_eq!(re.find_at(text, 4).unwrap().map(|m| m.range()), Some(8..13));
    assert_eq!(re.find_at(text, 9).unwrap(), None);
    assert_eq!(re.find_at(text, 100).unwrap(), None);
    // The second occurrence does not fit before offset 12.
    assert_eq!(re.find_backwards_at(text, 12).unwrap().map(|m| m.range()), Some(3..8));
    assert_eq!(re.find_backwards_at(text, 7).unwrap(), None);
    assert_eq!(re.find_backwards_at(text, 100).unwrap().map(|m| m.range()), Some(8..13));

    // `^` stays anchored to the start of the haystack.
    let anchored = Regex::new("^a").unwrap();
    assert_eq!(anchored.find_at("aa", 1).unwrap(), None);
}

#[test]
fn non_ascii_haystacks() {
    assert_eq!(find("é+", "aééb"), Some((1, 5)));
    assert_eq!(find(".", "€"), Some((0, 3)));
    assert_eq!(find_backwards(".", "aé"), Some((1, 3)));
    assert_eq!(find("[à-ÿ]", "xyzö"), Some((3, 5)));
    assert_eq!(find("ö$", "wörld ö"), Some((7, 9)));

    let re = Regex::new("é").unwrap();
    // An end inside a codepoint is clamped back to its start.
    assert_eq!(re.find_backwards_at("aé", 2).unwrap(), None);
}

#[test]
fn iterating_matches() {
    assert_eq!(find_all("[0-9]+", "1a22b333"), vec![(0, 1), (2, 4), (5, 8)]);
    assert_eq!(find_all("ab", "abab_ab"), vec![(0, 2), (2, 4), (5, 7)]);
    assert_eq!(find_all("a*", "baaac"), vec![(0, 0), (1, 4), (5, 5)]);
    assert_eq!(find_all("x?", "é"), vec![(0, 0), (2, 2)]);
    assert_eq!(find_all("z", "abc"), vec![]);
}

#[test]
fn iterator_is_fused() {
    let re = Regex::new("(a)").unwrap();
    let mut matches = re.find_iter("a");
    assert!(matches!(matches.next(), Some(Ok(_))));
    assert!(matches.next().is_none());
    assert!(matches.next().is_none());
}

#[test]
fn match_spans() {
    let m = Regex::new("b+").unwrap().find("abbc").unwrap().unwrap();
    assert_eq!(m.range(), 1..3);
    assert!(!m.is_empty());
    assert_eq!(core::ops::Range::from(m), 1..3);
}
