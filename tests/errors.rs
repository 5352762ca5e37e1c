use hlre::{
    CompileError, CompileErrorKind, ExecError, Flags, FlagsError, MatchGroup, MatchOptions,
    Regex, RegexBuilder, SplitView, StrView,
};

macro_rules! assert_compile_error {
    ($pattern:expr, $kind:ident, $offset:expr) => {
        assert_eq!(
            RegexBuilder::new($pattern).build().unwrap_err(),
            CompileError { kind: CompileErrorKind::$kind, offset: $offset },
            "{:?}",
            $pattern,
        )
    };
}

#[test]
fn compile_errors() {
    assert_compile_error!("", EmptyRegex, 0);
    assert_compile_error!(b"abc\xc3", InvalidUtf8, 3);
    assert_compile_error!("+", ExpectedSimpleExpr, 0);
    assert_compile_error!("ab|*", ExpectedSimpleExpr, 3);
    assert_compile_error!("(-)", ExpectedSimpleExpr, 1);
    assert_compile_error!("$?", ExpectedSimpleExpr, 1);
    assert_compile_error!("[-]", ExpectedEscapeBeforeDashInRange, 1);
    assert_compile_error!("[0-9-]", ExpectedEscapeBeforeDashInRange, 4);
    assert_compile_error!("(ab", UnbalancedGroupBrackets, 0);
    assert_compile_error!("ab)c", UnbalancedGroupBrackets, 2);
    assert_compile_error!("a\\", ExpectedEscapeChar, 1);
    assert_compile_error!("[abc", UnclosedCharClass, 0);
}

#[test]
fn escaped_dashes_are_fine() {
    let re = Regex::new("[a\\-z]+").unwrap();
    assert_eq!(re.find("xx-az").unwrap().map(|m| m.range()), Some(2..5));
    // So is an escaped dash outside a class.
    assert!(Regex::new("a\\-b").unwrap().is_match_at("a-b", 0).unwrap());
}

#[test]
fn error_messages() {
    let err = Regex::new("ab)").unwrap_err();
    assert_eq!(err.to_string(), "unbalanced group brackets at offset 2");
    let err = "mq".parse::<Flags>().unwrap_err();
    assert_eq!(err.to_string(), "unknown pattern flag `q` at offset 1");
    let err = ExecError::InvalidGroupSize { expected: 2, actual: 0 };
    assert_eq!(err.to_string(), "expected 2 capture groups, got 0");
}

#[test]
fn flag_codes() {
    assert_eq!(Flags::parse("m"), Ok(Flags { multi_line: true }));
    assert_eq!(Flags::parse(""), Ok(Flags::default()));
    assert_eq!(
        Flags::parse("i"),
        Err(FlagsError::ExpectedRegexFlag { flag: 'i', offset: 0 })
    );
    assert_eq!(
        Flags::parse("mé"),
        Err(FlagsError::ExpectedRegexFlag { flag: 'é', offset: 1 })
    );
}

#[test]
fn group_output_must_fit() {
    let re = Regex::new("(a)(b)(c)").unwrap();
    assert_eq!(re.group_count(), 3);
    let mut groups = [MatchGroup::default(); 2];
    assert_eq!(
        re.check_match("abc", MatchOptions::default().groups(&mut groups)),
        Err(ExecError::InvalidGroupSize { expected: 3, actual: 2 })
    );
    let mut none: [MatchGroup; 0] = [];
    assert_eq!(
        Regex::new("a")
            .unwrap()
            .check_match("a", MatchOptions::default().groups(&mut none)),
        Ok(hlre::MatchResult { pos: 1, fully_matched: true })
    );
}

#[test]
fn malformed_text() {
    let re = Regex::new("a[^x]*").unwrap();
    let view = StrView::new(b"ab\xffc");
    assert_eq!(
        re.check_match_view(&view, MatchOptions::default()),
        Err(ExecError::InvalidUtf8 { offset: 2 })
    );
    // A truncated sequence on the far side of a gap.
    let view = SplitView::new(b"ab", b"\xe2\x82");
    assert_eq!(
        re.check_match_view(&view, MatchOptions::default()),
        Err(ExecError::InvalidUtf8 { offset: 2 })
    );
    // Text the pattern never looks at is not decoded.
    let view = StrView::new(b"xb\xff");
    assert_eq!(
        re.check_match_view(&view, MatchOptions::default()),
        Ok(hlre::MatchResult { pos: 0, fully_matched: false })
    );
}
