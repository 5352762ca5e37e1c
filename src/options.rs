use core::str::FromStr;

use crate::error::FlagsError;

/// Flags a pattern is compiled with.
///
/// The configuration loader spells these as a short code string next to the
/// pattern, e.g. `"m"`. Use [`Flags::parse`] or `str::parse` to decode it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Flags {
    /// Set the value for the multi-line matching (`m`) flag.
    ///
    /// When disabled, `.` and character classes never match `\n`, and `$`
    /// only matches at the end of the text. When enabled, `.` and classes
    /// may consume `\n`, and `$` also matches right before a `\n`.
    pub multi_line: bool,
}

impl Flags {
    /// Decodes a flag code string. Every letter must be a known flag.
    pub fn parse(code: &str) -> Result<Flags, FlagsError> {
        let mut flags = Flags::default();
        for (offset, flag) in code.char_indices() {
            match flag {
                'm' => flags.multi_line = true,
                _ => return Err(FlagsError::ExpectedRegexFlag { flag, offset }),
            }
        }
        Ok(flags)
    }
}

impl FromStr for Flags {
    type Err = FlagsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flags::parse(s)
    }
}

/// The span of one capture group. Both offsets are byte offsets into the
/// text; `start == end` for a group that matched the empty string.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MatchGroup {
    pub start: usize,
    pub end: usize,
}

impl MatchGroup {
    /// The value of a group that did not take part in the match.
    pub const UNMATCHED: MatchGroup = MatchGroup { start: usize::MAX, end: usize::MAX };

    /// Returns true if the group took part in the match.
    pub fn is_matched(&self) -> bool {
        *self != MatchGroup::UNMATCHED
    }
}

/// Options for a single match attempt.
#[derive(Debug, Default)]
pub struct MatchOptions<'g> {
    /// The byte offset the attempt starts at.
    pub match_from: usize,
    /// The byte offset `^` is anchored to. The highlighter sets this to the
    /// start of the current line so that `^` works inside a larger buffer.
    pub anchor_start_offset: usize,
    /// Receives one span per capture group. Its length must equal the
    /// pattern's group count. Every slot is overwritten: groups outside the
    /// matching path, and all groups of a failed attempt, come back as
    /// [`MatchGroup::UNMATCHED`].
    pub group_out: Option<&'g mut [MatchGroup]>,
}

impl<'g> MatchOptions<'g> {
    /// An attempt starting at `at`, with `^` anchored to the same offset.
    pub fn at(at: usize) -> Self {
        MatchOptions { match_from: at, anchor_start_offset: at, group_out: None }
    }

    /// Sets the offset `^` is anchored to.
    pub fn anchored_to(mut self, offset: usize) -> Self {
        self.anchor_start_offset = offset;
        self
    }

    /// Sets the capture output slice.
    pub fn groups(mut self, groups: &'g mut [MatchGroup]) -> Self {
        self.group_out = Some(groups);
        self
    }
}

/// The outcome of a single match attempt.
///
/// `pos` is meaningful even when the attempt failed: it is the position the
/// last explored thread had reached, which the highlighter uses to find
/// token boundaries.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MatchResult {
    pub pos: usize,
    pub fully_matched: bool,
}

#[cfg(test)]
mod tests {
    use super::Flags;
    use crate::error::FlagsError;

    #[test]
    fn flag_codes() {
        assert_eq!(Flags::parse(""), Ok(Flags { multi_line: false }));
        assert_eq!("m".parse::<Flags>(), Ok(Flags { multi_line: true }));
        assert_eq!(
            Flags::parse("mx"),
            Err(FlagsError::ExpectedRegexFlag { flag: 'x', offset: 1 })
        );
    }
}
