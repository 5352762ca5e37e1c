use core::iter::FusedIterator;
use core::ops::Range;

use crate::backtrack::{self, Cache};
use crate::compile::Compiler;
use crate::error::{CompileError, ExecError};
use crate::input::{SourceView, StrView};
use crate::literal::LiteralSearcher;
use crate::options::{Flags, MatchGroup, MatchOptions, MatchResult};
use crate::program::Program;

/// Match represents a single match of a pattern in a haystack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Match {
    start: usize,
    end: usize,
}

impl Match {
    /// Returns the starting byte offset of the match in the haystack.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the ending byte offset of the match in the haystack.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the range over the starting and ending byte offsets of the
    /// match in the haystack.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns true if the match is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    fn new(start: usize, end: usize) -> Match {
        Match { start, end }
    }
}

impl From<Match> for Range<usize> {
    fn from(m: Match) -> Range<usize> {
        m.range()
    }
}

/// A compiled pattern.
///
/// A `Regex` is read only once compiled, so it can be shared freely between
/// threads. Scratch memory for matching lives in a [`Cache`], which every
/// caller owns separately.
///
/// All positions are **byte offsets**. A `find` never reports a match that
/// starts in the middle of a codepoint.
///
/// # Examples
///
/// ```rust
/// use hlre::Regex;
///
/// let re = Regex::new("asdf?b").unwrap();
/// let m = re.find("000asdfbasdfb").unwrap().unwrap();
/// assert_eq!((m.start(), m.end()), (3, 8));
/// let m = re.find_backwards("000asdfbasdfb").unwrap().unwrap();
/// assert_eq!((m.start(), m.end()), (8, 13));
/// ```
#[derive(Clone, Debug)]
pub struct Regex {
    pattern: String,
    prog: Program,
    prefix: Option<LiteralSearcher>,
}

impl Regex {
    /// Compiles a pattern with default flags.
    pub fn new(pattern: &str) -> Result<Regex, CompileError> {
        RegexBuilder::new(pattern).build()
    }

    /// Compiles a pattern with the given flags.
    pub fn with_flags(pattern: &str, flags: Flags) -> Result<Regex, CompileError> {
        RegexBuilder::new(pattern).flags(flags).build()
    }

    /// Returns the pattern text this regex was compiled from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Returns the flags this regex was compiled with.
    pub fn flags(&self) -> Flags {
        self.prog.flags
    }

    /// Returns the number of capture groups.
    pub fn group_count(&self) -> usize {
        self.prog.group_count
    }

    /// Returns the compiled program.
    pub fn program(&self) -> &Program {
        &self.prog
    }

    /// Create a new cache for use with [`Regex::check_match_with`].
    pub fn create_cache(&self) -> Cache {
        Cache::new()
    }

    /// Tries to match once, at `options.match_from` in flat text.
    pub fn check_match(
        &self,
        text: &str,
        options: MatchOptions<'_>,
    ) -> Result<MatchResult, ExecError> {
        self.check_match_view(&StrView::from(text), options)
    }

    /// Tries to match once, at `options.match_from` in any source view.
    ///
    /// This is the entry point for callers that keep text in their own
    /// storage, such as a highlighter walking a gap buffer.
    pub fn check_match_view(
        &self,
        view: &dyn SourceView,
        options: MatchOptions<'_>,
    ) -> Result<MatchResult, ExecError> {
        self.check_match_with(&mut Cache::new(), view, options)
    }

    /// Like [`Regex::check_match_view`], reusing the given cache.
    pub fn check_match_with(
        &self,
        cache: &mut Cache,
        view: &dyn SourceView,
        options: MatchOptions<'_>,
    ) -> Result<MatchResult, ExecError> {
        backtrack::exec(&self.prog, cache, view, options)
    }

    /// Returns true if the pattern fully matches starting at `at`, with `^`
    /// anchored to `at`.
    pub fn is_match_at(&self, text: &str, at: usize) -> Result<bool, ExecError> {
        Ok(self.check_match(text, MatchOptions::at(at))?.fully_matched)
    }

    /// Matches once at `at` and returns every capture group's span, with
    /// `None` for groups the matching path did not go through.
    pub fn captures_at(
        &self,
        text: &str,
        at: usize,
    ) -> Result<Option<Vec<Option<MatchGroup>>>, ExecError> {
        let mut groups = vec![MatchGroup::UNMATCHED; self.group_count()];
        let options = MatchOptions::at(at).anchored_to(0).groups(&mut groups);
        if !self.check_match(text, options)?.fully_matched {
            return Ok(None);
        }
        Ok(Some(
            groups.into_iter().map(|g| g.is_matched().then_some(g)).collect(),
        ))
    }

    /// Returns the first match in `haystack`.
    pub fn find(&self, haystack: &str) -> Result<Option<Match>, ExecError> {
        self.find_at(haystack, 0)
    }

    /// Returns the first match in `haystack` that starts at or after
    /// `start`. `^` stays anchored to the start of `haystack`.
    pub fn find_at(
        &self,
        haystack: &str,
        start: usize,
    ) -> Result<Option<Match>, ExecError> {
        self.find_at_with(&mut Cache::new(), haystack, start)
    }

    fn find_at_with(
        &self,
        cache: &mut Cache,
        haystack: &str,
        start: usize,
    ) -> Result<Option<Match>, ExecError> {
        let text = haystack.as_bytes();
        let view = StrView::new(text);
        let mut at = start;
        while at <= text.len() {
            if let Some(ref prefix) = self.prefix {
                at = match prefix.find(text, at) {
                    Some(at) => at,
                    None => return Ok(None),
                };
            } else if !haystack.is_char_boundary(at) {
                at += 1;
                continue;
            }
            let result = backtrack::exec(&self.prog, cache, &view, MatchOptions {
                match_from: at,
                anchor_start_offset: 0,
                group_out: None,
            })?;
            if result.fully_matched {
                return Ok(Some(Match::new(at, result.pos)));
            }
            at += 1;
        }
        Ok(None)
    }

    /// Returns the last match in `haystack`, i.e. the one that starts
    /// furthest to the right.
    pub fn find_backwards(
        &self,
        haystack: &str,
    ) -> Result<Option<Match>, ExecError> {
        self.find_backwards_at(haystack, haystack.len())
    }

    /// Returns the match starting furthest to the right among the matches
    /// that lie entirely inside `haystack[..end]`.
    pub fn find_backwards_at(
        &self,
        haystack: &str,
        end: usize,
    ) -> Result<Option<Match>, ExecError> {
        let mut end = end.min(haystack.len());
        while !haystack.is_char_boundary(end) {
            end -= 1;
        }
        let text = &haystack.as_bytes()[..end];
        let view = StrView::new(text);
        let mut cache = Cache::new();

        let mut next = Some(end);
        while let Some(mut at) = next {
            if let Some(ref prefix) = self.prefix {
                let window = (at + prefix.needle().len()).min(end);
                at = match prefix.rfind(&text[..window]) {
                    Some(at) => at,
                    None => return Ok(None),
                };
            }
            if haystack.is_char_boundary(at) {
                let result = backtrack::exec(&self.prog, &mut cache, &view, MatchOptions {
                    match_from: at,
                    anchor_start_offset: 0,
                    group_out: None,
                })?;
                if result.fully_matched {
                    return Ok(Some(Match::new(at, result.pos)));
                }
            }
            next = at.checked_sub(1);
        }
        Ok(None)
    }

    /// Returns an iterator over successive non-overlapping matches.
    pub fn find_iter<'r, 't>(&'r self, haystack: &'t str) -> Matches<'r, 't> {
        Matches {
            re: self,
            text: haystack,
            cache: Cache::new(),
            last_end: 0,
            last_match: None,
        }
    }
}

/// An iterator over all non-overlapping successive matches.
///
/// An error ends the iteration after it is yielded.
#[derive(Debug)]
pub struct Matches<'r, 't> {
    re: &'r Regex,
    text: &'t str,
    cache: Cache,
    last_end: usize,
    last_match: Option<usize>,
}

impl<'r, 't> Iterator for Matches<'r, 't> {
    type Item = Result<Match, ExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.last_end > self.text.len() {
                return None;
            }
            let m = match self.re.find_at_with(&mut self.cache, self.text, self.last_end) {
                Ok(Some(m)) => m,
                Ok(None) => {
                    self.last_end = self.text.len() + 1;
                    return None;
                }
                Err(err) => {
                    self.last_end = self.text.len() + 1;
                    return Some(Err(err));
                }
            };
            if m.is_empty() {
                // Step over one codepoint so the search makes progress.
                self.last_end = self.text[m.end()..]
                    .chars()
                    .next()
                    .map_or(m.end() + 1, |c| m.end() + c.len_utf8());
                // Don't accept empty matches immediately following a match.
                if Some(m.end()) == self.last_match {
                    continue;
                }
            } else {
                self.last_end = m.end();
            }
            self.last_match = Some(m.end());
            return Some(Ok(m));
        }
    }
}

impl<'r, 't> FusedIterator for Matches<'r, 't> {}

/// A configurable builder for a compiled pattern.
///
/// ```rust
/// use hlre::{MatchOptions, RegexBuilder};
///
/// let re = RegexBuilder::new("b$").multi_line(true).build().unwrap();
/// let result = re.check_match("ab\ncd", MatchOptions::at(1)).unwrap();
/// assert!(result.fully_matched);
/// ```
#[derive(Clone, Debug)]
pub struct RegexBuilder {
    pattern: Vec<u8>,
    flags: Flags,
    fuse_prefix: bool,
}

impl RegexBuilder {
    /// Create a new builder for the given pattern text.
    ///
    /// The text may come straight from a configuration file; if it is not
    /// valid UTF-8, `build` reports where.
    pub fn new<P: AsRef<[u8]>>(pattern: P) -> RegexBuilder {
        RegexBuilder {
            pattern: pattern.as_ref().to_vec(),
            flags: Flags::default(),
            fuse_prefix: true,
        }
    }

    /// Consume the builder and compile the pattern.
    pub fn build(&self) -> Result<Regex, CompileError> {
        let prog = Compiler::new(self.flags)
            .fuse_prefix(self.fuse_prefix)
            .compile(&self.pattern)?;
        let prefix = LiteralSearcher::prefix(&prog);
        Ok(Regex {
            pattern: String::from_utf8_lossy(&self.pattern).into_owned(),
            prog,
            prefix,
        })
    }

    /// Replace all flags at once, e.g. with flags parsed from a flag code.
    pub fn flags(&mut self, flags: Flags) -> &mut RegexBuilder {
        self.flags = flags;
        self
    }

    /// Set the value for the multi-line matching (`m`) flag.
    pub fn multi_line(&mut self, yes: bool) -> &mut RegexBuilder {
        self.flags.multi_line = yes;
        self
    }

    /// Whether to fuse a leading run of literal characters into a single
    /// instruction. Enabled by default; turning it off never changes what
    /// matches, only how fast.
    pub fn fuse_prefix(&mut self, yes: bool) -> &mut RegexBuilder {
        self.fuse_prefix = yes;
        self
    }
}
