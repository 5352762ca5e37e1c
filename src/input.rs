/*!
Text abstractions used by the matching engine.

The VM never sees how text is stored. It asks a [`SourceView`] for the
codepoint at a byte offset, and the view answers with the decoded character
and its encoded length, with `None` at the end of the text, or with an error
if the bytes there are not valid UTF-8.
*/

use crate::error::ExecError;

/// Random access to a sequence of UTF-8 encoded codepoints.
pub trait SourceView {
    /// Returns the length of the text in bytes.
    fn len(&self) -> usize;

    /// Returns the byte at `at`, or `None` past the end of the text.
    fn byte_at(&self, at: usize) -> Option<u8>;

    /// Returns true if the text is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes the codepoint starting at byte offset `at`.
    ///
    /// Returns `Ok(None)` at or past the end of the text, and the character
    /// together with its length in bytes otherwise.
    fn codepoint_at(&self, at: usize) -> Result<Option<(char, usize)>, ExecError> {
        let mut buf = [0u8; 4];
        let mut n = 0;
        while n < buf.len() {
            match at.checked_add(n).and_then(|i| self.byte_at(i)) {
                Some(b) => buf[n] = b,
                None => break,
            }
            n += 1;
        }
        decode(&buf[..n], at)
    }
}

#[cfg_attr(feature = "perf-inline", inline(always))]
fn decode(bytes: &[u8], at: usize) -> Result<Option<(char, usize)>, ExecError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    match bstr::decode_utf8(bytes) {
        (Some(c), len) => Ok(Some((c, len))),
        (None, _) => Err(ExecError::InvalidUtf8 { offset: at }),
    }
}

/// A view over flat, contiguous text.
#[derive(Clone, Copy, Debug)]
pub struct StrView<'t> {
    text: &'t [u8],
}

impl<'t> StrView<'t> {
    pub fn new(text: &'t [u8]) -> Self {
        StrView { text }
    }
}

impl<'t> From<&'t str> for StrView<'t> {
    fn from(text: &'t str) -> Self {
        StrView::new(text.as_bytes())
    }
}

impl<'t> From<&'t [u8]> for StrView<'t> {
    fn from(text: &'t [u8]) -> Self {
        StrView::new(text)
    }
}

impl SourceView for StrView<'_> {
    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn len(&self) -> usize {
        self.text.len()
    }

    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn byte_at(&self, at: usize) -> Option<u8> {
        self.text.get(at).copied()
    }

    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn codepoint_at(&self, at: usize) -> Result<Option<(char, usize)>, ExecError> {
        match self.text.get(at..) {
            Some(rest) => decode(&rest[..rest.len().min(4)], at),
            None => Ok(None),
        }
    }
}

/// A view over the two halves of a gap buffer.
///
/// Offsets are logical: offset `head.len()` is the first byte of `tail`,
/// and the gap between them is invisible. A codepoint may straddle the gap.
#[derive(Clone, Copy, Debug)]
pub struct SplitView<'t> {
    head: &'t [u8],
    tail: &'t [u8],
}

impl<'t> SplitView<'t> {
    pub fn new(head: &'t [u8], tail: &'t [u8]) -> Self {
        SplitView { head, tail }
    }
}

impl SourceView for SplitView<'_> {
    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn byte_at(&self, at: usize) -> Option<u8> {
        match at.checked_sub(self.head.len()) {
            None => Some(self.head[at]),
            Some(i) => self.tail.get(i).copied(),
        }
    }

    fn codepoint_at(&self, at: usize) -> Result<Option<(char, usize)>, ExecError> {
        // Fast path when the whole sequence sits on one side of the gap.
        if self.head.len().checked_sub(4).is_some_and(|last| at <= last) {
            return decode(&self.head[at..at + 4], at);
        }
        if at >= self.head.len() {
            let rest = match self.tail.get(at - self.head.len()..) {
                Some(rest) => rest,
                None => return Ok(None),
            };
            return decode(&rest[..rest.len().min(4)], at);
        }
        let mut buf = [0u8; 4];
        let mut n = 0;
        while n < buf.len() {
            match at.checked_add(n).and_then(|i| self.byte_at(i)) {
                Some(b) => buf[n] = b,
                None => break,
            }
            n += 1;
        }
        decode(&buf[..n], at)
    }
}

#[cfg(test)]
mod tests {
    use super::{SourceView, SplitView, StrView};
    use crate::error::ExecError;

    #[test]
    fn flat_view_decodes_codepoints() {
        let view = StrView::from("aé€");
        assert_eq!(view.len(), 6);
        assert_eq!(view.codepoint_at(0), Ok(Some(('a', 1))));
        assert_eq!(view.codepoint_at(1), Ok(Some(('é', 2))));
        assert_eq!(view.codepoint_at(3), Ok(Some(('€', 3))));
        assert_eq!(view.codepoint_at(6), Ok(None));
        assert_eq!(view.codepoint_at(60), Ok(None));
    }

    #[test]
    fn flat_view_reports_malformed_text() {
        let view = StrView::new(b"a\xffb");
        assert_eq!(view.codepoint_at(1), Err(ExecError::InvalidUtf8 { offset: 1 }));
        let truncated = StrView::new(b"\xe2\x82");
        assert_eq!(
            truncated.codepoint_at(0),
            Err(ExecError::InvalidUtf8 { offset: 0 })
        );
    }

    #[test]
    fn split_view_hides_the_gap() {
        let text = "x€y".as_bytes();
        // Split in the middle of the euro sign.
        let view = SplitView::new(&text[..2], &text[2..]);
        assert_eq!(view.len(), 5);
        assert_eq!(view.byte_at(0), Some(b'x'));
        assert_eq!(view.byte_at(4), Some(b'y'));
        assert_eq!(view.byte_at(5), None);
        assert_eq!(view.codepoint_at(1), Ok(Some(('€', 3))));
        assert_eq!(view.codepoint_at(4), Ok(Some(('y', 1))));
        assert_eq!(view.codepoint_at(5), Ok(None));
    }

    #[test]
    fn offsets_near_the_end_of_the_address_space() {
        let text = "aé".as_bytes();
        let flat = StrView::new(text);
        let split = SplitView::new(&text[..2], &text[2..]);
        for at in [usize::MAX, usize::MAX - 3, usize::MAX - 4] {
            assert_eq!(flat.codepoint_at(at), Ok(None));
            assert_eq!(split.codepoint_at(at), Ok(None));
            assert_eq!(split.byte_at(at), None);
        }
    }

    #[test]
    fn split_view_agrees_with_flat_view() {
        let text = "héllo wörld".as_bytes();
        let flat = StrView::new(text);
        for gap in 0..=text.len() {
            let split = SplitView::new(&text[..gap], &text[gap..]);
            for at in 0..=text.len() {
                assert_eq!(split.codepoint_at(at), flat.codepoint_at(at));
            }
        }
    }
}
