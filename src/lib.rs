/*!
A small backtracking pattern engine for an editor's find, replace and syntax
highlighting.

Patterns use a compact dialect: `.`, classes, `^`, `$`, the quantifiers `+`,
`*`, `?` and the lazy star `-`, alternation and capture groups. A pattern is
compiled once into a [`Program`] of instructions and then executed by a
backtracking VM with an explicit, run-length compressed thread stack.

The highlighter calls [`Regex::check_match_view`] at successive offsets of a
line, with `^` anchored to the start of that line and text supplied through
a [`SourceView`] so it can come straight out of a gap buffer. Find and
replace uses [`Regex::find`], [`Regex::find_backwards`] and
[`Regex::find_iter`].

```rust
use hlre::{MatchOptions, Regex, SplitView};

let re = Regex::new("[a-z]+").unwrap();
let head = b"ab";
let tail = b"c0";
let result = re
    .check_match_view(&SplitView::new(head, tail), MatchOptions::at(0))
    .unwrap();
assert!(result.fully_matched);
assert_eq!(result.pos, 3);
```
*/

#![deny(missing_debug_implementations)]

pub mod backtrack;
pub mod compile;
mod error;
mod input;
pub mod literal;
mod options;
pub mod program;
mod re;

pub use backtrack::Cache;
pub use compile::Compiler;
pub use error::{CompileError, CompileErrorKind, ExecError, FlagsError};
pub use input::{SourceView, SplitView, StrView};
pub use options::{Flags, MatchGroup, MatchOptions, MatchResult};
pub use program::{ClassRange, Inst, Program};
pub use re::{Match, Matches, Regex, RegexBuilder};
