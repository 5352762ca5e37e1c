use log::{debug, trace};

use crate::error::{CompileError, CompileErrorKind};
use crate::literal;
use crate::options::Flags;
use crate::program::{ClassRange, Goto, Index, Inst, Program};

type Result<T> = core::result::Result<T, CompileError>;

/// A compiler translates pattern text to a sequence of instructions.
///
/// Translation is a single left-to-right pass with no intermediate syntax
/// tree. Quantifiers and alternations are applied to instructions that were
/// already emitted, by inserting control instructions in front of them and
/// fixing up jump targets afterwards.
///
/// The pattern syntax is:
///
/// ```text
/// .        any codepoint (not `\n` unless multiline)
/// [a-z]    character class, `[^...]` inverts it, `\-` is a literal dash
/// ^  $     anchors
/// x+       one or more, greedy
/// x*       zero or more, greedy
/// x-       zero or more, lazy
/// x?       zero or one, greedy
/// x|y      alternation
/// (x)      capture group
/// \n \r \t \f \b \\   control codes; any other escaped character is literal
/// ```
#[derive(Clone, Debug)]
pub struct Compiler {
    flags: Flags,
    fuse_prefix: bool,
}

impl Compiler {
    /// Create a new compiler for patterns using the given flags.
    pub fn new(flags: Flags) -> Self {
        Compiler { flags, fuse_prefix: true }
    }

    /// When set (the default), a leading run of literal characters is fused
    /// into one `String` instruction after compilation.
    pub fn fuse_prefix(mut self, yes: bool) -> Self {
        self.fuse_prefix = yes;
        self
    }

    /// Compile pattern text into a program.
    pub fn compile(self, pattern: &[u8]) -> Result<Program> {
        if pattern.is_empty() {
            return Err(CompileError::new(CompileErrorKind::EmptyRegex, 0));
        }
        let mut translator = Translator {
            pattern,
            pos: 0,
            prog: Program::new(self.flags),
            frames: vec![Frame { start: 0, group: None, offset: 0, holes: vec![] }],
            last: None,
        };
        translator.translate()?;
        let mut prog = translator.prog;
        if self.fuse_prefix {
            literal::fuse_prefix(&mut prog);
        }
        debug!(
            "compiled pattern {:?} into {} instructions, {} groups",
            String::from_utf8_lossy(pattern),
            prog.len(),
            prog.group_count
        );
        trace!("program:\n{:?}", prog);
        Ok(prog)
    }
}

/// A group or the root of the pattern, while it is being translated.
#[derive(Debug)]
struct Frame {
    /// Index of the first instruction of the body.
    start: Index,
    /// The capture group id, `None` for the root.
    group: Option<usize>,
    /// Byte offset of the opening `(`.
    offset: usize,
    /// Placeholders ending each alternative, patched to jump to the
    /// group end once `)` is reached.
    holes: Vec<Index>,
}

struct Translator<'p> {
    pattern: &'p [u8],
    pos: usize,
    prog: Program,
    frames: Vec<Frame>,
    /// Start of the most recent expression a quantifier may apply to.
    last: Option<Index>,
}

impl<'p> Translator<'p> {
    fn translate(&mut self) -> Result<()> {
        while let Some((offset, c)) = self.bump()? {
            match c {
                '+' | '*' | '-' | '?' => self.c_repeat(c, offset)?,
                '(' => self.c_group_start(offset)?,
                ')' => self.c_group_end(offset)?,
                '|' => self.c_alternate()?,
                '^' => {
                    self.push(Inst::AnchorStart)?;
                    self.last = None;
                }
                '$' => {
                    self.push(Inst::AnchorEnd)?;
                    self.last = None;
                }
                '.' => self.c_matchable(Inst::Any)?,
                '[' => {
                    let class = self.c_class(offset)?;
                    self.c_matchable(class)?;
                }
                '\\' => {
                    let c = self.c_escape(offset)?;
                    self.c_matchable(Inst::Char(c))?;
                }
                c => self.c_matchable(Inst::Char(c))?,
            }
        }
        if self.frames.len() > 1 {
            let offset = self.frames[self.frames.len() - 1].offset;
            return Err(CompileError::new(
                CompileErrorKind::UnbalancedGroupBrackets,
                offset,
            ));
        }
        self.push(Inst::Matched)
    }

    fn peek(&self) -> Result<Option<char>> {
        if self.pos >= self.pattern.len() {
            return Ok(None);
        }
        match bstr::decode_utf8(&self.pattern[self.pos..]) {
            (Some(c), _) => Ok(Some(c)),
            (None, _) => {
                Err(CompileError::new(CompileErrorKind::InvalidUtf8, self.pos))
            }
        }
    }

    fn bump(&mut self) -> Result<Option<(usize, char)>> {
        let offset = self.pos;
        let c = match self.peek()? {
            Some(c) => c,
            None => return Ok(None),
        };
        self.pos += c.len_utf8();
        Ok(Some((offset, c)))
    }

    fn reserve(&mut self) -> Result<()> {
        self.prog.insts.try_reserve(1).map_err(|_| {
            CompileError::new(CompileErrorKind::OutOfMemory, self.pos)
        })
    }

    fn push(&mut self, inst: Inst) -> Result<()> {
        self.reserve()?;
        self.prog.insts.push(inst);
        Ok(())
    }

    fn c_matchable(&mut self, inst: Inst) -> Result<()> {
        self.last = Some(self.prog.len());
        self.push(inst)
    }

    fn c_repeat(&mut self, op: char, offset: usize) -> Result<()> {
        let l0 = self.last.take().ok_or_else(|| {
            CompileError::new(CompileErrorKind::ExpectedSimpleExpr, offset)
        })?;
        if op != '?' && self.is_nullable(l0, self.prog.len()) {
            self.prog.has_empty_loops = true;
        }
        let len = self.prog.len();
        match op {
            '+' => self.push(Inst::Split { goto1: l0, goto2: len + 1 }),
            '*' | '-' => {
                // The body moves one slot down, the loop jump goes after it.
                let (body, exit) = (l0 + 1, len + 2);
                let split = if op == '*' {
                    Inst::Split { goto1: body, goto2: exit }
                } else {
                    Inst::Split { goto1: exit, goto2: body }
                };
                self.reserve()?;
                self.prog.insert(l0, split);
                self.push(Inst::Jmp(l0))
            }
            _ => {
                self.reserve()?;
                self.prog.insert(l0, Inst::Split { goto1: l0 + 1, goto2: len + 1 });
                Ok(())
            }
        }
    }

    /// Returns true if execution can get from `from` to `to` without
    /// consuming any text.
    fn is_nullable(&self, from: Index, to: Index) -> bool {
        let mut seen = vec![false; to - from];
        let mut stack = vec![from];
        while let Some(pc) = stack.pop() {
            if pc == to {
                return true;
            }
            if pc < from || pc > to || seen[pc - from] {
                continue;
            }
            seen[pc - from] = true;
            match self.prog[pc] {
                Inst::Jmp(goto) => stack.push(goto),
                Inst::Split { goto1, goto2 } => {
                    stack.push(goto1);
                    stack.push(goto2);
                }
                Inst::GroupStart(_)
                | Inst::GroupEnd(_)
                | Inst::AnchorStart
                | Inst::AnchorEnd => stack.push(pc + 1),
                _ => {}
            }
        }
        false
    }

    fn c_group_start(&mut self, offset: usize) -> Result<()> {
        let id = self.prog.group_count;
        self.prog.group_count += 1;
        self.push(Inst::GroupStart(id))?;
        self.frames.push(Frame {
            start: self.prog.len(),
            group: Some(id),
            offset,
            holes: vec![],
        });
        self.last = None;
        Ok(())
    }

    fn c_group_end(&mut self, offset: usize) -> Result<()> {
        let unbalanced = CompileError::new(
            CompileErrorKind::UnbalancedGroupBrackets,
            offset,
        );
        let (frame, id) = match self.frames.pop() {
            Some(frame) => match frame.group {
                Some(id) => (frame, id),
                None => {
                    self.frames.push(frame);
                    return Err(unbalanced);
                }
            },
            None => return Err(unbalanced),
        };
        let end = self.prog.len();
        self.push(Inst::GroupEnd(id))?;
        for hole in frame.holes {
            self.prog.insts[hole] = Inst::Jmp(end);
        }
        self.last = Some(frame.start - 1);
        Ok(())
    }

    /// Moves everything emitted so far in the current group behind a split
    /// whose second branch starts the next alternative.
    fn c_alternate(&mut self) -> Result<()> {
        self.reserve()?;
        let frame = self.frames.len() - 1;
        let start = self.frames[frame].start;
        for inst in self.prog.insts.iter_mut() {
            inst.incr_pc(start);
        }
        for hole in self.frames[frame].holes.iter_mut() {
            *hole += 1;
        }
        self.prog.insts.insert(start, Inst::Split { goto1: start + 1, goto2: 0 });
        let hole = self.prog.len();
        if self.frames[frame].group.is_some() {
            self.push(Inst::Abort)?;
            self.frames[frame].holes.push(hole);
        } else {
            // At the root, finishing any alternative is a match.
            self.push(Inst::Matched)?;
        }
        self.prog.insts[start] =
            Inst::Split { goto1: start + 1, goto2: self.prog.len() };
        self.last = None;
        Ok(())
    }

    fn c_escape(&mut self, backslash: usize) -> Result<char> {
        let (_, c) = self.bump()?.ok_or_else(|| {
            CompileError::new(CompileErrorKind::ExpectedEscapeChar, backslash)
        })?;
        Ok(match c {
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            c => c,
        })
    }

    /// Translates a character class; the opening `[` is already consumed.
    fn c_class(&mut self, open: usize) -> Result<Inst> {
        let unclosed =
            || CompileError::new(CompileErrorKind::UnclosedCharClass, open);
        let dash = |offset| {
            CompileError::new(
                CompileErrorKind::ExpectedEscapeBeforeDashInRange,
                offset,
            )
        };

        let mut inverse = false;
        if self.peek()? == Some('^') {
            self.bump()?;
            inverse = true;
        }
        let mut ranges = vec![];
        loop {
            let (offset, c) = self.bump()?.ok_or_else(unclosed)?;
            let from = match c {
                ']' => break,
                '-' => return Err(dash(offset)),
                '\\' => self.c_escape(offset)?,
                c => c,
            };
            if self.peek()? != Some('-') {
                ranges.push(ClassRange::new(from, from));
                continue;
            }
            let (dash_offset, _) = self.bump()?.ok_or_else(unclosed)?;
            let (offset, c) = self.bump()?.ok_or_else(unclosed)?;
            let to = match c {
                ']' | '-' => return Err(dash(dash_offset)),
                '\\' => self.c_escape(offset)?,
                c => c,
            };
            ranges.push(ClassRange::new(from, to));
        }

        Ok(match ranges.as_slice() {
            [range] if range.from == range.to && inverse => {
                Inst::CharInverse(range.from)
            }
            // A plain `Char` would match `\n` regardless of the flags.
            [range] if range.from == range.to && range.from != '\n' => {
                Inst::Char(range.from)
            }
            [range] => Inst::RangeOpt { range: *range, inverse },
            _ if inverse => Inst::RangeInverse(ranges.into_boxed_slice()),
            _ => Inst::Range(ranges.into_boxed_slice()),
        })
    }
}
