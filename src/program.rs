use core::fmt::{self, Debug};
use core::ops::Deref;
use core::slice;

use crate::options::Flags;

/// `Index` represents the index of an instruction in a program.
pub type Index = usize;

/// Program is a sequence of instructions and the facts needed to run them.
///
/// A program is immutable once the compiler hands it out. It owns every
/// instruction payload (class ranges, fused literals), so dropping the
/// program releases all of them.
#[derive(Clone)]
pub struct Program {
    /// The instructions, executed starting at index 0.
    pub insts: Vec<Inst>,
    /// Flags the pattern was compiled with.
    pub flags: Flags,
    /// The number of capture groups, i.e. the number of `(` in the pattern.
    pub group_count: usize,
    /// Whether some loop body can match the empty string, e.g. `(a*)*`.
    ///
    /// Such loops can come back to the same instruction at the same offset
    /// forever, so the VM remembers the loop entries it has taken.
    pub has_empty_loops: bool,
}

impl Program {
    /// Creates an empty instruction sequence.
    pub fn new(flags: Flags) -> Self {
        Program { insts: vec![], flags, group_count: 0, has_empty_loops: false }
    }

    /// Returns the fused literal prefix, if the program starts with one.
    pub fn literal_prefix(&self) -> Option<&[u8]> {
        match self.insts.first() {
            Some(Inst::String(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Inserts `inst` at `at`, shifting every jump target strictly greater
    /// than `at` by one. Targets equal to `at` now land on `inst`.
    pub(crate) fn insert(&mut self, at: Index, inst: Inst) {
        for existing in self.insts.iter_mut() {
            existing.incr_pc(at + 1);
        }
        self.insts.insert(at, inst);
    }
}

impl Deref for Program {
    type Target = [Inst];

    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn deref(&self) -> &Self::Target {
        &self.insts
    }
}

impl Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, inst) in self.iter().enumerate() {
            match inst {
                Inst::Abort => write!(f, "{:04} Abort", pc)?,
                Inst::Matched => write!(f, "{:04} Matched", pc)?,
                Inst::Any => write!(f, "{:04} Any", pc)?,
                Inst::Char(c) => write!(f, "{:04} Char({:?})", pc, c)?,
                Inst::CharInverse(c) => {
                    write!(f, "{:04} CharInverse({:?})", pc, c)?
                }
                Inst::RangeOpt { range, inverse } => {
                    let name = if *inverse { "RangeOptInverse" } else { "RangeOpt" };
                    write!(f, "{:04} {}({:?})", pc, name, range)?
                }
                Inst::Range(ranges) => {
                    write!(f, "{:04} Range({:?})", pc, ranges)?
                }
                Inst::RangeInverse(ranges) => {
                    write!(f, "{:04} RangeInverse({:?})", pc, ranges)?
                }
                Inst::String(bytes) => write!(
                    f,
                    "{:04} String({:?})",
                    pc,
                    String::from_utf8_lossy(bytes)
                )?,
                Inst::Jmp(goto) => write!(f, "{:04} Jmp({})", pc, goto)?,
                Inst::Split { goto1, goto2 } => {
                    write!(f, "{:04} Split({}, {})", pc, goto1, goto2)?
                }
                Inst::GroupStart(id) => {
                    write!(f, "{:04} GroupStart({})", pc, id)?
                }
                Inst::GroupEnd(id) => write!(f, "{:04} GroupEnd({})", pc, id)?,
                Inst::AnchorStart => write!(f, "{:04} AnchorStart", pc)?,
                Inst::AnchorEnd => write!(f, "{:04} AnchorEnd", pc)?,
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Inst;
    type IntoIter = slice::Iter<'a, Inst>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An inclusive range of codepoints inside a character class.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct ClassRange {
    pub from: char,
    pub to: char,
}

impl ClassRange {
    /// Creates a range, swapping the endpoints if they are reversed.
    pub fn new(from: char, to: char) -> Self {
        if from <= to {
            ClassRange { from, to }
        } else {
            ClassRange { from: to, to: from }
        }
    }

    #[cfg_attr(feature = "perf-inline", inline(always))]
    pub fn contains(&self, c: char) -> bool {
        self.from <= c && c <= self.to
    }
}

impl Debug for ClassRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{:?}", self.from)
        } else {
            write!(f, "{:?}-{:?}", self.from, self.to)
        }
    }
}

/// Inst is an instruction code in a program.
///
/// Instructions that consume text decode exactly one codepoint, except for
/// `String`, which compares a run of bytes produced by fusing leading
/// `Char` instructions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Inst {
    /// A placeholder for a jump whose target is not known yet. The compiler
    /// patches every `Abort` before handing out a program.
    Abort,
    /// The program has reached a match state.
    Matched,
    /// Matches any codepoint.
    Any,
    /// Matches exactly this codepoint.
    Char(char),
    /// Matches any codepoint but this one.
    CharInverse(char),
    /// A character class made of exactly one range.
    RangeOpt {
        range: ClassRange,
        /// Matches codepoints outside `range` when set.
        inverse: bool,
    },
    /// Matches a codepoint inside any of the ranges.
    Range(Box<[ClassRange]>),
    /// Matches a codepoint outside all of the ranges.
    RangeInverse(Box<[ClassRange]>),
    /// A literal byte sequence; always valid UTF-8.
    String(Box<[u8]>),
    /// Continues execution at the given instruction.
    Jmp(Index),
    /// Forks execution, preferring `goto1` over `goto2`.
    Split {
        /// The first instruction to try. A match resulting from following
        /// goto1 has precedence over a match resulting from following goto2.
        goto1: Index,
        /// The instruction to try once everything reachable from goto1 has
        /// failed.
        goto2: Index,
    },
    /// Records the current position as the start of a capture group.
    GroupStart(usize),
    /// Records the current position as the end of a capture group.
    GroupEnd(usize),
    /// Matches at the anchor offset supplied with each match attempt.
    AnchorStart,
    /// Matches at the end of the text, or before `\n` in multiline mode.
    AnchorEnd,
}

impl Inst {
    /// Tests a single decoded codepoint against a character matcher.
    ///
    /// Returns false for instructions that do not consume a codepoint.
    #[cfg_attr(feature = "perf-inline", inline(always))]
    pub fn matches_char(&self, c: char) -> bool {
        match self {
            Inst::Any => true,
            Inst::Char(expected) => c == *expected,
            Inst::CharInverse(rejected) => c != *rejected,
            Inst::RangeOpt { range, inverse } => range.contains(c) != *inverse,
            Inst::Range(ranges) => ranges.iter().any(|r| r.contains(c)),
            Inst::RangeInverse(ranges) => !ranges.iter().any(|r| r.contains(c)),
            _ => false,
        }
    }
}

/// Uniform access to the jump targets carried by an instruction.
///
/// The compiler emits control flow before it knows where things end up, and
/// the optimizer removes instructions after the fact; both fix up targets
/// through this trait without caring which kind of instruction holds them.
pub trait Goto {
    /// Returns the jump targets of this instruction.
    fn gotos(&self) -> impl Iterator<Item = Index>;

    /// Returns mutable references to the jump targets of this instruction.
    fn gotos_mut(&mut self) -> impl Iterator<Item = &mut Index>;

    /// Shifts every target at or after `from` forward by one.
    fn incr_pc(&mut self, from: Index) {
        for goto in self.gotos_mut() {
            if *goto >= from {
                *goto += 1;
            }
        }
    }

    /// Shifts every target at or after `from` backward by `by`.
    fn decr_pc(&mut self, from: Index, by: usize) {
        for goto in self.gotos_mut() {
            if *goto >= from {
                *goto -= by;
            }
        }
    }
}

impl Goto for Inst {
    fn gotos(&self) -> impl Iterator<Item = Index> {
        let gotos = match *self {
            Inst::Jmp(goto) => [Some(goto), None],
            Inst::Split { goto1, goto2 } => [Some(goto1), Some(goto2)],
            _ => [None, None],
        };
        gotos.into_iter().flatten()
    }

    fn gotos_mut(&mut self) -> impl Iterator<Item = &mut Index> {
        let gotos = match self {
            Inst::Jmp(goto) => [Some(goto), None],
            Inst::Split { goto1, goto2 } => [Some(goto1), Some(goto2)],
            _ => [None, None],
        };
        gotos.into_iter().flatten()
    }
}
