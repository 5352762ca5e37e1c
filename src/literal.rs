/*!
Literal prefixes.

After compilation a leading run of `Char` instructions is fused into a single
`String` instruction. That lets the VM reject most start offsets with a plain
byte comparison, and lets `find` skip straight to the offsets where the
literal occurs instead of running the VM everywhere.
*/

use log::trace;
use memchr::memmem::{Finder, FinderRev};

use crate::program::{Goto, Inst, Program};

/// Fuses the leading run of `Char` instructions of `prog` into one `String`.
///
/// The run stops before any instruction that some jump lands on, since that
/// instruction belongs to a loop or an alternative and has to stay
/// addressable. Nothing happens unless at least two characters fuse.
pub fn fuse_prefix(prog: &mut Program) {
    let run = prog.iter().take_while(|inst| matches!(inst, Inst::Char(_))).count();
    if run < 2 {
        return;
    }
    let run = prog
        .iter()
        .flat_map(|inst| inst.gotos())
        .filter(|&goto| goto > 0 && goto < run)
        .min()
        .unwrap_or(run);
    if run < 2 {
        return;
    }

    let mut bytes = Vec::with_capacity(run);
    let mut buf = [0u8; 4];
    for inst in &prog.insts[..run] {
        if let Inst::Char(c) = inst {
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    trace!(
        "fused {} leading characters into {:?}",
        run,
        String::from_utf8_lossy(&bytes)
    );

    prog.insts.splice(0..run, [Inst::String(bytes.into_boxed_slice())]);
    for inst in prog.insts.iter_mut() {
        inst.decr_pc(run, run - 1);
    }
}

/// A single substring searcher for a fused literal prefix, in both
/// directions.
#[derive(Clone, Debug)]
pub struct LiteralSearcher {
    fwd: Finder<'static>,
    rev: FinderRev<'static>,
}

impl LiteralSearcher {
    /// Returns a searcher for the literal prefix of `prog`, if it has one.
    pub fn prefix(prog: &Program) -> Option<Self> {
        prog.literal_prefix().map(LiteralSearcher::new)
    }

    pub fn new(lit: &[u8]) -> Self {
        LiteralSearcher {
            fwd: Finder::new(lit).into_owned(),
            rev: FinderRev::new(lit).into_owned(),
        }
    }

    /// The literal being searched for.
    pub fn needle(&self) -> &[u8] {
        self.fwd.needle()
    }

    /// Returns the first occurrence at or after `from`.
    pub fn find(&self, haystack: &[u8], from: usize) -> Option<usize> {
        let rest = haystack.get(from..)?;
        self.fwd.find(rest).map(|at| from + at)
    }

    /// Returns the last occurrence that lies entirely inside `haystack`.
    pub fn rfind(&self, haystack: &[u8]) -> Option<usize> {
        self.rev.rfind(haystack)
    }
}
