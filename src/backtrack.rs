/*!
This is the backtracking matching engine.

Execution is a depth first search over `(instruction, offset)` states, driven
by an explicit stack of suspended threads instead of recursion, so the depth
of the search is bounded only by memory. A `Split` pushes its second branch
and then its first, so the first branch is always explored first; this order
is all that distinguishes greedy from lazy repetition.

The stack run-length compresses threads. A greedy loop over a simple matcher
like `[a-z]+` leaves one pending thread per consumed codepoint, all at the
same instruction and at evenly spaced offsets. Those collapse into a single
stack entry that records the spacing and the number of repeats, so scanning
a long run of letters keeps the stack at constant size.

Captures are undone the same way threads are resumed: writing a capture slot
first pushes the slot's old value, and popping that entry puts it back once
everything explored after the write has failed.
*/

use std::collections::HashSet;

use log::trace;
use smallvec::SmallVec;

use crate::error::ExecError;
use crate::input::SourceView;
use crate::options::{MatchGroup, MatchOptions, MatchResult};
use crate::program::{Index, Inst, Program};

/// Threads kept inline before the stack moves to the heap.
const INLINE_THREADS: usize = 16;

/// A suspended continuation: resume at `pc` with the text cursor at
/// `str_idx`.
///
/// A thread on the stack with `str_idx_repeats > 0` also stands for the
/// threads at `str_idx + str_idx_delta * k` for `k` in `1..=str_idx_repeats`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Thread {
    str_idx: usize,
    pc: Index,
    str_idx_delta: isize,
    str_idx_repeats: usize,
}

/// An entry of the backtracking stack.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Job {
    Thread(Thread),
    /// Puts a capture slot back to `old` once every thread pushed after
    /// it has failed.
    Restore { slot: usize, old: usize },
}

/// The explicit backtracking stack.
#[derive(Clone, Debug, Default)]
struct ThreadStack {
    jobs: SmallVec<[Job; INLINE_THREADS]>,
}

impl ThreadStack {
    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn push(&mut self, pc: Index, str_idx: usize) -> Result<(), ExecError> {
        if let Some(Job::Thread(top)) = self.jobs.last_mut() {
            if top.pc == pc {
                let delta = str_idx as isize - top.str_idx as isize;
                if top.str_idx_repeats == 0 {
                    top.str_idx_delta = delta;
                    top.str_idx_repeats = 1;
                    return Ok(());
                }
                let next = top.str_idx_repeats as isize + 1;
                if delta == top.str_idx_delta * next {
                    top.str_idx_repeats += 1;
                    return Ok(());
                }
            }
        }
        self.reserve()?;
        self.jobs.push(Job::Thread(Thread { str_idx, pc, ..Thread::default() }));
        Ok(())
    }

    fn push_restore(&mut self, slot: usize, old: usize) -> Result<(), ExecError> {
        self.reserve()?;
        self.jobs.push(Job::Restore { slot, old });
        Ok(())
    }

    fn reserve(&mut self) -> Result<(), ExecError> {
        if self.jobs.len() == self.jobs.capacity() {
            let spilled = self.jobs.spilled();
            self.jobs.try_reserve(1).map_err(|_| ExecError::OutOfMemory)?;
            if !spilled {
                trace!("thread stack spilled to the heap after {} entries", self.jobs.len());
            }
        }
        Ok(())
    }

    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn pop(&mut self) -> Option<Job> {
        if let Job::Thread(top) = self.jobs.last_mut()? {
            if top.str_idx_repeats > 0 {
                let offset = top.str_idx as isize
                    + top.str_idx_delta * top.str_idx_repeats as isize;
                top.str_idx_repeats -= 1;
                return Some(Job::Thread(Thread {
                    str_idx: offset as usize,
                    pc: top.pc,
                    ..Thread::default()
                }));
            }
        }
        self.jobs.pop()
    }

    /// Empties the stack, keeping whatever storage it has grown into.
    fn clear(&mut self) {
        self.jobs.clear();
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}

/// A cached allocation that can be reused on each execution.
///
/// `find` runs the VM at many start offsets; every attempt resets the cache
/// instead of allocating a new one. A cache must not be shared between
/// concurrent executions, but any number of caches may run the same program.
#[derive(Clone, Debug, Default)]
pub struct Cache {
    stack: ThreadStack,
    /// Loop entries already taken, for programs with empty loops.
    visited: HashSet<(Index, usize)>,
    /// The largest number of stack entries seen since the cache was made.
    high_water: usize,
}

impl Cache {
    /// Create a new, empty cache.
    pub fn new() -> Self {
        Cache::default()
    }

    /// Returns the largest number of entries the thread stack has held.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.visited.clear();
    }
}

/// Capture slot `2 * id` is the start of group `id`, `2 * id + 1` its end.
fn slot_mut(groups: &mut [MatchGroup], slot: usize) -> &mut usize {
    let group = &mut groups[slot / 2];
    if slot % 2 == 0 {
        &mut group.start
    } else {
        &mut group.end
    }
}

/// Records `at` in a capture slot, remembering the old value so that a
/// failing path leaves no trace in the output.
fn save(
    stack: &mut ThreadStack,
    groups: &mut [MatchGroup],
    slot: usize,
    at: usize,
) -> Result<(), ExecError> {
    let value = slot_mut(groups, slot);
    stack.push_restore(slot, *value)?;
    *value = at;
    Ok(())
}

/// Compares a fused literal against the text at `at`.
///
/// Returns the offset after the literal, or the offset of the first
/// codepoint that differs.
#[cfg_attr(feature = "perf-inline", inline(always))]
fn literal_at(lit: &[u8], view: &dyn SourceView, at: usize) -> Result<usize, usize> {
    for (i, &expected) in lit.iter().enumerate() {
        if view.byte_at(at + i) != Some(expected) {
            // Report the codepoint, not the byte, that failed to match.
            let lead = lit[..=i].iter().rposition(|&b| b & 0xC0 != 0x80).unwrap_or(0);
            return Err(at + lead);
        }
    }
    Ok(at + lit.len())
}

/// Execute `prog` against `view` once, starting at `options.match_from`.
///
/// On a match, `pos` is the offset where the match ended. Otherwise it is
/// the offset of the last thread explored before the search gave up.
///
/// Every capture slot starts out as [`MatchGroup::UNMATCHED`]. Writes made
/// on a path that later fails are undone, so after a match the slots hold
/// exactly the groups on the matching path.
pub fn exec(
    prog: &Program,
    cache: &mut Cache,
    view: &dyn SourceView,
    options: MatchOptions<'_>,
) -> Result<MatchResult, ExecError> {
    let MatchOptions { match_from, anchor_start_offset, mut group_out } = options;
    if let Some(groups) = group_out.as_deref() {
        if groups.len() != prog.group_count {
            return Err(ExecError::InvalidGroupSize {
                expected: prog.group_count,
                actual: groups.len(),
            });
        }
    }
    if let Some(groups) = group_out.as_deref_mut() {
        groups.fill(MatchGroup::UNMATCHED);
    }
    cache.reset();

    let mut pc = 0;
    let mut at = match_from;
    if let Some(Inst::String(lit)) = prog.first() {
        match literal_at(lit, view, at) {
            Ok(end) => {
                pc = 1;
                at = end;
            }
            Err(pos) => return Ok(MatchResult { pos, fully_matched: false }),
        }
    }

    let multi_line = prog.flags.multi_line;
    let stack = &mut cache.stack;
    let visited = &mut cache.visited;
    stack.push(pc, at)?;
    let mut pos = at;

    while let Some(job) = stack.pop() {
        let (pc, str_idx) = match job {
            Job::Thread(Thread { pc, str_idx, .. }) => (pc, str_idx),
            Job::Restore { slot, old } => {
                if let Some(groups) = group_out.as_deref_mut() {
                    *slot_mut(groups, slot) = old;
                }
                continue;
            }
        };
        pos = str_idx;
        match prog[pc] {
            Inst::Matched => {
                cache.high_water = cache.high_water.max(stack.len());
                return Ok(MatchResult { pos, fully_matched: true });
            }
            // Only reachable in a program that was never finished.
            Inst::Abort => {}
            Inst::Char(expected) => {
                if let Some((c, len)) = view.codepoint_at(str_idx)? {
                    if c == expected {
                        stack.push(pc + 1, str_idx + len)?;
                    }
                }
            }
            Inst::String(ref lit) => {
                if let Ok(end) = literal_at(lit, view, str_idx) {
                    stack.push(pc + 1, end)?;
                }
            }
            Inst::Any
            | Inst::CharInverse(_)
            | Inst::RangeOpt { .. }
            | Inst::Range(_)
            | Inst::RangeInverse(_) => {
                if let Some((c, len)) = view.codepoint_at(str_idx)? {
                    if (multi_line || c != '\n') && prog[pc].matches_char(c) {
                        stack.push(pc + 1, str_idx + len)?;
                    }
                }
            }
            Inst::Jmp(goto) => {
                if goto > pc || !prog.has_empty_loops || visited.insert((goto, str_idx)) {
                    stack.push(goto, str_idx)?;
                }
            }
            Inst::Split { goto1, goto2 } => {
                stack.push(goto2, str_idx)?;
                // A `+` loops back through its split.
                if goto1 > pc || !prog.has_empty_loops || visited.insert((goto1, str_idx)) {
                    stack.push(goto1, str_idx)?;
                }
            }
            Inst::GroupStart(id) => {
                if let Some(groups) = group_out.as_deref_mut() {
                    save(stack, groups, 2 * id, str_idx)?;
                }
                stack.push(pc + 1, str_idx)?;
            }
            Inst::GroupEnd(id) => {
                if let Some(groups) = group_out.as_deref_mut() {
                    save(stack, groups, 2 * id + 1, str_idx)?;
                }
                stack.push(pc + 1, str_idx)?;
            }
            Inst::AnchorStart => {
                if str_idx == anchor_start_offset {
                    stack.push(pc + 1, str_idx)?;
                }
            }
            Inst::AnchorEnd => match view.codepoint_at(str_idx)? {
                None => stack.push(pc + 1, str_idx)?,
                Some(('\n', _)) if multi_line => stack.push(pc + 1, str_idx)?,
                Some(_) => {}
            },
        }
        cache.high_water = cache.high_water.max(stack.len());
    }
    Ok(MatchResult { pos, fully_matched: false })
}
