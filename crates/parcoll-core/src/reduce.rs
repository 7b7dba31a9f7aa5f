//! Tree reduction engine
//!
//! A reduction over `n` elements runs in rounds. A round over `active`
//! elements has `span = ceil(active / 2)` independent units; unit `i`
//! combines elements `i` and `i + span` when the partner exists and passes
//! element `i` through otherwise, so the middle element of an odd round
//! survives into the next one. The next round runs over `span` elements.
//! After `ceil(log2 n)` rounds one element is left at index 0.
//!
//! Round 0 reads the collection and writes a scratch region of
//! [`scratch_len`] elements; every later round works in place on the
//! scratch. Backends supply the per-round work through [`TreeStep`] and let
//! [`drive`] sequence the rounds.

/// One halving round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    /// 0 for the round that reads the collection itself.
    pub index: usize,
    /// Elements still live at the start of the round.
    pub active: usize,
    /// Units in the round, and elements live after it.
    pub span: usize,
}

impl Round {
    /// Whether unit `i` has a partner to combine with.
    pub fn pairs(&self, i: usize) -> bool {
        i + self.span < self.active
    }
}

/// Iterator over the rounds of a reduction, first to last.
#[derive(Debug, Clone)]
pub struct Rounds {
    next_index: usize,
    active: usize,
}

impl Iterator for Rounds {
    type Item = Round;

    fn next(&mut self) -> Option<Round> {
        if self.active <= 1 {
            return None;
        }
        let span = self.active.div_ceil(2);
        let round = Round {
            index: self.next_index,
            active: self.active,
            span,
        };
        self.next_index += 1;
        self.active = span;
        Some(round)
    }
}

/// Rounds needed to reduce `n` elements. Empty for `n <= 1`.
pub fn rounds(n: usize) -> Rounds {
    Rounds { next_index: 0, active: n }
}

/// Scratch elements a reduction over `n` elements needs.
pub fn scratch_len(n: usize) -> usize {
    n.div_ceil(2)
}

/// Per-round work of one backend.
///
/// A round that fails stops the reduction; later rounds would read its
/// output.
pub trait TreeStep {
    type Error;

    fn step(&mut self, round: Round) -> Result<(), Self::Error>;
}

/// Run every round of a reduction over `n` elements and return how many
/// ran. The result is at scratch index 0 when at least one round ran.
pub fn drive<S: TreeStep + ?Sized>(n: usize, stepper: &mut S) -> Result<usize, S::Error> {
    let mut count = 0;
    for round in rounds(n) {
        tracing::trace!(round = round.index, active = round.active, span = round.span, "reduce round");
        stepper.step(round)?;
        count += 1;
    }
    Ok(count)
}
