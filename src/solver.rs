//! The constraint-satisfaction engine: domain store, propagation, and search.
//!
//! Filling a grid is a CSP with one variable per slot. Solving runs in three
//! stages: node consistency drops words whose length cannot fit a slot, AC-3
//! propagates the pairwise overlap constraints to a fixed point, and a
//! backtracking search assigns one word per slot, ordering variables by
//! MRV/degree and values least-constraining first.
//!
//! # Error Handling
//!
//! Unsatisfiability is *not* an error. A domain wiped out during propagation
//! and a search that exhausts every branch both surface as
//! [`SolveStatus::NoSolution`]; callers cannot (and need not) tell them
//! apart. The only true error is the fail-fast guard:
//!
//! - S001: `OverlapOutOfBounds` (an overlap index fell outside a word being
//!   checked during revision)
//!
//! # Examples
//!
//! ```
//! use crossfill::puzzle::Puzzle;
//! use crossfill::solver::Solver;
//! use crossfill::word_list::WordList;
//!
//! let puzzle = Puzzle::parse("___\n##_\n##_\n")?;
//! let words = WordList::parse_from_str("cat\ntac\ndog\n");
//!
//! let mut solver = Solver::new(&puzzle, &words);
//! let assignment = solver.solve()?.expect("this grid is fillable");
//! assert_eq!(assignment.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Bounding the search
//!
//! ```
//! use std::time::Duration;
//! use crossfill::puzzle::Puzzle;
//! use crossfill::solver::{SolveStatus, Solver};
//! use crossfill::word_list::WordList;
//!
//! let puzzle = Puzzle::parse("___\n##_\n##_\n")?;
//! let words = WordList::parse_from_str("cat\ntac\ndog\n");
//!
//! let mut solver = Solver::new(&puzzle, &words);
//! let result = solver.solve_with_budget(Some(Duration::from_secs(5)))?;
//! match result.status {
//!     SolveStatus::Solved => println!("filled the grid"),
//!     SolveStatus::NoSolution => println!("no fill exists"),
//!     SolveStatus::TimedOut { elapsed } => println!("gave up after {elapsed:?}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use instant::Instant;
use log::{debug, info};

use crate::puzzle::Puzzle;
use crate::variable::Variable;
use crate::word_list::WordList;

/// A (possibly partial) mapping from slot to its chosen word.
pub type Assignment = HashMap<Variable, Rc<str>>;

/// Status of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// A complete, consistent assignment was found.
    Solved,

    /// Propagation wiped out a domain, or the search exhausted every branch.
    NoSolution,

    /// The time budget expired before the search finished. Contains the
    /// elapsed time.
    TimedOut { elapsed: Duration },
}

/// Outcome of a solver run (even an unsuccessful one).
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// The completed assignment, present iff `status` is
    /// [`SolveStatus::Solved`].
    pub assignment: Option<Assignment>,
    /// Whether the run solved, failed, or timed out.
    pub status: SolveStatus,
    /// Counters accumulated during the run.
    pub stats: SolveStats,
}

/// Counters describing how much work a solve did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Candidate extensions tried during search.
    pub nodes: usize,
    /// Search nodes that ran out of candidate values.
    pub dead_ends: usize,
    /// `revise` calls that shrank a domain.
    pub revisions: usize,
}

/// Errors surfaced by the solver itself.
///
/// "No solution" is deliberately absent: an unsatisfiable puzzle is a valid,
/// final outcome reported through [`SolveStatus::NoSolution`].
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// An overlap index fell outside a word being checked during revision.
    /// Reachable only when [`Solver::revise`] runs against a domain that has
    /// not been made node-consistent yet.
    #[error("overlap index {index} out of bounds for \"{word}\"")]
    OverlapOutOfBounds { word: String, index: usize },
}

impl SolverError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::OverlapOutOfBounds { .. } => "S001",
        }
    }

    /// Returns a helpful suggestion for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            SolverError::OverlapOutOfBounds { .. } => Some(
                "Run enforce_node_consistency first, so every domain word matches its slot length",
            ),
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        crate::errors::format_error_with_code_and_help(&self.to_string(), self.code(), self.help())
    }
}

/// Wall-clock limit for a search, checked cooperatively before each candidate
/// value. `limit: None` never expires.
struct TimeBudget {
    start: Instant,
    limit: Option<Duration>,
}

impl TimeBudget {
    fn new(limit: Option<Duration>) -> Self {
        Self { start: Instant::now(), limit }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.start.elapsed() >= limit)
    }
}

/// Sentinel for an expired budget unwinding the search.
struct Expired;

/// Byte of `word` at `index`, or the fail-fast error the overlap guard
/// requires when an index points outside the word.
fn char_at(word: &Rc<str>, index: usize) -> Result<u8, SolverError> {
    word.as_bytes()
        .get(index)
        .copied()
        .ok_or_else(|| SolverError::OverlapOutOfBounds { word: word.to_string(), index })
}

/// CSP solver for one puzzle: owns the domain store and runs propagation and
/// search against a borrowed [`Puzzle`].
pub struct Solver<'p> {
    puzzle: &'p Puzzle,
    domains: HashMap<Variable, BTreeSet<Rc<str>>>,
    stats: SolveStats,
}

impl<'p> Solver<'p> {
    /// Create a solver with every slot's domain set to the full word list.
    ///
    /// Each domain is an independent set — shrinking one never affects
    /// another — while the word strings themselves are shared via `Rc`.
    /// `BTreeSet` keeps iteration lexicographic, so value ordering is
    /// reproducible.
    #[must_use]
    pub fn new(puzzle: &'p Puzzle, word_list: &WordList) -> Self {
        let dictionary: Vec<Rc<str>> = word_list
            .words
            .iter()
            .map(|word| Rc::from(word.as_str()))
            .collect();
        let domains = puzzle
            .variables()
            .iter()
            .map(|&var| (var, dictionary.iter().cloned().collect::<BTreeSet<_>>()))
            .collect();
        Self { puzzle, domains, stats: SolveStats::default() }
    }

    /// Current domain of `var`, if it is a slot of this puzzle.
    #[must_use]
    pub fn domain(&self, var: Variable) -> Option<&BTreeSet<Rc<str>>> {
        self.domains.get(&var)
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// True when every slot of the puzzle has an entry.
    #[must_use]
    pub fn is_complete(&self, assignment: &Assignment) -> bool {
        assignment.len() == self.puzzle.variables().len()
    }

    /// Drop every domain word whose length mismatches its slot's length.
    ///
    /// Deterministic and idempotent: a second call removes nothing.
    pub fn enforce_node_consistency(&mut self) {
        for (var, domain) in &mut self.domains {
            domain.retain(|word| word.len() == var.length);
        }
    }

    /// Make `x` arc-consistent with `y`: remove from `domain(x)` every word
    /// with no supporting word in `domain(y)` at the shared cell.
    ///
    /// Returns `Ok(true)` iff `domain(x)` changed. A pair with no overlap is
    /// never revised (`Ok(false)`, no change).
    ///
    /// # Errors
    /// Fails fast with [`SolverError::OverlapOutOfBounds`] if an overlap
    /// index is out of range for a word being checked — possible only before
    /// node consistency has pruned mismatched lengths.
    pub fn revise(&mut self, x: Variable, y: Variable) -> Result<bool, SolverError> {
        let Some((xi, yj)) = self.puzzle.overlap(x, y) else {
            return Ok(false);
        };

        // Letters y can still put into the shared cell.
        let mut support = HashSet::new();
        if let Some(domain_y) = self.domains.get(&y) {
            for word in domain_y {
                support.insert(char_at(word, yj)?);
            }
        }

        let mut doomed = Vec::new();
        if let Some(domain_x) = self.domains.get(&x) {
            for word in domain_x {
                if !support.contains(&char_at(word, xi)?) {
                    doomed.push(Rc::clone(word));
                }
            }
        }
        if doomed.is_empty() {
            return Ok(false);
        }

        if let Some(domain_x) = self.domains.get_mut(&x) {
            for word in &doomed {
                domain_x.remove(word);
            }
        }
        self.stats.revisions += 1;
        debug!("revise {x} against {y}: removed {} candidate(s)", doomed.len());
        Ok(true)
    }

    /// Propagate overlap constraints to a fixed point (AC-3).
    ///
    /// `arcs` seeds the worklist; `None` means every ordered pair of slots
    /// with a defined overlap, in canonical order. The worklist pops FIFO so
    /// runs are deterministic (any discipline would be correct — AC-3 is
    /// confluent). Returns `Ok(false)` as soon as any domain empties (no
    /// solution exists in this subtree), `Ok(true)` once every domain is
    /// arc-consistent. Termination is guaranteed because domains are finite
    /// and only shrink.
    ///
    /// # Errors
    /// Propagates the fail-fast guard of [`Solver::revise`].
    pub fn ac3(&mut self, arcs: Option<Vec<(Variable, Variable)>>) -> Result<bool, SolverError> {
        let mut queue: VecDeque<(Variable, Variable)> = match arcs {
            Some(seed) => seed.into(),
            None => self.all_arcs().into(),
        };

        while let Some((x, y)) = queue.pop_front() {
            if !self.revise(x, y)? {
                continue;
            }
            if self.domains.get(&x).map_or(true, BTreeSet::is_empty) {
                debug!("domain of {x} wiped out while revising against {y}");
                return Ok(false);
            }
            // A tightened domain(x) may break support for constraints that z
            // had already satisfied, so every other neighbor gets re-queued.
            for &z in self.puzzle.neighbors(x) {
                if z != y {
                    queue.push_back((z, x));
                }
            }
        }
        Ok(true)
    }

    /// Every ordered arc (x, y) with a defined overlap, in canonical order.
    fn all_arcs(&self) -> Vec<(Variable, Variable)> {
        self.puzzle
            .variables()
            .iter()
            .flat_map(|&x| self.puzzle.neighbors(x).iter().map(move |&y| (x, y)))
            .collect()
    }

    /// Check a (possibly partial) assignment: words pairwise distinct, every
    /// word the exact slot length, every assigned crossing matched at its
    /// shared cell. Runs on every search node, so it stays allocation-light.
    #[must_use]
    pub fn is_consistent(&self, assignment: &Assignment) -> bool {
        let mut used: HashSet<&str> = HashSet::with_capacity(assignment.len());
        for (&var, word) in assignment {
            if !used.insert(word.as_ref()) {
                return false;
            }
            if word.len() != var.length {
                return false;
            }
            for &neighbor in self.puzzle.neighbors(var) {
                let Some(other) = assignment.get(&neighbor) else {
                    continue;
                };
                let Some((i, j)) = self.puzzle.overlap(var, neighbor) else {
                    continue;
                };
                // `get` rather than indexing: `other` may still be awaiting
                // its own length check in this loop.
                if word.as_bytes().get(i) != other.as_bytes().get(j) {
                    return false;
                }
            }
        }
        true
    }

    /// Pick the unassigned slot to branch on next: smallest current domain
    /// (MRV), then most neighbors (degree), then first in canonical order,
    /// so the same puzzle always branches the same way.
    ///
    /// Returns `None` when every slot is assigned.
    #[must_use]
    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> Option<Variable> {
        let mut best: Option<(Variable, usize, usize)> = None;
        for &var in self.puzzle.variables() {
            if assignment.contains_key(&var) {
                continue;
            }
            let size = self.domains.get(&var).map_or(0, BTreeSet::len);
            let degree = self.puzzle.neighbors(var).len();
            let better = match best {
                None => true,
                Some((_, best_size, best_degree)) => {
                    size < best_size || (size == best_size && degree > best_degree)
                }
            };
            if better {
                best = Some((var, size, degree));
            }
        }
        best.map(|(var, _, _)| var)
    }

    /// Domain of `var` in least-constraining-value order: ascending by the
    /// number of candidates the choice would eliminate from unassigned
    /// neighbors' domains. A neighbor candidate counts as eliminated if it
    /// clashes at the shared cell or reuses the same word. Neighbors already
    /// in the assignment cannot be constrained further and are skipped. Ties
    /// keep the domain's lexicographic order (stable sort).
    #[must_use]
    pub fn order_domain_values(&self, var: Variable, assignment: &Assignment) -> Vec<Rc<str>> {
        let Some(domain) = self.domains.get(&var) else {
            return Vec::new();
        };

        let crossings: Vec<(&BTreeSet<Rc<str>>, usize, usize)> = self
            .puzzle
            .neighbors(var)
            .iter()
            .copied()
            .filter(|neighbor| !assignment.contains_key(neighbor))
            .filter_map(|neighbor| {
                let (i, j) = self.puzzle.overlap(var, neighbor)?;
                let domain_n = self.domains.get(&neighbor)?;
                Some((domain_n, i, j))
            })
            .collect();

        let mut scored: Vec<(usize, Rc<str>)> = domain
            .iter()
            .map(|word| {
                let eliminated: usize = crossings
                    .iter()
                    .map(|(domain_n, i, j)| {
                        domain_n
                            .iter()
                            .filter(|candidate| {
                                candidate.as_ref() == word.as_ref()
                                    || candidate.as_bytes().get(*j) != word.as_bytes().get(*i)
                            })
                            .count()
                    })
                    .sum();
                (eliminated, Rc::clone(word))
            })
            .collect();

        scored.sort_by_key(|&(eliminated, _)| eliminated);
        scored.into_iter().map(|(_, word)| word).collect()
    }

    /// Solve with no time limit. `Ok(None)` means no fill exists.
    ///
    /// # Errors
    /// Only the fail-fast guard of [`Solver::revise`].
    pub fn solve(&mut self) -> Result<Option<Assignment>, SolverError> {
        Ok(self.solve_with_budget(None)?.assignment)
    }

    /// Enforce node consistency, propagate with AC-3, then search.
    ///
    /// `limit` is the cooperative wall-clock budget checked before each
    /// candidate value; `None` searches to completion. If propagation alone
    /// proves the puzzle unsatisfiable, the search never starts and the
    /// result reports zero nodes.
    ///
    /// # Errors
    /// Only the fail-fast guard of [`Solver::revise`].
    pub fn solve_with_budget(
        &mut self,
        limit: Option<Duration>,
    ) -> Result<SolveResult, SolverError> {
        self.enforce_node_consistency();

        // AC-3 only notices a wipeout caused by a revision, so a domain
        // emptied by node consistency alone is checked here.
        if let Some(var) = self.wiped_out_variable() {
            info!("no words of length {} for {var}; unsatisfiable", var.length);
            return Ok(self.finish(SolveStatus::NoSolution, None));
        }

        if !self.ac3(None)? {
            info!("arc consistency wiped out a domain; unsatisfiable");
            return Ok(self.finish(SolveStatus::NoSolution, None));
        }

        debug!(
            "domain sizes after propagation: {}",
            self.puzzle
                .variables()
                .iter()
                .map(|&var| self.domains.get(&var).map_or(0, BTreeSet::len).to_string())
                .collect::<Vec<_>>()
                .join("/")
        );

        let budget = TimeBudget::new(limit);
        let mut assignment = Assignment::new();
        let result = match self.backtrack(&mut assignment, &budget) {
            Ok(Some(solution)) => self.finish(SolveStatus::Solved, Some(solution)),
            Ok(None) => self.finish(SolveStatus::NoSolution, None),
            Err(Expired) => {
                info!("search timed out after {:?}", budget.elapsed());
                self.finish(SolveStatus::TimedOut { elapsed: budget.elapsed() }, None)
            }
        };
        Ok(result)
    }

    /// Depth-first backtracking over the pruned domains.
    ///
    /// One assignment is threaded through the recursion (recursion depth is
    /// bounded by the slot count); the tentative entry is removed on every
    /// non-success exit path — inconsistency, exhausted candidates, timeout
    /// unwind — so callers always get back the assignment they passed in
    /// unless a full solution is returned.
    fn backtrack(
        &mut self,
        assignment: &mut Assignment,
        budget: &TimeBudget,
    ) -> Result<Option<Assignment>, Expired> {
        if self.is_complete(assignment) {
            return Ok(Some(assignment.clone()));
        }

        let Some(var) = self.select_unassigned_variable(assignment) else {
            // Unreachable: an incomplete assignment always leaves a slot.
            return Ok(None);
        };

        for word in self.order_domain_values(var, assignment) {
            if budget.expired() {
                return Err(Expired);
            }
            self.stats.nodes += 1;
            assignment.insert(var, Rc::clone(&word));
            if self.is_consistent(assignment) {
                match self.backtrack(assignment, budget) {
                    Ok(Some(solution)) => return Ok(Some(solution)),
                    Ok(None) => {}
                    Err(expired) => {
                        assignment.remove(&var);
                        return Err(expired);
                    }
                }
            }
            assignment.remove(&var);
        }

        self.stats.dead_ends += 1;
        Ok(None)
    }

    fn finish(&self, status: SolveStatus, assignment: Option<Assignment>) -> SolveResult {
        SolveResult { assignment, status, stats: self.stats }
    }

    /// First slot whose domain is empty, if any.
    fn wiped_out_variable(&self) -> Option<Variable> {
        self.puzzle
            .variables()
            .iter()
            .copied()
            .find(|var| self.domains.get(var).map_or(true, BTreeSet::is_empty))
    }
}
