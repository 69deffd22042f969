use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{Branch, Model};
use crate::simplex::{LpOutcome, Solver};
use crate::solution::{SearchStats, SolutionStatus};

/// What happened to one node of the search tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeOutcome {
    /// The relaxation has no feasible point
    Infeasible,
    /// The relaxation is unbounded; the search stops here
    Unbounded,
    /// The relaxed objective is worse than the incumbent
    FathomedByBound,
    /// The relaxed solution is integral
    IntegerFeasible { improved: bool },
    /// Split on `x[index] = value`
    Branched { index: usize, value: f64 },
}

/// Snapshot passed to a [`SearchObserver`] after a node is processed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEvent {
    /// 1-based sequence number of the node
    pub node: usize,
    /// Number of bound changes between the root and this node
    pub depth: usize,
    /// Nodes still waiting in the worklist, this one excluded
    pub open: usize,
    /// Relaxed objective, if the relaxation was solved to optimality
    pub z: Option<f64>,
    /// Incumbent objective when the node was checked, before any update it caused
    pub incumbent: Option<f64>,
    pub outcome: NodeOutcome,
}

/// Progress hook for [`Solver::solve_milp_with_observer`]. It only sees copies
/// of the search state and cannot influence it.
pub trait SearchObserver {
    fn on_node(&mut self, _event: &NodeEvent) {}
}

impl<F: FnMut(&NodeEvent)> SearchObserver for F {
    fn on_node(&mut self, event: &NodeEvent) {
        (*self)(event)
    }
}

/// Worklist entry
struct Node {
    model: Model,
    depth: usize,
}

/// Best integer-feasible point seen in the current run
struct Incumbent {
    z: f64,
    x: Option<Vec<f64>>,
}

impl Incumbent {
    fn new() -> Self {
        Self { z: f64::INFINITY, x: None }
    }

    fn value(&self) -> Option<f64> {
        (self.z < f64::INFINITY).then_some(self.z)
    }
}

impl Solver {
    /// Solve `model` as a mixed-integer program by branch-and-bound.
    ///
    /// Only the result fields of `model` are written. Nodes are explored in
    /// FIFO order with most-fractional branching; there is no node or time limit.
    pub fn solve_milp(&self, model: &mut Model) -> Result<SearchStats> {
        self.solve_milp_with_observer(model, &mut |_: &NodeEvent| {})
    }

    pub fn solve_milp_with_observer(
        &self,
        model: &mut Model,
        observer: &mut dyn SearchObserver,
    ) -> Result<SearchStats> {
        model.validate()?;

        let mut stats = SearchStats::default();
        let mut incumbent = Incumbent::new();
        let mut root = model.clone();
        root.clear_solution();
        let mut open = VecDeque::from([Node { model: root, depth: 0 }]);
        stats.peak_open = open.len();

        while let Some(mut node) = open.pop_front() {
            stats.nodes += 1;
            let before = incumbent.value();
            let outcome = self.run(&node.model)?;
            let result = match &outcome {
                LpOutcome::Infeasible => NodeOutcome::Infeasible,
                LpOutcome::Unbounded => NodeOutcome::Unbounded,
                LpOutcome::Optimal { x, z } => self.process(x, *z, &node.model.x_int, &mut incumbent, &mut stats),
            };
            outcome.apply(&mut node.model);

            debug!(
                node = stats.nodes,
                depth = node.depth,
                open = open.len(),
                z = ?node.model.z,
                incumbent = ?incumbent.value(),
                outcome = ?result,
                "node processed"
            );
            observer.on_node(&NodeEvent {
                node: stats.nodes,
                depth: node.depth,
                open: open.len(),
                z: node.model.z,
                incumbent: before,
                outcome: result,
            });

            match result {
                NodeOutcome::Infeasible => stats.fathomed_infeasible += 1,
                NodeOutcome::Unbounded => {
                    warn!(node = stats.nodes, "relaxation unbounded, stopping search");
                    model.clear_solution();
                    model.status = SolutionStatus::Unbounded;
                    stats.status = SolutionStatus::Unbounded;
                    return Ok(stats);
                }
                NodeOutcome::Branched { index, value } => {
                    for branch in [Branch::Down, Branch::Up] {
                        open.push_back(Node {
                            model: node.model.tightened(index, value, branch),
                            depth: node.depth + 1,
                        });
                    }
                    stats.peak_open = stats.peak_open.max(open.len());
                }
                NodeOutcome::FathomedByBound | NodeOutcome::IntegerFeasible { .. } => {}
            }
        }

        model.clear_solution();
        match incumbent.x {
            Some(x) => {
                model.x = Some(x);
                model.z = Some(incumbent.z);
                model.status = SolutionStatus::Optimal;
            }
            None => model.status = SolutionStatus::Infeasible,
        }
        stats.status = model.status;
        info!(
            status = %stats.status,
            z = ?model.z,
            nodes = stats.nodes,
            branched = stats.branched,
            peak_open = stats.peak_open,
            "branch-and-bound finished"
        );
        Ok(stats)
    }

    /// Bound check, integrality check and incumbent update for a solved node
    fn process(
        &self,
        x: &[f64],
        z: f64,
        x_int: &[bool],
        incumbent: &mut Incumbent,
        stats: &mut SearchStats,
    ) -> NodeOutcome {
        if z > incumbent.z {
            stats.fathomed_by_bound += 1;
            return NodeOutcome::FathomedByBound;
        }

        let Some(index) = most_fractional(x, x_int, self.integrality_tolerance) else {
            stats.integer_feasible += 1;
            let improved = z < incumbent.z;
            if improved {
                debug!(from = incumbent.z, to = z, "incumbent improved");
                incumbent.z = z;
                incumbent.x = Some(x.to_vec());
                stats.incumbent_updates += 1;
            }
            return NodeOutcome::IntegerFeasible { improved };
        };

        stats.branched += 1;
        NodeOutcome::Branched { index, value: x[index] }
    }
}

/// Index of the integer variable farthest from an integer, first one on ties.
///
/// A variable counts as fractional when `|floor(x) - x|` exceeds `tol`; the
/// distance used for ranking is to the nearer of floor and ceiling.
pub(crate) fn most_fractional(x: &[f64], x_int: &[bool], tol: f64) -> Option<usize> {
    let mut best = 0.0;
    let mut index = None;
    for (i, (&value, &integer)) in x.iter().zip(x_int).enumerate() {
        if !integer || (value.floor() - value).abs() <= tol {
            continue;
        }
        let frac = (value.floor() - value).abs().min((value.ceil() - value).abs());
        if frac > best {
            best = frac;
            index = Some(i);
        }
    }
    index
}
