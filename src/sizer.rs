/*!

  Iterative equal-gate-delay sizing.

  Each pass visits the sizeable instances in insertion order and commits every new
  size immediately, so instances later in the same pass see the sizes of their
  neighbours that were already updated (Gauss-Seidel relaxation). Passes repeat
  until the largest relative size change drops to the tolerance, the pass budget
  runs out, the run diverges, or the caller cancels.

*/

use crate::circuit::InstanceType;
use crate::config::SizerConfig;
use crate::error::NetlistError;
use crate::graph::DriverTable;
use crate::netlist::{InstanceId, NetId, Netlist};
use bitvec::vec::BitVec;
use std::collections::BTreeMap;

/// Sizes below this are treated as this when computing relative change
const MIN_SIZE: f64 = 0.001;

/// Non-improving passes tolerated before a run is declared divergent
const MAX_DIVERGING_PASSES: usize = 2;

/// How a sizing run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingOutcome {
    /// The largest relative change of the last pass met the tolerance
    Converged,
    /// The pass budget ran out before the tolerance was met
    Exhausted,
    /// The relative change stopped improving
    Diverged,
    /// The caller asked the run to stop
    Cancelled,
}

impl SizingOutcome {
    /// Returns `true` for runs whose sizes the caller may keep. Running out of passes still counts.
    pub fn is_success(&self) -> bool {
        matches!(self, SizingOutcome::Converged | SizingOutcome::Exhausted)
    }
}

impl std::fmt::Display for SizingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizingOutcome::Converged => write!(f, "converged"),
            SizingOutcome::Exhausted => write!(f, "reached the iteration limit"),
            SizingOutcome::Diverged => write!(f, "diverged"),
            SizingOutcome::Cancelled => write!(f, "was cancelled"),
        }
    }
}

/// A topology anomaly found during a run. None of these stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A sizeable instance without exactly one output pin. It is never resized.
    AmbiguousOutput {
        /// Instance name
        instance: String,
        /// Number of output pins found
        outputs: usize,
    },
    /// A keeper with no gate to fight against on its net. It is sized to zero.
    UnopposedKeeper {
        /// Instance name
        instance: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::AmbiguousOutput { instance, outputs } => write!(
                f,
                "{instance} has {outputs} output pins, cannot attribute effort; not sized"
            ),
            Diagnostic::UnopposedKeeper { instance } => {
                write!(f, "keeper {instance} does not fight against any drivers")
            }
        }
    }
}

/// The result of a sizing run
#[derive(Debug, Clone)]
pub struct SizingReport {
    /// How the run ended
    pub outcome: SizingOutcome,
    /// The number of completed passes
    pub passes: usize,
    /// The largest relative size change of each completed pass
    pub deltas: Vec<f64>,
    /// Anomalies found, each reported once
    pub diagnostics: Vec<Diagnostic>,
}

impl SizingReport {
    fn new(outcome: SizingOutcome, deltas: Vec<f64>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            outcome,
            passes: deltas.len(),
            deltas,
            diagnostics,
        }
    }

    /// Returns `true` if the caller may keep the sizes
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Returns the largest relative change of the last completed pass
    pub fn final_delta(&self) -> Option<f64> {
        self.deltas.last().copied()
    }
}

impl std::fmt::Display for SizingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sizing {} after {} passes", self.outcome, self.passes)?;
        if let Some(delta) = self.final_delta() {
            write!(f, " (max delta {delta:.6})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Params {
    max_delta_x: f64,
    max_iterations: usize,
    alpha: f64,
    keeper_ratio: f64,
}

/// A sizeable instance with its output net resolved
#[derive(Debug)]
struct Target {
    id: InstanceId,
    net: NetId,
    /// Output pins on `net` from instances of the same kind and parallel group, itself included
    drivers: usize,
    /// Owners of the gate driver pins on `net`. Only filled for keepers.
    opposing: Vec<InstanceId>,
}

/// Runs the sizing iteration over a netlist it holds exclusively for the duration of the run.
pub struct Sizer<'a> {
    netlist: &'a mut Netlist,
}

impl<'a> Sizer<'a> {
    /// Creates a sizer over `netlist`
    pub fn new(netlist: &'a mut Netlist) -> Self {
        Self { netlist }
    }

    /// Returns the netlist being sized
    pub fn netlist(&self) -> &Netlist {
        &*self.netlist
    }

    /// Sizes the netlist in place. Returns `false` if the run diverged or was cancelled.
    ///
    /// `should_cancel` is polled once before each pass. Sizes committed before a
    /// failure are left in place.
    pub fn optimize<C>(
        &mut self,
        max_delta_x: f64,
        max_iterations: usize,
        alpha: f64,
        keeper_ratio: f64,
        should_cancel: C,
    ) -> bool
    where
        C: FnMut() -> bool,
    {
        let params = Params {
            max_delta_x,
            max_iterations,
            alpha,
            keeper_ratio,
        };
        match self.run_with(params, should_cancel) {
            Ok(report) => report.is_success(),
            Err(e) => {
                log::error!("Sizing aborted: {e}");
                false
            }
        }
    }

    /// Sizes the netlist in place with the parameters of `config`
    pub fn run<C>(&mut self, config: &SizerConfig, should_cancel: C) -> Result<SizingReport, NetlistError>
    where
        C: FnMut() -> bool,
    {
        config.validate()?;
        let params = Params {
            max_delta_x: config.convergence_epsilon,
            max_iterations: config.max_iterations,
            alpha: config.diffusion_alpha,
            keeper_ratio: config.keeper_ratio,
        };
        self.run_with(params, should_cancel)
    }

    fn run_with<C>(&mut self, params: Params, mut should_cancel: C) -> Result<SizingReport, NetlistError>
    where
        C: FnMut() -> bool,
    {
        let (targets, mut diagnostics) = self.plan()?;
        let mut unopposed: BitVec = BitVec::repeat(false, self.netlist.len());

        let mut current_delta = params.max_delta_x + 1.0;
        let mut last_delta = current_delta;
        let mut diverging = 0;
        let mut deltas = Vec::new();

        while current_delta > params.max_delta_x && deltas.len() < params.max_iterations {
            if should_cancel() {
                log::warn!("Sizing cancelled after {} passes", deltas.len());
                return Ok(SizingReport::new(SizingOutcome::Cancelled, deltas, diagnostics));
            }

            current_delta = self.pass(&targets, &params, &mut unopposed, &mut diagnostics);
            deltas.push(current_delta);
            log::debug!("Pass {}: max delta {}", deltas.len(), current_delta);

            // NaN would slip past both the loop guard and the convergence check
            if !current_delta.is_finite() {
                log::error!(
                    "Sizing produced a non-finite change after {} passes, aborting",
                    deltas.len()
                );
                return Ok(SizingReport::new(SizingOutcome::Diverged, deltas, diagnostics));
            }
            if current_delta >= last_delta {
                diverging += 1;
                if diverging > MAX_DIVERGING_PASSES {
                    log::error!(
                        "Sizing diverging after {} passes (max delta {}), aborting",
                        deltas.len(),
                        current_delta
                    );
                    return Ok(SizingReport::new(SizingOutcome::Diverged, deltas, diagnostics));
                }
            } else {
                last_delta = current_delta;
            }
        }

        let outcome = if current_delta <= params.max_delta_x {
            log::info!(
                "Sizing converged after {} passes (max delta {})",
                deltas.len(),
                current_delta
            );
            SizingOutcome::Converged
        } else {
            log::warn!(
                "Sizing stopped at the limit of {} passes (max delta {})",
                params.max_iterations,
                current_delta
            );
            SizingOutcome::Exhausted
        };
        Ok(SizingReport::new(outcome, deltas, diagnostics))
    }

    /// Resolves the output net and driver groups of every sizeable instance
    fn plan(&self) -> Result<(Vec<Target>, Vec<Diagnostic>), NetlistError> {
        let table = self.netlist.get_analysis::<DriverTable>()?;
        let mut targets = Vec::new();
        let mut diagnostics = Vec::new();

        for (id, inst) in self.netlist.instances() {
            if !inst.get_type().is_sizeable() {
                continue;
            }
            let Some(output) = inst.get_single_output() else {
                let diagnostic = Diagnostic::AmbiguousOutput {
                    instance: inst.get_name().to_string(),
                    outputs: inst.outputs().count(),
                };
                log::warn!("{diagnostic}");
                diagnostics.push(diagnostic);
                continue;
            };
            let net = output.get_net().ok_or_else(|| {
                NetlistError::Inconsistent(format!(
                    "output {} of {} is not on a net",
                    output.get_name(),
                    inst.get_name()
                ))
            })?;

            let drivers = table
                .matching_drivers(net, inst.get_type(), inst.get_parallel_group())
                .count();
            let opposing = match inst.get_type() {
                InstanceType::LeKeeper => table.opposing_drivers(net).map(|p| p.instance).collect(),
                _ => Vec::new(),
            };
            targets.push(Target {
                id,
                net,
                drivers,
                opposing,
            });
        }
        Ok((targets, diagnostics))
    }

    /// Runs one pass and returns the largest relative size change
    fn pass(
        &mut self,
        targets: &[Target],
        params: &Params,
        unopposed: &mut BitVec,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> f64 {
        let mut max_delta: f64 = 0.0;

        for target in targets {
            let inst = self.netlist.instance(target.id);
            let new_x = match inst.get_type() {
                InstanceType::LeKeeper => match self.weakest_opposition(target) {
                    Some(smallest_x) => smallest_x * params.keeper_ratio / target.drivers as f64,
                    None => {
                        if !unopposed.replace(target.id.index(), true) {
                            let diagnostic = Diagnostic::UnopposedKeeper {
                                instance: inst.get_name().to_string(),
                            };
                            log::warn!("{diagnostic}");
                            diagnostics.push(diagnostic);
                        }
                        0.0
                    }
                },
                _ => {
                    let total_cap = self.total_cap(target.net, params.alpha);
                    total_cap / inst.get_step_up()
                        / target.drivers as f64
                        / inst.get_mfactor() as f64
                }
            };

            let current_x = inst.get_size().max(MIN_SIZE);
            let delta = (new_x - current_x).abs() / current_x;
            if delta.is_nan() || delta > max_delta {
                max_delta = delta;
            }
            log::trace!("{}: {} -> {}", inst.get_name(), inst.get_size(), new_x);

            self.netlist.instance_mut(target.id).set_size(new_x);
        }
        max_delta
    }

    /// Returns the total drive of the weakest opposing driver, summing nonzero parallel groups
    fn weakest_opposition(&self, target: &Target) -> Option<f64> {
        let mut groups: BTreeMap<i32, f64> = BTreeMap::new();
        let mut smallest: Option<f64> = None;
        let mut consider = |x: f64| {
            smallest = Some(smallest.map_or(x, |s: f64| s.min(x)));
        };

        for driver in target.opposing.iter() {
            let inst = self.netlist.instance(*driver);
            if inst.get_parallel_group() <= 0 {
                consider(inst.get_size());
            } else {
                *groups.entry(inst.get_parallel_group()).or_insert(0.0) += inst.get_size();
            }
        }
        groups.into_values().for_each(&mut consider);
        smallest
    }

    /// Returns the capacitance on `net`, weighting output pins by `alpha`
    fn total_cap(&self, net: NetId, alpha: f64) -> f64 {
        self.netlist
            .net_pins(net)
            .map(|(_, inst, pin)| {
                let cap = inst.get_size() * pin.get_logical_effort() * inst.get_mfactor() as f64;
                if pin.is_output() { cap * alpha } else { cap }
            })
            .sum()
    }
}
