// Minimization drivers: classical (reverse/determinize twice) and lazy.

use tracing::{debug, warn};
use wfst_core::edit::reverse;
use wfst_core::{Automaton, FstError, Unit, UnitId, WeightOps};

use crate::config::{DetConfig, DetScratch, MinimizeConfig, MinimizeMode};
use crate::determinize::{Determinizer, selected_units};
use crate::lazymin::lazy_minimize;

/// Minimize one unit or every unit of `src` into `dst`.
///
/// `lazy` selects degree-1 chain contraction instead of the classical
/// algorithm. `dst` is replaced, as with [`crate::determinize`].
pub fn minimize(
    dst: &mut Automaton,
    src: &Automaton,
    unit: Option<UnitId>,
    lazy: bool,
) -> Result<(), FstError> {
    let config = if lazy {
        MinimizeConfig::lazy()
    } else {
        MinimizeConfig::classical()
    };
    minimize_with(dst, src, unit, &config)
}

/// [`minimize`] with explicit settings.
pub fn minimize_with(
    dst: &mut Automaton,
    src: &Automaton,
    unit: Option<UnitId>,
    config: &MinimizeConfig,
) -> Result<(), FstError> {
    if let Some(u) = unit {
        src.check_unit(u)?;
    }
    let ops = src.weight_ops(config.det.tolerance);
    let mut scratch = DetScratch::new();
    let mut out = src.empty_like();

    for u in selected_units(src, unit) {
        let source = &src.units()[u];
        if source.num_transitions() == 0 {
            warn!(unit = u, "minimize: unit has no transitions");
        }
        let result = match config.mode {
            MinimizeMode::Classical => minimize_single(source, ops, &config.det, &mut scratch)?,
            MinimizeMode::Lazy => {
                let mut copy = source.clone();
                let stats = lazy_minimize(&mut copy, &ops);
                debug!(
                    unit = u,
                    contractions = stats.contractions,
                    removed_states = stats.removed_states,
                    "lazy minimization"
                );
                copy
            }
        };
        debug!(
            unit = u,
            states_before = source.num_states(),
            states_after = result.num_states(),
            transitions = result.num_transitions(),
            "minimized unit"
        );
        out.push_unit(result);
    }

    *dst = out;
    Ok(())
}

/// Classical minimization of a single unit of `src`.
pub fn minimize_unit(
    src: &Automaton,
    unit: UnitId,
    config: &DetConfig,
) -> Result<Unit, FstError> {
    let source = src.unit(unit)?;
    let ops = src.weight_ops(config.tolerance);
    let mut scratch = DetScratch::new();
    minimize_single(source, ops, config, &mut scratch)
}

/// Reverse, determinize, reverse, determinize.
fn minimize_single(
    source: &Unit,
    ops: WeightOps,
    config: &DetConfig,
    scratch: &mut DetScratch,
) -> Result<Unit, FstError> {
    let mut work = source.clone();
    reverse(&mut work, &ops);
    let mut aux = Determinizer::new(&work, ops, config).run(scratch)?;
    reverse(&mut aux, &ops);
    Determinizer::new(&aux, ops, config).run(scratch)
}
