//! Simulation of Markov-switching regression paths.
//!
//! Draws a regime path from the Markov chain defined by the transition
//! matrix (row `S_{t−1}` gives the distribution of `S_t`) and Gaussian
//! observations from the regime-conditional mean:
//!
//! `y_t = μ_{s_t,t} + φ_{s_t}(y_{t−1} − μ_{s_{t−1},t−1}) + σ_{s_t} ε_t`,
//! with `μ_{j,t} = a_j + x_t'β_j`.
//!
//! The first AR(1) draw starts with a zero lagged deviation. The first
//! `burn_in` draws are discarded.
use ndarray::{Array1, ArrayView2};
use rand::{SeedableRng, distributions::WeightedIndex, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use crate::regime::{
    core::{options::SimOpts, params::MSParams, transition::stationary_distribution},
    errors::{MSError, MSResult},
};

/// Simulated observations and the regimes that generated them.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPath {
    pub endog: Array1<f64>,
    pub regimes: Vec<usize>,
}

/// simulate — draw `n` observations (after `opts.burn_in` discarded draws).
///
/// `exog` must have `burn_in + n` rows and `n_exog` columns whenever the
/// model has regressors; it is ignored otherwise.
///
/// # Errors
/// - [`MSError::InvalidSimulation`] for `n = 0`, a missing or misshaped
///   regressor matrix, an out-of-range initial regime, or a transition row
///   that is not a valid sampling distribution.
/// - Stationary-distribution errors when the initial regime is drawn.
pub fn simulate(
    params: &MSParams, n: usize, exog: Option<ArrayView2<f64>>, opts: &SimOpts,
) -> MSResult<SimulatedPath> {
    let shape = &params.shape;
    let k = shape.k_regimes;
    let total = opts.burn_in + n;
    if n == 0 {
        return Err(MSError::InvalidSimulation { reason: "n must be at least 1".to_string() });
    }
    let exog = if shape.n_exog > 0 {
        let x = exog.ok_or_else(|| MSError::InvalidSimulation {
            reason: format!("model has {} regressors but no exog was supplied", shape.n_exog),
        })?;
        if x.dim() != (total, shape.n_exog) {
            return Err(MSError::InvalidSimulation {
                reason: format!(
                    "exog must be {total}x{}; got {}x{}",
                    shape.n_exog,
                    x.nrows(),
                    x.ncols()
                ),
            });
        }
        Some(x)
    } else {
        None
    };

    let mut rng = match opts.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let rows = (0..k)
        .map(|i| WeightedIndex::new(params.transition.row(i).iter().copied()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MSError::InvalidSimulation { reason: format!("transition row: {e}") })?;
    let noise = (0..k)
        .map(|j| Normal::new(0.0, params.variance(j).sqrt()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MSError::InvalidSimulation { reason: format!("noise: {e}") })?;

    let mut regime = match opts.initial_regime {
        Some(r) if r < k => r,
        Some(r) => {
            return Err(MSError::InvalidSimulation {
                reason: format!("initial regime {r} is out of range for {k} regimes"),
            });
        }
        None => {
            let pi = stationary_distribution(params.transition.view())?;
            WeightedIndex::new(pi.iter().copied())
                .map_err(|e| MSError::InvalidSimulation { reason: format!("stationary: {e}") })?
                .sample(&mut rng)
        }
    };

    let mut endog = Array1::zeros(n);
    let mut regimes = Vec::with_capacity(n);
    let mut prev_dev = 0.0;
    for t in 0..total {
        if t > 0 {
            regime = rows[regime].sample(&mut rng);
        }
        let mean = params.regression_mean(regime, exog.as_ref().map(|x| x.row(t)));
        let y = mean + params.ar_coef(regime) * prev_dev + noise[regime].sample(&mut rng);
        if shape.order == 1 {
            prev_dev = y - mean;
        }
        if t >= opts.burn_in {
            endog[t - opts.burn_in] = y;
            regimes.push(regime);
        }
    }
    Ok(SimulatedPath { endog, regimes })
}
