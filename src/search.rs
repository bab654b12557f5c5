//! Coarse-to-fine beam search over a lattice.
//!
//! Score every valid sample at resolution 0, then repeatedly keep the best
//! `beam_size`, expand them one level down and re-score the children, until
//! `nresl` resolutions have been evaluated.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::expand::{expand_top_n_separate, rank_desc, ExpandConfig};
use crate::hierarchy::Hierarchy;
use crate::zorder::Address;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scores a batch of lattice values at one resolution. Higher is better.
pub trait Evaluator<V> {
    /// One score per value, in order.
    fn evaluate(&mut self, values: &[V], resl: u32) -> Vec<f64>;
}

impl<V, F> Evaluator<V> for F
where
    F: FnMut(&[V], u32) -> Vec<f64>,
{
    fn evaluate(&mut self, values: &[V], resl: u32) -> Vec<f64> {
        self(values, resl)
    }
}

/// Parameters for [`hier_search`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchConfig {
    /// Parents kept at each stage.
    pub beam_size: usize,
    /// Resolutions evaluated, starting at 0.
    pub nresl: u32,
    /// Score meaning "no sample"; such samples are never expanded.
    pub null_score: f64,
    /// Expand on the rayon pool.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            beam_size: 1000,
            nresl: 4,
            null_score: 0.0,
            parallel: true,
        }
    }
}

impl SearchConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the beam width.
    pub fn with_beam_size(mut self, beam_size: usize) -> Self {
        self.beam_size = beam_size;
        self
    }

    /// Set how many resolutions to evaluate.
    pub fn with_nresl(mut self, nresl: u32) -> Self {
        self.nresl = nresl;
        self
    }

    /// Set the sentinel score.
    pub fn with_null_score(mut self, null_score: f64) -> Self {
        self.null_score = null_score;
        self
    }

    /// Enable or disable parallel expansion.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn expand_config(&self) -> ExpandConfig {
        ExpandConfig::new(self.beam_size)
            .with_null_score(self.null_score)
            .with_parallel(self.parallel)
    }
}

/// What one resolution of the search did.
#[derive(Debug, Clone, PartialEq)]
pub struct StageStats {
    /// Resolution evaluated.
    pub resl: u32,
    /// Samples scored.
    pub nevaluated: usize,
    /// Best score seen (NaN if nothing was scored).
    pub best_score: f64,
    /// Wall time for expansion plus scoring.
    pub elapsed: Duration,
}

/// Final stage of a search.
#[derive(Debug, Clone)]
pub struct SearchResult<I, V> {
    /// Addresses scored at the last resolution.
    pub indices: Vec<I>,
    /// Their values.
    pub values: Vec<V>,
    /// Their scores.
    pub scores: Vec<f64>,
    /// One entry per resolution, coarsest first.
    pub stats: Vec<StageStats>,
}

impl<I: Copy, V> SearchResult<I, V> {
    /// Resolution of the final stage.
    pub fn resl(&self) -> u32 {
        self.stats.last().map_or(0, |s| s.resl)
    }

    /// Positions of the samples, best score first (NaN last).
    pub fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.scores.len()).collect();
        order.sort_by(|&a, &b| rank_desc(self.scores[a], self.scores[b]));
        order
    }

    /// Best `(score, address)`, if any sample was scored.
    pub fn best(&self) -> Option<(f64, I)> {
        self.ranked()
            .first()
            .map(|&i| (self.scores[i], self.indices[i]))
    }
}

/// Run a beam search over `h`, scoring with `evaluator`.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] if `nresl` or `beam_size` is zero.
/// - [`Error::ResolutionOutOfRange`] if `nresl - 1` exceeds the lattice's `max_resl`.
/// - [`Error::EmptyInput`] if no address resolves at resolution 0.
/// - [`Error::DimensionMismatch`] if the evaluator returns the wrong number of scores.
pub fn hier_search<H, E>(
    h: &H,
    evaluator: &mut E,
    cfg: &SearchConfig,
) -> Result<SearchResult<H::Index, H::Value>>
where
    H: Hierarchy,
    E: Evaluator<H::Value>,
{
    if cfg.nresl == 0 {
        return Err(Error::InvalidParameter {
            name: "nresl",
            message: "search needs at least one resolution".into(),
        });
    }
    if cfg.beam_size == 0 {
        return Err(Error::InvalidParameter {
            name: "beam_size",
            message: "beam must keep at least one sample".into(),
        });
    }
    h.check_resl(cfg.nresl - 1)?;

    let start = Instant::now();
    let ncell = h.ncell().to_u64_lossless();
    let mut indices = Vec::new();
    let mut values = Vec::new();
    for i in 0..ncell {
        let index = H::Index::from_u64_truncating(i);
        if let Some(v) = h.get_value(0, index) {
            indices.push(index);
            values.push(v);
        }
    }
    if indices.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut scores = score(evaluator, &values, 0)?;
    let mut stats = vec![stage_stats(0, &scores, start)];

    let expand_cfg = cfg.expand_config();
    for resl in 1..cfg.nresl {
        let start = Instant::now();
        let expansion = expand_top_n_separate(h, resl - 1, &scores, &indices, &expand_cfg)?;
        (indices, values) = expansion.into_parts();
        scores = score(evaluator, &values, resl)?;
        stats.push(stage_stats(resl, &scores, start));
    }

    Ok(SearchResult {
        indices,
        values,
        scores,
        stats,
    })
}

fn score<V, E: Evaluator<V>>(evaluator: &mut E, values: &[V], resl: u32) -> Result<Vec<f64>> {
    let scores = evaluator.evaluate(values, resl);
    if scores.len() != values.len() {
        return Err(Error::DimensionMismatch {
            expected: values.len(),
            found: scores.len(),
        });
    }
    Ok(scores)
}

fn stage_stats(resl: u32, scores: &[f64], start: Instant) -> StageStats {
    let best_score = scores
        .iter()
        .copied()
        .filter(|s| !s.is_nan())
        .fold(f64::NAN, f64::max);
    let stats = StageStats {
        resl,
        nevaluated: scores.len(),
        best_score,
        elapsed: start.elapsed(),
    };
    tracing::debug!(
        resl,
        nsamples = stats.nevaluated,
        best = stats.best_score,
        elapsed_ms = stats.elapsed.as_secs_f64() * 1e3,
        "search stage"
    );
    stats
}
