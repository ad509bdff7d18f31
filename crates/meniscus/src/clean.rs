//! Outlier removal and gap interpolation for one volume column.
//!
//! Steps: ceiling mask → mean/std over non-gap samples → z-score mask →
//! linear interpolation across interior gaps. Gap runs touching either end of
//! the series have only one neighbour and are left missing.

/// Default absolute z-score above which a sample is an outlier.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;
/// Physical ceiling used by the legacy cleaning preset.
pub const LEGACY_PLAUSIBLE_CEILING: f64 = 7.0;

/// Which samples feed the mean/std estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsBasis {
    /// Statistics over samples that survived the ceiling mask.
    #[default]
    Masked,
    /// Statistics over all finite input samples, ceiling applied afterwards.
    Raw,
}

/// Series cleaner configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Samples strictly above this are treated as missing.
    pub max_plausible_volume: Option<f64>,
    /// Samples with `|z| > z_threshold` are treated as missing.
    pub z_threshold: f64,
    pub statistics: StatisticsBasis,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            max_plausible_volume: None,
            z_threshold: DEFAULT_Z_THRESHOLD,
            statistics: StatisticsBasis::Masked,
        }
    }
}

impl CleanerConfig {
    /// Fixed ceiling of 7 volume units plus the default z threshold.
    pub fn legacy() -> Self {
        Self {
            max_plausible_volume: Some(LEGACY_PLAUSIBLE_CEILING),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(format!("z_threshold must be positive (got {})", self.z_threshold));
        }
        if let Some(c) = self.max_plausible_volume {
            if !c.is_finite() {
                return Err(format!("max_plausible_volume must be finite (got {})", c));
            }
        }
        Ok(())
    }
}

/// Counts collected while cleaning one column.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CleanReport {
    pub n_samples: usize,
    /// Missing or non-finite on input.
    pub n_input_gaps: usize,
    /// Masked by the plausibility ceiling.
    pub n_above_ceiling: usize,
    /// Masked by the z-score test.
    pub n_outliers: usize,
    /// Gaps filled by interpolation.
    pub n_filled: usize,
    /// Gaps left missing (no neighbour on one side).
    pub n_unfilled: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
}

/// Population mean and standard deviation of the present samples.
fn mean_std(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

/// Fill interior `None` runs by linear interpolation over the index axis.
///
/// Returns the number of filled samples.
pub(crate) fn interpolate_gaps(values: &mut [Option<f64>]) -> usize {
    let mut filled = 0;
    let mut prev: Option<usize> = None;
    for i in 0..values.len() {
        let Some(right) = values[i] else {
            continue;
        };
        if let Some(p) = prev {
            if i > p + 1 {
                let left = values[p].unwrap_or(right);
                let span = (i - p) as f64;
                for (k, slot) in values[p + 1..i].iter_mut().enumerate() {
                    let t = (k + 1) as f64 / span;
                    *slot = Some(left + t * (right - left));
                    filled += 1;
                }
            }
        }
        prev = Some(i);
    }
    filled
}

/// Cleans volume columns with one fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct SeriesCleaner {
    config: CleanerConfig,
}

impl SeriesCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Clean one column. `None` entries are gaps on input.
    pub fn clean(&self, values: &[Option<f64>]) -> (Vec<Option<f64>>, CleanReport) {
        let cfg = &self.config;
        let mut report = CleanReport {
            n_samples: values.len(),
            ..Default::default()
        };

        let input: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        report.n_input_gaps = input.iter().filter(|v| v.is_none()).count();

        let mut masked = input.clone();
        if let Some(ceiling) = cfg.max_plausible_volume {
            for slot in masked.iter_mut() {
                if slot.is_some_and(|v| v > ceiling) {
                    *slot = None;
                    report.n_above_ceiling += 1;
                }
            }
        }

        let basis = match cfg.statistics {
            StatisticsBasis::Masked => &masked,
            StatisticsBasis::Raw => &input,
        };
        if let Some((mean, std_dev)) = mean_std(basis) {
            report.mean = Some(mean);
            report.std_dev = Some(std_dev);
            if std_dev > 0.0 && std_dev.is_finite() {
                for slot in masked.iter_mut() {
                    if slot.is_some_and(|v| ((v - mean) / std_dev).abs() > cfg.z_threshold) {
                        *slot = None;
                        report.n_outliers += 1;
                    }
                }
            }
        }

        report.n_filled = interpolate_gaps(&mut masked);
        report.n_unfilled = masked.iter().filter(|v| v.is_none()).count();
        (masked, report)
    }
}
