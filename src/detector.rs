/*!
 * Compare fire observations from two periods over the same area.
 *
 * Every observation in the second period is matched to the closest observation from the first
 * period that is within a small distance of it. Matched pairs with a large enough relative change
 * in fire radiative power (FRP) are reported as growing or diminishing, unmatched observations in
 * the second period are new fires, and observations in the first period that nothing matched are
 * extinguished fires.
 */
use crate::{
    change::{ChangeKind, ChangeSummary, DetectionResult, FireChange},
    geo::{CellSearch, Geo, GridIndex},
    observation::FireObservation,
    period::Period,
};

/// Maximum distance in decimal degrees (about 1.1 km at the equator) between two observations
/// for them to be considered the same fire.
pub const PROXIMITY_THRESHOLD: f64 = 0.01;

/// Minimum relative change in FRP, `|after - before| / before`, for a matched pair to be reported.
pub const FRP_CHANGE_THRESHOLD: f64 = 0.20;

/// FRP that maps to an intensity of 1 for new and extinguished fires, megawatts.
pub const FRP_NORMALIZATION_MW: f64 = 100.0;

/// Smallest grid cell used for matching, degrees (about 10 cm).
const MIN_CELL_SIZE: f64 = 1.0e-6;

/// Tunable parameters for change detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Observations must be strictly closer than this (degrees) to be matched.
    pub proximity_threshold: f64,
    /// Matched pairs must have a relative FRP change strictly larger than this to be reported.
    pub frp_change_threshold: f64,
    /// Scale for the intensity of new and extinguished fires, megawatts.
    pub frp_normalization_mw: f64,
    /// Which grid cells to search for a match.
    pub cell_search: CellSearch,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            proximity_threshold: PROXIMITY_THRESHOLD,
            frp_change_threshold: FRP_CHANGE_THRESHOLD,
            frp_normalization_mw: FRP_NORMALIZATION_MW,
            cell_search: CellSearch::Neighborhood,
        }
    }
}

/// Compare two periods of fire observations using the default configuration.
pub fn detect_changes(
    period1_fires: &[FireObservation],
    period2_fires: &[FireObservation],
    period1: Period,
    period2: Period,
) -> DetectionResult {
    DetectorConfig::default().detect(period1_fires, period2_fires, period1, period2)
}

impl DetectorConfig {
    /**
     * Compare two periods of fire observations.
     *
     * This is a pure function of its inputs, the periods are only echoed back in the result.
     *
     * # Arguments
     * * before - observations from the first (earlier) period.
     * * after - observations from the second period.
     * * period1 - the period `before` was observed in.
     * * period2 - the period `after` was observed in.
     */
    pub fn detect(
        &self,
        before: &[FireObservation],
        after: &[FireObservation],
        period1: Period,
        period2: Period,
    ) -> DetectionResult {
        // Cells at least as wide as the search radius means a neighborhood search can't miss a
        // match.
        let cell_size = if self.proximity_threshold.is_finite() && self.proximity_threshold > 0.0 {
            self.proximity_threshold.max(MIN_CELL_SIZE)
        } else {
            PROXIMITY_THRESHOLD
        };
        let index = GridIndex::build_for(before, cell_size, self.cell_search);

        let matches: Vec<Option<usize>> = after
            .iter()
            .map(|fire| index.nearest_within(fire.coord(), self.proximity_threshold))
            .collect();

        let matched: Vec<bool> = matches.iter().flatten().fold(
            vec![false; before.len()],
            |mut matched, &i| {
                matched[i] = true;
                matched
            },
        );

        let ongoing = after
            .iter()
            .zip(&matches)
            .filter_map(|(after_fire, found)| match found {
                Some(i) => self.compare(&before[*i], after_fire),
                None => Some(self.new_fire(after_fire)),
            });

        let gone = before
            .iter()
            .zip(&matched)
            .filter(|(_, was_matched)| !**was_matched)
            .map(|(before_fire, _)| self.extinguished_fire(before_fire));

        let changes: Vec<FireChange> = ongoing.chain(gone).collect();
        let summary = ChangeSummary::tally(&changes);

        DetectionResult {
            period1,
            period2,
            changes,
            summary,
        }
    }

    /// Classify a matched pair, `None` if the change in power is too small to report.
    ///
    /// When the first period power is zero (or so close to zero that the relative change isn't a
    /// finite number) there is no usable relative change. The pair is then reported by the
    /// direction of the change in power at full intensity, or not at all if the power is equal.
    fn compare(&self, before: &FireObservation, after: &FireObservation) -> Option<FireChange> {
        let frp_diff = after.frp - before.frp;
        let frp_change = frp_diff / before.frp;

        let (kind, intensity) = if before.frp > 0.0 && frp_change.is_finite() {
            if frp_change.abs() <= self.frp_change_threshold {
                return None;
            }

            let kind = if frp_change > 0.0 {
                ChangeKind::Growing
            } else {
                ChangeKind::Diminishing
            };

            (kind, unit_clamp(frp_change.abs()))
        } else if frp_diff > 0.0 {
            (ChangeKind::Growing, 1.0)
        } else if frp_diff < 0.0 {
            (ChangeKind::Diminishing, 1.0)
        } else {
            return None;
        };

        Some(FireChange {
            id: FireChange::make_id(kind, after.latitude, after.longitude),
            latitude: after.latitude,
            longitude: after.longitude,
            kind,
            intensity,
            before_frp: Some(before.frp),
            after_frp: Some(after.frp),
            confidence: after.confidence.min(before.confidence),
            first_detected: Some(before.acq_date.clone()),
            last_detected: Some(after.acq_date.clone()),
        })
    }

    fn new_fire(&self, fire: &FireObservation) -> FireChange {
        let kind = ChangeKind::New;

        FireChange {
            id: FireChange::make_id(kind, fire.latitude, fire.longitude),
            latitude: fire.latitude,
            longitude: fire.longitude,
            kind,
            intensity: unit_clamp(fire.frp / self.frp_normalization_mw),
            before_frp: None,
            after_frp: Some(fire.frp),
            confidence: fire.confidence,
            first_detected: Some(fire.acq_date.clone()),
            last_detected: None,
        }
    }

    fn extinguished_fire(&self, fire: &FireObservation) -> FireChange {
        let kind = ChangeKind::Extinguished;

        FireChange {
            id: FireChange::make_id(kind, fire.latitude, fire.longitude),
            latitude: fire.latitude,
            longitude: fire.longitude,
            kind,
            intensity: unit_clamp(fire.frp / self.frp_normalization_mw),
            before_frp: Some(fire.frp),
            after_frp: None,
            confidence: fire.confidence,
            first_detected: None,
            last_detected: Some(fire.acq_date.clone()),
        }
    }
}

/// Clamp to [0, 1], NaN goes to 0.
fn unit_clamp(val: f64) -> f64 {
    if val.is_nan() {
        0.0
    } else {
        val.clamp(0.0, 1.0)
    }
}
