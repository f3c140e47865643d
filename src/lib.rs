/*!
 * Detect changes in fire activity between two periods of satellite hotspot observations.
 *
 * Observations come from the NASA FIRMS service, either from CSV files already on disk or
 * downloaded with a [`FirmsClient`]. The [`detect_changes`] function matches the fires of the
 * second period against those of the first and reports each fire as new, growing, diminishing,
 * or extinguished.
 */
pub use change::{ChangeKind, ChangeSummary, DetectionResult, FireChange};
pub use detector::{
    detect_changes, DetectorConfig, FRP_CHANGE_THRESHOLD, FRP_NORMALIZATION_MW,
    PROXIMITY_THRESHOLD,
};
pub use error::{FireChangeResult, InvalidRequest, UpstreamError};
pub use firms::{FirmsClient, FirmsRequest, DEFAULT_SOURCE, FIRMS_BASE_URL, MAX_DAY_RANGE};
pub use geo::{BoundingBox, CellSearch, Coord, Geo};
pub use kml::{KmlFile, KmlWriter, KmzFile};
pub use observation::{
    load_csv_files, DayNight, FireObservation, VIIRS_HIGH_CONFIDENCE, VIIRS_LOW_CONFIDENCE,
    VIIRS_NOMINAL_CONFIDENCE,
};
pub use period::{parse_date, Period, DATE_FORMAT};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod change;
mod detector;
mod error;
mod firms;
mod geo;
mod kml;
mod observation;
mod period;
