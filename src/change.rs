/*!
 * The output of comparing two periods of fire observations.
 */
use crate::{
    kml::{KmlFile, KmlWriter, KmzFile},
    period::{parse_date, Period},
    FireChangeResult,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Write},
    path::Path,
};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

/** What happened to a fire between the two periods. */
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeKind {
    /// Detected in the second period with nothing nearby in the first.
    New,
    /// Matched across periods with a large increase in radiative power.
    Growing,
    /// Matched across periods with a large decrease in radiative power.
    Diminishing,
    /// Detected in the first period and not matched by anything in the second.
    Extinguished,
}

impl ChangeKind {
    /// A human readable name for the kind of change.
    pub fn description(self) -> &'static str {
        use ChangeKind::*;

        match self {
            New => "New Fires",
            Growing => "Growing Fires",
            Diminishing => "Diminishing Fires",
            Extinguished => "Extinguished Fires",
        }
    }

    /// Icon color on a map, KML aabbggrr.
    fn kml_color(self) -> &'static str {
        use ChangeKind::*;

        match self {
            New => "ff0000ff",
            Growing => "ff0080ff",
            Diminishing => "ff00ffff",
            Extinguished => "ff808080",
        }
    }
}

/**
 * A single change in fire activity between two periods.
 *
 * For `New` events only the after values are known, and for `Extinguished` events only the
 * before values are known. The first/last detected dates are acquisition dates copied from the
 * observations involved.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireChange {
    /// Built from the kind and the rounded location, so it is only unique as long as two fires of
    /// the same kind don't round to the same spot.
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "changeType")]
    pub kind: ChangeKind,
    /// Size of the change scaled to the range 0 to 1.
    pub intensity: f64,
    /// Fire radiative power in the first period, megawatts.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub before_frp: Option<f64>,
    /// Fire radiative power in the second period, megawatts.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub after_frp: Option<f64>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub first_detected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_detected: Option<String>,
}

impl FireChange {
    /// Build the identifier for a change of `kind` at a location.
    pub fn make_id(kind: ChangeKind, latitude: f64, longitude: f64) -> String {
        format!("{}_{:.5}_{:.5}", kind, latitude, longitude)
    }

    /// Format a description of this change for a map pop up.
    fn describe(&self, buffer: &mut String) {
        buffer.clear();

        let _ = write!(buffer, "Change: {}<br/>", self.kind);
        if let Some(before_frp) = self.before_frp {
            let _ = write!(buffer, "Power Before: {:.1} MW<br/>", before_frp);
        }
        if let Some(after_frp) = self.after_frp {
            let _ = write!(buffer, "Power After: {:.1} MW<br/>", after_frp);
        }
        let _ = write!(buffer, "Intensity: {:.2}<br/>", self.intensity);
        let _ = write!(buffer, "Confidence: {:.0}<br/>", self.confidence);
        if let Some(first) = &self.first_detected {
            let _ = write!(buffer, "First Detected: {}<br/>", first);
        }
        if let Some(last) = &self.last_detected {
            let _ = write!(buffer, "Last Detected: {}<br/>", last);
        }
    }
}

/// Counts of each kind of change in a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub new_fires: usize,
    pub growing_fires: usize,
    pub diminishing_fires: usize,
    pub extinguished_fires: usize,
    pub total_changes: usize,
}

impl ChangeSummary {
    /// Count up the changes.
    pub fn tally(changes: &[FireChange]) -> Self {
        changes
            .iter()
            .fold(ChangeSummary::default(), |mut summary, change| {
                match change.kind {
                    ChangeKind::New => summary.new_fires += 1,
                    ChangeKind::Growing => summary.growing_fires += 1,
                    ChangeKind::Diminishing => summary.diminishing_fires += 1,
                    ChangeKind::Extinguished => summary.extinguished_fires += 1,
                }
                summary.total_changes += 1;
                summary
            })
    }

    /// Get the count for a single kind of change.
    pub fn count(&self, kind: ChangeKind) -> usize {
        match kind {
            ChangeKind::New => self.new_fires,
            ChangeKind::Growing => self.growing_fires,
            ChangeKind::Diminishing => self.diminishing_fires,
            ChangeKind::Extinguished => self.extinguished_fires,
        }
    }
}

impl Display for ChangeSummary {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "         New Fires: {:6}", self.new_fires)?;
        writeln!(f, "     Growing Fires: {:6}", self.growing_fires)?;
        writeln!(f, " Diminishing Fires: {:6}", self.diminishing_fires)?;
        writeln!(f, "Extinguished Fires: {:6}", self.extinguished_fires)?;
        writeln!(f, "     Total Changes: {:6}", self.total_changes)
    }
}

/**
 * Everything found when comparing two periods.
 *
 * Changes are ordered with the events from the second period first, in the order those
 * observations were given, followed by the extinguished fires in the order of the first period.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub period1: Period,
    pub period2: Period,
    pub changes: Vec<FireChange>,
    pub summary: ChangeSummary,
}

impl DetectionResult {
    /// Iterate over the changes of a single kind.
    pub fn changes_of(&self, kind: ChangeKind) -> impl Iterator<Item = &FireChange> {
        self.changes.iter().filter(move |change| change.kind == kind)
    }

    /// Save the changes as KML, zipped if the file extension is "kmz".
    pub fn save_kml<P: AsRef<Path>>(&self, path: P) -> FireChangeResult<()> {
        let path = path.as_ref();

        let is_kmz = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("kmz"))
            .unwrap_or(false);

        if is_kmz {
            let mut kmz = KmzFile::new(path)?;
            self.kml_write(&mut kmz)
        } else {
            let mut kml = KmlFile::new(path)?;
            self.kml_write(&mut kml)
        }
    }

    /// Write a folder for each kind of change, and a placemark for each change.
    pub fn kml_write<K: KmlWriter>(&self, kml: &mut K) -> FireChangeResult<()> {
        const ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/firedept.png";

        for kind in ChangeKind::iter() {
            let name: &'static str = kind.into();
            kml.start_style(Some(name))?;
            kml.create_icon_style(Some(ICON), Some(kind.kml_color()), 1.0)?;
            kml.finish_style()?;
        }

        let mut description = String::with_capacity(256);
        let mut style_url = String::with_capacity(32);
        for kind in ChangeKind::iter() {
            description.clear();
            let _ = write!(
                &mut description,
                "{}<br/>{}",
                self.period1, self.period2
            );
            kml.start_folder(Some(kind.description()), Some(&description), false)?;

            style_url.clear();
            let _ = write!(&mut style_url, "#{}", kind);

            for change in self.changes_of(kind) {
                description.clear();
                change.describe(&mut description);

                kml.start_placemark(Some(&change.id), Some(&description), Some(&style_url))?;

                let start = change
                    .first_detected
                    .as_deref()
                    .and_then(|date| parse_date(date).ok());
                let end = change
                    .last_detected
                    .as_deref()
                    .and_then(|date| parse_date(date).ok());
                kml.timespan(start, end)?;

                kml.create_point(change.latitude, change.longitude, 0.0)?;
                kml.finish_placemark()?;
            }

            kml.finish_folder()?;
        }

        Ok(())
    }
}
