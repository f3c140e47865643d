/*!
 * Requests to the NASA Fire Information for Resource Management System (FIRMS) area API.
 *
 * The area API is documented at https://firms.modaps.eosdis.nasa.gov/api/area/ and has the form
 *   [BASE_URL]/[MAP_KEY]/[SOURCE]/[WEST,SOUTH,EAST,NORTH]/[DAY_RANGE]/[DATE]
 * The date is optional, without it the most recent days are returned. Only 1 to 10 days can be
 * requested at a time.
 */
use crate::{
    error::{InvalidRequest, UpstreamError},
    geo::{BoundingBox, Geo},
    observation::FireObservation,
    period::{parse_date, Period},
    FireChangeResult,
};
use chrono::NaiveDate;
use log::{debug, info, warn};
use reqwest::{blocking::Client, StatusCode};
use std::{thread, time::Duration};

/// The FIRMS area API endpoint for CSV data.
pub const FIRMS_BASE_URL: &str = "https://firms.modaps.eosdis.nasa.gov/api/area/csv";

/// VIIRS on Suomi-NPP, near real time.
pub const DEFAULT_SOURCE: &str = "VIIRS_SNPP_NRT";

/// The most days the area API will return in one request.
pub const MAX_DAY_RANGE: u32 = 10;

/// Each period is requested with the full day range starting on the period start date.
const PERIOD_DAY_RANGE: u32 = MAX_DAY_RANGE;

const USER_AGENT: &str = "GeoWatch-App/1.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A request for the fires in an area over a range of days.
#[derive(Debug, Clone, PartialEq)]
pub struct FirmsRequest {
    pub base_url: String,
    /// The FIRMS map key, keep this private, it is rate limited.
    pub map_key: String,
    /// Satellite and instrument data set, e.g. "VIIRS_SNPP_NRT" or "MODIS_NRT".
    pub source: String,
    pub bounds: BoundingBox,
    /// Number of days of data, 1 through 10.
    pub day_range: u32,
    /// First day of data, YYYY-MM-DD. If `None`, the most recent data.
    pub date: Option<String>,
}

impl FirmsRequest {
    /// A request for the most recent day of data from the default source.
    pub fn new<S: Into<String>>(map_key: S, bounds: BoundingBox) -> Self {
        FirmsRequest {
            base_url: FIRMS_BASE_URL.to_owned(),
            map_key: map_key.into(),
            source: DEFAULT_SOURCE.to_owned(),
            bounds,
            day_range: 1,
            date: None,
        }
    }

    /// Check the request against what the API allows.
    pub fn validate(&self) -> FireChangeResult<()> {
        self.bounds.validate()?;

        if !(1..=MAX_DAY_RANGE).contains(&self.day_range) {
            return Err(InvalidRequest::new("Day range must be between 1 and 10.").into());
        }

        if let Some(date) = &self.date {
            parse_date(date)?;
        }

        Ok(())
    }

    /// Build the request URL.
    pub fn url(&self) -> String {
        let bbox = &self.bounds;
        let mut url = format!(
            "{}/{}/{}/{},{},{},{}/{}",
            self.base_url.trim_end_matches('/'),
            self.map_key,
            self.source,
            bbox.west,
            bbox.south,
            bbox.east,
            bbox.north,
            self.day_range
        );

        if let Some(date) = &self.date {
            url.push('/');
            url.push_str(date);
        }

        url
    }

    /// The request used to gather the fires for a period.
    pub fn for_period(&self, period: &Period) -> Self {
        FirmsRequest {
            day_range: PERIOD_DAY_RANGE,
            date: Some(period.start_date.clone()),
            ..self.clone()
        }
    }
}

/// A connection to the FIRMS server.
#[derive(Debug, Clone)]
pub struct FirmsClient {
    client: Client,
}

impl FirmsClient {
    pub fn new() -> FireChangeResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(FirmsClient { client })
    }

    /**
     * Download and parse the fires for a request.
     *
     * FIRMS answers with a 404 when there is no data for an area and time, so that is an empty
     * list and not an error.
     */
    pub fn fetch(&self, request: &FirmsRequest) -> FireChangeResult<Vec<FireObservation>> {
        request.validate()?;

        let url = request.url();
        debug!(
            "Fetching from FIRMS: {}",
            url.replace(&request.map_key, "<MAP_KEY>")
        );

        let response = self.client.get(&url).send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            info!("No fire data found for {} {}", request.source, request.bounds);
            return Ok(vec![]);
        }

        if !status.is_success() {
            return Err(UpstreamError {
                msg: format!("FIRMS API error: {}", status),
                status: Some(status.as_u16()),
            }
            .into());
        }

        let body = response.text()?;
        let observations = FireObservation::from_csv_reader(body.as_bytes())?;

        let outside = count_outside(&observations, &request.bounds);
        if outside > 0 {
            warn!(
                "{} of the fires from {} are outside the requested area {}",
                outside, request.source, request.bounds
            );
        }

        info!(
            "Retrieved {} fires from {} for {}",
            observations.len(),
            request.source,
            request.bounds
        );

        Ok(observations)
    }

    /**
     * Fetch the fires for two periods at the same time.
     *
     * Both downloads run on their own thread and both must finish before this returns.
     *
     * # Arguments
     * * base - the map key, source, and area to use. The day range and date are replaced for each
     *   period.
     * * period1 - the first period.
     * * period2 - the second period.
     */
    pub fn fetch_periods(
        &self,
        base: &FirmsRequest,
        period1: &Period,
        period2: &Period,
    ) -> FireChangeResult<(Vec<FireObservation>, Vec<FireObservation>)> {
        for period in [period1, period2] {
            let (start, end) = period.date_range()?;
            let missed = uncovered_days(start, end);
            if missed > 0 {
                warn!(
                    "Only the first {} days of {} are fetched, the last {} days are left out",
                    PERIOD_DAY_RANGE, period, missed
                );
            }
        }

        let request1 = base.for_period(period1);
        let request2 = base.for_period(period2);

        request1.validate()?;
        request2.validate()?;

        let (res1, res2) = thread::scope(|scope| {
            let jh1 = thread::Builder::new()
                .name("firechange-fetch-period1".to_owned())
                .spawn_scoped(scope, || self.fetch_to_string_err(&request1))?;
            let jh2 = thread::Builder::new()
                .name("firechange-fetch-period2".to_owned())
                .spawn_scoped(scope, || self.fetch_to_string_err(&request2))?;

            Ok::<_, std::io::Error>((join(jh1), join(jh2)))
        })?;

        Ok((res1?, res2?))
    }

    // Box<dyn Error> isn't Send, so it can't come back across a thread boundary as is.
    fn fetch_to_string_err(&self, request: &FirmsRequest) -> Result<Vec<FireObservation>, String> {
        self.fetch(request).map_err(|err| err.to_string())
    }
}

/// Count the observations that fall outside `bounds`, logging each one.
fn count_outside(observations: &[FireObservation], bounds: &BoundingBox) -> usize {
    observations
        .iter()
        .map(Geo::coord)
        .filter(|coord| !bounds.contains(*coord))
        .inspect(|coord| debug!("Fire at {} is outside {}", coord, bounds))
        .count()
}

/// The days at the end of an inclusive date range that a period request doesn't reach.
fn uncovered_days(start: NaiveDate, end: NaiveDate) -> i64 {
    let days = (end - start).num_days() + 1;
    (days - i64::from(PERIOD_DAY_RANGE)).max(0)
}

fn join(
    jh: thread::ScopedJoinHandle<'_, Result<Vec<FireObservation>, String>>,
) -> FireChangeResult<Vec<FireObservation>> {
    match jh.join() {
        Ok(res) => res.map_err(|msg| {
            UpstreamError {
                msg: format!("Failed to fetch fire data: {}", msg),
                status: None,
            }
            .into()
        }),
        Err(_) => Err(UpstreamError {
            msg: "Fire data download thread panicked".to_owned(),
            status: None,
        }
        .into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn request() -> FirmsRequest {
        FirmsRequest::new(
            "abc123",
            BoundingBox {
                west: -126.0,
                south: 21.0,
                east: -66.0,
                north: 50.0,
            },
        )
    }

    #[test]
    fn test_url() {
        let mut req = request();
        assert_eq!(
            req.url(),
            "https://firms.modaps.eosdis.nasa.gov/api/area/csv/abc123/VIIRS_SNPP_NRT/-126,21,-66,50/1"
        );

        req.day_range = 3;
        req.date = Some("2024-08-01".to_owned());
        req.source = "MODIS_NRT".to_owned();
        assert_eq!(
            req.url(),
            "https://firms.modaps.eosdis.nasa.gov/api/area/csv/abc123/MODIS_NRT/-126,21,-66,50/3/2024-08-01"
        );
    }

    #[test]
    fn test_validate_day_range() {
        let mut req = request();
        assert!(req.validate().is_ok());

        req.day_range = 0;
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Day range must be between 1 and 10.");

        req.day_range = 11;
        assert!(req.validate().is_err());

        req.day_range = 10;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_and_date() {
        let mut req = request();
        req.bounds.north = 95.0;
        assert!(req.validate().is_err());

        let mut req = request();
        req.date = Some("08/01/2024".to_owned());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_count_outside() {
        let bounds = request().bounds;
        let body = "\
latitude,longitude,brightness,scan,track,acq_date,acq_time,satellite,instrument,confidence,version,bright_t31,frp,daynight
40.0,-100.0,330.1,0.39,0.36,2024-08-01,0942,N,VIIRS,n,2.0NRT,290.2,5.0,D
21.0,-66.0,330.1,0.39,0.36,2024-08-01,0942,N,VIIRS,n,2.0NRT,290.2,5.0,D
55.0,-100.0,330.1,0.39,0.36,2024-08-01,0942,N,VIIRS,n,2.0NRT,290.2,5.0,D
40.0,-60.0,330.1,0.39,0.36,2024-08-01,0942,N,VIIRS,n,2.0NRT,290.2,5.0,D
";
        let observations = FireObservation::from_csv_reader(body.as_bytes()).unwrap();
        assert_eq!(observations.len(), 4);

        // The edges count as inside.
        assert_eq!(count_outside(&observations, &bounds), 2);
        assert_eq!(count_outside(&observations, &BoundingBox::WORLD), 0);
        assert_eq!(count_outside(&[], &bounds), 0);
    }

    #[test]
    fn test_uncovered_days() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();

        assert_eq!(uncovered_days(day(1), day(1)), 0);
        assert_eq!(uncovered_days(day(1), day(7)), 0);
        assert_eq!(uncovered_days(day(1), day(10)), 0);
        assert_eq!(uncovered_days(day(1), day(11)), 1);
        assert_eq!(uncovered_days(day(1), day(31)), 21);
    }

    #[test]
    fn test_for_period() {
        let period = crate::Period::new("2024-01-01", "2024-01-07", "first week");
        let req = request().for_period(&period);

        assert_eq!(req.day_range, MAX_DAY_RANGE);
        assert_eq!(req.date.as_deref(), Some("2024-01-01"));
        assert_eq!(req.map_key, "abc123");
        assert!(req.url().ends_with("/10/2024-01-01"));
    }
}
