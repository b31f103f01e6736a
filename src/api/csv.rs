use crate::coord::{bd09_to_wgs84, gcj02_to_wgs84};
use crate::od::{GridFlow, OdRecord, ZoneFlow};
use crate::traj::{Move, Stay, TrajPoint};
use crate::util::error::TransgridError;
use chrono::{DateTime, NaiveDateTime};
use geojson::FeatureReader;
use geo_types::{MultiLineString, MultiPolygon};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Coordinate reference system of input coordinates. Everything is
/// converted to WGS84 on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crs {
    /// WGS84 (EPSG:4326) - plain GPS longitude/latitude
    #[default]
    Wgs84,
    /// GCJ02 - the obfuscated system used by most Chinese map providers
    Gcj02,
    /// BD09 - Baidu's coordinate system
    Bd09,
}

impl Crs {
    fn to_wgs84(self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Crs::Wgs84 => (lon, lat),
            Crs::Gcj02 => gcj02_to_wgs84(lon, lat),
            Crs::Bd09 => bd09_to_wgs84(lon, lat),
        }
    }
}

/// Output format for geometry columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    /// Well-Known Text (e.g. "MULTILINESTRING((...))")
    Wkt,
    /// GeoJSON geometry object
    GeoJson,
}

/// How OD record weights are obtained from a CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WeightSource {
    /// Each row counts as one trip.
    #[default]
    Unweighted,
    /// Weights come from the named numeric column.
    Column(String),
}

/// Column mapping for a trajectory CSV.
///
/// # Example
///
/// ```
/// use transgrid::{Crs, TrajCsvConfig};
///
/// let config = TrajCsvConfig::new("VehicleNum", "Time", "Lng", "Lat").crs(Crs::Gcj02);
/// ```
#[derive(Debug, Clone)]
pub struct TrajCsvConfig {
    pub entity_column: String,
    pub time_column: String,
    pub lon_column: String,
    pub lat_column: String,
    pub crs: Crs,
}

impl TrajCsvConfig {
    pub fn new(
        entity: impl Into<String>,
        time: impl Into<String>,
        lon: impl Into<String>,
        lat: impl Into<String>,
    ) -> Self {
        Self {
            entity_column: entity.into(),
            time_column: time.into(),
            lon_column: lon.into(),
            lat_column: lat.into(),
            crs: Crs::default(),
        }
    }

    pub fn crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }
}

/// Column mapping for an OD CSV.
#[derive(Debug, Clone)]
pub struct OdCsvConfig {
    pub slon_column: String,
    pub slat_column: String,
    pub elon_column: String,
    pub elat_column: String,
    pub weight: WeightSource,
    pub crs: Crs,
}

impl OdCsvConfig {
    pub fn new(
        slon: impl Into<String>,
        slat: impl Into<String>,
        elon: impl Into<String>,
        elat: impl Into<String>,
    ) -> Self {
        Self {
            slon_column: slon.into(),
            slat_column: slat.into(),
            elon_column: elon.into(),
            elat_column: elat.into(),
            weight: WeightSource::default(),
            crs: Crs::default(),
        }
    }

    pub fn weight_column(mut self, column: impl Into<String>) -> Self {
        self.weight = WeightSource::Column(column.into());
        self
    }

    pub fn crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }
}

/// Parses a timestamp into epoch seconds: plain numeric seconds, RFC 3339,
/// `YYYY-MM-DD HH:MM:SS` or `YYYY/MM/DD HH:MM:SS`.
pub fn parse_time(s: &str) -> Result<f64, TransgridError> {
    let s = s.trim();
    if let Ok(seconds) = s.parse::<f64>() {
        return Ok(seconds);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_millis()) / 1000.0);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc().timestamp() as f64);
        }
    }
    Err(TransgridError::TimeParseError(s.to_string()))
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, TransgridError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| TransgridError::MissingColumn(name.to_string()))
}

fn parse_number(record: &csv::StringRecord, idx: usize) -> Result<f64, TransgridError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| TransgridError::CsvError(format!("missing field at index {}", idx)))?
        .trim();
    raw.parse()
        .map_err(|_| TransgridError::CsvError(format!("Invalid numeric value: '{}'", raw)))
}

/// Reads a trajectory point table from a CSV file, converting coordinates
/// to WGS84 and timestamps to epoch seconds.
pub fn read_traj_csv(
    path: impl AsRef<Path>,
    config: &TrajCsvConfig,
) -> Result<Vec<TrajPoint>, TransgridError> {
    let file = File::open(path).map_err(|e| TransgridError::IoError(e.to_string()))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| TransgridError::CsvError(e.to_string()))?
        .clone();
    let entity_idx = column_index(&headers, &config.entity_column)?;
    let time_idx = column_index(&headers, &config.time_column)?;
    let lon_idx = column_index(&headers, &config.lon_column)?;
    let lat_idx = column_index(&headers, &config.lat_column)?;

    let mut points = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| TransgridError::CsvError(e.to_string()))?;
        let entity = record
            .get(entity_idx)
            .ok_or_else(|| TransgridError::CsvError("missing entity field".to_string()))?;
        let time = parse_time(record.get(time_idx).unwrap_or_default())?;
        let lon = parse_number(&record, lon_idx)?;
        let lat = parse_number(&record, lat_idx)?;
        let (lon, lat) = config.crs.to_wgs84(lon, lat);
        points.push(TrajPoint::new(entity, time, lon, lat));
    }

    debug!("read_traj_csv: {} points", points.len());
    Ok(points)
}

/// Reads an OD pair table from a CSV file.
pub fn read_od_csv(
    path: impl AsRef<Path>,
    config: &OdCsvConfig,
) -> Result<Vec<OdRecord>, TransgridError> {
    let file = File::open(path).map_err(|e| TransgridError::IoError(e.to_string()))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| TransgridError::CsvError(e.to_string()))?
        .clone();
    let slon_idx = column_index(&headers, &config.slon_column)?;
    let slat_idx = column_index(&headers, &config.slat_column)?;
    let elon_idx = column_index(&headers, &config.elon_column)?;
    let elat_idx = column_index(&headers, &config.elat_column)?;
    let weight_idx = match &config.weight {
        WeightSource::Unweighted => None,
        WeightSource::Column(name) => Some(column_index(&headers, name)?),
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| TransgridError::CsvError(e.to_string()))?;
        let (slon, slat) = config
            .crs
            .to_wgs84(parse_number(&record, slon_idx)?, parse_number(&record, slat_idx)?);
        let (elon, elat) = config
            .crs
            .to_wgs84(parse_number(&record, elon_idx)?, parse_number(&record, elat_idx)?);

        let mut od = OdRecord::new(slon, slat, elon, elat);
        if let Some(idx) = weight_idx {
            od = od.with_weight(parse_number(&record, idx)?);
        }
        records.push(od);
    }

    debug!("read_od_csv: {} records", records.len());
    Ok(records)
}

fn geometry_string(geometry: &MultiLineString<f64>, format: GeometryFormat) -> String {
    match format {
        GeometryFormat::Wkt => {
            use wkt::ToWkt;
            geometry.wkt_string()
        }
        GeometryFormat::GeoJson => geojson::Geometry::from(geometry).to_string(),
    }
}

/// Writes grid flows with a geometry column in the requested format.
pub fn write_flows_csv(
    path: impl AsRef<Path>,
    flows: &[GridFlow],
    format: GeometryFormat,
) -> Result<(), TransgridError> {
    let file = File::create(path).map_err(|e| TransgridError::IoError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(["scol", "srow", "ecol", "erow", "weight", "geometry"])
        .map_err(|e| TransgridError::CsvError(e.to_string()))?;
    for flow in flows {
        writer
            .write_record([
                flow.scol.to_string(),
                flow.srow.to_string(),
                flow.ecol.to_string(),
                flow.erow.to_string(),
                flow.weight.to_string(),
                geometry_string(&flow.geometry, format),
            ])
            .map_err(|e| TransgridError::CsvError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| TransgridError::CsvError(e.to_string()))
}

/// Writes zone flows with a geometry column in the requested format.
pub fn write_zone_flows_csv(
    path: impl AsRef<Path>,
    flows: &[ZoneFlow],
    format: GeometryFormat,
) -> Result<(), TransgridError> {
    let file = File::create(path).map_err(|e| TransgridError::IoError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(["origin_zone", "dest_zone", "weight", "geometry"])
        .map_err(|e| TransgridError::CsvError(e.to_string()))?;
    for flow in flows {
        writer
            .write_record([
                flow.origin_zone.clone(),
                flow.dest_zone.clone(),
                flow.weight.to_string(),
                geometry_string(&flow.geometry, format),
            ])
            .map_err(|e| TransgridError::CsvError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| TransgridError::CsvError(e.to_string()))
}

/// Writes stays as a plain CSV table.
pub fn write_stays_csv(path: impl AsRef<Path>, stays: &[Stay]) -> Result<(), TransgridError> {
    let file = File::create(path).map_err(|e| TransgridError::IoError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record([
            "entity", "stime", "etime", "col", "row", "lon", "lat", "duration",
        ])
        .map_err(|e| TransgridError::CsvError(e.to_string()))?;
    for stay in stays {
        writer
            .write_record([
                stay.entity.clone(),
                stay.stime.to_string(),
                stay.etime.to_string(),
                stay.col.to_string(),
                stay.row.to_string(),
                stay.lon.to_string(),
                stay.lat.to_string(),
                stay.duration.to_string(),
            ])
            .map_err(|e| TransgridError::CsvError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| TransgridError::CsvError(e.to_string()))
}

/// Writes moves as a plain CSV table.
pub fn write_moves_csv(path: impl AsRef<Path>, moves: &[Move]) -> Result<(), TransgridError> {
    let file = File::create(path).map_err(|e| TransgridError::IoError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record([
            "entity", "stime", "etime", "scol", "srow", "ecol", "erow", "slon", "slat", "elon",
            "elat", "duration",
        ])
        .map_err(|e| TransgridError::CsvError(e.to_string()))?;
    for mv in moves {
        writer
            .write_record([
                mv.entity.clone(),
                mv.stime.to_string(),
                mv.etime.to_string(),
                mv.scol.to_string(),
                mv.srow.to_string(),
                mv.ecol.to_string(),
                mv.erow.to_string(),
                mv.slon.to_string(),
                mv.slat.to_string(),
                mv.elon.to_string(),
                mv.elat.to_string(),
                mv.duration.to_string(),
            ])
            .map_err(|e| TransgridError::CsvError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| TransgridError::CsvError(e.to_string()))
}

/// Loads named polygon zones from a GeoJSON feature collection, keyed by
/// the `name_key` property. Polygon features are promoted to multipolygons;
/// other geometry types are rejected.
pub fn load_zones(
    path: impl AsRef<Path>,
    name_key: &str,
) -> Result<Vec<(String, MultiPolygon<f64>)>, TransgridError> {
    let file = File::open(path).map_err(|e| TransgridError::IoError(e.to_string()))?;
    let reader = FeatureReader::from_reader(BufReader::new(file));

    let mut zones = Vec::new();
    for feature in reader.features() {
        let feature = feature.map_err(|e| TransgridError::GeometryParseError(e.to_string()))?;
        // Zone ids in the wild are strings or bare numbers.
        let name = match feature.property(name_key) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => return Err(TransgridError::MissingColumn(name_key.to_string())),
        };
        let geometry = feature.geometry.ok_or_else(|| {
            TransgridError::GeometryParseError(format!("zone '{}' has no geometry", name))
        })?;
        let geometry: geo_types::Geometry<f64> = geometry
            .try_into()
            .map_err(|e: geojson::Error| TransgridError::GeometryParseError(e.to_string()))?;
        match geometry {
            geo_types::Geometry::MultiPolygon(mp) => zones.push((name, mp)),
            geo_types::Geometry::Polygon(p) => zones.push((name, p.into())),
            _ => {
                return Err(TransgridError::GeometryParseError(format!(
                    "zone '{}' is not a polygon",
                    name
                )));
            }
        }
    }

    debug!("load_zones: {} zones", zones.len());
    Ok(zones)
}
