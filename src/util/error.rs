/// Error type for transgrid operations.
#[derive(Debug, PartialEq)]
pub enum TransgridError {
    /// The target cell size is not a positive, finite number of meters.
    InvalidAccuracy(f64),
    /// A bounds coordinate is NaN or infinite.
    InvalidBounds(String),
    /// The geohash precision must be at least one character.
    InvalidPrecision(usize),
    /// The geohash string contains a character outside the base-32 alphabet.
    InvalidGeohash(char),
    /// An empty table was passed to an aggregation or join operation.
    EmptyInput(&'static str),
    /// A required column is missing from the input table.
    MissingColumn(String),
    /// A timestamp value could not be parsed.
    TimeParseError(String),
    /// CSV parsing or reading error.
    CsvError(String),
    /// File I/O error.
    IoError(String),
    /// Failed to parse geometry (GeoJSON or WKT).
    GeometryParseError(String),
}

impl std::fmt::Display for TransgridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransgridError::InvalidAccuracy(a) => {
                write!(f, "Cell size must be a positive number of meters, got {}", a)
            }
            TransgridError::InvalidBounds(msg) => write!(f, "Invalid bounds: {}", msg),
            TransgridError::InvalidPrecision(p) => write!(f, "Invalid geohash precision: {}", p),
            TransgridError::InvalidGeohash(c) => {
                write!(f, "Invalid geohash character: '{}'", c)
            }
            TransgridError::EmptyInput(what) => write!(f, "Empty input: {}", what),
            TransgridError::MissingColumn(col) => write!(f, "Column '{}' not found", col),
            TransgridError::TimeParseError(msg) => write!(f, "Cannot parse timestamp: {}", msg),
            TransgridError::CsvError(msg) => write!(f, "CSV error: {}", msg),
            TransgridError::IoError(msg) => write!(f, "IO error: {}", msg),
            TransgridError::GeometryParseError(msg) => write!(f, "Geometry parse error: {}", msg),
        }
    }
}

impl std::error::Error for TransgridError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TransgridError::InvalidAccuracy(-500.0);
        assert!(err.to_string().contains("-500"));

        let err = TransgridError::MissingColumn("Lng".to_string());
        assert_eq!(err.to_string(), "Column 'Lng' not found");
    }
}
