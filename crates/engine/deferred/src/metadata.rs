//! Filename-encoded scene parameters
//!
//! Dataset files carry their viewing parameters in the name:
//! `<prefix>_<secondary>_<iso>_<elevation>_<azimuth>[.ext]`. Fields are
//! read from the right so the prefix may itself contain the delimiter.

use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigParseError;
use crate::units::Degrees;

pub const FIELD_DELIMITER: char = '_';

/// Positional fields from right to left
const FIELDS: [&str; 4] = ["azimuth", "elevation", "iso value", "secondary"];

/// Parameters decoded from a dataset filename
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilenameMetadata {
    /// Second scalar parameter of the dataset (meaning is dataset specific)
    pub secondary: f32,
    pub iso_value: f32,
    pub elevation: Degrees,
    pub azimuth: Degrees,
}

impl FilenameMetadata {
    /// Parse a bare filename such as `A_1.5_20.000000_90.0_100.0.h5`
    pub fn parse(name: &str) -> Result<Self, ConfigParseError> {
        let stem = strip_extension(name);
        let mut fields = stem.rsplitn(FIELDS.len() + 1, FIELD_DELIMITER);

        let mut values = [0.0_f32; 4];
        for (slot, field) in values.iter_mut().zip(FIELDS) {
            let raw = fields
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ConfigParseError::MissingField {
                    name: name.to_string(),
                    field,
                })?;
            *slot = raw
                .trim()
                .parse::<f32>()
                .map_err(|_| ConfigParseError::InvalidNumber {
                    name: name.to_string(),
                    field,
                    value: raw.to_string(),
                })?;
        }

        let [azimuth, elevation, iso_value, secondary] = values;
        Ok(Self {
            secondary,
            iso_value,
            elevation: Degrees(elevation),
            azimuth: Degrees(azimuth),
        })
    }

    /// Parse the final component of a dataset path
    pub fn from_path(path: &Path) -> Result<Self, ConfigParseError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .ok_or_else(|| ConfigParseError::MissingField {
                name: path.display().to_string(),
                field: "file name",
            })?;
        Self::parse(&name)
    }

    /// Whether a dataset path carries encoded fields at all
    ///
    /// Names like `res.h5` have none; names with fields that fail to parse
    /// still count as encoded.
    pub fn is_encoded(path: &Path) -> bool {
        path.file_name()
            .map(|n| strip_extension(&n.to_string_lossy()).contains(FIELD_DELIMITER))
            .unwrap_or(false)
    }
}

impl FromStr for FilenameMetadata {
    type Err = ConfigParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Drop a trailing `.ext` unless it is the fractional part of the last field
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => {
            let tail = &name[dot + 1..];
            if tail.contains(FIELD_DELIMITER) || tail.parse::<f32>().is_ok() {
                name
            } else {
                &name[..dot]
            }
        }
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_encoded() {
        assert!(FilenameMetadata::is_encoded(Path::new("data/A_1.5_20_90.0_100.0.h5")));
        assert!(FilenameMetadata::is_encoded(Path::new("data/A_x_20_90_100.h5")));
        assert!(!FilenameMetadata::is_encoded(Path::new("data/res.h5")));
        assert!(!FilenameMetadata::is_encoded(Path::new("data/gbuffer")));
    }

    #[test]
    fn test_parse_example_name() {
        let meta = FilenameMetadata::parse("A_1.5_20.000000_90.0_100.0.ext").unwrap();
        assert_eq!(meta.azimuth, Degrees(100.0));
        assert_eq!(meta.elevation, Degrees(90.0));
        assert_eq!(meta.iso_value, 20.0);
        assert_eq!(meta.secondary, 1.5);
    }

    #[test]
    fn test_parse_without_extension() {
        let meta: FilenameMetadata = "run_0.25_3_45.5_270.0".parse().unwrap();
        assert_eq!(meta.azimuth, Degrees(270.0));
        assert_eq!(meta.elevation, Degrees(45.5));
        assert_eq!(meta.iso_value, 3.0);
        assert_eq!(meta.secondary, 0.25);

        // Integer azimuth: the last dot belongs to the elevation field
        let meta = FilenameMetadata::parse("run_0.25_3_45.5_270").unwrap();
        assert_eq!(meta.azimuth, Degrees(270.0));
    }

    #[test]
    fn test_prefix_may_contain_delimiter() {
        let meta = FilenameMetadata::parse("my_long_prefix_2_10_30_60.h5").unwrap();
        assert_eq!(meta.secondary, 2.0);
        assert_eq!(meta.azimuth, Degrees(60.0));
    }

    #[test]
    fn test_prefix_is_optional() {
        let meta = FilenameMetadata::parse("2_10_30_60").unwrap();
        assert_eq!(meta.secondary, 2.0);
    }

    #[test]
    fn test_non_numeric_field_fails() {
        let err = FilenameMetadata::parse("A_1.5_abc_90.0_100.0.h5").unwrap_err();
        assert!(matches!(
            err,
            ConfigParseError::InvalidNumber { field: "iso value", .. }
        ));
    }

    #[test]
    fn test_missing_field_fails() {
        let err = FilenameMetadata::parse("90.0_100.0.h5").unwrap_err();
        assert!(matches!(
            err,
            ConfigParseError::MissingField { field: "iso value", .. }
        ));
        assert!(FilenameMetadata::parse("").is_err());
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let path = PathBuf::from("/data/runs_v2/A_1.5_20_90_100.h5");
        let meta = FilenameMetadata::from_path(&path).unwrap();
        assert_eq!(meta.azimuth, Degrees(100.0));
    }
}
