use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Smallest render scale accepted by the images endpoint.
pub const MIN_SCALE: f32 = 0.01;
/// Largest render scale accepted by the images endpoint.
pub const MAX_SCALE: f32 = 4.0;
pub const DEFAULT_SCALE: f32 = 2.0;

/// Output format requested from the render endpoint; doubles as the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    #[default]
    Png,
    Svg,
    Pdf,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 4] = [
        ImageFormat::Jpg,
        ImageFormat::Png,
        ImageFormat::Svg,
        ImageFormat::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FormatParseError {
    #[error("Unsupported image format '{0}': expected one of jpg, png, svg, pdf")]
    UnsupportedFormat(String),
    #[error("Scale {0} is out of range: expected a number between 0.01 and 4")]
    ScaleOutOfRange(f32),
}

impl FromStr for ImageFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ImageFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == lower)
            .ok_or_else(|| FormatParseError::UnsupportedFormat(s.to_string()))
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that a render scale lies within `[MIN_SCALE, MAX_SCALE]`.
pub fn validate_scale(scale: f32) -> Result<f32, FormatParseError> {
    if scale.is_finite() && (MIN_SCALE..=MAX_SCALE).contains(&scale) {
        Ok(scale)
    } else {
        Err(FormatParseError::ScaleOutOfRange(scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!("png".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("jpg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
        assert_eq!("svg".parse::<ImageFormat>().unwrap(), ImageFormat::Svg);
        assert_eq!("pdf".parse::<ImageFormat>().unwrap(), ImageFormat::Pdf);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(" PNG ".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(
            "jpeg".parse::<ImageFormat>(),
            Err(FormatParseError::UnsupportedFormat("jpeg".to_string()))
        );
        assert!("".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_default_is_png() {
        assert_eq!(ImageFormat::default(), ImageFormat::Png);
        assert_eq!(format!("{}", ImageFormat::Pdf), "pdf");
    }

    #[test]
    fn test_scale_bounds_are_inclusive() {
        assert_eq!(validate_scale(0.01), Ok(0.01));
        assert_eq!(validate_scale(4.0), Ok(4.0));
        assert_eq!(validate_scale(DEFAULT_SCALE), Ok(2.0));
    }

    #[test]
    fn test_scale_out_of_range() {
        assert!(validate_scale(0.0).is_err());
        assert!(validate_scale(4.01).is_err());
        assert!(validate_scale(-1.0).is_err());
        assert!(validate_scale(f32::NAN).is_err());
    }
}
