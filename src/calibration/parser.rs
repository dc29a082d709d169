// Calibration file parser
//
// Line-oriented text as shipped with measurement microphones:
//
//   "Sens Factor =-1.6dB, SERNO: 8600123"
//   * LEFT ear
//   20.000 -3.10 0.0
//   21.190 -2.98 0.0
//
// Blank lines and lines starting with `*` or `"` are metadata. They are
// searched for the channel marker and the sensitivity declaration; every
// other line is a `frequency spl phase` row.

use super::curve::{CalibrationCurve, DataPoint};
use super::Channel;
use crate::error::CalibrationError;

const SENSITIVITY_MARKER: &str = "Sens Factor";

/// Channel and curve read from one calibration file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCalibration {
    pub channel: Channel,
    pub curve: CalibrationCurve,
}

/// Parse the contents of one calibration file
///
/// `file` is only used to label errors.
pub fn parse_calibration(file: &str, contents: &str) -> Result<ParsedCalibration, CalibrationError> {
    let mut channel = None;
    let mut sensitivity = 0.0;
    let mut points: Vec<DataPoint> = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line_number = index + 1;

        if is_metadata(line) {
            if line.contains("LEFT") {
                channel = Some(Channel::Left);
            }
            if line.contains("RIGHT") {
                channel = Some(Channel::Right);
            }
            if line.contains(SENSITIVITY_MARKER) {
                sensitivity = parse_sensitivity(file, line_number, line)?;
            }
            continue;
        }

        let point = parse_row(file, line_number, line)?;
        if let Some(previous) = points.last() {
            if point.frequency < previous.frequency {
                return Err(CalibrationError::NonAscending {
                    file: file.to_string(),
                    line: line_number,
                    frequency: point.frequency,
                    previous: previous.frequency,
                });
            }
        }
        points.push(point);
    }

    if points.is_empty() {
        return Err(CalibrationError::EmptyFile {
            file: file.to_string(),
        });
    }

    let channel = channel.ok_or_else(|| CalibrationError::ChannelNotFound {
        file: file.to_string(),
    })?;

    Ok(ParsedCalibration {
        channel,
        curve: CalibrationCurve::new(sensitivity, points),
    })
}

fn is_metadata(line: &str) -> bool {
    line.starts_with('*') || line.starts_with('"') || line.trim().is_empty()
}

/// Parse `Sens Factor =<number>dB` from the first comma-separated field
fn parse_sensitivity(file: &str, line_number: usize, line: &str) -> Result<f64, CalibrationError> {
    let invalid = || CalibrationError::InvalidSensitivity {
        file: file.to_string(),
        line: line_number,
        content: line.to_string(),
    };

    let factor_field = line.split(',').next().unwrap_or_default().trim();
    let mut parts = factor_field.split('=');
    let (_, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => (key, value),
        _ => return Err(invalid()),
    };

    // Quoted headers may close the quote right after the unit
    let value = value.trim().trim_end_matches('"').trim_end();
    let number = value.strip_suffix("dB").unwrap_or(value).trim();
    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid()),
    }
}

fn parse_row(file: &str, line_number: usize, line: &str) -> Result<DataPoint, CalibrationError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(CalibrationError::MalformedRow {
            file: file.to_string(),
            line: line_number,
            content: line.to_string(),
        });
    }

    // `f64::from_str` accepts NaN and inf, which break the ascending order
    let number = |field: &'static str, value: &str| match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(CalibrationError::InvalidNumber {
            file: file.to_string(),
            line: line_number,
            field,
            value: value.to_string(),
        }),
    };

    Ok(DataPoint::new(
        number("frequency", fields[0])?,
        number("SPL", fields[1])?,
        number("phase", fields[2])?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT_FILE: &str = "\"Sens Factor =-1.6dB, SERNO: 8600123\"\n\
                             * LEFT ear\n\
                             \n\
                             20.000 -3.10 0.0\n\
                             1000.0 0.00 0.0\n\
                             20000.0 4.25 12.5\n";

    #[test]
    fn test_parses_channel_sensitivity_and_rows() {
        let parsed = parse_calibration("left.txt", LEFT_FILE).unwrap();
        assert_eq!(parsed.channel, Channel::Left);
        assert!((parsed.curve.sensitivity() - -1.6).abs() < 1e-12);
        assert_eq!(parsed.curve.points().len(), 3);
        assert_eq!(
            parsed.curve.points()[2],
            DataPoint::new(20000.0, 4.25, 12.5)
        );
    }

    #[test]
    fn test_right_marker_and_crlf_lines() {
        let contents = "* RIGHT\r\n\"Sens Factor = 2.0dB\"\r\n100 1 0\r\n200 2 0\r\n";
        let parsed = parse_calibration("right.txt", contents).unwrap();
        assert_eq!(parsed.channel, Channel::Right);
        assert_eq!(parsed.curve.sensitivity(), 2.0);
        assert_eq!(parsed.curve.points().len(), 2);
    }

    #[test]
    fn test_last_sensitivity_declaration_wins() {
        let contents = "* LEFT\n\"Sens Factor =1.0dB\"\n\"Sens Factor =-4.5dB\"\n100 1 0\n";
        let parsed = parse_calibration("twice.txt", contents).unwrap();
        assert_eq!(parsed.curve.sensitivity(), -4.5);
    }

    #[test]
    fn test_missing_sensitivity_defaults_to_zero() {
        let parsed = parse_calibration("plain.txt", "* LEFT\n100 1 0\n").unwrap();
        assert_eq!(parsed.curve.sensitivity(), 0.0);
    }

    #[test]
    fn test_two_field_row_is_fatal() {
        let err = parse_calibration("bad.txt", "* LEFT\n100 1 0\n200 2\n").unwrap_err();
        assert_eq!(
            err,
            CalibrationError::MalformedRow {
                file: "bad.txt".to_string(),
                line: 3,
                content: "200 2".to_string(),
            }
        );
    }

    #[test]
    fn test_non_numeric_field_is_fatal() {
        let err = parse_calibration("bad.txt", "* LEFT\nfreq spl phase\n").unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::InvalidNumber {
                field: "frequency",
                line: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_unmarked_text_line_is_fatal() {
        let err = parse_calibration("bad.txt", "* LEFT\nFreq SPL\n100 1 0\n").unwrap_err();
        assert!(matches!(err, CalibrationError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_file_without_channel_is_fatal() {
        let err = parse_calibration("anon.txt", "* mic\n100 1 0\n").unwrap_err();
        assert_eq!(
            err,
            CalibrationError::ChannelNotFound {
                file: "anon.txt".to_string()
            }
        );
    }

    #[test]
    fn test_file_without_rows_is_fatal() {
        let err = parse_calibration("empty.txt", "* LEFT\n\n").unwrap_err();
        assert!(matches!(err, CalibrationError::EmptyFile { .. }));
    }

    #[test]
    fn test_unparsable_sensitivity_is_fatal() {
        let err = parse_calibration("sens.txt", "\"Sens Factor =loud\"\n* LEFT\n100 1 0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::InvalidSensitivity { line: 1, .. }
        ));

        let err = parse_calibration("sens.txt", "\"Sens Factor =1=2dB\"\n* LEFT\n100 1 0\n")
            .unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidSensitivity { .. }));
    }

    #[test]
    fn test_non_finite_numbers_are_fatal() {
        let err = parse_calibration("nan.txt", "* LEFT\n100 1 0\nNaN 2 0\n50 3 0\n").unwrap_err();
        assert_eq!(
            err,
            CalibrationError::InvalidNumber {
                file: "nan.txt".to_string(),
                line: 3,
                field: "frequency",
                value: "NaN".to_string(),
            }
        );

        let err = parse_calibration("inf.txt", "* LEFT\n100 1 0\ninf 2 0\n").unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::InvalidNumber { field: "frequency", line: 3, .. }
        ));

        let err = parse_calibration("spl.txt", "* LEFT\n100 -inf 0\n").unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::InvalidNumber { field: "SPL", line: 2, .. }
        ));

        let err = parse_calibration("sens.txt", "\"Sens Factor =NaNdB\"\n* LEFT\n100 1 0\n")
            .unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidSensitivity { .. }));
    }

    #[test]
    fn test_descending_frequency_is_fatal() {
        let err = parse_calibration("desc.txt", "* LEFT\n200 1 0\n100 1 0\n").unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::NonAscending { line: 3, .. }
        ));
    }
}
