//! The ingestion file-naming contract

use chrono::NaiveDate;

/// Name of the companion GeoTIFF for a sidecar: `.json` replaced by `.tif`.
pub fn companion_tiff_name(json_name: &str) -> String {
    match json_name.strip_suffix(".json") {
        Some(stem) => format!("{stem}.tif"),
        None => format!("{json_name}.tif"),
    }
}

/// Acquisition date embedded in a sidecar file name.
///
/// The name must carry a run of 14 consecutive digits whose leading 8 form a
/// valid `YYYYMMDD` date (the trailing 6 are the acquisition time and are not
/// interpreted). Returns `None` when no such run exists; the caller rejects
/// the file.
pub fn acquisition_date(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    if bytes.len() < 14 {
        return None;
    }
    for i in 0..=bytes.len() - 14 {
        if bytes[i..i + 14].iter().all(u8::is_ascii_digit) {
            if let Some(date) = parse_ymd(&name[i..i + 8]) {
                return Some(date);
            }
        }
    }
    None
}

fn parse_ymd(digits: &str) -> Option<NaiveDate> {
    let year = digits[0..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Prefix used to pair a scene with its usability-mask file: everything
/// before the `_L1C` processing-level marker (the whole name when absent).
pub fn mask_prefix(json_name: &str) -> &str {
    json_name.split("_L1C").next().unwrap_or(json_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_name() {
        assert_eq!(
            companion_tiff_name("scene_20230405123456.json"),
            "scene_20230405123456.tif"
        );
    }

    #[test]
    fn test_acquisition_date() {
        assert_eq!(
            acquisition_date("S2_20230405123456_L1C.json"),
            NaiveDate::from_ymd_opt(2023, 4, 5)
        );
        // date digits must be followed by the 6-digit time
        assert_eq!(acquisition_date("S2_20230405.json"), None);
        assert_eq!(acquisition_date("scene.json"), None);
    }

    #[test]
    fn test_invalid_calendar_date_rejected() {
        assert_eq!(acquisition_date("S2_20231341123456.json"), None);
    }

    #[test]
    fn test_mask_prefix() {
        assert_eq!(
            mask_prefix("S2_20230405123456_L1C_crop.json"),
            "S2_20230405123456"
        );
        assert_eq!(mask_prefix("scene.json"), "scene.json");
    }
}
