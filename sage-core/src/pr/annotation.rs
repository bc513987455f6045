// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::constant::ANNOTATION_JSON_VALID_KEYS;
use crate::error::SageError;

/// Read raw annotation records stored as json
///
/// The records are looked up under the first matching key in
/// `ANNOTATION_JSON_VALID_KEYS`, or taken from a top-level array. Each
/// record is kept as a flat list of numbers; arity is checked when the
/// records are decoded into prompts.
///
/// # Arguments
///
/// * `path` - Path to a json file
///
/// # Examples
///
/// ```no_run
/// use sage_core::pr::read_annotations_json;
/// let records = read_annotations_json("annotations.json").unwrap();
/// ```
pub fn read_annotations_json<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f32>>, SageError> {
    let mut contents = String::new();

    File::open(path)
        .map_err(|err| SageError::NoFileError(err.to_string()))?
        .read_to_string(&mut contents)
        .map_err(|err| SageError::NoFileError(err.to_string()))?;

    parse_annotations_json(&contents)
}

/// Parse raw annotation records from a json string
///
/// # Examples
///
/// ```
/// use sage_core::pr::parse_annotations_json;
///
/// let records = parse_annotations_json(r#"{"points": [[10, 10, 1, 0, 0, 4]]}"#).unwrap();
/// assert_eq!(records, vec![vec![10., 10., 1., 0., 0., 4.]]);
/// ```
pub fn parse_annotations_json(contents: &str) -> Result<Vec<Vec<f32>>, SageError> {
    let data: Value = serde_json::from_str(contents).map_err(|_| SageError::AnnotationReadError)?;

    let records = match &data {
        Value::Array(records) => records,
        Value::Object(_) => ANNOTATION_JSON_VALID_KEYS
            .iter()
            .find_map(|key| data.get(key).and_then(|v| v.as_array()))
            .ok_or(SageError::AnnotationReadError)?,
        _ => return Err(SageError::AnnotationReadError),
    };

    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            record
                .as_array()
                .ok_or_else(|| {
                    SageError::InvalidAnnotation(format!("Record {} is not an array.", idx))
                })?
                .iter()
                .map(|value| {
                    value.as_f64().map(|v| v as f32).ok_or_else(|| {
                        SageError::InvalidAnnotation(format!(
                            "Record {} contains a non-numeric value.",
                            idx
                        ))
                    })
                })
                .collect::<Result<Vec<f32>, SageError>>()
        })
        .collect()
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_parse_keys() {
        for key in ANNOTATION_JSON_VALID_KEYS {
            let contents = format!(r#"{{"{}": [[5, 5, 2, 50, 60, 3]]}}"#, key);
            let records = parse_annotations_json(&contents).unwrap();
            assert_eq!(records, vec![vec![5., 5., 2., 50., 60., 3.]]);
        }
    }

    #[test]
    fn test_parse_top_level_array() {
        let records = parse_annotations_json("[[1, 2, 0, 0, 0, 4], [3.5, 4.5, 1, 0, 0, 4]]").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][0], 3.5);
    }

    #[test]
    fn test_parse_keeps_wrong_arity() {
        let records = parse_annotations_json(r#"{"points": [[1, 2, 0]]}"#).unwrap();
        assert_eq!(records, vec![vec![1., 2., 0.]]);
    }

    #[test]
    fn test_parse_non_numeric() {
        let records = parse_annotations_json(r#"{"points": [[1, "a", 0, 0, 0, 4]]}"#);
        assert!(matches!(records, Err(SageError::InvalidAnnotation(_))));

        let records = parse_annotations_json(r#"{"points": [5]}"#);
        assert!(matches!(records, Err(SageError::InvalidAnnotation(_))));
    }

    #[test]
    fn test_parse_missing_key() {
        let records = parse_annotations_json(r#"{"image": "photo.png"}"#);
        assert_eq!(records.unwrap_err(), SageError::AnnotationReadError);

        let records = parse_annotations_json("not json");
        assert_eq!(records.unwrap_err(), SageError::AnnotationReadError);
    }

    #[test]
    fn test_read_missing_file() {
        let records = read_annotations_json("does_not_exist.json");
        assert!(matches!(records, Err(SageError::NoFileError(_))));
    }
}
