//! Loading class maps from detector training metadata.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::detection::ClassMap;
use crate::error::PanelscanError;

/// Reads a class map from disk.
///
/// Files ending in `.yaml`/`.yml` are read as an Ultralytics `data.yaml`
/// (only the `names` key is used). Anything else is read as a `classes.txt`
/// with one name per line, where the line position is the class id.
pub fn read_class_map(path: &Path) -> Result<ClassMap, PanelscanError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let map = if is_yaml {
        read_data_yaml_names(path)?
    } else {
        read_classes_txt(path)?
    };
    tracing::debug!(path = %path.display(), classes = map.len(), "loaded class map");
    Ok(map)
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<u32, String>),
}

fn read_data_yaml_names(path: &Path) -> Result<ClassMap, PanelscanError> {
    let data = fs::read_to_string(path).map_err(PanelscanError::Io)?;
    let parsed: DataYaml =
        serde_yaml::from_str(&data).map_err(|source| PanelscanError::ClassMapParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(match parsed.names {
        DataYamlNames::Sequence(names) => ClassMap::from_names(names),
        // Sparse ids stay sparse: a label using a missing id is an unknown class.
        DataYamlNames::Mapping(mapping) => ClassMap::from_pairs(mapping),
    })
}

fn read_classes_txt(path: &Path) -> Result<ClassMap, PanelscanError> {
    let data = fs::read_to_string(path).map_err(PanelscanError::Io)?;
    let mut names = Vec::new();

    for (line_idx, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(PanelscanError::ClassesTxtInvalid {
                path: path.to_path_buf(),
                message: format!("line {} is empty", line_idx + 1),
            });
        }
        names.push(trimmed.to_string());
    }

    Ok(ClassMap::from_names(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_data_yaml_sequence_and_mapping() {
        let temp = tempfile::tempdir().expect("create temp dir");

        let seq = temp.path().join("seq.yaml");
        fs::write(&seq, "names:\n  - cracked\n  - dusty\n").expect("write yaml");
        let map = read_class_map(&seq).expect("read sequence");
        assert_eq!(map, ClassMap::from_names(["cracked", "dusty"]));

        let mapping = temp.path().join("map.yml");
        fs::write(&mapping, "path: ../data\nnames:\n  0: panel\n  4: frame\n")
            .expect("write yaml");
        let map = read_class_map(&mapping).expect("read mapping");
        assert_eq!(map.name(0), Some("panel"));
        assert_eq!(map.name(4), Some("frame"));
        assert_eq!(map.name(1), None);
    }

    #[test]
    fn reads_classes_txt() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("classes.txt");
        fs::write(&path, "cracked\ndusty\nnormal\n").expect("write classes");

        let map = read_class_map(&path).expect("read classes");
        assert_eq!(map, ClassMap::anomalies());
    }

    #[test]
    fn classes_txt_rejects_blank_lines() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("classes.txt");
        fs::write(&path, "cracked\n\nnormal\n").expect("write classes");

        let err = read_class_map(&path).unwrap_err();
        assert!(matches!(err, PanelscanError::ClassesTxtInvalid { .. }));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("data.yaml");
        fs::write(&path, "nc: 3\n").expect("write yaml");

        let err = read_class_map(&path).unwrap_err();
        assert!(matches!(err, PanelscanError::ClassMapParse { .. }));
    }
}
