//! Ground-truth RUL class labels

use crate::PipelineError;
use readout::VehicleId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct LabelRecord {
    vehicle_id: VehicleId,
    class_label: usize,
}

/// Read a `vehicle_id,class_label` CSV
pub fn read_labels(path: &Path) -> Result<BTreeMap<VehicleId, usize>, PipelineError> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let labels = read_labels_from(file)?;
    info!("Loaded {} vehicle labels from {}", labels.len(), path.display());
    Ok(labels)
}

pub fn read_labels_from<R: io::Read>(
    source: R,
) -> Result<BTreeMap<VehicleId, usize>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
    let mut labels = BTreeMap::new();
    for record in reader.deserialize() {
        let record: LabelRecord = record?;
        if labels.insert(record.vehicle_id, record.class_label).is_some() {
            return Err(PipelineError::DuplicateLabel(record.vehicle_id));
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_labels_with_extra_columns() {
        let csv = "vehicle_id,class_label,note\n7, 4,late\n3,0,\n";
        let labels = read_labels_from(csv.as_bytes()).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[&7], 4);
        assert_eq!(labels[&3], 0);
    }

    #[test]
    fn test_duplicate_vehicle() {
        let csv = "vehicle_id,class_label\n1,2\n1,3\n";
        assert!(matches!(
            read_labels_from(csv.as_bytes()),
            Err(PipelineError::DuplicateLabel(1))
        ));
    }

    #[test]
    fn test_malformed_label() {
        let csv = "vehicle_id,class_label\n1,two\n";
        assert!(matches!(
            read_labels_from(csv.as_bytes()),
            Err(PipelineError::Csv(_))
        ));
    }
}
