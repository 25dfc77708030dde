use serde::{Deserialize, Serialize};

use crate::report::kind::DatasetKind;

/// One named delimited-text artifact produced by the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDataset {
    pub filename: String,
    pub data: String,
}

impl ReportDataset {
    pub fn new<F: Into<String>, D: Into<String>>(filename: F, data: D) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    pub fn kind(&self) -> DatasetKind {
        DatasetKind::from_filename(&self.filename)
    }
}

/// Everything the client needs to draw the report for one upload
///
/// Serialized as `{ csvData, images, fileName, isFileUploaded }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    /// Datasets in the order the analyzer was asked to produce them
    #[serde(default)]
    pub csv_data: Vec<ReportDataset>,
    /// Image references relative to the server root, e.g. `graphs/<scope>/<file>`
    #[serde(default)]
    pub images: Vec<String>,
    pub file_name: String,
    pub is_file_uploaded: bool,
}

impl ReportPayload {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_shape() {
        let payload = ReportPayload {
            csv_data: vec![ReportDataset::new("protocol_distribution.csv", "a,b\n1,2")],
            images: vec!["graphs/pcapfile-1/protocol_percentage.png".to_string()],
            file_name: "capture.pcap".to_string(),
            is_file_uploaded: true,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "csvData": [{"filename": "protocol_distribution.csv", "data": "a,b\n1,2"}],
                "images": ["graphs/pcapfile-1/protocol_percentage.png"],
                "fileName": "capture.pcap",
                "isFileUploaded": true
            })
        );
    }

    #[test]
    fn test_payload_without_images_field() {
        // Older servers omit images entirely
        let payload = ReportPayload::from_json(
            r#"{"csvData":[{"filename":"x.csv","data":"h"}],"fileName":"c.pcap","isFileUploaded":true}"#,
        )
        .unwrap();

        assert!(payload.images.is_empty());
        assert_eq!(payload.csv_data.len(), 1);
        assert_eq!(payload.csv_data[0].kind(), DatasetKind::Unknown);
    }

    #[test]
    fn test_payload_rejects_missing_file_name() {
        assert!(ReportPayload::from_json(r#"{"csvData":[],"isFileUploaded":true}"#).is_err());
    }
}
