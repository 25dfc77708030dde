use std::fmt;

use crate::core::constants::{datasets, labels};

/// Datasets the renderer knows a title for
///
/// Lookup is total: any file name outside the known set maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    ProtocolDistribution,
    TopIpCommunications,
    ShareOfProtocolBetweenIps,
    DnsRequests,
    Unknown,
}

impl DatasetKind {
    /// Every recognised kind, in report order
    pub const KNOWN: [DatasetKind; 4] = [
        DatasetKind::ProtocolDistribution,
        DatasetKind::TopIpCommunications,
        DatasetKind::ShareOfProtocolBetweenIps,
        DatasetKind::DnsRequests,
    ];

    pub fn from_filename(filename: &str) -> Self {
        match filename {
            datasets::PROTOCOL_DISTRIBUTION => DatasetKind::ProtocolDistribution,
            datasets::TOP_IP_COMMUNICATIONS => DatasetKind::TopIpCommunications,
            datasets::SHARE_OF_PROTOCOL_BETWEEN_IPS => DatasetKind::ShareOfProtocolBetweenIps,
            datasets::DNS_REQUESTS => DatasetKind::DnsRequests,
            _ => DatasetKind::Unknown,
        }
    }

    /// File name the analyzer writes this dataset to
    pub fn filename(&self) -> Option<&'static str> {
        match self {
            DatasetKind::ProtocolDistribution => Some(datasets::PROTOCOL_DISTRIBUTION),
            DatasetKind::TopIpCommunications => Some(datasets::TOP_IP_COMMUNICATIONS),
            DatasetKind::ShareOfProtocolBetweenIps => Some(datasets::SHARE_OF_PROTOCOL_BETWEEN_IPS),
            DatasetKind::DnsRequests => Some(datasets::DNS_REQUESTS),
            DatasetKind::Unknown => None,
        }
    }

    /// Human readable table title
    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::ProtocolDistribution => "Protocol Distribution",
            DatasetKind::TopIpCommunications => "Top IP Address Communications",
            DatasetKind::ShareOfProtocolBetweenIps => "Share of each protocol between IPs",
            DatasetKind::DnsRequests => "DNS Requests",
            DatasetKind::Unknown => labels::UNKNOWN,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        let expected = [
            ("protocol_distribution.csv", "Protocol Distribution"),
            ("top_ip_communications.csv", "Top IP Address Communications"),
            (
                "share_of_protocol_between_ips.csv",
                "Share of each protocol between IPs",
            ),
            ("dns_requests.csv", "DNS Requests"),
        ];

        for (filename, label) in expected {
            assert_eq!(DatasetKind::from_filename(filename).label(), label);
        }
    }

    #[test]
    fn test_unknown_fallback() {
        for filename in ["", "other.csv", "Protocol_Distribution.csv", "protocol_distribution"] {
            assert_eq!(DatasetKind::from_filename(filename), DatasetKind::Unknown);
        }
        assert_eq!(DatasetKind::Unknown.label(), "Unknown");
        assert_eq!(DatasetKind::Unknown.filename(), None);
    }

    #[test]
    fn test_filename_round_trip_for_known_kinds() {
        for kind in DatasetKind::KNOWN {
            let filename = kind.filename().expect("known kinds have a file name");
            assert_eq!(DatasetKind::from_filename(filename), kind);
        }
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(DatasetKind::DnsRequests.to_string(), "DNS Requests");
    }
}
