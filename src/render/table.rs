use crate::report::kind::DatasetKind;
use crate::report::payload::ReportDataset;

/// One dataset laid out as a titled table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub kind: DatasetKind,
    pub title: String,
    /// Width of the title cell, always the number of header cells
    pub colspan: usize,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RenderedTable {
    pub fn from_dataset(dataset: &ReportDataset) -> Self {
        parse_dataset(dataset)
    }
}

/// Lines of a dataset with `\r\n` endings normalised and trailing blank lines dropped
pub fn dataset_lines(data: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = data
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Plain comma split; quoting is not interpreted
pub fn split_cells(line: &str) -> Vec<String> {
    line.split(',').map(str::to_string).collect()
}

/// Lay out a dataset: row 0 is the header, every further line is a body row
///
/// Never fails. Rows shorter or longer than the header are kept as they are.
pub fn parse_dataset(dataset: &ReportDataset) -> RenderedTable {
    let kind = dataset.kind();
    let mut lines = dataset_lines(&dataset.data).into_iter();

    let header = lines.next().map(split_cells).unwrap_or_default();
    let rows = lines.map(split_cells).collect();

    RenderedTable {
        kind,
        title: kind.label().to_string(),
        colspan: header.len(),
        header,
        rows,
    }
}
