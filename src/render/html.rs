use std::path::Path;

use crate::core::error::Result;
use crate::render::table::RenderedTable;
use crate::render::view::ReportView;

mod page_constants {
    pub const PAGE_TITLE: &str = "PCAP Analysis Report";
    pub const UPLOAD_FORM_ACTION: &str = "/upload-pcap/report";
    pub const NO_DATA_MESSAGE: &str = "The analyzer produced no datasets.";
}

/// Escape text for use in element content and quoted attribute values
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Prefix a relative image reference with `base`; absolute references pass through
pub fn resolve_image(base: &str, reference: &str) -> String {
    if base.is_empty() || reference.starts_with('/') || reference.contains("://") {
        return reference.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), reference)
}

/// Static HTML rendering of a [`ReportView`]
pub struct HtmlReport;

impl HtmlReport {
    /// Write the page for `view` to `output_path`
    pub fn write_page(view: &ReportView, image_base: &str, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, Self::generate_page(view, image_base))?;
        Ok(())
    }

    /// Complete document: header, one table per dataset, then images
    pub fn generate_page(view: &ReportView, image_base: &str) -> String {
        let heading = match view.file_name() {
            Some(name) => format!(
                "{} for <code>{}</code>",
                page_constants::PAGE_TITLE,
                escape_html(name)
            ),
            None => page_constants::PAGE_TITLE.to_string(),
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>{}</style>
</head>
<body>
    <h1>{}</h1>
    <form action="{}" method="post" enctype="multipart/form-data">
        <input type="file" name="pcapfile">
        <button type="submit">Analyze another capture</button>
    </form>
    <div id="tables">{}</div>
    <div id="images">{}</div>
</body>
</html>
"#,
            page_constants::PAGE_TITLE,
            Self::generate_css(),
            heading,
            page_constants::UPLOAD_FORM_ACTION,
            Self::generate_tables(view.tables()),
            Self::generate_images(view.images(), image_base),
        )
    }

    fn generate_css() -> &'static str {
        r#"
        body { font-family: sans-serif; margin: 2rem; color: #222; }
        table { border-collapse: collapse; margin: 1.5rem 0; min-width: 20rem; }
        th, td { border: 1px solid #bbb; padding: 0.3rem 0.6rem; text-align: left; }
        thead tr:first-child th { background: #2d4059; color: #fff; text-align: center; }
        thead tr:nth-child(2) th { background: #e8ecf1; }
        #images img { display: block; max-width: 100%; margin: 1.5rem 0; }
        "#
    }

    fn generate_tables(tables: &[RenderedTable]) -> String {
        if tables.is_empty() {
            return format!("<p>{}</p>", page_constants::NO_DATA_MESSAGE);
        }
        tables.iter().map(Self::generate_table).collect()
    }

    /// Title row spanning every column, the header row, then the body rows
    pub fn generate_table(table: &RenderedTable) -> String {
        let header: String = table
            .header
            .iter()
            .map(|cell| format!("<th>{}</th>", escape_html(cell)))
            .collect();

        let rows: String = table
            .rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|cell| format!("<td>{}</td>", escape_html(cell)))
                    .collect();
                format!("<tr>{cells}</tr>")
            })
            .collect();

        format!(
            r#"
        <table>
            <thead>
                <tr><th colspan="{}">{}</th></tr>
                <tr>{}</tr>
            </thead>
            <tbody>{}</tbody>
        </table>"#,
            table.colspan.max(1),
            escape_html(&table.title),
            header,
            rows
        )
    }

    fn generate_images(images: &[String], image_base: &str) -> String {
        images
            .iter()
            .map(|reference| {
                let src = resolve_image(image_base, reference);
                let alt = reference.rsplit('/').next().unwrap_or(reference);
                format!(
                    r#"
        <img src="{}" alt="{}">"#,
                    escape_html(&src),
                    escape_html(alt)
                )
            })
            .collect()
    }
}
