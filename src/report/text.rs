//! Human-readable reports.

use std::path::Path;

use humansize::{format_size, BINARY};

use crate::compare::{CompareReport, SectionComparison};
use crate::config::ReportConfig;
use crate::model::analysis::AnalysisResult;
use crate::model::palmdb::{palm_timestamp, RecordSpan};
use crate::model::record0::{MobiHeader, TextEncoding};
use crate::parser::palmdb::PALMDB_HEADER_SIZE;

const RULE_WIDTH: usize = 80;

/// Show a value, adding hex when it is large enough to be a flag word or id.
fn num(value: u32) -> String {
    if value > 1_000_000 {
        format!("{value} (0x{value:x})")
    } else {
        value.to_string()
    }
}

fn opt_num(value: Option<u32>) -> String {
    value.map_or_else(|| "N/A".to_string(), num)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn timestamp(raw: u32) -> String {
    match palm_timestamp(raw) {
        Some(dt) => format!("{raw} ({})", dt.format("%Y-%m-%d %H:%M:%S UTC")),
        None => raw.to_string(),
    }
}

/// `1033 (lang 9, dialect 1)`: the raw locale with its language/dialect split.
fn locale(mobi: &MobiHeader) -> String {
    match (mobi.locale, mobi.language_code(), mobi.dialect_code()) {
        (Some(raw), Some(lang), Some(dialect)) => {
            format!("{raw} (lang {lang}, dialect {dialect})")
        }
        _ => "N/A".to_string(),
    }
}

fn line(content: &mut String, indent: usize, key: &str, value: impl AsRef<str>) {
    content.push_str(&format!(
        "{:indent$}{:<24} {}\n",
        "",
        key,
        value.as_ref(),
        indent = indent
    ));
}

/// Render the full analysis of one file.
pub fn render_analysis(
    label: &str,
    path: &Path,
    result: &AnalysisResult,
    data: &[u8],
    cfg: &ReportConfig,
) -> String {
    let mut content = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    content.push_str(&format!("\n{rule}\n  {label}: {}\n{rule}\n\n", path.display()));
    line(
        &mut content,
        2,
        "File size",
        format!(
            "{} ({} bytes)",
            format_size(result.file_size, BINARY),
            result.file_size
        ),
    );
    line(&mut content, 2, "SHA-256", &result.sha256);

    let db = &result.palmdb;
    content.push_str("\n  PalmDB header\n");
    line(&mut content, 4, "database_name", &db.name);
    line(&mut content, 4, "attributes", format!("0x{:04x}", db.attributes));
    line(&mut content, 4, "version", db.version.to_string());
    line(&mut content, 4, "creation_date", timestamp(db.creation_date));
    line(&mut content, 4, "modification_date", timestamp(db.modification_date));
    line(&mut content, 4, "last_backup_date", timestamp(db.last_backup_date));
    line(&mut content, 4, "modification_number", num(db.modification_number));
    line(&mut content, 4, "app_info_offset", num(db.app_info_offset));
    line(&mut content, 4, "sort_info_offset", num(db.sort_info_offset));
    line(&mut content, 4, "type", &db.type_tag);
    line(&mut content, 4, "creator", &db.creator);
    line(&mut content, 4, "unique_id_seed", num(db.unique_id_seed));
    line(&mut content, 4, "next_record_list_id", num(db.next_record_list_id));
    line(&mut content, 4, "num_records", db.num_records.to_string());

    content.push_str(&format!(
        "\n  Record info list (offset {PALMDB_HEADER_SIZE}, {} record(s))\n",
        result.records.len()
    ));
    for rec in result.records.iter().take(cfg.max_listed_records) {
        content.push_str(&format!(
            "    Record {}: offset={} (0x{:x}), attrs=0x{:02x}, id={}\n",
            rec.index, rec.offset, rec.offset, rec.attributes, rec.unique_id
        ));
    }
    if result.records.len() > cfg.max_listed_records {
        content.push_str(&format!(
            "    ... and {} more\n",
            result.records.len() - cfg.max_listed_records
        ));
    }

    if let (Some(offset), Some(pd)) = (result.record0_offset(), &result.palmdoc) {
        content.push_str(&format!("\n  Record 0 (offset {offset} / 0x{offset:x})\n"));
        content.push_str("    PalmDOC header (16 bytes)\n");
        line(
            &mut content,
            6,
            "compression",
            format!("{} ({})", pd.compression, pd.compression_kind()),
        );
        line(&mut content, 6, "unused", pd.unused.to_string());
        line(
            &mut content,
            6,
            "uncompressed_text_size",
            num(pd.uncompressed_text_size),
        );
        line(&mut content, 6, "record_count", pd.record_count.to_string());
        line(&mut content, 6, "record_size", pd.record_size.to_string());
        line(
            &mut content,
            6,
            "encryption_type",
            format!("{} ({})", pd.encryption_type, pd.encryption_kind()),
        );
    }

    if let Some(mobi) = &result.mobi {
        content.push_str("\n    MOBI header (offset +16)\n");
        line(&mut content, 6, "mobi_marker", &mobi.mobi_marker);
        line(&mut content, 6, "header_length", num(mobi.header_length));
        line(&mut content, 6, "mobi_type", opt_num(mobi.mobi_type));
        let encoding = match mobi.text_encoding {
            Some(raw) => format!("{raw} ({})", TextEncoding::from(raw)),
            None => "N/A".to_string(),
        };
        line(&mut content, 6, "text_encoding", encoding);
        line(&mut content, 6, "unique_id", opt_num(mobi.unique_id));
        line(&mut content, 6, "format_version", opt_num(mobi.format_version));
        line(
            &mut content,
            6,
            "first_non_book_index",
            opt_num(mobi.first_non_book_index),
        );
        line(&mut content, 6, "full_name_offset", opt_num(mobi.full_name_offset));
        line(&mut content, 6, "full_name_length", opt_num(mobi.full_name_length));
        if let Some(name) = &mobi.full_name {
            line(&mut content, 6, "full_name", name);
        }
        line(&mut content, 6, "locale", locale(mobi));
        line(&mut content, 6, "min_version", opt_num(mobi.min_version));
        line(
            &mut content,
            6,
            "first_image_index",
            opt_num(mobi.first_image_index),
        );
        line(
            &mut content,
            6,
            "exth_flags",
            match mobi.exth_flags {
                Some(flags) => format!("0x{flags:x}"),
                None => "N/A".to_string(),
            },
        );
        line(&mut content, 6, "drm_offset", opt_num(mobi.drm_offset));
        line(&mut content, 6, "drm_count", opt_num(mobi.drm_count));
        line(&mut content, 6, "drm_flags", opt_num(mobi.drm_flags));
        line(
            &mut content,
            6,
            "first_content_rec",
            opt_num(mobi.first_content_rec.map(u32::from)),
        );
        line(
            &mut content,
            6,
            "last_content_rec",
            opt_num(mobi.last_content_rec.map(u32::from)),
        );
    }

    if let Some(exth) = &result.exth {
        content.push_str(&format!(
            "\n    EXTH header (offset {} / 0x{:x})\n",
            exth.offset, exth.offset
        ));
        line(&mut content, 6, "marker", &exth.marker);
        line(&mut content, 6, "header_length", num(exth.header_length));
        line(&mut content, 6, "record_count", num(exth.record_count));
    }

    let previews: Vec<&RecordSpan> = result
        .text_record_spans()
        .iter()
        .take(cfg.preview_records)
        .collect();
    if !previews.is_empty() {
        content.push_str("\n  Text records\n");
        for span in previews {
            content.push_str(&format!(
                "    Record {}: offset={}, size={} bytes{}, preview={}\n",
                span.index,
                span.offset,
                span.length,
                if span.truncated { " (past end of file)" } else { "" },
                hex(span.preview(data, cfg.preview_bytes))
            ));
        }
    }

    if !result.warnings.is_empty() {
        content.push_str("\n  Warnings\n");
        for w in &result.warnings {
            content.push_str(&format!("    - {w}\n"));
        }
    }

    content
}

fn render_section(content: &mut String, title: &str, section: &SectionComparison) {
    match section {
        SectionComparison::Compared { fields } => {
            content.push_str(&format!("{title} differences:\n"));
            for c in fields {
                content.push_str(&format!(
                    "  {}: A={}, B={} {}\n",
                    c.field_name,
                    opt_num(c.value_a),
                    opt_num(c.value_b),
                    if c.equal { "✓" } else { "✗ DIFFER" }
                ));
            }
        }
        SectionComparison::Skipped { reason } => {
            content.push_str(&format!("{title}: not compared ({reason})\n"));
        }
    }
}

/// Render both files' analyses followed by the field comparison.
pub fn render_comparison(report: &CompareReport, cfg: &ReportConfig) -> String {
    let mut content = String::new();

    for (label, side) in [("A", &report.a), ("B", &report.b)] {
        match &side.result {
            Ok(result) => {
                content.push_str(&render_analysis(label, &side.path, result, &side.data, cfg));
            }
            Err(e) => {
                content.push_str(&format!(
                    "\n  {label}: {}\n  Analysis failed: {e}\n",
                    side.path.display()
                ));
            }
        }
    }

    let rule = "=".repeat(RULE_WIDTH);
    content.push_str(&format!("\n{rule}\n  Comparison\n{rule}\n\n"));
    if let Some(identical) = report.comparison.identical {
        content.push_str(&format!(
            "Files are {}\n\n",
            if identical { "byte-identical" } else { "different" }
        ));
    }
    render_section(&mut content, "PalmDOC header", &report.comparison.palmdoc);
    content.push('\n');
    render_section(&mut content, "MOBI header", &report.comparison.mobi);

    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_adds_hex_for_large_values() {
        assert_eq!(num(42), "42");
        assert_eq!(num(0xFFFF_FFFF), "4294967295 (0xffffffff)");
        assert_eq!(opt_num(None), "N/A");
    }

    #[test]
    fn test_locale_shows_language_and_dialect() {
        let mut rec0 = vec![0u8; 16 + 232];
        rec0[16..20].copy_from_slice(b"MOBI");
        rec0[20..24].copy_from_slice(&232u32.to_be_bytes());
        rec0[92..96].copy_from_slice(&1033u32.to_be_bytes());
        let mobi = crate::parser::mobi::parse_mobi_header(&rec0)
            .unwrap()
            .unwrap();
        assert_eq!(locale(&mobi), "1033 (lang 9, dialect 1)");

        let short = MobiHeader {
            locale: None,
            ..mobi
        };
        assert_eq!(locale(&short), "N/A");
    }

    #[test]
    fn test_hex_preview() {
        assert_eq!(hex(&[0x00, 0xAB, 0x10]), "00ab10");
    }
}
