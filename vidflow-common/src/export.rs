//! Spreadsheet-friendly exports
//!
//! Video lists are written as UTF-8 CSV with a byte-order mark and `;`
//! separators so spreadsheet tools in Spanish locales open them directly.
//! Affiliate companies travel as plain newline-delimited names.

use csv::{QuoteStyle, WriterBuilder};

use crate::models::{Actor, Video};
use crate::workflow::{effective_assignment, effective_status};
use crate::{Error, Result};

pub const UTF8_BOM: &str = "\u{feff}";

const VIDEO_HEADERS: [&str; 9] = [
    "ID",
    "Serie",
    "Título",
    "Título optimizado",
    "Estado",
    "Asignado a",
    "Proyecto",
    "Creado",
    "Actualizado",
];

/// Write `videos` as the viewer perceives them: one header row plus one row per video
pub fn export_videos_csv(videos: &[Video], viewer: &Actor) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(UTF8_BOM.as_bytes().to_vec());

    writer.write_record(VIDEO_HEADERS)?;
    for video in videos {
        let status = effective_status(video, viewer.role, viewer);
        let assignment = effective_assignment(video, viewer.role, viewer);
        writer.write_record([
            video.id.to_string(),
            video.series_number.clone().unwrap_or_default(),
            video.title.clone(),
            video.optimized_title.clone().unwrap_or_default(),
            status.label_for(viewer.role).to_string(),
            assignment.name.unwrap_or_default(),
            video.project_id.to_string(),
            video.created_at.format("%Y-%m-%d %H:%M").to_string(),
            video.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Failed to flush CSV: {}", e)))
}

/// Company names from a newline-delimited upload, trimmed, blanks and duplicates dropped
pub fn parse_company_names(content: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    content
        .trim_start_matches(UTF8_BOM)
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Newline-delimited company names
pub fn export_company_names<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = names.into_iter().collect::<Vec<_>>().join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Role, VideoStatus};

    fn admin() -> Actor {
        Actor {
            id: 1,
            username: "admin".into(),
            role: Role::Admin,
        }
    }

    fn read_rows(bytes: &[u8]) -> Vec<csv::StringRecord> {
        assert!(bytes.starts_with(UTF8_BOM.as_bytes()));
        csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_reader(&bytes[UTF8_BOM.len()..])
            .records()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_export_row_count_and_bom() {
        let videos: Vec<Video> = (1..=4)
            .map(|i| Video::new(i, 1, format!("Video {}", i), VideoStatus::Pending))
            .collect();
        let rows = read_rows(&export_videos_csv(&videos, &admin()).unwrap());
        assert_eq!(rows.len(), 5);
        assert_eq!(&rows[0][2], "Título");
    }

    #[test]
    fn test_export_escapes_separators_quotes_and_newlines() {
        let tricky = "Pan; \"casero\", fácil\nparte 2";
        let videos = vec![Video::new(1, 1, tricky, VideoStatus::Completed)];
        let bytes = export_videos_csv(&videos, &admin()).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"Pan; \"\"casero\"\", fácil\nparte 2\""));

        let rows = read_rows(&bytes);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][2], tricky);
    }

    #[test]
    fn test_export_empty_has_only_header() {
        let rows = read_rows(&export_videos_csv(&[], &admin()).unwrap());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_export_uses_viewer_perspective() {
        let optimizer = Actor {
            id: 2,
            username: "opt".into(),
            role: Role::Optimizer,
        };
        let videos = vec![Video::new(1, 1, "t", VideoStatus::Pending)];
        let rows = read_rows(&export_videos_csv(&videos, &optimizer).unwrap());
        assert_eq!(&rows[1][4], "Disponible");
    }

    #[test]
    fn test_company_names_round_trip() {
        let names = parse_company_names("\u{feff}NordVPN\n\n  Hostinger \nnordvpn\r\nAmazon\n");
        assert_eq!(names, vec!["NordVPN", "Hostinger", "Amazon"]);
        assert_eq!(
            export_company_names(names.iter().map(String::as_str)),
            "NordVPN\nHostinger\nAmazon\n"
        );
    }
}
