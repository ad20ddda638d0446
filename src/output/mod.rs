use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;
use std::path::Path;

use crate::acquire::{OutcomeRecord, METADATA_COLUMNS};

fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write the header row and one row per record, quoting only where needed
pub fn write_metadata<W: Write>(writer: W, records: &[OutcomeRecord]) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(writer);

    csv.write_record(METADATA_COLUMNS)?;
    for record in records {
        csv.write_record(record.to_row())?;
    }

    csv.flush()?;
    Ok(())
}

/// Save the metadata table, creating parent directories as needed
pub fn write_metadata_table(path: &Path, records: &[OutcomeRecord]) -> Result<()> {
    create_parent_dirs(path)?;
    let file = fs_err::File::create(path).context("Failed to create metadata file")?;
    write_metadata(file, records)
}

/// Write one fully quoted single-cell row per section, without a header
pub fn write_sections<W: Write>(writer: W, sections: &[String]) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(writer);

    for section in sections {
        csv.write_record([section])?;
    }

    csv.flush()?;
    Ok(())
}

/// Save a section table, creating parent directories as needed
pub fn write_section_table(path: &Path, sections: &[String]) -> Result<()> {
    create_parent_dirs(path)?;
    let file = fs_err::File::create(path).context("Failed to create table file")?;
    write_sections(file, sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{AudioFormat, ExtractedMedia};
    use std::path::PathBuf;

    #[test]
    fn test_metadata_table_mixed_outcomes() {
        let media = ExtractedMedia {
            title: Some("clip".into()),
            uploader: Some("someone".into()),
            id: Some("1".into()),
            duration: Some(7.0),
            webpage_url: Some("https://a".into()),
            filename: PathBuf::from("out/someone_1.webm"),
        };
        let records = vec![
            OutcomeRecord::success("https://a", media, AudioFormat::Mp3),
            OutcomeRecord::failure("https://b", "ERROR: 404, not found"),
        ];

        let mut out = Vec::new();
        write_metadata(&mut out, &records).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "input_url,status,filepath,title,uploader,id,duration,webpage_url,error\r\n\
             https://a,ok,out/someone_1.mp3,clip,someone,1,7,https://a,\r\n\
             https://b,error,,,,,,,\"ERROR: 404, not found\"\r\n"
        );
    }

    #[test]
    fn test_sections_are_always_quoted() {
        let sections = vec!["plain".to_string(), "two\nlines, \"quoted\"".to_string()];
        let mut out = Vec::new();
        write_sections(&mut out, &sections).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\"plain\"\r\n\"two\nlines, \"\"quoted\"\"\"\r\n"
        );
    }

    #[test]
    fn test_section_table_round_trips_through_csv_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("table.csv");
        let sections = vec!["a,b\nc".to_string(), "".to_string()];

        write_section_table(&path, &sections).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .unwrap();
        let cells: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(cells, sections);
    }

    #[test]
    fn test_metadata_table_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("meta.csv");

        write_metadata_table(&path, &[]).unwrap();

        let content = fs_err::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
