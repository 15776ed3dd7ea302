//! Delimited-text channel lists.
//!
//! Fixed header row, one row per occupied channel, numeric columns with
//! fixed decimal places. Import tolerates reordered and missing columns
//! and skips rows it cannot parse.

use crate::core::channel::{CrossMode, Duplex, Mode, Skip, ToneMode};
use crate::core::{Channel, ChannelArray};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {cause}")]
    Parse { line: usize, cause: String },
}

pub type Result<T> = std::result::Result<T, CsvError>;

pub const COLUMNS: &[&str] = &[
    "Location",
    "Name",
    "Frequency",
    "Duplex",
    "Offset",
    "Tone",
    "rToneFreq",
    "cToneFreq",
    "DtcsCode",
    "DtcsPolarity",
    "RxDtcsCode",
    "CrossMode",
    "Mode",
    "TStep",
    "Skip",
    "Power",
    "Comment",
];

fn channel_row(ch: &Channel) -> Vec<String> {
    vec![
        ch.index.to_string(),
        ch.name.clone(),
        Channel::format_freq(ch.freq),
        ch.duplex.as_label().to_string(),
        Channel::format_freq(ch.offset),
        ch.tone_mode.as_label().to_string(),
        Channel::format_tone(ch.rtone),
        Channel::format_tone(ch.ctone),
        format!("{:03}", ch.dtcs),
        ch.dtcs_polarity.clone(),
        format!("{:03}", ch.rx_dtcs),
        ch.cross_mode.as_label().to_string(),
        ch.mode.as_label().to_string(),
        format!("{:.2}", ch.tuning_step),
        ch.skip.as_label().to_string(),
        ch.power.clone(),
        ch.comment.clone(),
    ]
}

/// Export the occupied channels of an array.
pub fn export_channels(path: impl AsRef<Path>, channels: &ChannelArray) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for ch in channels.occupied() {
        writer.write_record(channel_row(ch))?;
    }
    writer.flush()?;
    Ok(())
}

/// Import channels from a delimited list. Rows that fail to parse are
/// logged and skipped; column order is taken from the header.
pub fn import_channels(path: impl AsRef<Path>) -> Result<Vec<Channel>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_string(), i))
        .collect();

    let mut channels = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = row_idx + 2;
        match parse_row(&record, &columns, line) {
            Ok(ch) => channels.push(ch),
            Err(err) => tracing::warn!(%err, "skipping row"),
        }
    }
    Ok(channels)
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &HashMap<String, usize>,
    line: usize,
) -> Result<Channel> {
    let get = |name: &str| -> Option<&str> { columns.get(name).and_then(|&i| record.get(i)) };
    let parse_err = |cause: String| CsvError::Parse { line, cause };

    let index: u32 = get("Location")
        .ok_or_else(|| parse_err("missing Location".to_string()))?
        .parse()
        .map_err(|_| parse_err("bad Location".to_string()))?;

    let mut ch = Channel::new(index);

    if let Some(name) = get("Name") {
        ch.name = name.to_string();
    }
    if let Some(freq) = get("Frequency") {
        ch.freq = Channel::parse_freq(freq).map_err(|e| parse_err(e.to_string()))?;
    }
    if let Some(duplex) = get("Duplex") {
        ch.duplex = Duplex::from_label(duplex).map_err(|e| parse_err(e.to_string()))?;
    }
    if let Some(offset) = get("Offset") {
        ch.offset = Channel::parse_freq(offset).map_err(|e| parse_err(e.to_string()))?;
    }
    if let Some(tmode) = get("Tone") {
        ch.tone_mode = ToneMode::from_label(tmode).map_err(|e| parse_err(e.to_string()))?;
    }
    if let Some(rtone) = get("rToneFreq") {
        ch.rtone = parse_tone(rtone).unwrap_or(885);
    }
    if let Some(ctone) = get("cToneFreq") {
        ch.ctone = parse_tone(ctone).unwrap_or(885);
    }
    if let Some(dtcs) = get("DtcsCode") {
        ch.dtcs = dtcs.parse().unwrap_or(23);
    }
    if let Some(pol) = get("DtcsPolarity") {
        ch.dtcs_polarity = pol.to_string();
    }
    if let Some(rx_dtcs) = get("RxDtcsCode") {
        ch.rx_dtcs = rx_dtcs.parse().unwrap_or(23);
    }
    if let Some(cross) = get("CrossMode") {
        ch.cross_mode = CrossMode::from_label(cross).map_err(|e| parse_err(e.to_string()))?;
    }
    if let Some(mode) = get("Mode") {
        ch.mode = Mode::from_label(mode).map_err(|e| parse_err(e.to_string()))?;
    }
    if let Some(step) = get("TStep") {
        ch.tuning_step = step.parse().unwrap_or(5.0);
    }
    if let Some(skip) = get("Skip") {
        ch.skip = Skip::from_label(skip).map_err(|e| parse_err(e.to_string()))?;
    }
    if let Some(power) = get("Power") {
        ch.power = power.to_string();
    }
    if let Some(comment) = get("Comment") {
        ch.comment = comment.to_string();
    }

    ch.empty = ch.freq == 0;
    Ok(ch)
}

/// "88.5" -> 885 tenths of Hz.
fn parse_tone(text: &str) -> Option<u16> {
    let value: f32 = text.parse().ok()?;
    if !(10.0..1000.0).contains(&value) {
        return None;
    }
    Some((value * 10.0).round() as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channel::{Duplex, Mode, Skip, ToneMode};
    use tempfile::NamedTempFile;

    fn array_with(channels: Vec<Channel>) -> ChannelArray {
        let mut arr = ChannelArray::new(1, 32).unwrap();
        for ch in channels {
            arr.set(ch).unwrap();
        }
        arr
    }

    #[test]
    fn export_import_roundtrip() -> Result<()> {
        let mut ch1 = Channel::new(1);
        ch1.freq = 146_520_000;
        ch1.name = "CALLING".to_string();
        ch1.mode = Mode::Fm;
        ch1.power = "High".to_string();

        let mut ch2 = Channel::new(2);
        ch2.freq = 147_330_000;
        ch2.duplex = Duplex::Plus;
        ch2.offset = 600_000;
        ch2.tone_mode = ToneMode::Tone;
        ch2.rtone = 1000;
        ch2.skip = Skip::Skip;
        ch2.mode = Mode::Nfm;

        let file = NamedTempFile::new().unwrap();
        export_channels(file.path(), &array_with(vec![ch1, ch2]))?;
        let imported = import_channels(file.path())?;

        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].index, 1);
        assert_eq!(imported[0].freq, 146_520_000);
        assert_eq!(imported[0].name, "CALLING");
        assert_eq!(imported[1].duplex, Duplex::Plus);
        assert_eq!(imported[1].offset, 600_000);
        assert_eq!(imported[1].tone_mode, ToneMode::Tone);
        assert_eq!(imported[1].rtone, 1000);
        assert_eq!(imported[1].skip, Skip::Skip);
        Ok(())
    }

    #[test]
    fn fields_with_delimiters_are_quoted() -> Result<()> {
        let mut ch = Channel::new(3);
        ch.freq = 446_000_000;
        ch.name = "A,B".to_string();
        ch.comment = "says \"hi\"".to_string();

        let file = NamedTempFile::new().unwrap();
        export_channels(file.path(), &array_with(vec![ch]))?;

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("\"A,B\""));
        assert!(text.contains("\"says \"\"hi\"\"\""));

        let imported = import_channels(file.path())?;
        assert_eq!(imported[0].name, "A,B");
        assert_eq!(imported[0].comment, "says \"hi\"");
        Ok(())
    }

    #[test]
    fn import_partial_and_reordered_columns() -> Result<()> {
        let text = "Frequency,Location,Mode,Name\n146.520,5,FM,REV\n147.000,6,NFM,X\n";
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), text).unwrap();

        let imported = import_channels(file.path())?;
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].index, 5);
        assert_eq!(imported[0].freq, 146_520_000);
        assert_eq!(imported[0].mode, Mode::Fm);
        assert_eq!(imported[0].name, "REV");
        assert_eq!(imported[0].duplex, Duplex::Simplex);
        Ok(())
    }

    #[test]
    fn bad_rows_are_skipped() -> Result<()> {
        let text = "Location,Frequency,Mode\n1,146.520,FM\nnope,147.000,FM\n3,147.500,FM\n";
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), text).unwrap();

        let imported = import_channels(file.path())?;
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[1].index, 3);
        Ok(())
    }

    #[test]
    fn numeric_formatting_is_fixed_width() -> Result<()> {
        let mut ch = Channel::new(1);
        ch.freq = 146_520_000;
        ch.dtcs = 23;
        ch.rx_dtcs = 23;

        let file = NamedTempFile::new().unwrap();
        export_channels(file.path(), &array_with(vec![ch]))?;
        let text = std::fs::read_to_string(file.path()).unwrap();

        assert!(text.contains("146.520000"));
        assert!(text.contains("023"));
        assert!(text.contains("88.5"));
        assert!(text.contains("5.00"));
        Ok(())
    }
}
