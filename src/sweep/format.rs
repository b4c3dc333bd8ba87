//! Text renderers for decoded sweep records.

use crate::error::AppResult;
use crate::sweep::codec::{MacAddress, SectorSweep, SweepRecord};
use serde::Serialize;
use std::io::Write;

/// Header line emitted once per decode run by [`CsvFormatter`].
pub const CSV_HEADER: &str = "ctr,src,sec,cdown,dir,snr,snr-raw,tmstmp";

/// Renders records to a byte sink.
pub trait RecordFormatter {
    /// Emit whatever precedes the first record. Called once per run.
    fn write_header(&mut self, out: &mut dyn Write) -> AppResult<()>;

    /// Emit one record.
    fn write_record(&mut self, out: &mut dyn Write, record: &SweepRecord) -> AppResult<()>;
}

/// Comma-separated rows with the hardware tool's column widths.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvFormatter;

impl CsvFormatter {
    /// Render a single row without the trailing newline.
    pub fn row(record: &SweepRecord) -> String {
        format!(
            "{:4},{},{:3},{:3},{:1},{:>3}.{:02},0x{:04x},{}",
            record.ctr,
            record.src,
            record.sweep.sector,
            record.sweep.countdown,
            record.sweep.direction,
            record.snr.integer(),
            record.snr.fraction(),
            record.snr.raw(),
            record.dmg_tmstmp,
        )
    }
}

impl RecordFormatter for CsvFormatter {
    fn write_header(&mut self, out: &mut dyn Write) -> AppResult<()> {
        writeln!(out, "{CSV_HEADER}")?;
        Ok(())
    }

    fn write_record(&mut self, out: &mut dyn Write, record: &SweepRecord) -> AppResult<()> {
        writeln!(out, "{}", Self::row(record))?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonRow<'a> {
    ctr: u32,
    src: &'a MacAddress,
    #[serde(flatten)]
    sweep: &'a SectorSweep,
    snr: String,
    snr_raw: u8,
    tmstmp: u64,
}

/// One JSON object per line, no header.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesFormatter;

impl RecordFormatter for JsonLinesFormatter {
    fn write_header(&mut self, _out: &mut dyn Write) -> AppResult<()> {
        Ok(())
    }

    fn write_record(&mut self, out: &mut dyn Write, record: &SweepRecord) -> AppResult<()> {
        let row = JsonRow {
            ctr: record.ctr,
            src: &record.src,
            sweep: &record.sweep,
            snr: record.snr.to_string(),
            snr_raw: record.snr.raw(),
            tmstmp: record.dmg_tmstmp,
        };
        serde_json::to_writer(&mut *out, &row)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::codec::Snr;

    fn sample() -> SweepRecord {
        SweepRecord {
            ctr: 42,
            src: MacAddress([0x50, 0xc7, 0xbf, 0x0a, 0x0b, 0x0c]),
            sweep: SectorSweep::new(1, 33, 7).unwrap(),
            snr: Snr(0x58),
            dmg_tmstmp: 123_456_789,
        }
    }

    #[test]
    fn test_csv_row() {
        assert_eq!(
            CsvFormatter::row(&sample()),
            "  42,50:c7:bf:0a:0b:0c,  7, 33,1,  5.50,0x0058,123456789"
        );
    }

    #[test]
    fn test_csv_header_once() {
        let mut out = Vec::new();
        let mut formatter = CsvFormatter;
        formatter.write_header(&mut out).unwrap();
        formatter.write_record(&mut out, &sample()).unwrap();
        formatter.write_record(&mut out, &sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
    }

    #[test]
    fn test_json_line() {
        let mut out = Vec::new();
        JsonLinesFormatter.write_record(&mut out, &sample()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["src"], "50:c7:bf:0a:0b:0c");
        assert_eq!(value["sector"], 7);
        assert_eq!(value["countdown"], 33);
        assert_eq!(value["direction"], 1);
        assert_eq!(value["snr"], "5.50");
        assert_eq!(value["snr_raw"], 0x58);
        assert_eq!(value["tmstmp"], 123_456_789u64);
    }
}
