//! Delimited rendering of a grade report.

use std::io::Write;

use csv::WriterBuilder;
use tracing::debug;

use crate::error::Result;
use crate::report::Report;

/// Field separator of the written table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// Header row of the report table.
pub fn header_row(report: &Report, with_gpa: bool) -> Vec<String> {
    let mut header = vec!["First".to_string(), "Last".to_string(), "Username".to_string()];
    if report.has_letter {
        header.push("Letter".to_string());
        if with_gpa {
            header.push("GPA".to_string());
        }
    }
    header.push("Grade".to_string());
    header.push("Course".to_string());
    header.extend(report.columns.iter().map(|c| c.label()));
    header
}

/// Writes the header and every report row to `writer`.
///
/// The GPA column is only written when the report carries letters.
pub fn write_report<W: Write>(
    writer: W,
    report: &Report,
    delimiter: Delimiter,
    with_gpa: bool,
) -> Result<()> {
    debug!(rows = report.rows.len(), ?delimiter, "Writing report");

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter.byte())
        .from_writer(writer);

    writer.write_record(header_row(report, with_gpa))?;

    for row in &report.rows {
        let mut record = vec![
            row.first.clone(),
            row.key.last.clone(),
            row.key.username.clone(),
        ];
        if report.has_letter {
            record.push(row.letter.clone().unwrap_or_default());
            if with_gpa {
                record.push(row.gpa.map(|g| format!("{g:.2}")).unwrap_or_default());
            }
        }
        record.push(row.grade.percentage.to_string());
        record.push(format!("{:.6}", row.grade.total));
        record.extend(
            report
                .columns
                .iter()
                .map(|c| format!("{:.6}", row.grade.group(&c.name).unwrap_or_default())),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes one column name per line.
pub fn write_columns<W, I, S>(mut writer: W, columns: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for column in columns {
        writeln!(writer, "{}", column.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}
