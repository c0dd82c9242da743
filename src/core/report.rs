use crate::core::scoring::classify_management;
use crate::core::workflow::{evaluation_duration, TIME_FORMAT};
use crate::domain::model::EvaluationRecord;
use crate::domain::ports::Clock;
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;

/// Multi-line summary shown after an evaluation is closed.
pub fn evaluation_summary(record: &EvaluationRecord, clock: &dyn Clock) -> String {
    let end_time = record
        .end_time
        .clone()
        .unwrap_or_else(|| clock.now().format(TIME_FORMAT).to_string());

    let mut summary = format!(
        "{} amostras\nAvaliador: {}\nData das avaliações: {}\nHora: {} - {}",
        record.samples.len(),
        record.evaluator,
        record.date,
        record.start_time,
        end_time
    );
    if let Some(duration) = evaluation_duration(&record.start_time, &end_time) {
        summary.push_str(&format!(
            "\nDuração: {}h{:02}min",
            duration.num_hours(),
            duration.num_minutes() % 60
        ));
    }
    summary
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    name: &'a str,
    evaluator: &'a str,
    date: &'a str,
    start_time: &'a str,
    end_time: &'a str,
    samples: usize,
    average_score: f64,
    recommendation: String,
}

/// Writes one CSV row per evaluation, header included.
pub fn write_csv<W: Write>(records: &[EvaluationRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(CsvRow {
            id: &record.id,
            name: &record.name,
            evaluator: &record.evaluator,
            date: &record.date,
            start_time: &record.start_time,
            end_time: record.end_time.as_deref().unwrap_or(""),
            samples: record.samples.len(),
            average_score: record.average_score,
            recommendation: classify_management(record.average_score).to_string(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
