//! Record persistence: save, history, search, and printable reports.
//!
//! The record store is the only source of truth. Saving never touches the
//! local history; the history screen re-fetches on every visit.

use crate::domain::{ClinicalForm, DiagnosisResult, Identity, PatientRecord, SavePatientRequest};
use crate::ports::{BackendError, PrintDocument, PrintReceipt, ReportPrinter};
use crate::NephroguardError;

use super::dispatch::Request;
use super::fencing::{RequestFence, RequestKind, Ticket};
use super::failure_text;

const SAVE_UNREACHABLE: &str = "Server error: cannot reach the record store";
const SAVE_FALLBACK: &str = "Failed to save record.";

/// Load state of the history list.
///
/// `Failed` and an empty `Loaded` both show no rows but are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStatus {
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug)]
pub struct RecordPersistence {
    save_fence: RequestFence,
    history_fence: RequestFence,
    status: HistoryStatus,
    records: Vec<PatientRecord>,
    selected: Option<PatientRecord>,
}

impl Default for RecordPersistence {
    fn default() -> Self {
        Self {
            save_fence: RequestFence::new(RequestKind::SavePatient),
            history_fence: RequestFence::new(RequestKind::History),
            status: HistoryStatus::NotLoaded,
            records: Vec::new(),
            selected: None,
        }
    }
}

impl RecordPersistence {
    /// Issue a save for the current verdict.
    ///
    /// # Errors
    /// Rejected locally, with no request issued, when the patient name is
    /// blank, there is no verdict, nobody is logged in, or a save is pending.
    pub fn begin_save(
        &mut self,
        form: &ClinicalForm,
        result: Option<&DiagnosisResult>,
        author: Option<&Identity>,
        patient_name: &str,
    ) -> Result<Request, NephroguardError> {
        if patient_name.trim().is_empty() {
            return Err(NephroguardError::Validation(
                "Please enter a patient name before saving.".to_string(),
            ));
        }
        let Some(result) = result else {
            return Err(NephroguardError::Validation(
                "Run a diagnosis before saving.".to_string(),
            ));
        };
        let Some(author) = author else {
            return Err(NephroguardError::Unauthorized(
                "log in to save records".to_string(),
            ));
        };
        let ticket = self.save_fence.try_issue().map_err(NephroguardError::Busy)?;
        tracing::info!("Saving patient record");
        Ok(Request::SavePatient(
            ticket,
            SavePatientRequest::new(form, result, author, patient_name),
        ))
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.save_fence.is_busy()
    }

    /// Apply a save response. `None` when stale.
    pub fn finish_save(
        &mut self,
        ticket: Ticket,
        outcome: Result<(), BackendError>,
    ) -> Option<Result<(), String>> {
        if !self.save_fence.settle(ticket) {
            return None;
        }
        Some(outcome.map_err(|err| {
            tracing::warn!("Saving record failed: {}", err);
            failure_text(&err, SAVE_UNREACHABLE, SAVE_FALLBACK)
        }))
    }

    /// Start a history fetch, superseding any earlier one.
    pub fn begin_history(&mut self) -> Request {
        let ticket = self.history_fence.issue();
        self.status = HistoryStatus::Loading;
        self.records.clear();
        self.selected = None;
        Request::History(ticket)
    }

    /// Apply a history response. Returns `false` when stale.
    ///
    /// Failure degrades to an empty list with status `Failed`.
    pub fn finish_history(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<PatientRecord>, BackendError>,
    ) -> bool {
        if !self.history_fence.settle(ticket) {
            return false;
        }
        match outcome {
            Ok(records) => {
                tracing::debug!(count = records.len(), "History loaded");
                self.records = records;
                self.status = HistoryStatus::Loaded;
            }
            Err(err) => {
                tracing::warn!("History fetch failed: {}", err);
                self.records.clear();
                self.status = HistoryStatus::Failed;
            }
        }
        true
    }

    /// Invalidate pending save and history calls.
    pub fn cancel(&mut self) {
        self.save_fence.cancel();
        self.history_fence.cancel();
        if self.status == HistoryStatus::Loading {
            self.status = HistoryStatus::NotLoaded;
        }
    }

    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        self.status
    }

    #[must_use]
    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Open the detail view for one record.
    pub fn view_record(&mut self, record: PatientRecord) {
        self.selected = Some(record);
    }

    pub fn close_record_view(&mut self) {
        self.selected = None;
    }

    #[must_use]
    pub fn selected(&self) -> Option<&PatientRecord> {
        self.selected.as_ref()
    }
}

/// Case-insensitive substring match on name, author, or diagnosis.
///
/// The query is matched as typed, spaces included. An empty query matches
/// everything. Order is preserved.
#[must_use]
pub fn search<'a>(records: &'a [PatientRecord], query: &str) -> Vec<&'a PatientRecord> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| {
            needle.is_empty()
                || [&r.name, &r.created_by, &r.diagnosis]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Records of one day, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport<'a> {
    pub date: String,
    pub rows: Vec<&'a PatientRecord>,
}

/// Collect the records whose `date` starts with `date`.
///
/// `None` when nothing matches.
#[must_use]
pub fn build_daily_report<'a>(records: &'a [PatientRecord], date: &str) -> Option<DailyReport<'a>> {
    let date = date.trim();
    let rows: Vec<&PatientRecord> = records.iter().filter(|r| r.date.starts_with(date)).collect();
    if rows.is_empty() {
        return None;
    }
    Some(DailyReport {
        date: date.to_string(),
        rows,
    })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn file_stem(prefix: &str, label: &str) -> String {
    let slug: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{prefix}-{}", slug.trim_matches('-'))
}

const PAGE_STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#1e293b}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #cbd5e1;padding:6px 10px;text-align:left}\
th{background:#f1f5f9}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\
<style>{PAGE_STYLE}</style></head>\n<body onload=\"window.print()\">\n{body}\n</body></html>\n",
        title = escape_html(title),
    )
}

impl DailyReport<'_> {
    #[must_use]
    pub fn title(&self) -> String {
        format!("Daily Patient Report: {}", self.date)
    }

    /// Standalone HTML document for the print dialog.
    #[must_use]
    pub fn to_document(&self) -> PrintDocument {
        let title = self.title();
        let mut body = format!(
            "<h1>{}</h1>\n<p>Total patients: {}</p>\n<table>\n\
<tr><th>Name</th><th>Age / Gender</th><th>Diagnosis</th><th>Stage</th><th>TDF Status</th></tr>\n",
            escape_html(&title),
            self.rows.len()
        );
        for r in &self.rows {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&r.name),
                escape_html(&r.age_gender()),
                escape_html(&r.diagnosis),
                escape_html(&r.stage),
                escape_html(&r.tdf_status),
            ));
        }
        body.push_str("</table>");

        PrintDocument {
            file_stem: file_stem("daily-report", &self.date),
            html: page(&title, &body),
            title,
        }
    }
}

/// Single-record clinical report for the detail view.
#[must_use]
pub fn record_document(record: &PatientRecord) -> PrintDocument {
    let title = format!("Patient Report: {}", record.name);
    let mut rows = vec![
        ("Date", record.date.clone()),
        ("Age / Gender", record.age_gender()),
        ("Diagnosis", record.diagnosis.clone()),
        ("CKD Stage", record.stage.clone()),
        ("eGFR", record.gfr.clone()),
        ("TDF Status", record.tdf_status.clone()),
        ("Recorded by", record.created_by.clone()),
    ];
    let extra: Vec<(&str, String)> = record
        .extra
        .iter()
        .map(|(k, v)| {
            let text = v.as_str().map_or_else(|| v.to_string(), str::to_string);
            (k.as_str(), text)
        })
        .collect();
    rows.extend(extra);

    let mut body = format!("<h1>{}</h1>\n<table>\n", escape_html(&title));
    for (label, value) in rows {
        body.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            escape_html(label),
            escape_html(&value)
        ));
    }
    body.push_str("</table>");

    PrintDocument {
        file_stem: file_stem("record", &format!("{}-{}", record.name, record.date)),
        html: page(&title, &body),
        title,
    }
}

/// Result of a daily export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing was recorded on that date; nothing was printed.
    NoRecords,
    Printed { count: usize, receipt: PrintReceipt },
}

/// Print the report for `date`. Never modifies `records`.
///
/// # Errors
/// `Validation` for a blank date; `Print` if the printer fails.
pub fn export_daily_report<P: ReportPrinter>(
    records: &[PatientRecord],
    date: &str,
    printer: &P,
) -> Result<ExportOutcome, NephroguardError> {
    if date.trim().is_empty() {
        return Err(NephroguardError::Validation(
            "Choose a report date".to_string(),
        ));
    }
    let Some(report) = build_daily_report(records, date) else {
        tracing::info!(date = date.trim(), "No records for daily report");
        return Ok(ExportOutcome::NoRecords);
    };
    let receipt = printer
        .print(&report.to_document())
        .map_err(|e| NephroguardError::Print(e.to_string()))?;
    tracing::info!(count = report.rows.len(), "Daily report sent to printer");
    Ok(ExportOutcome::Printed {
        count: report.rows.len(),
        receipt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{record, sample_result, CapturingPrinter};
    use crate::domain::Role;

    fn sample_records() -> Vec<PatientRecord> {
        vec![
            record("2024-05-02 09:15", "Jane Doe", "drmwangi", "CKD DETECTED"),
            record("2024-05-02 11:40", "Peter Otieno", "nurse_akinyi", "NO CKD DETECTED"),
            record("2024-05-03 08:05", "Mary <Wanjiru>", "drmwangi", "NO CKD DETECTED"),
        ]
    }

    #[test]
    fn test_search_empty_query_returns_all_in_order() {
        let records = sample_records();
        let hits = search(&records, "");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].name, "Jane Doe");
        assert_eq!(hits[2].name, "Mary <Wanjiru>");
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let records = sample_records();
        assert_eq!(search(&records, "jane").len(), 1);
        assert_eq!(search(&records, "DRMWANGI").len(), 2);
        assert_eq!(search(&records, "no ckd").len(), 2);
        assert!(search(&records, "stage").is_empty());
    }

    #[test]
    fn test_search_keeps_spaces_in_query() {
        let records = sample_records();
        assert!(search(&records, "Doe ").is_empty());
        assert!(search(&records, "  ").is_empty());
        let hits = search(&records, " otieno");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Peter Otieno");
    }

    #[test]
    fn test_daily_report_filters_by_date_prefix() {
        let records = sample_records();
        let report = build_daily_report(&records, "2024-05-02").expect("matches");
        assert_eq!(report.rows.len(), 2);
        let doc = report.to_document();
        assert_eq!(doc.file_stem, "daily-report-2024-05-02");
        assert!(doc.html.contains("Total patients: 2"));
        assert!(doc.html.contains("Peter Otieno"));
        assert!(!doc.html.contains("Wanjiru"));
        assert!(build_daily_report(&records, "2024-06-01").is_none());
    }

    #[test]
    fn test_report_escapes_markup() {
        let records = sample_records();
        let doc = build_daily_report(&records, "2024-05-03")
            .expect("matches")
            .to_document();
        assert!(doc.html.contains("Mary &lt;Wanjiru&gt;"));
    }

    #[test]
    fn test_export_without_matches_does_not_print() {
        let records = sample_records();
        let printer = CapturingPrinter::default();
        let outcome = export_daily_report(&records, "1999-01-01", &printer).expect("ok");
        assert_eq!(outcome, ExportOutcome::NoRecords);
        assert!(printer.printed.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_export_prints_and_leaves_records_alone() {
        let records = sample_records();
        let before = records.clone();
        let printer = CapturingPrinter::default();
        let outcome = export_daily_report(&records, "2024-05-02", &printer).expect("ok");
        assert!(matches!(outcome, ExportOutcome::Printed { count: 2, .. }));
        assert_eq!(records, before);
        assert_eq!(printer.printed.lock().expect("lock").len(), 1);
    }

    #[test]
    fn test_export_requires_date() {
        let printer = CapturingPrinter::default();
        assert!(matches!(
            export_daily_report(&sample_records(), "  ", &printer),
            Err(NephroguardError::Validation(_))
        ));
    }

    #[test]
    fn test_save_preconditions_checked_locally() {
        let mut persistence = RecordPersistence::default();
        let form = ClinicalForm::default();
        let result = sample_result();
        let author = Identity::new("drmwangi", Role::User);

        assert!(matches!(
            persistence.begin_save(&form, Some(&result), Some(&author), "   "),
            Err(NephroguardError::Validation(_))
        ));
        assert!(matches!(
            persistence.begin_save(&form, None, Some(&author), "Jane"),
            Err(NephroguardError::Validation(_))
        ));
        assert!(matches!(
            persistence.begin_save(&form, Some(&result), None, "Jane"),
            Err(NephroguardError::Unauthorized(_))
        ));
        assert!(!persistence.is_saving());
    }

    #[test]
    fn test_save_failure_message() {
        let mut persistence = RecordPersistence::default();
        let author = Identity::new("drmwangi", Role::User);
        let request = persistence
            .begin_save(&ClinicalForm::default(), Some(&sample_result()), Some(&author), "Jane")
            .expect("valid");
        let outcome = persistence
            .finish_save(request.ticket(), Err(BackendError::Rejected { status: 500, message: None }))
            .expect("current");
        assert_eq!(outcome.unwrap_err(), "Failed to save record.");
        assert!(!persistence.is_saving());
    }

    #[test]
    fn test_history_failure_distinct_from_empty() {
        let mut persistence = RecordPersistence::default();
        let request = persistence.begin_history();
        assert_eq!(persistence.status(), HistoryStatus::Loading);
        assert!(persistence.finish_history(request.ticket(), Ok(Vec::new())));
        assert_eq!(persistence.status(), HistoryStatus::Loaded);

        let request = persistence.begin_history();
        assert!(persistence.finish_history(
            request.ticket(),
            Err(BackendError::Decode("expected array".into()))
        ));
        assert_eq!(persistence.status(), HistoryStatus::Failed);
        assert!(persistence.records().is_empty());
        assert_ne!(persistence.status(), HistoryStatus::Loading);
    }

    #[test]
    fn test_superseded_history_response_ignored() {
        let mut persistence = RecordPersistence::default();
        let old = persistence.begin_history();
        let new = persistence.begin_history();
        assert!(!persistence.finish_history(old.ticket(), Ok(sample_records())));
        assert_eq!(persistence.status(), HistoryStatus::Loading);
        assert!(persistence.finish_history(new.ticket(), Ok(Vec::new())));
        assert!(persistence.records().is_empty());
    }

    #[test]
    fn test_view_and_close_record() {
        let mut persistence = RecordPersistence::default();
        let r = sample_records().remove(0);
        persistence.view_record(r.clone());
        assert_eq!(persistence.selected(), Some(&r));
        let doc = record_document(&r);
        assert!(doc.html.contains("CKD Stage"));
        assert_eq!(doc.file_stem, "record-jane-doe-2024-05-02-09-15");
        persistence.close_record_view();
        assert!(persistence.selected().is_none());
    }
}
