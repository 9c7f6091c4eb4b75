//! Printer port: hands a rendered document to the platform's print path.

/// A standalone printable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintDocument {
    pub title: String,
    /// File-name-safe stem, e.g. "daily-report-2024-05-02"
    pub file_stem: String,
    pub html: String,
}

/// Where a printed document ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintReceipt {
    pub location: String,
}

/// Trait for printing rendered reports.
pub trait ReportPrinter {
    /// Error type for print operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Print a document.
    ///
    /// # Errors
    /// Returns error if the document cannot be spooled or the print command fails.
    fn print(&self, document: &PrintDocument) -> Result<PrintReceipt, Self::Error>;
}
