//! Loan notice composition.
//!
//! Messages are built from structured fields and a template id, so the
//! delivery channels only ever see a finished subject and body.

use chrono::NaiveDate;

/// Day-first date format used in every borrower-facing message.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Format a date for borrower-facing text, e.g. `07/03/2025`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Identifies which notice to compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeTemplate {
    /// The due date has passed.
    Overdue,
    /// The loan falls due tomorrow.
    DueTomorrow,
    LoanCreated,
    LoanRenewed,
    LoanReturned,
    LoanLost,
    LoanCancelled,
}

impl NoticeTemplate {
    /// Stable template id, used in logs.
    pub fn id(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::DueTomorrow => "due_tomorrow",
            Self::LoanCreated => "loan_created",
            Self::LoanRenewed => "loan_renewed",
            Self::LoanReturned => "loan_returned",
            Self::LoanLost => "loan_lost",
            Self::LoanCancelled => "loan_cancelled",
        }
    }
}

/// Structured values substituted into a template.
#[derive(Debug, Clone)]
pub struct NoticeFields<'a> {
    pub borrower_name: &'a str,
    pub title: &'a str,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub library_name: &'a str,
    pub observation: Option<&'a str>,
}

/// A finished message ready for any channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub subject: String,
    pub body: String,
}

/// Compose the notice for `template`.
pub fn compose(template: NoticeTemplate, fields: &NoticeFields<'_>) -> ComposedMessage {
    let name = fields.borrower_name;
    let title = fields.title;
    let library = fields.library_name;
    let loan_date = format_date(fields.loan_date);
    let due_date = format_date(fields.due_date);

    let (subject, intro, status_line) = match template {
        NoticeTemplate::Overdue => (
            format!("Overdue loan - {library}"),
            format!(
                "Our records show that the loan of \"{title}\" is overdue.\n\
                 It was due on {due_date} and has not been returned yet.\n\n\
                 Please return the book as soon as possible or renew the loan \
                 to regularize your situation."
            ),
            "Overdue",
        ),
        NoticeTemplate::DueTomorrow => (
            format!("Reminder: loan due tomorrow - {library}"),
            format!(
                "This is a reminder that the loan of \"{title}\" is almost due.\n\
                 The return date is tomorrow, {due_date}.\n\n\
                 Please return the book by then or renew the loan to avoid delays."
            ),
            "Pending",
        ),
        NoticeTemplate::LoanCreated => (
            format!("Loan confirmed - {library}"),
            format!("Your loan of \"{title}\" is registered. Please return it by {due_date}."),
            "Pending",
        ),
        NoticeTemplate::LoanRenewed => (
            format!("Loan renewed - {library}"),
            format!("Your loan of \"{title}\" was renewed. The new return date is {due_date}."),
            "Pending",
        ),
        NoticeTemplate::LoanReturned => (
            format!("Loan returned - {library}"),
            format!("We registered the return of \"{title}\". Thank you!"),
            "Returned",
        ),
        NoticeTemplate::LoanLost => (
            format!("Loan closed as lost - {library}"),
            format!(
                "The loan of \"{title}\" was closed with the copy declared lost.\n\
                 Please contact the library to settle your record."
            ),
            "Lost",
        ),
        NoticeTemplate::LoanCancelled => (
            format!("Loan cancelled - {library}"),
            format!("The loan of \"{title}\" was cancelled."),
            "Cancelled",
        ),
    };

    let mut body = format!(
        "Hello {name},\n\n\
         {intro}\n\n\
         Loan details:\n\
         - Book: {title}\n\
         - Loan date: {loan_date}\n\
         - Return date: {due_date}\n\
         - Current status: {status_line}\n"
    );

    if let Some(observation) = fields.observation.filter(|o| !o.trim().is_empty()) {
        body.push_str(&format!("- Observation: {observation}\n"));
    }

    if matches!(template, NoticeTemplate::Overdue | NoticeTemplate::DueTomorrow) {
        body.push_str(
            "\nIf you have already returned the book, please contact us so we can \
             update our records.\n",
        );
    }

    body.push_str(&format!("\nKind regards,\n{library}."));

    ComposedMessage { subject, body }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
