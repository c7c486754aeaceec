/// Identity of the chat that fired a trigger; reports are addressed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerOrigin(pub i64);

impl std::fmt::Display for TriggerOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The pending job at the head of the queue.
///
/// Cells are positional: recipient, subject, body, delay in seconds.
/// Any of them may be missing when the sheet row is short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueRow {
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub delay_seconds: Option<String>,
}

impl QueueRow {
    /// Build a row from raw cells, or `None` when there is nothing to send.
    ///
    /// A row with no cells, or whose cells are all empty strings, is empty.
    pub fn from_cells<I, S>(cells: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells: Vec<String> = cells.into_iter().map(Into::into).collect();
        if cells.iter().all(|c| c.is_empty()) {
            return None;
        }

        let mut cells = cells.into_iter();
        Some(Self {
            recipient: cells.next(),
            subject: cells.next(),
            body: cells.next(),
            delay_seconds: cells.next(),
        })
    }

    pub fn recipient(&self) -> &str {
        self.recipient.as_deref().unwrap_or_default()
    }

    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Parsed delay; missing or non-integer text yields 0.
    pub fn delay_seconds(&self) -> i64 {
        self.delay_seconds
            .as_deref()
            .and_then(|d| d.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// What the mail transport reported for a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The transport refused or failed; carries the raw fault text.
    Rejected(String),
}

/// A transport failure after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Enhanced status 5.5.2: blank or malformed message content
    EmptyLine,
    /// Enhanced status 5.1.3: malformed recipient address
    BadAddress,
    /// Anything else, verbatim
    Other(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::EmptyLine => write!(f, "empty line"),
            FailureReason::BadAddress => write!(f, "bad address"),
            FailureReason::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Status line sent back to the trigger origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    EmptyQueue,
    Delivery {
        sender: String,
        recipient: String,
        delay_seconds: i64,
        failure: Option<FailureReason>,
    },
    ProcessingError(String),
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Report::EmptyQueue => write!(f, "ℹ️ Queue is empty: no rows to send."),
            Report::Delivery {
                sender,
                recipient,
                delay_seconds,
                failure,
            } => {
                writeln!(f, "✉️ Email sent from account: {sender}")?;
                writeln!(f, "To: {recipient}")?;
                writeln!(f, "Delay: {delay_seconds} seconds")?;
                match failure {
                    None => writeln!(f, "Result: ✅ Sent successfully!")?,
                    Some(reason) => writeln!(f, "Result: ❌ Error: {reason}")?,
                }
                write!(f, "♻️ Row deleted.")
            }
            Report::ProcessingError(fault) => write!(f, "❌ Processing error: {fault}"),
        }
    }
}
