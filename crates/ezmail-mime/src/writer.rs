//! Line sink the builder streams a message into.

/// Receives the rendered message one line at a time, without terminators.
///
/// Header lines arrive first, the blank separator line included, then body
/// lines. The associated error lets a sink report its own failures (a
/// closed connection, say) through the builder.
#[allow(async_fn_in_trait)]
pub trait MailWriter {
    /// Error type returned by the sink. Builder errors convert into it.
    type Error: From<crate::Error>;

    /// Writes one header line.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if the line cannot be written.
    async fn write_header(&mut self, line: &str) -> Result<(), Self::Error>;

    /// Writes one body line.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if the line cannot be written.
    async fn write_body(&mut self, line: &str) -> Result<(), Self::Error>;
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineCollector {
    /// Header lines in write order.
    pub header: Vec<String>,
    /// Body lines in write order.
    pub body: Vec<String>,
}

impl LineCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the message as it would appear on the wire, CRLF-terminated.
    #[must_use]
    pub fn to_message(&self) -> String {
        self.header
            .iter()
            .chain(&self.body)
            .map(|line| format!("{line}\r\n"))
            .collect()
    }
}

impl MailWriter for LineCollector {
    type Error = crate::Error;

    async fn write_header(&mut self, line: &str) -> crate::Result<()> {
        self.header.push(line.to_string());
        Ok(())
    }

    async fn write_body(&mut self, line: &str) -> crate::Result<()> {
        self.body.push(line.to_string());
        Ok(())
    }
}
