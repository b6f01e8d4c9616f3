/// The category an error belongs to. Every failure in this program is fatal and
/// unrecovered, the kind only tells the user which stage of the run broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required configuration value is missing or unparsable.
    Configuration,
    /// The document backend or the font asset could not be set up.
    Initialization,
    /// The time tracking API call failed or returned an unexpected body.
    Fetch,
    /// Writing the final document (or the invoice counter) to disk failed.
    Persistence,
}

/// An error with a kind, a context and possibly the propagated source error.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
    pub source_error: Option<String>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_error {
            Some(source_error) => write!(
                formatter,
                "{}: {}",
                self.context,
                minimize_first_letter(source_error.to_string()),
            ),
            None => write!(formatter, "{}", self.context),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a new `Error` of the given kind with the given context.
    pub fn with_context<S: Into<String>>(kind: ErrorKind, context: S) -> Error {
        Error {
            kind,
            context: context.into(),
            source_error: None,
        }
    }

    /// Create a new `Error` of the given kind with the given context and source error.
    pub fn with_error<S: Into<String>>(
        kind: ErrorKind,
        context: S,
        error: &dyn std::error::Error,
    ) -> Error {
        Error {
            kind,
            context: context.into(),
            source_error: Some(error.to_string()),
        }
    }
}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_context_and_lowercased_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        let error = Error::with_error(ErrorKind::Initialization, "Failed to read font", &source);
        assert_eq!(error.to_string(), "Failed to read font: no such file");
    }

    #[test]
    fn display_without_source_is_just_the_context() {
        let error = Error::with_context(
            ErrorKind::Configuration,
            "Missing required environment variable: IBAN",
        );
        assert_eq!(
            error.to_string(),
            "Missing required environment variable: IBAN"
        );
    }
}
