use std::path::Path;

use crate::error::{Error, ErrorKind};

/// Reads the invoice sequence counter from the given file, writes back the
/// incremented value and returns it as this run's invoice number. A missing or
/// unparsable file counts as 1, so the first run ever produces invoice #2 of a
/// fresh sequence, matching the reference behavior. The read-increment-write is
/// not transactional: concurrent runs can race, which is accepted for a tool run
/// by hand once a month.
pub fn next_invoice_id(counter_path: &Path) -> Result<u64, Error> {
    let current_id = std::fs::read_to_string(counter_path)
        .ok()
        .and_then(|raw_id| raw_id.trim().parse::<u64>().ok())
        .unwrap_or(1);
    let next_id = current_id + 1;

    std::fs::write(counter_path, next_id.to_string()).map_err(|error| {
        Error::with_error(
            ErrorKind::Persistence,
            format!("Failed to update the invoice counter {:?}", counter_path),
            &error,
        )
    })?;

    Ok(next_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temporary_counter_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("invoicr-counter-{name}-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn missing_file_starts_the_sequence_at_two() {
        let path = temporary_counter_path("missing");
        assert_eq!(next_invoice_id(&path).unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "2");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn existing_value_is_incremented_and_persisted() {
        let path = temporary_counter_path("existing");
        std::fs::write(&path, "41").unwrap();
        assert_eq!(next_invoice_id(&path).unwrap(), 42);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "42");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn garbage_content_restarts_the_sequence() {
        let path = temporary_counter_path("garbage");
        std::fs::write(&path, "not a number").unwrap();
        assert_eq!(next_invoice_id(&path).unwrap(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
