use crate::api::ClickUpConfig;
use crate::billing::SalaryConfig;
use crate::error::{Error, ErrorKind};
use crate::period::Period;
use crate::render::{BankDetails, Party};

/// The full configuration surface of a run, assembled from environment variables.
/// A missing required variable aborts the run before any network or file I/O,
/// naming the variable.
#[derive(Debug, Clone)]
pub struct Config {
    pub clickup: ClickUpConfig,
    pub from: Party,
    pub to: Party,
    pub bank: BankDetails,
    pub salary: SalaryConfig,
    pub period: Period,
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_environment() -> Result<Config, Error> {
        let clickup = ClickUpConfig {
            private_key: required("CLICKUP_PRIVATE_KEY")?,
            team_id: required("CLICKUP_TEAM_ID")?,
            user_id: required("CLICKUP_USER_ID")?,
        };

        let from = Party {
            name: required("FROM_NAME")?,
            address: required("FROM_ADDRESS")?,
            country: required("FROM_COUNTRY")?,
            postal_code: required("FROM_POSTAL_CODE")?,
            company_id: optional("FROM_ICO"),
            tax_id: optional("FROM_DIC"),
        };
        let to = Party {
            name: required("TO_NAME")?,
            address: required("TO_ADDRESS")?,
            country: required("TO_COUNTRY")?,
            postal_code: required("TO_POSTAL_CODE")?,
            company_id: optional("TO_ICO"),
            tax_id: optional("TO_DIC"),
        };

        let bank = BankDetails {
            bank_name: required("BANK_NAME")?,
            iban: required("IBAN")?,
            bic: required("BIC")?,
        };

        let per_hour_raw = required("PER_HOUR")?;
        let per_hour = per_hour_raw.parse::<f64>().map_err(|error| {
            Error::with_error(
                ErrorKind::Configuration,
                format!("PER_HOUR must be a number, got {:?}", per_hour_raw),
                &error,
            )
        })?;
        let salary = SalaryConfig {
            currency: required("CURRENCY")?,
            per_hour,
        };

        let period = optional("PERIOD")
            .map(|name| Period::from_name(&name))
            .unwrap_or_default();

        Ok(Config {
            clickup,
            from,
            to,
            bank,
            salary,
            period,
        })
    }
}

/// Reads a required environment variable, treating an empty value as missing.
fn required(name: &str) -> Result<String, Error> {
    optional(name).ok_or_else(|| {
        Error::with_context(
            ErrorKind::Configuration,
            format!("Missing required environment variable: {name}"),
        )
    })
}

/// Reads an optional environment variable, treating an empty value as absent.
fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: &[(&str, &str)] = &[
        ("CLICKUP_PRIVATE_KEY", "pk_secret"),
        ("CLICKUP_TEAM_ID", "9001"),
        ("CLICKUP_USER_ID", "42"),
        ("FROM_NAME", "Jane Doe"),
        ("FROM_ADDRESS", "Main Street 1"),
        ("FROM_COUNTRY", "Czech Republic"),
        ("FROM_POSTAL_CODE", "110 00"),
        ("TO_NAME", "ACME Corp"),
        ("TO_ADDRESS", "Industrial Road 99"),
        ("TO_COUNTRY", "Czech Republic"),
        ("TO_POSTAL_CODE", "120 00"),
        ("BANK_NAME", "Example Bank"),
        ("IBAN", "CZ6508000000192000145399"),
        ("BIC", "GIBACZPX"),
        ("CURRENCY", "CZK"),
        ("PER_HOUR", "500"),
    ];

    // Environment variables are process-global, so everything touching them runs
    // inside this one test to avoid races between parallel tests.
    #[test]
    fn loads_and_validates_the_environment() {
        for (name, value) in REQUIRED {
            std::env::set_var(name, value);
        }
        std::env::set_var("FROM_ICO", "12345678");
        std::env::remove_var("FROM_DIC");
        std::env::remove_var("PERIOD");

        let config = Config::from_environment().unwrap();
        assert_eq!(config.salary.currency, "CZK");
        assert_eq!(config.salary.per_hour, 500.0);
        assert_eq!(config.from.company_id.as_deref(), Some("12345678"));
        assert_eq!(config.from.tax_id, None);
        assert_eq!(config.period, Period::Last);

        std::env::set_var("PERIOD", "this");
        let config = Config::from_environment().unwrap();
        assert_eq!(config.period, Period::This);

        // A missing required variable aborts with its name in the message
        std::env::remove_var("IBAN");
        let error = Config::from_environment().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
        assert!(error.to_string().contains("IBAN"));
        std::env::set_var("IBAN", "CZ6508000000192000145399");

        // An unparsable rate is a configuration error as well
        std::env::set_var("PER_HOUR", "five hundred");
        let error = Config::from_environment().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
        assert!(error.to_string().contains("PER_HOUR"));
    }
}
