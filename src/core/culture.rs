/// Number and date formatting rules plus case mapping for one locale.
///
/// Only the handful of locales the engine needs are built in; anything else
/// is rejected when the session is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culture {
    name: String,
    decimal_separator: char,
    date_format: String,
    input_date_formats: Vec<String>,
    ordinal: bool,
    turkic_casing: bool,
}

const INVARIANT_DATE: &str = "%Y-%m-%d %H:%M:%S%.f";

impl Culture {
    #[must_use]
    pub fn invariant() -> Self {
        Self::build("", '.', INVARIANT_DATE, &[])
    }

    /// Code-point ordering, invariant formatting.
    #[must_use]
    pub fn ordinal() -> Self {
        Self {
            ordinal: true,
            ..Self::build("ordinal", '.', INVARIANT_DATE, &[])
        }
    }

    pub fn from_name(name: &str) -> Result<Self, super::QueryError> {
        let culture = match name.to_ascii_lowercase().as_str() {
            "" | "invariant" => Self::invariant(),
            "ordinal" => Self::ordinal(),
            "en-us" => Self::build("en-US", '.', "%m/%d/%Y %H:%M:%S%.f", &["%m/%d/%Y"]),
            "en-gb" => Self::build("en-GB", '.', "%d/%m/%Y %H:%M:%S%.f", &["%d/%m/%Y"]),
            "de-de" => Self::build("de-DE", ',', "%d.%m.%Y %H:%M:%S%.f", &["%d.%m.%Y"]),
            "ru-ru" => Self::build("ru-RU", ',', "%d.%m.%Y %H:%M:%S%.f", &["%d.%m.%Y"]),
            "fr-fr" => Self::build("fr-FR", ',', "%d/%m/%Y %H:%M:%S%.f", &["%d/%m/%Y"]),
            "tr-tr" => Self {
                turkic_casing: true,
                ..Self::build("tr-TR", ',', "%d.%m.%Y %H:%M:%S%.f", &["%d.%m.%Y"])
            },
            _ => return Err(super::QueryError::Config(format!("Unknown culture '{name}'"))),
        };
        Ok(culture)
    }

    fn build(name: &str, decimal_separator: char, date_format: &str, date_only: &[&str]) -> Self {
        // The culture's own format first, then ISO forms every culture accepts.
        let mut input_date_formats = vec![date_format.to_string()];
        input_date_formats.extend(date_only.iter().map(|f| (*f).to_string()));
        for iso in [INVARIANT_DATE, "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%d"] {
            if !input_date_formats.iter().any(|f| f == iso) {
                input_date_formats.push(iso.to_string());
            }
        }
        Self {
            name: name.to_string(),
            decimal_separator,
            date_format: date_format.to_string(),
            input_date_formats,
            ordinal: false,
            turkic_casing: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_invariant(&self) -> bool {
        self.name.is_empty() || self.ordinal
    }

    #[must_use]
    pub const fn is_ordinal(&self) -> bool {
        self.ordinal
    }

    #[must_use]
    pub const fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    #[must_use]
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    #[must_use]
    pub fn input_date_formats(&self) -> &[String] {
        &self.input_date_formats
    }

    /// Lower-cases using this culture's case mapping.
    #[must_use]
    pub fn to_lower(&self, text: &str) -> String {
        if self.turkic_casing {
            text.chars()
                .flat_map(|c| match c {
                    'I' => vec!['ı'],
                    'İ' => vec!['i'],
                    other => other.to_lowercase().collect(),
                })
                .collect()
        } else {
            text.to_lowercase()
        }
    }

    #[must_use]
    pub fn to_upper(&self, text: &str) -> String {
        if self.turkic_casing {
            text.chars()
                .flat_map(|c| match c {
                    'i' => vec!['İ'],
                    'ı' => vec!['I'],
                    other => other.to_uppercase().collect(),
                })
                .collect()
        } else {
            text.to_uppercase()
        }
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}
