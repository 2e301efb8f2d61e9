//! Locale-aware sample values
//!
//! The synthesizer asks a [`FakeData`] source for realistic-looking strings.
//! [`LocaleFaker`] answers from a fixed per-locale table, so repeated runs
//! produce identical scripts.

use tracing::warn;

/// Source of sample values for string formats and name hints
#[cfg_attr(test, mockall::automock)]
pub trait FakeData {
    fn first_name(&self) -> String;
    fn last_name(&self) -> String;
    fn full_name(&self) -> String;
    fn email(&self) -> String;
    fn phone_number(&self) -> String;
    fn city(&self) -> String;
    fn street_address(&self) -> String;
    fn postal_code(&self) -> String;
    fn country_code(&self) -> String;
    fn company(&self) -> String;
    fn word(&self) -> String;
    fn sentence(&self) -> String;
    fn url(&self) -> String;
    fn uuid(&self) -> String;
    fn date(&self) -> String;
    fn date_time(&self) -> String;
    fn time(&self) -> String;
    fn password(&self) -> String;
}

struct LocaleTable {
    locale: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    email_domain: &'static str,
    phone_number: &'static str,
    city: &'static str,
    street_address: &'static str,
    postal_code: &'static str,
    country_code: &'static str,
    company: &'static str,
    word: &'static str,
    sentence: &'static str,
    url: &'static str,
}

const LOCALES: &[LocaleTable] = &[
    LocaleTable {
        locale: "en_US",
        first_name: "John",
        last_name: "Smith",
        email_domain: "example.com",
        phone_number: "+1-202-555-0143",
        city: "Springfield",
        street_address: "742 Evergreen Terrace",
        postal_code: "62704",
        country_code: "US",
        company: "Acme Corporation",
        word: "sample",
        sentence: "The quick brown fox jumps over the lazy dog.",
        url: "https://www.example.com",
    },
    LocaleTable {
        locale: "en_GB",
        first_name: "Oliver",
        last_name: "Taylor",
        email_domain: "example.co.uk",
        phone_number: "+44 20 7946 0958",
        city: "Manchester",
        street_address: "221B Baker Street",
        postal_code: "SW1A 1AA",
        country_code: "GB",
        company: "Brightwell Ltd",
        word: "sample",
        sentence: "A journey of a thousand miles begins with a single step.",
        url: "https://www.example.co.uk",
    },
    LocaleTable {
        locale: "de_DE",
        first_name: "Lukas",
        last_name: "Müller",
        email_domain: "beispiel.de",
        phone_number: "+49 30 901820",
        city: "Berlin",
        street_address: "Hauptstraße 5",
        postal_code: "10115",
        country_code: "DE",
        company: "Musterfirma GmbH",
        word: "beispiel",
        sentence: "Franz jagt im komplett verwahrlosten Taxi quer durch Bayern.",
        url: "https://www.beispiel.de",
    },
    LocaleTable {
        locale: "fr_FR",
        first_name: "Camille",
        last_name: "Dubois",
        email_domain: "exemple.fr",
        phone_number: "+33 1 70 36 39 50",
        city: "Lyon",
        street_address: "12 rue de la Paix",
        postal_code: "75002",
        country_code: "FR",
        company: "Société Exemple SARL",
        word: "exemple",
        sentence: "Portez ce vieux whisky au juge blond qui fume.",
        url: "https://www.exemple.fr",
    },
    LocaleTable {
        locale: "es_ES",
        first_name: "Lucía",
        last_name: "García",
        email_domain: "ejemplo.es",
        phone_number: "+34 912 345 678",
        city: "Sevilla",
        street_address: "Calle Mayor 10",
        postal_code: "28013",
        country_code: "ES",
        company: "Ejemplo S.L.",
        word: "ejemplo",
        sentence: "El veloz murciélago hindú comía feliz cardillo y kiwi.",
        url: "https://www.ejemplo.es",
    },
    LocaleTable {
        locale: "ja_JP",
        first_name: "Haruto",
        last_name: "Sato",
        email_domain: "example.jp",
        phone_number: "+81 3-1234-5678",
        city: "Osaka",
        street_address: "1-1 Chiyoda",
        postal_code: "100-0001",
        country_code: "JP",
        company: "Rei Kabushiki Kaisha",
        word: "rei",
        sentence: "いろはにほへと ちりぬるを",
        url: "https://www.example.jp",
    },
];

/// Table-backed [`FakeData`] for one locale
pub struct LocaleFaker {
    table: &'static LocaleTable,
}

impl LocaleFaker {
    /// Faker for `locale` (e.g. "de_DE" or "de-DE"); unknown locales fall back to en_US
    pub fn new(locale: &str) -> Self {
        let wanted = locale.replace('-', "_");
        let table = LOCALES
            .iter()
            .find(|t| t.locale.eq_ignore_ascii_case(&wanted))
            .or_else(|| {
                // Match on language alone ("de" -> de_DE)
                let language = wanted.split('_').next().unwrap_or_default();
                LOCALES
                    .iter()
                    .find(|t| t.locale.split('_').next() == Some(language))
            });

        let table = match table {
            Some(table) => table,
            None => {
                warn!("Unsupported faker locale {}, falling back to en_US", locale);
                &LOCALES[0]
            }
        };

        Self { table }
    }

    /// Locale actually in use
    pub fn locale(&self) -> &'static str {
        self.table.locale
    }

    /// Locales with a value table
    pub fn supported_locales() -> impl Iterator<Item = &'static str> {
        LOCALES.iter().map(|t| t.locale)
    }
}

impl Default for LocaleFaker {
    fn default() -> Self {
        Self::new("en_US")
    }
}

impl FakeData for LocaleFaker {
    fn first_name(&self) -> String {
        self.table.first_name.to_string()
    }

    fn last_name(&self) -> String {
        self.table.last_name.to_string()
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.table.first_name, self.table.last_name)
    }

    fn email(&self) -> String {
        format!(
            "{}.{}@{}",
            ascii_fold(self.table.first_name),
            ascii_fold(self.table.last_name),
            self.table.email_domain
        )
    }

    fn phone_number(&self) -> String {
        self.table.phone_number.to_string()
    }

    fn city(&self) -> String {
        self.table.city.to_string()
    }

    fn street_address(&self) -> String {
        self.table.street_address.to_string()
    }

    fn postal_code(&self) -> String {
        self.table.postal_code.to_string()
    }

    fn country_code(&self) -> String {
        self.table.country_code.to_string()
    }

    fn company(&self) -> String {
        self.table.company.to_string()
    }

    fn word(&self) -> String {
        self.table.word.to_string()
    }

    fn sentence(&self) -> String {
        self.table.sentence.to_string()
    }

    fn url(&self) -> String {
        self.table.url.to_string()
    }

    fn uuid(&self) -> String {
        "3fa85f64-5717-4562-b3fc-2c963f66afa6".to_string()
    }

    fn date(&self) -> String {
        "2024-01-15".to_string()
    }

    fn date_time(&self) -> String {
        "2024-01-15T09:30:00Z".to_string()
    }

    fn time(&self) -> String {
        "09:30:00".to_string()
    }

    fn password(&self) -> String {
        "S3cure!Passw0rd".to_string()
    }
}

/// Lower-cased ASCII rendering of a name for use in email local parts
fn ascii_fold(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            'ä' | 'Ä' => "ae".chars().collect::<Vec<_>>(),
            'ö' | 'Ö' => "oe".chars().collect(),
            'ü' | 'Ü' => "ue".chars().collect(),
            'ß' => "ss".chars().collect(),
            'á' | 'à' | 'â' => vec!['a'],
            'é' | 'è' | 'ê' | 'ë' => vec!['e'],
            'í' | 'ì' | 'î' => vec!['i'],
            'ó' | 'ò' | 'ô' => vec!['o'],
            'ú' | 'ù' | 'û' => vec!['u'],
            'ñ' => vec!['n'],
            'ç' => vec!['c'],
            c if c.is_ascii_alphanumeric() => vec![c.to_ascii_lowercase()],
            _ => Vec::new(),
        })
        .collect()
}
