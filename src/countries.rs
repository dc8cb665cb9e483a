//! Supported countries and their search settings.

/// Per-country settings used to scope searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CountryInfo {
    pub name: &'static str,
    /// ISO 3166-1 alpha-2 code.
    pub code: &'static str,
    /// Search engine domain used by the scraping fallback.
    pub search_domain: &'static str,
    pub locale: &'static str,
}

pub(crate) static COUNTRIES: &[CountryInfo] = &[
    CountryInfo {
        name: "United States",
        code: "US",
        search_domain: "google.com",
        locale: "en-US",
    },
    CountryInfo {
        name: "India",
        code: "IN",
        search_domain: "google.co.in",
        locale: "en-IN",
    },
    CountryInfo {
        name: "United Kingdom",
        code: "GB",
        search_domain: "google.co.uk",
        locale: "en-GB",
    },
    CountryInfo {
        name: "Canada",
        code: "CA",
        search_domain: "google.ca",
        locale: "en-CA",
    },
    CountryInfo {
        name: "Australia",
        code: "AU",
        search_domain: "google.com.au",
        locale: "en-AU",
    },
    CountryInfo {
        name: "Germany",
        code: "DE",
        search_domain: "google.de",
        locale: "de-DE",
    },
    CountryInfo {
        name: "France",
        code: "FR",
        search_domain: "google.fr",
        locale: "fr-FR",
    },
    CountryInfo {
        name: "Spain",
        code: "ES",
        search_domain: "google.es",
        locale: "es-ES",
    },
    CountryInfo {
        name: "Italy",
        code: "IT",
        search_domain: "google.it",
        locale: "it-IT",
    },
    CountryInfo {
        name: "Netherlands",
        code: "NL",
        search_domain: "google.nl",
        locale: "nl-NL",
    },
    CountryInfo {
        name: "Brazil",
        code: "BR",
        search_domain: "google.com.br",
        locale: "pt-BR",
    },
    CountryInfo {
        name: "Mexico",
        code: "MX",
        search_domain: "google.com.mx",
        locale: "es-MX",
    },
    CountryInfo {
        name: "Argentina",
        code: "AR",
        search_domain: "google.com.ar",
        locale: "es-AR",
    },
    CountryInfo {
        name: "South Africa",
        code: "ZA",
        search_domain: "google.co.za",
        locale: "en-ZA",
    },
    CountryInfo {
        name: "United Arab Emirates",
        code: "AE",
        search_domain: "google.ae",
        locale: "en-AE",
    },
    CountryInfo {
        name: "Singapore",
        code: "SG",
        search_domain: "google.com.sg",
        locale: "en-SG",
    },
    CountryInfo {
        name: "Japan",
        code: "JP",
        search_domain: "google.co.jp",
        locale: "ja-JP",
    },
    CountryInfo {
        name: "South Korea",
        code: "KR",
        search_domain: "google.co.kr",
        locale: "ko-KR",
    },
    CountryInfo {
        name: "New Zealand",
        code: "NZ",
        search_domain: "google.co.nz",
        locale: "en-NZ",
    },
    CountryInfo {
        name: "Ireland",
        code: "IE",
        search_domain: "google.ie",
        locale: "en-IE",
    },
    CountryInfo {
        name: "Sweden",
        code: "SE",
        search_domain: "google.se",
        locale: "sv-SE",
    },
    CountryInfo {
        name: "Norway",
        code: "NO",
        search_domain: "google.no",
        locale: "no-NO",
    },
    CountryInfo {
        name: "Denmark",
        code: "DK",
        search_domain: "google.dk",
        locale: "da-DK",
    },
    CountryInfo {
        name: "Finland",
        code: "FI",
        search_domain: "google.fi",
        locale: "fi-FI",
    },
    CountryInfo {
        name: "Poland",
        code: "PL",
        search_domain: "google.pl",
        locale: "pl-PL",
    },
    CountryInfo {
        name: "Belgium",
        code: "BE",
        search_domain: "google.be",
        locale: "nl-BE",
    },
    CountryInfo {
        name: "Switzerland",
        code: "CH",
        search_domain: "google.ch",
        locale: "de-CH",
    },
    CountryInfo {
        name: "Austria",
        code: "AT",
        search_domain: "google.at",
        locale: "de-AT",
    },
    CountryInfo {
        name: "Portugal",
        code: "PT",
        search_domain: "google.pt",
        locale: "pt-PT",
    },
    CountryInfo {
        name: "Greece",
        code: "GR",
        search_domain: "google.gr",
        locale: "el-GR",
    },
    CountryInfo {
        name: "Turkey",
        code: "TR",
        search_domain: "google.com.tr",
        locale: "tr-TR",
    },
    CountryInfo {
        name: "Russia",
        code: "RU",
        search_domain: "google.ru",
        locale: "ru-RU",
    },
    CountryInfo {
        name: "China",
        code: "CN",
        search_domain: "google.cn",
        locale: "zh-CN",
    },
    CountryInfo {
        name: "Hong Kong",
        code: "HK",
        search_domain: "google.com.hk",
        locale: "zh-HK",
    },
    CountryInfo {
        name: "Taiwan",
        code: "TW",
        search_domain: "google.com.tw",
        locale: "zh-TW",
    },
    CountryInfo {
        name: "Thailand",
        code: "TH",
        search_domain: "google.co.th",
        locale: "th-TH",
    },
    CountryInfo {
        name: "Malaysia",
        code: "MY",
        search_domain: "google.com.my",
        locale: "en-MY",
    },
    CountryInfo {
        name: "Indonesia",
        code: "ID",
        search_domain: "google.co.id",
        locale: "id-ID",
    },
    CountryInfo {
        name: "Philippines",
        code: "PH",
        search_domain: "google.com.ph",
        locale: "en-PH",
    },
    CountryInfo {
        name: "Vietnam",
        code: "VN",
        search_domain: "google.com.vn",
        locale: "vi-VN",
    },
    CountryInfo {
        name: "Saudi Arabia",
        code: "SA",
        search_domain: "google.com.sa",
        locale: "ar-SA",
    },
    CountryInfo {
        name: "Israel",
        code: "IL",
        search_domain: "google.co.il",
        locale: "iw-IL",
    },
    CountryInfo {
        name: "Egypt",
        code: "EG",
        search_domain: "google.com.eg",
        locale: "ar-EG",
    },
    CountryInfo {
        name: "Nigeria",
        code: "NG",
        search_domain: "google.com.ng",
        locale: "en-NG",
    },
    CountryInfo {
        name: "Kenya",
        code: "KE",
        search_domain: "google.co.ke",
        locale: "en-KE",
    },
    CountryInfo {
        name: "Chile",
        code: "CL",
        search_domain: "google.cl",
        locale: "es-CL",
    },
    CountryInfo {
        name: "Colombia",
        code: "CO",
        search_domain: "google.com.co",
        locale: "es-CO",
    },
    CountryInfo {
        name: "Peru",
        code: "PE",
        search_domain: "google.com.pe",
        locale: "es-PE",
    },
    CountryInfo {
        name: "Venezuela",
        code: "VE",
        search_domain: "google.co.ve",
        locale: "es-VE",
    },
    CountryInfo {
        name: "Ecuador",
        code: "EC",
        search_domain: "google.com.ec",
        locale: "es-EC",
    },
    CountryInfo {
        name: "Uruguay",
        code: "UY",
        search_domain: "google.com.uy",
        locale: "es-UY",
    },
    CountryInfo {
        name: "Costa Rica",
        code: "CR",
        search_domain: "google.co.cr",
        locale: "es-CR",
    },
    CountryInfo {
        name: "Panama",
        code: "PA",
        search_domain: "google.com.pa",
        locale: "es-PA",
    },
    CountryInfo {
        name: "Guatemala",
        code: "GT",
        search_domain: "google.com.gt",
        locale: "es-GT",
    },
    CountryInfo {
        name: "Czech Republic",
        code: "CZ",
        search_domain: "google.cz",
        locale: "cs-CZ",
    },
    CountryInfo {
        name: "Hungary",
        code: "HU",
        search_domain: "google.hu",
        locale: "hu-HU",
    },
    CountryInfo {
        name: "Romania",
        code: "RO",
        search_domain: "google.ro",
        locale: "ro-RO",
    },
    CountryInfo {
        name: "Ukraine",
        code: "UA",
        search_domain: "google.com.ua",
        locale: "uk-UA",
    },
    CountryInfo {
        name: "Pakistan",
        code: "PK",
        search_domain: "google.com.pk",
        locale: "en-PK",
    },
    CountryInfo {
        name: "Bangladesh",
        code: "BD",
        search_domain: "google.com.bd",
        locale: "en-BD",
    },
    CountryInfo {
        name: "Sri Lanka",
        code: "LK",
        search_domain: "google.lk",
        locale: "en-LK",
    },
];

/// Looks up a country by name (case-insensitive) or ISO code.
pub(crate) fn get_country(name: &str) -> Option<&'static CountryInfo> {
    let needle = name.trim();
    COUNTRIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(needle) || c.code.eq_ignore_ascii_case(needle))
}

/// Countries whose name contains the query, ignoring case and spaces.
pub(crate) fn search_countries(query: &str) -> Vec<&'static str> {
    let query_lower = query.trim().to_lowercase();
    let query_compact = query_lower.replace(' ', "");
    COUNTRIES
        .iter()
        .filter(|c| {
            let name_lower = c.name.to_lowercase();
            name_lower.contains(&query_lower) || name_lower.replace(' ', "").contains(&query_compact)
        })
        .map(|c| c.name)
        .collect()
}

pub(crate) fn list_countries() -> Vec<&'static str> {
    COUNTRIES.iter().map(|c| c.name).collect()
}
