//! Static country catalog: ISO code, display name, storefront currency.
//!
//! Loaded once at startup and read-only for the rest of the run. The
//! currency column is what the storefront actually bills in, which is not
//! always the national currency (many markets bill in USD, EU-adjacent
//! markets in EUR).

/// One country the scraper knows how to visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryEntry {
    /// ISO 3166-1 alpha-2 code, unique key.
    pub code: &'static str,
    pub name: &'static str,
    /// ISO 4217 code the storefront displays prices in.
    pub currency: &'static str,
}

impl CountryEntry {
    /// Storefront URLs to try, most reliable first. The `-en` variant forces
    /// English plan names, which keeps the reference-plan lookup stable; the
    /// bare locale is the fallback when the English page 404s.
    pub fn storefront_urls(&self) -> [String; 2] {
        let cc = self.code.to_lowercase();
        [
            format!("https://www.spotify.com/{cc}-en/premium"),
            format!("https://www.spotify.com/{cc}/premium"),
        ]
    }
}

/// Look up a catalog entry by ISO code.
pub fn lookup(code: &str) -> Option<&'static CountryEntry> {
    COUNTRIES.iter().find(|c| c.code == code)
}

/// Every country the scraper visits, in catalog (code) order.
pub fn all() -> &'static [CountryEntry] {
    &COUNTRIES
}

static COUNTRIES: [CountryEntry; 183] = [
    CountryEntry { code: "AD", name: "Andorra", currency: "EUR" },
    CountryEntry { code: "AE", name: "United Arab Emirates", currency: "AED" },
    CountryEntry { code: "AG", name: "Antigua and Barbuda", currency: "USD" },
    CountryEntry { code: "AL", name: "Albania", currency: "EUR" },
    CountryEntry { code: "AM", name: "Armenia", currency: "USD" },
    CountryEntry { code: "AO", name: "Angola", currency: "USD" },
    CountryEntry { code: "AR", name: "Argentina", currency: "ARS" },
    CountryEntry { code: "AT", name: "Austria", currency: "EUR" },
    CountryEntry { code: "AU", name: "Australia", currency: "AUD" },
    CountryEntry { code: "AZ", name: "Azerbaijan", currency: "USD" },
    CountryEntry { code: "BA", name: "Bosnia and Herzegovina", currency: "EUR" },
    CountryEntry { code: "BB", name: "Barbados", currency: "USD" },
    CountryEntry { code: "BD", name: "Bangladesh", currency: "BDT" },
    CountryEntry { code: "BE", name: "Belgium", currency: "EUR" },
    CountryEntry { code: "BF", name: "Burkina Faso", currency: "USD" },
    CountryEntry { code: "BG", name: "Bulgaria", currency: "BGN" },
    CountryEntry { code: "BH", name: "Bahrain", currency: "USD" },
    CountryEntry { code: "BI", name: "Burundi", currency: "USD" },
    CountryEntry { code: "BJ", name: "Benin", currency: "USD" },
    CountryEntry { code: "BN", name: "Brunei Darussalam", currency: "USD" },
    CountryEntry { code: "BO", name: "Bolivia", currency: "USD" },
    CountryEntry { code: "BR", name: "Brazil", currency: "BRL" },
    CountryEntry { code: "BS", name: "The Bahamas", currency: "USD" },
    CountryEntry { code: "BT", name: "Bhutan", currency: "USD" },
    CountryEntry { code: "BW", name: "Botswana", currency: "USD" },
    CountryEntry { code: "BY", name: "Belarus", currency: "USD" },
    CountryEntry { code: "BZ", name: "Belize", currency: "USD" },
    CountryEntry { code: "CA", name: "Canada", currency: "CAD" },
    CountryEntry { code: "CD", name: "Democratic Republic of the Congo", currency: "USD" },
    CountryEntry { code: "CG", name: "Republic of the Congo", currency: "USD" },
    CountryEntry { code: "CH", name: "Switzerland", currency: "CHF" },
    CountryEntry { code: "CI", name: "Côte d'Ivoire", currency: "USD" },
    CountryEntry { code: "CL", name: "Chile", currency: "CLP" },
    CountryEntry { code: "CM", name: "Cameroon", currency: "USD" },
    CountryEntry { code: "CO", name: "Colombia", currency: "COP" },
    CountryEntry { code: "CR", name: "Costa Rica", currency: "CRC" },
    CountryEntry { code: "CV", name: "Cabo Verde", currency: "USD" },
    CountryEntry { code: "CW", name: "Curacao", currency: "USD" },
    CountryEntry { code: "CY", name: "Cyprus", currency: "EUR" },
    CountryEntry { code: "CZ", name: "Czech Republic", currency: "CZK" },
    CountryEntry { code: "DE", name: "Germany", currency: "EUR" },
    CountryEntry { code: "DJ", name: "Djibouti", currency: "USD" },
    CountryEntry { code: "DK", name: "Denmark", currency: "DKK" },
    CountryEntry { code: "DM", name: "Dominica", currency: "USD" },
    CountryEntry { code: "DO", name: "Dominican Republic", currency: "USD" },
    CountryEntry { code: "EC", name: "Ecuador", currency: "USD" },
    CountryEntry { code: "EE", name: "Estonia", currency: "EUR" },
    CountryEntry { code: "EG", name: "Egypt", currency: "EGP" },
    CountryEntry { code: "ES", name: "Spain", currency: "EUR" },
    CountryEntry { code: "ET", name: "Ethiopia", currency: "USD" },
    CountryEntry { code: "FI", name: "Finland", currency: "EUR" },
    CountryEntry { code: "FJ", name: "Fiji", currency: "USD" },
    CountryEntry { code: "FM", name: "Micronesia", currency: "USD" },
    CountryEntry { code: "FR", name: "France", currency: "EUR" },
    CountryEntry { code: "GA", name: "Gabon", currency: "USD" },
    CountryEntry { code: "GB", name: "United Kingdom", currency: "GBP" },
    CountryEntry { code: "GD", name: "Grenada", currency: "USD" },
    CountryEntry { code: "GE", name: "Georgia", currency: "USD" },
    CountryEntry { code: "GH", name: "Ghana", currency: "GHS" },
    CountryEntry { code: "GM", name: "The Gambia", currency: "USD" },
    CountryEntry { code: "GN", name: "Guinea", currency: "USD" },
    CountryEntry { code: "GQ", name: "Equatorial Guinea", currency: "USD" },
    CountryEntry { code: "GR", name: "Greece", currency: "EUR" },
    CountryEntry { code: "GT", name: "Guatemala", currency: "GTQ" },
    CountryEntry { code: "GW", name: "Guinea-Bissau", currency: "USD" },
    CountryEntry { code: "GY", name: "Guyana", currency: "USD" },
    CountryEntry { code: "HK", name: "Hong Kong", currency: "HKD" },
    CountryEntry { code: "HN", name: "Honduras", currency: "USD" },
    CountryEntry { code: "HR", name: "Croatia", currency: "EUR" },
    CountryEntry { code: "HT", name: "Haiti", currency: "USD" },
    CountryEntry { code: "HU", name: "Hungary", currency: "HUF" },
    CountryEntry { code: "ID", name: "Indonesia", currency: "IDR" },
    CountryEntry { code: "IE", name: "Ireland", currency: "EUR" },
    CountryEntry { code: "IL", name: "Israel", currency: "ILS" },
    CountryEntry { code: "IN", name: "India", currency: "INR" },
    CountryEntry { code: "IQ", name: "Iraq", currency: "IQD" },
    CountryEntry { code: "IS", name: "Iceland", currency: "EUR" },
    CountryEntry { code: "IT", name: "Italy", currency: "EUR" },
    CountryEntry { code: "JM", name: "Jamaica", currency: "USD" },
    CountryEntry { code: "JO", name: "Jordan", currency: "USD" },
    CountryEntry { code: "JP", name: "Japan", currency: "JPY" },
    CountryEntry { code: "KE", name: "Kenya", currency: "KES" },
    CountryEntry { code: "KG", name: "Kyrgyz Republic", currency: "USD" },
    CountryEntry { code: "KH", name: "Cambodia", currency: "USD" },
    CountryEntry { code: "KI", name: "Kiribati", currency: "AUD" },
    CountryEntry { code: "KM", name: "Comoros", currency: "USD" },
    CountryEntry { code: "KN", name: "St. Kitts and Nevis", currency: "USD" },
    CountryEntry { code: "KR", name: "South Korea", currency: "KRW" },
    CountryEntry { code: "KW", name: "Kuwait", currency: "USD" },
    CountryEntry { code: "KZ", name: "Kazakhstan", currency: "USD" },
    CountryEntry { code: "LA", name: "Laos", currency: "USD" },
    CountryEntry { code: "LB", name: "Lebanon", currency: "USD" },
    CountryEntry { code: "LC", name: "St. Lucia", currency: "USD" },
    CountryEntry { code: "LI", name: "Liechtenstein", currency: "CHF" },
    CountryEntry { code: "LK", name: "Sri Lanka", currency: "LKR" },
    CountryEntry { code: "LR", name: "Liberia", currency: "USD" },
    CountryEntry { code: "LS", name: "Lesotho", currency: "USD" },
    CountryEntry { code: "LT", name: "Lithuania", currency: "EUR" },
    CountryEntry { code: "LU", name: "Luxembourg", currency: "EUR" },
    CountryEntry { code: "LV", name: "Latvia", currency: "EUR" },
    CountryEntry { code: "LY", name: "Libya", currency: "USD" },
    CountryEntry { code: "MA", name: "Morocco", currency: "MAD" },
    CountryEntry { code: "MC", name: "Monaco", currency: "EUR" },
    CountryEntry { code: "MD", name: "Moldova", currency: "USD" },
    CountryEntry { code: "ME", name: "Montenegro", currency: "EUR" },
    CountryEntry { code: "MG", name: "Madagascar", currency: "USD" },
    CountryEntry { code: "MH", name: "Marshall Islands", currency: "USD" },
    CountryEntry { code: "MK", name: "North Macedonia", currency: "EUR" },
    CountryEntry { code: "ML", name: "Mali", currency: "USD" },
    CountryEntry { code: "MN", name: "Mongolia", currency: "USD" },
    CountryEntry { code: "MO", name: "Macao", currency: "USD" },
    CountryEntry { code: "MR", name: "Mauritania", currency: "USD" },
    CountryEntry { code: "MT", name: "Malta", currency: "EUR" },
    CountryEntry { code: "MU", name: "Mauritius", currency: "USD" },
    CountryEntry { code: "MV", name: "Maldives", currency: "USD" },
    CountryEntry { code: "MW", name: "Malawi", currency: "USD" },
    CountryEntry { code: "MX", name: "Mexico", currency: "MXN" },
    CountryEntry { code: "MY", name: "Malaysia", currency: "MYR" },
    CountryEntry { code: "MZ", name: "Mozambique", currency: "USD" },
    CountryEntry { code: "NA", name: "Namibia", currency: "USD" },
    CountryEntry { code: "NE", name: "Niger", currency: "USD" },
    CountryEntry { code: "NG", name: "Nigeria", currency: "NGN" },
    CountryEntry { code: "NI", name: "Nicaragua", currency: "USD" },
    CountryEntry { code: "NL", name: "Netherlands", currency: "EUR" },
    CountryEntry { code: "NO", name: "Norway", currency: "NOK" },
    CountryEntry { code: "NP", name: "Nepal", currency: "USD" },
    CountryEntry { code: "NR", name: "Nauru", currency: "AUD" },
    CountryEntry { code: "NZ", name: "New Zealand", currency: "NZD" },
    CountryEntry { code: "OM", name: "Oman", currency: "USD" },
    CountryEntry { code: "PA", name: "Panama", currency: "USD" },
    CountryEntry { code: "PE", name: "Peru", currency: "PEN" },
    CountryEntry { code: "PG", name: "Papua New Guinea", currency: "USD" },
    CountryEntry { code: "PH", name: "Philippines", currency: "PHP" },
    CountryEntry { code: "PK", name: "Pakistan", currency: "PKR" },
    CountryEntry { code: "PL", name: "Poland", currency: "PLN" },
    CountryEntry { code: "PS", name: "Palestine", currency: "USD" },
    CountryEntry { code: "PT", name: "Portugal", currency: "EUR" },
    CountryEntry { code: "PW", name: "Palau", currency: "USD" },
    CountryEntry { code: "PY", name: "Paraguay", currency: "PYG" },
    CountryEntry { code: "QA", name: "Qatar", currency: "QAR" },
    CountryEntry { code: "RO", name: "Romania", currency: "RON" },
    CountryEntry { code: "RS", name: "Serbia", currency: "EUR" },
    CountryEntry { code: "RW", name: "Rwanda", currency: "USD" },
    CountryEntry { code: "SA", name: "Saudi Arabia", currency: "SAR" },
    CountryEntry { code: "SB", name: "Solomon Islands", currency: "USD" },
    CountryEntry { code: "SC", name: "Seychelles", currency: "USD" },
    CountryEntry { code: "SE", name: "Sweden", currency: "SEK" },
    CountryEntry { code: "SG", name: "Singapore", currency: "SGD" },
    CountryEntry { code: "SI", name: "Slovenia", currency: "EUR" },
    CountryEntry { code: "SK", name: "Slovakia", currency: "EUR" },
    CountryEntry { code: "SL", name: "Sierra Leone", currency: "USD" },
    CountryEntry { code: "SM", name: "San Marino", currency: "EUR" },
    CountryEntry { code: "SN", name: "Senegal", currency: "USD" },
    CountryEntry { code: "SR", name: "Suriname", currency: "USD" },
    CountryEntry { code: "ST", name: "Sao Tome and Principe", currency: "USD" },
    CountryEntry { code: "SV", name: "El Salvador", currency: "USD" },
    CountryEntry { code: "SZ", name: "Eswatini", currency: "USD" },
    CountryEntry { code: "TD", name: "Chad", currency: "USD" },
    CountryEntry { code: "TG", name: "Togo", currency: "USD" },
    CountryEntry { code: "TH", name: "Thailand", currency: "THB" },
    CountryEntry { code: "TJ", name: "Tajikistan", currency: "USD" },
    CountryEntry { code: "TL", name: "Timor-Leste", currency: "USD" },
    CountryEntry { code: "TN", name: "Tunisia", currency: "TND" },
    CountryEntry { code: "TO", name: "Tonga", currency: "USD" },
    CountryEntry { code: "TR", name: "Turkey", currency: "TRY" },
    CountryEntry { code: "TT", name: "Trinidad and Tobago", currency: "USD" },
    CountryEntry { code: "TV", name: "Tuvalu", currency: "AUD" },
    CountryEntry { code: "TW", name: "Taiwan", currency: "TWD" },
    CountryEntry { code: "TZ", name: "Tanzania", currency: "TZS" },
    CountryEntry { code: "UA", name: "Ukraine", currency: "USD" },
    CountryEntry { code: "UG", name: "Uganda", currency: "UGX" },
    CountryEntry { code: "US", name: "USA", currency: "USD" },
    CountryEntry { code: "UY", name: "Uruguay", currency: "UYU" },
    CountryEntry { code: "UZ", name: "Uzbekistan", currency: "USD" },
    CountryEntry { code: "VC", name: "St. Vincent and the Grenadines", currency: "USD" },
    CountryEntry { code: "VE", name: "Venezuela", currency: "USD" },
    CountryEntry { code: "VN", name: "Vietnam", currency: "VND" },
    CountryEntry { code: "VU", name: "Vanuatu", currency: "USD" },
    CountryEntry { code: "WS", name: "Samoa", currency: "USD" },
    CountryEntry { code: "XK", name: "Kosovo", currency: "EUR" },
    CountryEntry { code: "ZA", name: "South Africa", currency: "ZAR" },
    CountryEntry { code: "ZM", name: "Zambia", currency: "USD" },
    CountryEntry { code: "ZW", name: "Zimbabwe", currency: "USD" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique_and_sorted() {
        let codes: Vec<&str> = all().iter().map(|c| c.code).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn lookup_finds_known_markets() {
        assert_eq!(lookup("NG").unwrap().currency, "NGN");
        assert_eq!(lookup("IN").unwrap().currency, "INR");
        assert_eq!(lookup("US").unwrap().currency, "USD");
        assert!(lookup("ZZ").is_none());
    }

    #[test]
    fn storefront_urls_prefer_english_variant() {
        let urls = lookup("DE").unwrap().storefront_urls();
        assert_eq!(urls[0], "https://www.spotify.com/de-en/premium");
        assert_eq!(urls[1], "https://www.spotify.com/de/premium");
    }

    #[test]
    fn currencies_are_iso4217_shaped() {
        for c in all() {
            assert_eq!(c.currency.len(), 3, "{}", c.code);
            assert!(c.currency.chars().all(|ch| ch.is_ascii_uppercase()));
            assert_eq!(c.code.len(), 2, "{}", c.code);
        }
    }
}
