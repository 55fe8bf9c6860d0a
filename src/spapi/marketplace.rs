//! Marketplace codes, regions and locales.

/// SP-API selling region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Europe,
    NorthAmerica,
    FarEast,
}

impl Region {
    /// Region serving a marketplace code such as "DE" or "US".
    ///
    /// Unknown codes fall back to Europe.
    pub fn for_marketplace(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "US" | "CA" | "MX" | "BR" => Region::NorthAmerica,
            "JP" | "AU" | "SG" => Region::FarEast,
            _ => Region::Europe,
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Region::Europe => "https://sellingpartnerapi-eu.amazon.com",
            Region::NorthAmerica => "https://sellingpartnerapi-na.amazon.com",
            Region::FarEast => "https://sellingpartnerapi-fe.amazon.com",
        }
    }
}

/// Locale used for product type definition requests.
pub fn locale_for(code: &str) -> &'static str {
    match code.to_ascii_uppercase().as_str() {
        "DE" => "de_DE",
        "FR" => "fr_FR",
        "IT" => "it_IT",
        "ES" => "es_ES",
        "UK" | "GB" => "en_GB",
        "NL" => "nl_NL",
        "BE" => "nl_BE",
        "PL" => "pl_PL",
        "SE" => "sv_SE",
        "IE" => "en_IE",
        _ => "en_GB",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup() {
        assert_eq!(Region::for_marketplace("DE"), Region::Europe);
        assert_eq!(Region::for_marketplace("us"), Region::NorthAmerica);
        assert_eq!(Region::for_marketplace("JP"), Region::FarEast);
        assert_eq!(Region::for_marketplace(""), Region::Europe);
    }

    #[test]
    fn test_locale_lookup() {
        assert_eq!(locale_for("FR"), "fr_FR");
        assert_eq!(locale_for("be"), "nl_BE");
        assert_eq!(locale_for("XX"), "en_GB");
    }
}
