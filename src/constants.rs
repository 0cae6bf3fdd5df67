/// Source name constants to ensure consistency across the codebase

// Source names (used in CLI)
pub const AMAZON_SOURCE: &str = "amazon";
pub const JUMIA_SOURCE: &str = "jumia";
pub const JUMIA_LAPTOPS_SOURCE: &str = "jumia_laptops";
pub const MARJANE_SOURCE: &str = "marjane";
pub const EBAY_SOURCE: &str = "ebay";
pub const CDISCOUNT_SOURCE: &str = "cdiscount";

// Base URLs used to resolve relative links
pub const AMAZON_BASE_URL: &str = "https://www.amazon.com";
pub const JUMIA_BASE_URL: &str = "https://www.jumia.ma";
pub const MARJANE_BASE_URL: &str = "https://www.marjanemall.ma";
pub const EBAY_BASE_URL: &str = "https://www.ebay.com";
pub const CDISCOUNT_BASE_URL: &str = "https://www.cdiscount.com";

// Default listing entry points
pub const AMAZON_START_URL: &str = "https://www.amazon.com/s?i=fashion-womens-intl-ship&bbn=16225018011&rh=n%3A7141123011&dc&language=en_US";
pub const JUMIA_START_URL: &str = "https://www.jumia.ma/refrigerateurs-frigo";
pub const JUMIA_LAPTOPS_START_URL: &str = "https://www.jumia.ma/pc-portables/";
pub const MARJANE_START_URL: &str = "https://www.marjanemall.ma/vetements-chaussures-bijoux-accessoires";
pub const EBAY_START_URL: &str = "https://www.ebay.com/sch/i.html?_nkw=laptop";
pub const CDISCOUNT_START_URL: &str = "https://www.cdiscount.com/search/10/laptop.html";

/// Marker for a schema field that could not be extracted from an item
pub const SENTINEL: &str = "N/A";

/// Value of an attribute facet no rule matched
pub const UNKNOWN: &str = "Unknown";

/// Promotion column value for items without any promotion badge
pub const NO_PROMOTION: &str = "None";

/// Format of the per-page collection timestamp
pub const COLLECTION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get all supported source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![
        AMAZON_SOURCE,
        JUMIA_SOURCE,
        JUMIA_LAPTOPS_SOURCE,
        MARJANE_SOURCE,
        EBAY_SOURCE,
        CDISCOUNT_SOURCE,
    ]
}
