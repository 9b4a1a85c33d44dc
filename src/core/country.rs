// src/core/country.rs — Country name → ISO code table and flag rendering

use std::collections::HashMap;
use std::sync::OnceLock;

/// Pseudo-country for time not covered by any stored period.
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// Marker shown instead of a flag for the `unknown` pseudo-country.
pub const UNKNOWN_MARKER: &str = "🕳";

/// Display names (as users type them) and their ISO 3166-1 alpha-2 codes.
const COUNTRIES: &[(&str, &str)] = &[
    ("Австралия", "AU"),
    ("Австрия", "AT"),
    ("Азербайджан", "AZ"),
    ("Албания", "AL"),
    ("Алжир", "DZ"),
    ("Американское Самоа", "AS"),
    ("Ангола", "AO"),
    ("Андорра", "AD"),
    ("Аргентина", "AR"),
    ("Армения", "AM"),
    ("Афганистан", "AF"),
    ("Бангладеш", "BD"),
    ("Беларусь", "BY"),
    ("Бельгия", "BE"),
    ("Болгария", "BG"),
    ("Боливия", "BO"),
    ("Босния и Герцеговина", "BA"),
    ("Бразилия", "BR"),
    ("Великобритания", "GB"),
    ("Венгрия", "HU"),
    ("Венесуэла", "VE"),
    ("Вьетнам", "VN"),
    ("Германия", "DE"),
    ("Гонконг", "HK"),
    ("Греция", "GR"),
    ("Грузия", "GE"),
    ("Дания", "DK"),
    ("Египет", "EG"),
    ("Израиль", "IL"),
    ("Индия", "IN"),
    ("Индонезия", "ID"),
    ("Иордания", "JO"),
    ("Ирак", "IQ"),
    ("Иран", "IR"),
    ("Ирландия", "IE"),
    ("Исландия", "IS"),
    ("Испания", "ES"),
    ("Италия", "IT"),
    ("Казахстан", "KZ"),
    ("Камбоджа", "KH"),
    ("Канада", "CA"),
    ("Катар", "QA"),
    ("Кения", "KE"),
    ("Кипр", "CY"),
    ("Китай", "CN"),
    ("Колумбия", "CO"),
    ("Коста-Рика", "CR"),
    ("Куба", "CU"),
    ("Кыргызстан", "KG"),
    ("Латвия", "LV"),
    ("Ливан", "LB"),
    ("Литва", "LT"),
    ("Люксембург", "LU"),
    ("Малайзия", "MY"),
    ("Мальта", "MT"),
    ("Марокко", "MA"),
    ("Мексика", "MX"),
    ("Молдова", "MD"),
    ("Монголия", "MN"),
    ("Нидерланды", "NL"),
    ("Новая Зеландия", "NZ"),
    ("Норвегия", "NO"),
    ("ОАЭ", "AE"),
    ("Пакистан", "PK"),
    ("Панама", "PA"),
    ("Перу", "PE"),
    ("Польша", "PL"),
    ("Португалия", "PT"),
    ("Россия", "RU"),
    ("Румыния", "RO"),
    ("Саудовская Аравия", "SA"),
    ("Сербия", "RS"),
    ("Сингапур", "SG"),
    ("Словакия", "SK"),
    ("Словения", "SI"),
    ("США", "US"),
    ("Таджикистан", "TJ"),
    ("Таиланд", "TH"),
    ("Тунис", "TN"),
    ("Туркменистан", "TM"),
    ("Турция", "TR"),
    ("Узбекистан", "UZ"),
    ("Украина", "UA"),
    ("Филиппины", "PH"),
    ("Финляндия", "FI"),
    ("Франция", "FR"),
    ("Хорватия", "HR"),
    ("Чехия", "CZ"),
    ("Чили", "CL"),
    ("Швейцария", "CH"),
    ("Швеция", "SE"),
    ("Шри-Ланка", "LK"),
    ("Эстония", "EE"),
    ("ЮАР", "ZA"),
    ("Южная Корея", "KR"),
    ("Япония", "JP"),
];

static CODES: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

fn codes() -> &'static HashMap<&'static str, &'static str> {
    CODES.get_or_init(|| COUNTRIES.iter().copied().collect())
}

/// ISO code for a display name, if the country is known.
pub fn code_for(country: &str) -> Option<&'static str> {
    codes().get(country.trim()).copied()
}

/// Regional-indicator flag for a two-letter code. Empty for anything else.
pub fn flag_for_code(code: &str) -> String {
    let upper = code.to_ascii_uppercase();
    if upper.len() != 2 || !upper.bytes().all(|b| b.is_ascii_uppercase()) {
        return String::new();
    }
    upper
        .bytes()
        .filter_map(|b| char::from_u32(0x1F1E6 + u32::from(b - b'A')))
        .collect()
}

/// Flag glyph for a display name; `None` for `unknown` and unregistered names.
pub fn flag_for(country: &str) -> Option<String> {
    if is_unknown(country) {
        return None;
    }
    code_for(country).map(flag_for_code)
}

pub fn is_unknown(country: &str) -> bool {
    country == UNKNOWN_COUNTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_to_flag() {
        assert_eq!(flag_for_code("RU"), "🇷🇺");
        assert_eq!(flag_for_code("de"), "🇩🇪");
    }

    #[test]
    fn test_flag_for_code_rejects_bad_input() {
        assert_eq!(flag_for_code(""), "");
        assert_eq!(flag_for_code("RUS"), "");
        assert_eq!(flag_for_code("1A"), "");
    }

    #[test]
    fn test_country_code_map() {
        assert_eq!(code_for("Россия"), Some("RU"));
        assert_eq!(code_for("Грузия"), Some("GE"));
        assert_eq!(code_for("Атлантида"), None);
    }

    #[test]
    fn test_flag_for_display_name() {
        assert_eq!(flag_for("Турция").as_deref(), Some("🇹🇷"));
        assert_eq!(flag_for(UNKNOWN_COUNTRY), None);
        assert_eq!(flag_for("Атлантида"), None);
    }

    #[test]
    fn test_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for (_, code) in COUNTRIES {
            assert!(seen.insert(*code), "duplicate code {code}");
        }
    }
}
