use std::sync::LazyLock;

use regex::Regex;

use super::{parse_amount, CargoFields, RouteFields};

type Rule = fn(&str) -> Option<String>;

static PLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-ZА-ЯЁ])\s?(\d{3})\s?([A-ZА-ЯЁ]{2})\s?(\d{2,3})\b").unwrap()
});

static ORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\b(?:откуда|начало)\b\s*[:\-]?\s*(.+?)\s*(?:[,;.]?\s*\b(?:куда|до|конец)\b|;|$)",
    )
    .unwrap()
});

static DESTINATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\b(?:куда|конец)\b\s*[:\-]?\s*(.+?)\s*(?:[,;.]?\s*\b(?:откуда|начало|куда|до|конец)\b|;|$)",
    )
    .unwrap()
});

// "до" also means "until"; tried only after куда/конец.
static DESTINATION_UNTIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\bдо\b\s*[:\-]?\s*(.+?)\s*(?:[,;.]?\s*\b(?:откуда|начало|куда|до|конец)\b|;|$)",
    )
    .unwrap()
});

static CARGO_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:тип(?:\s+груза)?|груз)\b\s*[:\-]?\s*([^,;\n]+)").unwrap()
});

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

fn first_match(text: &str, rules: &[Rule]) -> Option<String> {
    rules.iter().find_map(|rule| rule(text))
}

fn fill(slot: &mut Option<String>, text: &str, rules: &[Rule]) {
    if slot.is_none() {
        *slot = first_match(text, rules);
    }
}

fn clean_clause(raw: &str) -> Option<String> {
    let clause = raw
        .trim()
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | '.') || c.is_whitespace())
        .trim();
    (!clause.is_empty()).then(|| clause.to_string())
}

fn plate_number(text: &str) -> Option<String> {
    let caps = PLATE.captures(text)?;
    let plate: String = (1..=4).filter_map(|i| caps.get(i)).map(|m| m.as_str()).collect();
    Some(plate.to_uppercase())
}

fn origin_marker(text: &str) -> Option<String> {
    clean_clause(ORIGIN.captures(text)?.get(1)?.as_str())
}

fn destination_marker(text: &str) -> Option<String> {
    clean_clause(DESTINATION.captures(text)?.get(1)?.as_str())
}

fn destination_until(text: &str) -> Option<String> {
    clean_clause(DESTINATION_UNTIL.captures(text)?.get(1)?.as_str())
}

fn cargo_marker(text: &str) -> Option<String> {
    clean_clause(CARGO_TYPE.captures(text)?.get(1)?.as_str())
}

fn positional_segments(text: &str) -> Option<[Option<String>; 3]> {
    let segments: Vec<&str> = text.split(';').collect();
    if segments.len() < 3 {
        return None;
    }
    Some([
        clean_clause(segments[0]),
        clean_clause(segments[1]),
        clean_clause(segments[2]),
    ])
}

pub fn fill_route(fields: &mut RouteFields, text: &str) {
    fill(&mut fields.car_number, text, &[plate_number]);
    fill(&mut fields.address_from, text, &[origin_marker]);
    fill(
        &mut fields.address_to,
        text,
        &[destination_marker, destination_until],
    );

    if fields.address_from.is_some() && fields.address_to.is_some() {
        return;
    }

    if let Some([plate, origin, destination]) = positional_segments(text) {
        if fields.car_number.is_none() {
            fields.car_number = plate;
        }
        if fields.address_from.is_none() {
            fields.address_from = origin;
        }
        if fields.address_to.is_none() {
            fields.address_to = destination;
        }
    }
}

pub fn numbers(text: &str) -> Vec<f64> {
    NUMBER
        .find_iter(text)
        .filter_map(|m| parse_amount(m.as_str()))
        .collect()
}

// First number is the load, second the unload. Heuristic; confirmed by the user.
pub fn fill_cargo(fields: &mut CargoFields, text: &str) {
    fill(&mut fields.cargo_type, text, &[cargo_marker]);

    if fields.load_amount.is_some() && fields.unload_amount.is_some() {
        return;
    }

    let found = numbers(text);
    if fields.load_amount.is_none() {
        fields.load_amount = found.first().copied();
    }
    if fields.unload_amount.is_none() {
        fields.unload_amount = found.get(1).copied();
    }
}

#[cfg(test)]
mod tests {
    use super::{fill_cargo, fill_route, numbers, plate_number};
    use crate::extraction::{CargoFields, RouteFields};

    fn route(text: &str) -> RouteFields {
        let mut fields = RouteFields::default();
        fill_route(&mut fields, text);
        fields
    }

    #[test]
    fn markers_and_plate_are_recognized() {
        let fields = route("Машина А123ВС77, откуда Москва Тверская 1, куда Москва Арбат 10");
        assert_eq!(fields.car_number.as_deref(), Some("А123ВС77"));
        assert_eq!(fields.address_from.as_deref(), Some("Москва Тверская 1"));
        assert_eq!(fields.address_to.as_deref(), Some("Москва Арбат 10"));
    }

    #[test]
    fn alternative_markers_are_recognized() {
        let fields = route("начало: Тверь, Советская 5; конец: Клин, Ленина 2.");
        assert_eq!(fields.address_from.as_deref(), Some("Тверь, Советская 5"));
        assert_eq!(fields.address_to.as_deref(), Some("Клин, Ленина 2"));
    }

    #[test]
    fn plate_is_found_without_addresses() {
        let fields = route("номер машины в123кх777 а адреса скажу потом");
        assert_eq!(fields.car_number.as_deref(), Some("В123КХ777"));
        assert_eq!(fields.address_from, None);
        assert_eq!(fields.address_to, None);
    }

    #[test]
    fn latin_plate_with_spaces_is_normalized() {
        assert_eq!(plate_number("car a 123 bc 77").as_deref(), Some("A123BC77"));
        assert_eq!(plate_number("А123ВС7777"), None);
    }

    #[test]
    fn positional_segments_fill_missing_fields() {
        let fields = route("Х555ХХ99; Москва, Тверская 1; Москва, Арбат 10");
        assert_eq!(fields.car_number.as_deref(), Some("Х555ХХ99"));
        assert_eq!(fields.address_from.as_deref(), Some("Москва, Тверская 1"));
        assert_eq!(fields.address_to.as_deref(), Some("Москва, Арбат 10"));
    }

    #[test]
    fn two_segments_are_not_positional() {
        let fields = route("Москва, Тверская 1; Москва, Арбат 10");
        assert_eq!(fields.address_from, None);
        assert_eq!(fields.address_to, None);
    }

    #[test]
    fn destination_stops_at_the_next_marker() {
        let fields = route("откуда Москва, ул. Садовая, до 5 утра куда Тверь");
        assert_eq!(fields.address_from.as_deref(), Some("Москва, ул. Садовая"));
        assert_eq!(fields.address_to.as_deref(), Some("Тверь"));

        let fields = route("куда Клин, откуда Химки");
        assert_eq!(fields.address_to.as_deref(), Some("Клин"));
        assert_eq!(fields.address_from.as_deref(), Some("Химки"));
    }

    #[test]
    fn until_marker_is_used_without_a_stronger_one() {
        let fields = route("откуда Химки до Клин, Ленина 2");
        assert_eq!(fields.address_from.as_deref(), Some("Химки"));
        assert_eq!(fields.address_to.as_deref(), Some("Клин, Ленина 2"));
    }

    #[test]
    fn provider_values_are_kept() {
        let mut fields = RouteFields {
            car_number: None,
            address_from: Some("Химки".to_string()),
            address_to: None,
        };
        fill_route(&mut fields, "Е001КХ50 откуда Москва куда Тверь");
        assert_eq!(fields.car_number.as_deref(), Some("Е001КХ50"));
        assert_eq!(fields.address_from.as_deref(), Some("Химки"));
        assert_eq!(fields.address_to.as_deref(), Some("Тверь"));
    }

    #[test]
    fn first_two_numbers_are_load_then_unload() {
        let mut fields = CargoFields::default();
        fill_cargo(&mut fields, "ЩПС, загрузка 20, выгрузка 5");
        assert_eq!(fields.load_amount, Some(20.0));
        assert_eq!(fields.unload_amount, Some(5.0));
        assert_eq!(fields.cargo_type, None);
    }

    #[test]
    fn cargo_marker_and_decimal_commas() {
        let mut fields = CargoFields::default();
        fill_cargo(&mut fields, "груз: песок; 12,5 и 2.25");
        assert_eq!(fields.cargo_type.as_deref(), Some("песок"));
        assert_eq!(fields.load_amount, Some(12.5));
        assert_eq!(fields.unload_amount, Some(2.25));
    }

    #[test]
    fn single_number_leaves_unload_missing() {
        let mut fields = CargoFields::default();
        fill_cargo(&mut fields, "тип щебень загрузка 30");
        assert_eq!(fields.cargo_type.as_deref(), Some("щебень загрузка 30"));
        assert_eq!(fields.load_amount, Some(30.0));
        assert_eq!(fields.unload_amount, None);
    }

    #[test]
    fn numbers_keep_reading_order() {
        assert_eq!(numbers("7 потом 3,5 потом 10"), vec![7.0, 3.5, 10.0]);
        assert!(numbers("без чисел").is_empty());
    }
}
