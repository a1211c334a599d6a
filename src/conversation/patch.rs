use crate::extraction::parse_amount;
use crate::models::order::OrderPatch;

pub fn parse_edit_patch(raw: &str) -> OrderPatch {
    let mut patch = OrderPatch::default();

    for part in raw.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.trim().to_lowercase().as_str() {
            "car" => patch.car_number = Some(value.to_string()),
            "from" => patch.address_from = Some(value.to_string()),
            "to" => patch.address_to = Some(value.to_string()),
            "cargo" => patch.cargo_type = Some(value.to_string()),
            "load" => {
                if let Some(amount) = parse_amount(value) {
                    patch.load_amount = Some(amount);
                }
            }
            "unload" => {
                if let Some(amount) = parse_amount(value) {
                    patch.unload_amount = Some(amount);
                }
            }
            _ => {}
        }
    }

    patch
}
