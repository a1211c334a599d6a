use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn remainder(load: f64, unload: f64) -> f64 {
    round3(load - unload)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub car_number: Option<String>,
    pub address_from: String,
    pub address_to: String,
    pub distance_km: Option<f64>,
    pub cargo_type: Option<String>,
    pub load_amount: Option<f64>,
    pub unload_amount: Option<f64>,
    pub remainder: Option<f64>,
}

impl Order {
    pub fn apply(&mut self, patch: OrderPatch) {
        if let Some(car_number) = patch.car_number {
            self.car_number = Some(car_number);
        }
        if let Some(address_from) = patch.address_from {
            self.address_from = address_from;
        }
        if let Some(address_to) = patch.address_to {
            self.address_to = address_to;
        }
        if let Some(distance_km) = patch.distance_km {
            self.distance_km = Some(distance_km);
        }
        if let Some(cargo_type) = patch.cargo_type {
            self.cargo_type = Some(cargo_type);
        }
        if let Some(load) = patch.load_amount {
            self.load_amount = Some(load);
        }
        if let Some(unload) = patch.unload_amount {
            self.unload_amount = Some(unload);
        }

        if let (Some(load), Some(unload)) = (self.load_amount, self.unload_amount) {
            self.remainder = Some(remainder(load, unload));
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrder {
    pub user_id: i64,
    pub car_number: Option<String>,
    pub address_from: String,
    pub address_to: String,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderPatch {
    pub car_number: Option<String>,
    pub address_from: Option<String>,
    pub address_to: Option<String>,
    pub distance_km: Option<f64>,
    pub cargo_type: Option<String>,
    pub load_amount: Option<f64>,
    pub unload_amount: Option<f64>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self == &OrderPatch::default()
    }

    pub fn touches_route(&self) -> bool {
        self.address_from.is_some() || self.address_to.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{remainder, round3, Order, OrderPatch};

    fn order() -> Order {
        Order {
            id: 7,
            user_id: 42,
            created_at: Utc::now(),
            car_number: Some("А123ВС77".to_string()),
            address_from: "Москва Тверская 1".to_string(),
            address_to: "Москва Арбат 10".to_string(),
            distance_km: Some(3.4),
            cargo_type: Some("ЩПС".to_string()),
            load_amount: Some(20.0),
            unload_amount: Some(5.0),
            remainder: Some(15.0),
        }
    }

    #[test]
    fn remainder_is_rounded_to_three_decimals() {
        assert_eq!(remainder(10.0, 3.3333), 6.667);
        assert_eq!(remainder(0.3, 0.1), 0.2);
        assert_eq!(round3(1.23456), 1.235);
    }

    #[test]
    fn changing_load_recomputes_remainder() {
        let mut order = order();
        order.apply(OrderPatch {
            load_amount: Some(30.0),
            ..OrderPatch::default()
        });

        assert_eq!(order.load_amount, Some(30.0));
        assert_eq!(order.remainder, Some(25.0));
        assert_eq!(order.distance_km, Some(3.4));
        assert_eq!(order.address_from, "Москва Тверская 1");
    }

    #[test]
    fn remainder_stays_empty_until_both_quantities_known() {
        let mut order = order();
        order.load_amount = None;
        order.unload_amount = None;
        order.remainder = None;

        order.apply(OrderPatch {
            unload_amount: Some(4.0),
            ..OrderPatch::default()
        });
        assert_eq!(order.remainder, None);

        order.apply(OrderPatch {
            load_amount: Some(9.5),
            ..OrderPatch::default()
        });
        assert_eq!(order.remainder, Some(5.5));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(OrderPatch::default().is_empty());
        assert!(
            !OrderPatch {
                cargo_type: Some("Песок".to_string()),
                ..OrderPatch::default()
            }
            .is_empty()
        );
    }
}
