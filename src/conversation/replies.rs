use std::fmt::Display;

use super::session::{CargoDraft, RouteDraft};
use crate::models::order::Order;

pub const GREETING: &str = "Здравствуйте! Я бот учета заказов на нерудные материалы.\n\
     Выберите действие: Добавить, Редактировать, Просмотр";
pub const IDLE_HINT: &str = "Выберите действие: Добавить, Редактировать, Просмотр";

pub const STEP1_PROMPT: &str = "Шаг 1. Отправьте одно сообщение (текст/голос), содержащее: \n\
     - номер машины\n- адрес начала\n- адрес конца\n\n\
     Пример: 'Машина А123ВС77, откуда Москва, Тверская 1, куда Москва, Арбат 10'.";
pub const STEP1_RETRY: &str =
    "Ок, отправьте заново Шаг 1: номер машины, адрес начала и адрес конца.";
pub const ROUTE_NOT_RECOGNIZED: &str =
    "Не удалось распознать адреса. Отправьте в формате: 'номер; адрес начало; адрес конец'";
pub const GEOCODE_FAILED: &str =
    "Не удалось геокодировать адреса. Проверьте написание и повторите.";
pub const VOICE_NOT_RECOGNIZED: &str =
    "Не удалось распознать голос. Отправьте текстом, пожалуйста.";

pub const STEP2_PROMPT: &str = "Шаг 2. Отправьте одно сообщение (текст/голос) с: тип груза, загрузка, выгрузка.\n\
     Пример: 'ЩПС, загрузка 20, выгрузка 5'.";
pub const STEP2_RETRY: &str = "Ок, отправьте заново Шаг 2: тип, загрузка и выгрузка.";
pub const AMOUNTS_NOT_RECOGNIZED: &str =
    "Не удалось понять числа загрузки/выгрузки. Пример: 'загрузка 20, выгрузка 5'.";

pub const CONFIRM_PROMPT: &str = "Выберите: Ок или Переписать";
pub const CONFIRM_INVALID: &str = "Пожалуйста, выберите: Ок или Переписать";

pub const DRAFT_LOST: &str = "Заказ не найден. Начните заново: Добавить.";
pub const SAVE_FAILED: &str = "Не удалось сохранить заказ. Попробуйте еще раз.";
pub const LOAD_FAILED: &str = "Не удалось загрузить заказы. Попробуйте позже.";

pub const NO_ORDERS: &str = "У вас пока нет заказов.";
pub const NO_ORDERS_TO_EDIT: &str = "Нет заказов для редактирования.";
pub const EDIT_ID_INVALID: &str = "Введите числовой ID из списка выше.";
pub const EDIT_FORMAT: &str = "Отправьте поля для изменения в формате: \n\
     car=А123ВС77; from=Москва, Тверская 1; to=Москва, Арбат 10; cargo=Песок; load=20; unload=5";
pub const EDIT_PATCH_INVALID: &str = "Не распознаны поля. Пример: load=20; unload=5";
pub const EDIT_ORDER_LOST: &str = "Заказ не найден. Начните заново: Редактировать.";
pub const EDIT_SAVED: &str = "Изменения сохранены.";
pub const DISTANCE_NOT_UPDATED: &str =
    "Расстояние не пересчитано: не удалось геокодировать новые адреса.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    MainMenu,
    ConfirmChoice,
    Remove,
}

impl Keyboard {
    pub fn rows(self) -> Vec<Vec<&'static str>> {
        match self {
            Keyboard::MainMenu => vec![vec!["Добавить", "Редактировать"], vec!["Просмотр"]],
            Keyboard::ConfirmChoice => vec![vec!["Ок", "Переписать"]],
            Keyboard::Remove => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

fn or_dash<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

pub fn route_summary(draft: &RouteDraft) -> String {
    format!(
        "Распознано:\nНомер: {}\nОткуда: {}\nКуда: {}\nРасстояние: {} км\n\nПодтвердить?",
        or_dash(&draft.car_number),
        draft.address_from,
        draft.address_to,
        draft.distance_km
    )
}

pub fn cargo_summary(draft: &CargoDraft) -> String {
    format!(
        "Распознано:\nТип: {}\nЗагрузка: {} | Выгрузка: {}\nОстаток: {}\n\nПодтвердить?",
        or_dash(&draft.cargo_type),
        draft.load_amount,
        draft.unload_amount,
        draft.remainder
    )
}

pub fn order_saved(order_id: u64) -> String {
    format!("Заказ #{order_id} сохранен.")
}

pub fn unknown_order(order_id: u64) -> String {
    format!("Заказ #{order_id} не найден среди ваших заказов. {EDIT_ID_INVALID}")
}

pub fn order_listing(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|order| {
            format!(
                "#{} | {} | {}\nОт: {}\nДо: {} | {} км\nЗагр: {} | Выгр: {} | Ост: {}\n—",
                order.id,
                or_dash(&order.car_number),
                or_dash(&order.cargo_type),
                order.address_from,
                order.address_to,
                or_dash(&order.distance_km),
                or_dash(&order.load_amount),
                or_dash(&order.unload_amount),
                or_dash(&order.remainder),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn edit_listing(orders: &[Order]) -> String {
    let listing = orders
        .iter()
        .map(|order| {
            format!(
                "#{}: {} | {}",
                order.id,
                or_dash(&order.car_number),
                or_dash(&order.cargo_type)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Выберите ID заказа для редактирования (ответьте числом).\n{listing}")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{cargo_summary, edit_listing, order_listing, route_summary};
    use crate::conversation::session::{CargoDraft, RouteDraft};
    use crate::models::order::Order;

    #[test]
    fn route_summary_shows_dash_for_missing_plate() {
        let text = route_summary(&RouteDraft {
            car_number: None,
            address_from: "Москва Тверская 1".to_string(),
            address_to: "Москва Арбат 10".to_string(),
            distance_km: 2.481,
        });
        assert!(text.contains("Номер: -\n"));
        assert!(text.contains("Расстояние: 2.481 км"));
    }

    #[test]
    fn cargo_summary_prints_whole_numbers_plainly() {
        let text = cargo_summary(&CargoDraft {
            cargo_type: Some("ЩПС".to_string()),
            load_amount: 20.0,
            unload_amount: 5.0,
            remainder: 15.0,
        });
        assert!(text.contains("Тип: ЩПС"));
        assert!(text.contains("Загрузка: 20 | Выгрузка: 5"));
        assert!(text.contains("Остаток: 15"));
    }

    #[test]
    fn listings_render_each_order() {
        let order = Order {
            id: 3,
            user_id: 1,
            created_at: Utc::now(),
            car_number: Some("А123ВС77".to_string()),
            address_from: "Москва".to_string(),
            address_to: "Тверь".to_string(),
            distance_km: Some(170.5),
            cargo_type: None,
            load_amount: Some(20.0),
            unload_amount: None,
            remainder: None,
        };

        let view = order_listing(std::slice::from_ref(&order));
        assert!(view.starts_with("#3 | А123ВС77 | -\n"));
        assert!(view.contains("До: Тверь | 170.5 км"));
        assert!(view.contains("Загр: 20 | Выгр: - | Ост: -"));

        let edit = edit_listing(&[order]);
        assert!(edit.ends_with("#3: А123ВС77 | -"));
    }
}
