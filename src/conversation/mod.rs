pub mod machine;
pub mod patch;
pub mod replies;
pub mod session;

pub use machine::{Assistant, Collaborators};
pub use replies::{Keyboard, Reply};
pub use session::{CargoDraft, RouteDraft, SessionRegistry, SessionState};

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Text(String),
    Voice(Vec<u8>),
}

impl Inbound {
    fn command(&self) -> Option<Command> {
        match self {
            Inbound::Text(text) => Command::parse(text),
            Inbound::Voice(_) => None,
        }
    }

    fn confirm_choice(&self) -> Option<ConfirmChoice> {
        match self {
            Inbound::Text(text) => ConfirmChoice::parse(text),
            Inbound::Voice(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Add,
    Edit,
    View,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "/start" => Some(Command::Start),
            "добавить" => Some(Command::Add),
            "редактировать" => Some(Command::Edit),
            "просмотр" => Some(Command::View),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Accept,
    Rewrite,
}

impl ConfirmChoice {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "ок" => Some(ConfirmChoice::Accept),
            "переписать" => Some(ConfirmChoice::Rewrite),
            _ => None,
        }
    }
}
