// src/bot/reply.rs — Outbound replies and inline menus

use super::action::{Callback, PendingAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Callback,
}

impl Button {
    pub fn new(action: Callback) -> Self {
        Self {
            label: action.label().to_string(),
            action,
        }
    }
}

/// Rows of inline buttons attached to one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    pub rows: Vec<Vec<Button>>,
}

impl Menu {
    /// One button per row.
    pub fn column(actions: &[Callback]) -> Self {
        Self {
            rows: actions.iter().map(|a| vec![Button::new(*a)]).collect(),
        }
    }

    pub fn actions(&self) -> Vec<Callback> {
        self.rows.iter().flatten().map(|b| b.action).collect()
    }

    pub fn contains(&self, action: Callback) -> bool {
        self.rows.iter().flatten().any(|b| b.action == action)
    }
}

/// One message for the user: text plus an optional menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub menu: Option<Menu>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
        }
    }

    pub fn with_menu(mut self, menu: Menu) -> Self {
        self.menu = Some(menu);
        self
    }
}

// -- Menus --

pub fn main_menu(has_data: bool) -> Menu {
    if has_data {
        Menu::column(&[
            Callback::Periods,
            Callback::ShowReport,
            Callback::SetDate,
            Callback::UploadFile,
            Callback::Undo,
            Callback::Reset,
            Callback::Help,
        ])
    } else {
        Menu::column(&[
            Callback::UploadFile,
            Callback::AddPeriod,
            Callback::Undo,
            Callback::Help,
        ])
    }
}

pub fn back_to_menu() -> Menu {
    Menu::column(&[Callback::Start])
}

pub fn back() -> Menu {
    Menu::column(&[Callback::Back])
}

pub fn periods_menu() -> Menu {
    Menu::column(&[
        Callback::AddPeriod,
        Callback::EditPeriod,
        Callback::DeletePeriod,
        Callback::ShowReport,
        Callback::Start,
    ])
}

pub fn add_period_menu() -> Menu {
    Menu::column(&[
        Callback::AddFull,
        Callback::AddHead,
        Callback::AddTail,
        Callback::AddOpen,
        Callback::Start,
    ])
}

pub fn edit_field_menu() -> Menu {
    Menu::column(&[
        Callback::EditIn,
        Callback::EditOut,
        Callback::EditCountry,
        Callback::Back,
    ])
}

/// Buttons for the choices a conflict state accepts.
pub fn conflict_menu(state: &PendingAction) -> Menu {
    Menu::column(state.choices())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_reply_builder() {
        let r = Reply::new("hi").with_menu(back());
        assert_eq!(r.text, "hi");
        assert_eq!(r.menu.unwrap().actions(), vec![Callback::Back]);
    }

    #[test]
    fn test_main_menu_depends_on_data() {
        assert!(main_menu(true).contains(Callback::ShowReport));
        assert!(!main_menu(false).contains(Callback::ShowReport));
        assert!(main_menu(false).contains(Callback::UploadFile));
    }

    #[test]
    fn test_button_labels_follow_actions() {
        let menu = edit_field_menu();
        for b in menu.rows.iter().flatten() {
            assert_eq!(b.label, b.action.label());
        }
    }

    #[test]
    fn test_conflict_menu_matches_state() {
        let proposed = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let gap = conflict_menu(&PendingAction::ResolveInGap { proposed });
        assert_eq!(gap.rows.len(), 4);
        assert!(gap.contains(Callback::AddGapPeriod));

        let overlap = conflict_menu(&PendingAction::ResolveOutConflict { proposed });
        assert_eq!(
            overlap.actions(),
            vec![Callback::AdjustNextIn, Callback::KeepConflict, Callback::CancelEdit]
        );
        assert!(conflict_menu(&PendingAction::Idle).rows.is_empty());
    }
}
