// src/bot/action.rs — Conversation states and button tokens
//
// `PendingAction` is what the bot waits for from one user. Conflict states
// carry the proposed boundary so it can never be lost or mismatched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::period::date_str;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PendingAction {
    #[default]
    Idle,
    AwaitingUpload,
    AwaitingDate,
    AwaitingEditIndex,
    AwaitingEditField,
    AwaitingNewIn,
    AwaitingNewOut,
    AwaitingNewCountry,
    AwaitingAddIn,
    AwaitingAddOut,
    AwaitingAddCountry,
    AwaitingAddOpenCountry,
    /// Earliest stay: exit date, then country; prepended.
    AwaitingTailOut,
    AwaitingTailCountry,
    /// Ongoing stay: entry date, then country; appended.
    AwaitingHeadIn,
    AwaitingHeadCountry,
    AwaitingDeleteIndex,
    ResolveInConflict {
        #[serde(with = "date_str")]
        proposed: NaiveDate,
    },
    ResolveOutConflict {
        #[serde(with = "date_str")]
        proposed: NaiveDate,
    },
    ResolveInGap {
        #[serde(with = "date_str")]
        proposed: NaiveDate,
    },
    ResolveOutGap {
        #[serde(with = "date_str")]
        proposed: NaiveDate,
    },
}

impl PendingAction {
    pub fn name(&self) -> &'static str {
        match self {
            PendingAction::Idle => "idle",
            PendingAction::AwaitingUpload => "awaiting_upload",
            PendingAction::AwaitingDate => "awaiting_date",
            PendingAction::AwaitingEditIndex => "awaiting_edit_index",
            PendingAction::AwaitingEditField => "awaiting_edit_field",
            PendingAction::AwaitingNewIn => "awaiting_new_in",
            PendingAction::AwaitingNewOut => "awaiting_new_out",
            PendingAction::AwaitingNewCountry => "awaiting_new_country",
            PendingAction::AwaitingAddIn => "awaiting_add_in",
            PendingAction::AwaitingAddOut => "awaiting_add_out",
            PendingAction::AwaitingAddCountry => "awaiting_add_country",
            PendingAction::AwaitingAddOpenCountry => "awaiting_add_open_country",
            PendingAction::AwaitingTailOut => "awaiting_tail_out",
            PendingAction::AwaitingTailCountry => "awaiting_tail_country",
            PendingAction::AwaitingHeadIn => "awaiting_head_in",
            PendingAction::AwaitingHeadCountry => "awaiting_head_country",
            PendingAction::AwaitingDeleteIndex => "awaiting_delete_index",
            PendingAction::ResolveInConflict { .. } => "resolve_in_conflict",
            PendingAction::ResolveOutConflict { .. } => "resolve_out_conflict",
            PendingAction::ResolveInGap { .. } => "resolve_in_gap",
            PendingAction::ResolveOutGap { .. } => "resolve_out_gap",
        }
    }

    /// Buttons that leave a conflict state. Empty for every other state.
    pub fn choices(&self) -> &'static [Callback] {
        match self {
            PendingAction::ResolveInConflict { .. } => &[
                Callback::AdjustPrevOut,
                Callback::KeepConflict,
                Callback::CancelEdit,
            ],
            PendingAction::ResolveInGap { .. } => &[
                Callback::AdjustPrevOut,
                Callback::AddGapPeriod,
                Callback::KeepConflict,
                Callback::CancelEdit,
            ],
            PendingAction::ResolveOutConflict { .. } | PendingAction::ResolveOutGap { .. } => &[
                Callback::AdjustNextIn,
                Callback::KeepConflict,
                Callback::CancelEdit,
            ],
            _ => &[],
        }
    }

    pub fn accepts(&self, callback: Callback) -> bool {
        self.choices().contains(&callback)
    }

    pub fn is_resolving(&self) -> bool {
        !self.choices().is_empty()
    }

    /// States answered with a button, not with typed text.
    pub fn awaits_button(&self) -> bool {
        self.is_resolving() || matches!(self, PendingAction::AwaitingEditField)
    }

    /// States in which ordinary commands are routed.
    pub fn is_idle(&self) -> bool {
        matches!(self, PendingAction::Idle | PendingAction::AwaitingUpload)
    }
}

/// Opaque tokens attached to inline buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callback {
    Start,
    Help,
    Reset,
    Undo,
    SetDate,
    UploadFile,
    Periods,
    ShowReport,
    AddPeriod,
    AddFull,
    AddHead,
    AddTail,
    AddOpen,
    EditPeriod,
    DeletePeriod,
    EditIn,
    EditOut,
    EditCountry,
    AdjustPrevOut,
    AdjustNextIn,
    KeepConflict,
    AddGapPeriod,
    CancelEdit,
    Back,
}

const ALL_CALLBACKS: &[Callback] = &[
    Callback::Start,
    Callback::Help,
    Callback::Reset,
    Callback::Undo,
    Callback::SetDate,
    Callback::UploadFile,
    Callback::Periods,
    Callback::ShowReport,
    Callback::AddPeriod,
    Callback::AddFull,
    Callback::AddHead,
    Callback::AddTail,
    Callback::AddOpen,
    Callback::EditPeriod,
    Callback::DeletePeriod,
    Callback::EditIn,
    Callback::EditOut,
    Callback::EditCountry,
    Callback::AdjustPrevOut,
    Callback::AdjustNextIn,
    Callback::KeepConflict,
    Callback::AddGapPeriod,
    Callback::CancelEdit,
    Callback::Back,
];

impl Callback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Callback::Start => "start",
            Callback::Help => "help",
            Callback::Reset => "reset",
            Callback::Undo => "undo",
            Callback::SetDate => "set_date",
            Callback::UploadFile => "upload_file",
            Callback::Periods => "periods",
            Callback::ShowReport => "show_report",
            Callback::AddPeriod => "add_period",
            Callback::AddFull => "add_full",
            Callback::AddHead => "add_head",
            Callback::AddTail => "add_tail",
            Callback::AddOpen => "add_open",
            Callback::EditPeriod => "edit_period",
            Callback::DeletePeriod => "delete_period",
            Callback::EditIn => "edit_in",
            Callback::EditOut => "edit_out",
            Callback::EditCountry => "edit_country",
            Callback::AdjustPrevOut => "adjust_prev_out",
            Callback::AdjustNextIn => "adjust_next_in",
            Callback::KeepConflict => "keep_conflict",
            Callback::AddGapPeriod => "add_gap_period",
            Callback::CancelEdit => "cancel_edit",
            Callback::Back => "back",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Callback::Start => "🔙 Назад в меню",
            Callback::Help => "ℹ️ Помощь",
            Callback::Reset => "🗑 Сбросить",
            Callback::Undo => "↩️ Отменить последнее изменение",
            Callback::SetDate => "📅 Отчёт на заданную дату",
            Callback::UploadFile => "📎 Загрузить файл",
            Callback::Periods => "📋 Показать текущие данные",
            Callback::ShowReport => "📊 Отчёт",
            Callback::AddPeriod => "➕ Добавить период",
            Callback::AddFull => "📅 Период с датами въезда и выезда",
            Callback::AddHead => "🛬 Текущее пребывание (без даты выезда)",
            Callback::AddTail => "🛫 Самый ранний период (без даты въезда)",
            Callback::AddOpen => "📍 С даты расчёта (без даты выезда)",
            Callback::EditPeriod => "✏️ Редактировать период",
            Callback::DeletePeriod => "🗑 Удалить период",
            Callback::EditIn => "📅 Изменить дату въезда (in)",
            Callback::EditOut => "📆 Изменить дату выезда (out)",
            Callback::EditCountry => "🌍 Изменить страну",
            Callback::AdjustPrevOut => "📌 Подвинуть предыдущий период",
            Callback::AdjustNextIn => "📌 Подвинуть следующий период",
            Callback::KeepConflict => "✅ Оставить как есть",
            Callback::AddGapPeriod => "🕳 Добавить период «unknown»",
            Callback::CancelEdit => "❌ Отменить",
            Callback::Back => "⬅️ Назад",
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let data = data.trim();
        // Older menus used a separate token for the re-upload button.
        if data == "upload_report" {
            return Some(Callback::UploadFile);
        }
        ALL_CALLBACKS.iter().copied().find(|c| c.as_str() == data)
    }

    /// Match a typed message against a button label (reply-keyboard clients).
    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        ALL_CALLBACKS.iter().copied().find(|c| c.label() == text)
    }
}
