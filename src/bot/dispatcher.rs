// src/bot/dispatcher.rs — Routes one inbound event through a user's session
//
// Each call locks the user's session, runs one `Turn`, and persists the
// session if the turn changed it. Flows that edit periods live in `flows.rs`.

use std::sync::PoisonError;

use chrono::{Local, NaiveDate};

use super::action::{Callback, PendingAction};
use super::reply::{self, Menu, Reply};
use super::session::{Session, UserId};
use crate::core::date::{format_date, parse_date};
use crate::core::{build_report, PeriodData};
use crate::store::SessionManager;
use crate::util::log_preview;

pub(super) const BAD_DATE: &str = "⛔ Неверный формат даты. Используйте ДД.ММ.ГГГГ.";
pub(super) const BAD_INDEX: &str = "⛔ Введите корректный номер периода.";
pub(super) const NO_PERIODS: &str = "📭 У вас пока нет сохранённых периодов.";
pub(super) const ASK_COUNTRY: &str = "🌍 Укажите название страны:";
pub(super) const EMPTY_COUNTRY: &str = "⛔ Название страны не может быть пустым.";
pub const INTERNAL_ERROR: &str = "⚠️ Внутренняя ошибка. Начните действие заново.";
const SAVE_FAILED: &str =
    "⚠️ Не удалось сохранить изменения. Они действуют только до перезапуска бота.";
const UNKNOWN_COMMAND: &str = "❓ Неизвестная команда. Введите /help, чтобы посмотреть список.";
const PRESS_BUTTON: &str = "👆 Выберите вариант с помощью кнопок.";

const HELP_TEXT: &str = "ℹ️ Бот считает, в какой стране вы провели не меньше 183 дней \
за последние 12 месяцев до даты расчёта.

Как пользоваться:
1. Загрузите JSON-файл с периодами или добавьте периоды вручную.
2. Нажмите «📊 Отчёт», чтобы увидеть число дней по странам.
3. «📅 Отчёт на заданную дату» пересчитает отчёт на другую дату.

Формат файла:
{\"periods\":[{\"out\":\"10.01.2023\",\"country\":\"Россия\"},{\"in\":\"11.01.2023\",\"country\":\"Грузия\"}],\"current\":\"31.12.2023\"}

У первого периода можно не указывать дату въезда, у последнего дату выезда.
Даты вводятся в формате ДД.ММ.ГГГГ.

Команды: /start /help /periods /report /date /upload /add /edit /delete /undo /reset /cancel";

const COMMANDS_TEXT: &str = "📖 Команды:
/start — главное меню
/help — справка
/periods — список периодов
/report — отчёт
/date — отчёт на заданную дату
/upload — загрузить JSON-файл
/add — добавить период
/edit — редактировать период
/delete — удалить период
/undo — отменить последнее изменение
/reset — удалить все данные
/cancel — прервать текущее действие";

/// One event from the chat, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    /// An uploaded file. `None` when it could not be fetched.
    Document { body: Option<String> },
    /// Raw callback payload from an inline button.
    Button(String),
}

pub struct Dispatcher {
    sessions: SessionManager,
    today: Option<NaiveDate>,
}

impl Dispatcher {
    pub fn new(sessions: SessionManager) -> Self {
        Self {
            sessions,
            today: None,
        }
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn handle(&self, user: UserId, inbound: Inbound) -> Vec<Reply> {
        let handle = self.sessions.get(user);
        let mut session = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let before = session.clone();

        tracing::debug!(
            user,
            state = session.pending.name(),
            "inbound {}",
            describe_inbound(&inbound)
        );

        let mut turn = Turn {
            session: &mut session,
            today: self.today(),
            replies: Vec::new(),
        };
        match inbound {
            Inbound::Text(text) => turn.on_text(&text),
            Inbound::Document { body } => turn.on_document(body),
            Inbound::Button(data) => turn.on_button(&data),
        }
        let mut replies = turn.replies;

        if *session != before {
            if before.pending != session.pending {
                tracing::debug!(
                    user,
                    from = before.pending.name(),
                    to = session.pending.name(),
                    "state change"
                );
            }
            if let Err(e) = self.sessions.persist(&session) {
                tracing::warn!(user, "Failed to persist session: {e}");
                replies.push(Reply::new(SAVE_FAILED));
            }
        }
        replies
    }
}

fn describe_inbound(inbound: &Inbound) -> String {
    match inbound {
        Inbound::Text(t) => format!("text '{}'", log_preview(t, 40)),
        Inbound::Document { body: Some(b) } => format!("document ({} bytes)", b.len()),
        Inbound::Document { body: None } => "document (unavailable)".to_string(),
        Inbound::Button(d) => format!("button '{d}'"),
    }
}

/// `/name@bot args` -> `name`. `None` when `text` is not a command.
fn command_name(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next().unwrap_or("");
    let name = word.split('@').next().unwrap_or("");
    Some(name)
}

/// One user's turn: the session under lock plus the replies produced so far.
pub(super) struct Turn<'a> {
    pub(super) session: &'a mut Session,
    pub(super) today: NaiveDate,
    pub(super) replies: Vec<Reply>,
}

impl Turn<'_> {
    pub(super) fn say(&mut self, text: impl Into<String>) {
        self.replies.push(Reply::new(text));
    }

    pub(super) fn say_with(&mut self, text: impl Into<String>, menu: Menu) {
        self.replies.push(Reply::new(text).with_menu(menu));
    }

    pub(super) fn data(&self) -> &PeriodData {
        &self.session.data
    }

    pub(super) fn calc_date(&self) -> NaiveDate {
        self.session.data.calc_date(self.today)
    }

    /// Scratch state is gone: drop the flow and start over from the menu.
    pub(super) fn internal_error(&mut self, what: &str) {
        tracing::warn!(
            user = self.session.user_id,
            state = self.session.pending.name(),
            "{what}"
        );
        self.session.clear_pending();
        self.session.editing_index = None;
        let menu = reply::main_menu(!self.session.is_empty());
        self.say_with(INTERNAL_ERROR, menu);
    }

    // -- Routing --

    fn on_text(&mut self, text: &str) {
        let text = text.trim();
        match command_name(text) {
            Some("cancel") => return self.cancel(),
            Some("start") => {
                self.session.clear_pending();
                return self.show_start();
            }
            _ => {}
        }

        let pending = self.session.pending;
        if pending.is_idle() {
            return self.on_idle_text(text);
        }
        if pending.awaits_button() {
            // Navigation labels still work from reply keyboards.
            if let Some(cb) = Callback::from_label(text) {
                return self.on_callback(cb);
            }
            return self.say(PRESS_BUTTON);
        }

        match pending {
            PendingAction::AwaitingDate => self.on_date(text),
            PendingAction::AwaitingEditIndex => self.on_edit_index(text),
            PendingAction::AwaitingNewIn => self.on_new_in(text),
            PendingAction::AwaitingNewOut => self.on_new_out(text),
            PendingAction::AwaitingNewCountry => self.on_new_country(text),
            PendingAction::AwaitingAddIn => self.on_add_in(text),
            PendingAction::AwaitingAddOut => self.on_add_out(text),
            PendingAction::AwaitingAddCountry => self.on_add_country(text),
            PendingAction::AwaitingAddOpenCountry => self.on_add_open_country(text),
            PendingAction::AwaitingTailOut => self.on_tail_out(text),
            PendingAction::AwaitingTailCountry => self.on_tail_country(text),
            PendingAction::AwaitingHeadIn => self.on_head_in(text),
            PendingAction::AwaitingHeadCountry => self.on_head_country(text),
            PendingAction::AwaitingDeleteIndex => self.on_delete_index(text),
            _ => self.say(PRESS_BUTTON),
        }
    }

    fn on_idle_text(&mut self, text: &str) {
        match command_name(text) {
            Some("help") => self.show_help(),
            Some("commands") => self.say_with(COMMANDS_TEXT, reply::back_to_menu()),
            Some("periods") => self.show_periods(),
            Some("report") => self.show_report(),
            Some("date") => self.ask_date(),
            Some("upload") | Some("upload_report") => self.ask_upload(),
            Some("add") => self.show_add_menu(),
            Some("edit") => self.ask_edit_index(),
            Some("delete") => self.ask_delete_index(),
            Some("undo") => self.undo(),
            Some("reset") => self.reset(),
            Some(_) => self.say(UNKNOWN_COMMAND),
            None => {
                if let Some(cb) = Callback::from_label(text) {
                    self.on_callback(cb);
                } else if text.starts_with('{') {
                    self.upload_json(text);
                } else {
                    self.say(UNKNOWN_COMMAND);
                }
            }
        }
    }

    fn on_document(&mut self, body: Option<String>) {
        if self.session.pending != PendingAction::AwaitingUpload {
            return self.say_with(
                "📎 Чтобы загрузить файл, сначала нажмите «📎 Загрузить файл».",
                reply::main_menu(!self.session.is_empty()),
            );
        }
        match body {
            Some(body) => self.upload_json(&body),
            None => self.say("⛔ Не удалось загрузить файл."),
        }
    }

    fn on_button(&mut self, data: &str) {
        match Callback::parse(data) {
            Some(cb) => self.on_callback(cb),
            None => {
                tracing::debug!(user = self.session.user_id, "unknown callback '{data}'");
                self.say("❓ Неизвестная кнопка.");
            }
        }
    }

    fn on_callback(&mut self, cb: Callback) {
        match cb {
            Callback::Start => {
                self.session.clear_pending();
                self.show_start();
            }
            Callback::Help => self.show_help(),
            Callback::Reset => self.reset(),
            Callback::Undo => self.undo(),
            Callback::SetDate => self.ask_date(),
            Callback::UploadFile => self.ask_upload(),
            Callback::Periods => self.show_periods(),
            Callback::ShowReport => self.show_report(),
            Callback::AddPeriod => self.show_add_menu(),
            Callback::AddFull => self.start_add_full(),
            Callback::AddHead => self.start_add_head(),
            Callback::AddTail => self.start_add_tail(),
            Callback::AddOpen => self.start_add_open(),
            Callback::EditPeriod => self.ask_edit_index(),
            Callback::DeletePeriod => self.ask_delete_index(),
            Callback::EditIn => self.choose_field(PendingAction::AwaitingNewIn),
            Callback::EditOut => self.choose_field(PendingAction::AwaitingNewOut),
            Callback::EditCountry => self.choose_field(PendingAction::AwaitingNewCountry),
            Callback::Back => self.back(),
            Callback::AdjustPrevOut
            | Callback::AdjustNextIn
            | Callback::KeepConflict
            | Callback::AddGapPeriod
            | Callback::CancelEdit => self.on_resolution(cb),
        }
    }

    // -- Top-level actions --

    pub(super) fn show_start(&mut self) {
        let has_data = !self.session.is_empty();
        let text = if has_data {
            "🔘 Выберите действие:"
        } else {
            "👋 Привет! Я помогу определить налоговое резидентство по правилу 183 дней.\n\n\
             Загрузите JSON-файл с периодами или добавьте их вручную."
        };
        self.say_with(text, reply::main_menu(has_data));
    }

    fn show_help(&mut self) {
        self.say_with(HELP_TEXT, reply::back_to_menu());
    }

    fn cancel(&mut self) {
        if self.session.pending == PendingAction::Idle {
            return self.show_start();
        }
        self.session.clear_pending();
        self.session.editing_index = None;
        let menu = reply::main_menu(!self.session.is_empty());
        self.say_with("❌ Действие отменено.", menu);
    }

    fn reset(&mut self) {
        if self.session.is_empty() {
            return self.say_with(NO_PERIODS, reply::main_menu(false));
        }
        self.session.reset();
        self.say_with("✅ Данные сброшены.", reply::main_menu(false));
    }

    fn undo(&mut self) {
        if !self.session.undo() {
            return self.say("ℹ️ Нет изменений, которые можно отменить.");
        }
        if self.session.is_empty() {
            return self.say_with("↩️ Изменение отменено. Периодов нет.", reply::main_menu(false));
        }
        let list = self.data().render_list(self.today);
        self.say_with(format!("↩️ Изменение отменено.\n\n{list}"), reply::periods_menu());
    }

    pub(super) fn show_periods(&mut self) {
        if self.session.is_empty() {
            return self.say_with(NO_PERIODS, reply::main_menu(false));
        }
        let list = self.data().render_list(self.today);
        self.say_with(list, reply::periods_menu());
    }

    fn show_report(&mut self) {
        if self.session.is_empty() {
            return self.say_with(NO_PERIODS, reply::main_menu(false));
        }
        let text = build_report(self.data(), self.today);
        self.say_with(text, reply::back_to_menu());
    }

    fn ask_date(&mut self) {
        if self.session.is_empty() {
            return self.say_with(NO_PERIODS, reply::main_menu(false));
        }
        self.session.clear_pending();
        self.session.pending = PendingAction::AwaitingDate;
        self.say_with("📅 Введите дату расчёта (ДД.ММ.ГГГГ):", reply::back_to_menu());
    }

    fn on_date(&mut self, text: &str) {
        let Ok(date) = parse_date(text) else {
            return self.say(BAD_DATE);
        };
        self.session.snapshot();
        self.session.data.current = Some(date);
        self.session.pending = PendingAction::Idle;
        let report = build_report(self.data(), self.today);
        self.say_with(
            format!("✅ Дата расчёта: {}\n\n{report}", format_date(date)),
            reply::back_to_menu(),
        );
    }

    fn ask_upload(&mut self) {
        self.session.clear_pending();
        self.session.pending = PendingAction::AwaitingUpload;
        self.say_with(
            "📎 Пришлите JSON-файл документом или вставьте JSON текстом.\n\n\
             Пример:\n{\"periods\":[{\"out\":\"10.01.2023\",\"country\":\"Россия\"},\
             {\"in\":\"11.01.2023\",\"country\":\"Грузия\"}],\"current\":\"31.12.2023\"}",
            reply::back_to_menu(),
        );
    }

    /// Parse first; the session changes only if the whole document is valid.
    fn upload_json(&mut self, body: &str) {
        let mut data: PeriodData = match serde_json::from_str(body.trim_start_matches('\u{feff}')) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(user = self.session.user_id, "upload rejected: {e}");
                return self.say(format!("⛔ Ошибка в формате JSON: {e}"));
            }
        };
        if data.current.is_none() {
            data.current = Some(self.today);
        }
        tracing::info!(
            user = self.session.user_id,
            periods = data.periods.len(),
            "Periods uploaded"
        );
        self.session.replace_data(data);
        self.session.clear_pending();
        let report = build_report(self.data(), self.today);
        self.say_with(format!("✅ Данные загружены.\n\n{report}"), reply::back_to_menu());
    }

    fn back(&mut self) {
        match self.session.pending {
            PendingAction::AwaitingEditIndex | PendingAction::AwaitingDeleteIndex => {
                self.session.clear_pending();
                self.show_periods();
            }
            PendingAction::AwaitingEditField => {
                self.session.editing_index = None;
                self.ask_edit_index();
            }
            PendingAction::AwaitingNewIn
            | PendingAction::AwaitingNewOut
            | PendingAction::AwaitingNewCountry => self.show_field_menu(),
            PendingAction::AwaitingAddIn
            | PendingAction::AwaitingAddOut
            | PendingAction::AwaitingAddCountry
            | PendingAction::AwaitingAddOpenCountry
            | PendingAction::AwaitingTailOut
            | PendingAction::AwaitingTailCountry
            | PendingAction::AwaitingHeadIn
            | PendingAction::AwaitingHeadCountry => self.show_add_menu(),
            pending if pending.is_resolving() => self.on_resolution(Callback::CancelEdit),
            _ => {
                self.session.clear_pending();
                self.show_start();
            }
        }
    }
}
