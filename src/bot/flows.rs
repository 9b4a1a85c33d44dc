// src/bot/flows.rs — Multi-step add / edit / delete flows and conflict resolution

use chrono::NaiveDate;

use super::action::{Callback, PendingAction};
use super::dispatcher::{Turn, ASK_COUNTRY, BAD_DATE, BAD_INDEX, EMPTY_COUNTRY, NO_PERIODS};
use super::reply;
use crate::core::date::{format_date, parse_date};
use crate::core::{BoundaryCheck, Period, PeriodData, PeriodError};

const ASK_ENTRY: &str = "📆 Введите дату въезда (ДД.ММ.ГГГГ):";
const ASK_EXIT: &str = "📆 Введите дату выезда (ДД.ММ.ГГГГ):";
const PERIOD_ADDED: &str = "✅ Новый период добавлен.";

/// User-facing text for a rejected change.
pub fn describe(err: &PeriodError) -> String {
    match err {
        PeriodError::OutOfRange { .. } => BAD_INDEX.to_string(),
        PeriodError::EmptyCountry => EMPTY_COUNTRY.to_string(),
        PeriodError::Inverted { entry, exit } => format!(
            "⛔ Дата въезда ({}) не может быть позже даты выезда ({}).",
            format_date(*entry),
            format_date(*exit)
        ),
        PeriodError::Chronology { position, boundary } => format!(
            "⛔ Нарушен хронологический порядок: период {position} пересекает границу {}.",
            format_date(*boundary)
        ),
        PeriodError::MissingEntry { position } => {
            format!("⛔ У периода {position} должна быть дата въезда.")
        }
        PeriodError::MissingExit { position } => {
            format!("⛔ У периода {position} должна быть дата выезда.")
        }
        PeriodError::UnboundedStart => {
            "⛔ Первый период начинается без даты въезда, добавить период перед ним нельзя.".to_string()
        }
        PeriodError::NoGap { position } => format!("⛔ Перед периодом {position} нет разрыва."),
    }
}

fn entry_text(p: &Period) -> String {
    p.entry.map(format_date).unwrap_or_else(|| "не указана".to_string())
}

fn exit_text(p: &Period) -> String {
    p.exit.map(format_date).unwrap_or_else(|| "не указана".to_string())
}

fn parse_position(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok()
}

impl Turn<'_> {
    fn finish_edit(&mut self, headline: &str) {
        self.session.clear_pending();
        let list = self.data().render_list(self.today);
        self.say_with(format!("{headline}\n\n{list}"), reply::periods_menu());
    }

    /// Make `before` the undo point for a change that has just succeeded.
    fn keep_undo(&mut self, before: PeriodData) {
        self.session.backup = before;
    }

    fn added(&mut self, result: Result<(), PeriodError>, before: PeriodData) {
        match result {
            Ok(()) => {
                self.keep_undo(before);
                tracing::info!(
                    user = self.session.user_id,
                    periods = self.session.data.len(),
                    "Period added"
                );
                self.finish_edit(PERIOD_ADDED);
            }
            Err(e) => {
                // The flow is over either way; the user starts it again.
                self.session.clear_pending();
                let text = match e {
                    PeriodError::Chronology { .. } => format!(
                        "⛔ Невозможно добавить период: нарушен хронологический порядок.\n{}",
                        describe(&e)
                    ),
                    other => describe(&other),
                };
                self.say_with(text, reply::add_period_menu());
            }
        }
    }

    /// Take the period being assembled, or bail out with an internal error.
    fn take_temp(&mut self) -> Option<Period> {
        let temp = self.session.temp.take();
        if temp.is_none() {
            self.internal_error("Period draft missing");
        }
        temp
    }

    fn read_date(&mut self, text: &str) -> Option<NaiveDate> {
        match parse_date(text) {
            Ok(d) => Some(d),
            Err(_) => {
                self.say(BAD_DATE);
                None
            }
        }
    }

    fn read_country(&mut self, text: &str) -> Option<String> {
        let name = text.trim();
        if name.is_empty() {
            self.say(EMPTY_COUNTRY);
            return None;
        }
        Some(name.to_string())
    }

    // -- Add --

    pub(super) fn show_add_menu(&mut self) {
        self.session.clear_pending();
        self.say_with("➕ Какой период добавить?", reply::add_period_menu());
    }

    fn begin(&mut self, next: PendingAction, prompt: String) {
        self.session.clear_pending();
        self.session.pending = next;
        self.say_with(prompt, reply::back());
    }

    pub(super) fn start_add_full(&mut self) {
        self.begin(PendingAction::AwaitingAddIn, ASK_ENTRY.to_string());
    }

    pub(super) fn start_add_head(&mut self) {
        self.begin(PendingAction::AwaitingHeadIn, ASK_ENTRY.to_string());
    }

    pub(super) fn start_add_tail(&mut self) {
        self.begin(PendingAction::AwaitingTailOut, ASK_EXIT.to_string());
    }

    pub(super) fn start_add_open(&mut self) {
        let calc = format_date(self.calc_date());
        self.begin(
            PendingAction::AwaitingAddOpenCountry,
            format!("🌍 Укажите страну, в которой вы находитесь с {calc}:"),
        );
    }

    pub(super) fn on_add_in(&mut self, text: &str) {
        let Some(date) = self.read_date(text) else { return };
        self.session.temp = Some(Period::new(Some(date), None, ""));
        self.session.pending = PendingAction::AwaitingAddOut;
        self.say_with(ASK_EXIT, reply::back());
    }

    pub(super) fn on_add_out(&mut self, text: &str) {
        let Some(entry) = self.session.temp.as_ref().and_then(|p| p.entry) else {
            return self.internal_error("Period draft missing");
        };
        let Some(exit) = self.read_date(text) else { return };
        if exit < entry {
            return self.say("⛔ Дата выезда не может быть раньше даты въезда.");
        }
        if let Some(temp) = self.session.temp.as_mut() {
            temp.exit = Some(exit);
        }
        self.session.pending = PendingAction::AwaitingAddCountry;
        self.say_with(ASK_COUNTRY, reply::back());
    }

    pub(super) fn on_add_country(&mut self, text: &str) {
        self.commit_draft(text, false);
    }

    pub(super) fn on_add_open_country(&mut self, text: &str) {
        let Some(country) = self.read_country(text) else { return };
        let calc = self.calc_date();
        let before = self.session.data.clone();
        let result = self
            .session
            .data
            .append(Period::new(Some(calc), None, country), calc);
        self.added(result, before);
    }

    pub(super) fn on_tail_out(&mut self, text: &str) {
        let Some(date) = self.read_date(text) else { return };
        self.session.temp = Some(Period::new(None, Some(date), ""));
        self.session.pending = PendingAction::AwaitingTailCountry;
        self.say_with(ASK_COUNTRY, reply::back());
    }

    pub(super) fn on_tail_country(&mut self, text: &str) {
        self.commit_draft(text, true);
    }

    pub(super) fn on_head_in(&mut self, text: &str) {
        let Some(date) = self.read_date(text) else { return };
        self.session.temp = Some(Period::new(Some(date), None, ""));
        self.session.pending = PendingAction::AwaitingHeadCountry;
        self.say_with(ASK_COUNTRY, reply::back());
    }

    pub(super) fn on_head_country(&mut self, text: &str) {
        self.commit_draft(text, false);
    }

    /// Last step of the dated add flows: name the country and insert.
    fn commit_draft(&mut self, text: &str, at_start: bool) {
        let Some(country) = self.read_country(text) else { return };
        let Some(mut period) = self.take_temp() else { return };
        period.country = country;
        let calc = self.calc_date();
        let before = self.session.data.clone();
        let result = if at_start {
            self.session.data.prepend(period, calc)
        } else {
            self.session.data.append(period, calc)
        };
        self.added(result, before);
    }

    // -- Edit --

    pub(super) fn ask_edit_index(&mut self) {
        if self.session.is_empty() {
            return self.say_with(NO_PERIODS, reply::main_menu(false));
        }
        self.session.clear_pending();
        self.session.pending = PendingAction::AwaitingEditIndex;
        let list = self.data().render_list(self.today);
        self.say_with(
            format!("{list}\n✏️ Введите номер периода для редактирования:"),
            reply::back(),
        );
    }

    pub(super) fn on_edit_index(&mut self, text: &str) {
        let index = parse_position(text).and_then(|pos| self.session.data.index_of(pos).ok());
        let Some(index) = index else {
            return self.say(BAD_INDEX);
        };
        self.session.editing_index = Some(index);
        self.show_field_menu();
    }

    pub(super) fn show_field_menu(&mut self) {
        let Some(period) = self.session.editing().and_then(|i| self.session.data.get(i)) else {
            return self.internal_error("Editing index lost");
        };
        let text = format!(
            "Выбран период с {} по {} ({}). Что изменить?",
            entry_text(period),
            exit_text(period),
            period.country
        );
        self.session.pending = PendingAction::AwaitingEditField;
        self.say_with(text, reply::edit_field_menu());
    }

    pub(super) fn choose_field(&mut self, next: PendingAction) {
        let editing = matches!(
            self.session.pending,
            PendingAction::AwaitingEditField
                | PendingAction::AwaitingNewIn
                | PendingAction::AwaitingNewOut
                | PendingAction::AwaitingNewCountry
        );
        if !editing {
            return self.ask_edit_index();
        }
        let Some(period) = self.session.editing().and_then(|i| self.session.data.get(i)) else {
            return self.internal_error("Editing index lost");
        };
        let prompt = match next {
            PendingAction::AwaitingNewIn => format!(
                "✏️ Текущая дата въезда: {}. Введите новую (ДД.ММ.ГГГГ):",
                entry_text(period)
            ),
            PendingAction::AwaitingNewOut => format!(
                "✏️ Текущая дата выезда: {}. Введите новую (ДД.ММ.ГГГГ):",
                exit_text(period)
            ),
            _ => format!("🌍 Текущая страна: {}. Введите новое название:", period.country),
        };
        self.session.pending = next;
        self.say_with(prompt, reply::back());
    }

    pub(super) fn on_new_in(&mut self, text: &str) {
        let Some(date) = self.read_date(text) else { return };
        let Some(index) = self.session.editing() else {
            return self.internal_error("Editing index lost");
        };
        match self.session.data.entry_change(index, date) {
            Err(e) => self.say(describe(&e)),
            Ok(BoundaryCheck::Unchanged) => self.finish_edit("ℹ️ Дата въезда не изменилась."),
            Ok(BoundaryCheck::Clear) => self.apply_entry(index, date),
            Ok(BoundaryCheck::Overlap { neighbor }) => {
                let state = PendingAction::ResolveInConflict { proposed: date };
                self.ask_resolution(
                    state,
                    format!(
                        "⚠️ Новая дата въезда {} раньше окончания предыдущего периода ({}). Что сделать?",
                        format_date(date),
                        format_date(neighbor)
                    ),
                );
            }
            Ok(BoundaryCheck::Gap { from, to }) => {
                let state = PendingAction::ResolveInGap { proposed: date };
                self.ask_resolution(
                    state,
                    format!(
                        "⚠️ Между предыдущим периодом и новой датой въезда остаётся разрыв: {} — {}. Что сделать?",
                        format_date(from),
                        format_date(to)
                    ),
                );
            }
        }
    }

    pub(super) fn on_new_out(&mut self, text: &str) {
        let Some(date) = self.read_date(text) else { return };
        let Some(index) = self.session.editing() else {
            return self.internal_error("Editing index lost");
        };
        match self.session.data.exit_change(index, date) {
            Err(e) => self.say(describe(&e)),
            Ok(BoundaryCheck::Unchanged) => self.finish_edit("ℹ️ Дата выезда не изменилась."),
            Ok(BoundaryCheck::Clear) => self.apply_exit(index, date),
            Ok(BoundaryCheck::Overlap { neighbor }) => {
                let state = PendingAction::ResolveOutConflict { proposed: date };
                self.ask_resolution(
                    state,
                    format!(
                        "⚠️ Новая дата выезда {} позже начала следующего периода ({}). Что сделать?",
                        format_date(date),
                        format_date(neighbor)
                    ),
                );
            }
            Ok(BoundaryCheck::Gap { from, to }) => {
                let state = PendingAction::ResolveOutGap { proposed: date };
                self.ask_resolution(
                    state,
                    format!(
                        "⚠️ Между новой датой выезда и следующим периодом остаётся разрыв: {} — {}. Что сделать?",
                        format_date(from),
                        format_date(to)
                    ),
                );
            }
        }
    }

    pub(super) fn on_new_country(&mut self, text: &str) {
        let Some(index) = self.session.editing() else {
            return self.internal_error("Editing index lost");
        };
        let before = self.session.data.clone();
        match self.session.data.set_country(index, text) {
            Ok(()) => {
                self.keep_undo(before);
                self.finish_edit("✅ Страна обновлена.");
            }
            Err(e) => self.say(describe(&e)),
        }
    }

    fn apply_entry(&mut self, index: usize, date: NaiveDate) {
        let before = self.session.data.clone();
        match self.session.data.set_entry(index, date) {
            Ok(()) => {
                self.keep_undo(before);
                self.finish_edit("✅ Дата въезда обновлена.");
            }
            Err(_) => self.internal_error("Edited period vanished"),
        }
    }

    fn apply_exit(&mut self, index: usize, date: NaiveDate) {
        let before = self.session.data.clone();
        match self.session.data.set_exit(index, date) {
            Ok(()) => {
                self.keep_undo(before);
                self.finish_edit("✅ Дата выезда обновлена.");
            }
            Err(_) => self.internal_error("Edited period vanished"),
        }
    }

    fn ask_resolution(&mut self, state: PendingAction, text: String) {
        self.session.pending = state;
        self.say_with(text, reply::conflict_menu(&state));
    }

    /// Apply one of the choices offered for a boundary conflict.
    pub(super) fn on_resolution(&mut self, cb: Callback) {
        let pending = self.session.pending;
        if !pending.is_resolving() {
            return self.say("⚠️ Нет изменения, ожидающего решения.");
        }
        if !pending.accepts(cb) {
            return self.say("⚠️ Этот вариант сейчас недоступен.");
        }
        if cb == Callback::CancelEdit {
            return self.finish_edit("❌ Изменение отменено.");
        }
        let Some(index) = self.session.editing() else {
            return self.internal_error("Editing index lost");
        };
        let calc = self.calc_date();
        let before = self.session.data.clone();
        let data = &mut self.session.data;

        let outcome = match (pending, cb) {
            (
                PendingAction::ResolveInConflict { proposed } | PendingAction::ResolveInGap { proposed },
                Callback::AdjustPrevOut,
            ) => data
                .shift_previous_exit(index, proposed)
                .map(|()| "📌 Предыдущий период подвинут, дата въезда обновлена."),
            (
                PendingAction::ResolveInConflict { proposed } | PendingAction::ResolveInGap { proposed },
                Callback::KeepConflict,
            ) => data
                .set_entry(index, proposed)
                .map(|()| "✅ Дата въезда обновлена."),
            (PendingAction::ResolveInGap { proposed }, Callback::AddGapPeriod) => {
                match data.insert_gap_before(index, proposed, calc) {
                    Ok(edited) => {
                        self.session.editing_index = Some(edited);
                        Ok("🕳 Добавлен период «unknown», дата въезда обновлена.")
                    }
                    Err(e) => Err(e),
                }
            }
            (
                PendingAction::ResolveOutConflict { proposed } | PendingAction::ResolveOutGap { proposed },
                Callback::AdjustNextIn,
            ) => data
                .shift_next_entry(index, proposed)
                .map(|()| "📌 Следующий период подвинут, дата выезда обновлена."),
            (
                PendingAction::ResolveOutConflict { proposed } | PendingAction::ResolveOutGap { proposed },
                Callback::KeepConflict,
            ) => data
                .set_exit(index, proposed)
                .map(|()| "✅ Дата выезда обновлена."),
            _ => return self.say("⚠️ Этот вариант сейчас недоступен."),
        };

        match outcome {
            Ok(headline) => {
                self.keep_undo(before);
                tracing::info!(
                    user = self.session.user_id,
                    choice = cb.as_str(),
                    "Boundary conflict resolved"
                );
                self.finish_edit(headline);
            }
            Err(e) => self.say(format!("{}\nВыберите другой вариант.", describe(&e))),
        }
    }

    // -- Delete --

    pub(super) fn ask_delete_index(&mut self) {
        if self.session.is_empty() {
            return self.say_with(NO_PERIODS, reply::main_menu(false));
        }
        self.session.clear_pending();
        self.session.pending = PendingAction::AwaitingDeleteIndex;
        let list = self.data().render_list(self.today);
        self.say_with(
            format!("{list}\n🗑 Введите номер периода для удаления:"),
            reply::back(),
        );
    }

    pub(super) fn on_delete_index(&mut self, text: &str) {
        let Some(position) = parse_position(text) else {
            return self.say(BAD_INDEX);
        };
        let before = self.session.data.clone();
        match self.session.data.remove(position) {
            Ok(removed) => {
                tracing::info!(
                    user = self.session.user_id,
                    position,
                    country = %removed.country,
                    "Period deleted"
                );
                self.keep_undo(before);
                self.session.editing_index = None;
                if self.session.is_empty() {
                    self.session.clear_pending();
                    self.say_with("🗑 Период удалён. Периодов больше нет.", reply::main_menu(false));
                } else {
                    self.finish_edit("🗑 Период удалён.");
                }
            }
            Err(e) => self.say(describe(&e)),
        }
    }
}
