use anyhow::Result;
use eframe::egui::{self, Align2, Color32, RichText};
use eframe::{Frame, Storage};
use egui_extras::{Column, TableBuilder};
use tokio::runtime::Runtime;
use tracing::error;

use crate::store::Gateway;
use config::Config;
use form::{dispatch, Action, AppState, Effect};

mod config;
mod form;

pub struct App {
    cfg: Config,
    store: Gateway,
    rt: Runtime,
    state: AppState,
    warn: Result<()>,
    notice: Option<String>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, rt: Runtime) -> Self {
        let cfg = cc
            .storage
            .and_then(|storage| eframe::get_value::<Config>(storage, eframe::APP_KEY))
            .unwrap_or_default();
        let store = Gateway::new(cfg.database_url.clone());

        let mut app = Self {
            cfg,
            store,
            rt,
            state: AppState::default(),
            warn: Ok(()),
            notice: None,
        };
        match app.rt.block_on(app.store.init_schema()) {
            Ok(()) => app.reload(),
            Err(e) => app.warn = Err(e.into()),
        }
        app
    }

    /// Mutations never patch the table in place: the view is always a
    /// full reload of the store, after which the form is back to Idle.
    fn reload(&mut self) {
        match self.rt.block_on(self.store.list_accounts()) {
            Ok(accounts) => {
                self.state.accounts = accounts;
                self.state.clear_selection();
            }
            Err(e) => {
                error!("failed to reload accounts: {e}");
                self.warn = Err(e.into());
            }
        }
    }

    fn run(&mut self, action: Action) {
        self.warn = Ok(());
        match dispatch(&mut self.state, action) {
            Ok(Some(effect)) => self.apply(effect),
            Ok(None) => {}
            Err(e) => self.warn = Err(e),
        }
    }

    fn apply(&mut self, effect: Effect) {
        let outcome = match effect {
            Effect::Create(account) => self
                .rt
                .block_on(self.store.create_account(&account))
                .map(|()| format!("Account {} added successfully!", account.acc_no)),
            Effect::Overwrite(account) => self
                .rt
                .block_on(self.store.update_account(&account))
                .map(|()| "Account updated successfully!".to_owned()),
            Effect::Remove(acc_no) => self
                .rt
                .block_on(self.store.delete_account(&acc_no))
                .map(|()| "Account deleted successfully!".to_owned()),
            Effect::Deposit { acc_no, amount } => self
                .rt
                .block_on(self.store.deposit(&acc_no, amount))
                .map(|()| format!("{amount:.2} deposited successfully!")),
            Effect::Withdraw { acc_no, amount } => self
                .rt
                .block_on(self.store.withdraw(&acc_no, amount))
                .map(|()| format!("{amount:.2} withdrawn successfully!")),
            Effect::QueryBalance(acc_no) => {
                // Balance checks leave the table and the selection alone.
                match self.rt.block_on(self.store.get_balance(&acc_no)) {
                    Ok((name, balance)) => {
                        self.notice = Some(format!(
                            "Account: {acc_no}\nHolder: {name}\nBalance: {balance:.2}"
                        ));
                    }
                    Err(e) => self.warn = Err(e.into()),
                }
                return;
            }
        };

        match outcome {
            Ok(msg) => self.notice = Some(msg),
            Err(e) => self.warn = Err(e.into()),
        }
        self.reload();
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if let Err(e) = &self.warn {
            egui::TopBottomPanel::top("warn_banner").show(ctx, |ui| {
                ui.label(RichText::from(e.to_string()).color(Color32::RED));
            });
        }

        let mut pending: Option<Action> = None;

        egui::SidePanel::left("account_details")
            .resizable(false)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Account Details");
                ui.separator();

                egui::Grid::new("account_form")
                    .num_columns(2)
                    .spacing([10.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Account No");
                        ui.text_edit_singleline(&mut self.state.form.acc_no);
                        ui.end_row();

                        ui.label("Name");
                        ui.text_edit_singleline(&mut self.state.form.name);
                        ui.end_row();

                        ui.label("Account Type");
                        ui.text_edit_singleline(&mut self.state.form.acc_type);
                        ui.end_row();

                        ui.label("Balance");
                        ui.text_edit_singleline(&mut self.state.form.balance);
                        ui.end_row();
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Add").clicked() {
                        pending = Some(Action::Add);
                    }
                    if ui.button("Update").clicked() {
                        pending = Some(Action::Update);
                    }
                    if ui.button("Delete").clicked() {
                        pending = Some(Action::Delete);
                    }
                    if ui.button("Clear").clicked() {
                        pending = Some(Action::Clear);
                    }
                });
                ui.horizontal(|ui| {
                    if ui.button("Deposit").clicked() {
                        pending = Some(Action::Deposit);
                    }
                    if ui.button("Withdraw").clicked() {
                        pending = Some(Action::Withdraw);
                    }
                    if ui.button("Check Balance").clicked() {
                        pending = Some(Action::CheckBalance);
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Customer Records");
            ui.separator();

            let text_height = egui::TextStyle::Body.resolve(ui.style()).size * 2.0;
            let selected = self.state.selected;
            let accounts = &self.state.accounts;

            TableBuilder::new(ui)
                .striped(true)
                .sense(egui::Sense::click())
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::remainder())
                .column(Column::remainder())
                .column(Column::remainder())
                .column(Column::remainder())
                .header(text_height, |mut header| {
                    header.col(|ui| {
                        ui.strong("Account No");
                    });
                    header.col(|ui| {
                        ui.strong("Name");
                    });
                    header.col(|ui| {
                        ui.strong("Account Type");
                    });
                    header.col(|ui| {
                        ui.strong("Balance");
                    });
                })
                .body(|body| {
                    body.rows(text_height, accounts.len(), |mut row| {
                        let index = row.index();
                        row.set_selected(selected == Some(index));
                        let account = &accounts[index];
                        row.col(|ui| {
                            ui.label(account.acc_no.as_str());
                        });
                        row.col(|ui| {
                            ui.label(account.name.as_str());
                        });
                        row.col(|ui| {
                            ui.label(account.acc_type.as_str());
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.2}", account.balance));
                        });
                        if row.response().clicked() {
                            pending = Some(Action::Select(index));
                        }
                    });
                });
        });

        egui::TopBottomPanel::bottom("bottom").show(ctx, |ui| {
            egui::widgets::global_dark_light_mode_switch(ui);
        });

        if self.notice.is_some() {
            let mut dismissed = false;
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    if let Some(notice) = &self.notice {
                        ui.label(notice.as_str());
                    }
                    dismissed = ui.button("OK").clicked();
                });
            if dismissed {
                self.notice = None;
            }
        }

        if let Some(action) = pending {
            self.run(action);
        }
    }

    fn save(&mut self, storage: &mut dyn Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.cfg);
    }
}
