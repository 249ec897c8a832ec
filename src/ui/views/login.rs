//! Inloggningsskärm, med skapande av första kontot när inga användare finns

use egui::{self, RichText};

use crate::db::Database;
use crate::services::auth::{AuthService, MIN_PASSWORD_LEN};
use crate::ui::{
    state::AppState,
    theme::{Colors, Icons},
};

#[derive(Default)]
pub struct LoginView {
    username: String,
    password: String,
    confirm_password: String,
    error_message: Option<String>,
    /// None tills antalet användare har lästs
    has_users: Option<bool>,
}

impl LoginView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut AppState, db: &Database) {
        let auth = AuthService::new(db);

        if self.has_users.is_none() {
            match auth.has_users() {
                Ok(has_users) => self.has_users = Some(has_users),
                Err(e) => {
                    self.error_message = Some(format!("Kunde inte läsa användare: {}", e));
                    self.has_users = Some(true);
                }
            }
        }
        let first_account = self.has_users == Some(false);

        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.heading(
                RichText::new(format!("{} Delivery Dashboard", Icons::DASHBOARD))
                    .color(Colors::PRIMARY),
            );
            ui.add_space(8.0);

            let subtitle = if first_account {
                "Inga konton finns. Skapa det första kontot."
            } else {
                "Logga in för att fortsätta"
            };
            ui.label(RichText::new(subtitle).color(Colors::TEXT_SECONDARY));
            ui.add_space(16.0);

            egui::Frame::none()
                .fill(ui.visuals().extreme_bg_color)
                .rounding(8.0)
                .inner_margin(16.0)
                .show(ui, |ui| {
                    ui.set_max_width(360.0);

                    let mut submitted = false;
                    egui::Grid::new("login_grid")
                        .num_columns(2)
                        .spacing([8.0, 8.0])
                        .show(ui, |ui| {
                            ui.label(format!("{} Användarnamn:", Icons::USER));
                            ui.text_edit_singleline(&mut self.username);
                            ui.end_row();

                            ui.label(format!("{} Lösenord:", Icons::LOCK));
                            let response = ui.add(
                                egui::TextEdit::singleline(&mut self.password).password(true),
                            );
                            submitted |= !first_account
                                && response.lost_focus()
                                && ui.input(|i| i.key_pressed(egui::Key::Enter));
                            ui.end_row();

                            if first_account {
                                ui.label("Bekräfta lösenord:");
                                ui.add(
                                    egui::TextEdit::singleline(&mut self.confirm_password)
                                        .password(true),
                                );
                                ui.end_row();
                            }
                        });

                    if first_account {
                        ui.label(
                            RichText::new(format!("Minst {} tecken", MIN_PASSWORD_LEN))
                                .small()
                                .color(Colors::TEXT_MUTED),
                        );
                    }

                    if let Some(ref error) = self.error_message {
                        ui.add_space(8.0);
                        ui.label(RichText::new(error).color(Colors::ERROR));
                    }

                    ui.add_space(12.0);

                    let label = if first_account { "Skapa konto" } else { "Logga in" };
                    if ui.button(label).clicked() || submitted {
                        if first_account {
                            self.create_first_account(state, &auth);
                        } else {
                            self.login(state, &auth);
                        }
                    }
                });
        });
    }

    fn login(&mut self, state: &mut AppState, auth: &AuthService) {
        match auth.login(&self.username, &self.password) {
            Ok(session) => {
                let message = format!("Välkommen, {}", session.username);
                state.login(session);
                state.show_success(&message);
                self.reset();
            }
            Err(e) => {
                self.password.clear();
                self.error_message = Some(e.to_string());
            }
        }
    }

    fn create_first_account(&mut self, state: &mut AppState, auth: &AuthService) {
        if self.password != self.confirm_password {
            self.error_message = Some("Lösenorden matchar inte".to_string());
            return;
        }

        let result = auth
            .register(&self.username, &self.password)
            .and_then(|_| auth.login(&self.username, &self.password));

        match result {
            Ok(session) => {
                state.login(session);
                state.show_success("Kontot skapat");
                self.reset();
                self.has_users = Some(true);
            }
            Err(e) => {
                tracing::warn!("Kunde inte skapa första kontot: {}", e);
                self.error_message = Some(e.to_string());
            }
        }
    }

    fn reset(&mut self) {
        let has_users = self.has_users;
        *self = Self::default();
        self.has_users = has_users;
    }

    /// Läs om antalet användare nästa gång vyn visas
    pub fn mark_needs_refresh(&mut self) {
        self.has_users = None;
    }
}
