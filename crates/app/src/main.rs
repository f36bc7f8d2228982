use parking_lot::Mutex;
use shared::chat::ChatTurn;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod state;
mod utils;

use state::AppState;
use utils::{input_hint, load_settings_or_default, waiting_status};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(79, 70, 229);
const THINKING: egui::Color32 = egui::Color32::from_rgb(124, 58, 237);

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings_or_default();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 760.0])
            .with_min_inner_size([520.0, 480.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Nexus AI Assistant",
        options,
        Box::new(move |_cc| {
            Box::new(AssistantApp {
                state: Arc::new(Mutex::new(AppState::new(settings))),
            })
        }),
    )
}

struct AssistantApp {
    state: Arc<Mutex<AppState>>,
}

impl eframe::App for AssistantApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        // Poll for AI response (non-blocking)
        s.poll_ai_response();
        if s.controller.is_pending() {
            ctx.request_repaint();
        }

        let dark = s.settings.dark_mode;
        ctx.set_visuals(if dark {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.heading(egui::RichText::new("Nexus AI Assistant").strong());
                    ui.label(
                        egui::RichText::new(format!(
                            "Powered by {}",
                            s.controller.adapter().model()
                        ))
                        .small()
                        .weak(),
                    );
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Settings").clicked() {
                        s.open_settings();
                    }
                    let mut thinking = s.controller.reasoning_mode();
                    let label = egui::RichText::new("Thinking Mode").color(if thinking {
                        THINKING
                    } else {
                        ui.visuals().text_color()
                    });
                    if ui.checkbox(&mut thinking, label).changed() {
                        s.controller.set_reasoning_mode(thinking);
                    }
                });
            });
            ui.add_space(8.0);
        });

        egui::TopBottomPanel::bottom("input").show(ctx, |ui| {
            ui.add_space(8.0);
            render_input_area(ui, ctx, &mut s);
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new(
                        "Nexus AI can make mistakes. Check important inventory data.",
                    )
                    .size(10.0)
                    .weak(),
                );
            });
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let turns: Vec<ChatTurn> = s.controller.turns().to_vec();
            let waiting = s.controller.is_pending();
            let status = waiting_status(s.controller.reasoning_mode());

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for turn in &turns {
                        ui.add_space(6.0);
                        let texture = s.turn_texture(ctx, turn);
                        render_turn(ui, turn, texture.as_ref(), dark);
                        ui.add_space(6.0);
                    }

                    if waiting {
                        ui.add_space(6.0);
                        egui::Frame::none()
                            .fill(bubble_fill(dark))
                            .rounding(egui::Rounding::same(12.0))
                            .inner_margin(egui::Margin::same(12.0))
                            .show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    ui.spinner();
                                    // Animated dots
                                    let time = ui.input(|i| i.time);
                                    let dots = match ((time * 2.0) as i32) % 4 {
                                        0 => "   ",
                                        1 => ".  ",
                                        2 => ".. ",
                                        _ => "...",
                                    };
                                    ui.label(
                                        egui::RichText::new(format!("{}{}", status, dots))
                                            .italics()
                                            .weak(),
                                    );
                                });
                            });
                    }
                });
        });

        if s.show_settings_dialog {
            render_settings_window(ctx, &mut s);
        }
    }
}

fn bubble_fill(dark: bool) -> egui::Color32 {
    if dark {
        egui::Color32::from_rgb(50, 50, 58)
    } else {
        egui::Color32::from_rgb(245, 245, 248)
    }
}

fn show_texture(ui: &mut egui::Ui, texture: &egui::TextureHandle) {
    ui.image(egui::ImageSource::Texture(egui::load::SizedTexture::new(
        texture.id(),
        texture.size_vec2(),
    )));
}

fn render_turn(
    ui: &mut egui::Ui,
    turn: &ChatTurn,
    texture: Option<&egui::TextureHandle>,
    dark: bool,
) {
    if turn.is_user() {
        // User message - right aligned
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
            ui.add_space(8.0);
            egui::Frame::none()
                .fill(egui::Color32::from_rgb(15, 23, 42))
                .rounding(egui::Rounding::same(12.0))
                .inner_margin(egui::Margin::same(12.0))
                .show(ui, |ui| {
                    ui.set_max_width(500.0);
                    ui.vertical(|ui| {
                        if let Some(texture) = texture {
                            show_texture(ui, texture);
                        }
                        if !turn.text.is_empty() {
                            ui.label(
                                egui::RichText::new(&turn.text)
                                    .color(egui::Color32::WHITE)
                                    .size(15.0),
                            );
                        }
                        ui.label(
                            egui::RichText::new(turn.time_label())
                                .size(10.0)
                                .color(egui::Color32::from_gray(160)),
                        );
                    });
                });
        });
    } else {
        egui::Frame::none()
            .fill(bubble_fill(dark))
            .rounding(egui::Rounding::same(12.0))
            .inner_margin(egui::Margin::same(12.0))
            .show(ui, |ui| {
                ui.set_max_width(600.0);
                ui.label(egui::RichText::new(&turn.text).size(15.0));
                ui.label(egui::RichText::new(turn.time_label()).size(10.0).weak());
            });
        if turn.thought_deeply() {
            ui.label(
                egui::RichText::new("Thought deeply about this")
                    .size(12.0)
                    .color(THINKING),
            );
        }
    }
}

fn render_input_area(ui: &mut egui::Ui, ctx: &egui::Context, s: &mut AppState) {
    if let Some(notice) = s.notice() {
        ui.label(egui::RichText::new(notice).color(egui::Color32::from_rgb(200, 80, 80)));
        ctx.request_repaint_after(std::time::Duration::from_millis(500));
    }

    if let Some((label, texture)) = s.attachment_preview(ctx) {
        let mut remove = false;
        ui.horizontal(|ui| {
            ui.image(egui::ImageSource::Texture(egui::load::SizedTexture::new(
                texture.id(),
                texture.size_vec2() * (80.0 / texture.size_vec2().y.max(1.0)),
            )));
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(label).small());
                ui.label(
                    egui::RichText::new("Image attached. Add a prompt to analyze it.").weak(),
                );
                remove = ui.small_button("Remove").clicked();
            });
        });
        if remove {
            s.clear_attachment();
        }
        ui.add_space(6.0);
    }

    let hint = input_hint(s.controller.reasoning_mode());
    ui.horizontal(|ui| {
        if ui
            .add_sized([40.0, 40.0], egui::Button::new("Img"))
            .on_hover_text("Upload Image")
            .clicked()
        {
            s.pick_image();
        }

        let response = ui.add_sized(
            [ui.available_width() - 80.0, 40.0],
            egui::TextEdit::singleline(&mut s.input_text)
                .hint_text(hint)
                .font(egui::FontId::new(15.0, egui::FontFamily::Proportional)),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            s.send_message();
            response.request_focus();
        }

        let can_send = s.controller.can_send(&s.input_text);
        let send = egui::Button::new(egui::RichText::new("Send").color(egui::Color32::WHITE))
            .fill(ACCENT);
        if ui.add_enabled(can_send, send).clicked() {
            s.send_message();
        }
    });
}

fn render_settings_window(ctx: &egui::Context, s: &mut AppState) {
    let mut open = true;
    let mut save = false;
    egui::Window::new("Settings")
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .show(ctx, |ui| {
            ui.set_min_width(380.0);
            egui::Grid::new("settings_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Gemini API key");
                    ui.add(
                        egui::TextEdit::singleline(&mut s.settings_draft.api_key)
                            .password(true)
                            .hint_text("uses GEMINI_API_KEY if empty"),
                    );
                    ui.end_row();

                    ui.label("Model");
                    ui.text_edit_singleline(&mut s.settings_draft.model);
                    ui.end_row();

                    ui.label("Timeout (seconds)");
                    ui.text_edit_singleline(&mut s.settings_draft.timeout_secs);
                    ui.end_row();
                });
            ui.checkbox(&mut s.settings.dark_mode, "Dark mode");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                save = ui.button("Save").clicked();
            });
        });

    if save {
        s.apply_settings();
    } else if !open || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        s.show_settings_dialog = false;
    }
}
