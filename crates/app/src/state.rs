//! State management for the assistant app
//!
//! Wraps the assistant controller with the screen-only bits: input text,
//! transient notices, image textures and the settings draft.

use assistant::attachment::decode_rgba;
use assistant::AssistantController;
use providers::ResponseAdapter;
use shared::chat::{ChatTurn, EncodedImage, TurnId};
use shared::errors::AssistantError;
use shared::settings::AppSettings;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::utils::{fit_within, non_empty, save_settings};

const NOTICE_TTL: Duration = Duration::from_secs(4);
const PREVIEW_MAX_PX: u32 = 320;

/// Editable copy of the settings shown in the Settings window.
#[derive(Default)]
pub struct SettingsDraft {
    pub api_key: String,
    pub model: String,
    pub timeout_secs: String,
}

impl SettingsDraft {
    fn from_settings(settings: &AppSettings) -> Self {
        Self {
            api_key: settings.model.gemini_auth.api_key.clone().unwrap_or_default(),
            model: settings.model.gemini_model.clone(),
            timeout_secs: settings.model.request_timeout_secs.to_string(),
        }
    }
}

pub struct AppState {
    pub controller: AssistantController,
    pub settings: AppSettings,
    pub input_text: String,
    notice: Option<(String, Instant)>,
    turn_textures: HashMap<TurnId, Option<egui::TextureHandle>>,
    attachment_texture: Option<(String, egui::TextureHandle)>,
    pub show_settings_dialog: bool,
    pub settings_draft: SettingsDraft,
}

impl AppState {
    pub fn new(settings: AppSettings) -> Self {
        let adapter = ResponseAdapter::from_settings(&settings.model);
        Self {
            controller: AssistantController::new(Arc::new(adapter)),
            settings_draft: SettingsDraft::from_settings(&settings),
            settings,
            input_text: String::new(),
            notice: None,
            turn_textures: HashMap::new(),
            attachment_texture: None,
            show_settings_dialog: false,
        }
    }

    /// Check for a completed AI response (called each frame)
    pub fn poll_ai_response(&mut self) {
        if let Some(turn) = self.controller.poll() {
            info!(turn = %turn.id, "response received");
        }
    }

    pub fn send_message(&mut self) {
        match self.controller.dispatch_in_background(&self.input_text) {
            Ok(()) => {
                self.input_text.clear();
                self.attachment_texture = None;
            }
            // Nothing to send, or still waiting: the button is disabled in
            // both cases, so Enter is simply ignored.
            Err(AssistantError::EmptyTurn) | Err(AssistantError::Busy) => {}
            Err(e) => self.set_notice(e.to_string()),
        }
    }

    pub fn pick_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
            .pick_file()
        {
            self.attach_image(&path);
        }
    }

    pub fn attach_image(&mut self, path: &Path) {
        self.attachment_texture = None;
        if let Err(e) = self.controller.on_attachment_selected(path) {
            self.set_notice(e.to_string());
        }
    }

    pub fn clear_attachment(&mut self) {
        self.controller.on_attachment_cleared();
        self.attachment_texture = None;
    }

    pub fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some((text.into(), Instant::now()));
    }

    /// Current notice, dropping it once expired.
    pub fn notice(&mut self) -> Option<&str> {
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    /// Texture for the image attached to `turn`, decoded once.
    pub fn turn_texture(&mut self, ctx: &egui::Context, turn: &ChatTurn) -> Option<egui::TextureHandle> {
        let image = turn.image.as_ref()?;
        self.turn_textures
            .entry(turn.id)
            .or_insert_with(|| load_texture(ctx, &format!("turn-{}", turn.id), image))
            .clone()
    }

    /// Texture for the attachment waiting in the input area.
    pub fn attachment_preview(&mut self, ctx: &egui::Context) -> Option<(String, egui::TextureHandle)> {
        let attachment = self.controller.attachment()?;
        if self.attachment_texture.is_none() {
            let texture = load_texture(ctx, "attachment-preview", &attachment.image)?;
            self.attachment_texture = Some((attachment.label.clone(), texture));
        }
        self.attachment_texture.clone()
    }

    pub fn open_settings(&mut self) {
        self.settings_draft = SettingsDraft::from_settings(&self.settings);
        self.show_settings_dialog = true;
    }

    /// Apply the draft, persist it and rebuild the adapter. An invalid
    /// timeout leaves settings untouched and the dialog open.
    pub fn apply_settings(&mut self) {
        let draft = &self.settings_draft;
        let timeout_secs = match draft.timeout_secs.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                self.set_notice("Timeout must be a positive number of seconds");
                return;
            }
        };
        self.settings.model.gemini_auth.api_key = non_empty(&draft.api_key);
        if let Some(model) = non_empty(&draft.model) {
            self.settings.model.gemini_model = model;
        }
        self.settings.model.request_timeout_secs = timeout_secs;

        if let Err(e) = save_settings(&self.settings) {
            warn!(error = %e, "settings not saved");
            self.set_notice(format!("Settings not saved: {}", e));
        }
        let adapter = ResponseAdapter::from_settings(&self.settings.model);
        self.controller.replace_adapter(Arc::new(adapter));
        self.show_settings_dialog = false;
    }
}

fn load_texture(ctx: &egui::Context, name: &str, image: &EncodedImage) -> Option<egui::TextureHandle> {
    let rgba = match decode_rgba(image) {
        Ok(rgba) => rgba,
        Err(e) => {
            warn!(error = %e, "image preview unavailable");
            return None;
        }
    };
    let [w, h] = fit_within([rgba.width(), rgba.height()], PREVIEW_MAX_PX);
    let rgba = if [w, h] == [rgba.width(), rgba.height()] {
        rgba
    } else {
        image::imageops::thumbnail(&rgba, w, h)
    };
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &rgba);
    Some(ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR))
}
