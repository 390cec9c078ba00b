//! The annotator window.

use crate::collection::Collection;
use crate::loader::{ImageLoad, ImageLoader};
use crate::session::{CaptionSession, CommitFailed};
use crate::storage::{CaptionStore, FsCaptionStore};
use eframe::egui;
use egui::{Color32, Key, Vec2};
use log::{debug, error, warn};

/// Everything the user can ask for. Collected while drawing a frame and
/// applied afterwards, so widgets never mutate state mid-layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Previous,
    Next,
    Select(usize),
    EditCaption,
    UndoChanges,
    Save,
    Cancel,
}

pub struct CaptionApp {
    collection: Collection,
    store: FsCaptionStore,
    loader: ImageLoader,
    texture: Option<egui::TextureHandle>,
    texture_size: [usize; 2],
    image_error: Option<String>,
    caption: Result<String, String>,
    session: Option<CaptionSession>,
    status: Option<String>,
}

impl CaptionApp {
    pub fn new(collection: Collection, store: FsCaptionStore, loader: ImageLoader) -> Self {
        let mut app = Self {
            collection,
            store,
            loader,
            texture: None,
            texture_size: [0, 0],
            image_error: None,
            caption: Ok(String::new()),
            session: None,
            status: None,
        };
        app.show_current();
        app
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn session(&self) -> Option<&CaptionSession> {
        self.session.as_ref()
    }

    /// Caption of the current pair, or why it could not be read.
    pub fn caption(&self) -> Result<&str, &str> {
        self.caption.as_deref().map_err(String::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Previous | Action::Next | Action::Select(_) => self.navigate(action),
            Action::EditCaption => self.edit_caption(),
            Action::UndoChanges => {
                if let Some(session) = self.session.as_mut() {
                    session.discard();
                }
            }
            Action::Save => self.save_caption(),
            Action::Cancel => {
                if let Some(session) = self.session.take() {
                    session.close();
                }
            }
        }
    }

    fn navigate(&mut self, action: Action) {
        if self.session.is_some() {
            self.status = Some("Save or cancel the caption edit first.".to_owned());
            return;
        }
        let before = self.collection.position();
        match action {
            Action::Previous => {
                self.collection.previous();
            }
            Action::Next => {
                self.collection.next();
            }
            Action::Select(i) => {
                if let Err(e) = self.collection.seek(i) {
                    warn!("ignoring stale selection: {e}");
                    return;
                }
            }
            _ => return,
        }
        if self.collection.position() != before {
            self.status = None;
            self.show_current();
        }
    }

    /// Read the current caption and queue the current image.
    fn show_current(&mut self) {
        let pair = self.collection.current();
        debug!(
            "showing {} / {}",
            pair.image.display(),
            pair.caption.display()
        );
        self.caption = self.store.read(pair.caption).map_err(|e| {
            warn!("{e}");
            e.to_string()
        });
        let image = pair.image.to_path_buf();
        // spinner until the new image arrives
        self.texture = None;
        self.texture_size = [0, 0];
        self.image_error = None;
        self.loader.request(image);
    }

    fn edit_caption(&mut self) {
        if self.session.is_some() {
            return;
        }
        let target = self.collection.current().caption.to_path_buf();
        match CaptionSession::open(target, &self.store) {
            Ok(session) => self.session = Some(session),
            Err(e) => {
                error!("{e}");
                self.status = Some(e.to_string());
            }
        }
    }

    fn save_caption(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match session.commit(&self.store) {
            Ok(text) => {
                self.caption = Ok(text);
                self.status = Some("Caption saved.".to_owned());
            }
            Err(CommitFailed { session, error }) => {
                self.status = Some(format!("{error} (edits kept, try again)"));
                self.session = Some(session);
            }
        }
    }

    /// Newest finished load, skipping any that a later request superseded.
    fn take_latest_load(&mut self) -> Option<ImageLoad> {
        let mut latest = None;
        while let Some(load) = self.loader.try_recv() {
            if load.ticket == self.loader.last_ticket() {
                latest = Some(load);
            } else {
                debug!("dropping superseded image #{}", load.ticket);
            }
        }
        latest
    }

    fn poll_loader(&mut self, ctx: &egui::Context) {
        let Some(load) = self.take_latest_load() else {
            return;
        };
        match load.result {
            Ok(img) => {
                let image = egui::ColorImage::from_rgba_unmultiplied(img.size, &img.rgba);
                let tex = ctx.load_texture(
                    load.path.to_string_lossy(),
                    image,
                    egui::TextureOptions::LINEAR,
                );
                self.texture = Some(tex);
                self.texture_size = img.size;
                self.image_error = None;
            }
            Err(e) => {
                warn!("{e}");
                self.texture = None;
                self.image_error = Some(e.to_string());
            }
        }
    }

    fn top_bar(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let idle = self.session.is_none();
        ui.horizontal(|ui| {
            let prev = egui::Button::new("Previous");
            if ui.add_enabled(idle && !self.collection.is_at_first(), prev).clicked() {
                actions.push(Action::Previous);
            }
            if ui.add_enabled(idle, egui::Button::new("Edit Caption")).clicked() {
                actions.push(Action::EditCaption);
            }
            let next = egui::Button::new("Next");
            if ui.add_enabled(idle && !self.collection.is_at_last(), next).clicked() {
                actions.push(Action::Next);
            }
            ui.separator();
            ui.label(self.collection.progress_label());
            ui.separator();
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    }

    fn image_list(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.heading("Images");
        egui::ScrollArea::vertical().show(ui, |ui| {
            let current = self.collection.position();
            for (i, pair) in self.collection.pairs().enumerate() {
                let fname = pair
                    .image
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                if ui.selectable_label(i == current, fname.as_ref()).clicked() {
                    actions.push(Action::Select(i));
                }
            }
        });
    }

    fn current_pair(&self, ui: &mut egui::Ui) {
        let pair = self.collection.current();
        ui.label(format!("File Location: {}", pair.image.display()));
        ui.label(format!("Text File Location: {}", pair.caption.display()));
        ui.separator();

        // keep room for the caption under the image
        let available = ui.available_size() - Vec2::new(0.0, 120.0);
        if let Some(tex) = &self.texture {
            let [tw, th] = self.texture_size;
            let aspect = tw as f32 / th.max(1) as f32;
            let mut dw = available.x.max(1.0);
            let mut dh = available.y.max(1.0);
            if dw / dh > aspect {
                dw = dh * aspect;
            } else {
                dh = dw / aspect;
            }
            ui.add(egui::Image::new(tex).fit_to_exact_size(Vec2::new(dw, dh)));
        } else if let Some(err) = &self.image_error {
            ui.colored_label(Color32::LIGHT_RED, err.as_str());
        } else {
            ui.spinner();
        }

        ui.separator();
        match &self.caption {
            Ok(text) => {
                ui.add(egui::Label::new(text.as_str()).wrap(true));
            }
            Err(err) => {
                ui.colored_label(Color32::LIGHT_RED, err.as_str());
            }
        }
    }

    fn edit_dialog(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let mut open = true;
        egui::Window::new("Edit Caption")
            .open(&mut open)
            .collapsible(false)
            .default_size([500.0, 250.0])
            .show(ctx, |ui| {
                ui.label(session.target().display().to_string());
                ui.add(
                    egui::TextEdit::multiline(session.working_text_mut())
                        .desired_rows(10)
                        .desired_width(f32::INFINITY),
                );
                ui.horizontal(|ui| {
                    if ui.button("Undo Changes").clicked() {
                        actions.push(Action::UndoChanges);
                    }
                    if ui.button("Save").clicked() {
                        actions.push(Action::Save);
                    }
                    if ui.button("Cancel").clicked() {
                        actions.push(Action::Cancel);
                    }
                    if session.is_modified() {
                        ui.label("modified");
                    }
                });
            });
        if !open {
            actions.push(Action::Cancel);
        }
    }
}

impl eframe::App for CaptionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader(ctx);

        let mut actions = vec![];
        if self.session.is_none() {
            ctx.input(|input| {
                if input.key_pressed(Key::ArrowLeft) {
                    actions.push(Action::Previous);
                }
                if input.key_pressed(Key::ArrowRight) {
                    actions.push(Action::Next);
                }
            });
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| self.top_bar(ui, &mut actions));
        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.label(self.status.as_deref().unwrap_or(""));
        });
        egui::SidePanel::right("image_list").show(ctx, |ui| self.image_list(ui, &mut actions));
        egui::CentralPanel::default().show(ctx, |ui| self.current_pair(ui));
        self.edit_dialog(ctx, &mut actions);

        for action in actions {
            self.apply(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _images: TempDir,
        captions: TempDir,
        app: CaptionApp,
    }

    fn fixture(pairs: &[(&str, &str)]) -> Fixture {
        let images = tempdir().unwrap();
        let captions = tempdir().unwrap();
        let mut image_paths = vec![];
        let mut caption_paths = vec![];
        for (stem, text) in pairs {
            let img = images.path().join(format!("{stem}.png"));
            image::RgbaImage::new(2, 2).save(&img).unwrap();
            let cap = captions.path().join(format!("{stem}.txt"));
            fs::write(&cap, text).unwrap();
            image_paths.push(img);
            caption_paths.push(cap);
        }
        let collection = Collection::new(image_paths, caption_paths).unwrap();
        let app = CaptionApp::new(collection, FsCaptionStore, ImageLoader::new(64));
        Fixture {
            _images: images,
            captions,
            app,
        }
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn starts_on_first_pair() {
        let mut f = fixture(&[("a", "cat"), ("b", "dog")]);
        assert_eq!(f.app.caption(), Ok("cat"));
        f.app.loader.wait();
        let load = f.app.take_latest_load().unwrap();
        assert_eq!(load.ticket, 1);
        assert!(load.result.is_ok());
    }

    #[test]
    fn navigation_reloads_caption() {
        let mut f = fixture(&[("a", "cat"), ("b", "dog")]);
        f.app.apply(Action::Next);
        assert_eq!(f.app.caption(), Ok("dog"));
        f.app.apply(Action::Next);
        assert_eq!(f.app.collection().position(), 1);
        f.app.apply(Action::Select(0));
        assert_eq!(f.app.caption(), Ok("cat"));
        f.app.apply(Action::Select(7));
        assert_eq!(f.app.collection().position(), 0);

        f.app.loader.wait();
        let load = f.app.take_latest_load().unwrap();
        assert_eq!(load.ticket, 3);
        assert_eq!(load.path.file_name().unwrap(), "a.png");
    }

    #[test]
    fn navigation_clears_the_previous_image() {
        let mut f = fixture(&[("a", "cat"), ("b", "dog")]);
        f.app.texture_size = [2, 2];
        f.app.image_error = Some("stale".to_owned());
        f.app.apply(Action::Next);
        assert!(f.app.texture.is_none());
        assert_eq!(f.app.texture_size, [0, 0]);
        assert!(f.app.image_error.is_none());

        // staying put keeps whatever is on screen
        f.app.image_error = Some("kept".to_owned());
        f.app.apply(Action::Next);
        assert_eq!(f.app.image_error.as_deref(), Some("kept"));
    }

    #[test]
    fn edit_save_updates_file_and_display() {
        let mut f = fixture(&[("a", "cat"), ("b", "dog")]);
        f.app.apply(Action::EditCaption);
        f.app.session.as_mut().unwrap().edit("kitten");
        f.app.apply(Action::UndoChanges);
        assert_eq!(f.app.session().unwrap().working_text(), "cat");
        f.app.session.as_mut().unwrap().edit("kitten");
        f.app.apply(Action::Save);

        assert!(f.app.session().is_none());
        assert_eq!(f.app.caption(), Ok("kitten"));
        assert_eq!(read(&f.captions.path().join("a.txt")), "kitten");
    }

    #[test]
    fn navigation_is_refused_while_editing() {
        let mut f = fixture(&[("a", "cat"), ("b", "dog")]);
        f.app.apply(Action::EditCaption);
        f.app.apply(Action::Next);
        assert_eq!(f.app.collection().position(), 0);
        assert!(f.app.status().is_some());

        f.app.session.as_mut().unwrap().edit("kitten");
        f.app.apply(Action::Cancel);
        assert!(f.app.session().is_none());
        assert_eq!(read(&f.captions.path().join("a.txt")), "cat");
        f.app.apply(Action::Next);
        assert_eq!(f.app.collection().position(), 1);
    }

    #[test]
    fn failed_save_keeps_the_session() {
        let mut f = fixture(&[("a", "cat")]);
        f.app.apply(Action::EditCaption);
        f.app.session.as_mut().unwrap().edit("kitten");
        let caption_dir: PathBuf = f.captions.path().to_path_buf();
        fs::remove_dir_all(&caption_dir).unwrap();

        f.app.apply(Action::Save);
        let session = f.app.session().unwrap();
        assert_eq!(session.working_text(), "kitten");
        assert!(f.app.status().unwrap().contains("try again"));

        fs::create_dir_all(&caption_dir).unwrap();
        f.app.apply(Action::Save);
        assert!(f.app.session().is_none());
        assert_eq!(read(&caption_dir.join("a.txt")), "kitten");
    }

    #[test]
    fn unreadable_caption_is_shown_not_fatal() {
        let mut f = fixture(&[("a", "cat"), ("b", "dog")]);
        fs::remove_file(f.captions.path().join("b.txt")).unwrap();
        f.app.apply(Action::Next);
        assert!(f.app.caption().is_err());
        f.app.apply(Action::EditCaption);
        assert!(f.app.session().is_none());
        assert!(f.app.status().is_some());
    }
}
