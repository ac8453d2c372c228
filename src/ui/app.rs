// Region selection window

use std::time::Duration;

use eframe::egui;
use tracing::{error, info, warn};

use crate::error::RegionFxError;
use crate::region::Point;
use crate::save::{SaveReport, SaveRunner};
use crate::session::Session;
use crate::transform::TransformMode;

const COLOR_SELECTION: egui::Color32 = egui::Color32::GREEN;
const COLOR_ERROR: egui::Color32 = egui::Color32::from_rgb(230, 80, 80);
const COLOR_STATUS: egui::Color32 = egui::Color32::from_rgb(160, 160, 160);

pub struct RegionFxApp {
    session: Session,
    runner: SaveRunner,
    mode: TransformMode,
    texture: Option<egui::TextureHandle>,
    status: String,
    status_is_error: bool,
}

impl RegionFxApp {
    pub fn new(session: Session, runner: SaveRunner, mode: TransformMode) -> Self {
        Self {
            session,
            runner,
            mode,
            texture: None,
            status: "Drag over the frame to select a region.".to_string(),
            status_is_error: false,
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.status_is_error = false;
    }

    fn set_error(&mut self, err: &RegionFxError) {
        if err.is_recoverable() {
            warn!("{}", err);
        } else {
            error!("{}", err);
        }
        self.status = err.user_message();
        self.status_is_error = true;
    }

    /// Upload the preview frame; called again whenever a new frame is loaded
    fn preview_texture(&mut self, ctx: &egui::Context) -> egui::TextureHandle {
        if let Some(texture) = &self.texture {
            return texture.clone();
        }
        let frame = self.session.preview();
        let size = [frame.width() as usize, frame.height() as usize];
        let image = egui::ColorImage::from_rgb(size, frame.as_rgb_bytes());
        let texture = ctx.load_texture("preview", image, egui::TextureOptions::NEAREST);
        self.texture = Some(texture.clone());
        texture
    }

    fn start_save(&mut self) {
        let request = match self.session.build_request(self.mode) {
            Ok(request) => request,
            Err(e) => return self.set_error(&e),
        };

        let output = request.output().display().to_string();
        match self.runner.start(request) {
            Ok(()) => self.set_status(format!("Saving {} to {}...", self.mode, output)),
            Err(e) => self.set_error(&e),
        }
    }

    fn load_frame(&mut self) {
        match self.session.load_preview_from_input() {
            Ok(()) => {
                self.texture = None;
                self.set_status(format!("Showing frame at {:.3}s.", self.session.preview_seconds()));
            }
            Err(e) => self.set_error(&e),
        }
    }

    fn poll_save(&mut self) {
        match self.runner.poll() {
            Some(Ok(report)) => self.set_status(describe_report(&report)),
            Some(Err(e)) => self.set_error(&e),
            None => {}
        }
    }

    fn controls_ui(&mut self, ui: &mut egui::Ui) {
        let busy = self.runner.is_busy();

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!busy, |ui| {
                egui::ComboBox::from_label("Mode")
                    .selected_text(self.mode.label())
                    .show_ui(ui, |ui| {
                        for mode in TransformMode::ALL {
                            ui.selectable_value(&mut self.mode, mode, mode.label());
                        }
                    });

                ui.separator();
                ui.label("Start (s):");
                ui.add(egui::TextEdit::singleline(&mut self.session.start_input).desired_width(70.0));
                if ui.button("Load frame").clicked() {
                    self.load_frame();
                }

                ui.separator();
                ui.label("Duration (s):");
                ui.add(egui::TextEdit::singleline(&mut self.session.duration_input).desired_width(70.0));
                if ui.button("Save").clicked() {
                    self.start_save();
                }
            });

            if ui.add_enabled(busy, egui::Button::new("Cancel")).clicked() {
                self.runner.cancel();
            }
        });

        if let Some(progress) = self.runner.progress() {
            ui.add(
                egui::ProgressBar::new(progress.fraction())
                    .text(format!("{} / {} frames", progress.frames_written, progress.frames_requested)),
            );
        }

        let color = if self.status_is_error { COLOR_ERROR } else { COLOR_STATUS };
        ui.label(egui::RichText::new(&self.status).color(color));
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui) {
        let texture = self.preview_texture(ui.ctx());
        let (frame_w, frame_h) = self.session.preview().dimensions();
        let stroke = egui::Stroke::new(self.session.config().ui.selection_stroke, COLOR_SELECTION);

        egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
            // One frame pixel per point; the image rect moves with the scroll offset
            let size = egui::vec2(frame_w as f32, frame_h as f32);
            let (rect, response) = ui.allocate_exact_size(size, egui::Sense::drag());
            let to_frame = |pos: egui::Pos2| Point::new(pos.x - rect.min.x, pos.y - rect.min.y);

            if response.drag_started() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.session.press(to_frame(pos));
                }
            } else if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.session.drag(to_frame(pos));
                }
            }
            if response.drag_stopped() {
                let pos = response
                    .interact_pointer_pos()
                    .or_else(|| ui.ctx().input(|i| i.pointer.latest_pos()));
                self.session.release(pos.map(to_frame));
                if let Ok(region) = self.session.region() {
                    info!("Selected region {}", region);
                }
            }

            let painter = ui.painter_at(rect);
            painter.image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            if let Some((a, b)) = self.session.selector().overlay() {
                let outline = egui::Rect::from_two_pos(
                    rect.min + egui::vec2(a.x, a.y),
                    rect.min + egui::vec2(b.x, b.y),
                );
                painter.rect_stroke(outline, 0.0, stroke);
            }
        });
    }
}

impl eframe::App for RegionFxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_save();

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.controls_ui(ui);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas_ui(ui);
        });

        if self.runner.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl Drop for RegionFxApp {
    fn drop(&mut self) {
        if self.runner.is_busy() {
            info!("Window closed with a save in progress, cancelling");
            self.runner.cancel();
        }
    }
}

fn describe_report(report: &SaveReport) -> String {
    let mut text = format!(
        "Output saved to {} ({}x{}, {} frames).",
        report.output.display(), report.width, report.height, report.frames_written
    );
    if report.truncated {
        text.push_str(&format!(
            " The source ended early: {} of {} requested frames.",
            report.frames_written, report.frames_requested
        ));
    }
    text
}
