//! FTB App Support Tool
//!
//! Two actions: generate a debug report for the support team, or apply the
//! common fixes to a broken install. The actual work happens in the native
//! support agent; this is only the panel in front of it.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // Hide console on Windows

mod bridge;
mod panel;
mod theme;

use std::sync::Arc;
use std::time::Instant;

use arboard::Clipboard;
use eframe::egui;

use bridge::{RpcBridge, AGENT_ENDPOINT};
use panel::{OperationKind, OperationState, SupportPanel};
use theme::{apply_theme, Theme, ThemeMode};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Guide for repairing instances the fixes routine may break.
const REPAIR_GUIDE_URL: &str = "https://docs.feed-the-beast.com/docs/app/Instances/repair";

/// Detect system theme (Windows)
#[cfg(target_os = "windows")]
fn detect_system_theme() -> ThemeMode {
    use std::process::Command;

    // Query registry for AppsUseLightTheme
    // 0 = Dark, 1 = Light
    let output = Command::new("reg")
        .args([
            "query",
            r"HKCU\Software\Microsoft\Windows\CurrentVersion\Themes\Personalize",
            "/v",
            "AppsUseLightTheme",
        ])
        .output();

    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains("0x0") {
            return ThemeMode::Dark;
        } else if stdout.contains("0x1") {
            return ThemeMode::Light;
        }
    }

    ThemeMode::Dark
}

#[cfg(not(target_os = "windows"))]
fn detect_system_theme() -> ThemeMode {
    ThemeMode::Dark
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([680.0, 420.0])
            .with_min_inner_size([560.0, 380.0]),
        ..Default::default()
    };

    eframe::run_native(
        "FTB App Support",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}

struct App {
    theme_mode: ThemeMode,
    theme: Theme,
    panel: SupportPanel,
    copied_feedback: Option<Instant>,
}

impl App {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let theme_mode = detect_system_theme();
        let theme = Theme::from_mode(theme_mode);

        Self {
            theme_mode,
            theme,
            panel: SupportPanel::new(Arc::new(RpcBridge::new(AGENT_ENDPOINT))),
            copied_feedback: None,
        }
    }

    fn toggle_theme(&mut self) {
        self.theme_mode = match self.theme_mode {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        };
        self.theme = Theme::from_mode(self.theme_mode);
    }

    fn status_line(&self) -> &'static str {
        if self.copied_feedback.is_some() {
            return "STATUS: CODE COPIED";
        }
        match self.panel.state() {
            OperationState::Running(OperationKind::Diagnostics) => {
                "STATUS: GENERATING DEBUG REPORT..."
            }
            OperationState::Running(OperationKind::Fixes) => "STATUS: APPLYING COMMON FIXES...",
            OperationState::Idle => {
                if self.panel.error().is_some() {
                    "STATUS: LAST OPERATION FAILED"
                } else {
                    "STATUS: READY"
                }
            }
        }
    }

    fn copy_debug_code(&mut self) {
        if let Some(code) = self.panel.debug_code() {
            if let Ok(mut clipboard) = Clipboard::new() {
                if clipboard.set_text(code).is_ok() {
                    self.copied_feedback = Some(Instant::now());
                }
            }
        }
    }

    fn mono_button(
        &self,
        label: &str,
        fill: egui::Color32,
        text: egui::Color32,
        min_size: egui::Vec2,
    ) -> egui::Button<'static> {
        egui::Button::new(
            egui::RichText::new(label.to_owned())
                .size(10.0)
                .strong()
                .family(egui::FontFamily::Monospace)
                .color(text),
        )
        .fill(fill)
        .stroke(egui::Stroke::new(1.0, self.theme.border))
        .rounding(0.0)
        .min_size(min_size)
    }

    /// Render one action card. Returns true when its RUN button was clicked.
    fn render_action_card(
        &self,
        ui: &mut egui::Ui,
        title: &str,
        description: &str,
        enabled: bool,
        destructive: bool,
    ) -> bool {
        let mut clicked = false;

        egui::Frame::none()
            .fill(self.theme.panel)
            .inner_margin(egui::Margin::symmetric(15.0, 12.0))
            .show(ui, |ui| {
                ui.set_width(270.0);
                ui.set_min_height(110.0);

                ui.horizontal(|ui| {
                    let accent = if destructive {
                        self.theme.danger
                    } else {
                        self.theme.accent
                    };
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(3.0, 14.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 0.0, accent);
                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new(title)
                            .size(12.0)
                            .strong()
                            .color(self.theme.text),
                    );
                });

                ui.add_space(6.0);
                ui.add(
                    egui::Label::new(
                        egui::RichText::new(description)
                            .size(9.0)
                            .family(egui::FontFamily::Monospace)
                            .color(self.theme.text_dim),
                    )
                    .wrap(),
                );

                ui.add_space(10.0);
                ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                    let fill = if destructive {
                        self.theme.danger
                    } else {
                        self.theme.accent
                    };
                    let button = egui::Button::new(
                        egui::RichText::new("RUN")
                            .size(11.0)
                            .strong()
                            .family(egui::FontFamily::Monospace)
                            .color(egui::Color32::WHITE),
                    )
                    .fill(fill)
                    .stroke(egui::Stroke::NONE)
                    .rounding(0.0)
                    .min_size(egui::vec2(90.0, 28.0));

                    if ui.add_enabled(enabled, button).clicked() {
                        clicked = true;
                    }
                });
            });

        clicked
    }
}

/// Dim the whole screen under a dialog. Returns true when the overlay
/// itself was clicked.
fn dim_overlay(ctx: &egui::Context, id: &str, fill: egui::Color32) -> bool {
    let screen_rect = ctx.screen_rect();
    let response = egui::Area::new(egui::Id::new(id))
        .fixed_pos(screen_rect.min)
        .order(egui::Order::Middle)
        .show(ctx, |ui| {
            ui.painter().rect_filled(screen_rect, 0.0, fill);
            ui.allocate_response(screen_rect.size(), egui::Sense::click())
        });
    response.inner.clicked()
}

fn dialog_frame(theme: &Theme) -> egui::Frame {
    egui::Frame::none()
        .fill(theme.panel)
        .stroke(egui::Stroke::new(1.0, theme.border))
        .rounding(0.0)
        .shadow(egui::Shadow::NONE)
        .inner_margin(18.0)
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Completions from the worker thread land before anything reads state.
        self.panel.poll();

        apply_theme(ctx, &self.theme);

        if let Some(instant) = self.copied_feedback {
            if instant.elapsed().as_secs() >= 2 {
                self.copied_feedback = None;
            }
        }

        // Header
        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.header))
            .show(ctx, |ui| {
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    ui.add_space(20.0);

                    let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 0.0, self.theme.accent);

                    ui.add_space(10.0);
                    ui.label(
                        egui::RichText::new("FTB APP SUPPORT")
                            .size(14.0)
                            .strong()
                            .color(self.theme.text),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_space(20.0);

                        let btn_text = match self.theme_mode {
                            ThemeMode::Light => "DARK",
                            ThemeMode::Dark => "LIGHT",
                        };
                        let toggle = self.mono_button(
                            btn_text,
                            self.theme.panel,
                            self.theme.text_dim,
                            egui::vec2(50.0, 24.0),
                        );
                        if ui.add(toggle).clicked() {
                            self.toggle_theme();
                        }
                    });
                });
                ui.add_space(12.0);
            });

        // Footer
        egui::TopBottomPanel::bottom("footer")
            .frame(egui::Frame::none().fill(self.theme.window))
            .show(ctx, |ui| {
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    ui.add_space(25.0);
                    ui.label(
                        egui::RichText::new(self.status_line())
                            .size(9.0)
                            .family(egui::FontFamily::Monospace)
                            .color(self.theme.text_dim),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_space(25.0);
                        ui.label(
                            egui::RichText::new(format!("v{}", VERSION))
                                .size(9.0)
                                .family(egui::FontFamily::Monospace)
                                .color(self.theme.text_dim),
                        );

                        if let Some(time) = self.panel.last_completed() {
                            ui.add_space(15.0);
                            ui.label(
                                egui::RichText::new(format!("LAST: {}", time.format("%H:%M:%S")))
                                    .size(9.0)
                                    .family(egui::FontFamily::Monospace)
                                    .color(self.theme.text_dim),
                            );
                        }
                    });
                });
                ui.add_space(10.0);
            });

        // Main content
        let mut run_diagnostics = false;
        let mut request_fixes = false;

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.window).inner_margin(25.0))
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new("// SUPPORT ACTIONS")
                        .size(10.0)
                        .family(egui::FontFamily::Monospace)
                        .color(self.theme.text_dim),
                );
                ui.add_space(15.0);

                let idle = !self.panel.is_busy();

                ui.horizontal(|ui| {
                    if self.render_action_card(
                        ui,
                        "Diagnostics",
                        "Run a diagnostics check and generate a debug code",
                        idle,
                        false,
                    ) {
                        run_diagnostics = true;
                    }

                    ui.add_space(10.0);

                    if self.render_action_card(
                        ui,
                        "Fix Common Issues",
                        "Fixes common issues with the app",
                        idle,
                        true,
                    ) {
                        request_fixes = true;
                    }
                });

                // Error alert
                if let Some(error) = self.panel.error() {
                    ui.add_space(15.0);
                    egui::Frame::none()
                        .fill(self.theme.panel)
                        .stroke(egui::Stroke::new(1.0, self.theme.danger))
                        .rounding(0.0)
                        .inner_margin(egui::Margin::symmetric(15.0, 10.0))
                        .show(ui, |ui| {
                            ui.label(
                                egui::RichText::new("ERROR")
                                    .size(10.0)
                                    .strong()
                                    .family(egui::FontFamily::Monospace)
                                    .color(self.theme.danger),
                            );
                            ui.add_space(3.0);
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(error)
                                        .size(9.0)
                                        .family(egui::FontFamily::Monospace)
                                        .color(self.theme.text),
                                )
                                .wrap(),
                            );
                        });
                }
            });

        if run_diagnostics {
            let repaint_ctx = ctx.clone();
            self.panel.start_diagnostics(move || repaint_ctx.request_repaint());
        }
        if request_fixes {
            self.panel.request_fixes();
        }

        // Confirmation prompt for the destructive fixes routine. Only the
        // explicit buttons close it.
        if self.panel.confirm_open() {
            dim_overlay(ctx, "confirm_overlay", self.theme.overlay);

            let mut confirmed = false;
            let mut cancelled = false;

            egui::Area::new(egui::Id::new("confirm_dialog"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    dialog_frame(&self.theme).show(ui, |ui| {
                        ui.set_max_width(360.0);

                        ui.label(
                            egui::RichText::new("ARE YOU ABSOLUTELY SURE?")
                                .size(12.0)
                                .strong()
                                .color(self.theme.text),
                        );
                        ui.add_space(8.0);
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new(
                                    "This action may break any existing instances you have \
                                     installed via the app. If this happens you will need to \
                                     repair those instances by following the guide below.",
                                )
                                .size(9.0)
                                .family(egui::FontFamily::Monospace)
                                .color(self.theme.text_dim),
                            )
                            .wrap(),
                        );
                        ui.add_space(8.0);
                        if ui.link(REPAIR_GUIDE_URL).clicked() {
                            if let Err(err) = open::that(REPAIR_GUIDE_URL) {
                                tracing::warn!(error = %err, "failed to open repair guide");
                            }
                        }

                        ui.add_space(14.0);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let go = egui::Button::new(
                                egui::RichText::new("CONTINUE")
                                    .size(10.0)
                                    .strong()
                                    .family(egui::FontFamily::Monospace)
                                    .color(egui::Color32::WHITE),
                            )
                            .fill(self.theme.danger)
                            .stroke(egui::Stroke::NONE)
                            .rounding(0.0)
                            .min_size(egui::vec2(90.0, 26.0));
                            if ui.add(go).clicked() {
                                confirmed = true;
                            }

                            ui.add_space(8.0);

                            let cancel = self.mono_button(
                                "CANCEL",
                                self.theme.panel,
                                self.theme.text,
                                egui::vec2(80.0, 26.0),
                            );
                            if ui.add(cancel).clicked() {
                                cancelled = true;
                            }
                        });
                    });
                });

            if cancelled {
                self.panel.cancel_fixes();
            }
            if confirmed {
                let repaint_ctx = ctx.clone();
                self.panel.confirm_fixes(move || repaint_ctx.request_repaint());
            }
        }

        // Result dialog with the generated debug code.
        if self.panel.result_open() {
            let mut close = dim_overlay(ctx, "result_overlay", self.theme.overlay);
            let code = self.panel.debug_code().unwrap_or_default().to_owned();
            let mut copy = false;

            egui::Area::new(egui::Id::new("result_dialog"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    dialog_frame(&self.theme).show(ui, |ui| {
                        ui.set_max_width(360.0);

                        ui.label(
                            egui::RichText::new("SHARE THIS CODE")
                                .size(12.0)
                                .strong()
                                .color(self.theme.text),
                        );
                        ui.add_space(6.0);
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new(
                                    "Please share this code with the support team to help \
                                     diagnose your issue.",
                                )
                                .size(9.0)
                                .family(egui::FontFamily::Monospace)
                                .color(self.theme.text_dim),
                            )
                            .wrap(),
                        );

                        ui.add_space(12.0);
                        ui.horizontal(|ui| {
                            egui::Frame::none()
                                .fill(self.theme.window)
                                .stroke(egui::Stroke::new(1.0, self.theme.border))
                                .rounding(0.0)
                                .inner_margin(egui::Margin::symmetric(10.0, 6.0))
                                .show(ui, |ui| {
                                    ui.set_min_width(230.0);
                                    ui.label(
                                        egui::RichText::new(&code)
                                            .size(11.0)
                                            .family(egui::FontFamily::Monospace)
                                            .color(self.theme.text),
                                    );
                                });

                            ui.add_space(6.0);
                            let copy_text = if self.copied_feedback.is_some() {
                                "COPIED!"
                            } else {
                                "COPY"
                            };
                            let copy_btn = self.mono_button(
                                copy_text,
                                self.theme.panel,
                                self.theme.text,
                                egui::vec2(70.0, 28.0),
                            );
                            if ui.add(copy_btn).clicked() {
                                copy = true;
                            }
                        });

                        ui.add_space(14.0);
                        let close_btn = self.mono_button(
                            "CLOSE",
                            self.theme.panel,
                            self.theme.text,
                            egui::vec2(80.0, 26.0),
                        );
                        if ui.add(close_btn).clicked() {
                            close = true;
                        }
                    });
                });

            if copy {
                self.copy_debug_code();
            }
            if close {
                self.panel.dismiss_result();
            }
        }

        // Modal wait dialog with no dismiss affordance; it closes when the
        // in-flight call settles, and not before.
        if let OperationState::Running(kind) = self.panel.state() {
            dim_overlay(ctx, "wait_overlay", self.theme.overlay);

            egui::Area::new(egui::Id::new("wait_dialog"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    dialog_frame(&self.theme).show(ui, |ui| {
                        ui.set_min_width(260.0);

                        ui.label(
                            egui::RichText::new("PLEASE WAIT...")
                                .size(12.0)
                                .strong()
                                .color(self.theme.text),
                        );
                        ui.add_space(6.0);
                        let message = match kind {
                            OperationKind::Diagnostics => {
                                "Please wait while the debug tool runs its checks."
                            }
                            OperationKind::Fixes => {
                                "Please wait while common fixes are applied."
                            }
                        };
                        ui.label(
                            egui::RichText::new(message)
                                .size(9.0)
                                .family(egui::FontFamily::Monospace)
                                .color(self.theme.text_dim),
                        );

                        ui.add_space(12.0);
                        ui.vertical_centered(|ui| {
                            ui.add(egui::Spinner::new().size(24.0).color(self.theme.accent));
                        });
                        ui.add_space(4.0);
                    });
                });
        }
    }
}
