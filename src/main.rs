// main.rs — window, event loop, control panel and scene updates

mod camera;
mod config;
mod error;
mod i18n;
mod mesh;
mod orbit;
mod renderer;
mod scene;
mod texture;
mod uv;

use camera::OrbitCamera;
use config::{AppConfig, SceneConfig};
use error::AppError;
use i18n::{tr, tr_with};
use orbit::{OrbitForm, OrbitalElements, MOON_MU};
use renderer::Renderer;
use scene::build_scene;

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use std::path::PathBuf;
use std::sync::Arc;

/// Something the UI asked for during a frame, applied after it is drawn.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Update,
    OpenMoonTexture(PathBuf),
    ShowStars(bool),
    ShowOrbit(bool),
    ResetView,
    Language(String),
    Exit,
}

struct UiState {
    form: OrbitForm,
    elements: Option<OrbitalElements>,
    vertex_count: usize,
    error: Option<String>,
    lang: String,
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // strings for a startup error dialog, before the configured language is known
    i18n::init(i18n::FALLBACK_LANG);
    let cfg = AppConfig::load().map_err(fatal)?;
    i18n::init(cfg.lang.clone());
    let mut scene_cfg = cfg.scene;

    // Startup failures (missing textures, bad config) are fatal.
    let form = OrbitForm::default();
    let elements = form.parse().map_err(fatal)?;
    let scene = build_scene(&scene_cfg, Some(&elements)).map_err(fatal)?;

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(tr("app.title"))
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)
            .map_err(fatal)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone())).map_err(fatal)?;
    let mut camera = scene.camera;
    let mut ui_state = UiState {
        form,
        elements: Some(elements),
        vertex_count: scene.vertex_count(),
        error: None,
        lang: cfg.lang,
    };
    renderer.replace_scene(scene);

    // 交互状态
    let mut mouse_pressed = false;
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        let mut action: Option<Action> = None;

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => action = Some(Action::Exit),

                    WindowEvent::Resized(new_size) => renderer.resize(new_size),

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size)
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => action = pick_texture().map(Action::OpenMoonTexture),
                                Some(VirtualKeyCode::R) => action = Some(Action::ResetView),
                                Some(VirtualKeyCode::Return) => action = Some(Action::Update),
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            mouse_pressed = state == ElementState::Pressed;
                            if !mouse_pressed {
                                last_mouse_pos = None;
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if mouse_pressed {
                            if let Some(last_pos) = last_mouse_pos {
                                let dx = (position.x - last_pos.x) as f32;
                                let dy = (position.y - last_pos.y) as f32;
                                camera.orbit(dx, dy);
                            }
                            last_mouse_pos = Some(position);
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        camera.zoom(scroll);
                    }

                    WindowEvent::DroppedFile(path) => action = Some(Action::OpenMoonTexture(path)),

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                renderer.update_camera(&camera);

                let render_result = renderer.render_with_ui(&window, |ctx| {
                    action = draw_ui(ctx, &mut ui_state, &scene_cfg, &camera);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory, exiting");
                        *control_flow = ControlFlow::Exit;
                    }
                    Err(e) => log::warn!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }

        let Some(action) = action else {
            return;
        };
        match action {
            Action::Exit => *control_flow = ControlFlow::Exit,
            Action::ResetView => camera.reset(),
            Action::Language(lang) => {
                i18n::init(lang.clone());
                window.set_title(&tr("app.title"));
                ui_state.lang = lang;
            }
            Action::Update => {
                let candidate = scene_cfg.clone();
                apply_update(&mut scene_cfg, candidate, &mut ui_state, &mut renderer, &mut camera);
            }
            Action::OpenMoonTexture(path) => {
                let candidate = SceneConfig {
                    moon_texture: path,
                    ..scene_cfg.clone()
                };
                apply_update(&mut scene_cfg, candidate, &mut ui_state, &mut renderer, &mut camera);
            }
            Action::ShowStars(show_stars) => {
                let candidate = SceneConfig {
                    show_stars,
                    ..scene_cfg.clone()
                };
                apply_update(&mut scene_cfg, candidate, &mut ui_state, &mut renderer, &mut camera);
            }
            Action::ShowOrbit(show_orbit) => {
                let candidate = SceneConfig {
                    show_orbit,
                    ..scene_cfg.clone()
                };
                apply_update(&mut scene_cfg, candidate, &mut ui_state, &mut renderer, &mut camera);
            }
        }
    })
}

/// Parse the form and rebuild the whole scene from `candidate`. On success
/// the candidate becomes the active configuration; on failure nothing on
/// screen changes and the error is shown in the panel.
fn apply_update(
    active: &mut SceneConfig,
    candidate: SceneConfig,
    ui_state: &mut UiState,
    renderer: &mut Renderer,
    camera: &mut OrbitCamera,
) {
    let result = ui_state
        .form
        .parse()
        .map_err(AppError::from)
        .and_then(|el| build_scene(&candidate, Some(&el)).map(|scene| (el, scene)));

    match result {
        Ok((elements, scene)) => {
            // keep the user's view, only rescale to the new scene
            camera.body_radius = scene.camera.body_radius;
            camera.far_radius = scene.camera.far_radius;

            ui_state.elements = Some(elements);
            ui_state.vertex_count = scene.vertex_count();
            ui_state.error = None;
            renderer.replace_scene(scene);
            *active = candidate;
            log::info!("{}", tr("status.updated"));
        }
        Err(e) => {
            log::error!("scene update failed: {}", e);
            ui_state.error = Some(tr_with("error.update_failed", &[("err", e.to_string())]));
        }
    }
}

/// Log a startup failure and show it in a message box, so it is seen even
/// without a console.
fn fatal(err: impl Into<AppError>) -> AppError {
    let err = err.into();
    log::error!("startup failed: {}", err);
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(&tr("app.title"))
        .set_description(&startup_message(&err))
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
    err
}

fn startup_message(err: &AppError) -> String {
    tr_with("error.startup", &[("err", err.to_string())])
}

fn pick_texture() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&tr("file.filter.images"), &["jpg", "jpeg", "png", "bmp", "tif", "tiff"])
        .pick_file()
}

fn orbit_summary(el: &OrbitalElements, body_radius: f64) -> String {
    tr_with(
        "status.orbit",
        &[
            ("peri", format!("{:.1}", (el.periapsis_m() - body_radius) / 1000.0)),
            ("apo", format!("{:.1}", (el.apoapsis_m() - body_radius) / 1000.0)),
            ("period", format!("{:.1}", el.period_s(MOON_MU) / 60.0)),
        ],
    )
}

fn draw_ui(
    ctx: &egui::Context,
    ui_state: &mut UiState,
    scene_cfg: &SceneConfig,
    camera: &OrbitCamera,
) -> Option<Action> {
    let mut action = None;

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(tr("menu.file"), |ui| {
                if ui.button(tr("menu.open_moon_texture")).clicked() {
                    ui.close_menu();
                    action = pick_texture().map(Action::OpenMoonTexture);
                }
                if ui.button(tr("menu.exit")).clicked() {
                    action = Some(Action::Exit);
                }
            });

            ui.menu_button(tr("menu.view"), |ui| {
                if ui.button(tr("view.reset")).clicked() {
                    action = Some(Action::ResetView);
                    ui.close_menu();
                }
                ui.separator();

                let mut stars = scene_cfg.show_stars;
                if ui.checkbox(&mut stars, tr("view.show_stars")).changed() {
                    action = Some(Action::ShowStars(stars));
                    ui.close_menu();
                }
                let mut orbit = scene_cfg.show_orbit;
                if ui.checkbox(&mut orbit, tr("view.show_orbit")).changed() {
                    action = Some(Action::ShowOrbit(orbit));
                    ui.close_menu();
                }
            });

            ui.menu_button(tr("menu.language"), |ui| {
                for (code, name) in i18n::LANGUAGES {
                    if ui.radio(ui_state.lang == code, name).clicked() {
                        action = Some(Action::Language(code.to_string()));
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(tr_with(
                "status.radius",
                &[("radius", format!("{:.1}", scene_cfg.moon_radius / 1000.0))],
            ));
            ui.label("|");
            ui.label(tr_with("status.vertices", &[("count", ui_state.vertex_count.to_string())]));
            ui.label("|");
            ui.label(tr_with("status.distance", &[("distance", format!("{:.2}", camera.distance))]));
            if let Some(el) = &ui_state.elements {
                ui.label("|");
                ui.label(orbit_summary(el, scene_cfg.moon_radius as f64));
            }
        });
    });

    egui::SidePanel::left("orbit_panel").resizable(false).show(ctx, |ui| {
        ui.heading(tr("panel.orbit.title"));
        ui.add_space(6.0);

        egui::Grid::new("orbit_form").num_columns(2).show(ui, |ui| {
            ui.label(tr("panel.orbit.semi_major_axis"));
            ui.text_edit_singleline(&mut ui_state.form.semi_major_axis);
            ui.end_row();

            ui.label(tr("panel.orbit.eccentricity"));
            ui.text_edit_singleline(&mut ui_state.form.eccentricity);
            ui.end_row();

            ui.label(tr("panel.orbit.inclination"));
            ui.text_edit_singleline(&mut ui_state.form.inclination);
            ui.end_row();
        });

        ui.add_space(6.0);
        if ui.button(tr("panel.orbit.update")).clicked() {
            action = Some(Action::Update);
        }

        ui.add_space(6.0);
        ui.label(scene_cfg.moon_texture.display().to_string());

        if let Some(err) = &ui_state.error {
            ui.separator();
            ui.colored_label(egui::Color32::RED, err);
        }
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_summary_reports_altitudes_in_km() {
        let el = OrbitalElements {
            semi_major_axis_m: 2_000_000.0,
            eccentricity: 0.0,
            inclination_deg: 30.0,
        };
        i18n::init("en");
        let text = orbit_summary(&el, 1_737_400.0);
        assert!(text.contains("262.6"), "{}", text);
        assert!(!text.contains("{peri}"), "{}", text);
        assert!(!text.contains('\n'), "status bar text is one line: {}", text);
    }

    #[test]
    fn startup_message_carries_the_error() {
        i18n::init("en");
        let err = AppError::from(error::TextureError::Open {
            path: PathBuf::from("8k_moon.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        });
        let text = startup_message(&err);
        assert!(text.contains("8k_moon.jpg"), "{}", text);
        assert!(!text.contains("{err}"), "{}", text);
    }
}
