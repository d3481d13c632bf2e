//! Octodrift -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. All
//! simulation runs inside `RedrawRequested` using a **fixed-timestep** model
//! (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while should_step()` -- consume fixed 1/60 s slices, each one tick
//!      of `GameSession::step`
//!   3. Rebuild the sprite mesh (backdrop copies, level entities, character)
//!   4. Upload camera uniform, issue batched draw calls, present
//!
//! The window is created at the backdrop image's size, so asset loading
//! happens in `main` before the event loop starts; any asset failure is
//! fatal there.

mod assets;
mod character;
mod level;
mod levels;
mod rect;
#[cfg(test)]
mod replay;
mod session;

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::{load_assets, AssetStore};
use character::CharacterSprites;
use levels::builtin_levels;
use octo_core::input::{InputState, Key};
use octo_core::time::TimeState;
use octo_platform::window::PlatformConfig;
use octo_render::{GpuContext, ScreenCamera, SpritePipeline, SpriteVertex, Texture};
use session::{GameSession, TickInput};

const MANIFEST_PATH: &str = "assets/manifest.json";
const WINDOW_TITLE: &str = "Octodrift";
/// Texture key for the shared 1x1 white texture that entity quads tint.
const ENTITY_ASSET: &str = "__entity_white";

/// A contiguous run of indices that share the same texture binding.
/// Draw calls are merged when consecutive quads use the same texture,
/// minimizing bind-group switches during the render pass.
#[derive(Debug, Clone)]
struct DrawCall {
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
}

/// A screen-space quad: top-left corner, extent, tint. Every quad samples
/// its full texture.
struct QuadSpec<'a> {
    texture_key: &'a str,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    color: [f32; 4],
}

/// All mutable engine state. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface exist.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: ScreenCamera,
    sprite_pipeline: SpritePipeline,
    assets: AssetStore,
    session: GameSession,
    textures: HashMap<Arc<str>, wgpu::BindGroup>,

    // Per-frame GPU mesh state: the quad mesh is rebuilt on the CPU after
    // each simulated frame, then streamed into these buffers. Buffers grow
    // (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
}

impl EngineState {
    fn new(window: Arc<Window>, assets: AssetStore) -> Self {
        let gpu = GpuContext::new(window.clone());
        let time = TimeState::new();
        let input = InputState::new();
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);

        // The simulation runs in backdrop-pixel coordinates regardless of
        // what physical surface size the window ends up with, so the camera
        // maps that logical space, not gpu.size.
        let screen = assets.background_size();
        let camera = ScreenCamera::new(screen.0, screen.1);

        let sprites = CharacterSprites::from_assets(&assets).unwrap_or_else(|err| {
            panic!("Character sprite setup failed: {err}");
        });
        let character = character::Character::new(&sprites, screen).unwrap_or_else(|err| {
            panic!("Character setup failed: {err}");
        });
        let session =
            GameSession::new(character, &builtin_levels(), screen).unwrap_or_else(|err| {
                panic!("Session setup failed: {err}");
            });
        log::info!(
            "Session ready: level '{}', {} platforms, {} collectibles",
            session.current_level().level_id,
            session.current_level().platforms().len(),
            session.current_level().collectibles().len()
        );

        let mut textures = HashMap::new();
        for image in assets.images() {
            let texture = Texture::from_rgba8(
                &gpu.device,
                &gpu.queue,
                &image.rgba,
                image.width,
                image.height,
                &image.key,
            );
            let bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &texture);
            textures.insert(image.key.clone(), bind_group);
        }
        let white = Texture::from_rgba8(
            &gpu.device,
            &gpu.queue,
            &[255, 255, 255, 255],
            1,
            1,
            "entity_white",
        );
        let bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &white);
        textures.insert(Arc::from(ENTITY_ASSET), bind_group);

        let camera_uniform = camera.build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time,
            input,
            camera,
            sprite_pipeline,
            assets,
            session,
            textures,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
        };

        state.ensure_mesh_capacity(4, 6);
        state.rebuild_scene_mesh();
        state
    }

    fn rebuild_scene_mesh(&mut self) {
        let (vertices, indices, draw_calls) = self.build_mesh();
        self.ensure_mesh_capacity(vertices.len(), indices.len());
        self.draw_calls = draw_calls;

        if !vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        if !indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&indices));
        }
    }

    fn build_mesh(&self) -> (Vec<SpriteVertex>, Vec<u32>, Vec<DrawCall>) {
        let level = self.session.current_level();
        let quad_estimate =
            2 + level.platforms().len() + level.collectibles().len() + 1;
        let mut vertices = Vec::with_capacity(quad_estimate * 4);
        let mut indices = Vec::with_capacity(quad_estimate * 6);
        let mut draw_calls = Vec::with_capacity(8);

        // Two backdrop copies, one image-width apart, scrolling together.
        let (bg_w, bg_h) = self.assets.background_size();
        for bg_x in [self.session.bg_x, self.session.bg_x2] {
            add_quad(
                &mut vertices,
                &mut indices,
                &mut draw_calls,
                QuadSpec {
                    texture_key: &self.assets.background,
                    x: bg_x as f32,
                    y: 0.0,
                    width: bg_w as f32,
                    height: bg_h as f32,
                    color: [1.0, 1.0, 1.0, 1.0],
                },
            );
        }

        // Level entities: platforms first, then collectibles, as tinted
        // quads over the shared white texture.
        for platform in level.platforms() {
            add_quad(
                &mut vertices,
                &mut indices,
                &mut draw_calls,
                QuadSpec {
                    texture_key: ENTITY_ASSET,
                    x: platform.rect.x as f32,
                    y: platform.rect.y as f32,
                    width: platform.rect.w as f32,
                    height: platform.rect.h as f32,
                    color: platform.color,
                },
            );
        }
        for collectible in level.collectibles() {
            let mut color = collectible.color;
            color[3] *= collectible.pulse_alpha();
            add_quad(
                &mut vertices,
                &mut indices,
                &mut draw_calls,
                QuadSpec {
                    texture_key: ENTITY_ASSET,
                    x: collectible.rect.x as f32,
                    y: collectible.rect.y as f32,
                    width: collectible.rect.w as f32,
                    height: collectible.rect.h as f32,
                    color,
                },
            );
        }

        // The character draws last, over everything.
        let octo = &self.session.character;
        add_quad(
            &mut vertices,
            &mut indices,
            &mut draw_calls,
            QuadSpec {
                texture_key: &octo.current_frame,
                x: octo.x as f32,
                y: octo.y as f32,
                width: octo.rect.w as f32,
                height: octo.rect.h as f32,
                color: [1.0, 1.0, 1.0, 1.0],
            },
        );

        (vertices, indices, draw_calls)
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }
}

struct App {
    config: PlatformConfig,
    assets: Option<AssetStore>,
    state: Option<EngineState>,
}

impl App {
    fn new(config: PlatformConfig, assets: AssetStore) -> Self {
        Self {
            config,
            assets: Some(assets),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = octo_platform::window::create_window(event_loop, &self.config);
        let assets = self
            .assets
            .take()
            .expect("assets are consumed exactly once");
        self.state = Some(EngineState::new(window, assets));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    // The camera keeps mapping backdrop pixels; only the
                    // surface reconfigures.
                    state.gpu.resize(w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                // Fixed-step simulation phase.
                state.time.begin_frame();
                while state.time.should_step() {
                    if state.input.is_held(Key::Escape) {
                        log::info!("Escape pressed, exiting.");
                        event_loop.exit();
                        return;
                    }

                    let tick = TickInput {
                        left: state.input.is_held(Key::Left),
                        right: state.input.is_held(Key::Right),
                        up: state.input.is_held(Key::Up),
                    };
                    state.session.step(tick);
                }

                if state.time.steps_this_frame > 0 {
                    state.rebuild_scene_mesh();
                }

                // Render phase reads finalized simulation state.
                let camera_uniform = state.camera.build_uniform();
                state.gpu.queue.write_buffer(
                    &state.camera_buffer,
                    0,
                    bytemuck::cast_slice(&[camera_uniform]),
                );

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let mut last_bound_texture_key: Option<&Arc<str>> = None;
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                // Deep-sea blue behind the backdrop seam.
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: 0.02,
                                    g: 0.10,
                                    b: 0.22,
                                    a: 1.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    render_pass.set_pipeline(&state.sprite_pipeline.render_pipeline);
                    render_pass.set_bind_group(0, &state.camera_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(state.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                    for draw in &state.draw_calls {
                        if let Some(bind_group) = state.textures.get(&draw.texture_key) {
                            let need_rebind = match last_bound_texture_key {
                                Some(last) => **last != *draw.texture_key,
                                None => true,
                            };
                            if need_rebind {
                                render_pass.set_bind_group(1, bind_group, &[]);
                                last_bound_texture_key = Some(&draw.texture_key);
                            }
                            render_pass.draw_indexed(
                                draw.index_start..(draw.index_start + draw.index_count),
                                0,
                                0..1,
                            );
                        }
                    }
                }

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                // Only clear edge-triggered input after at least one fixed
                // step consumed it; a press landing on a zero-step frame
                // would otherwise be silently lost.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn add_quad(
    vertices: &mut Vec<SpriteVertex>,
    indices: &mut Vec<u32>,
    draw_calls: &mut Vec<DrawCall>,
    spec: QuadSpec<'_>,
) {
    let base_index = vertices.len() as u32;
    let (x0, y0) = (spec.x, spec.y);
    let (x1, y1) = (spec.x + spec.width, spec.y + spec.height);

    vertices.push(SpriteVertex {
        position: [x0, y0],
        tex_coords: [0.0, 0.0],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [x1, y0],
        tex_coords: [1.0, 0.0],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [x1, y1],
        tex_coords: [1.0, 1.0],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [x0, y1],
        tex_coords: [0.0, 1.0],
        color: spec.color,
    });

    let draw_start = indices.len() as u32;
    indices.extend_from_slice(&[
        base_index,
        base_index + 1,
        base_index + 2,
        base_index,
        base_index + 2,
        base_index + 3,
    ]);

    push_draw_call(draw_calls, Arc::from(spec.texture_key), draw_start, 6);
}

/// Append a draw call, merging with the previous one when the texture
/// matches and indices are contiguous: consecutive quads sharing a texture
/// collapse into a single `draw_indexed` call.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if *last.texture_key == *texture_key && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture_key,
        index_start,
        index_count,
    });
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Octodrift starting...");

    let assets = load_assets(std::path::Path::new(MANIFEST_PATH)).unwrap_or_else(|err| {
        panic!("Failed to load assets from '{MANIFEST_PATH}': {err}");
    });
    let (width, height) = assets.background_size();
    let config = PlatformConfig::sized(WINDOW_TITLE, width, height);

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, assets);
    event_loop.run_app(&mut app).expect("Event loop error");
}
