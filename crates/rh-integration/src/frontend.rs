//! Frontend: the public face of the host
//!
//! Owns the engine, the canvas and the storage. One mutex guards the engine
//! so a tick never overlaps a save or a restore.

use crate::engine::Engine;
use crate::runner;
use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use rh_audio::AudioChunk;
use rh_core::logging::byte_count_binary;
use rh_core::{AspectRatio, CoreError, EmulatorConfig, Metadata, Result, VideoError};
use rh_ffi::{CoreHandle, HostReservation, RawFrame, VideoRefresh, HOST};
use rh_storage::{state_hash, Storage};
use rh_video::{Canvas, Frame, GraphicsContext};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Receives every converted frame with its display duration
pub type VideoCallback = Box<dyn Fn(&Frame, Duration) + Send + Sync>;

/// Turns core refreshes into frames for the video callback
#[derive(Default)]
struct VideoPipe {
    canvas: RwLock<Option<Canvas>>,
    /// Previous frame, kept for duplicate refreshes
    last: Mutex<Option<Frame>>,
    frame_dup: AtomicBool,
    on_video: RwLock<Option<VideoCallback>>,
    /// First conversion failure that can't be recovered from
    error: Mutex<Option<VideoError>>,
}

impl VideoPipe {
    fn refresh(&self, r: VideoRefresh<'_>) {
        match r.frame {
            RawFrame::Dup => {
                if !self.frame_dup.load(Ordering::Relaxed) {
                    return;
                }
                if let Some(frame) = self.last.lock().as_ref() {
                    self.emit(frame, r.duration);
                }
            }
            RawFrame::Data { bytes, info } => {
                let canvas = self.canvas.read();
                let Some(canvas) = canvas.as_ref() else {
                    return;
                };
                match canvas.draw(r.format, r.transform, info, bytes) {
                    Ok(frame) => {
                        self.emit(&frame, r.duration);
                        if self.frame_dup.load(Ordering::Relaxed) {
                            if let Some(old) = self.last.lock().replace(frame) {
                                canvas.put(old);
                            }
                        } else {
                            canvas.put(frame);
                        }
                    }
                    Err(e @ (VideoError::ShortBuffer { .. } | VideoError::EmptyFrame(..))) => {
                        debug!("Frame skipped: {}", e);
                    }
                    Err(e) => {
                        let mut slot = self.error.lock();
                        if slot.is_none() {
                            error!("Frame conversion failed: {}", e);
                            *slot = Some(e);
                        }
                    }
                }
            }
        }
    }

    fn emit(&self, frame: &Frame, duration: Duration) {
        if let Some(cb) = self.on_video.read().as_ref() {
            cb(frame, duration);
        }
    }

    fn set_canvas(&self, canvas: Option<Canvas>) {
        *self.last.lock() = None;
        *self.canvas.write() = canvas;
    }
}

/// Viewport for a `w`x`h` frame under the aspect ratio settings.
///
/// With `keep` the frame is fit into the configured box, dimensions rounded
/// to even numbers. Portrait output swaps the result.
pub fn viewport_calc(w: u32, h: u32, aspect: &AspectRatio, portrait: bool) -> (usize, usize) {
    let (aw, ah) = (aspect.width, aspect.height);
    let (mut nw, mut nh) = if aspect.keep && aw > 0 && ah > 0 && h > 0 {
        let ratio = w as f64 / ah as f64;
        let mut nw = ((ah as f64 * ratio / 2.0).round() * 2.0) as u32;
        let mut nh = ah;
        if nw > aw {
            nw = aw;
            nh = ((aw as f64 / ratio / 2.0).round() * 2.0) as u32;
        }
        debug!(
            "Viewport aspect change: {}x{} ({}) -> {}x{}",
            aw, ah, ratio, nw, nh
        );
        (nw, nh)
    } else {
        (w, h)
    };

    if portrait {
        std::mem::swap(&mut nw, &mut nh);
        debug!("Set portrait mode");
    }
    (nw as usize, nh as usize)
}

pub struct Frontend {
    conf: EmulatorConfig,
    storage: Box<dyn Storage>,
    /// The tick mutex
    engine: Mutex<Option<Engine>>,
    pipe: Arc<VideoPipe>,
    viewport: RwLock<(usize, usize)>,
    scale: RwLock<f64>,
    /// Dropped by `close` to stop the runner and the autosave
    done: Mutex<Option<Sender<()>>>,
    running: AtomicBool,
    save_on_close: AtomicBool,
    _host: HostReservation,
}

impl Frontend {
    /// Claims the host and prepares the local and storage directories
    pub fn new(conf: EmulatorConfig) -> Result<Self> {
        let host = HOST.reserve()?;

        std::fs::create_dir_all(&conf.local_path)?;
        let local = std::fs::canonicalize(&conf.local_path)?;
        info!("Emulator save path is {}", local.display());
        info!("Local storage path: {}", conf.storage.display());
        std::fs::create_dir_all(&conf.storage)?;

        let storage = rh_storage::open(&conf.storage, conf.libretro.save_compression);
        let pipe = Arc::new(VideoPipe::default());
        let sink = pipe.clone();
        HOST.set_video_sink(Some(Box::new(move |r: VideoRefresh<'_>| sink.refresh(r))));

        Ok(Self {
            save_on_close: AtomicBool::new(conf.save_on_close),
            conf: EmulatorConfig {
                local_path: local,
                ..conf
            },
            storage,
            engine: Mutex::new(None),
            pipe,
            viewport: RwLock::new((0, 0)),
            scale: RwLock::new(1.0),
            done: Mutex::new(None),
            running: AtomicBool::new(false),
            _host: host,
        })
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.conf
    }

    /// Opens the core library configured under `name`
    pub fn load_core(&self, name: &str) -> Result<()> {
        let meta = self.conf.metadata(name)?;
        info!("Loading core {} from {}", name, meta.lib_path.display());
        let handle = CoreHandle::open(&meta.lib_path)?;
        self.load_core_handle(meta, handle)
    }

    /// Starts an already opened core
    pub fn load_core_handle(&self, meta: Metadata, handle: CoreHandle) -> Result<()> {
        let mut engine = self.engine.lock();
        if engine.is_some() {
            return Err(CoreError::AlreadyLoaded.into());
        }

        {
            let mut env = HOST.env.lock();
            env.set_local_path(&self.conf.local_path);
            env.set_username(&std::env::var("USER").unwrap_or_default());
        }
        if meta.scale > 1.0 {
            debug!("Scale: x{}", meta.scale);
        }
        *self.scale.write() = meta.scale.max(1.0);
        self.storage.set_non_blocking(meta.non_blocking_save);
        self.pipe.frame_dup.store(meta.frame_dup, Ordering::Relaxed);
        *self.pipe.error.lock() = None;

        *engine = Some(Engine::load(handle, meta)?);
        Ok(())
    }

    /// Loads a ROM and sizes the viewport after it
    pub fn load_game<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut guard = self.engine.lock();
        let engine = guard.as_mut().ok_or(CoreError::NotLoaded)?;
        engine.load_game(path)?;

        let g = engine.av_info().geometry;
        let (w, h) = viewport_calc(g.base_width, g.base_height, &self.conf.aspect_ratio, is_portrait());
        info!("Viewport final size: {}x{}", w, h);
        self.apply_viewport(w, h, g.max_pixels());
        HOST.set_stopped(false);
        Ok(())
    }

    /// Runs the tick loop on the calling thread until [`Frontend::close`],
    /// then shuts the core down.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        debug!("Frontend start");
        if !self.engine.lock().as_ref().is_some_and(|e| e.has_game()) {
            return Err(CoreError::NoGame.into());
        }
        let (tx, rx): (Sender<()>, Receiver<()>) = bounded(0);
        *self.done.lock() = Some(tx);
        self.running.store(true, Ordering::Release);
        HOST.reset_clock();

        if self.has_save() {
            if self.is_cooperative() {
                // some cooperative cores need a frame before a restore
                if let Err(e) = self.tick() {
                    error!("Warm-up frame failed: {}", e);
                }
            }
            if let Err(e) = self.restore_game_state() {
                error!("Couldn't load a save file: {}", e);
            }
        }

        if self.conf.autosave_sec > 0 {
            runner::spawn_autosave(
                Arc::downgrade(self),
                Duration::from_secs(self.conf.autosave_sec),
                rx.clone(),
            )?;
        }

        runner::run(self, HOST.tick_time(), &rx);
        self.running.store(false, Ordering::Release);
        self.shutdown()
    }

    /// One emulation step
    pub fn tick(&self) -> Result<()> {
        let mut guard = self.engine.lock();
        let engine = guard.as_mut().ok_or(CoreError::NotLoaded)?;
        engine.run()?;

        if let Some(e) = self.pipe.error.lock().clone() {
            return Err(e.into());
        }
        let change = HOST.env.lock().take_geometry_change();
        if let Some(g) = change {
            engine.update_geometry(g);
            if !engine.metadata().core_aspect_ratio {
                debug!("Geometry change to {}x{}", g.base_width, g.base_height);
                return Ok(());
            }
            let (w, h) = viewport_calc(g.base_width, g.base_height, &self.conf.aspect_ratio, is_portrait());
            info!("Geometry change, viewport {}x{}", w, h);
            self.apply_viewport(w, h, g.max_pixels());
        }
        Ok(())
    }

    /// Controller state from a player; never waits for a tick
    pub fn input(&self, port: usize, data: &[u8]) {
        HOST.input.set_input(port, data);
    }

    /// One key event: big-endian key code, pressed byte, big-endian modifiers
    pub fn keyboard_input(&self, data: &[u8]) {
        HOST.input.keyboard().set_key(data);
    }

    /// A tagged mouse event, motion or buttons
    pub fn mouse_input(&self, data: &[u8]) {
        HOST.input.mouse().set_input(data);
    }

    /// Writes the current state and SRAM to storage
    pub fn save_game_state(&self) -> Result<()> {
        let guard = self.engine.lock();
        let engine = guard.as_ref().ok_or(CoreError::NotLoaded)?;

        let state = engine.serialize()?;
        let path = self.storage.save_path();
        self.storage.save(&path, &state)?;
        debug!(
            "Saved {} ({}, {})",
            path.display(),
            byte_count_binary(state.len() as u64),
            state_hash(&state)
        );

        if let Some(sram) = engine.sram()? {
            self.storage.save(&self.storage.sram_path(), &sram)?;
        }
        Ok(())
    }

    /// Restores state and SRAM from storage; missing files are skipped
    pub fn restore_game_state(&self) -> Result<()> {
        let guard = self.engine.lock();
        let engine = guard.as_ref().ok_or(CoreError::NotLoaded)?;

        let path = self.storage.save_path();
        let state = self.load_or_empty(&path)?;
        if !state.is_empty() {
            debug!("Restoring {} ({} bytes, {})", path.display(), state.len(), state_hash(&state));
        }
        engine.unserialize(state)?;

        let sram = self.load_or_empty(&self.storage.sram_path())?;
        if !sram.is_empty() {
            engine.restore_sram(sram)?;
        }
        Ok(())
    }

    fn load_or_empty(&self, path: &Path) -> Result<Vec<u8>> {
        match self.storage.load(path) {
            Ok(data) => Ok(data),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn viewport_size(&self) -> (usize, usize) {
        *self.viewport.read()
    }

    /// Viewport the loaded game would get with the current settings
    pub fn viewport_calc(&self) -> (usize, usize) {
        let guard = self.engine.lock();
        let g = guard.as_ref().map(|e| e.av_info().geometry).unwrap_or_default();
        viewport_calc(g.base_width, g.base_height, &self.conf.aspect_ratio, is_portrait())
    }

    pub fn set_viewport(&self, width: usize, height: usize) {
        let max_pixels = self
            .engine
            .lock()
            .as_ref()
            .map_or(0, |e| e.av_info().geometry.max_pixels());
        self.apply_viewport(width, height, max_pixels);
    }

    /// Records the viewport and rebuilds the canvas at the scaled size
    fn apply_viewport(&self, width: usize, height: usize, max_pixels: usize) {
        *self.viewport.write() = (width, height);
        let scale = *self.scale.read();
        let (cw, ch) = (
            (width as f64 * scale).round() as usize,
            (height as f64 * scale).round() as usize,
        );
        let canvas = Canvas::new(cw, ch, max_pixels, self.conf.threads.max(1), self.conf.scaling);
        self.pipe.set_canvas(Some(canvas));
    }

    pub fn scale(&self) -> f64 {
        *self.scale.read()
    }

    /// Names the session; saves are keyed by it
    pub fn set_session_id(&self, name: &str) {
        self.storage.set_main_save_name(name);
    }

    pub fn set_save_on_close(&self, enabled: bool) {
        self.save_on_close.store(enabled, Ordering::Relaxed);
    }

    pub fn has_save(&self) -> bool {
        self.storage.save_path().exists()
    }

    pub fn save_path(&self) -> std::path::PathBuf {
        self.storage.save_path()
    }

    /// Plugs or unplugs the multitap adapter on cores that have one
    pub fn toggle_multitap(&self) -> Result<()> {
        let toggle = HOST.env.lock().multitap.toggle();
        let Some((port, device)) = toggle else {
            return Ok(());
        };
        let guard = self.engine.lock();
        let engine = guard.as_ref().ok_or(CoreError::NotLoaded)?;
        engine.set_controller_port_device(port, device)
    }

    pub fn set_video_cb<F>(&self, cb: F)
    where
        F: Fn(&Frame, Duration) + Send + Sync + 'static,
    {
        *self.pipe.on_video.write() = Some(Box::new(cb));
    }

    /// Audio chunks from now on go to the returned receiver
    pub fn subscribe_audio(&self, capacity: usize) -> Receiver<AudioChunk> {
        HOST.audio.subscribe(capacity)
    }

    /// Provider for cores that render with GL
    pub fn set_graphics_context(&self, ctx: Arc<dyn GraphicsContext>) {
        HOST.set_graphics(Some(ctx));
    }

    /// Converts frames on a single buffer instead of the pool, for
    /// consumers that keep frames around
    pub fn set_canvas_pooling(&self, enabled: bool) {
        if let Some(canvas) = self.pipe.canvas.read().as_ref() {
            canvas.set_pooling(enabled);
        }
    }

    pub fn is_cooperative(&self) -> bool {
        self.engine.lock().as_ref().is_some_and(|e| e.is_cooperative())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the session. The runner finishes its tick and shuts the core
    /// down; without a runner the core is shut down right here.
    pub fn close(&self) -> Result<()> {
        debug!("Frontend close called");
        if self.save_on_close.load(Ordering::Relaxed) && self.has_save() {
            debug!("Save on quit");
            if let Err(e) = self.save_game_state() {
                error!("Save on quit failed: {}", e);
            }
        }

        HOST.set_stopped(true);
        self.done.lock().take();
        if !self.is_running() {
            return self.shutdown();
        }
        Ok(())
    }

    /// Tears the core down. Safe to call more than once.
    pub fn shutdown(&self) -> Result<()> {
        let mut guard = self.engine.lock();
        let Some(engine) = guard.take() else {
            return Ok(());
        };
        HOST.set_stopped(true);
        self.pipe.set_canvas(None);
        *self.pipe.on_video.write() = None;
        HOST.audio.unsubscribe();
        let result = engine.shutdown();
        debug!("Frontend closed");
        result
    }
}

impl Drop for Frontend {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Shutdown failed: {}", e);
        }
    }
}

fn is_portrait() -> bool {
    HOST.env.lock().rotation().swaps_axes()
}
