//! Execution engine: every call into the loaded core goes through here
//!
//! Cores either run on the caller's thread (direct) or, when they switch
//! stacks internally, on the process-wide call thread (cooperative).

use crate::loader::{GameLoader, LoadedGame};
use rh_core::{
    AvInfo, CoreError, FrameClock, Geometry, HostError, Metadata, NegotiationError, Result,
    SystemInfo, VideoError, HACK_SKIP_HW_CONTEXT_DESTROY,
};
use rh_ffi::abi::{retro_system_av_info, retro_system_info, RETRO_MEMORY_SAVE_RAM};
use rh_ffi::{callbacks, CallThread, CoreFns, CoreHandle, HwRender, HOST};
use rh_input::{DEVICE_JOYPAD, MAX_PORT};
use rh_video::GraphicsContext;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where core calls execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionModel {
    /// On the calling thread
    Direct,
    /// On the single call thread
    Cooperative,
}

/// A loaded core and, once `load_game` succeeds, its game
pub struct Engine {
    handle: CoreHandle,
    fns: CoreFns,
    meta: Metadata,
    model: ExecutionModel,
    system: SystemInfo,
    av: AvInfo,
    serialize_size: usize,
    game: Option<Arc<LoadedGame>>,
    hw: Option<HwRender>,
}

impl Engine {
    /// Registers the callbacks, initializes the core and reads its system info
    pub fn load(handle: CoreHandle, meta: Metadata) -> Result<Self> {
        let fns = *handle.fns();
        let model = if meta.uses_libco {
            ExecutionModel::Cooperative
        } else {
            ExecutionModel::Direct
        };
        {
            let mut env = HOST.env.lock();
            env.set_gl_allowed(meta.is_gl_allowed);
            env.set_multitap_supported(meta.has_multitap);
        }

        let mut engine = Self {
            handle,
            fns,
            meta,
            model,
            system: SystemInfo::default(),
            av: AvInfo::default(),
            serialize_size: 0,
            game: None,
            hw: None,
        };

        // SAFETY: fresh core, callbacks are process-lifetime functions
        unsafe { callbacks::install(&fns) };
        if let Some(version) = fns.api_version {
            debug!("Libretro API version: {}", unsafe { version() });
        }
        engine.call(move || unsafe { (fns.init)() })?;
        if let Err(e) = engine.after_init() {
            // initialized cores are deinitialized before the library goes away
            if let Err(deinit) = engine.call(move || unsafe { (fns.deinit)() }) {
                warn!("Couldn't deinit the core: {}", deinit);
            }
            HOST.env.lock().reset();
            return Err(e);
        }
        info!(
            "Core: {} {} ({:?}, extensions: {})",
            engine.system.library_name,
            engine.system.library_version,
            engine.model,
            engine.system.valid_extensions
        );
        Ok(engine)
    }

    fn after_init(&mut self) -> Result<()> {
        self.check_negotiation()?;
        let fns = self.fns;
        self.system = self.call(move || unsafe {
            let mut info = retro_system_info::default();
            (fns.get_system_info)(&mut info);
            info.to_system_info()
        })?;
        Ok(())
    }

    /// Runs `f` where this core's calls must run
    fn call<R, F>(&self, f: F) -> std::result::Result<R, CoreError>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        match self.model {
            ExecutionModel::Direct => Ok(f()),
            ExecutionModel::Cooperative => CallThread::global()?.call(f),
        }
    }

    fn check_negotiation(&self) -> Result<()> {
        match HOST.env.lock().take_fatal() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn load_game<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if self.game.is_some() {
            return Err(CoreError::AlreadyLoaded.into());
        }
        let game = Arc::new(GameLoader::load(path, self.system.need_fullpath)?);
        HOST.env.lock().set_options(&self.meta.options_for_rom(path));

        let fns = self.fns;
        let ok = self.call({
            let game = game.clone();
            move || unsafe {
                let info = game.info();
                (fns.load_game)(&info)
            }
        })?;
        if ok {
            self.game = Some(game);
        }
        self.check_negotiation()?;
        if !ok {
            return Err(CoreError::LoadGameFailed(path.to_path_buf()).into());
        }

        self.av = self
            .call(move || unsafe {
                let mut av = retro_system_av_info::default();
                (fns.get_system_av_info)(&mut av);
                AvInfo::from(av)
            })?;
        let av = self.av;
        info!(
            "System A/V: {}x{} (max {}x{}), {:.2} fps, {} Hz",
            av.geometry.base_width,
            av.geometry.base_height,
            av.geometry.max_width,
            av.geometry.max_height,
            av.timing.fps,
            av.timing.sample_rate
        );
        HOST.env.lock().set_geometry(av.geometry);
        HOST.audio.set_sample_rate(av.timing.sample_rate);
        HOST.set_clock(FrameClock::new(av.timing.fps, self.meta.has_vfr));

        if let Some(size) = self.fns.serialize_size {
            self.serialize_size = self.call(move || unsafe { size() })?;
            debug!("Save state size: {}", self.serialize_size);
        }

        self.hw = HOST.env.lock().hw_render();
        if let Some(hw) = self.hw {
            self.init_video(hw)?;
        }

        for port in 0..MAX_PORT as u32 {
            self.set_controller_port_device(port, DEVICE_JOYPAD)?;
        }
        let hid: Vec<(u32, u32)> = self
            .meta
            .hid
            .iter()
            .flat_map(|(port, devices)| devices.iter().map(move |d| (*port, *d)))
            .collect();
        for (port, device) in hid {
            debug!("Set custom device {} on port {}", device, port);
            self.set_controller_port_device(port, device)?;
        }

        HOST.reset_clock();
        Ok(())
    }

    fn init_video(&self, hw: HwRender) -> Result<()> {
        let gfx = HOST
            .graphics()
            .ok_or(HostError::Negotiation(NegotiationError::NoGraphicsContext))?;
        let g = self.av.geometry;
        let config = hw.config(g.max_width, g.max_height, self.meta.auto_gl_context);
        let format = HOST.env.lock().pixel_format();

        self.call(move || -> std::result::Result<(), VideoError> {
            gfx.init(&config)?;
            gfx.set_pixel_format(format);
            gfx.bind()?;
            if let Some(reset) = hw.context_reset {
                unsafe { reset() };
            }
            gfx.unbind()
        })??;
        info!("Graphics context ready: {:?}", config.context);
        Ok(())
    }

    /// One emulation step
    pub fn run(&self) -> Result<()> {
        let fns = self.fns;
        let gfx = self.graphics();
        self.call(move || -> std::result::Result<(), VideoError> {
            if let Some(g) = &gfx {
                g.bind()?;
            }
            unsafe { (fns.run)() };
            match &gfx {
                Some(g) => g.unbind(),
                None => Ok(()),
            }
        })??;
        self.check_negotiation()
    }

    fn graphics(&self) -> Option<Arc<dyn GraphicsContext>> {
        self.hw.and_then(|_| HOST.graphics())
    }

    /// Current state as an opaque blob
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let (Some(size), Some(serialize)) = (self.fns.serialize_size, self.fns.serialize) else {
            return Err(CoreError::Unsupported("save states").into());
        };
        let state = self.call(move || unsafe {
            let size = size();
            let mut buf = vec![0u8; size];
            serialize(buf.as_mut_ptr().cast(), size).then_some(buf)
        })?;
        state.ok_or_else(|| CoreError::SerializeFailed.into())
    }

    /// Restores a blob from [`Engine::serialize`]; empty blobs are ignored.
    ///
    /// The core gets exactly the size it declared after load, shorter
    /// blobs are zero-padded.
    pub fn unserialize(&self, mut state: Vec<u8>) -> Result<()> {
        if state.is_empty() {
            return Ok(());
        }
        let Some(unserialize) = self.fns.unserialize else {
            return Err(CoreError::Unsupported("save states").into());
        };
        if self.serialize_size > 0 && state.len() != self.serialize_size {
            debug!(
                "State is {} bytes, core expects {}",
                state.len(),
                self.serialize_size
            );
            state.resize(self.serialize_size, 0);
        }
        let ok = self.call(move || unsafe { unserialize(state.as_ptr().cast(), state.len()) })?;
        if ok {
            Ok(())
        } else {
            Err(CoreError::UnserializeFailed.into())
        }
    }

    /// Copy of the battery-backed save memory, `None` if the core has none
    pub fn sram(&self) -> Result<Option<Vec<u8>>> {
        let (Some(data), Some(size)) = (self.fns.get_memory_data, self.fns.get_memory_size) else {
            return Ok(None);
        };
        Ok(self.call(move || unsafe {
            let size = size(RETRO_MEMORY_SAVE_RAM);
            let ptr = data(RETRO_MEMORY_SAVE_RAM) as *const u8;
            if size == 0 || ptr.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(ptr, size).to_vec())
            }
        })?)
    }

    /// Writes save memory back, truncated to what the core exposes
    pub fn restore_sram(&self, sram: Vec<u8>) -> Result<()> {
        let (Some(data), Some(size)) = (self.fns.get_memory_data, self.fns.get_memory_size) else {
            return Ok(());
        };
        self.call(move || unsafe {
            let size = size(RETRO_MEMORY_SAVE_RAM);
            let ptr = data(RETRO_MEMORY_SAVE_RAM) as *mut u8;
            if size > 0 && !ptr.is_null() {
                let n = size.min(sram.len());
                std::ptr::copy_nonoverlapping(sram.as_ptr(), ptr, n);
            }
        })?;
        Ok(())
    }

    pub fn set_controller_port_device(&self, port: u32, device: u32) -> Result<()> {
        let Some(set) = self.fns.set_controller_port_device else {
            return Ok(());
        };
        self.call(move || unsafe { set(port, device) })?;
        Ok(())
    }

    /// Tears the core down: unload, deinit, GL teardown, then the library.
    /// Negotiated state is cleared last.
    pub fn shutdown(self) -> Result<()> {
        let fns = self.fns;
        let loaded = self.game.is_some();
        let gfx = self.graphics();
        let destroy = self
            .hw
            .and_then(|hw| hw.context_destroy)
            .filter(|_| !self.meta.has_hack(HACK_SKIP_HW_CONTEXT_DESTROY));

        self.call(move || {
            if let Some(g) = &gfx {
                if let Err(e) = g.bind() {
                    warn!("Couldn't bind the graphics context: {}", e);
                }
            }
            unsafe {
                if loaded {
                    (fns.unload_game)();
                }
                (fns.deinit)();
            }
            if let Some(g) = gfx {
                if let Some(destroy) = destroy {
                    unsafe { destroy() };
                }
                let _ = g.unbind();
                if let Err(e) = g.deinit() {
                    warn!("Graphics context teardown failed: {}", e);
                }
            }
        })?;

        let Engine { handle, game, .. } = self;
        drop(game);
        let closed = handle.close();
        HOST.env.lock().reset();
        closed?;
        info!("Core shut down");
        Ok(())
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    pub fn model(&self) -> ExecutionModel {
        self.model
    }

    pub fn system_info(&self) -> &SystemInfo {
        &self.system
    }

    pub fn av_info(&self) -> AvInfo {
        self.av
    }

    /// Base geometry changed by the core at runtime
    pub fn update_geometry(&mut self, geometry: Geometry) {
        self.av.geometry = geometry;
    }

    pub fn serialize_size(&self) -> usize {
        self.serialize_size
    }

    pub fn has_game(&self) -> bool {
        self.game.is_some()
    }

    pub fn is_hardware_rendered(&self) -> bool {
        self.hw.is_some()
    }

    pub fn is_cooperative(&self) -> bool {
        self.model == ExecutionModel::Cooperative
    }
}
