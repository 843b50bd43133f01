//! In-process fake core for the integration tests
//!
//! Exposes the libretro entry points as plain `extern "C"` functions over
//! static state. Its save state is a frame counter plus an accumulator fed by
//! the ROM bytes and the pad input, so restoring a state is observable.

#![allow(dead_code)]

use parking_lot::{const_mutex, Mutex, MutexGuard};
use rh_core::{EmulatorConfig, Metadata};
use rh_ffi::abi::*;
use rh_ffi::{CoreFns, CoreHandle};
use std::ffi::{c_uint, c_void, CStr};
use std::path::PathBuf;
use std::thread::ThreadId;
use tempfile::TempDir;

pub const STATE_SIZE: usize = 16;
pub const SRAM_SIZE: usize = 8;
pub const MULTITAP_ID: u32 = 257;
pub const OPTION_KEY: &CStr = c"fake_speed";

/// Knobs a test sets before loading
#[derive(Debug, Clone, Copy)]
pub struct FakeSetup {
    pub pixel_format: u32,
    pub rotation: u32,
    pub width: u32,
    pub height: u32,
    pub need_fullpath: bool,
    pub reject_game: bool,
    /// Report every second frame as a duplicate
    pub dup_frames: bool,
    pub multitap: bool,
    /// Ask for an OpenGL core context and render into it
    pub hw_render: bool,
    /// Pixel format asked for from `retro_init`
    pub init_pixel_format: Option<u32>,
    /// Keep loading the game when the pixel format is refused
    pub ignore_format_error: bool,
    /// Base geometry announced from every `retro_run`
    pub geometry_change: Option<(u32, u32)>,
    /// Refresh with a 0x0 frame
    pub empty_frames: bool,
}

impl Default for FakeSetup {
    fn default() -> Self {
        Self {
            pixel_format: 1,
            rotation: 0,
            width: 32,
            height: 16,
            need_fullpath: false,
            reject_game: false,
            dup_frames: false,
            multitap: false,
            hw_render: false,
            init_pixel_format: None,
            ignore_format_error: false,
            geometry_change: None,
            empty_frames: false,
        }
    }
}

#[derive(Default)]
struct FakeCore {
    setup: FakeSetup,
    environment: Option<retro_environment_t>,
    video: Option<retro_video_refresh_t>,
    audio_batch: Option<retro_audio_sample_batch_t>,
    input_state: Option<retro_input_state_t>,
    frame: u64,
    acc: u64,
    sram: Vec<u8>,
    option: Option<String>,
    calls: Vec<&'static str>,
    threads: Vec<ThreadId>,
    ports: Vec<(u32, u32)>,
    /// Space key, mouse x and left button as read in each frame
    devices: Vec<(i16, i16, i16)>,
}

static CORE: Mutex<Option<FakeCore>> = const_mutex(None);
static TEST_LOCK: Mutex<()> = const_mutex(());

/// Serializes tests: the host is one per process
pub fn lock() -> MutexGuard<'static, ()> {
    let guard = TEST_LOCK.lock();
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
    guard
}

/// Resets the fake and returns its function table
pub fn fake_core(setup: FakeSetup) -> CoreHandle {
    *CORE.lock() = Some(FakeCore {
        setup,
        sram: vec![0; SRAM_SIZE],
        ..Default::default()
    });
    CoreHandle::from_fns(CoreFns {
        init: retro_init,
        deinit: retro_deinit,
        get_system_info: retro_get_system_info,
        get_system_av_info: retro_get_system_av_info,
        set_environment: retro_set_environment,
        set_video_refresh: retro_set_video_refresh,
        set_input_poll: retro_set_input_poll,
        set_input_state: retro_set_input_state,
        set_audio_sample: retro_set_audio_sample,
        set_audio_sample_batch: retro_set_audio_sample_batch,
        run: retro_run,
        load_game: retro_load_game,
        unload_game: retro_unload_game,
        api_version: Some(retro_api_version),
        set_controller_port_device: Some(retro_set_controller_port_device),
        serialize_size: Some(retro_serialize_size),
        serialize: Some(retro_serialize),
        unserialize: Some(retro_unserialize),
        get_memory_data: Some(retro_get_memory_data),
        get_memory_size: Some(retro_get_memory_size),
    })
}

/// Host settings rooted in a fresh temporary directory
pub fn config(dir: &TempDir) -> EmulatorConfig {
    let mut conf = EmulatorConfig {
        threads: 2,
        local_path: dir.path().join("local"),
        storage: dir.path().join("saves"),
        autosave_sec: 0,
        save_on_close: false,
        ..Default::default()
    };
    conf.libretro.save_compression = false;
    conf
}

pub fn metadata() -> Metadata {
    Metadata {
        lib_path: PathBuf::from("fake"),
        ..Default::default()
    }
}

/// Writes a small ROM and returns its path
pub fn rom(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, [3u8, 1, 4, 1, 5, 9, 2, 6]).unwrap();
    path
}

pub fn calls() -> Vec<&'static str> {
    CORE.lock().as_ref().map(|c| c.calls.clone()).unwrap_or_default()
}

pub fn threads() -> Vec<ThreadId> {
    CORE.lock().as_ref().map(|c| c.threads.clone()).unwrap_or_default()
}

pub fn ports() -> Vec<(u32, u32)> {
    CORE.lock().as_ref().map(|c| c.ports.clone()).unwrap_or_default()
}

pub fn devices() -> Vec<(i16, i16, i16)> {
    CORE.lock().as_ref().map(|c| c.devices.clone()).unwrap_or_default()
}

pub fn frame() -> u64 {
    CORE.lock().as_ref().map_or(0, |c| c.frame)
}

pub fn option_value() -> Option<String> {
    CORE.lock().as_ref().and_then(|c| c.option.clone())
}

pub fn sram() -> Vec<u8> {
    CORE.lock().as_ref().map(|c| c.sram.clone()).unwrap_or_default()
}

fn with<R>(call: &'static str, f: impl FnOnce(&mut FakeCore) -> R) -> R {
    let mut guard = CORE.lock();
    let core = guard.as_mut().expect("fake core not set up");
    core.calls.push(call);
    core.threads.push(std::thread::current().id());
    f(core)
}

unsafe fn env(cmd: c_uint, data: *mut c_void) -> bool {
    let cb = CORE.lock().as_ref().and_then(|c| c.environment);
    match cb {
        Some(cb) => cb(cmd, data),
        None => false,
    }
}

unsafe extern "C" fn retro_api_version() -> c_uint {
    1
}

unsafe extern "C" fn retro_set_environment(cb: retro_environment_t) {
    if let Some(core) = CORE.lock().as_mut() {
        core.environment = Some(cb);
    }
}

unsafe extern "C" fn retro_set_video_refresh(cb: retro_video_refresh_t) {
    if let Some(core) = CORE.lock().as_mut() {
        core.video = Some(cb);
    }
}

unsafe extern "C" fn retro_set_input_poll(_cb: retro_input_poll_t) {}

unsafe extern "C" fn retro_set_input_state(cb: retro_input_state_t) {
    if let Some(core) = CORE.lock().as_mut() {
        core.input_state = Some(cb);
    }
}

unsafe extern "C" fn retro_set_audio_sample(_cb: retro_audio_sample_t) {}

unsafe extern "C" fn retro_set_audio_sample_batch(cb: retro_audio_sample_batch_t) {
    if let Some(core) = CORE.lock().as_mut() {
        core.audio_batch = Some(cb);
    }
}

unsafe extern "C" fn retro_init() {
    let setup = with("init", |c| c.setup);
    if let Some(mut format) = setup.init_pixel_format {
        env(RETRO_ENVIRONMENT_SET_PIXEL_FORMAT, (&mut format as *mut u32).cast());
    }
    let mut log = retro_log_callback { log: None };
    if env(RETRO_ENVIRONMENT_GET_LOG_INTERFACE, (&mut log as *mut retro_log_callback).cast()) {
        if let Some(printf) = log.log {
            printf(RETRO_LOG_INFO, c"fake core %s\n".as_ptr(), c"ready".as_ptr());
        }
    }
}

unsafe extern "C" fn retro_deinit() {
    with("deinit", |_| ());
}

unsafe extern "C" fn retro_get_system_info(info: *mut retro_system_info) {
    let need_fullpath = with("get_system_info", |c| c.setup.need_fullpath);
    *info = retro_system_info {
        library_name: c"Fake".as_ptr(),
        library_version: c"1.0".as_ptr(),
        valid_extensions: c"bin|rom".as_ptr(),
        need_fullpath,
        block_extract: false,
    };
}

unsafe extern "C" fn retro_get_system_av_info(av: *mut retro_system_av_info) {
    let setup = with("get_system_av_info", |c| c.setup);
    *av = retro_system_av_info {
        geometry: retro_game_geometry {
            base_width: setup.width,
            base_height: setup.height,
            max_width: setup.width,
            max_height: setup.height,
            aspect_ratio: 0.0,
        },
        timing: retro_system_timing {
            fps: 60.0,
            sample_rate: 44100.0,
        },
    };
}

unsafe extern "C" fn retro_load_game(game: *const retro_game_info) -> bool {
    let setup = with("load_game", |c| c.setup);
    if setup.reject_game || game.is_null() {
        return false;
    }

    let mut format = setup.pixel_format;
    if !env(RETRO_ENVIRONMENT_SET_PIXEL_FORMAT, (&mut format as *mut u32).cast())
        && !setup.ignore_format_error
    {
        return false;
    }
    if setup.hw_render {
        let mut hw = retro_hw_render_callback {
            context_type: 3,
            context_reset: Some(retro_context_reset),
            context_destroy: Some(retro_context_destroy),
            version_major: 3,
            version_minor: 3,
            ..Default::default()
        };
        if !env(RETRO_ENVIRONMENT_SET_HW_RENDER, (&mut hw as *mut retro_hw_render_callback).cast()) {
            return false;
        }
    }
    let mut rotation = setup.rotation;
    env(RETRO_ENVIRONMENT_SET_ROTATION, (&mut rotation as *mut u32).cast());
    if setup.multitap {
        let types = [
            retro_controller_description {
                desc: c"RetroPad".as_ptr(),
                id: 1,
            },
            retro_controller_description {
                desc: c"Multitap".as_ptr(),
                id: MULTITAP_ID,
            },
        ];
        let infos = [
            retro_controller_info {
                types: types.as_ptr(),
                num_types: 1,
            },
            retro_controller_info {
                types: types.as_ptr(),
                num_types: 2,
            },
            retro_controller_info {
                types: std::ptr::null(),
                num_types: 0,
            },
        ];
        env(RETRO_ENVIRONMENT_SET_CONTROLLER_INFO, infos.as_ptr() as *mut c_void);
    }

    let mut var = retro_variable {
        key: OPTION_KEY.as_ptr(),
        value: std::ptr::null(),
    };
    let option = if env(RETRO_ENVIRONMENT_GET_VARIABLE, (&mut var as *mut retro_variable).cast())
        && !var.value.is_null()
    {
        Some(CStr::from_ptr(var.value).to_string_lossy().into_owned())
    } else {
        None
    };

    let game = &*game;
    let seed = if game.data.is_null() {
        0
    } else {
        std::slice::from_raw_parts(game.data as *const u8, game.size)
            .iter()
            .map(|b| *b as u64)
            .sum()
    };
    if let Some(core) = CORE.lock().as_mut() {
        core.option = option;
        core.acc = seed;
        core.frame = 0;
    }
    true
}

unsafe extern "C" fn retro_context_reset() {
    with("context_reset", |_| ());
}

unsafe extern "C" fn retro_context_destroy() {
    with("context_destroy", |_| ());
}

unsafe extern "C" fn retro_unload_game() {
    with("unload_game", |_| ());
}

unsafe extern "C" fn retro_run() {
    let (setup, frame, video, audio, input) = with("run", |c| {
        c.frame += 1;
        (c.setup, c.frame, c.video, c.audio_batch, c.input_state)
    });

    let pressed = match input {
        Some(state) => state(0, 1, 0, 0) as u64,
        None => 0,
    };
    // RETROK_SPACE, mouse x, mouse left
    let devices = match input {
        Some(state) => (state(0, 3, 0, 32), state(0, 2, 0, 0), state(0, 2, 0, 2)),
        None => (0, 0, 0),
    };
    if let Some(core) = CORE.lock().as_mut() {
        core.devices.push(devices);
        core.acc = core.acc.wrapping_mul(31).wrapping_add(frame + pressed);
        core.sram[0] = frame as u8;
    }

    if let Some(video) = video {
        if setup.empty_frames {
            video([0u8; 4].as_ptr().cast(), 0, 0, 0);
        } else if setup.hw_render {
            video(RETRO_HW_FRAME_BUFFER_VALID, setup.width, setup.height, 0);
        } else if setup.dup_frames && frame % 2 == 0 {
            video(std::ptr::null(), setup.width, setup.height, 0);
        } else {
            let (pixels, pitch) = picture(&setup);
            video(pixels.as_ptr().cast(), setup.width, setup.height, pitch);
        }
    }
    if let Some((width, height)) = setup.geometry_change {
        let mut geometry = retro_game_geometry {
            base_width: width,
            base_height: height,
            max_width: width,
            max_height: height,
            aspect_ratio: 0.0,
        };
        env(RETRO_ENVIRONMENT_SET_GEOMETRY, (&mut geometry as *mut retro_game_geometry).cast());
    }
    if let Some(audio) = audio {
        let samples = [frame as i16; 8];
        audio(samples.as_ptr(), samples.len() / 2);
    }
}

/// Black frame with a red pixel at (0, 0); rows carry 8 padding bytes
fn picture(setup: &FakeSetup) -> (Vec<u8>, usize) {
    let bpp = if setup.pixel_format == 1 { 4 } else { 2 };
    let pitch = setup.width as usize * bpp + 8;
    let mut pixels = vec![0u8; pitch * setup.height as usize];
    match setup.pixel_format {
        // XRGB8888 little-endian: B, G, R, X
        1 => pixels[..4].copy_from_slice(&[0, 0, 0xFF, 0]),
        // RGB565: red is the top five bits
        _ => pixels[..2].copy_from_slice(&0xF800u16.to_le_bytes()),
    }
    (pixels, pitch)
}

unsafe extern "C" fn retro_set_controller_port_device(port: c_uint, device: c_uint) {
    with("set_controller_port_device", |c| c.ports.push((port, device)));
}

unsafe extern "C" fn retro_serialize_size() -> usize {
    with("serialize_size", |_| STATE_SIZE)
}

unsafe extern "C" fn retro_serialize(data: *mut c_void, size: usize) -> bool {
    if size < STATE_SIZE {
        return false;
    }
    let (frame, acc) = with("serialize", |c| (c.frame, c.acc));
    let out = std::slice::from_raw_parts_mut(data as *mut u8, STATE_SIZE);
    out[..8].copy_from_slice(&frame.to_le_bytes());
    out[8..].copy_from_slice(&acc.to_le_bytes());
    true
}

unsafe extern "C" fn retro_unserialize(data: *const c_void, size: usize) -> bool {
    if size < STATE_SIZE {
        return false;
    }
    let bytes = std::slice::from_raw_parts(data as *const u8, STATE_SIZE);
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    let frame = u64::from_le_bytes(word);
    word.copy_from_slice(&bytes[8..]);
    let acc = u64::from_le_bytes(word);
    with("unserialize", |c| {
        c.frame = frame;
        c.acc = acc;
    });
    true
}

unsafe extern "C" fn retro_get_memory_data(id: c_uint) -> *mut c_void {
    let mut guard = CORE.lock();
    match guard.as_mut() {
        Some(c) if id == RETRO_MEMORY_SAVE_RAM => c.sram.as_mut_ptr().cast(),
        _ => std::ptr::null_mut(),
    }
}

unsafe extern "C" fn retro_get_memory_size(id: c_uint) -> usize {
    if id == RETRO_MEMORY_SAVE_RAM {
        SRAM_SIZE
    } else {
        0
    }
}
