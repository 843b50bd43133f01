//! Answers to the environment queries a core issues

use crate::abi::*;
use crate::callbacks;
use crate::log::log_printf;
use rh_core::{Geometry, NegotiationError};
use rh_input::{Multitap, MAX_PORT};
use rh_video::{ContextConfig, ContextType, PixelFormat, Rotation, Transform};
use std::collections::BTreeMap;
use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::path::Path;

const MULTITAP_DESC: &str = "Multitap";
const DEFAULT_USERNAME: &str = "retro";

/// What a core asked for through `SET_HW_RENDER`
#[derive(Debug, Clone, Copy)]
pub struct HwRender {
    pub context: ContextType,
    pub context_reset: Option<retro_hw_context_reset_t>,
    pub context_destroy: Option<retro_hw_context_reset_t>,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    pub version_major: u32,
    pub version_minor: u32,
}

impl HwRender {
    pub fn config(&self, width: u32, height: u32, auto_context: bool) -> ContextConfig {
        ContextConfig {
            context: self.context,
            width,
            height,
            auto_context,
            version_major: self.version_major,
            version_minor: self.version_minor,
            depth: self.depth,
            stencil: self.stencil,
        }
    }
}

/// Strings handed to the core by pointer. They stay alive and unmoved
/// until the next [`Environment::reset`].
#[derive(Debug, Default)]
struct HostStrings {
    username: Option<CString>,
    system_dir: Option<CString>,
    save_dir: Option<CString>,
}

/// Negotiated core state plus the host values the core may query
#[derive(Debug, Default)]
pub struct Environment {
    strings: HostStrings,
    options: BTreeMap<String, CString>,
    pixel_format: PixelFormat,
    rotation: Rotation,
    hw_render: Option<HwRender>,
    gl_allowed: bool,
    geometry: Option<Geometry>,
    geometry_changed: bool,
    fatal: Option<NegotiationError>,
    pub multitap: Multitap,
}

fn c_string(s: &str) -> Option<CString> {
    match CString::new(s) {
        Ok(c) => Some(c),
        Err(_) => {
            tracing::warn!("Dropping host string with an inner NUL: {:?}", s);
            None
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directories reported to the core: `<local>/system` and
    /// `<local>/legacy_save`
    pub fn set_local_path(&mut self, local: &Path) {
        self.strings.system_dir = c_string(&local.join("system").to_string_lossy());
        self.strings.save_dir = c_string(&local.join("legacy_save").to_string_lossy());
    }

    pub fn set_username(&mut self, name: &str) {
        let name = if name.is_empty() { DEFAULT_USERNAME } else { name };
        self.strings.username = c_string(name);
    }

    pub fn set_options(&mut self, options: &BTreeMap<String, String>) {
        self.options = options
            .iter()
            .filter_map(|(k, v)| c_string(v).map(|v| (k.clone(), v)))
            .collect();
    }

    pub fn set_gl_allowed(&mut self, allowed: bool) {
        self.gl_allowed = allowed;
    }

    pub fn set_multitap_supported(&mut self, supported: bool) {
        self.multitap.set_supported(supported);
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Mapping applied by the canvas. GL readbacks arrive bottom-up.
    pub fn transform(&self) -> Transform {
        Transform::new(self.rotation, self.hw_render.is_some())
    }

    pub fn hw_render(&self) -> Option<HwRender> {
        self.hw_render
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = Some(geometry);
        self.geometry_changed = false;
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    /// New base geometry if the core changed it since the last call
    pub fn take_geometry_change(&mut self) -> Option<Geometry> {
        if std::mem::take(&mut self.geometry_changed) {
            self.geometry
        } else {
            None
        }
    }

    /// Negotiation failure recorded during the last core call
    pub fn take_fatal(&mut self) -> Option<NegotiationError> {
        self.fatal.take()
    }

    /// Forgets everything negotiated with the core and frees host strings
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Handles one environment call.
    ///
    /// # Safety
    /// `data` must point to what the libretro ABI specifies for `cmd`.
    pub unsafe fn handle(&mut self, cmd: c_uint, data: *mut c_void) -> bool {
        if data.is_null() {
            tracing::trace!("Environment call {} without data", cmd);
            return false;
        }

        match cmd {
            RETRO_ENVIRONMENT_GET_USERNAME => write_str(data, self.strings.username.as_ref()),
            RETRO_ENVIRONMENT_GET_LOG_INTERFACE => {
                let cb = data as *mut retro_log_callback;
                (*cb).log = Some(log_printf());
                true
            }
            RETRO_ENVIRONMENT_GET_CAN_DUPE => {
                *(data as *mut bool) = true;
                true
            }
            RETRO_ENVIRONMENT_SET_PIXEL_FORMAT => {
                let raw = *(data as *const c_uint);
                match PixelFormat::from_raw(raw) {
                    Some(format) => {
                        tracing::info!("Pixel format: {}", format);
                        self.pixel_format = format;
                        true
                    }
                    None => {
                        tracing::error!("Unknown pixel format: {}", raw);
                        self.fatal = Some(NegotiationError::UnknownPixelFormat(raw));
                        false
                    }
                }
            }
            RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY => {
                write_str(data, self.strings.system_dir.as_ref())
            }
            RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY => write_str(data, self.strings.save_dir.as_ref()),
            RETRO_ENVIRONMENT_SET_ROTATION => {
                self.rotation = Rotation::from_raw(*(data as *const c_uint));
                tracing::debug!("Image rotated {}°", self.rotation.degrees());
                true
            }
            RETRO_ENVIRONMENT_GET_VARIABLE => self.variable(data as *mut retro_variable),
            RETRO_ENVIRONMENT_GET_VARIABLE_UPDATE => {
                *(data as *mut bool) = false;
                false
            }
            RETRO_ENVIRONMENT_SET_HW_RENDER => {
                self.set_hw_render(data as *mut retro_hw_render_callback)
            }
            RETRO_ENVIRONMENT_SET_CONTROLLER_INFO => {
                self.controller_info(data as *const retro_controller_info)
            }
            RETRO_ENVIRONMENT_SET_GEOMETRY => {
                self.update_geometry((*(data as *const retro_game_geometry)).into());
                true
            }
            RETRO_ENVIRONMENT_SET_SYSTEM_AV_INFO => {
                let av = *(data as *const retro_system_av_info);
                self.update_geometry(av.geometry.into());
                true
            }
            RETRO_ENVIRONMENT_GET_INPUT_MAX_USERS => {
                *(data as *mut c_uint) = MAX_PORT as c_uint;
                true
            }
            RETRO_ENVIRONMENT_GET_SAVESTATE_CONTEXT => {
                *(data as *mut c_int) = RETRO_SAVESTATE_CONTEXT_NORMAL;
                true
            }
            RETRO_ENVIRONMENT_SET_MESSAGE => {
                let msg = *(data as *const retro_message);
                tracing::debug!(target: "core", "Message: {}", c_str(msg.msg));
                true
            }
            _ => {
                tracing::trace!("Unsupported environment call {}", cmd);
                false
            }
        }
    }

    unsafe fn variable(&self, var: *mut retro_variable) -> bool {
        if (*var).key.is_null() {
            return false;
        }
        let key = CStr::from_ptr((*var).key).to_string_lossy();
        match self.options.get(key.as_ref()) {
            Some(value) => {
                (*var).value = value.as_ptr();
                tracing::debug!("Set {}={}", key, value.to_string_lossy());
                true
            }
            None => {
                (*var).value = std::ptr::null();
                false
            }
        }
    }

    unsafe fn set_hw_render(&mut self, cb: *mut retro_hw_render_callback) -> bool {
        if !self.gl_allowed {
            tracing::debug!("Hardware rendering isn't allowed for this core");
            return false;
        }
        let req = &mut *cb;
        req.get_current_framebuffer = Some(callbacks::get_current_framebuffer);
        req.get_proc_address = Some(callbacks::get_proc_address);

        let hw = HwRender {
            context: ContextType::from_raw(req.context_type),
            context_reset: req.context_reset,
            context_destroy: req.context_destroy,
            depth: req.depth,
            stencil: req.stencil,
            bottom_left_origin: req.bottom_left_origin,
            version_major: req.version_major,
            version_minor: req.version_minor,
        };
        tracing::info!(
            "Hardware render: {:?} {}.{}",
            hw.context,
            hw.version_major,
            hw.version_minor
        );
        self.hw_render = Some(hw);
        true
    }

    unsafe fn controller_info(&mut self, infos: *const retro_controller_info) -> bool {
        if !self.multitap.is_supported() {
            return false;
        }
        for i in 0..MAX_CONTROLLER_INFOS {
            let info = *infos.add(i);
            if info.types.is_null() {
                break;
            }
            for j in 0..info.num_types as usize {
                let desc = *info.types.add(j);
                if c_str(desc.desc) == MULTITAP_DESC {
                    tracing::debug!("Multitap device id {} on port {}", desc.id, i);
                    self.multitap.set_device(desc.id);
                }
            }
        }
        true
    }

    fn update_geometry(&mut self, g: Geometry) {
        let changed = self.geometry.map_or(true, |old| old.differs_from(&g));
        if changed {
            tracing::debug!("Geometry: {}x{}", g.base_width, g.base_height);
        }
        self.geometry_changed |= changed;
        self.geometry = Some(g);
    }
}

unsafe fn write_str(data: *mut c_void, s: Option<&CString>) -> bool {
    match s {
        Some(s) => {
            *(data as *mut *const c_char) = s.as_ptr();
            true
        }
        None => false,
    }
}
