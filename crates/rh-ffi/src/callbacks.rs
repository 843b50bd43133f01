//! `extern "C"` entry points handed to the core

use crate::abi::*;
use crate::context::{RawFrame, VideoRefresh, HOST};
use crate::loader::CoreFns;
use rh_input::InputQuery;
use rh_video::FrameInfo;
use std::ffi::{c_char, c_uint, c_void, CStr};

/// Registers the host callbacks with a core, environment first so the core
/// can negotiate from inside the other setters.
///
/// # Safety
/// `fns` must come from a core that hasn't been deinitialized.
pub unsafe fn install(fns: &CoreFns) {
    (fns.set_environment)(environment);
    (fns.set_video_refresh)(video_refresh);
    (fns.set_input_poll)(input_poll);
    (fns.set_input_state)(input_state);
    (fns.set_audio_sample)(audio_sample);
    (fns.set_audio_sample_batch)(audio_sample_batch);
}

pub unsafe extern "C" fn environment(cmd: c_uint, data: *mut c_void) -> bool {
    HOST.env.lock().handle(cmd, data)
}

pub unsafe extern "C" fn video_refresh(data: *const c_void, width: c_uint, height: c_uint, pitch: usize) {
    let host = &*HOST;
    if host.is_stopped() {
        return;
    }
    let duration = host.frame_duration();
    let (format, transform) = {
        let env = host.env.lock();
        (env.pixel_format(), env.transform())
    };

    if data.is_null() {
        host.with_video_sink(|sink| {
            sink(VideoRefresh {
                frame: RawFrame::Dup,
                format,
                transform,
                duration,
            })
        });
        return;
    }

    let stride = if pitch == 0 {
        width as usize * format.bpp()
    } else {
        pitch
    };
    // the last row may stop right after its pixels
    let len = match height as usize {
        0 => 0,
        h => stride * (h - 1) + width as usize * format.bpp(),
    };
    let info = FrameInfo::new(width, height, stride);

    if data == RETRO_HW_FRAME_BUFFER_VALID {
        let Some(gfx) = host.graphics() else {
            tracing::warn!("Hardware frame without a graphics context");
            return;
        };
        let bytes = gfx.read_framebuffer(width, height, len);
        host.with_video_sink(|sink| {
            sink(VideoRefresh {
                frame: RawFrame::Data { bytes: &bytes, info },
                format,
                transform,
                duration,
            })
        });
        return;
    }

    let bytes = std::slice::from_raw_parts(data as *const u8, len);
    host.with_video_sink(|sink| {
        sink(VideoRefresh {
            frame: RawFrame::Data { bytes, info },
            format,
            transform,
            duration,
        })
    });
}

pub unsafe extern "C" fn input_poll() {}

pub unsafe extern "C" fn input_state(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16 {
    InputQuery::new(port, device, index, id).respond(&HOST.input)
}

pub unsafe extern "C" fn audio_sample(left: i16, right: i16) {
    if HOST.is_stopped() {
        return;
    }
    HOST.audio.push_sample(left, right);
}

pub unsafe extern "C" fn audio_sample_batch(data: *const i16, frames: usize) -> usize {
    if HOST.is_stopped() || data.is_null() {
        return frames;
    }
    let samples = std::slice::from_raw_parts(data, frames << 1);
    HOST.audio.push_batch(samples)
}

pub unsafe extern "C" fn get_current_framebuffer() -> usize {
    HOST.graphics().map_or(0, |g| g.current_framebuffer())
}

pub unsafe extern "C" fn get_proc_address(sym: *const c_char) -> Option<retro_proc_address_t> {
    if sym.is_null() {
        return None;
    }
    let name = CStr::from_ptr(sym).to_string_lossy();
    let addr = HOST.graphics().map_or(0, |g| g.proc_address(&name));
    if addr == 0 {
        return None;
    }
    Some(std::mem::transmute::<usize, retro_proc_address_t>(addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VideoSink;
    use parking_lot::Mutex;
    use rh_input::DEVICE_JOYPAD;
    use rh_video::{GraphicsContext, NullContext, PixelFormat};
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    enum Seen {
        Dup,
        Data(usize, FrameInfo),
    }

    fn recorder() -> (Arc<Mutex<Vec<Seen>>>, VideoSink) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let out = seen.clone();
        let sink: VideoSink = Box::new(move |r: VideoRefresh<'_>| {
            out.lock().push(match r.frame {
                RawFrame::Dup => Seen::Dup,
                RawFrame::Data { bytes, info } => Seen::Data(bytes.len(), info),
            })
        });
        (seen, sink)
    }

    #[test]
    fn test_callbacks_through_host() {
        let _guard = crate::TEST_LOCK.lock();
        let reservation = HOST.reserve().unwrap();
        let (seen, sink) = recorder();
        HOST.set_video_sink(Some(sink));

        let mut raw: c_uint = PixelFormat::Rgb565.raw();
        assert!(unsafe { environment(RETRO_ENVIRONMENT_SET_PIXEL_FORMAT, &mut raw as *mut _ as _) });

        let pixels = vec![0u8; 8 * 4 * 2];
        // stopped host drops frames
        unsafe { video_refresh(pixels.as_ptr() as _, 8, 4, 0) };
        assert!(seen.lock().is_empty());

        HOST.set_stopped(false);
        unsafe {
            video_refresh(pixels.as_ptr() as _, 8, 4, 0);
            video_refresh(std::ptr::null(), 8, 4, 0);
        }
        assert_eq!(
            *seen.lock(),
            vec![Seen::Data(64, FrameInfo::new(8, 4, 16)), Seen::Dup]
        );

        HOST.input.set_input(2, &[0b10, 0]);
        assert_eq!(unsafe { input_state(2, DEVICE_JOYPAD, 0, 1) }, 1);
        assert_eq!(unsafe { input_state(2, DEVICE_JOYPAD, 0, 0) }, 0);

        let rx = HOST.audio.subscribe(4);
        let samples = [1i16, 2, 3, 4, 5, 6];
        assert_eq!(unsafe { audio_sample_batch(samples.as_ptr(), 3) }, 3);
        unsafe { audio_sample(7, 8) };
        assert_eq!(rx.try_recv().unwrap().samples, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(rx.try_recv().unwrap().samples, vec![7, 8]);

        drop(reservation);
    }

    #[test]
    fn test_hardware_frame_readback() {
        let _guard = crate::TEST_LOCK.lock();
        let reservation = HOST.reserve().unwrap();
        let (seen, sink) = recorder();
        HOST.set_video_sink(Some(sink));
        let gfx = Arc::new(NullContext::new());
        HOST.set_graphics(Some(gfx.clone() as Arc<dyn GraphicsContext>));
        HOST.set_stopped(false);

        unsafe { video_refresh(RETRO_HW_FRAME_BUFFER_VALID, 4, 2, 0) };
        assert_eq!(gfx.read_count(), 1);
        // default pixel format is 0RGB1555, 2 bytes per pixel
        assert_eq!(*seen.lock(), vec![Seen::Data(16, FrameInfo::new(4, 2, 8))]);
        assert!(unsafe { get_proc_address(c"glClear".as_ptr()) }.is_none());

        drop(reservation);
        assert!(HOST.graphics().is_none());
    }
}
