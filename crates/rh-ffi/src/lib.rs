//! Libretro core hosting: ABI, loader, environment and callback bridge
//!
//! Cores keep process-global state and their callbacks carry no context
//! pointer, so a process hosts one core at a time through [`HOST`].

pub mod abi;
pub mod call_thread;
pub mod callbacks;
pub mod context;
pub mod environment;
pub mod loader;
pub mod log;

pub use call_thread::CallThread;
pub use context::{HostContext, HostReservation, RawFrame, VideoRefresh, VideoSink, HOST};
pub use environment::{Environment, HwRender};
pub use loader::{CoreFns, CoreHandle, LibraryResolver, LIB_EXT};

#[cfg(test)]
pub(crate) static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
