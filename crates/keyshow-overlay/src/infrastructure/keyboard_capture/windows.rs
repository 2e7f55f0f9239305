//! Windows low-level keyboard hook implementation.
//!
//! This module installs a `WH_KEYBOARD_LL` hook using the Windows API on a
//! dedicated Win32 message-loop thread. The hook procedure hands every
//! transition to the active [`TransitionProcessor`] and always forwards the
//! event with `CallNextHookEx`.
//!
//! Live modifier state comes from `GetAsyncKeyState`; layout-dependent key
//! text comes from `ToUnicodeEx` against the foreground keyboard layout.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use keyshow_core::keymap::vk;
use keyshow_core::{LayoutError, LayoutResolver, Modifier, Modifiers, Transition};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyboardLayout, GetKeyboardState, MapVirtualKeyW, ToUnicodeEx,
    MAPVK_VK_TO_VSC,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetForegroundWindow, GetMessageW, GetWindowThreadProcessId,
    PostThreadMessageW, SetWindowsHookExW, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, MSG,
    WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN, WM_SYSKEYUP,
};

use super::processor::TransitionProcessor;
use super::{KeyEventReceiver, KeyStateError, KeyboardListener, KeyboardState, ListenerError};

/// `ToUnicodeEx` flag: do not change the keyboard's dead-key state.
const TO_UNICODE_NO_STATE_CHANGE: u32 = 0x4;

/// High bit of `GetAsyncKeyState`: the key is down right now.
const KEY_DOWN_BIT: i16 = i16::MIN;

type WindowsProcessor = TransitionProcessor<WindowsKeyboardState>;

/// Processor used by the hook procedure. `None` while no hook is installed.
///
/// Hook procedures receive no user data, so this is the one global the
/// listener needs. Only one listener can own it at a time.
static ACTIVE_PROCESSOR: Mutex<Option<Arc<WindowsProcessor>>> = Mutex::new(None);

fn active_processor() -> MutexGuard<'static, Option<Arc<WindowsProcessor>>> {
    ACTIVE_PROCESSOR.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live keyboard state read through `GetAsyncKeyState` and `ToUnicodeEx`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsKeyboardState;

fn key_is_down(code: u32) -> bool {
    // SAFETY: GetAsyncKeyState has no preconditions.
    let state = unsafe { GetAsyncKeyState(code as i32) };
    state & KEY_DOWN_BIT != 0
}

impl KeyboardState for WindowsKeyboardState {
    fn live_modifiers(&self) -> Result<Modifiers, KeyStateError> {
        let mut modifiers = Modifiers::NONE;
        if key_is_down(vk::VK_CONTROL) {
            modifiers = modifiers.with(Modifier::Control);
        }
        if key_is_down(vk::VK_MENU) {
            modifiers = modifiers.with(Modifier::Alt);
        }
        if key_is_down(vk::VK_SHIFT) {
            modifiers = modifiers.with(Modifier::Shift);
        }
        Ok(modifiers)
    }
}

impl LayoutResolver for WindowsKeyboardState {
    fn resolve(&self, code: u32, modifiers: Modifiers) -> Result<Option<String>, LayoutError> {
        let mut key_state = [0u8; 256];
        // SAFETY: the buffer is exactly the 256 bytes GetKeyboardState writes.
        unsafe { GetKeyboardState(&mut key_state) }
            .map_err(|e| LayoutError(format!("GetKeyboardState: {e}")))?;

        // The hook thread's own key state is stale; overlay the live modifiers.
        for (vk_code, modifier) in [
            (vk::VK_SHIFT, Modifier::Shift),
            (vk::VK_CONTROL, Modifier::Control),
            (vk::VK_MENU, Modifier::Alt),
        ] {
            key_state[vk_code as usize] = if modifiers.contains(modifier) { 0x80 } else { 0 };
        }

        // SAFETY: plain Win32 queries without pointer arguments.
        let layout = unsafe {
            let thread = GetWindowThreadProcessId(GetForegroundWindow(), None);
            GetKeyboardLayout(thread)
        };
        // SAFETY: MapVirtualKeyW has no preconditions.
        let scan_code = unsafe { MapVirtualKeyW(code, MAPVK_VK_TO_VSC) };

        let mut buffer = [0u16; 8];
        // SAFETY: both buffers are valid for the lengths passed with them.
        let written = unsafe {
            ToUnicodeEx(
                code,
                scan_code,
                &key_state,
                &mut buffer,
                TO_UNICODE_NO_STATE_CHANGE,
                Some(layout),
            )
        };

        if written <= 0 {
            // 0: no translation, negative: dead key.
            return Ok(None);
        }
        let len = (written as usize).min(buffer.len());
        Ok(Some(String::from_utf16_lossy(&buffer[..len])))
    }
}

struct HookThread {
    thread_id: u32,
    handle: JoinHandle<()>,
}

/// Windows low-level keyboard listener.
///
/// Installs a `WH_KEYBOARD_LL` hook and runs a dedicated Win32 message loop
/// thread for it.
pub struct WindowsKeyboardListener {
    hook_thread: Mutex<Option<HookThread>>,
}

impl WindowsKeyboardListener {
    /// Creates a new (unstarted) listener.
    pub fn new() -> Self {
        Self {
            hook_thread: Mutex::new(None),
        }
    }

    fn lock_hook_thread(&self) -> MutexGuard<'_, Option<HookThread>> {
        self.hook_thread.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WindowsKeyboardListener {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardListener for WindowsKeyboardListener {
    fn start(&self) -> Result<KeyEventReceiver, ListenerError> {
        let mut hook_thread = self.lock_hook_thread();
        if hook_thread.is_some() {
            return Err(ListenerError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut active = active_processor();
            if active.is_some() {
                return Err(ListenerError::HookInstallFailed(
                    "another keyboard listener owns the hook".to_string(),
                ));
            }
            *active = Some(Arc::new(TransitionProcessor::new(WindowsKeyboardState, tx)));
        }

        // The loop thread reports its thread id once the hook is installed.
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<u32, String>>();
        let spawned = thread::Builder::new()
            .name("keyshow-hook-loop".to_string())
            .spawn(move || run_hook_message_loop(ready_tx));

        let installed = match spawned {
            Ok(handle) => match ready_rx.recv() {
                Ok(Ok(thread_id)) => Ok(HookThread { thread_id, handle }),
                Ok(Err(reason)) => {
                    let _ = handle.join();
                    Err(reason)
                }
                Err(_) => {
                    let _ = handle.join();
                    Err("hook thread exited before reporting".to_string())
                }
            },
            Err(e) => Err(e.to_string()),
        };

        match installed {
            Ok(thread) => {
                info!(thread_id = thread.thread_id, "keyboard hook installed");
                *hook_thread = Some(thread);
                Ok(rx)
            }
            Err(reason) => {
                active_processor().take();
                Err(ListenerError::HookInstallFailed(reason))
            }
        }
    }

    fn stop(&self) {
        let Some(thread) = self.lock_hook_thread().take() else {
            return;
        };

        // Detach the processor first: from here on nothing is emitted and the
        // event channel closes.
        active_processor().take();

        // SAFETY: posting WM_QUIT to a thread we own; failure means it already exited.
        if let Err(e) = unsafe { PostThreadMessageW(thread.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
            debug!("WM_QUIT post failed (hook thread already gone?): {e}");
        }
        if thread.handle.join().is_err() {
            warn!("keyboard hook thread panicked");
        }
        info!("keyboard hook removed");
    }

    fn is_running(&self) -> bool {
        self.lock_hook_thread().is_some()
    }
}

impl Drop for WindowsKeyboardListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Entry point for the dedicated Win32 message loop thread.
fn run_hook_message_loop(ready: std_mpsc::Sender<Result<u32, String>>) {
    // SAFETY: SetWindowsHookExW requires the calling thread to pump messages,
    // which the loop below does until WM_QUIT.
    let hook = unsafe {
        GetModuleHandleW(None).and_then(|module| {
            SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), Some(module.into()), 0)
        })
    };
    let hook = match hook {
        Ok(hook) => hook,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };
    let _ = ready.send(Ok(thread_id));

    let mut msg = MSG::default();
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            DispatchMessageW(&msg);
        }
        // Removal errors are not fatal: the hook may already be gone.
        if let Err(e) = UnhookWindowsHookEx(hook) {
            debug!("UnhookWindowsHookEx failed: {e}");
        }
    }
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// Called by Windows on the hook message loop thread. It must return quickly
/// and must never unwind.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 {
        // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
        let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);

        let transition = match w_param.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => Some(Transition::Down),
            WM_KEYUP | WM_SYSKEYUP => Some(Transition::Up),
            _ => None,
        };

        if let Some(transition) = transition {
            let processor = active_processor().clone();
            if let Some(processor) = processor {
                // The disposition is always pass-through; it is honoured below.
                let _ = processor.process(kbs.vkCode, transition);
            }
        }
    }

    // SAFETY: Forward the event to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}
