use parts_counter::config::load_runtime_config;
use parts_counter::pipeline::{CommandChannel, Controller, ImageSequenceSource, PeriodicToggle};
use parts_counter::render::CanvasRenderer;
use parts_counter::settings::{JsonFileStore, SettingsStore};
use std::env;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// Non-blocking view of stdin (fed by a reader thread) plus stdout.
struct StdioChannel {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    open: bool,
}

impl StdioChannel {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut stdin = io::stdin();
            let mut buf = [0u8; 256];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self {
            rx,
            pending: Vec::new(),
            open: true,
        }
    }
}

impl CommandChannel for StdioChannel {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        if self.pending.is_empty() {
            match self.rx.try_recv() {
                Ok(bytes) => self.pending = bytes,
                Err(TryRecvError::Empty) => return 0,
                Err(TryRecvError::Disconnected) => {
                    self.open = false;
                    return 0;
                }
            }
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        n
    }

    fn write_line(&mut self, line: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    fn is_open(&self) -> bool {
        self.open || !self.pending.is_empty()
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_runtime_config(Path::new(&config_path))?;
    let display = config.processing.display;

    let backend = JsonFileStore::open(&config.settings_path).map_err(|e| {
        format!(
            "Failed to open settings {}: {e}",
            config.settings_path.display()
        )
    })?;
    let mut store = SettingsStore::new(backend, display);
    store.load();

    let mut controller = Controller::new(
        config.controller_params(),
        ImageSequenceSource::new(config.frames.clone(), config.frame_buffers),
        CanvasRenderer::new(display.width as u32, display.height as u32),
        StdioChannel::spawn(),
        PeriodicToggle::new(config.mode_toggle_every),
        store,
    );

    if let Err(err) = controller.start() {
        if let Some(dir) = &config.render_dir {
            controller.renderer().save_png(&dir.join("view.png"))?;
        }
        return Err(err.to_string());
    }

    controller.run(config.max_cycles);

    if let Some(dir) = &config.render_dir {
        let path = dir.join("view.png");
        controller.renderer().save_png(&path)?;
        println!("Saved last view to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: parts_counter <runtime.json>".to_string()
}
