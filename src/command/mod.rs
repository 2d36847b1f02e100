//! Line-oriented tuning protocol.
//!
//! Bytes arrive in arbitrary chunks and are accumulated in a bounded
//! [`LineBuffer`]; a `\n` or `\r` completes a line. An over-long line is
//! discarded whole at its terminator and answered with a hint; it is never
//! buffered without bound nor executed in part. Each complete line is parsed
//! ([`parse_line`]) and dispatched against the [`SettingsStore`]; every reply
//! is a list of text lines for the channel.
//!
//! Mutations go through the settings setters (clamping) and echo the
//! effective values. `set`, `crop` and `autosave` persist immediately when
//! autosave is on.

pub mod parser;

pub use parser::{parse_line, Command, ParseError, SetKey};

use crate::error::SettingsError;
use crate::settings::{CropSide, DisplaySize, KeyValueStore, Settings, SettingsStore};
use crate::types::DisplayMode;
use log::{debug, warn};

pub const DEFAULT_LINE_CAPACITY: usize = 64;

/// What a terminator byte produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    Line(String),
    /// The line outgrew the buffer and was thrown away.
    Overflow { dropped: usize },
}

/// Fixed-capacity accumulator for one protocol line.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    capacity: usize,
    dropped: usize,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Push one byte; a terminator yields the finished line, if any.
    pub fn push(&mut self, byte: u8) -> Option<LineEvent> {
        match byte {
            b'\n' | b'\r' => {
                let dropped = std::mem::take(&mut self.dropped);
                if dropped > 0 {
                    debug!("line discarded, {dropped} bytes over capacity");
                    self.buf.clear();
                    return Some(LineEvent::Overflow { dropped });
                }
                if self.buf.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                self.buf.clear();
                Some(LineEvent::Line(line))
            }
            _ if self.dropped == 0 && self.buf.len() < self.capacity => {
                self.buf.push(byte);
                None
            }
            _ => {
                self.dropped += 1;
                None
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_CAPACITY)
    }
}

/// Process state the protocol can report on but does not own.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandContext {
    pub mode: DisplayMode,
    /// Debounced level of the mode-toggle input.
    pub input_pressed: bool,
}

#[derive(Debug, Default)]
pub struct CommandProcessor {
    line: LineBuffer,
}

impl CommandProcessor {
    pub fn new(line_capacity: usize) -> Self {
        Self {
            line: LineBuffer::new(line_capacity),
        }
    }

    /// Feed raw channel bytes; returns the replies for every completed line.
    pub fn feed<S: KeyValueStore>(
        &mut self,
        bytes: &[u8],
        store: &mut SettingsStore<S>,
        ctx: &CommandContext,
    ) -> Vec<String> {
        let mut replies = Vec::new();
        for &b in bytes {
            match self.line.push(b) {
                Some(LineEvent::Line(line)) => {
                    replies.extend(self.handle_line(&line, store, ctx));
                }
                Some(LineEvent::Overflow { .. }) => replies.push(format!(
                    "line too long (max {} bytes), ignored",
                    self.line.capacity()
                )),
                None => {}
            }
        }
        replies
    }

    /// Parse and execute one complete line.
    pub fn handle_line<S: KeyValueStore>(
        &self,
        line: &str,
        store: &mut SettingsStore<S>,
        ctx: &CommandContext,
    ) -> Vec<String> {
        match parse_line(line) {
            Ok(cmd) => {
                debug!("command {:?}", cmd);
                execute(cmd, store, ctx)
            }
            Err(ParseError::Empty) => Vec::new(),
            Err(err) => vec![err.to_string()],
        }
    }
}

fn execute<S: KeyValueStore>(
    cmd: Command,
    store: &mut SettingsStore<S>,
    ctx: &CommandContext,
) -> Vec<String> {
    let display = store.display();
    match cmd {
        Command::Help => help_lines(display.width, display.height),
        Command::Show => vec![format!("{} mode={}", store.settings(), ctx.mode)],
        Command::Save => match store.save() {
            Ok(()) => vec!["saved".to_string()],
            Err(err) => {
                warn!("save failed: {err}");
                vec![format!("save failed: {err}")]
            }
        },
        Command::Defaults => {
            let persist = Settings::default().auto_save;
            let outcome = store.reset_to_defaults(persist).map(|()| persist);
            let echo = format!("defaults restored: {}", store.settings());
            vec![with_persist_note(echo, outcome)]
        }
        Command::Ping => vec!["pong".to_string()],
        Command::PingInput => vec![format!(
            "pong in={} mode={}",
            if ctx.input_pressed { "pressed" } else { "released" },
            ctx.mode
        )],
        Command::AutoSave(on) => {
            let outcome = store.update(|s, _| s.set_auto_save(on));
            let state = if store.settings().auto_save { "on" } else { "off" };
            let echo = format!("autosave={state}");
            vec![with_persist_note(echo, outcome)]
        }
        Command::Set(key, value) => {
            let outcome = store.update(|s, d| match key {
                SetKey::Offset => s.set_threshold_offset(value, d),
                SetKey::MinArea => s.set_min_area(value, d),
                SetKey::MaxArea => s.set_max_area(value, d),
            });
            let s = store.settings();
            let echo = match key {
                SetKey::Offset => format!("offset={}", s.threshold_offset),
                SetKey::MinArea | SetKey::MaxArea => {
                    format!("min={} max={}", s.min_area, s.max_area)
                }
            };
            vec![with_persist_note(echo, outcome)]
        }
        Command::Crop(side, value) => {
            let outcome = store.update(|s, d| s.set_crop(side, value, d));
            vec![with_persist_note(crop_echo(store.settings(), display), outcome)]
        }
    }
}

fn crop_echo(s: &Settings, display: DisplaySize) -> String {
    let (w, h) = s.roi_size(display);
    format!(
        "crop l={} r={} t={} b={} roi={}x{}",
        s.crop(CropSide::Left),
        s.crop(CropSide::Right),
        s.crop(CropSide::Top),
        s.crop(CropSide::Bottom),
        w,
        h
    )
}

fn with_persist_note(echo: String, outcome: Result<bool, SettingsError>) -> String {
    match outcome {
        Ok(_) => echo,
        Err(err) => {
            warn!("persisting settings failed: {err}");
            format!("{echo} (save failed: {err})")
        }
    }
}

fn help_lines(width: usize, height: usize) -> Vec<String> {
    vec![
        "commands:".to_string(),
        "  help | show | save | defaults | ping [in]".to_string(),
        "  autosave on|off".to_string(),
        "  set offset <0..80>".to_string(),
        "  set min <1..60000>".to_string(),
        "  set max <(min+1)..60000>".to_string(),
        format!(
            "  crop l|r <0..{}>  crop t|b <0..{}>",
            width.saturating_sub(1),
            height.saturating_sub(1)
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;

    const DISPLAY: DisplaySize = DisplaySize::new(240, 240);

    fn store() -> SettingsStore<MemoryStore> {
        SettingsStore::new(MemoryStore::new(), DISPLAY)
    }

    fn run(
        proc: &mut CommandProcessor,
        store: &mut SettingsStore<MemoryStore>,
        text: &str,
    ) -> Vec<String> {
        proc.feed(text.as_bytes(), store, &CommandContext::default())
    }

    #[test]
    fn set_max_below_min_echoes_clamped_value() {
        let mut s = store();
        let mut p = CommandProcessor::default();
        let replies = run(&mut p, &mut s, "set max 10\n");
        assert_eq!(replies, vec!["min=45 max=46".to_string()]);
        assert_eq!(s.settings().max_area, 46);
    }

    #[test]
    fn crop_far_left_keeps_roi_non_empty() {
        let mut s = store();
        let mut p = CommandProcessor::default();
        let replies = run(&mut p, &mut s, "crop l 239\n");
        assert_eq!(replies, vec!["crop l=238 r=0 t=0 b=0 roi=2x240".to_string()]);
    }

    #[test]
    fn lines_may_arrive_in_fragments() {
        let mut s = store();
        let mut p = CommandProcessor::default();
        assert!(run(&mut p, &mut s, "set off").is_empty());
        assert!(run(&mut p, &mut s, "set 1").is_empty());
        let replies = run(&mut p, &mut s, "5\r\n");
        assert_eq!(replies, vec!["offset=15".to_string()]);
    }

    #[test]
    fn malformed_set_does_not_mutate() {
        let mut s = store();
        let mut p = CommandProcessor::default();
        let before = s.settings().clone();
        let replies = run(&mut p, &mut s, "set min\ncrop t\n");
        assert_eq!(
            replies,
            vec![parser::SET_USAGE.to_string(), parser::CROP_USAGE.to_string()]
        );
        assert_eq!(s.settings(), &before);
        assert_eq!(s.backend().commits(), 0);
    }

    #[test]
    fn unknown_verb_gets_hint() {
        let mut s = store();
        let mut p = CommandProcessor::default();
        let replies = run(&mut p, &mut s, "FOO\n");
        assert_eq!(replies, vec!["unknown command 'foo', try 'help'".to_string()]);
    }

    #[test]
    fn autosave_controls_persistence_of_mutations() {
        let mut s = store();
        let mut p = CommandProcessor::default();
        run(&mut p, &mut s, "set offset 20\n");
        assert_eq!(s.backend().commits(), 1);

        let replies = run(&mut p, &mut s, "autosave off\n");
        assert_eq!(replies, vec!["autosave=off".to_string()]);
        run(&mut p, &mut s, "set offset 30\ncrop r 5\n");
        assert_eq!(s.backend().commits(), 1);
        assert_eq!(s.backend().get_i32("offset"), Some(20));

        let replies = run(&mut p, &mut s, "save\n");
        assert_eq!(replies, vec!["saved".to_string()]);
        assert_eq!(s.backend().get_i32("offset"), Some(30));
        assert_eq!(s.backend().get_bool("auto"), Some(false));
    }

    #[test]
    fn show_includes_mode_and_ping_reports_input() {
        let mut s = store();
        let p = CommandProcessor::default();
        let ctx = CommandContext {
            mode: DisplayMode::Mask,
            input_pressed: true,
        };
        let show = p.handle_line("show", &mut s, &ctx);
        assert_eq!(
            show,
            vec!["offset=40 min=45 max=900 crop l=0 r=0 t=0 b=0 autosave=on mode=MASK".to_string()]
        );
        assert_eq!(p.handle_line("ping", &mut s, &ctx), vec!["pong".to_string()]);
        assert_eq!(
            p.handle_line("PING IN", &mut s, &ctx),
            vec!["pong in=pressed mode=MASK".to_string()]
        );
    }

    #[test]
    fn defaults_restores_and_persists() {
        let mut s = store();
        let mut p = CommandProcessor::default();
        run(&mut p, &mut s, "autosave off\nset min 100\n");
        let replies = run(&mut p, &mut s, "defaults\n");
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("defaults restored: offset=40 min=45 max=900"));
        assert_eq!(s.backend().get_i32("minA"), Some(45));
    }

    #[test]
    fn overlong_line_is_discarded_whole() {
        let mut line = LineBuffer::new(8);
        for &b in b"set offset 5" {
            assert!(line.push(b).is_none());
        }
        assert_eq!(line.pending(), 8);
        assert_eq!(line.push(b'\n'), Some(LineEvent::Overflow { dropped: 4 }));
        assert_eq!(line.pending(), 0);
        for &b in b"ping" {
            assert!(line.push(b).is_none());
        }
        assert_eq!(line.push(b'\r'), Some(LineEvent::Line("ping".to_string())));
    }

    #[test]
    fn overlong_command_does_not_mutate() {
        let mut s = store();
        let mut p = CommandProcessor::default();
        let text = format!("set max{}60000\nshow\n", " ".repeat(56));
        let replies = run(&mut p, &mut s, &text);
        assert_eq!(replies[0], "line too long (max 64 bytes), ignored");
        assert!(replies[1].contains("max=900"));
        assert_eq!(s.settings().max_area, 900);
        assert_eq!(s.backend().commits(), 0);
    }

    #[test]
    fn help_lists_crop_range_for_display() {
        let mut s = store();
        let p = CommandProcessor::default();
        let lines = p.handle_line("help", &mut s, &CommandContext::default());
        assert!(lines.iter().any(|l| l.contains("crop l|r <0..239>")));
        assert!(lines.iter().any(|l| l.contains("autosave on|off")));
    }
}
