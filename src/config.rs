//! User configuration — endpoint, timings, keybindings and persistence.
//!
//! Stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/lazy-view/config.toml` (default `~/.config/lazy-view/config.toml`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";
pub const DEFAULT_QUERY: &str = "{ humans }";

// ───────────────────────────────────────── actions ───────────

/// Everything a key can be bound to outside of query editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NextRoute,
    PrevRoute,
    Reload,
    EditQuery,
    RunQuery,
    SwitchPane,
    Quit,
}

impl Action {
    pub const ALL: &[Action] = &[
        Action::NextRoute,
        Action::PrevRoute,
        Action::Reload,
        Action::EditQuery,
        Action::RunQuery,
        Action::SwitchPane,
        Action::Quit,
    ];

    fn config_key(self) -> &'static str {
        match self {
            Action::NextRoute => "next_route",
            Action::PrevRoute => "prev_route",
            Action::Reload => "reload",
            Action::EditQuery => "edit_query",
            Action::RunQuery => "run_query",
            Action::SwitchPane => "switch_pane",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Only CTRL/ALT are compared; SHIFT is already folded into `Char`.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Short label for the status bar (e.g. `"Tab"`, `"Ctrl+r"`, `"→"`).
    pub fn display(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Parse `"Ctrl+r"`, `"Right"`, `"q"`, `"Tab"`, `"F5"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let (key_part, mods) = parts.split_last()?;

        for part in mods {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "space" => KeyCode::Char(' '),
            k if k.starts_with('f') && k.len() > 1 => KeyCode::F(k[1..].parse().ok()?),
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── config ────────────

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// GraphQL endpoint queried by the query pane.
    pub endpoint: String,
    /// Simulated fetch time for a route page.
    pub page_delay_ms: u64,
    /// Per-request timeout for GraphQL queries.
    pub query_timeout_ms: u64,
    /// UI tick; completions are picked up at least this often.
    pub tick_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_delay_ms: 600,
            query_timeout_ms: 5_000,
            tick_ms: 80,
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(NextRoute, vec![KeyBind::new(Right, n), KeyBind::new(Char('l'), n)]);
        m.insert(PrevRoute, vec![KeyBind::new(Left, n), KeyBind::new(Char('h'), n)]);
        m.insert(Reload, vec![KeyBind::new(Char('r'), n), KeyBind::new(F(5), n)]);
        m.insert(EditQuery, vec![KeyBind::new(Char('e'), n)]);
        m.insert(RunQuery, vec![KeyBind::new(Enter, n)]);
        m.insert(SwitchPane, vec![KeyBind::new(Tab, n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        Action::ALL.iter().copied().find(|action| {
            self.bindings
                .get(action)
                .is_some_and(|binds| binds.iter().any(|b| b.matches(event)))
        })
    }

    pub fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: route | {}: reload | {}: focus | {}: edit query | {}: quit",
            self.short_binding(Action::PrevRoute),
            self.short_binding(Action::NextRoute),
            self.short_binding(Action::Reload),
            self.short_binding(Action::SwitchPane),
            self.short_binding(Action::EditQuery),
            self.short_binding(Action::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Self::parse(&contents)
            }
            Err(_) => Self::default(),
        }
    }

    /// Parse `key = value` lines.  Unknown keys and bad values are skipped.
    pub fn parse(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "endpoint" => {
                    let endpoint = value.trim_matches('"');
                    if !endpoint.is_empty() {
                        config.endpoint = endpoint.to_string();
                    }
                    continue;
                }
                "page_delay_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.page_delay_ms = v.min(30_000);
                    }
                    continue;
                }
                "query_timeout_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.query_timeout_ms = v.clamp(100, 120_000);
                    }
                    continue;
                }
                "tick_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.tick_ms = v.clamp(16, 1_000);
                    }
                    continue;
                }
                _ => {}
            }

            let Some(action) = Action::from_config_key(key) else {
                tracing::debug!(key, "unknown config key");
                continue;
            };

            let parsed: Vec<KeyBind> = value
                .split(',')
                .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                .collect();
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/lazy-view/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("lazy-view").join("config.toml")
}
