//! Application core: event loop, screen switching, action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use devtrail_core::BackendClient;

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::session::Session;
use crate::theme;
use crate::tui::Tui;

/// Toasts disappear after this long.
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Re-check the credential every this many ticks (~5 s at 4 Hz). The token
/// store may hit the OS keyring, so the check runs on the blocking pool.
const AUTH_POLL_TICKS: u32 = 20;

pub struct App {
    active_screen: ScreenId,
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    client: Arc<BackendClient>,
    profile_name: String,
    /// Whether an access token is present: `admin` vs `guest`.
    authenticated: bool,
    ticks_since_auth_check: u32,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    notification: Option<(Notification, Instant)>,
}

impl App {
    /// Build the app and start the initial events fetch. Must run inside
    /// the tokio runtime.
    pub fn new(session: &Session) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens = create_screens(&session.client, &session.export_dir)
            .into_iter()
            .collect();

        Self {
            active_screen: ScreenId::default(),
            previous_screen: None,
            screens,
            running: true,
            help_visible: false,
            authenticated: session.client.has_token(),
            client: Arc::clone(&session.client),
            profile_name: session.profile_name.clone(),
            ticks_since_auth_check: 0,
            action_tx,
            action_rx,
            notification: None,
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        let mut events = EventReader::new(Duration::from_millis(250), Duration::from_millis(33));
        info!("event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if action == Action::Render {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        info!("event loop ended");
        Ok(())
    }

    /// Global keys first, then the active screen. A screen editing text
    /// gets every key except Ctrl+C.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        let capturing = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input());
        if capturing {
            return self.delegate_key(key);
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => {
                let screen = c
                    .to_digit(10)
                    .and_then(|n| u8::try_from(n).ok())
                    .and_then(ScreenId::from_number);
                if let Some(screen) = screen {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            (KeyModifiers::NONE, KeyCode::Esc) => {
                if self.notification.is_some() {
                    return Ok(Some(Action::DismissNotification));
                }
                return Ok(Some(Action::GoBack));
            }
            _ => {}
        }

        self.delegate_key(key)
    }

    fn delegate_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_key_event(key),
            None => Ok(None),
        }
    }

    fn switch_to(&mut self, target: ScreenId) {
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.previous_screen = Some(self.active_screen);
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::SwitchScreen(target) => self.switch_to(*target),
            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.switch_to(prev);
                }
            }
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), Instant::now()));
            }
            Action::DismissNotification => self.notification = None,
            Action::AuthStatus(authenticated) => {
                if *authenticated != self.authenticated {
                    info!(authenticated, "access token changed");
                    self.authenticated = *authenticated;
                }
            }
            Action::OpenGrid { screen, path, .. } => {
                info!(screen = %screen, %path, "opening grid");
                self.forward(action)?;
                self.switch_to(*screen);
            }
            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.poll_auth();
                self.forward(action)?;
            }
            Action::Render | Action::Resize(..) => {}
        }
        Ok(())
    }

    /// Hand an action to every screen and queue their follow-ups.
    fn forward(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn poll_auth(&mut self) {
        self.ticks_since_auth_check += 1;
        if self.ticks_since_auth_check < AUTH_POLL_TICKS {
            return;
        }
        self.ticks_since_auth_check = 0;
        let client = Arc::clone(&self.client);
        let tx = self.action_tx.clone();
        tokio::task::spawn_blocking(move || {
            // The loop may already be gone; nothing left to update then.
            let _ = tx.send(Action::AuthStatus(client.has_token()));
        });
    }

    fn render(&self, frame: &mut Frame) {
        let layout = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());
        let (content, tabs, status) = (layout[0], layout[1], layout[2]);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content);
        }
        self.render_tab_bar(frame, tabs);
        self.render_status_bar(frame, status);

        if let Some((notification, _)) = &self.notification {
            render_notification(frame, frame.area(), notification);
        }
        if self.help_visible {
            render_help_overlay(frame, frame.area());
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let selected = ScreenId::ALL
            .iter()
            .position(|&s| s == self.active_screen)
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(selected);
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let access = if self.authenticated {
            Span::styled("● admin", Style::default().fg(theme::SUCCESS_GREEN))
        } else {
            Span::styled("○ guest", Style::default().fg(theme::ELECTRIC_YELLOW))
        };
        let line = Line::from(vec![
            Span::raw(" "),
            access,
            Span::styled(
                format!(" │ {} @ {}", self.profile_name, self.client.base_url()),
                theme::tab_inactive(),
            ),
            Span::styled(" │ ? help  Tab switch  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Centered rectangle of at most `width` x `height` inside `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

/// Toast in the bottom-right corner, above the tab and status bars.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let (color, icon) = match notification.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        NotificationLevel::Info => (theme::NEON_CYAN, "·"),
    };

    let len = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = len.saturating_add(6).clamp(20, 80).min(area.width);
    let height = 3u16;
    let toast = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height + 2),
        width,
        height.min(area.height),
    );

    frame.render_widget(Clear, toast);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(toast);
    frame.render_widget(block, toast);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(notification.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    const KEYS: &[(&str, &str)] = &[
        ("1-2 Tab", "Switch screen"),
        ("Esc", "Back / dismiss toast"),
        ("j/k ↑/↓", "Move selection"),
        ("g/G", "Top / bottom"),
        ("h/l ←/→", "Move column cursor"),
        ("/", "Filter cursor column"),
        ("c", "Clear filters"),
        ("s", "Sort cursor column"),
        ("x", "Expand rows"),
        ("e", "Export CSV"),
        ("Enter", "Open device history"),
        ("r", "Reload"),
        ("q", "Quit"),
    ];

    let help = centered(area, 48, u16::try_from(KEYS.len() + 4).unwrap_or(u16::MAX));
    frame.render_widget(Clear, help);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(help);
    frame.render_widget(block, help);

    let mut lines = vec![Line::from("")];
    lines.extend(KEYS.iter().map(|(key, label)| {
        Line::from(vec![
            Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
            Span::styled(*label, theme::key_hint()),
        ])
    }));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Esc or ? to close", theme::key_hint())));
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use devtrail_config::Config;

    use super::*;
    use crate::Cli;

    fn app_with_token() -> App {
        let cli = Cli {
            backend: Some("http://127.0.0.1:9".into()),
            token: Some("secret".into()),
            ..Cli::default()
        };
        let session = Session::resolve_with(&Config::default(), &cli).unwrap();
        App::new(&session)
    }

    #[tokio::test]
    async fn auth_check_reports_back_through_the_action_queue() {
        let mut app = app_with_token();
        app.authenticated = false;
        app.ticks_since_auth_check = AUTH_POLL_TICKS - 1;

        app.process_action(&Action::Tick).unwrap();
        let reply = loop {
            let action = tokio::time::timeout(Duration::from_secs(2), app.action_rx.recv())
                .await
                .unwrap()
                .unwrap();
            if matches!(action, Action::AuthStatus(_)) {
                break action;
            }
        };
        assert_eq!(reply, Action::AuthStatus(true));

        app.process_action(&reply).unwrap();
        assert!(app.authenticated);
    }

    #[tokio::test]
    async fn auth_check_waits_for_the_poll_interval() {
        let mut app = app_with_token();
        app.process_action(&Action::Tick).unwrap();
        assert_eq!(app.ticks_since_auth_check, 1);
        assert!(app.action_rx.try_recv().is_err());
    }

    #[test]
    fn centered_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered(area, 48, 17);
        assert_eq!(rect, Rect::new(26, 11, 48, 17));

        let tiny = centered(Rect::new(0, 0, 10, 5), 48, 17);
        assert!(tiny.width <= 6 && tiny.height <= 3);
    }
}
