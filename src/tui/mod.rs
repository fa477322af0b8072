//! Ratatui-based terminal UI.
//!
//! Two tabs: the model registry (browse models, fill the prediction form, predict)
//! and the upload form (name, files, inline feature rows). API failures never
//! close the UI; they land in the result pane and the status bar.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

use crate::api::{ApiBody, ModelApiClient};
use crate::app::workflow::{self, LoadedModel};
use crate::config::ApiConfig;
use crate::domain::{FeatureKind, ModelId};
use crate::error::AppError;
use crate::form::UploadForm;

mod state;

use state::{EditTarget, Editing, ResultView, UploadField};

/// Start the TUI.
pub fn run(config: &ApiConfig) -> Result<(), AppError> {
    let client = ModelApiClient::new(config)?;
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(client);
    app.refresh_models();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Registry,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Models,
    Features,
}

struct App {
    client: ModelApiClient,
    tab: Tab,
    status: String,
    editing: Option<Editing>,

    models: Vec<ModelId>,
    model_idx: usize,
    focus: Focus,
    loaded: Option<LoadedModel>,
    feature_idx: usize,
    predict_result: Option<ResultView>,

    upload: UploadForm,
    upload_idx: usize,
    upload_result: Option<ResultView>,
}

impl App {
    fn new(client: ModelApiClient) -> Self {
        let status = format!("API: {}", client.base_url());
        Self {
            client,
            tab: Tab::Registry,
            status,
            editing: None,
            models: Vec::new(),
            model_idx: 0,
            focus: Focus::Models,
            loaded: None,
            feature_idx: 0,
            predict_result: None,
            upload: UploadForm::new(),
            upload_idx: 0,
            upload_result: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_edit_key(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.tab = match self.tab {
                    Tab::Registry => Tab::Upload,
                    Tab::Upload => Tab::Registry,
                };
            }
            _ => match self.tab {
                Tab::Registry => self.handle_registry_key(code),
                Tab::Upload => self.handle_upload_key(code),
            },
        }
        false
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(editing) = self.editing.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                if let Some(editing) = self.editing.take() {
                    self.commit_edit(editing);
                }
            }
            KeyCode::Backspace => {
                editing.buffer.pop();
            }
            KeyCode::Char(c) => editing.buffer.push(c),
            _ => {}
        }
    }

    fn commit_edit(&mut self, editing: Editing) {
        let text = editing.buffer;
        match editing.target {
            EditTarget::FeatureValue(idx) => {
                let Some(loaded) = self.loaded.as_mut() else {
                    return;
                };
                match loaded.form.set_at(idx, &text) {
                    Ok(()) => self.status = format!("{} updated.", loaded.form.features()[idx].name),
                    Err(err) => self.status = err.to_string(),
                }
            }
            EditTarget::Upload(field) => match state::apply_upload_edit(&mut self.upload, field, &text) {
                Ok(()) => self.status = format!("{} updated.", field.label()),
                Err(msg) => self.status = msg,
            },
        }
    }

    fn begin_edit(&mut self, target: EditTarget, current: String) {
        self.status = format!("Editing {}. Enter to apply, Esc to cancel.", target.label(self));
        self.editing = Some(Editing {
            target,
            buffer: current,
        });
    }

    fn handle_registry_key(&mut self, code: KeyCode) {
        match (self.focus, code) {
            (_, KeyCode::Char('r')) => self.refresh_models(),
            (Focus::Models, KeyCode::Up) => self.model_idx = self.model_idx.saturating_sub(1),
            (Focus::Models, KeyCode::Down) => {
                if self.model_idx + 1 < self.models.len() {
                    self.model_idx += 1;
                }
            }
            (Focus::Models, KeyCode::Enter | KeyCode::Right) => self.load_selected_model(),
            (Focus::Features, KeyCode::Esc) => self.focus = Focus::Models,
            (Focus::Features, KeyCode::Up) => self.feature_idx = self.feature_idx.saturating_sub(1),
            (Focus::Features, KeyCode::Down) => {
                let n = self.loaded.as_ref().map(|l| l.form.len()).unwrap_or(0);
                if self.feature_idx + 1 < n {
                    self.feature_idx += 1;
                }
            }
            (Focus::Features, KeyCode::Left) => self.step_feature(-1),
            (Focus::Features, KeyCode::Right) => self.step_feature(1),
            (Focus::Features, KeyCode::Enter) => self.edit_feature(),
            (Focus::Features, KeyCode::Char('p')) => self.predict(),
            _ => {}
        }
    }

    fn step_feature(&mut self, step: isize) {
        let idx = self.feature_idx;
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        match loaded.form.features().get(idx).map(|f| f.kind) {
            Some(FeatureKind::Categorical) => loaded.form.cycle_option(idx, step),
            Some(FeatureKind::Numeric) => loaded.form.nudge(idx, step as f64),
            None => {}
        }
    }

    fn edit_feature(&mut self) {
        let idx = self.feature_idx;
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        match loaded.form.features().get(idx).map(|f| f.kind) {
            Some(FeatureKind::Numeric) => {
                let current = loaded.form.values()[idx].to_string();
                self.begin_edit(EditTarget::FeatureValue(idx), current);
            }
            Some(FeatureKind::Categorical) => loaded.form.cycle_option(idx, 1),
            None => {}
        }
    }

    fn refresh_models(&mut self) {
        match self.client.list_models() {
            Ok(models) => {
                self.status = if models.is_empty() {
                    crate::report::NO_MODELS_HINT.to_string()
                } else {
                    format!("{} model(s) available.", models.len())
                };
                self.models = models;
                if self.model_idx >= self.models.len() {
                    self.model_idx = self.models.len().saturating_sub(1);
                }
            }
            Err(err) => {
                self.status = crate::report::format_client_error(&err)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                self.predict_result = Some(ResultView::failure("Could not list models", &AppError::from(err)));
            }
        }
    }

    fn load_selected_model(&mut self) {
        let Some(id) = self.models.get(self.model_idx).cloned() else {
            return;
        };
        self.predict_result = None;
        match workflow::load_model(&self.client, &id) {
            Ok(loaded) => {
                self.status = format!("Loaded '{id}' ({} feature(s)).", loaded.form.len());
                self.loaded = Some(loaded);
                self.feature_idx = 0;
                self.focus = Focus::Features;
            }
            Err(err) => {
                self.loaded = None;
                self.status = format!("Could not load metadata for '{id}'.");
                self.predict_result = Some(ResultView::failure(format!("Metadata for '{id}'"), &err));
            }
        }
    }

    fn predict(&mut self) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        match workflow::run_prediction(&self.client, &loaded.form) {
            Ok(output) => {
                self.status = format!("Prediction received at {}.", output.received_at.format("%H:%M:%S"));
                self.predict_result = Some(ResultView::Success {
                    title: format!("Prediction from '{}'", output.model),
                    body: crate::report::pretty_json(&output.result),
                });
            }
            Err(err) => {
                self.status = "Prediction failed.".to_string();
                self.predict_result = Some(ResultView::failure("Prediction failed", &err));
            }
        }
    }

    fn handle_upload_key(&mut self, code: KeyCode) {
        let field = UploadField::at(self.upload_idx, &self.upload);
        match code {
            KeyCode::Up => self.upload_idx = self.upload_idx.saturating_sub(1),
            KeyCode::Down => {
                if self.upload_idx + 1 < UploadField::count(&self.upload) {
                    self.upload_idx += 1;
                }
            }
            KeyCode::Enter => match field {
                UploadField::Mode => {
                    self.upload.mode = self.upload.mode.toggled();
                    self.status = format!("Metadata source: {}.", self.upload.mode.label());
                }
                other => {
                    let current = state::current_upload_text(&self.upload, other);
                    self.begin_edit(EditTarget::Upload(other), current);
                }
            },
            KeyCode::Char('a') => {
                let row = self.upload.features.add();
                self.upload_idx = UploadField::FIXED + row;
                self.status = "Feature added.".to_string();
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let UploadField::RowName(row) = field {
                    self.upload.features.remove(row);
                    let count = UploadField::count(&self.upload);
                    self.upload_idx = self.upload_idx.min(count.saturating_sub(1));
                    self.status = "Feature removed.".to_string();
                }
            }
            KeyCode::Char('t') => {
                if let UploadField::RowName(row) = field {
                    self.upload.features.toggle_kind(row);
                }
            }
            KeyCode::Char('o') => {
                if let UploadField::RowName(row) = field {
                    let current = state::current_upload_text(&self.upload, UploadField::RowOptions(row));
                    self.begin_edit(EditTarget::Upload(UploadField::RowOptions(row)), current);
                }
            }
            KeyCode::Char('v') => {
                if let UploadField::RowName(row) = field {
                    let current = state::current_upload_text(&self.upload, UploadField::RowDefault(row));
                    self.begin_edit(EditTarget::Upload(UploadField::RowDefault(row)), current);
                }
            }
            KeyCode::Char('c') => {
                self.upload.reset();
                self.upload_idx = 0;
                self.status = "Upload form cleared.".to_string();
            }
            KeyCode::Char('s') => self.submit_upload(),
            _ => {}
        }
    }

    /// Show the upload result and pick up the new model in the registry list.
    fn finish_upload(&mut self, name: &str, body: &ApiBody) {
        self.upload_result = Some(ResultView::Success {
            title: "Upload complete".to_string(),
            body: crate::report::format_upload_success(name, body),
        });
        self.upload_idx = 0;
        self.refresh_models();
        // The refresh writes its own status line; the upload outcome wins.
        self.status = format!("Model '{name}' uploaded.");
    }

    fn submit_upload(&mut self) {
        let name = self.upload.name.trim().to_string();
        match self.upload.submit(&self.client) {
            Ok(body) => self.finish_upload(&name, &body),
            Err(err) => {
                // The form keeps everything so the user can fix and resubmit.
                self.status = "Upload failed; form kept.".to_string();
                self.upload_result = Some(ResultView::failure("Upload failed", &AppError::from(err)));
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        match self.tab {
            Tab::Registry => self.draw_registry(frame, chunks[1]),
            Tab::Upload => self.draw_upload(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let selected = match self.tab {
            Tab::Registry => 0,
            Tab::Upload => 1,
        };
        let tabs = Tabs::new(vec!["Model registry", "Upload model"])
            .select(selected)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("deck — {}", self.client.base_url())),
            )
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_registry(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(area);

        let items: Vec<ListItem> = if self.models.is_empty() {
            vec![ListItem::new("(no models)")]
        } else {
            self.models.iter().map(|m| ListItem::new(m.as_str())).collect()
        };
        let models_block = focused_block("Models", self.focus == Focus::Models);
        let list = List::new(items)
            .block(models_block)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        if !self.models.is_empty() {
            state.select(Some(self.model_idx));
        }
        frame.render_stateful_widget(list, cols[0], &mut state);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(cols[1]);

        self.draw_predict_form(frame, right[0]);
        draw_result(frame, right[1], self.predict_result.as_ref(), "Select a model and press p to predict.");
    }

    fn draw_predict_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = focused_block("Test this model", self.focus == Focus::Features);
        let Some(loaded) = &self.loaded else {
            let msg = Paragraph::new("Press Enter on a model to load its metadata.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        let inner = block.inner(area);
        frame.render_widget(block, area);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(inner);

        let header = Text::from(vec![
            Line::from(vec![
                Span::styled(loaded.id.as_str(), Style::default().fg(Color::Cyan)),
                Span::raw(format!(" — input features ({})", loaded.form.len())),
            ]),
            Line::from(Span::styled(
                loaded.metadata.display_description().to_string(),
                Style::default().fg(Color::Gray),
            )),
        ]);
        frame.render_widget(Paragraph::new(header).wrap(Wrap { trim: true }), rows[0]);

        let items: Vec<ListItem> = loaded
            .form
            .features()
            .iter()
            .zip(loaded.form.values())
            .map(|(feature, value)| {
                let hint = match feature.kind {
                    FeatureKind::Numeric => "←/→ ±1, Enter type".to_string(),
                    FeatureKind::Categorical => format!("←/→ of {}", feature.options.len()),
                };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{:<20} ", feature.name)),
                    Span::styled(format!("{:<16}", value.to_string()), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {} · {hint}", feature.kind), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        if self.focus == Focus::Features && !loaded.form.is_empty() {
            state.select(Some(self.feature_idx));
        }
        frame.render_stateful_widget(list, rows[1], &mut state);
    }

    fn draw_upload(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let items: Vec<ListItem> = (0..UploadField::count(&self.upload))
            .map(|idx| {
                let field = UploadField::at(idx, &self.upload);
                let active = field.is_active(&self.upload);
                let style = if active {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<16}", field.label()), style.add_modifier(Modifier::BOLD)),
                    Span::styled(state::display_upload_value(&self.upload, field), style),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Upload form (.onnx only)").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(self.upload_idx));
        frame.render_stateful_widget(list, cols[0], &mut state);

        draw_result(
            frame,
            cols[1],
            self.upload_result.as_ref(),
            "Fill in the form and press s to upload. Only .onnx models are accepted.\n\
             Run `deck meta-template` to get an example .meta file.",
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = if let Some(editing) = &self.editing {
            Line::from(vec![
                Span::styled(
                    format!("{}: ", editing.target.label(self)),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{}_", editing.buffer)),
            ])
        } else {
            let help = match self.tab {
                Tab::Registry => "Tab switch  ↑/↓ select  Enter load/edit  ←/→ adjust  p predict  r refresh  Esc back  q quit",
                Tab::Upload => "Tab switch  ↑/↓ select  Enter edit  a add  x del  t type  o options  v default  s submit  c clear  q quit",
            };
            Line::from(vec![
                Span::styled(help, Style::default().fg(Color::Gray)),
                Span::raw(" | "),
                Span::styled(self.status.as_str(), Style::default().fg(Color::Yellow)),
            ])
        };
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn focused_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default().title(title).borders(Borders::ALL).border_style(style)
}

fn draw_result(frame: &mut ratatui::Frame<'_>, area: Rect, result: Option<&ResultView>, placeholder: &str) {
    let (title, body, color) = match result {
        Some(ResultView::Success { title, body }) => (title.as_str(), body.as_str(), Color::Green),
        Some(ResultView::Failure { title, body }) => (title.as_str(), body.as_str(), Color::Red),
        None => ("Result", placeholder, Color::Gray),
    };
    let p = Paragraph::new(body.to_string())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: false })
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_app() -> App {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let config = ApiConfig::new(&format!("http://{addr}")).unwrap();
        App::new(ModelApiClient::new(&config).unwrap())
    }

    #[test]
    fn upload_status_survives_the_model_refresh() {
        let mut app = offline_app();
        app.upload_idx = 3;
        app.finish_upload("games-v2", &ApiBody::Text("created".into()));

        assert_eq!(app.status, "Model 'games-v2' uploaded.");
        assert_eq!(app.upload_idx, 0);
        assert!(matches!(app.upload_result, Some(ResultView::Success { .. })));
        // The failed refresh still reports on the registry tab.
        assert!(matches!(app.predict_result, Some(ResultView::Failure { .. })));
    }
}
