use super::event::{AppEvent, EventHandler};
use crate::application::TaskListController;
use crate::domain::Task;
use color_eyre::Result;
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

#[derive(Debug, Clone, PartialEq)]
pub enum AppMode {
    Main,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusedPane {
    Input,
    TaskList,
}

/// Single-screen task list. The app owns the controller and renders its
/// view state; every keypress maps to exactly one controller operation.
/// Each operation is awaited before the next terminal event is polled,
/// so mutating actions are serialized by construction.
pub struct App {
    controller: TaskListController,

    // UI state
    mode: AppMode,
    focused_pane: FocusedPane,
    list_state: ListState,
}

impl App {
    pub fn new(controller: TaskListController) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            controller,
            mode: AppMode::Main,
            focused_pane: FocusedPane::Input,
            list_state,
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        self.controller.refresh().await;
        self.clamp_selection();
        Ok(())
    }

    fn selected_task(&self) -> Option<Task> {
        let index = self.list_state.selected()?;
        self.controller.tasks().get(index).cloned()
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.tasks().len();
        if len == 0 {
            self.list_state.select(None);
        } else {
            match self.list_state.selected() {
                Some(i) if i < len => {}
                _ => self.list_state.select(Some(len.saturating_sub(1))),
            }
        }
    }

    fn next_task(&mut self) {
        let len = self.controller.tasks().len();
        if len == 0 {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    fn previous_task(&mut self) {
        if self.controller.tasks().is_empty() {
            return;
        }
        let prev = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(prev));
    }

    /// Returns true when the app should quit.
    pub async fn handle_event(&mut self, event: AppEvent) -> Result<bool> {
        if self.mode == AppMode::Help {
            match event {
                AppEvent::Quit => return Ok(true),
                AppEvent::CloseModal | AppEvent::Character('q') | AppEvent::Character('?') => {
                    self.mode = AppMode::Main;
                }
                _ => {}
            }
            return Ok(false);
        }

        match event {
            AppEvent::Quit => return Ok(true),

            AppEvent::Tab => {
                self.focused_pane = match self.focused_pane {
                    FocusedPane::Input => FocusedPane::TaskList,
                    FocusedPane::TaskList => FocusedPane::Input,
                };
            }

            AppEvent::NextTask => self.next_task(),
            AppEvent::PreviousTask => self.previous_task(),

            AppEvent::Character(c) => {
                if self.handle_character(c).await {
                    return Ok(true);
                }
            }

            AppEvent::Backspace => {
                if self.controller.editing_task_id().is_some()
                    && self.focused_pane == FocusedPane::TaskList
                {
                    self.controller.backspace_edit();
                } else if self.focused_pane == FocusedPane::Input {
                    self.controller.backspace_input();
                }
            }

            AppEvent::Enter => self.handle_enter().await,

            // There is no cancel-edit transition: Esc outside of the
            // help overlay does nothing.
            AppEvent::CloseModal => {}

            AppEvent::Tick => {}
        }

        Ok(false)
    }

    /// Returns true when the character asks the app to quit.
    async fn handle_character(&mut self, c: char) -> bool {
        // Typing goes to the active edit scratch first, then to the
        // creation input; action keys only fire from the task list.
        if self.controller.editing_task_id().is_some()
            && self.focused_pane == FocusedPane::TaskList
        {
            self.controller.push_edit(c);
            return false;
        }

        if self.focused_pane == FocusedPane::Input {
            self.controller.push_input(c);
            return false;
        }

        match c {
            'q' => return true,
            'r' => {
                self.controller.refresh().await;
                self.clamp_selection();
            }
            '?' => self.mode = AppMode::Help,
            'j' => self.next_task(),
            'k' => self.previous_task(),
            'e' => {
                if let Some(task) = self.selected_task() {
                    self.controller.begin_edit(&task);
                }
            }
            ' ' => {
                if let Some(task) = self.selected_task() {
                    // Toggle lives here: the controller applies the
                    // value as given.
                    self.controller.set_completed(task.id, !task.completed).await;
                    self.clamp_selection();
                }
            }
            'd' => {
                if let Some(task) = self.selected_task() {
                    self.controller.remove(task.id).await;
                    self.clamp_selection();
                }
            }
            _ => {}
        }
        false
    }

    async fn handle_enter(&mut self) {
        if self.controller.editing_task_id().is_some()
            && self.focused_pane == FocusedPane::TaskList
        {
            if let Some(id) = self.controller.editing_task_id() {
                self.controller.save_edit(id).await;
                self.clamp_selection();
            }
            return;
        }

        if self.focused_pane == FocusedPane::Input {
            let text = self.controller.new_task_input().to_string();
            self.controller.create(&text).await;
            // The controller leaves the buffer alone; clearing it after
            // a submit is presentation behavior.
            self.controller.clear_input();
            self.clamp_selection();
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        if self.mode == AppMode::Help {
            self.render_help(frame);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let title = Paragraph::new("taskdeck")
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        frame.render_widget(title, chunks[0]);

        self.render_input(frame, chunks[1]);
        self.render_task_list(frame, chunks[2]);
        self.render_status(frame, chunks[3]);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focused_pane == FocusedPane::Input;
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let input = Paragraph::new(self.controller.new_task_input()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border_style)
                .title("New task (Enter to add)"),
        );
        frame.render_widget(input, area);
    }

    fn render_task_list(&mut self, frame: &mut Frame, area: Rect) {
        let editing_id = self.controller.editing_task_id();
        let editing_text = self.controller.editing_text().map(str::to_string);

        let items: Vec<ListItem> = self
            .controller
            .tasks()
            .iter()
            .map(|task| {
                if Some(task.id) == editing_id {
                    let scratch = editing_text.as_deref().unwrap_or("");
                    ListItem::new(Line::from(vec![
                        Span::raw(task.status_marker()),
                        Span::raw(" "),
                        Span::styled(
                            scratch.to_string(),
                            Style::default().fg(Color::Yellow),
                        ),
                        Span::styled(" (editing)", Style::default().fg(Color::DarkGray)),
                    ]))
                } else {
                    let text_style = if task.completed {
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::CROSSED_OUT)
                    } else {
                        Style::default()
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(task.status_marker()),
                        Span::raw(" "),
                        Span::styled(task.text.clone(), text_style),
                    ]))
                }
            })
            .collect();

        let focused = self.focused_pane == FocusedPane::TaskList;
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border_style)
                    .title(format!("Tasks ({})", self.controller.tasks().len())),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let status = if self.controller.is_loading() {
            Line::from(Span::styled(
                "Loading tasks...",
                Style::default().fg(Color::Yellow),
            ))
        } else {
            Line::from(Span::styled(
                "Tab focus | Enter add/save | e edit | Space toggle | d delete | r refresh | ? help | q quit",
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(Paragraph::new(status), area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let help_text = vec![
            Line::from(Span::styled(
                "taskdeck help",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Tab        switch focus between input and list"),
            Line::from("Enter      add task (input) / save edit (list)"),
            Line::from("e          edit the selected task"),
            Line::from("Space      toggle completion of the selected task"),
            Line::from("d          delete the selected task"),
            Line::from("r          refresh from the store"),
            Line::from("j/k, arrows  move the selection"),
            Line::from("q, Ctrl+C  quit"),
            Line::from(""),
            Line::from("Edits are saved with Enter; picking another task to"),
            Line::from("edit discards unsaved text. Failed requests keep the"),
            Line::from("last good list; details go to taskdeck.log."),
            Line::from(""),
            Line::from("Press Esc, q or ? to close this screen."),
        ];

        let help = Paragraph::new(help_text)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title("Help"),
            );
        frame.render_widget(help, frame.area());
    }
}

pub async fn run_tui(mut app: App) -> Result<()> {
    // Set up terminal
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // First snapshot before the first frame
    app.initialize().await?;

    let mut event_handler = EventHandler::new();

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let event = event_handler.next_event().await?;
        let should_quit = app.handle_event(event).await?;
        if should_quit || event_handler.should_quit() {
            break;
        }
    }

    // Cleanup
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;

    Ok(())
}
