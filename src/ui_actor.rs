use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::iter::FromIterator;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers};
use itertools::Itertools;
use tokio::{
    macros::support::{Future, Pin},
    sync::{mpsc, mpsc::Sender},
};
use tokio_stream::StreamExt;
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans, Text},
    widgets::{
        BarChart, Block, BorderType, Borders, Cell, Clear, List, ListItem, ListState, Paragraph,
        Row, Table, Wrap,
    },
    Frame, Terminal,
};

use crate::{app::AppHandle, error::Error, model::Group, state::Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug)]
pub(crate) enum UIMessage {
    ScreenChanged(Screen),
    GroupsUpdated(Vec<Group>),
    RaceFrame {
        scores: HashMap<String, f64>,
        racing: bool,
    },
    GradingStarted(Vec<(String, String)>),
    Notice {
        level: NoticeLevel,
        text: String,
    },
    LoginSettled {
        ok: bool,
    },
    VoteSettled {
        ok: bool,
    },
}

impl Display for UIMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UIMessage::ScreenChanged(_) => write!(f, "ScreenChanged"),
            UIMessage::GroupsUpdated(_) => write!(f, "GroupsUpdated"),
            UIMessage::RaceFrame { .. } => write!(f, "RaceFrame"),
            UIMessage::GradingStarted(_) => write!(f, "GradingStarted"),
            UIMessage::Notice { .. } => write!(f, "Notice"),
            UIMessage::LoginSettled { ok } => write!(f, "LoginSettled(ok={})", ok),
            UIMessage::VoteSettled { ok } => write!(f, "VoteSettled(ok={})", ok),
        }
    }
}

const LOGIN_FIELDS: usize = 3;
const LOGIN_TITLES: [&str; LOGIN_FIELDS] = ["Full name", "Student ID", "Class"];
const LOGIN_ERRORS: [&str; LOGIN_FIELDS] = [
    "enter your name!",
    "enter your student id!",
    "enter your class!",
];

#[derive(Default)]
struct LoginForm {
    buffers: [Vec<char>; LOGIN_FIELDS],
    focus: usize,
    errors: [bool; LOGIN_FIELDS],
    submitting: bool,
}

impl LoginForm {
    fn value(&self, field: usize) -> String {
        String::from_iter(&self.buffers[field])
    }

    /// Flag every empty field; true when the form can be sent.
    fn validate(&mut self) -> bool {
        for field in 0..LOGIN_FIELDS {
            self.errors[field] = self.value(field).trim().is_empty();
        }
        self.errors.iter().all(|missing| !missing)
    }
}

#[derive(Copy, Clone, Eq, PartialEq)]
enum MenuCard {
    Vote,
    Judging,
}

enum Confirm {
    Vote(String),
    SubmitScores,
    Publish,
}

struct UIActor {
    screen: Screen,
    groups: Vec<Group>,
    display_scores: HashMap<String, f64>,
    racing: bool,
    notice: Option<(NoticeLevel, String)>,

    login: LoginForm,
    menu_card: MenuCard,
    code_entry: Option<Vec<char>>,
    vote_list: ListState,
    voting_group: Option<String>,
    draft: Vec<(String, String)>,
    grading_row: usize,
    confirm: Option<Confirm>,

    receiver: mpsc::Receiver<UIMessage>,

    event_stream: EventStream,
    app_handle: AppHandle,
}

impl UIActor {
    fn new(
        receiver: mpsc::Receiver<UIMessage>,
        event_stream: EventStream,
        app_handle: AppHandle,
    ) -> Self {
        Self {
            screen: Screen::Login,
            groups: vec![],
            display_scores: HashMap::new(),
            racing: false,
            notice: None,
            login: LoginForm::default(),
            menu_card: MenuCard::Vote,
            code_entry: None,
            vote_list: ListState::default(),
            voting_group: None,
            draft: vec![],
            grading_row: 0,
            confirm: None,
            receiver,
            event_stream,
            app_handle,
        }
    }

    fn handle_message(&mut self, msg: UIMessage) {
        log::trace!("ui message: {}", msg);
        match msg {
            UIMessage::ScreenChanged(screen) => {
                self.screen = screen;
                self.confirm = None;
                self.code_entry = None;
                if screen == Screen::Login {
                    // Logout lands here; drop everything we were showing.
                    self.login = LoginForm::default();
                    self.groups.clear();
                    self.display_scores.clear();
                    self.racing = false;
                    self.voting_group = None;
                    self.draft.clear();
                }
                if screen == Screen::VoteSelection && self.vote_list.selected().is_none() {
                    self.vote_list.select(Some(0));
                }
            }
            UIMessage::GroupsUpdated(groups) => {
                self.groups = groups;
                if let Some(selected) = self.vote_list.selected() {
                    if selected >= self.groups.len() {
                        self.vote_list.select(if self.groups.is_empty() {
                            None
                        } else {
                            Some(self.groups.len() - 1)
                        });
                    }
                }
            }
            UIMessage::RaceFrame { scores, racing } => {
                self.display_scores = scores;
                self.racing = racing;
            }
            UIMessage::GradingStarted(draft) => {
                self.draft = draft;
                self.grading_row = 0;
            }
            UIMessage::Notice { level, text } => self.notice = Some((level, text)),
            UIMessage::LoginSettled { ok } => {
                self.login.submitting = false;
                if ok {
                    self.login = LoginForm::default();
                }
            }
            UIMessage::VoteSettled { .. } => self.voting_group = None,
        }
    }

    // Input that works everywhere, regardless of screen or overlay
    fn handle_independent_event(&mut self, event: Event) -> Option<bool> {
        if let Event::Key(KeyEvent { code, modifiers }) = event {
            if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                return Some(true);
            }
        }
        None
    }

    async fn handle_input_event(&mut self, event: Event) -> Result<bool, Error> {
        if Some(true) == self.handle_independent_event(event) {
            return Ok(true);
        }

        let code = match event {
            Event::Key(KeyEvent { code, .. }) => code,
            _ => return Ok(false),
        };

        if self.confirm.is_some() {
            self.handle_confirm_key(code).await?;
            return Ok(false);
        }
        if self.code_entry.is_some() {
            self.handle_code_entry_key(code).await?;
            return Ok(false);
        }

        match self.screen {
            Screen::Login => self.handle_login_key(code).await?,
            Screen::Menu => self.handle_menu_key(code).await?,
            Screen::VoteSelection => self.handle_vote_key(code).await?,
            Screen::Grading => self.handle_grading_key(code).await?,
            Screen::Waiting | Screen::Results => {}
        }

        Ok(false)
    }

    async fn handle_confirm_key(&mut self, code: KeyCode) -> Result<(), Error> {
        match code {
            KeyCode::Enter => {
                match self.confirm.take() {
                    Some(Confirm::Vote(group)) => {
                        self.voting_group = Some(group.clone());
                        self.app_handle.vote(group).await?;
                    }
                    Some(Confirm::SubmitScores) => {
                        self.app_handle.submit_scores(self.draft.clone()).await?;
                    }
                    Some(Confirm::Publish) => {
                        self.app_handle.publish().await?;
                    }
                    None => {}
                }
            }
            KeyCode::Esc => self.confirm = None,
            _ => {}
        }
        Ok(())
    }

    async fn handle_code_entry_key(&mut self, code: KeyCode) -> Result<(), Error> {
        match code {
            KeyCode::Enter => {
                if let Some(buffer) = self.code_entry.take() {
                    self.app_handle
                        .enter_judging(String::from_iter(&buffer))
                        .await?;
                }
            }
            KeyCode::Esc => self.code_entry = None,
            KeyCode::Backspace => {
                if let Some(buffer) = &mut self.code_entry {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = &mut self.code_entry {
                    buffer.push(c);
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_login_key(&mut self, code: KeyCode) -> Result<(), Error> {
        match code {
            KeyCode::Tab | KeyCode::Down => {
                self.login.focus = (self.login.focus + 1) % LOGIN_FIELDS;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.login.focus = (self.login.focus + LOGIN_FIELDS - 1) % LOGIN_FIELDS;
            }
            KeyCode::Backspace => {
                self.login.buffers[self.login.focus].pop();
                self.login.errors[self.login.focus] = false;
            }
            KeyCode::Char(c) => {
                self.login.buffers[self.login.focus].push(c);
                self.login.errors[self.login.focus] = false;
            }
            KeyCode::Enter => {
                if !self.login.submitting && self.login.validate() {
                    self.login.submitting = true;
                    self.app_handle
                        .login(
                            self.login.value(0).trim().to_string(),
                            self.login.value(1).trim().to_string(),
                            self.login.value(2).trim().to_string(),
                        )
                        .await?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_menu_key(&mut self, code: KeyCode) -> Result<(), Error> {
        match code {
            KeyCode::Left => self.menu_card = MenuCard::Vote,
            KeyCode::Right => self.menu_card = MenuCard::Judging,
            KeyCode::Enter => match self.menu_card {
                MenuCard::Vote => self.app_handle.open_voting().await?,
                MenuCard::Judging => self.code_entry = Some(vec![]),
            },
            KeyCode::Char('l') => self.app_handle.logout().await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_vote_key(&mut self, code: KeyCode) -> Result<(), Error> {
        match code {
            KeyCode::Up => self.move_vote_cursor(-1),
            KeyCode::Down => self.move_vote_cursor(1),
            KeyCode::Enter => {
                // One in-flight vote at a time; its card shows the spinner.
                if self.voting_group.is_none() {
                    if let Some(group) = self
                        .vote_list
                        .selected()
                        .and_then(|selected| self.groups.get(selected))
                    {
                        self.confirm = Some(Confirm::Vote(group.name.clone()));
                    }
                }
            }
            KeyCode::Esc => self.app_handle.back_to_menu().await?,
            _ => {}
        }
        Ok(())
    }

    fn move_vote_cursor(&mut self, delta: isize) {
        if self.groups.is_empty() {
            return;
        }
        let last = self.groups.len() - 1;
        let current = self.vote_list.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, last as isize) as usize;
        self.vote_list.select(Some(next));
    }

    async fn handle_grading_key(&mut self, code: KeyCode) -> Result<(), Error> {
        match code {
            KeyCode::Up => self.grading_row = self.grading_row.saturating_sub(1),
            KeyCode::Down => {
                if self.grading_row + 1 < self.draft.len() {
                    self.grading_row += 1;
                }
            }
            KeyCode::Backspace => {
                if let Some((_, score)) = self.draft.get_mut(self.grading_row) {
                    score.pop();
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                if let Some((_, score)) = self.draft.get_mut(self.grading_row) {
                    if score.len() < 4 {
                        score.push(c);
                    }
                }
            }
            KeyCode::Char('s') => {
                if draft_is_valid(&self.draft) {
                    self.confirm = Some(Confirm::SubmitScores);
                } else {
                    self.notice = Some((
                        NoticeLevel::Error,
                        String::from("Scores must be numbers between 0 and 10!"),
                    ));
                }
            }
            KeyCode::Char('p') => self.confirm = Some(Confirm::Publish),
            KeyCode::Esc => self.app_handle.back_to_menu().await?,
            _ => {}
        }
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), Error> {
        terminal.draw(|frame| self.draw_view(frame))?;
        Ok(())
    }

    fn draw_view<B: Backend>(&mut self, frame: &mut Frame<B>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)].as_ref())
            .split(frame.size());

        match self.screen {
            Screen::Login => self.draw_login(frame, chunks[0]),
            Screen::Menu => self.draw_menu(frame, chunks[0]),
            Screen::VoteSelection => self.draw_vote_selection(frame, chunks[0]),
            Screen::Waiting => self.draw_waiting(frame, chunks[0]),
            Screen::Grading => self.draw_grading(frame, chunks[0]),
            Screen::Results => self.draw_results(frame, chunks[0]),
        }

        self.draw_status_line(frame, chunks[1]);

        if self.confirm.is_some() {
            self.draw_confirm(frame);
        }
        if self.code_entry.is_some() {
            self.draw_code_entry(frame);
        }
    }

    fn draw_login<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let body = centered_rect(area, 50, 14);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Length(2),
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(body);

        let title = Paragraph::new("CHECK-IN — live event voting")
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        frame.render_widget(title, chunks[0]);

        for field in 0..LOGIN_FIELDS {
            let mut title = vec![Span::raw(LOGIN_TITLES[field])];
            if self.login.errors[field] {
                title.push(Span::styled(
                    format!(" — {}", LOGIN_ERRORS[field]),
                    Style::default().fg(Color::Red),
                ));
            }
            let input = Paragraph::new(self.login.value(field)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(focus_style(self.login.focus == field))
                    .title(Spans::from(title)),
            );
            frame.render_widget(input, chunks[1 + field]);
        }

        let hint = if self.login.submitting {
            "Checking in…"
        } else {
            "Enter to join"
        };
        let hint = Paragraph::new(hint).alignment(Alignment::Center);
        frame.render_widget(hint, chunks[4]);
    }

    fn draw_menu<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let body = centered_rect(area, 70, 10);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
            .split(body);

        let vote_card = Paragraph::new(Text::from(vec![
            Spans::from(""),
            Spans::from(Span::styled(
                "AUDIENCE VOTE",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Spans::from("Pick your favourite group"),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .style(focus_style(self.menu_card == MenuCard::Vote)),
        );
        frame.render_widget(vote_card, chunks[0]);

        let judge_card = Paragraph::new(Text::from(vec![
            Spans::from(""),
            Spans::from(Span::styled(
                "JUDGE PANEL",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Spans::from("Scoring area"),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .style(focus_style(self.menu_card == MenuCard::Judging)),
        );
        frame.render_widget(judge_card, chunks[1]);
    }

    fn draw_vote_selection<B: Backend>(&mut self, frame: &mut Frame<B>, area: Rect) {
        let items = self
            .groups
            .iter()
            .enumerate()
            .map(|(position, group)| {
                let mut header = vec![
                    Span::styled(
                        format!("#{} ", position + 1),
                        Style::default().fg(Color::Blue),
                    ),
                    Span::styled(
                        group.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ];
                if self.voting_group.as_deref() == Some(group.name.as_str()) {
                    header.push(Span::styled(
                        " (sending…)",
                        Style::default().fg(Color::Yellow),
                    ));
                }
                ListItem::new(Text::from(vec![
                    Spans::from(header),
                    Spans::from(Span::styled(
                        format!("   {}", group.topic),
                        Style::default().add_modifier(Modifier::ITALIC),
                    )),
                ]))
            })
            .collect::<Vec<_>>();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title("PICK A GROUP"),
            )
            .highlight_style(Style::default().fg(Color::Green))
            .highlight_symbol("➤ ");
        frame.render_stateful_widget(list, area, &mut self.vote_list);
    }

    fn draw_waiting<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let body = centered_rect(area, 60, 8);
        let text = Text::from(vec![
            Spans::from(Span::styled(
                "VOTE RECORDED!",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Spans::from("Thanks for taking part."),
            Spans::from(""),
            Spans::from("Waiting for the committee to publish the results…"),
            Spans::from(Span::styled(
                "Please keep this screen open",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ]);
        let panel = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            );
        frame.render_widget(panel, body);
    }

    fn draw_grading<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let rows = self
            .draft
            .iter()
            .enumerate()
            .map(|(row, (name, score))| {
                let topic = self
                    .groups
                    .iter()
                    .find(|group| &group.name == name)
                    .map(|group| group.topic.clone())
                    .unwrap_or_default();
                let score_cell = if row == self.grading_row {
                    format!("{}_", score)
                } else {
                    score.clone()
                };
                let style = if row == self.grading_row {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(name.clone()),
                    Cell::from(topic),
                    Cell::from(score_cell),
                ])
                .style(style)
            })
            .collect::<Vec<_>>();

        let widths = [
            Constraint::Percentage(30),
            Constraint::Percentage(45),
            Constraint::Percentage(25),
        ];
        let table = Table::new(rows)
            .header(
                Row::new(vec!["Group", "Topic", "Score (0-10)"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title("SCORE SHEET — judge mode"),
            )
            .widths(&widths);
        frame.render_widget(table, area);
    }

    fn draw_results<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Length(2),
                    Constraint::Percentage(55),
                    Constraint::Min(1),
                ]
                .as_ref(),
            )
            .split(area);

        let title = if self.racing {
            "TALLYING…"
        } else {
            "🏆 FINAL RESULTS 🏆"
        };
        let title = Paragraph::new(title)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        frame.render_widget(title, chunks[0]);

        let bars = self
            .groups
            .iter()
            .map(|group| {
                let score = self.display_scores.get(&group.name).copied().unwrap_or(0.0);
                let label = if self.racing {
                    group.name.clone()
                } else {
                    format!("{}{}", medal(group.rank), group.name)
                };
                (label, score.max(0.0).floor() as u64)
            })
            .collect::<Vec<_>>();
        let data = bars
            .iter()
            .map(|(label, value)| (label.as_str(), *value))
            .collect::<Vec<_>>();

        // Racing bars sit low against a 0-100 scale, then the chart
        // snaps to the real score range for the final frame.
        let max = if self.racing {
            100
        } else {
            let top = self
                .display_scores
                .values()
                .fold(10.0_f64, |top, &score| top.max(score));
            (top * 1.1).ceil() as u64
        };

        let chart = BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            )
            .data(&data)
            .max(max)
            .bar_width(12)
            .bar_gap(3)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().add_modifier(Modifier::BOLD));
        frame.render_widget(chart, chunks[1]);

        if !self.racing {
            let rows = ranked(&self.groups)
                .into_iter()
                .map(|group| {
                    Row::new(vec![
                        Cell::from(format!("{}{}", medal(group.rank), group.rank)),
                        Cell::from(group.name.clone()),
                        Cell::from(format_total(group.total_score)),
                    ])
                })
                .collect::<Vec<_>>();
            let widths = [
                Constraint::Length(8),
                Constraint::Percentage(60),
                Constraint::Length(10),
            ];
            let table = Table::new(rows)
                .header(
                    Row::new(vec!["Rank", "Group", "Total"])
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded),
                )
                .widths(&widths);
            frame.render_widget(table, chunks[2]);
        }
    }

    fn draw_status_line<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let line = match &self.notice {
            Some((NoticeLevel::Success, text)) => {
                Span::styled(text.clone(), Style::default().fg(Color::Green))
            }
            Some((NoticeLevel::Error, text)) => {
                Span::styled(text.clone(), Style::default().fg(Color::Red))
            }
            None => Span::styled(
                key_hints(self.screen),
                Style::default().add_modifier(Modifier::DIM),
            ),
        };
        frame.render_widget(Paragraph::new(Spans::from(line)), area);
    }

    fn draw_confirm<B: Backend>(&self, frame: &mut Frame<B>) {
        let (title, message) = match &self.confirm {
            Some(Confirm::Vote(group)) => (
                "CONFIRM YOUR VOTE",
                format!("Vote for {}? You only get one vote.", group),
            ),
            Some(Confirm::SubmitScores) => (
                "SEND THE SCORE SHEET",
                String::from("Scores accumulate on the board. Are you sure?"),
            ),
            Some(Confirm::Publish) => (
                "PUBLISH THE RESULTS",
                String::from("Every audience screen flips to the ranking immediately."),
            ),
            None => return,
        };

        let body = centered_rect(frame.size(), 50, 6);
        frame.render_widget(Clear, body);
        let dialog = Paragraph::new(Text::from(vec![
            Spans::from(message.as_str()),
            Spans::from(""),
            Spans::from(Span::styled(
                "Enter confirm · Esc cancel",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ]))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title),
        );
        frame.render_widget(dialog, body);
    }

    fn draw_code_entry<B: Backend>(&self, frame: &mut Frame<B>) {
        let code = match &self.code_entry {
            Some(buffer) => String::from_iter(buffer),
            None => return,
        };
        let body = centered_rect(frame.size(), 40, 3);
        frame.render_widget(Clear, body);
        let input = Paragraph::new(code).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Plain)
                .title("Judge code"),
        );
        frame.render_widget(input, body);
    }
}

// Empty drafts may be submitted; the sheet treats them as no score.
fn draft_is_valid(draft: &[(String, String)]) -> bool {
    draft.iter().all(|(_, score)| {
        score.is_empty()
            || score
                .parse::<f64>()
                .map(|value| (0.0..=10.0).contains(&value))
                .unwrap_or(false)
    })
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    }
}

fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(height),
                Constraint::Min(1),
            ]
            .as_ref(),
        )
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1]);
    horizontal[1]
}

fn ranked(groups: &[Group]) -> Vec<&Group> {
    groups.iter().sorted_by_key(|group| group.rank).collect()
}

fn format_total(score: f64) -> String {
    format!("{:.2}", score)
}

fn medal(rank: u32) -> &'static str {
    match rank {
        1 => "🥇 ",
        2 => "🥈 ",
        3 => "🥉 ",
        _ => "",
    }
}

fn key_hints(screen: Screen) -> &'static str {
    match screen {
        Screen::Login => "Tab next field · Enter join · Ctrl+C quit",
        Screen::Menu => "←/→ pick · Enter open · L log out · Ctrl+C quit",
        Screen::VoteSelection => "↑/↓ pick · Enter vote · Esc back",
        Screen::Waiting => "Sit tight — results arrive on their own",
        Screen::Grading => "↑/↓ row · 0-9 . edit · S submit · P publish · Esc back",
        Screen::Results => "Ctrl+C quit",
    }
}

async fn run_ui_actor<B: Backend>(
    mut actor: UIActor,
    terminal: &mut Terminal<B>,
) -> Result<(), Error> {
    loop {
        actor.draw(terminal)?;
        tokio::select! {
            Some(msg) = actor.receiver.recv() => {
                actor.handle_message(msg);
            }
            Some(Ok(event)) = actor.event_stream.next() => {
                if actor.handle_input_event(event).await? {
                    break;
                }
            }
            else => {
                break;
            }
        }
    }

    Ok(())
}

#[derive(Clone, Debug)]
pub struct UIHandle {
    sender: Sender<UIMessage>,
}

type UIStarter<'a, B> = Box<
    dyn FnOnce(
        EventStream,
        AppHandle,
        &'a mut Terminal<B>,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + 'a>>,
>;

impl UIHandle {
    pub fn new<'a, B: Backend>() -> (Self, UIStarter<'a, B>) {
        let (sender, receiver) = mpsc::channel(8);

        (
            Self { sender },
            Box::new(move |event_stream, app_handle, terminal| {
                let actor = UIActor::new(receiver, event_stream, app_handle);
                Box::pin(run_ui_actor(actor, terminal))
            }),
        )
    }

    #[cfg(test)]
    pub(crate) fn test_pair() -> (Self, mpsc::Receiver<UIMessage>) {
        let (sender, receiver) = mpsc::channel(256);
        (Self { sender }, receiver)
    }

    pub async fn screen(&self, screen: Screen) -> Result<(), Error> {
        self.sender.send(UIMessage::ScreenChanged(screen)).await?;
        Ok(())
    }

    pub async fn groups(&self, groups: Vec<Group>) -> Result<(), Error> {
        self.sender.send(UIMessage::GroupsUpdated(groups)).await?;
        Ok(())
    }

    pub async fn race_frame(
        &self,
        scores: HashMap<String, f64>,
        racing: bool,
    ) -> Result<(), Error> {
        self.sender
            .send(UIMessage::RaceFrame { scores, racing })
            .await?;
        Ok(())
    }

    pub async fn grading_started(&self, draft: Vec<(String, String)>) -> Result<(), Error> {
        self.sender.send(UIMessage::GradingStarted(draft)).await?;
        Ok(())
    }

    pub async fn notice_success(&self, text: String) -> Result<(), Error> {
        self.sender
            .send(UIMessage::Notice {
                level: NoticeLevel::Success,
                text,
            })
            .await?;
        Ok(())
    }

    pub async fn notice_error(&self, text: String) -> Result<(), Error> {
        self.sender
            .send(UIMessage::Notice {
                level: NoticeLevel::Error,
                text,
            })
            .await?;
        Ok(())
    }

    pub async fn login_settled(&self, ok: bool) -> Result<(), Error> {
        self.sender.send(UIMessage::LoginSettled { ok }).await?;
        Ok(())
    }

    pub async fn vote_settled(&self, ok: bool) -> Result<(), Error> {
        self.sender.send(UIMessage::VoteSettled { ok }).await?;
        Ok(())
    }
}
