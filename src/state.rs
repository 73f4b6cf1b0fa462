use std::collections::HashMap;

use tokio::time::{Duration, Instant};

use crate::model::Group;
use crate::session::Session;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const RACE_TICK: Duration = Duration::from_millis(700);
pub const RACE_DURATION: Duration = Duration::from_millis(12_000);

/// Every group shows this flat value during the suspense window.
pub const RACE_PLACEHOLDER: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Menu,
    VoteSelection,
    Waiting,
    Results,
    Grading,
}

#[derive(Debug)]
struct Race {
    started_at: Instant,
}

/// One animation tick worth of display scores, keyed by group name.
#[derive(Debug, Clone, PartialEq)]
pub enum RaceFrame {
    Racing(HashMap<String, f64>),
    Finished(HashMap<String, f64>),
}

/// The view-state machine. Everything here is synchronous and takes
/// explicit instants; the app actor owns the actual timers.
pub struct Flow {
    screen: Screen,
    groups: Vec<Group>,
    session: Option<Session>,
    race: Option<Race>,
}

impl Flow {
    pub fn new() -> Self {
        Self::restore(None)
    }

    /// Seed the machine from whatever the session store remembered.
    /// A saved identity skips LOGIN; a voted identity skips MENU too.
    pub fn restore(session: Option<Session>) -> Self {
        let screen = match &session {
            Some(session) if session.voted => Screen::Waiting,
            Some(_) => Screen::Menu,
            None => Screen::Login,
        };
        Self {
            screen,
            groups: Vec::new(),
            session,
            race: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_racing(&self) -> bool {
        self.race.is_some()
    }

    pub fn update_groups(&mut self, groups: Vec<Group>) {
        self.groups = groups;
    }

    pub fn login(&mut self, session: Session) {
        self.screen = if session.voted {
            Screen::Waiting
        } else {
            Screen::Menu
        };
        self.session = Some(session);
    }

    pub fn logout(&mut self) {
        *self = Self::new();
    }

    pub fn open_voting(&mut self) -> bool {
        if self.screen == Screen::Menu {
            self.screen = Screen::VoteSelection;
            true
        } else {
            false
        }
    }

    pub fn back_to_menu(&mut self) -> bool {
        match self.screen {
            Screen::VoteSelection | Screen::Grading => {
                self.screen = Screen::Menu;
                true
            }
            _ => false,
        }
    }

    pub fn vote_recorded(&mut self) {
        if let Some(session) = &mut self.session {
            session.voted = true;
        }
        self.screen = Screen::Waiting;
    }

    /// Screens a published poll result is allowed to pre-empt. The
    /// login form and the judges' panel are left alone.
    pub fn wants_reveal_on_publish(&self) -> bool {
        matches!(
            self.screen,
            Screen::Waiting | Screen::VoteSelection | Screen::Menu
        )
    }

    /// Switch to RESULTS and arm the race. Returns false without
    /// touching the running animation when RESULTS is already up, so
    /// user-triggered and poll-triggered publishes cannot overlap.
    pub fn start_reveal(&mut self, now: Instant) -> bool {
        if self.screen == Screen::Results {
            return false;
        }
        self.screen = Screen::Results;
        self.race = Some(Race { started_at: now });
        true
    }

    /// Advance the reveal animation. Inside the suspense window every
    /// group gets the flat placeholder; past it the real totals land,
    /// the race ends, and no further frames are produced.
    pub fn race_frame(&mut self, now: Instant) -> Option<RaceFrame> {
        let race = self.race.as_ref()?;
        if now.duration_since(race.started_at) < RACE_DURATION {
            let scores = self
                .groups
                .iter()
                .map(|g| (g.name.clone(), RACE_PLACEHOLDER))
                .collect();
            Some(RaceFrame::Racing(scores))
        } else {
            self.race = None;
            let scores = self
                .groups
                .iter()
                .map(|g| (g.name.clone(), g.total_score))
                .collect();
            Some(RaceFrame::Finished(scores))
        }
    }

    /// The judge gate: a single equality check. A match seeds the
    /// score draft from the loaded groups and opens the panel; a miss
    /// changes nothing.
    pub fn enter_grading(&mut self, code: &str, expected: &str) -> Option<Vec<(String, String)>> {
        if code != expected {
            return None;
        }
        let draft = seed_draft(&self.groups);
        self.screen = Screen::Grading;
        Some(draft)
    }
}

fn seed_draft(groups: &[Group]) -> Vec<(String, String)> {
    groups
        .iter()
        .map(|g| {
            let score = g.judge_score.map(|s| s.to_string()).unwrap_or_default();
            (g.name.clone(), score)
        })
        .collect()
}
