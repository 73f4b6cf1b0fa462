use std::fmt::{Display, Formatter};

use futures::future::OptionFuture;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::{interval, Instant, Interval};

use crate::config::Config;
use crate::error::Error;
use crate::model::{Command, ScoreEntry};
use crate::remote::{HttpRemote, Remote};
use crate::session::{self, FileStore, Session, SessionStore};
use crate::state::{Flow, RaceFrame, POLL_INTERVAL, RACE_TICK};
use crate::ui_actor::UIHandle;

#[derive(Debug)]
pub(crate) enum AppInput {
    Login {
        name: String,
        student_id: String,
        class: String,
    },
    OpenVoting,
    BackToMenu,
    Vote {
        group: String,
    },
    EnterJudging {
        code: String,
    },
    SubmitScores {
        scores: Vec<(String, String)>,
    },
    Publish,
    Logout,
}

impl Display for AppInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppInput::Login { .. } => write!(f, "Login"),
            AppInput::OpenVoting => write!(f, "OpenVoting"),
            AppInput::BackToMenu => write!(f, "BackToMenu"),
            AppInput::Vote { .. } => write!(f, "Vote"),
            AppInput::EnterJudging { .. } => write!(f, "EnterJudging"),
            AppInput::SubmitScores { .. } => write!(f, "SubmitScores"),
            AppInput::Publish => write!(f, "Publish"),
            AppInput::Logout => write!(f, "Logout"),
        }
    }
}

struct App<R, S> {
    ui_handle: UIHandle,
    flow: Flow,
    remote: R,
    store: S,
    judge_code: String,
    poll: Interval,
    race: Option<Interval>,
}

impl<R: Remote, S: SessionStore> App<R, S> {
    fn new(remote: R, store: S, judge_code: String, ui_handle: UIHandle) -> Self {
        let flow = Flow::restore(session::restore(&store));
        if let Some(session) = flow.session() {
            log::info!("restored session for {}", session.name);
        }
        Self {
            ui_handle,
            flow,
            remote,
            store,
            judge_code,
            poll: interval(POLL_INTERVAL),
            race: None,
        }
    }

    async fn handle_message(&mut self, msg: AppInput) -> Result<(), Error> {
        log::debug!("app input: {}", msg);
        match msg {
            AppInput::Login {
                name,
                student_id,
                class,
            } => self.login(name, student_id, class).await,
            AppInput::OpenVoting => {
                if self.flow.open_voting() {
                    self.sync_screen().await?;
                }
                Ok(())
            }
            AppInput::BackToMenu => {
                if self.flow.back_to_menu() {
                    self.sync_screen().await?;
                }
                Ok(())
            }
            AppInput::Vote { group } => self.vote(group).await,
            AppInput::EnterJudging { code } => self.enter_judging(code).await,
            AppInput::SubmitScores { scores } => self.submit_scores(scores).await,
            AppInput::Publish => self.publish().await,
            AppInput::Logout => self.logout().await,
        }
    }

    async fn login(&mut self, name: String, student_id: String, class: String) -> Result<(), Error> {
        // The form layer validates too; nothing incomplete leaves the client.
        if name.trim().is_empty() || student_id.trim().is_empty() || class.trim().is_empty() {
            self.ui_handle.login_settled(false).await?;
            return self
                .ui_handle
                .notice_error(String::from("All check-in fields are required!"))
                .await;
        }

        let command = Command::Login {
            name: name.clone(),
            msv: student_id.clone(),
            class,
        };
        match self.remote.send(&command).await {
            Ok(()) => {
                session::persist(&mut self.store, &name, &student_id);
                let voted = session::has_voted(&self.store, &student_id);
                self.flow.login(Session {
                    name,
                    student_id,
                    voted,
                });
                self.ui_handle.login_settled(true).await?;
                self.ui_handle
                    .notice_success(String::from("Checked in!"))
                    .await?;
                self.sync_screen().await?;
                self.poll_remote().await
            }
            Err(err) => {
                log::warn!("login dispatch failed: {}", err);
                self.ui_handle.login_settled(false).await?;
                self.ui_handle
                    .notice_error(String::from("Connection error!"))
                    .await
            }
        }
    }

    async fn vote(&mut self, group: String) -> Result<(), Error> {
        let command = Command::Vote { group_name: group };
        match self.remote.send(&command).await {
            Ok(()) => {
                let student_id = self.flow.session().map(|s| s.student_id.clone());
                if let Some(student_id) = student_id {
                    session::mark_voted(&mut self.store, &student_id);
                }
                self.flow.vote_recorded();
                self.ui_handle.vote_settled(true).await?;
                self.ui_handle
                    .notice_success(String::from("Vote sent!"))
                    .await?;
                self.sync_screen().await
            }
            Err(err) => {
                log::warn!("vote dispatch failed: {}", err);
                self.ui_handle.vote_settled(false).await?;
                self.ui_handle
                    .notice_error(String::from("Network error, please try again!"))
                    .await
            }
        }
    }

    async fn enter_judging(&mut self, code: String) -> Result<(), Error> {
        match self.flow.enter_grading(&code, &self.judge_code) {
            Some(draft) => {
                self.ui_handle.grading_started(draft).await?;
                self.sync_screen().await
            }
            None => {
                self.ui_handle
                    .notice_error(String::from("Wrong code!"))
                    .await
            }
        }
    }

    async fn submit_scores(&mut self, scores: Vec<(String, String)>) -> Result<(), Error> {
        let command = Command::SubmitScores {
            scores: scores
                .into_iter()
                .map(|(group_name, score)| ScoreEntry { group_name, score })
                .collect(),
        };
        match self.remote.send(&command).await {
            Ok(()) => {
                self.ui_handle
                    .notice_success(String::from("Scores recorded!"))
                    .await
            }
            Err(err) => {
                log::warn!("score dispatch failed: {}", err);
                self.ui_handle
                    .notice_error(String::from("Connection error!"))
                    .await
            }
        }
    }

    async fn publish(&mut self) -> Result<(), Error> {
        match self.remote.send(&Command::Publish).await {
            Ok(()) => {
                self.ui_handle
                    .notice_success(String::from("Publish order sent!"))
                    .await?;
                self.start_reveal().await
            }
            Err(err) => {
                log::warn!("publish dispatch failed: {}", err);
                self.ui_handle
                    .notice_error(String::from("Connection error!"))
                    .await
            }
        }
    }

    async fn logout(&mut self) -> Result<(), Error> {
        self.store.clear();
        self.flow.logout();
        self.race = None;
        self.sync_screen().await
    }

    async fn poll_remote(&mut self) -> Result<(), Error> {
        match self.remote.fetch().await {
            Ok(snapshot) if snapshot.is_success() => {
                self.flow.update_groups(snapshot.data);
                self.ui_handle.groups(self.flow.groups().to_vec()).await?;
                if snapshot.is_published && self.flow.wants_reveal_on_publish() {
                    self.start_reveal().await?;
                }
                Ok(())
            }
            // Anything else means no update this tick; the next one self-heals.
            Ok(_) => Ok(()),
            Err(err) => {
                log::debug!("poll tick dropped: {}", err);
                Ok(())
            }
        }
    }

    async fn start_reveal(&mut self) -> Result<(), Error> {
        if !self.flow.start_reveal(Instant::now()) {
            return Ok(());
        }
        self.race = Some(interval(RACE_TICK));
        self.sync_screen().await
    }

    async fn on_race_tick(&mut self) -> Result<(), Error> {
        if !self.flow.is_racing() {
            // The timer outlived its race (logout mid-reveal); drop it.
            self.race = None;
            return Ok(());
        }
        match self.flow.race_frame(Instant::now()) {
            Some(RaceFrame::Racing(scores)) => self.ui_handle.race_frame(scores, true).await,
            Some(RaceFrame::Finished(scores)) => {
                self.race = None;
                self.ui_handle.race_frame(scores, false).await?;
                self.ui_handle
                    .notice_success(String::from("🎉 OFFICIAL RESULTS! 🎉"))
                    .await
            }
            None => Ok(()),
        }
    }

    async fn sync_screen(&mut self) -> Result<(), Error> {
        self.poll.reset();
        self.ui_handle.screen(self.flow.screen()).await
    }
}

enum Wake {
    Poll,
    Race,
    Input(AppInput),
    Closed,
}

async fn run_app<R: Remote, S: SessionStore>(
    mut app: App<R, S>,
    mut receiver: Receiver<AppInput>,
) -> Result<(), Error> {
    app.ui_handle.screen(app.flow.screen()).await?;

    loop {
        let wake = {
            let race: OptionFuture<_> = app.race.as_mut().map(|timer| timer.tick()).into();
            tokio::select! {
                _ = app.poll.tick() => Wake::Poll,
                Some(_) = race => Wake::Race,
                msg = receiver.recv() => match msg {
                    Some(msg) => Wake::Input(msg),
                    // Lost connection to the ui actor so we should die
                    None => Wake::Closed,
                },
            }
        };

        match wake {
            Wake::Poll => app.poll_remote().await?,
            Wake::Race => app.on_race_tick().await?,
            Wake::Input(msg) => app.handle_message(msg).await?,
            Wake::Closed => break Ok(()),
        }
    }
}

pub struct AppHandle {
    sender: Sender<AppInput>,
}

impl AppHandle {
    pub fn new(config: Config, store: FileStore, ui_handle: UIHandle) -> Self {
        let (sender, receiver) = mpsc::channel(8);
        let remote = HttpRemote::new(config.endpoint);
        let app = App::new(remote, store, config.judge_code, ui_handle);
        tokio::spawn(run_app(app, receiver));
        Self { sender }
    }

    pub async fn login(&self, name: String, student_id: String, class: String) -> Result<(), Error> {
        self.sender
            .send(AppInput::Login {
                name,
                student_id,
                class,
            })
            .await?;
        Ok(())
    }

    pub async fn open_voting(&self) -> Result<(), Error> {
        self.sender.send(AppInput::OpenVoting).await?;
        Ok(())
    }

    pub async fn back_to_menu(&self) -> Result<(), Error> {
        self.sender.send(AppInput::BackToMenu).await?;
        Ok(())
    }

    pub async fn vote(&self, group: String) -> Result<(), Error> {
        self.sender.send(AppInput::Vote { group }).await?;
        Ok(())
    }

    pub async fn enter_judging(&self, code: String) -> Result<(), Error> {
        self.sender.send(AppInput::EnterJudging { code }).await?;
        Ok(())
    }

    pub async fn submit_scores(&self, scores: Vec<(String, String)>) -> Result<(), Error> {
        self.sender.send(AppInput::SubmitScores { scores }).await?;
        Ok(())
    }

    pub async fn publish(&self) -> Result<(), Error> {
        self.sender.send(AppInput::Publish).await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), Error> {
        self.sender.send(AppInput::Logout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, Snapshot};
    use crate::session::MemoryStore;
    use crate::state::{Screen, RACE_DURATION, RACE_PLACEHOLDER};
    use crate::ui_actor::UIMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::{advance, Duration};

    #[derive(Default, Clone)]
    struct StubRemote {
        published: Arc<AtomicBool>,
        fail_sends: Arc<AtomicBool>,
        fail_fetches: Arc<AtomicBool>,
        sent: Arc<Mutex<Vec<Command>>>,
    }

    impl StubRemote {
        fn sent(&self) -> Vec<Command> {
            self.sent.lock().unwrap().clone()
        }

        fn stub_error() -> Error {
            Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "stub"))
        }
    }

    #[async_trait]
    impl Remote for StubRemote {
        async fn fetch(&self) -> Result<Snapshot, Error> {
            if self.fail_fetches.load(Ordering::SeqCst) {
                return Err(Self::stub_error());
            }
            Ok(Snapshot {
                status: String::from("success"),
                data: groups(),
                is_published: self.published.load(Ordering::SeqCst),
            })
        }

        async fn send(&self, command: &Command) -> Result<(), Error> {
            self.sent.lock().unwrap().push(command.clone());
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(Self::stub_error());
            }
            Ok(())
        }
    }

    fn groups() -> Vec<Group> {
        vec![
            Group {
                name: "Team A".into(),
                topic: "Recycling drive".into(),
                total_score: 8.5,
                rank: 2,
                judge_score: None,
            },
            Group {
                name: "Team B".into(),
                topic: "Open mic night".into(),
                total_score: 9.2,
                rank: 1,
                judge_score: Some(9.0),
            },
        ]
    }

    fn test_app(
        remote: StubRemote,
        store: MemoryStore,
    ) -> (App<StubRemote, MemoryStore>, mpsc::Receiver<UIMessage>) {
        let (ui_handle, ui_rx) = UIHandle::test_pair();
        (
            App::new(remote, store, String::from("1234"), ui_handle),
            ui_rx,
        )
    }

    fn drain(rx: &mut mpsc::Receiver<UIMessage>) -> Vec<UIMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn checked_in_store() -> MemoryStore {
        let mut store = MemoryStore::default();
        session::persist(&mut store, "An", "B21DCCN001");
        store
    }

    #[tokio::test]
    async fn unpublished_polls_never_reveal() {
        let (mut app, mut ui_rx) = test_app(StubRemote::default(), checked_in_store());
        for _ in 0..10 {
            app.poll_remote().await.unwrap();
            drain(&mut ui_rx);
        }
        assert_eq!(app.flow.screen(), Screen::Menu);
        assert!(!app.flow.is_racing());
    }

    #[tokio::test]
    async fn failed_poll_ticks_change_nothing() {
        let remote = StubRemote::default();
        let (mut app, mut ui_rx) = test_app(remote.clone(), checked_in_store());
        app.poll_remote().await.unwrap();
        drain(&mut ui_rx);

        remote.fail_fetches.store(true, Ordering::SeqCst);
        app.poll_remote().await.unwrap();

        assert_eq!(app.flow.screen(), Screen::Menu);
        assert_eq!(app.flow.groups(), &groups()[..]);
        assert!(drain(&mut ui_rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn published_poll_runs_the_reveal() {
        let remote = StubRemote::default();
        remote.published.store(true, Ordering::SeqCst);
        let (mut app, mut ui_rx) = test_app(remote, checked_in_store());

        app.poll_remote().await.unwrap();
        assert_eq!(app.flow.screen(), Screen::Results);
        assert!(app.flow.is_racing());
        assert!(app.race.is_some());
        drain(&mut ui_rx);

        advance(Duration::from_millis(700)).await;
        app.on_race_tick().await.unwrap();
        match drain(&mut ui_rx).as_slice() {
            [UIMessage::RaceFrame {
                scores,
                racing: true,
            }] => {
                assert!(scores.values().all(|&s| s == RACE_PLACEHOLDER));
            }
            other => panic!("expected one racing frame, got {:?}", other),
        }

        // A repeated published signal mid-race must not restart anything.
        app.poll_remote().await.unwrap();
        drain(&mut ui_rx);
        assert!(app.flow.is_racing());

        advance(RACE_DURATION).await;
        app.on_race_tick().await.unwrap();
        let messages = drain(&mut ui_rx);
        match &messages[..] {
            [UIMessage::RaceFrame {
                scores,
                racing: false,
            }, UIMessage::Notice { .. }] => {
                assert_eq!(scores["Team A"], 8.5);
                assert_eq!(scores["Team B"], 9.2);
            }
            other => panic!("expected the final frame and a notice, got {:?}", other),
        }
        assert!(!app.flow.is_racing());
        assert!(app.race.is_none());
    }

    #[tokio::test]
    async fn empty_login_never_hits_the_wire() {
        let remote = StubRemote::default();
        let (mut app, mut ui_rx) = test_app(remote.clone(), MemoryStore::default());

        app.handle_message(AppInput::Login {
            name: String::new(),
            student_id: String::from("B21DCCN001"),
            class: String::from("D21CQCN01"),
        })
        .await
        .unwrap();

        assert!(remote.sent().is_empty());
        assert_eq!(app.flow.screen(), Screen::Login);
        drain(&mut ui_rx);
    }

    #[tokio::test]
    async fn login_checks_in_and_persists_identity() {
        let remote = StubRemote::default();
        let (mut app, mut ui_rx) = test_app(remote.clone(), MemoryStore::default());

        app.handle_message(AppInput::Login {
            name: String::from("An"),
            student_id: String::from("B21DCCN001"),
            class: String::from("D21CQCN01"),
        })
        .await
        .unwrap();

        assert_eq!(app.flow.screen(), Screen::Menu);
        assert!(session::restore(&app.store).is_some());
        assert!(matches!(remote.sent()[0], Command::Login { .. }));
        assert_eq!(remote.sent().len(), 1);
        drain(&mut ui_rx);
    }

    #[tokio::test]
    async fn login_failure_stays_on_the_form() {
        let remote = StubRemote::default();
        remote.fail_sends.store(true, Ordering::SeqCst);
        let (mut app, mut ui_rx) = test_app(remote, MemoryStore::default());

        app.handle_message(AppInput::Login {
            name: String::from("An"),
            student_id: String::from("B21DCCN001"),
            class: String::from("D21CQCN01"),
        })
        .await
        .unwrap();

        assert_eq!(app.flow.screen(), Screen::Login);
        assert!(session::restore(&app.store).is_none());
        let messages = drain(&mut ui_rx);
        assert!(messages
            .iter()
            .any(|m| matches!(m, UIMessage::LoginSettled { ok: false })));
    }

    #[tokio::test]
    async fn returning_voter_checks_into_waiting() {
        let mut store = checked_in_store();
        session::mark_voted(&mut store, "B21DCCN001");
        let (mut app, mut ui_rx) = test_app(StubRemote::default(), store);

        assert_eq!(app.flow.screen(), Screen::Waiting);

        app.handle_message(AppInput::Login {
            name: String::from("An"),
            student_id: String::from("B21DCCN001"),
            class: String::from("D21CQCN01"),
        })
        .await
        .unwrap();
        assert_eq!(app.flow.screen(), Screen::Waiting);
        drain(&mut ui_rx);
    }

    #[tokio::test]
    async fn vote_failure_keeps_the_ballot_open() {
        let remote = StubRemote::default();
        remote.fail_sends.store(true, Ordering::SeqCst);
        let (mut app, mut ui_rx) = test_app(remote, checked_in_store());
        app.handle_message(AppInput::OpenVoting).await.unwrap();

        app.handle_message(AppInput::Vote {
            group: String::from("Team B"),
        })
        .await
        .unwrap();

        assert_eq!(app.flow.screen(), Screen::VoteSelection);
        assert!(!session::has_voted(&app.store, "B21DCCN001"));
        let messages = drain(&mut ui_rx);
        assert!(messages
            .iter()
            .any(|m| matches!(m, UIMessage::VoteSettled { ok: false })));
    }

    #[tokio::test]
    async fn vote_success_marks_the_flag_and_waits() {
        let (mut app, mut ui_rx) = test_app(StubRemote::default(), checked_in_store());
        app.handle_message(AppInput::OpenVoting).await.unwrap();

        app.handle_message(AppInput::Vote {
            group: String::from("Team B"),
        })
        .await
        .unwrap();

        assert_eq!(app.flow.screen(), Screen::Waiting);
        assert!(session::has_voted(&app.store, "B21DCCN001"));
        drain(&mut ui_rx);
    }

    #[tokio::test]
    async fn wrong_judge_code_stays_on_the_menu() {
        let (mut app, mut ui_rx) = test_app(StubRemote::default(), checked_in_store());
        app.poll_remote().await.unwrap();
        drain(&mut ui_rx);

        app.handle_message(AppInput::EnterJudging {
            code: String::from("0000"),
        })
        .await
        .unwrap();

        assert_eq!(app.flow.screen(), Screen::Menu);
        let messages = drain(&mut ui_rx);
        assert!(!messages
            .iter()
            .any(|m| matches!(m, UIMessage::GradingStarted(_))));
        assert!(messages.iter().any(|m| matches!(m, UIMessage::Notice { .. })));
    }

    #[tokio::test]
    async fn publish_triggers_a_local_reveal() {
        let remote = StubRemote::default();
        let (mut app, mut ui_rx) = test_app(remote.clone(), checked_in_store());
        app.poll_remote().await.unwrap();
        app.handle_message(AppInput::EnterJudging {
            code: String::from("1234"),
        })
        .await
        .unwrap();
        drain(&mut ui_rx);

        app.handle_message(AppInput::Publish).await.unwrap();

        assert!(matches!(remote.sent().last(), Some(Command::Publish)));
        assert_eq!(app.flow.screen(), Screen::Results);
        assert!(app.flow.is_racing());
    }

    #[tokio::test]
    async fn failed_publish_does_not_reveal() {
        let remote = StubRemote::default();
        let (mut app, mut ui_rx) = test_app(remote.clone(), checked_in_store());
        app.poll_remote().await.unwrap();
        app.handle_message(AppInput::EnterJudging {
            code: String::from("1234"),
        })
        .await
        .unwrap();
        drain(&mut ui_rx);

        remote.fail_sends.store(true, Ordering::SeqCst);
        app.handle_message(AppInput::Publish).await.unwrap();

        assert_eq!(app.flow.screen(), Screen::Grading);
        assert!(!app.flow.is_racing());
    }

    #[tokio::test]
    async fn logout_clears_the_store_and_returns_to_login() {
        let mut store = checked_in_store();
        session::mark_voted(&mut store, "B21DCCN001");
        let (mut app, mut ui_rx) = test_app(StubRemote::default(), store);

        app.handle_message(AppInput::Logout).await.unwrap();

        assert_eq!(app.flow.screen(), Screen::Login);
        assert!(session::restore(&app.store).is_none());
        assert!(!session::has_voted(&app.store, "B21DCCN001"));
        drain(&mut ui_rx);
    }
}
